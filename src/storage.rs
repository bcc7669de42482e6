use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::sync::Arc;
use uuid::Uuid;

/// StorageService
///
/// The contract for the external image store. Uploads return a stable public
/// URL persisted on the entity; deletes are best-effort: callers log failures
/// and never let them block the primary operation.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in the `Env::Local` setup
    /// to provision MinIO automatically. No-op in production.
    async fn ensure_bucket_exists(&self);

    /// Stores an uploaded file under `folder/` and returns its public URL.
    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String, String>;

    /// Removes the remote object a previously returned URL points at.
    async fn delete(&self, url: &str) -> Result<(), String>;
}

/// S3StorageClient
///
/// Concrete implementation over the AWS SDK. S3 compatibility covers the
/// Dockerized MinIO instance locally and Supabase Storage in production;
/// `force_path_style(true)` is required for both.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    endpoint: String,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket_name: bucket.to_string(),
        }
    }

    /// Recovers the object key from a public URL produced by `upload`.
    fn key_from_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/{}/", self.endpoint, self.bucket_name);
        url.strip_prefix(&prefix).map(|k| k.to_string())
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// CreateBucket is idempotent, so this is safe to call at every startup.
    async fn ensure_bucket_exists(&self) {
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String, String> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or("bin");
        let key = sanitize_key(&format!("{}/{}.{}", folder, Uuid::new_v4(), extension));

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        Ok(format!("{}/{}/{}", self.endpoint, self.bucket_name, key))
    }

    async fn delete(&self, url: &str) -> Result<(), String> {
        let key = self
            .key_from_url(url)
            .ok_or_else(|| format!("unrecognized object URL: {url}"))?;
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Utility to prevent path traversal by removing directory navigation
/// components from a derived key.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// Test double for the image store: no network, deterministic URLs, and an
/// optional simulated-failure mode for exercising the best-effort paths.
#[derive(Clone)]
pub struct MockStorageService {
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockStorageService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }
        let key = sanitize_key(&format!("{folder}/{filename}"));
        Ok(format!("http://localhost:9000/mock-bucket/{key}"))
    }

    async fn delete(&self, _url: &str) -> Result<(), String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }
        Ok(())
    }
}

/// The concrete type used to share the storage service across the
/// application state.
pub type StorageState = Arc<dyn StorageService>;
