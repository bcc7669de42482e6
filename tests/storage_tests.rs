use cursos_backend::storage::{MockStorageService, StorageService};

#[tokio::test]
async fn test_mock_upload_returns_deterministic_url() {
    let storage = MockStorageService::new();
    let url = storage
        .upload("usuarios", "avatar.png", "image/png", vec![1, 2, 3])
        .await
        .expect("mock upload should succeed");
    assert_eq!(url, "http://localhost:9000/mock-bucket/usuarios/avatar.png");
}

#[tokio::test]
async fn test_mock_upload_sanitizes_traversal_segments() {
    let storage = MockStorageService::new();
    let url = storage
        .upload("usuarios", "../../etc/passwd", "text/plain", vec![])
        .await
        .expect("mock upload should succeed");
    assert!(
        !url.contains(".."),
        "derived keys must not carry traversal segments: {url}"
    );
}

#[tokio::test]
async fn test_mock_failure_mode_propagates() {
    let storage = MockStorageService::new_failing();
    assert!(
        storage
            .upload("cursos", "img.jpg", "image/jpeg", vec![0])
            .await
            .is_err()
    );
    assert!(storage.delete("http://anywhere/x").await.is_err());
}
