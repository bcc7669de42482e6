use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Curso, Horario, RedSocial, Tech, User};

/// Failures surfaced by the persistence layer. Uniqueness enforcement
/// (email, tech nombre+version, red nombre) lives in the store; everything
/// else is an opaque backend failure.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("duplicate key")]
    Duplicate,
    #[error("{0}")]
    Backend(String),
}

/// Repository Trait
///
/// The abstract contract for all persistence operations, in document-store
/// terms: find by id, find by filter, list, upsert, delete. Handlers interact
/// with this trait only, so the Postgres-backed implementation and the
/// in-memory test implementation are interchangeable.
///
/// `save_*` is an upsert keyed on id. Deletes report whether a document was
/// actually removed, which the handlers map to 404 on the second attempt.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user(&self, id: Uuid) -> Option<User>;
    async fn find_user_by_email(&self, email: &str) -> Option<User>;
    async fn list_users(&self) -> Vec<User>;
    async fn find_users(&self, ids: &[Uuid]) -> Vec<User>;
    async fn save_user(&self, user: &User) -> Result<(), RepoError>;
    async fn delete_user(&self, id: Uuid) -> bool;

    // --- Cursos ---
    async fn find_curso(&self, id: Uuid) -> Option<Curso>;
    /// All cursos ordered by fechaInicio ascending.
    async fn list_cursos(&self) -> Vec<Curso>;
    async fn save_curso(&self, curso: &Curso) -> Result<(), RepoError>;
    async fn delete_curso(&self, id: Uuid) -> bool;

    // --- Horarios ---
    async fn find_horario(&self, id: Uuid) -> Option<Horario>;
    async fn list_horarios_by_curso(&self, curso_id: Uuid) -> Vec<Horario>;
    async fn save_horario(&self, horario: &Horario) -> Result<(), RepoError>;
    async fn delete_horario(&self, id: Uuid) -> bool;

    // --- Techs ---
    async fn find_tech(&self, id: Uuid) -> Option<Tech>;
    async fn find_tech_by_nombre_version(&self, nombre: &str, version: &str) -> Option<Tech>;
    async fn list_techs(&self) -> Vec<Tech>;
    async fn list_techs_by_nombre(&self, nombre: &str) -> Vec<Tech>;
    async fn find_techs(&self, ids: &[Uuid]) -> Vec<Tech>;
    async fn save_tech(&self, tech: &Tech) -> Result<(), RepoError>;
    async fn delete_tech(&self, id: Uuid) -> bool;

    // --- Redes Sociales ---
    async fn find_red(&self, id: Uuid) -> Option<RedSocial>;
    async fn find_red_by_nombre(&self, nombre: &str) -> Option<RedSocial>;
    async fn list_redes(&self) -> Vec<RedSocial>;
    async fn find_redes(&self, ids: &[Uuid]) -> Vec<RedSocial>;
    async fn save_red(&self, red: &RedSocial) -> Result<(), RepoError>;
    async fn delete_red(&self, id: Uuid) -> bool;
}

/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// Stores each entity as a JSONB document row (`id uuid, doc jsonb`), with
/// unique indexes over the document fields that carry uniqueness invariants.
/// Queries use the runtime-checked sqlx API over `doc->>` projections.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn get_by_id<T: DeserializeOwned>(&self, table: &str, id: Uuid) -> Option<T> {
        let sql = format!("SELECT doc FROM {table} WHERE id = $1");
        let row: Option<serde_json::Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_by_id({table}) error: {:?}", e);
                None
            });
        row.and_then(|doc| serde_json::from_value(doc).ok())
    }

    async fn get_one_by_field<T: DeserializeOwned>(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> Option<T> {
        let sql = format!("SELECT doc FROM {table} WHERE doc->>'{field}' = $1");
        let row: Option<serde_json::Value> = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_one_by_field({table}.{field}) error: {:?}", e);
                None
            });
        row.and_then(|doc| serde_json::from_value(doc).ok())
    }

    async fn fetch_docs<T: DeserializeOwned>(
        &self,
        query: sqlx::query::QueryScalar<'_, sqlx::Postgres, serde_json::Value, sqlx::postgres::PgArguments>,
    ) -> Vec<T> {
        match query.fetch_all(&self.pool).await {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|doc| serde_json::from_value(doc).ok())
                .collect(),
            Err(e) => {
                tracing::error!("fetch_docs error: {:?}", e);
                vec![]
            }
        }
    }

    async fn upsert<T: Serialize>(&self, table: &str, id: Uuid, entity: &T) -> Result<(), RepoError> {
        let doc = serde_json::to_value(entity).map_err(|e| RepoError::Backend(e.to_string()))?;
        let sql = format!(
            "INSERT INTO {table} (id, doc) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc"
        );
        match sqlx::query(&sql).bind(id).bind(doc).execute(&self.pool).await {
            Ok(_) => Ok(()),
            // 23505: unique_violation, raised by the expression indexes.
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                Err(RepoError::Duplicate)
            }
            Err(e) => Err(RepoError::Backend(e.to_string())),
        }
    }

    async fn delete_by_id(&self, table: &str, id: Uuid) -> bool {
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        match sqlx::query(&sql).bind(id).execute(&self.pool).await {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_by_id({table}) error: {:?}", e);
                false
            }
        }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user(&self, id: Uuid) -> Option<User> {
        self.get_by_id("usuarios", id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.get_one_by_field("usuarios", "email", email).await
    }

    async fn list_users(&self) -> Vec<User> {
        self.fetch_docs(sqlx::query_scalar(
            "SELECT doc FROM usuarios ORDER BY doc->>'createdAt'",
        ))
        .await
    }

    async fn find_users(&self, ids: &[Uuid]) -> Vec<User> {
        self.fetch_docs(
            sqlx::query_scalar("SELECT doc FROM usuarios WHERE id = ANY($1)").bind(ids.to_vec()),
        )
        .await
    }

    async fn save_user(&self, user: &User) -> Result<(), RepoError> {
        self.upsert("usuarios", user.id, user).await
    }

    async fn delete_user(&self, id: Uuid) -> bool {
        self.delete_by_id("usuarios", id).await
    }

    async fn find_curso(&self, id: Uuid) -> Option<Curso> {
        self.get_by_id("cursos", id).await
    }

    async fn list_cursos(&self) -> Vec<Curso> {
        // RFC 3339 timestamps in UTC sort chronologically as text.
        self.fetch_docs(sqlx::query_scalar(
            "SELECT doc FROM cursos ORDER BY doc->>'fechaInicio'",
        ))
        .await
    }

    async fn save_curso(&self, curso: &Curso) -> Result<(), RepoError> {
        self.upsert("cursos", curso.id, curso).await
    }

    async fn delete_curso(&self, id: Uuid) -> bool {
        self.delete_by_id("cursos", id).await
    }

    async fn find_horario(&self, id: Uuid) -> Option<Horario> {
        self.get_by_id("horarios", id).await
    }

    async fn list_horarios_by_curso(&self, curso_id: Uuid) -> Vec<Horario> {
        self.fetch_docs(
            sqlx::query_scalar("SELECT doc FROM horarios WHERE doc->>'curso' = $1")
                .bind(curso_id.to_string()),
        )
        .await
    }

    async fn save_horario(&self, horario: &Horario) -> Result<(), RepoError> {
        self.upsert("horarios", horario.id, horario).await
    }

    async fn delete_horario(&self, id: Uuid) -> bool {
        self.delete_by_id("horarios", id).await
    }

    async fn find_tech(&self, id: Uuid) -> Option<Tech> {
        self.get_by_id("techs", id).await
    }

    async fn find_tech_by_nombre_version(&self, nombre: &str, version: &str) -> Option<Tech> {
        let row: Option<serde_json::Value> = sqlx::query_scalar(
            "SELECT doc FROM techs WHERE doc->>'nombre' = $1 AND doc->>'version' = $2",
        )
        .bind(nombre)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_tech_by_nombre_version error: {:?}", e);
            None
        });
        row.and_then(|doc| serde_json::from_value(doc).ok())
    }

    async fn list_techs(&self) -> Vec<Tech> {
        self.fetch_docs(sqlx::query_scalar(
            "SELECT doc FROM techs ORDER BY doc->>'nombre'",
        ))
        .await
    }

    async fn list_techs_by_nombre(&self, nombre: &str) -> Vec<Tech> {
        self.fetch_docs(
            sqlx::query_scalar("SELECT doc FROM techs WHERE doc->>'nombre' = $1").bind(nombre),
        )
        .await
    }

    async fn find_techs(&self, ids: &[Uuid]) -> Vec<Tech> {
        self.fetch_docs(
            sqlx::query_scalar("SELECT doc FROM techs WHERE id = ANY($1)").bind(ids.to_vec()),
        )
        .await
    }

    async fn save_tech(&self, tech: &Tech) -> Result<(), RepoError> {
        self.upsert("techs", tech.id, tech).await
    }

    async fn delete_tech(&self, id: Uuid) -> bool {
        self.delete_by_id("techs", id).await
    }

    async fn find_red(&self, id: Uuid) -> Option<RedSocial> {
        self.get_by_id("redes", id).await
    }

    async fn find_red_by_nombre(&self, nombre: &str) -> Option<RedSocial> {
        self.get_one_by_field("redes", "nombre", nombre).await
    }

    async fn list_redes(&self) -> Vec<RedSocial> {
        self.fetch_docs(sqlx::query_scalar(
            "SELECT doc FROM redes ORDER BY doc->>'nombre'",
        ))
        .await
    }

    async fn find_redes(&self, ids: &[Uuid]) -> Vec<RedSocial> {
        self.fetch_docs(
            sqlx::query_scalar("SELECT doc FROM redes WHERE id = ANY($1)").bind(ids.to_vec()),
        )
        .await
    }

    async fn save_red(&self, red: &RedSocial) -> Result<(), RepoError> {
        self.upsert("redes", red.id, red).await
    }

    async fn delete_red(&self, id: Uuid) -> bool {
        self.delete_by_id("redes", id).await
    }
}

/// MemoryRepository
///
/// In-memory implementation used by the integration tests, honoring the same
/// storage contract as Postgres, including uniqueness enforcement for email,
/// tech (nombre, version), and red nombre.
#[derive(Default)]
pub struct MemoryRepository {
    users: RwLock<HashMap<Uuid, User>>,
    cursos: RwLock<HashMap<Uuid, Curso>>,
    horarios: RwLock<HashMap<Uuid, Horario>>,
    techs: RwLock<HashMap<Uuid, Tech>>,
    redes: RwLock<HashMap<Uuid, RedSocial>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user(&self, id: Uuid) -> Option<User> {
        self.users.read().unwrap().get(&id).cloned()
    }

    async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    async fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().unwrap().values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        users
    }

    async fn find_users(&self, ids: &[Uuid]) -> Vec<User> {
        let users = self.users.read().unwrap();
        ids.iter().filter_map(|id| users.get(id).cloned()).collect()
    }

    async fn save_user(&self, user: &User) -> Result<(), RepoError> {
        let mut users = self.users.write().unwrap();
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(RepoError::Duplicate);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> bool {
        self.users.write().unwrap().remove(&id).is_some()
    }

    async fn find_curso(&self, id: Uuid) -> Option<Curso> {
        self.cursos.read().unwrap().get(&id).cloned()
    }

    async fn list_cursos(&self) -> Vec<Curso> {
        let mut cursos: Vec<Curso> = self.cursos.read().unwrap().values().cloned().collect();
        cursos.sort_by_key(|c| c.fecha_inicio);
        cursos
    }

    async fn save_curso(&self, curso: &Curso) -> Result<(), RepoError> {
        self.cursos.write().unwrap().insert(curso.id, curso.clone());
        Ok(())
    }

    async fn delete_curso(&self, id: Uuid) -> bool {
        self.cursos.write().unwrap().remove(&id).is_some()
    }

    async fn find_horario(&self, id: Uuid) -> Option<Horario> {
        self.horarios.read().unwrap().get(&id).cloned()
    }

    async fn list_horarios_by_curso(&self, curso_id: Uuid) -> Vec<Horario> {
        let mut horarios: Vec<Horario> = self
            .horarios
            .read()
            .unwrap()
            .values()
            .filter(|h| h.curso == curso_id)
            .cloned()
            .collect();
        horarios.sort_by_key(|h| h.created_at);
        horarios
    }

    async fn save_horario(&self, horario: &Horario) -> Result<(), RepoError> {
        self.horarios
            .write()
            .unwrap()
            .insert(horario.id, horario.clone());
        Ok(())
    }

    async fn delete_horario(&self, id: Uuid) -> bool {
        self.horarios.write().unwrap().remove(&id).is_some()
    }

    async fn find_tech(&self, id: Uuid) -> Option<Tech> {
        self.techs.read().unwrap().get(&id).cloned()
    }

    async fn find_tech_by_nombre_version(&self, nombre: &str, version: &str) -> Option<Tech> {
        self.techs
            .read()
            .unwrap()
            .values()
            .find(|t| t.nombre == nombre && t.version == version)
            .cloned()
    }

    async fn list_techs(&self) -> Vec<Tech> {
        let mut techs: Vec<Tech> = self.techs.read().unwrap().values().cloned().collect();
        techs.sort_by(|a, b| a.nombre.cmp(&b.nombre));
        techs
    }

    async fn list_techs_by_nombre(&self, nombre: &str) -> Vec<Tech> {
        self.techs
            .read()
            .unwrap()
            .values()
            .filter(|t| t.nombre == nombre)
            .cloned()
            .collect()
    }

    async fn find_techs(&self, ids: &[Uuid]) -> Vec<Tech> {
        let techs = self.techs.read().unwrap();
        ids.iter().filter_map(|id| techs.get(id).cloned()).collect()
    }

    async fn save_tech(&self, tech: &Tech) -> Result<(), RepoError> {
        let mut techs = self.techs.write().unwrap();
        if techs
            .values()
            .any(|t| t.id != tech.id && t.nombre == tech.nombre && t.version == tech.version)
        {
            return Err(RepoError::Duplicate);
        }
        techs.insert(tech.id, tech.clone());
        Ok(())
    }

    async fn delete_tech(&self, id: Uuid) -> bool {
        self.techs.write().unwrap().remove(&id).is_some()
    }

    async fn find_red(&self, id: Uuid) -> Option<RedSocial> {
        self.redes.read().unwrap().get(&id).cloned()
    }

    async fn find_red_by_nombre(&self, nombre: &str) -> Option<RedSocial> {
        self.redes
            .read()
            .unwrap()
            .values()
            .find(|r| r.nombre == nombre)
            .cloned()
    }

    async fn list_redes(&self) -> Vec<RedSocial> {
        let mut redes: Vec<RedSocial> = self.redes.read().unwrap().values().cloned().collect();
        redes.sort_by(|a, b| a.nombre.cmp(&b.nombre));
        redes
    }

    async fn find_redes(&self, ids: &[Uuid]) -> Vec<RedSocial> {
        let redes = self.redes.read().unwrap();
        ids.iter().filter_map(|id| redes.get(id).cloned()).collect()
    }

    async fn save_red(&self, red: &RedSocial) -> Result<(), RepoError> {
        let mut redes = self.redes.write().unwrap();
        if redes
            .values()
            .any(|r| r.id != red.id && r.nombre == red.nombre)
        {
            return Err(RepoError::Duplicate);
        }
        redes.insert(red.id, red.clone());
        Ok(())
    }

    async fn delete_red(&self, id: Uuid) -> bool {
        self.redes.write().unwrap().remove(&id).is_some()
    }
}
