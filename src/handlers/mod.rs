//! Request handlers, one module per entity. Every mutator follows the same
//! shape: validate → role gate / ownership check → load → mutate → save →
//! respond, with failures mapped through `ApiError`.

use std::collections::HashMap;

use axum::extract::Multipart;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{Curso, CursoDetail, RedRef, RedSocialLink, User, UserResponse},
    policy,
    repository::RepositoryState,
    storage::StorageState,
};

pub mod auth;
pub mod cursos;
pub mod horarios;
pub mod redes;
pub mod techs;
pub mod users;

/// FormData
///
/// The decoded content of a multipart request: plain text fields, plus the
/// public URLs of any file parts already proxied to the image store.
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, String>,
}

impl FormData {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(|s| s.as_str())
    }
}

/// Consumes a multipart body. File parts are uploaded to the image store
/// under `folder/` immediately; an upload failure aborts the request.
pub async fn read_form(
    mut multipart: Multipart,
    storage: &StorageState,
    folder: &str,
) -> ApiResult<FormData> {
    let mut fields = HashMap::new();
    let mut files = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(filename) = field.file_name().map(|s| s.to_string()) {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(e.to_string()))?
                .to_vec();
            let url = storage
                .upload(folder, &filename, &content_type, data)
                .await
                .map_err(ApiError::internal)?;
            files.insert(name, url);
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::validation(e.to_string()))?;
            fields.insert(name, text);
        }
    }

    Ok(FormData { fields, files })
}

/// Best-effort removal of a stored image. A failure is logged and never
/// surfaced: the entity mutation has already been decided.
pub async fn delete_image_best_effort(storage: &StorageState, url: Option<&str>) {
    let Some(url) = url else { return };
    if url.is_empty() {
        return;
    }
    if let Err(e) = storage.delete(url).await {
        tracing::warn!("failed to delete stored image {url}: {e}");
    }
}

/// Explicit hydration of a user's social links: the weak RedSocial
/// references are expanded into full documents, dropping dangling ones.
pub async fn hydrate_redes(repo: &RepositoryState, refs: &[RedRef]) -> Vec<RedSocialLink> {
    let ids: Vec<Uuid> = refs.iter().map(|r| r.red).collect();
    let redes = repo.find_redes(&ids).await;
    refs.iter()
        .filter_map(|r| {
            redes
                .iter()
                .find(|red| red.id == r.red)
                .map(|red| RedSocialLink {
                    red: red.clone(),
                    url: r.url.clone(),
                })
        })
        .collect()
}

/// Builds the policy-reduced wire form of a user, including hydrated redes.
pub async fn user_response(repo: &RepositoryState, user: &User) -> UserResponse {
    let redes = hydrate_redes(repo, &user.redes).await;
    policy::apply_visibility(user, redes)
}

/// Explicit hydration of a curso: techs, tutores, estudiantes, and horarios
/// references are expanded. `include_estudiantes` is false for visitor
/// requests, which omits the field from the JSON entirely.
pub async fn curso_detail(
    repo: &RepositoryState,
    curso: Curso,
    include_estudiantes: bool,
) -> CursoDetail {
    let techs = repo.find_techs(&curso.techs).await;

    let mut tutores = Vec::new();
    for tutor in repo.find_users(&curso.tutores).await {
        tutores.push(user_response(repo, &tutor).await);
    }

    let estudiantes = if include_estudiantes {
        let mut out = Vec::new();
        for estudiante in repo.find_users(&curso.estudiantes).await {
            out.push(user_response(repo, &estudiante).await);
        }
        Some(out)
    } else {
        None
    };

    let mut horarios = Vec::new();
    for id in &curso.horarios {
        if let Some(h) = repo.find_horario(*id).await {
            horarios.push(h);
        }
    }

    CursoDetail {
        id: curso.id,
        titulo: curso.titulo,
        descripcion: curso.descripcion,
        fecha_inicio: curso.fecha_inicio,
        fecha_fin: curso.fecha_fin,
        duracion_en_semanas: curso.duracion_en_semanas,
        precio_general: curso.precio_general,
        precio_umss: curso.precio_umss,
        status: curso.status,
        esta_cancelado: curso.esta_cancelado,
        img_curso: curso.img_curso,
        afiche_img: curso.afiche_img,
        techs,
        tutores,
        estudiantes,
        horarios,
        created_at: curso.created_at,
        updated_at: curso.updated_at,
    }
}

/// Parses a multipart field carrying entity references: either a JSON array
/// of UUIDs or a single UUID.
pub fn parse_id_list(value: &str) -> Option<Vec<Uuid>> {
    if let Ok(ids) = serde_json::from_str::<Vec<Uuid>>(value) {
        return Some(ids);
    }
    Uuid::parse_str(value.trim()).ok().map(|id| vec![id])
}
