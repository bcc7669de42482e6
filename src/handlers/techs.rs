use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    handlers::{delete_image_best_effort, read_form},
    models::{MsgResponse, Tech},
    policy,
};

/// list_techs
///
/// [Public Route] The full catalog, ordered by nombre.
#[utoipa::path(
    get,
    path = "/api/techs",
    responses((status = 200, description = "Tecnologías", body = [Tech]))
)]
pub async fn list_techs(State(state): State<AppState>) -> Json<Vec<Tech>> {
    Json(state.repo.list_techs().await)
}

/// get_tech_by_nombre
///
/// [Public Route] Every version of a tech. An unknown nombre is a 404, not
/// an empty list.
#[utoipa::path(
    get,
    path = "/api/techs/{nombre}",
    params(("nombre" = String, Path, description = "Tech name")),
    responses(
        (status = 200, description = "Versiones", body = [Tech]),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_tech_by_nombre(
    State(state): State<AppState>,
    Path(nombre): Path<String>,
) -> ApiResult<Json<Vec<Tech>>> {
    let techs = state.repo.list_techs_by_nombre(&nombre).await;
    if techs.is_empty() {
        return Err(ApiError::not_found("Tecnología no encontrada"));
    }
    Ok(Json(techs))
}

/// get_tech_by_version
///
/// [Public Route] One exact (nombre, version) document.
#[utoipa::path(
    get,
    path = "/api/techs/{nombre}/{version}",
    params(
        ("nombre" = String, Path, description = "Tech name"),
        ("version" = String, Path, description = "Tech version")
    ),
    responses(
        (status = 200, description = "Tecnología", body = Tech),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_tech_by_version(
    State(state): State<AppState>,
    Path((nombre, version)): Path<(String, String)>,
) -> ApiResult<Json<Tech>> {
    state
        .repo
        .find_tech_by_nombre_version(&nombre, &version)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Versión no encontrada"))
}

/// create_tech
///
/// [Admin Route] Multipart body: `nombre`, `version`, and a required
/// `imgUrl` file part. (nombre, version) uniqueness is enforced by the
/// store and reported as a duplicate here.
#[utoipa::path(
    post,
    path = "/api/techs",
    responses(
        (status = 201, description = "Tecnología creada", body = Tech),
        (status = 400, description = "Campos faltantes o versión duplicada"),
        (status = 403, description = "Solo admin")
    )
)]
pub async fn create_tech(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Tech>)> {
    policy::require_admin(auth.rol)?;

    let form = read_form(multipart, &state.storage, "techs").await?;

    let img_url = form
        .file("imgUrl")
        .ok_or_else(|| ApiError::validation("Imagen requerida"))?
        .to_string();

    let (Some(nombre), Some(version)) = (form.field("nombre"), form.field("version")) else {
        return Err(ApiError::validation("Nombre y versión son requeridos"));
    };

    let tech = Tech {
        id: Uuid::new_v4(),
        nombre: nombre.to_string(),
        version: version.to_string(),
        img_url: Some(img_url),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    match state.repo.save_tech(&tech).await {
        Ok(()) => Ok((StatusCode::CREATED, Json(tech))),
        Err(crate::repository::RepoError::Duplicate) => Err(ApiError::conflict(
            "Esta versión de la tecnología ya existe",
        )),
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

/// update_tech
///
/// [Admin Route] Partial update by id. A replacement `imgUrl` file swaps
/// the stored reference and drops the old object best-effort.
#[utoipa::path(
    put,
    path = "/api/techs/{nombre}",
    params(("nombre" = Uuid, Path, description = "Tech ID")),
    responses(
        (status = 200, description = "Tecnología actualizada", body = Tech),
        (status = 400, description = "Versión duplicada"),
        (status = 403, description = "Solo admin"),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_tech(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<Tech>> {
    policy::require_admin(auth.rol)?;

    let mut tech = state
        .repo
        .find_tech(id)
        .await
        .ok_or_else(|| ApiError::not_found("No encontrado"))?;

    let form = read_form(multipart, &state.storage, "techs").await?;

    if let Some(nombre) = form.field("nombre") {
        tech.nombre = nombre.to_string();
    }
    if let Some(version) = form.field("version") {
        tech.version = version.to_string();
    }
    if let Some(url) = form.file("imgUrl") {
        delete_image_best_effort(&state.storage, tech.img_url.as_deref()).await;
        tech.img_url = Some(url.to_string());
    }

    tech.updated_at = Utc::now();
    match state.repo.save_tech(&tech).await {
        Ok(()) => Ok(Json(tech)),
        Err(crate::repository::RepoError::Duplicate) => Err(ApiError::conflict(
            "Esta versión de la tecnología ya existe",
        )),
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

/// delete_tech
///
/// [Admin Route] Removes a tech by id together with its stored image.
#[utoipa::path(
    delete,
    path = "/api/techs/{nombre}",
    params(("nombre" = Uuid, Path, description = "Tech ID")),
    responses(
        (status = 200, description = "Tech e imagen eliminadas", body = MsgResponse),
        (status = 403, description = "Solo admin"),
        (status = 404, description = "No existe")
    )
)]
pub async fn delete_tech(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MsgResponse>> {
    policy::require_admin(auth.rol)?;

    let tech = state
        .repo
        .find_tech(id)
        .await
        .ok_or_else(|| ApiError::not_found("No encontrado"))?;

    delete_image_best_effort(&state.storage, tech.img_url.as_deref()).await;
    state.repo.delete_tech(id).await;

    Ok(Json(MsgResponse {
        msg: "Tech e imagen eliminadas".to_string(),
    }))
}

/// delete_tech_by_version
///
/// [Admin Route] Removes one exact (nombre, version) document.
#[utoipa::path(
    delete,
    path = "/api/techs/{nombre}/{version}",
    params(
        ("nombre" = String, Path, description = "Tech name"),
        ("version" = String, Path, description = "Tech version")
    ),
    responses(
        (status = 200, description = "Tech versión eliminada", body = MsgResponse),
        (status = 403, description = "Solo admin"),
        (status = 404, description = "No existe")
    )
)]
pub async fn delete_tech_by_version(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((nombre, version)): Path<(String, String)>,
) -> ApiResult<Json<MsgResponse>> {
    policy::require_admin(auth.rol)?;

    let tech = state
        .repo
        .find_tech_by_nombre_version(&nombre, &version)
        .await
        .ok_or_else(|| ApiError::not_found("Versión no encontrada"))?;

    delete_image_best_effort(&state.storage, tech.img_url.as_deref()).await;
    state.repo.delete_tech(tech.id).await;

    Ok(Json(MsgResponse {
        msg: "Tech versión eliminada".to_string(),
    }))
}
