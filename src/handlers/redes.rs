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
    models::{MsgResponse, RedSocial},
    policy,
};

/// list_redes
///
/// [Public Route] The social-network catalog, ordered by nombre.
#[utoipa::path(
    get,
    path = "/api/redes",
    responses((status = 200, description = "Redes sociales", body = [RedSocial]))
)]
pub async fn list_redes(State(state): State<AppState>) -> Json<Vec<RedSocial>> {
    Json(state.repo.list_redes().await)
}

/// create_red
///
/// [Admin Route] Multipart body: `nombre` plus a required `img` file part.
/// nombre is unique across the catalog.
#[utoipa::path(
    post,
    path = "/api/redes",
    responses(
        (status = 201, description = "Red social creada", body = RedSocial),
        (status = 400, description = "Nombre faltante o duplicado"),
        (status = 403, description = "Solo admin")
    )
)]
pub async fn create_red(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<RedSocial>)> {
    policy::require_admin(auth.rol)?;

    let form = read_form(multipart, &state.storage, "redes").await?;

    let img = form
        .file("img")
        .ok_or_else(|| ApiError::validation("Imagen requerida"))?
        .to_string();

    let nombre = form
        .field("nombre")
        .ok_or_else(|| ApiError::validation("El nombre de la red es obligatorio"))?;

    if state.repo.find_red_by_nombre(nombre).await.is_some() {
        return Err(ApiError::conflict("Red social ya existe"));
    }

    let red = RedSocial {
        id: Uuid::new_v4(),
        nombre: nombre.to_string(),
        img,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    match state.repo.save_red(&red).await {
        Ok(()) => Ok((StatusCode::CREATED, Json(red))),
        Err(crate::repository::RepoError::Duplicate) => {
            Err(ApiError::conflict("Red social ya existe"))
        }
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

/// update_red
///
/// [Admin Route] Partial update. Renaming onto another red's nombre is
/// rejected before the store sees it.
#[utoipa::path(
    put,
    path = "/api/redes/{id}",
    params(("id" = Uuid, Path, description = "Red social ID")),
    responses(
        (status = 200, description = "Red social actualizada", body = RedSocial),
        (status = 400, description = "Nombre duplicado"),
        (status = 403, description = "Solo admin"),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_red(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<RedSocial>> {
    policy::require_admin(auth.rol)?;

    let mut red = state
        .repo
        .find_red(id)
        .await
        .ok_or_else(|| ApiError::not_found("No encontrado"))?;

    let form = read_form(multipart, &state.storage, "redes").await?;

    if let Some(nombre) = form.field("nombre") {
        if let Some(other) = state.repo.find_red_by_nombre(nombre).await {
            if other.id != id {
                return Err(ApiError::conflict("Red social ya existe"));
            }
        }
        red.nombre = nombre.to_string();
    }
    if let Some(url) = form.file("img") {
        delete_image_best_effort(&state.storage, Some(&red.img)).await;
        red.img = url.to_string();
    }

    red.updated_at = Utc::now();
    match state.repo.save_red(&red).await {
        Ok(()) => Ok(Json(red)),
        Err(crate::repository::RepoError::Duplicate) => {
            Err(ApiError::conflict("Red social ya existe"))
        }
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

/// delete_red
///
/// [Admin Route] Removes a red together with its stored image.
#[utoipa::path(
    delete,
    path = "/api/redes/{id}",
    params(("id" = Uuid, Path, description = "Red social ID")),
    responses(
        (status = 200, description = "Red e imagen eliminadas", body = MsgResponse),
        (status = 403, description = "Solo admin"),
        (status = 404, description = "No existe")
    )
)]
pub async fn delete_red(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MsgResponse>> {
    policy::require_admin(auth.rol)?;

    let red = state
        .repo
        .find_red(id)
        .await
        .ok_or_else(|| ApiError::not_found("No encontrado"))?;

    delete_image_best_effort(&state.storage, Some(&red.img)).await;
    state.repo.delete_red(id).await;

    Ok(Json(MsgResponse {
        msg: "Red e imagen eliminadas".to_string(),
    }))
}
