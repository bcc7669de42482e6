use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    handlers::{delete_image_best_effort, read_form, user_response},
    models::{
        MsgResponse, RedRef, Role, TipoEstudiante, UpdateUserResponse, UserResponse, UserSummary,
        parse_fecha,
    },
    policy,
};

/// list_users
///
/// [Admin Route] Lists every user. Only the field-reduction rule applies
/// here; there is no per-record relationship check on the admin listing.
#[utoipa::path(
    get,
    path = "/api/users",
    responses((status = 200, description = "Usuarios", body = [UserResponse]))
)]
pub async fn list_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    policy::require_role(auth.rol, &[Role::Admin])?;

    let mut out = Vec::new();
    for user in state.repo.list_users().await {
        out.push(user_response(&state.repo, &user).await);
    }
    Ok(Json(out))
}

/// get_user
///
/// [Authenticated Route] Single-user lookup: only an admin or the subject
/// themselves may see the record, and the visibility policy reduces it by
/// the SUBJECT's role before it goes on the wire.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Usuario", body = UserResponse),
        (status = 403, description = "Ni admin ni el propio usuario"),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .repo
        .find_user(id)
        .await
        .ok_or_else(|| ApiError::not_found("Usuario no encontrado"))?;

    policy::require_self_or_admin(auth.id, auth.rol, id)?;

    Ok(Json(user_response(&state.repo, &user).await))
}

/// update_user
///
/// [Authenticated Route] Partial update of a user record (self or admin).
/// Multipart body; a `redes` field travels as a JSON string, an `imagen`
/// file replaces the stored reference. Role-specific rules are re-checked
/// against the SUBJECT's role.
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Usuario actualizado", body = UpdateUserResponse),
        (status = 400, description = "Redes mal formadas o reglas de rol violadas"),
        (status = 403, description = "Ni admin ni el propio usuario"),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<UpdateUserResponse>> {
    policy::require_self_or_admin(auth.id, auth.rol, id)?;

    let mut user = state
        .repo
        .find_user(id)
        .await
        .ok_or_else(|| ApiError::not_found("Usuario no encontrado"))?;

    let form = read_form(multipart, &state.storage, "usuarios").await?;

    let redes: Option<Vec<RedRef>> = match form.field("redes") {
        Some(raw) => Some(
            serde_json::from_str(raw)
                .map_err(|_| ApiError::validation("Formato inválido en redes"))?,
        ),
        None => None,
    };

    // Role-specific rules, keyed by the subject's role.
    if user.rol == Role::Tutor {
        if let Some(ref r) = redes {
            if r.is_empty() {
                return Err(ApiError::validation("El tutor debe tener al menos una red"));
            }
        }
    }

    let tipo_estudiante = match form.field("tipoEstudiante") {
        Some(t) if user.rol == Role::Estudiante => Some(
            TipoEstudiante::parse(t)
                .ok_or_else(|| ApiError::validation("Tipo de estudiante inválido"))?,
        ),
        _ => None,
    };

    if let Some(nombre) = form.field("nombre") {
        user.nombre = nombre.to_string();
    }
    if let Some(apellidos) = form.field("apellidos") {
        user.apellidos = apellidos.to_string();
    }
    if let Some(descripcion) = form.field("descripcion") {
        user.descripcion = Some(descripcion.to_string());
    }
    if let Some(tareas) = form.field("tareasUrl") {
        user.tareas_url = Some(tareas.to_string());
    }
    if let Some(fecha) = form.field("fechaNacimiento") {
        user.fecha_nacimiento =
            parse_fecha(fecha).ok_or_else(|| ApiError::validation("Formato de fecha inválido"))?;
    }
    if let Some(r) = redes {
        user.redes = r;
    }
    if let Some(tipo) = tipo_estudiante {
        user.tipo_estudiante = Some(tipo);
    }
    if let Some(imagen) = form.file("imagen") {
        user.imagen = Some(imagen.to_string());
    }

    user.updated_at = Utc::now();
    state
        .repo
        .save_user(&user)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(UpdateUserResponse {
        msg: "Usuario actualizado".to_string(),
        user: UserSummary {
            id: user.id,
            nombre: user.nombre,
            apellidos: user.apellidos,
            rol: user.rol,
        },
    }))
}

/// delete_user
///
/// [Admin Route] Removes a user and, best-effort, their stored image. An
/// image-store failure is logged and never blocks the deletion.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Usuario e imagen eliminados", body = MsgResponse),
        (status = 403, description = "Solo admin"),
        (status = 404, description = "No existe")
    )
)]
pub async fn delete_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MsgResponse>> {
    policy::require_admin(auth.rol)?;

    let user = state
        .repo
        .find_user(id)
        .await
        .ok_or_else(|| ApiError::not_found("No encontrado"))?;

    delete_image_best_effort(&state.storage, user.imagen.as_deref()).await;
    state.repo.delete_user(id).await;

    Ok(Json(MsgResponse {
        msg: "Usuario e imagen eliminados".to_string(),
    }))
}
