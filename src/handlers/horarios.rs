use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::{CreateHorarioRequest, Dia, Horario, Modalidad, MsgResponse, UpdateHorarioRequest},
    policy,
};

/// list_horarios
///
/// [Public Route] All horarios owned by a curso.
#[utoipa::path(
    get,
    path = "/api/cursos/{id}/horarios",
    params(("id" = Uuid, Path, description = "Curso ID")),
    responses((status = 200, description = "Horarios", body = [Horario]))
)]
pub async fn list_horarios(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Horario>> {
    Json(state.repo.list_horarios_by_curso(id).await)
}

/// create_horario
///
/// [Owner Route] Creates a horario under a curso. The owning curso is
/// resolved first and the ownership rule applied; enum and HH:MM inputs are
/// validated at this boundary so failures surface as 400.
#[utoipa::path(
    post,
    path = "/api/cursos/{id}/horarios",
    params(("id" = Uuid, Path, description = "Curso ID")),
    request_body = CreateHorarioRequest,
    responses(
        (status = 201, description = "Horario creado", body = Horario),
        (status = 400, description = "Día, hora o modalidad inválidos"),
        (status = 403, description = "Ni admin ni tutor asignado"),
        (status = 404, description = "Curso no existe")
    )
)]
pub async fn create_horario(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateHorarioRequest>,
) -> ApiResult<(StatusCode, Json<Horario>)> {
    let curso = state
        .repo
        .find_curso(id)
        .await
        .ok_or_else(|| ApiError::not_found("Curso no encontrado"))?;

    policy::require_curso_owner(auth.id, auth.rol, &curso)?;

    let dia = Dia::parse(&payload.dia).ok_or_else(|| ApiError::validation("Día inválido"))?;

    if !policy::hora_valida(&payload.hora_inicio) || !policy::hora_valida(&payload.hora_fin) {
        return Err(ApiError::validation("Formato HH:mm inválido"));
    }

    let modalidad = match payload.modalidad.as_deref() {
        Some(m) => Modalidad::parse(m).ok_or_else(|| ApiError::validation("Modalidad inválida"))?,
        None => Modalidad::Virtual,
    };

    let horario = Horario {
        id: Uuid::new_v4(),
        dia,
        hora_inicio: payload.hora_inicio,
        hora_fin: payload.hora_fin,
        modalidad,
        curso: id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    state
        .repo
        .save_horario(&horario)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(horario)))
}

/// update_horario
///
/// [Owner Route] Partial update. The ownership rule is re-derived against
/// the owning curso resolved from the stored horario, not the path.
#[utoipa::path(
    put,
    path = "/api/cursos/{id}/horarios/{idHorario}",
    params(
        ("id" = Uuid, Path, description = "Curso ID"),
        ("idHorario" = Uuid, Path, description = "Horario ID")
    ),
    request_body = UpdateHorarioRequest,
    responses(
        (status = 200, description = "Horario actualizado", body = Horario),
        (status = 400, description = "Día, hora o modalidad inválidos"),
        (status = 403, description = "Ni admin ni tutor asignado"),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_horario(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((_curso_id, horario_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateHorarioRequest>,
) -> ApiResult<Json<Horario>> {
    let mut horario = state
        .repo
        .find_horario(horario_id)
        .await
        .ok_or_else(|| ApiError::not_found("No encontrado"))?;

    let curso = state
        .repo
        .find_curso(horario.curso)
        .await
        .ok_or_else(|| ApiError::not_found("Curso no encontrado"))?;

    policy::require_curso_owner(auth.id, auth.rol, &curso)?;

    if let Some(dia) = payload.dia.as_deref() {
        horario.dia = Dia::parse(dia).ok_or_else(|| ApiError::validation("Día inválido"))?;
    }
    if let Some(hora) = payload.hora_inicio {
        if !policy::hora_valida(&hora) {
            return Err(ApiError::validation("Formato HH:mm inválido"));
        }
        horario.hora_inicio = hora;
    }
    if let Some(hora) = payload.hora_fin {
        if !policy::hora_valida(&hora) {
            return Err(ApiError::validation("Formato HH:mm inválido"));
        }
        horario.hora_fin = hora;
    }
    if let Some(modalidad) = payload.modalidad.as_deref() {
        horario.modalidad =
            Modalidad::parse(modalidad).ok_or_else(|| ApiError::validation("Modalidad inválida"))?;
    }

    horario.updated_at = Utc::now();
    state
        .repo
        .save_horario(&horario)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(horario))
}

/// delete_horario
///
/// [Owner Route] Removes a horario after the ownership rule passes against
/// the owning curso.
#[utoipa::path(
    delete,
    path = "/api/cursos/{id}/horarios/{idHorario}",
    params(
        ("id" = Uuid, Path, description = "Curso ID"),
        ("idHorario" = Uuid, Path, description = "Horario ID")
    ),
    responses(
        (status = 200, description = "Eliminado", body = MsgResponse),
        (status = 403, description = "Ni admin ni tutor asignado"),
        (status = 404, description = "No existe")
    )
)]
pub async fn delete_horario(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((_curso_id, horario_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MsgResponse>> {
    let horario = state
        .repo
        .find_horario(horario_id)
        .await
        .ok_or_else(|| ApiError::not_found("No encontrado"))?;

    let curso = state
        .repo
        .find_curso(horario.curso)
        .await
        .ok_or_else(|| ApiError::not_found("Curso no encontrado"))?;

    policy::require_curso_owner(auth.id, auth.rol, &curso)?;

    state.repo.delete_horario(horario_id).await;

    Ok(Json(MsgResponse {
        msg: "Eliminado".to_string(),
    }))
}
