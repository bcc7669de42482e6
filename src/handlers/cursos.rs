use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    handlers::{curso_detail, delete_image_best_effort, parse_id_list, read_form},
    models::{
        AddEstudianteRequest, Curso, CursoDetail, CursoStatus, MsgResponse, parse_fecha,
    },
    policy,
};

/// list_cursos
///
/// [Public Route] All cursos ordered by fechaInicio, fully hydrated.
#[utoipa::path(
    get,
    path = "/api/cursos",
    responses((status = 200, description = "Cursos", body = [CursoDetail]))
)]
pub async fn list_cursos(State(state): State<AppState>) -> Json<Vec<CursoDetail>> {
    let mut out = Vec::new();
    for curso in state.repo.list_cursos().await {
        out.push(curso_detail(&state.repo, curso, true).await);
    }
    Json(out)
}

/// get_curso
///
/// [Public Route] Single curso detail. A request without an Authorization
/// header is a visitor view: the `estudiantes` list is omitted from the
/// JSON entirely. Any credential at all switches it back on, regardless of
/// role (preserved observed behavior).
#[utoipa::path(
    get,
    path = "/api/cursos/{id}",
    params(("id" = Uuid, Path, description = "Curso ID")),
    responses(
        (status = 200, description = "Curso", body = CursoDetail),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_curso(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<CursoDetail>> {
    let curso = state
        .repo
        .find_curso(id)
        .await
        .ok_or_else(|| ApiError::not_found("No encontrado"))?;

    let include_estudiantes = headers.contains_key(header::AUTHORIZATION);
    Ok(Json(curso_detail(&state.repo, curso, include_estudiantes).await))
}

/// create_curso
///
/// [Admin Route] Creates a curso from a multipart body carrying the scalar
/// fields, reference lists (JSON arrays or single ids), and the two image
/// files (`imgCurso`, `aficheImg`).
#[utoipa::path(
    post,
    path = "/api/cursos",
    responses(
        (status = 201, description = "Curso creado", body = Curso),
        (status = 400, description = "Campos faltantes o fechas mal formadas"),
        (status = 403, description = "Solo admin")
    )
)]
pub async fn create_curso(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Curso>)> {
    policy::require_admin(auth.rol)?;

    let form = read_form(multipart, &state.storage, "cursos").await?;

    let (
        Some(titulo),
        Some(descripcion),
        Some(fecha_inicio),
        Some(fecha_fin),
        Some(duracion),
        Some(precio_general),
        Some(precio_umss),
        Some(status),
        Some(techs),
        Some(tutores),
        Some(horarios),
    ) = (
        form.field("titulo"),
        form.field("descripcion"),
        form.field("fechaInicio"),
        form.field("fechaFin"),
        form.field("duracionEnSemanas"),
        form.field("precioGeneral"),
        form.field("precioUMSS"),
        form.field("status"),
        form.field("techs"),
        form.field("tutores"),
        form.field("horarios"),
    )
    else {
        return Err(ApiError::validation("Faltan campos requeridos"));
    };

    let fecha_inicio = parse_fecha(fecha_inicio)
        .ok_or_else(|| ApiError::validation("Formato de fecha inválido"))?;
    let fecha_fin =
        parse_fecha(fecha_fin).ok_or_else(|| ApiError::validation("Formato de fecha inválido"))?;

    let duracion_en_semanas: i64 = duracion
        .parse()
        .map_err(|_| ApiError::validation("Formato numérico inválido"))?;
    let precio_general: f64 = precio_general
        .parse()
        .map_err(|_| ApiError::validation("Formato numérico inválido"))?;
    let precio_umss: f64 = precio_umss
        .parse()
        .map_err(|_| ApiError::validation("Formato numérico inválido"))?;

    let status = CursoStatus::parse(status).ok_or_else(|| ApiError::validation("Status inválido"))?;

    let techs = parse_id_list(techs).ok_or_else(|| ApiError::validation("Formato inválido en techs"))?;
    let tutores =
        parse_id_list(tutores).ok_or_else(|| ApiError::validation("Formato inválido en tutores"))?;
    let horarios = parse_id_list(horarios)
        .ok_or_else(|| ApiError::validation("Formato inválido en horarios"))?;

    let curso = Curso {
        id: Uuid::new_v4(),
        titulo: titulo.to_string(),
        descripcion: descripcion.to_string(),
        fecha_inicio,
        fecha_fin,
        duracion_en_semanas,
        precio_general,
        precio_umss,
        status,
        esta_cancelado: false,
        img_curso: form.file("imgCurso").map(|s| s.to_string()),
        afiche_img: form.file("aficheImg").map(|s| s.to_string()),
        techs,
        tutores,
        estudiantes: vec![],
        horarios,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    state
        .repo
        .save_curso(&curso)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(curso)))
}

/// update_curso
///
/// [Owner Route] Partial update. The ownership check admits admins and
/// assigned tutores only. A replaced image deletes the previous object
/// best-effort.
#[utoipa::path(
    put,
    path = "/api/cursos/{id}",
    params(("id" = Uuid, Path, description = "Curso ID")),
    responses(
        (status = 200, description = "Curso actualizado", body = Curso),
        (status = 403, description = "Ni admin ni tutor asignado"),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_curso(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<Curso>> {
    let mut curso = state
        .repo
        .find_curso(id)
        .await
        .ok_or_else(|| ApiError::not_found("No encontrado"))?;

    policy::require_curso_owner(auth.id, auth.rol, &curso)?;

    let form = read_form(multipart, &state.storage, "cursos").await?;

    if let Some(img) = form.file("imgCurso") {
        delete_image_best_effort(&state.storage, curso.img_curso.as_deref()).await;
        curso.img_curso = Some(img.to_string());
    }
    if let Some(afiche) = form.file("aficheImg") {
        delete_image_best_effort(&state.storage, curso.afiche_img.as_deref()).await;
        curso.afiche_img = Some(afiche.to_string());
    }

    if let Some(titulo) = form.field("titulo") {
        curso.titulo = titulo.to_string();
    }
    if let Some(descripcion) = form.field("descripcion") {
        curso.descripcion = descripcion.to_string();
    }
    if let Some(fecha) = form.field("fechaInicio") {
        curso.fecha_inicio =
            parse_fecha(fecha).ok_or_else(|| ApiError::validation("Formato de fecha inválido"))?;
    }
    if let Some(fecha) = form.field("fechaFin") {
        curso.fecha_fin =
            parse_fecha(fecha).ok_or_else(|| ApiError::validation("Formato de fecha inválido"))?;
    }
    if let Some(duracion) = form.field("duracionEnSemanas") {
        curso.duracion_en_semanas = duracion
            .parse()
            .map_err(|_| ApiError::validation("Formato numérico inválido"))?;
    }
    if let Some(precio) = form.field("precioGeneral") {
        curso.precio_general = precio
            .parse()
            .map_err(|_| ApiError::validation("Formato numérico inválido"))?;
    }
    if let Some(precio) = form.field("precioUMSS") {
        curso.precio_umss = precio
            .parse()
            .map_err(|_| ApiError::validation("Formato numérico inválido"))?;
    }
    if let Some(status) = form.field("status") {
        curso.status =
            CursoStatus::parse(status).ok_or_else(|| ApiError::validation("Status inválido"))?;
    }
    if let Some(cancelado) = form.field("estaCancelado") {
        curso.esta_cancelado = cancelado == "true";
    }
    if let Some(techs) = form.field("techs") {
        curso.techs =
            parse_id_list(techs).ok_or_else(|| ApiError::validation("Formato inválido en techs"))?;
    }
    if let Some(tutores) = form.field("tutores") {
        curso.tutores = parse_id_list(tutores)
            .ok_or_else(|| ApiError::validation("Formato inválido en tutores"))?;
    }
    if let Some(horarios) = form.field("horarios") {
        curso.horarios = parse_id_list(horarios)
            .ok_or_else(|| ApiError::validation("Formato inválido en horarios"))?;
    }

    curso.updated_at = Utc::now();
    state
        .repo
        .save_curso(&curso)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(curso))
}

/// delete_curso
///
/// [Admin Route] Removes a curso and both stored images (best-effort). The
/// curso's horarios are left in place: cascade is not enforced here.
#[utoipa::path(
    delete,
    path = "/api/cursos/{id}",
    params(("id" = Uuid, Path, description = "Curso ID")),
    responses(
        (status = 200, description = "Curso e imágenes eliminadas", body = MsgResponse),
        (status = 403, description = "Solo admin"),
        (status = 404, description = "No existe")
    )
)]
pub async fn delete_curso(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MsgResponse>> {
    policy::require_admin(auth.rol)?;

    let curso = state
        .repo
        .find_curso(id)
        .await
        .ok_or_else(|| ApiError::not_found("No encontrado"))?;

    delete_image_best_effort(&state.storage, curso.img_curso.as_deref()).await;
    delete_image_best_effort(&state.storage, curso.afiche_img.as_deref()).await;
    state.repo.delete_curso(id).await;

    Ok(Json(MsgResponse {
        msg: "Curso e imágenes eliminadas".to_string(),
    }))
}

/// add_estudiante
///
/// [Owner Route] Enrolls a user. A duplicate enrollment is rejected before
/// the save.
#[utoipa::path(
    post,
    path = "/api/cursos/{id}/estudiantes",
    params(("id" = Uuid, Path, description = "Curso ID")),
    request_body = AddEstudianteRequest,
    responses(
        (status = 200, description = "Inscrito", body = Curso),
        (status = 400, description = "Ya inscrito"),
        (status = 403, description = "Ni admin ni tutor asignado"),
        (status = 404, description = "Curso no existe")
    )
)]
pub async fn add_estudiante(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddEstudianteRequest>,
) -> ApiResult<Json<Curso>> {
    let mut curso = state
        .repo
        .find_curso(id)
        .await
        .ok_or_else(|| ApiError::not_found("Curso no encontrado"))?;

    policy::require_curso_owner(auth.id, auth.rol, &curso)?;

    if curso.estudiantes.contains(&payload.user_id) {
        return Err(ApiError::conflict("Ya inscrito"));
    }

    curso.estudiantes.push(payload.user_id);
    curso.updated_at = Utc::now();
    state
        .repo
        .save_curso(&curso)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(curso))
}

/// remove_estudiante
///
/// [Owner Route] Unenrolls a user. Removing an id that is not enrolled is a
/// no-op, as in the original contract.
#[utoipa::path(
    delete,
    path = "/api/cursos/{id}/estudiantes/{userId}",
    params(
        ("id" = Uuid, Path, description = "Curso ID"),
        ("userId" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Curso actualizado", body = Curso),
        (status = 403, description = "Ni admin ni tutor asignado"),
        (status = 404, description = "Curso no existe")
    )
)]
pub async fn remove_estudiante(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Curso>> {
    let mut curso = state
        .repo
        .find_curso(id)
        .await
        .ok_or_else(|| ApiError::not_found("Curso no encontrado"))?;

    policy::require_curso_owner(auth.id, auth.rol, &curso)?;

    curso.estudiantes.retain(|e| *e != user_id);
    curso.updated_at = Utc::now();
    state
        .repo
        .save_curso(&curso)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(curso))
}
