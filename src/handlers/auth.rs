use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AuthUser, hash_password, sign_token, verify_password},
    error::{ApiError, ApiResult},
    handlers::read_form,
    models::{
        ChangePasswordRequest, LoginRequest, LoginResponse, MsgResponse, RedRef, RegisterResponse,
        Role, TipoEstudiante, User, parse_fecha,
    },
    policy,
};

/// register
///
/// [Admin Route] Creates a user of any role. Multipart body: the basic
/// identity fields, the role-specific cluster, an optional `imagen` file
/// (proxied to the image store), and `redes` as a JSON-encoded array.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    responses(
        (status = 201, description = "Usuario creado", body = RegisterResponse),
        (status = 400, description = "Campos faltantes, rol mal formado o email duplicado"),
        (status = 403, description = "Caller no es admin")
    )
)]
pub async fn register(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    policy::require_role(auth.rol, &[Role::Admin])?;

    let form = read_form(multipart, &state.storage, "usuarios").await?;

    let (Some(nombre), Some(apellidos), Some(email), Some(password), Some(fecha)) = (
        form.field("nombre"),
        form.field("apellidos"),
        form.field("email"),
        form.field("password"),
        form.field("fechaNacimiento"),
    ) else {
        return Err(ApiError::validation("Campos básicos requeridos"));
    };

    let rol = match form.field("rol") {
        Some(r) => Role::parse(r).ok_or_else(|| ApiError::validation("Rol inválido"))?,
        None => Role::Estudiante,
    };

    let fecha_nacimiento =
        parse_fecha(fecha).ok_or_else(|| ApiError::validation("Formato de fecha inválido"))?;

    if state.repo.find_user_by_email(email).await.is_some() {
        return Err(ApiError::conflict("Usuario ya existe"));
    }

    // `redes` travels as a JSON string inside the multipart form.
    let redes: Vec<RedRef> = match form.field("redes") {
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!("unparseable redes payload: {e}");
            vec![]
        }),
        None => vec![],
    };

    let mut user = User {
        id: Uuid::new_v4(),
        nombre: nombre.to_string(),
        apellidos: apellidos.to_string(),
        email: email.to_string(),
        password: hash_password(password)?,
        rol,
        fecha_nacimiento,
        descripcion: None,
        imagen: form.file("imagen").map(|s| s.to_string()),
        tareas_url: None,
        tipo_estudiante: None,
        redes: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    match rol {
        Role::Admin => {}
        Role::Tutor => {
            if redes.is_empty() {
                return Err(ApiError::validation("Las redes son requeridas para tutores"));
            }
            user.descripcion = Some(form.field("descripcion").unwrap_or("").to_string());
            user.redes = redes;
        }
        Role::Estudiante => {
            let tipo = form
                .field("tipoEstudiante")
                .ok_or_else(|| ApiError::validation("tipoEstudiante es requerido para estudiantes"))?;
            user.tipo_estudiante = Some(
                TipoEstudiante::parse(tipo)
                    .ok_or_else(|| ApiError::validation("Tipo de estudiante inválido"))?,
            );
            user.tareas_url = Some(form.field("tareasUrl").unwrap_or("").to_string());
            if !redes.is_empty() {
                user.redes = redes;
            }
        }
    }

    match state.repo.save_user(&user).await {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(RegisterResponse {
                msg: "Usuario creado".to_string(),
                id: user.id,
                rol: user.rol,
            }),
        )),
        Err(crate::repository::RepoError::Duplicate) => Err(ApiError::conflict("Usuario ya existe")),
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

/// login
///
/// [Public Route] Verifies the credentials and issues a signed bearer token.
/// Both an unknown email and a wrong password produce the same response.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token emitido", body = LoginResponse),
        (status = 400, description = "Credenciales inválidas")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .repo
        .find_user_by_email(&payload.email)
        .await
        .ok_or_else(|| ApiError::validation("Credenciales inválidas"))?;

    if !verify_password(&payload.password, &user.password) {
        return Err(ApiError::validation("Credenciales inválidas"));
    }

    let token = sign_token(user.id, &state.config)?;

    Ok(Json(LoginResponse {
        token,
        nombre: user.nombre,
        email: user.email,
        role: user.rol,
    }))
}

/// change_password
///
/// [Authenticated Route] Rotates the caller's own password after verifying
/// the current one.
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password actualizado", body = MsgResponse),
        (status = 400, description = "Password actual incorrecto"),
        (status = 404, description = "Usuario no encontrado")
    )
)]
pub async fn change_password(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MsgResponse>> {
    let mut user = state
        .repo
        .find_user(auth.id)
        .await
        .ok_or_else(|| ApiError::not_found("Usuario no encontrado"))?;

    if !verify_password(&payload.current_password, &user.password) {
        return Err(ApiError::validation("Password actual incorrecto"));
    }

    user.password = hash_password(&payload.new_password)?;
    user.updated_at = Utc::now();
    state
        .repo
        .save_user(&user)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(MsgResponse {
        msg: "Password actualizado".to_string(),
    }))
}
