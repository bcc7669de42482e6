use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enumerations ---

/// Role
///
/// Determines both access rights and which optional field cluster a User
/// record carries (tutor fields vs. estudiante fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Tutor,
    Estudiante,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "tutor" => Some(Role::Tutor),
            "estudiante" => Some(Role::Estudiante),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Tutor => "tutor",
            Role::Estudiante => "estudiante",
        }
    }
}

/// TipoEstudiante
///
/// Origin of an enrolled student: external, or one of the two institutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TipoEstudiante {
    Externo,
    Scesi,
    Umss,
}

impl TipoEstudiante {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "externo" => Some(TipoEstudiante::Externo),
            "scesi" => Some(TipoEstudiante::Scesi),
            "umss" => Some(TipoEstudiante::Umss),
            _ => None,
        }
    }
}

/// CursoStatus
///
/// A plain settable field: there is no enforced transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum CursoStatus {
    #[serde(rename = "Por Iniciar")]
    PorIniciar,
    #[serde(rename = "En Progreso")]
    EnProgreso,
    #[serde(rename = "Finalizado")]
    Finalizado,
}

impl CursoStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Por Iniciar" => Some(CursoStatus::PorIniciar),
            "En Progreso" => Some(CursoStatus::EnProgreso),
            "Finalizado" => Some(CursoStatus::Finalizado),
            _ => None,
        }
    }
}

/// Dia
///
/// Day of the week, accented spelling on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Dia {
    Lunes,
    Martes,
    #[serde(rename = "Miércoles")]
    Miercoles,
    Jueves,
    Viernes,
    #[serde(rename = "Sábado")]
    Sabado,
    Domingo,
}

impl Dia {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Lunes" => Some(Dia::Lunes),
            "Martes" => Some(Dia::Martes),
            "Miércoles" => Some(Dia::Miercoles),
            "Jueves" => Some(Dia::Jueves),
            "Viernes" => Some(Dia::Viernes),
            "Sábado" => Some(Dia::Sabado),
            "Domingo" => Some(Dia::Domingo),
            _ => None,
        }
    }
}

/// Modalidad
///
/// Delivery mode of a scheduled session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Modalidad {
    #[serde(rename = "virtual")]
    Virtual,
    #[serde(rename = "presencial")]
    Presencial,
    #[serde(rename = "híbrido")]
    Hibrido,
}

impl Modalidad {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "virtual" => Some(Modalidad::Virtual),
            "presencial" => Some(Modalidad::Presencial),
            "híbrido" => Some(Modalidad::Hibrido),
            _ => None,
        }
    }
}

// --- Storage Entities (JSONB documents) ---

/// RedRef
///
/// A (social network, profile URL) pair carried by tutor and estudiante users.
/// The `red` field is a weak reference hydrated explicitly by handlers.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RedRef {
    pub red: Uuid,
    pub url: String,
}

/// User
///
/// The canonical identity record as persisted. The password hash is part of
/// the document but is never serialized to clients: every outbound
/// representation goes through `policy::apply_visibility`, which produces a
/// `UserResponse` without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub nombre: String,
    pub apellidos: String,
    pub email: String,
    // Argon2 digest, not plaintext.
    pub password: String,
    pub rol: Role,
    pub fecha_nacimiento: DateTime<Utc>,
    pub descripcion: Option<String>,
    pub imagen: Option<String>,
    pub tareas_url: Option<String>,
    pub tipo_estudiante: Option<TipoEstudiante>,
    pub redes: Vec<RedRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Curso
///
/// The tutores set is the authorization anchor for ownership checks.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Curso {
    pub id: Uuid,
    pub titulo: String,
    pub descripcion: String,
    #[ts(type = "string")]
    pub fecha_inicio: DateTime<Utc>,
    #[ts(type = "string")]
    pub fecha_fin: DateTime<Utc>,
    pub duracion_en_semanas: i64,
    pub precio_general: f64,
    #[serde(rename = "precioUMSS")]
    #[ts(rename = "precioUMSS")]
    pub precio_umss: f64,
    pub status: CursoStatus,
    pub esta_cancelado: bool,
    pub img_curso: Option<String>,
    pub afiche_img: Option<String>,
    pub techs: Vec<Uuid>,
    pub tutores: Vec<Uuid>,
    pub estudiantes: Vec<Uuid>,
    pub horarios: Vec<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Horario
///
/// A scheduled session owned by a single Curso.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Horario {
    pub id: Uuid,
    pub dia: Dia,
    // HH:MM, strictly matched by `policy::HORA_RE` at the mutator boundary.
    pub hora_inicio: String,
    pub hora_fin: String,
    pub modalidad: Modalidad,
    pub curso: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Tech
///
/// (nombre, version) is unique together.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Tech {
    pub id: Uuid,
    pub nombre: String,
    pub version: String,
    pub img_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// RedSocial
///
/// nombre is unique.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RedSocial {
    pub id: Uuid,
    pub nombre: String,
    pub img: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Response Representations (Output Schemas) ---

/// RedSocialLink
///
/// A hydrated social link: the weak `red` reference expanded into the full
/// RedSocial document.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RedSocialLink {
    pub red: RedSocial,
    pub url: String,
}

/// UserResponse
///
/// The reduced wire representation of a User, produced exclusively by
/// `policy::apply_visibility`. Fields the policy dropped are absent from the
/// JSON entirely, not null.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserResponse {
    pub id: Uuid,
    pub nombre: String,
    pub apellidos: String,
    pub email: String,
    pub rol: Role,
    #[ts(type = "string")]
    pub fecha_nacimiento: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tareas_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_estudiante: Option<TipoEstudiante>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redes: Option<Vec<RedSocialLink>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CursoDetail
///
/// A Curso with its weak references expanded (explicit hydration, performed
/// by the handlers). `estudiantes` is omitted entirely for visitor requests.
#[derive(Debug, Clone, Serialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CursoDetail {
    pub id: Uuid,
    pub titulo: String,
    pub descripcion: String,
    #[ts(type = "string")]
    pub fecha_inicio: DateTime<Utc>,
    #[ts(type = "string")]
    pub fecha_fin: DateTime<Utc>,
    pub duracion_en_semanas: i64,
    pub precio_general: f64,
    #[serde(rename = "precioUMSS")]
    #[ts(rename = "precioUMSS")]
    pub precio_umss: f64,
    pub status: CursoStatus,
    pub esta_cancelado: bool,
    pub img_curso: Option<String>,
    pub afiche_img: Option<String>,
    pub techs: Vec<Tech>,
    pub tutores: Vec<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estudiantes: Option<Vec<UserResponse>>,
    pub horarios: Vec<Horario>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /api/auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// A signed bearer token plus the basic identity echoed back to the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub nombre: String,
    pub email: String,
    pub role: Role,
}

/// ChangePasswordRequest
///
/// Input payload for POST /api/auth/change-password.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// RegisterResponse
///
/// 201 payload of POST /api/auth/register.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterResponse {
    pub msg: String,
    pub id: Uuid,
    pub rol: Role,
}

/// AddEstudianteRequest
///
/// Input payload for POST /api/cursos/{id}/estudiantes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AddEstudianteRequest {
    pub user_id: Uuid,
}

/// CreateHorarioRequest
///
/// Enum fields arrive as plain strings and are validated at the mutator
/// boundary so failures surface as 400 with a field-naming message.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateHorarioRequest {
    pub dia: String,
    pub hora_inicio: String,
    pub hora_fin: String,
    pub modalidad: Option<String>,
}

/// UpdateHorarioRequest
///
/// Partial update payload; only provided fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateHorarioRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dia: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hora_inicio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hora_fin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalidad: Option<String>,
}

/// UserSummary
///
/// The compact identity echo returned after a user update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserSummary {
    pub id: Uuid,
    pub nombre: String,
    pub apellidos: String,
    pub rol: Role,
}

/// UpdateUserResponse
///
/// Payload of PATCH /api/users/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateUserResponse {
    pub msg: String,
    pub user: UserSummary,
}

/// MsgResponse
///
/// Generic `{msg}` status payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MsgResponse {
    pub msg: String,
}

// --- Helpers ---

/// Parses a date accepted on the wire: RFC 3339 first, then a bare
/// `YYYY-MM-DD` interpreted as midnight UTC.
pub fn parse_fecha(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
}
