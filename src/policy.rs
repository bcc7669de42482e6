//! Authorization and field-visibility policy.
//!
//! Every access decision the API makes lives here as pure data plus a small
//! evaluation function, so the per-entity handlers never branch on roles
//! themselves:
//!
//! - the role gate (`require_role`, `require_admin`), with admin as an
//!   implicit superset over every allowed-role set;
//! - the course ownership check (`require_curso_owner`), shared by curso
//!   update, enrollment management, and all horario mutations;
//! - the field-visibility table (`apply_visibility`), keyed by the SUBJECT
//!   record's role, which produces the reduced `UserResponse` wire form.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{Curso, RedSocialLink, Role, User, UserResponse},
};

/// Strict HH:MM pattern applied to horario time strings.
pub static HORA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").unwrap());

/// Returns true when `s` is a well-formed HH:MM time string.
pub fn hora_valida(s: &str) -> bool {
    HORA_RE.is_match(s)
}

// --- Role Gate ---

/// Permits the request if the allowed set is empty (no role restriction),
/// the caller's role is in the set, or the caller is admin.
pub fn require_role(rol: Role, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.is_empty() || allowed.contains(&rol) || rol == Role::Admin {
        return Ok(());
    }
    Err(ApiError::forbidden("Acceso denegado"))
}

/// Admin-only operations (user delete, curso create/delete, tech and red
/// writes) reject with the dedicated message.
pub fn require_admin(rol: Role) -> Result<(), ApiError> {
    if rol == Role::Admin {
        return Ok(());
    }
    Err(ApiError::forbidden("Solo admin"))
}

/// Single-user lookup and update: only an admin or the subject themselves.
pub fn require_self_or_admin(
    caller_id: Uuid,
    caller_rol: Role,
    subject_id: Uuid,
) -> Result<(), ApiError> {
    if caller_rol == Role::Admin || caller_id == subject_id {
        return Ok(());
    }
    Err(ApiError::forbidden("Acceso denegado"))
}

// --- Ownership Check ---

/// A caller may mutate a curso iff they are admin or their id appears in the
/// curso's tutores set.
pub fn owns_curso(caller_id: Uuid, caller_rol: Role, curso: &Curso) -> bool {
    caller_rol == Role::Admin || curso.tutores.contains(&caller_id)
}

/// The single rule applied to curso update, enrollment add/remove, and every
/// horario mutation (which resolve the owning curso first).
pub fn require_curso_owner(
    caller_id: Uuid,
    caller_rol: Role,
    curso: &Curso,
) -> Result<(), ApiError> {
    if owns_curso(caller_id, caller_rol, curso) {
        return Ok(());
    }
    Err(ApiError::forbidden("Acceso denegado"))
}

// --- Field Visibility ---

/// The user fields subject to visibility reduction. Fixed identity fields
/// (nombre, apellidos, email, rol, fechaNacimiento) are always visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Descripcion,
    Imagen,
    Redes,
    TareasUrl,
    TipoEstudiante,
}

/// One row of the visibility table.
pub struct VisibilityRule {
    /// Fields removed from the wire form unconditionally.
    pub always_drop: &'static [UserField],
    /// Fields removed only when the stored value is empty.
    pub drop_if_empty: &'static [UserField],
}

static ADMIN_RULE: VisibilityRule = VisibilityRule {
    always_drop: &[
        UserField::Redes,
        UserField::TareasUrl,
        UserField::TipoEstudiante,
        UserField::Descripcion,
    ],
    drop_if_empty: &[UserField::Imagen],
};

static TUTOR_RULE: VisibilityRule = VisibilityRule {
    always_drop: &[UserField::TareasUrl, UserField::TipoEstudiante],
    drop_if_empty: &[UserField::Descripcion, UserField::Imagen],
};

static ESTUDIANTE_RULE: VisibilityRule = VisibilityRule {
    always_drop: &[UserField::Descripcion],
    drop_if_empty: &[UserField::Redes, UserField::Imagen, UserField::TareasUrl],
};

/// The rule row for a subject role.
pub fn visibility_rule(rol: Role) -> &'static VisibilityRule {
    match rol {
        Role::Admin => &ADMIN_RULE,
        Role::Tutor => &TUTOR_RULE,
        Role::Estudiante => &ESTUDIANTE_RULE,
    }
}

fn field_is_empty(field: UserField, user: &User) -> bool {
    match field {
        UserField::Descripcion => user.descripcion.as_deref().unwrap_or("").is_empty(),
        UserField::Imagen => user.imagen.as_deref().unwrap_or("").is_empty(),
        UserField::Redes => user.redes.is_empty(),
        UserField::TareasUrl => user.tareas_url.as_deref().unwrap_or("").is_empty(),
        UserField::TipoEstudiante => user.tipo_estudiante.is_none(),
    }
}

/// True when the field survives reduction for this subject.
pub fn field_visible(field: UserField, user: &User) -> bool {
    let rule = visibility_rule(user.rol);
    if rule.always_drop.contains(&field) {
        return false;
    }
    if rule.drop_if_empty.contains(&field) && field_is_empty(field, user) {
        return false;
    }
    true
}

/// The single evaluation function of the visibility policy: reduces a stored
/// User to its wire representation. The password hash never crosses this
/// boundary. `redes` carries the caller-hydrated social links and is only
/// attached when the policy keeps the field.
pub fn apply_visibility(user: &User, redes: Vec<RedSocialLink>) -> UserResponse {
    UserResponse {
        id: user.id,
        nombre: user.nombre.clone(),
        apellidos: user.apellidos.clone(),
        email: user.email.clone(),
        rol: user.rol,
        fecha_nacimiento: user.fecha_nacimiento,
        descripcion: if field_visible(UserField::Descripcion, user) {
            user.descripcion.clone()
        } else {
            None
        },
        imagen: if field_visible(UserField::Imagen, user) {
            user.imagen.clone()
        } else {
            None
        },
        tareas_url: if field_visible(UserField::TareasUrl, user) {
            user.tareas_url.clone()
        } else {
            None
        },
        tipo_estudiante: if field_visible(UserField::TipoEstudiante, user) {
            user.tipo_estudiante
        } else {
            None
        },
        redes: if field_visible(UserField::Redes, user) {
            Some(redes)
        } else {
            None
        },
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}
