use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has passed the
/// authentication layer. Every handler here relies on the `AuthUser`
/// extractor middleware being present on the router layer above this module,
/// then applies its own per-record rule: self-or-admin for user records,
/// curso ownership (admin or assigned tutor) for curso mutations.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/auth/change-password
        // Rotates the caller's own password after verifying the current one.
        .route(
            "/api/auth/change-password",
            post(handlers::auth::change_password),
        )
        // GET/PATCH /api/users/{id}
        // Single-user read and partial update, self-or-admin only. The read
        // is reduced by the visibility policy keyed on the SUBJECT's role.
        .route(
            "/api/users/{id}",
            get(handlers::users::get_user).patch(handlers::users::update_user),
        )
        // PUT /api/cursos/{id}
        // Partial curso update; admin or assigned tutor.
        .route("/api/cursos/{id}", put(handlers::cursos::update_curso))
        // POST /api/cursos/{id}/estudiantes
        // Enrollment; a duplicate enrollment is rejected.
        .route(
            "/api/cursos/{id}/estudiantes",
            post(handlers::cursos::add_estudiante),
        )
        // DELETE /api/cursos/{id}/estudiantes/{userId}
        // Unenrollment; removing an id that is not enrolled is a no-op.
        .route(
            "/api/cursos/{id}/estudiantes/{userId}",
            delete(handlers::cursos::remove_estudiante),
        )
        // POST /api/cursos/{id}/horarios
        // Adds a session to the curso's schedule; admin or assigned tutor.
        .route(
            "/api/cursos/{id}/horarios",
            post(handlers::horarios::create_horario),
        )
        // PUT/DELETE /api/cursos/{id}/horarios/{idHorario}
        // Session mutation; ownership is re-derived from the stored horario.
        .route(
            "/api/cursos/{id}/horarios/{idHorario}",
            put(handlers::horarios::update_horario).delete(handlers::horarios::delete_horario),
        )
}
