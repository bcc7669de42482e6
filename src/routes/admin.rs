use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin Router Module
///
/// Defines the routes restricted to the 'admin' role: user administration and
/// catalog mutation. Authentication happens through the `AuthUser` extractor
/// each handler takes; the explicit admin role check is then performed inside
/// the handler before any work, so no request reaches a mutation without both
/// layers passing.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /api/auth/register
        // Admin-driven account creation, any role.
        .route("/api/auth/register", post(handlers::auth::register))
        // GET /api/users
        // The full user listing, reduced per-record by the visibility policy.
        .route("/api/users", get(handlers::users::list_users))
        // DELETE /api/users/{id}
        // Removes a user and, best-effort, their stored image.
        .route("/api/users/{id}", delete(handlers::users::delete_user))
        // POST /api/cursos
        .route("/api/cursos", post(handlers::cursos::create_curso))
        // DELETE /api/cursos/{id}
        .route("/api/cursos/{id}", delete(handlers::cursos::delete_curso))
        // POST /api/techs
        .route("/api/techs", post(handlers::techs::create_tech))
        // PUT/DELETE /api/techs/{nombre}
        // By-id tech mutation. The path segment must spell the same as the
        // public by-nombre GET for the routers to merge, but these handlers
        // extract it as the tech's UUID.
        .route(
            "/api/techs/{nombre}",
            put(handlers::techs::update_tech).delete(handlers::techs::delete_tech),
        )
        // DELETE /api/techs/{nombre}/{version}
        // Removes one exact (nombre, version) document.
        .route(
            "/api/techs/{nombre}/{version}",
            delete(handlers::techs::delete_tech_by_version),
        )
        // POST /api/redes
        .route("/api/redes", post(handlers::redes::create_red))
        // PUT/DELETE /api/redes/{id}
        .route(
            "/api/redes/{id}",
            put(handlers::redes::update_red).delete(handlers::redes::delete_red),
        )
}
