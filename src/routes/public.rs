use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client, anonymous or logged-in: the whole read-only catalog plus the login
/// gateway.
///
/// Visitor reduction happens inside the handlers, not here: `get_curso`
/// inspects the Authorization header itself and omits the `estudiantes` list
/// for credential-less requests.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/login
        // Credential verification and bearer token issuance.
        .route("/api/auth/login", post(handlers::auth::login))
        // GET /api/cursos
        // The full catalog, ordered by fechaInicio, hydrated.
        .route("/api/cursos", get(handlers::cursos::list_cursos))
        // GET /api/cursos/{id}
        // Single curso detail; visitor requests get no estudiantes field.
        .route("/api/cursos/{id}", get(handlers::cursos::get_curso))
        // GET /api/cursos/{id}/horarios
        // The schedule of one curso.
        .route(
            "/api/cursos/{id}/horarios",
            get(handlers::horarios::list_horarios),
        )
        // GET /api/techs
        .route("/api/techs", get(handlers::techs::list_techs))
        // GET /api/techs/{nombre}
        // Every version of one tech; unknown nombre is a 404.
        .route("/api/techs/{nombre}", get(handlers::techs::get_tech_by_nombre))
        // GET /api/techs/{nombre}/{version}
        .route(
            "/api/techs/{nombre}/{version}",
            get(handlers::techs::get_tech_by_version),
        )
        // GET /api/redes
        .route("/api/redes", get(handlers::redes::list_redes))
}
