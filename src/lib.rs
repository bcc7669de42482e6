use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod repository;
pub mod storage;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point
// and to the integration tests.
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) from every handler
/// decorated with `#[utoipa::path]` and every schema deriving `ToSchema`.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register, handlers::auth::login, handlers::auth::change_password,
        handlers::users::list_users, handlers::users::get_user, handlers::users::update_user,
        handlers::users::delete_user,
        handlers::cursos::list_cursos, handlers::cursos::get_curso, handlers::cursos::create_curso,
        handlers::cursos::update_curso, handlers::cursos::delete_curso,
        handlers::cursos::add_estudiante, handlers::cursos::remove_estudiante,
        handlers::horarios::list_horarios, handlers::horarios::create_horario,
        handlers::horarios::update_horario, handlers::horarios::delete_horario,
        handlers::techs::list_techs, handlers::techs::get_tech_by_nombre,
        handlers::techs::get_tech_by_version, handlers::techs::create_tech,
        handlers::techs::update_tech, handlers::techs::delete_tech,
        handlers::techs::delete_tech_by_version,
        handlers::redes::list_redes, handlers::redes::create_red, handlers::redes::update_red,
        handlers::redes::delete_red
    ),
    components(
        schemas(
            models::Role, models::TipoEstudiante, models::CursoStatus, models::Dia,
            models::Modalidad, models::RedRef, models::Curso, models::Horario, models::Tech,
            models::RedSocial, models::RedSocialLink, models::UserResponse, models::CursoDetail,
            models::LoginRequest, models::LoginResponse, models::ChangePasswordRequest,
            models::RegisterResponse, models::AddEstudianteRequest, models::CreateHorarioRequest,
            models::UpdateHorarioRequest, models::UserSummary, models::UpdateUserResponse,
            models::MsgResponse,
        )
    ),
    tags(
        (name = "cursos-backend", description = "SCESI Cursos API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all essential
/// application services and configuration, shared across all requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts document storage behind the trait.
    pub repo: RepositoryState,
    /// Storage Layer: abstracts the S3/MinIO image store.
    pub storage: StorageState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These allow extractors (notably AuthUser) to selectively pull components
// from the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the authenticated router tier. It extracts
/// `AuthUser` from the request; a failed extraction (missing/invalid token,
/// deleted user) rejects with 401 before the handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated routes: protected by the auth_middleware layer.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes: authentication happens through the AuthUser extractor
        // each handler takes; the role check is performed inside the handler.
        .merge(admin::admin_routes())
        .with_state(state);

    // Observability and correlation layers, applied outermost.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the TraceLayer span: every log line for a single request is
/// correlated by the generated x-request-id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
