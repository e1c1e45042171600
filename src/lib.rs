use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Server side: the auth API and its stores.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod sessions;

// Routing segregation (Public, Authenticated).
pub mod routes;
use routes::{authenticated, public};

// Client side: the login/signup screens as plain state plus the HTTP client.
pub mod client;

use auth::AuthUser;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use sessions::{MemorySessionStore, PostgresSessionStore, SessionState};

/// ApiDoc
///
/// OpenAPI document for every handler and wire schema, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health_check, handlers::signup, handlers::login, handlers::logout,
        handlers::me, handlers::list_users, handlers::get_user
    ),
    components(
        schemas(
            models::User, models::SignupRequest, models::LoginRequest,
            models::AuthResponse, models::HealthResponse,
        )
    ),
    tags(
        (name = "enoki", description = "Enoki authentication API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Account persistence (Postgres or in-memory).
    pub repo: RepositoryState,
    /// Session id -> user id mapping behind the `session_id` cookie.
    pub sessions: SessionState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    /// State backed entirely by process-local stores. Used for local runs without
    /// `DATABASE_URL` and by the integration tests.
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            repo: Arc::new(InMemoryRepository::new()),
            sessions: Arc::new(MemorySessionStore::new(config.session_ttl_seconds)),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated router. The `AuthUser` extractor rejects the request with
/// 401 before the handler runs when there is no valid session; otherwise the resolved
/// user is stored in the request extensions for handlers to read as `Extension<AuthUser>`.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    tracing::info!(user_id = %auth_user.user.id, "authenticated request");
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// log_request
///
/// Tags the log stream with the user id of public requests carrying a live session.
/// Never rejects: anonymous requests pass through untouched. Authenticated routes
/// are logged by `auth_middleware` instead.
async fn log_request(State(state): State<AppState>, jar: CookieJar, request: Request, next: Next) -> Response {
    if let Some(session_id) = jar.get(auth::SESSION_COOKIE_NAME).map(Cookie::value) {
        if let Ok(Some(user_id)) = state.sessions.session_user(session_id).await {
            tracing::info!(user_id = %user_id, "authenticated request");
        }
    }

    next.run(request).await
}

/// configure_cors
///
/// Credentialed CORS for the single configured frontend origin. Browsers refuse
/// wildcard origins on credentialed requests, so the origin must be explicit.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(&config.allowed_origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, origin = %config.allowed_origin, "invalid ALLOWED_ORIGIN, cross-origin requests disabled");
            cors
        }
    }
}

/// create_router
///
/// Assembles the routing structure under `/api`, applies middleware and registers the state.
pub fn create_router(state: AppState) -> Router {
    let cors = configure_cors(&state.config);
    let x_request_id = HeaderName::from_static("x-request-id");

    let api = public::public_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), log_request))
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .with_state(state);

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
                        )
                        .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, correlated by the `x-request-id` header.
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
