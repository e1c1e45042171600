use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. Logout lives here too: it must succeed
/// even when the session has already expired.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /api/health
        // Liveness probe, also reporting whether the user store answers.
        .route("/health", get(handlers::health_check))
        // POST /api/auth/signup
        // Creates an account and logs it in (sets the session cookie).
        .route("/auth/signup", post(handlers::signup))
        // POST /api/auth/login
        // Exchanges email/password for a session cookie.
        .route("/auth/login", post(handlers::login))
        // POST /api/auth/logout
        // Drops the session (if any) and clears the cookie.
        .route("/auth/logout", post(handlers::logout))
}
