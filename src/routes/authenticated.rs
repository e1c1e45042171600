use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every route here sits behind the session check layered on in `create_router`,
/// which leaves the resolved `AuthUser` in the request extensions.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/auth/me
        // The user behind the current session.
        .route("/auth/me", get(handlers::me))
        // GET /api/users
        // All accounts, newest first.
        .route("/users", get(handlers::list_users))
        // GET /api/users/{id}
        .route("/users/{id}", get(handlers::get_user))
}
