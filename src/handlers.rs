use crate::{
    AppState,
    auth::{self, AuthUser},
    models::{AuthResponse, HealthResponse, LoginRequest, NewUser, SignupRequest, User},
    repository::RepositoryError,
};
use axum::{
    Json,
    Extension,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use uuid::Uuid;

// --- Handlers ---

/// health_check
///
/// [Public Route] Liveness probe that also reports whether the user store answers.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service status", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.repo.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::error!(error = %e, "database health check failed");
            "disconnected"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        database: database.to_string(),
    })
}

/// signup
///
/// [Public Route] Creates an account, opens a session and sets the `session_id` cookie.
///
/// *Rejections*: 400 when a field is blank, 409 when the email is already registered.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing field"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), StatusCode> {
    if payload.email.trim().is_empty() || payload.name.trim().is_empty() || payload.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let password_hash = auth::hash_password(&payload.password).map_err(|e| {
        tracing::error!(error = %e, "failed to hash password");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let user = state
        .repo
        .create_user(NewUser {
            email: payload.email,
            name: payload.name,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::DuplicateEmail => StatusCode::CONFLICT,
            RepositoryError::Database(e) => {
                tracing::error!(error = %e, "failed to create user");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })?;

    let jar = start_session(&state, jar, &user).await?;
    tracing::info!(user_id = %user.id, "account created");

    Ok((StatusCode::CREATED, jar, Json(AuthResponse { user })))
}

/// login
///
/// [Public Route] Verifies credentials, opens a session and sets the `session_id` cookie.
///
/// *Rejections*: 401 for an unknown email and for a wrong password alike.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), StatusCode> {
    let user = state
        .repo
        .find_user_by_email(&payload.email)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, email = %payload.email, "failed to find user by email");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let is_valid = auth::verify_password(&payload.password, &user.password_hash).map_err(|e| {
        tracing::error!(error = %e, user_id = %user.id, "failed to verify password");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if !is_valid {
        tracing::warn!(email = %payload.email, "invalid password attempt");
        return Err(StatusCode::UNAUTHORIZED);
    }

    // The new cookie replaces the old one, so its server-side session goes too.
    if let Some(previous) = jar.get(auth::SESSION_COOKIE_NAME).map(Cookie::value) {
        if let Err(e) = state.sessions.delete_session(previous).await {
            tracing::warn!(error = %e, "failed to drop previous session on login");
        }
    }

    let jar = start_session(&state, jar, &user).await?;
    Ok((jar, Json(AuthResponse { user })))
}

/// logout
///
/// [Public Route] Drops the server-side session named by the cookie (if any) and clears
/// the cookie. Always answers 200, even without a session.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out"))
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    if let Some(session_id) = jar.get(auth::SESSION_COOKIE_NAME).map(Cookie::value) {
        if let Err(e) = state.sessions.delete_session(session_id).await {
            tracing::warn!(error = %e, "failed to delete session on logout");
        }
    }

    let jar = jar.add(auth::expired_session_cookie(&state.config));
    (jar, StatusCode::OK)
}

/// me
///
/// [Authenticated Route] Returns the user behind the current session.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = AuthResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn me(Extension(AuthUser { user, .. }): Extension<AuthUser>) -> Json<AuthResponse> {
    Json(AuthResponse { user })
}

/// list_users
///
/// [Authenticated Route] Lists all accounts, newest first.
#[utoipa::path(
    get,
    path = "/api/users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, StatusCode> {
    state.repo.list_users().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "failed to list users");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// get_user
///
/// [Authenticated Route] Fetches one account by id.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = User),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<User>, StatusCode> {
    state
        .repo
        .find_user_by_id(id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %id, "failed to find user by id");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Opens a session for `user` and adds its cookie to `jar`.
async fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar, StatusCode> {
    let session_id = state.sessions.create_session(user.id).await.map_err(|e| {
        tracing::error!(error = %e, user_id = %user.id, "failed to create session");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(jar.add(auth::session_cookie(session_id, &state.config)))
}
