use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    models::User,
    repository::RepositoryState,
    sessions::SessionState,
};

/// Name of the cookie carrying the opaque session id.
pub const SESSION_COOKIE_NAME: &str = "session_id";

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(argon2::password_hash::Error);

/// hash_password
///
/// Argon2id with a fresh random salt. The result is a self-describing PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError)
}

/// verify_password
///
/// Returns `Ok(false)` on a mismatch and an error only when `hash` is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(PasswordError)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// session_cookie
///
/// Builds the `Set-Cookie` value issued after a successful signup or login.
pub fn session_cookie(session_id: String, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(time::Duration::seconds(
            i64::try_from(config.session_ttl_seconds).unwrap_or(i64::MAX),
        ))
        .build()
}

/// expired_session_cookie
///
/// An empty, already-expired `session_id` cookie; instructs the browser to drop it.
pub fn expired_session_cookie(config: &AppConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(time::Duration::ZERO)
        .build()
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    /// The session the request was authenticated with. `None` for the local dev bypass.
    pub session_id: Option<String>,
}

/// AuthUser Extractor Implementation
///
/// Usable as a handler argument on any route that requires a logged-in user:
/// 1. Local Bypass: in `Env::Local`, an `x-user-id` header naming an existing user.
/// 2. Session Cookie: the `session_id` cookie resolved through the session store.
/// 3. DB Lookup: the session's user must still exist.
///
/// Rejection: 401 on any authentication failure, 500 when a store is unreachable.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    SessionState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let sessions = SessionState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|raw| Uuid::parse_str(raw).ok());
            if let Some(user_id) = bypass_id {
                if let Ok(Some(user)) = repo.find_user_by_id(user_id).await {
                    return Ok(AuthUser {
                        user,
                        session_id: None,
                    });
                }
            }
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar
            .get(SESSION_COOKIE_NAME)
            .map(Cookie::value)
            .filter(|value| !value.is_empty())
            .ok_or(StatusCode::UNAUTHORIZED)?
            .to_owned();

        let user_id = sessions
            .session_user(&session_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to resolve session");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // A session whose user was deleted is as good as no session.
        let user = repo
            .find_user_by_id(user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %user_id, "failed to load session user");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            user,
            session_id: Some(session_id),
        })
    }
}
