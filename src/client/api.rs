//! HTTP access to the auth endpoints.
//!
//! Every request carries the cookie jar (the session cookie set by signup/login)
//! and a JSON body. Failures are deliberately flat: whatever went wrong, the caller
//! only learns which of the two user-facing messages to show.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{LoginRequest, SignupRequest};

/// The account the client considers logged in. Lives only as long as the view state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Deserialize)]
struct AuthEnvelope {
    user: AuthenticatedUser,
}

/// User-facing failure of a login or signup. The `Display` text is the banner text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Failed to create account")]
    SignupFailed,
}

/// The three calls the screens make. Implemented over HTTP by `HttpAuthClient`
/// and by hand-written fakes in tests.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthenticatedUser, AuthError>;
    async fn signup(&self, request: &SignupRequest) -> Result<AuthenticatedUser, AuthError>;
    /// Fire-and-forget: the outcome is not reported.
    async fn logout(&self);
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin serving `/api`, e.g. `http://localhost:8080`.
    pub base_url: String,
}

/// HttpAuthClient
///
/// `AuthApi` over `reqwest` with a cookie store, so the session cookie from
/// signup/login is sent along with later requests.
#[derive(Clone)]
pub struct HttpAuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthClient {
    /// # Errors
    /// Fails only if the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POSTs `body` and decodes the `{user}` envelope. `None` on any failure.
    async fn post_for_user<B: Serialize + Sync>(&self, path: &str, body: &B) -> Option<AuthenticatedUser> {
        let response = match self.http.post(self.endpoint(path)).json(body).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, path, "auth request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), path, "auth request rejected");
            return None;
        }

        match response.json::<AuthEnvelope>().await {
            Ok(envelope) => Some(envelope.user),
            Err(e) => {
                tracing::debug!(error = %e, path, "unexpected auth response body");
                None
            }
        }
    }

    /// Asks `GET /api/auth/me` who the current session belongs to. `None` when
    /// there is no valid session or the request fails.
    pub async fn current_user(&self) -> Option<AuthenticatedUser> {
        let response = self.http.get(self.endpoint("/api/auth/me")).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<AuthEnvelope>().await.ok().map(|envelope| envelope.user)
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthenticatedUser, AuthError> {
        self.post_for_user("/api/auth/login", request)
            .await
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthenticatedUser, AuthError> {
        self.post_for_user("/api/auth/signup", request)
            .await
            .ok_or(AuthError::SignupFailed)
    }

    async fn logout(&self) {
        if let Err(e) = self.http.post(self.endpoint("/api/auth/logout")).send().await {
            tracing::debug!(error = %e, "logout request failed");
        }
    }
}
