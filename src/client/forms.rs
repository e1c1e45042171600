//! Login and signup form state.
//!
//! A form owns its field values and the status of its one in-flight request.
//! Submitting is two steps, `begin_submit` (fields are checked, the form goes
//! pending and hands out the request body) and `finish` (the outcome lands),
//! so callers can observe the disabled button while the request is outstanding.

use crate::client::api::{AuthError, AuthenticatedUser};
use crate::models::{LoginRequest, SignupRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    Pending,
    Failed,
}

/// Why a submit did not send anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitBlocked {
    #[error("a request is already in flight")]
    InFlight,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("this form is not on screen")]
    FormNotActive,
}

/// Request status plus the banner message. Shared by both forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Submission {
    status: RequestStatus,
    error: Option<AuthError>,
}

impl Submission {
    fn begin(&mut self, fields: &[(&'static str, &str)]) -> Result<(), SubmitBlocked> {
        if self.status == RequestStatus::Pending {
            return Err(SubmitBlocked::InFlight);
        }
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(SubmitBlocked::MissingField(*name));
        }
        // The previous error stays on screen until a submission succeeds.
        self.status = RequestStatus::Pending;
        Ok(())
    }

    fn finish(&mut self, outcome: Result<AuthenticatedUser, AuthError>) -> Option<AuthenticatedUser> {
        match outcome {
            Ok(user) => {
                self.status = RequestStatus::Idle;
                self.error = None;
                Some(user)
            }
            Err(e) => {
                self.status = RequestStatus::Failed;
                self.error = Some(e);
                None
            }
        }
    }
}

/// LoginForm
///
/// Email and password, one `POST /api/auth/login` per submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    submission: Submission,
}

impl LoginForm {
    pub const TITLE: &'static str = "Login";
    pub const TOGGLE_LABEL: &'static str = "Need an account? Sign up";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RequestStatus {
        self.submission.status
    }

    pub fn is_submit_disabled(&self) -> bool {
        self.submission.status == RequestStatus::Pending
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_submit_disabled() { "Logging in..." } else { "Login" }
    }

    /// The inline error banner, if one is showing.
    pub fn error_banner(&self) -> Option<String> {
        self.submission.error.map(|e| e.to_string())
    }

    /// Checks the required fields, marks the form pending and returns the body to send.
    pub fn begin_submit(&mut self) -> Result<LoginRequest, SubmitBlocked> {
        self.submission
            .begin(&[("email", self.email.as_str()), ("password", self.password.as_str())])?;
        Ok(LoginRequest {
            email: self.email.clone(),
            password: self.password.clone(),
        })
    }

    /// Applies the request outcome. Returns the user on success.
    pub fn finish(&mut self, outcome: Result<AuthenticatedUser, AuthError>) -> Option<AuthenticatedUser> {
        self.submission.finish(outcome)
    }
}

/// SignupForm
///
/// Name, email and password, one `POST /api/auth/signup` per submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    submission: Submission,
}

impl SignupForm {
    pub const TITLE: &'static str = "Sign Up";
    pub const TOGGLE_LABEL: &'static str = "Already have an account? Login";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RequestStatus {
        self.submission.status
    }

    pub fn is_submit_disabled(&self) -> bool {
        self.submission.status == RequestStatus::Pending
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_submit_disabled() { "Creating account..." } else { "Sign Up" }
    }

    pub fn error_banner(&self) -> Option<String> {
        self.submission.error.map(|e| e.to_string())
    }

    pub fn begin_submit(&mut self) -> Result<SignupRequest, SubmitBlocked> {
        self.submission.begin(&[
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("password", self.password.as_str()),
        ])?;
        Ok(SignupRequest {
            email: self.email.clone(),
            name: self.name.clone(),
            password: self.password.clone(),
        })
    }

    pub fn finish(&mut self, outcome: Result<AuthenticatedUser, AuthError>) -> Option<AuthenticatedUser> {
        self.submission.finish(outcome)
    }
}
