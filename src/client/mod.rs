//! Client side of the login/signup flow.
//!
//! The screens are kept as plain state (`app::RootView` over `forms::LoginForm`
//! and `forms::SignupForm`) so any front end, or a test, can drive them; the
//! network lives behind `api::AuthApi`.

pub mod api;
pub mod app;
pub mod forms;

pub use api::{AuthApi, AuthError, AuthenticatedUser, ClientConfig, HttpAuthClient};
pub use app::{FormMode, PendingRequest, RootView, Screen};
pub use forms::{LoginForm, RequestStatus, SignupForm, SubmitBlocked};
