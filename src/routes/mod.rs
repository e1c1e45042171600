//! Router Module Index
//!
//! Splits the API into modules by access level so authentication is applied
//! explicitly at the router layer rather than remembered per handler.

/// Routes reachable without a session: health and the signup/login/logout flow.
pub mod public;

/// Routes behind the `AuthUser` session check.
pub mod authenticated;
