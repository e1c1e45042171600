//! The root view: which screen is showing and who is logged in.
//!
//! Anonymous visitors see exactly one of the two forms; a successful login or
//! signup replaces it with the welcome panel. Each screen change bumps a
//! generation counter, and request outcomes are tagged with the generation that
//! issued them, so an outcome arriving for a form that was toggled away (or
//! logged out of) is dropped instead of resurrecting stale state.

use crate::client::api::{AuthApi, AuthError, AuthenticatedUser};
use crate::client::forms::{LoginForm, SignupForm, SubmitBlocked};
use crate::models::{LoginRequest, SignupRequest};

/// Which entry form an anonymous visitor sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Login,
    Signup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login(LoginForm),
    Signup(SignupForm),
    Welcome(AuthenticatedUser),
}

/// A request handed out by `begin_login`/`begin_signup`, to be passed back with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest<R> {
    generation: u64,
    pub body: R,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootView {
    screen: Screen,
    generation: u64,
}

impl Default for RootView {
    fn default() -> Self {
        Self::new()
    }
}

impl RootView {
    pub const LOGOUT_LABEL: &'static str = "Logout";

    /// Starts anonymous, on an empty login form.
    pub fn new() -> Self {
        Self {
            screen: Screen::Login(LoginForm::new()),
            generation: 0,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match &self.screen {
            Screen::Welcome(user) => Some(user),
            _ => None,
        }
    }

    /// `None` once authenticated.
    pub fn form_mode(&self) -> Option<FormMode> {
        match self.screen {
            Screen::Login(_) => Some(FormMode::Login),
            Screen::Signup(_) => Some(FormMode::Signup),
            Screen::Welcome(_) => None,
        }
    }

    pub fn login_form(&self) -> Option<&LoginForm> {
        match &self.screen {
            Screen::Login(form) => Some(form),
            _ => None,
        }
    }

    /// Field editing goes through here.
    pub fn login_form_mut(&mut self) -> Option<&mut LoginForm> {
        match &mut self.screen {
            Screen::Login(form) => Some(form),
            _ => None,
        }
    }

    pub fn signup_form(&self) -> Option<&SignupForm> {
        match &self.screen {
            Screen::Signup(form) => Some(form),
            _ => None,
        }
    }

    pub fn signup_form_mut(&mut self) -> Option<&mut SignupForm> {
        match &mut self.screen {
            Screen::Signup(form) => Some(form),
            _ => None,
        }
    }

    /// Greeting shown in the welcome panel.
    pub fn welcome_message(&self) -> Option<String> {
        self.user().map(|user| format!("Welcome, {}!", user.name))
    }

    fn replace_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.generation += 1;
    }

    /// Switches between the login and signup forms. The new form always starts
    /// empty: whatever was typed into the old one is discarded. No-op once authenticated.
    pub fn toggle_mode(&mut self) {
        let next = match self.screen {
            Screen::Login(_) => Screen::Signup(SignupForm::new()),
            Screen::Signup(_) => Screen::Login(LoginForm::new()),
            Screen::Welcome(_) => return,
        };
        self.replace_screen(next);
    }

    pub fn begin_login(&mut self) -> Result<PendingRequest<LoginRequest>, SubmitBlocked> {
        let generation = self.generation;
        let form = self.login_form_mut().ok_or(SubmitBlocked::FormNotActive)?;
        let body = form.begin_submit()?;
        Ok(PendingRequest { generation, body })
    }

    /// Lands a login outcome. Returns `false` when the issuing form is gone and the
    /// outcome was dropped.
    pub fn complete_login(
        &mut self,
        pending: PendingRequest<LoginRequest>,
        outcome: Result<AuthenticatedUser, AuthError>,
    ) -> bool {
        if pending.generation != self.generation {
            return false;
        }
        let Some(form) = self.login_form_mut() else {
            return false;
        };
        if let Some(user) = form.finish(outcome) {
            self.replace_screen(Screen::Welcome(user));
        }
        true
    }

    pub fn begin_signup(&mut self) -> Result<PendingRequest<SignupRequest>, SubmitBlocked> {
        let generation = self.generation;
        let form = self.signup_form_mut().ok_or(SubmitBlocked::FormNotActive)?;
        let body = form.begin_submit()?;
        Ok(PendingRequest { generation, body })
    }

    pub fn complete_signup(
        &mut self,
        pending: PendingRequest<SignupRequest>,
        outcome: Result<AuthenticatedUser, AuthError>,
    ) -> bool {
        if pending.generation != self.generation {
            return false;
        }
        let Some(form) = self.signup_form_mut() else {
            return false;
        };
        if let Some(user) = form.finish(outcome) {
            self.replace_screen(Screen::Welcome(user));
        }
        true
    }

    /// Submits the login form and waits for the answer.
    pub async fn submit_login(&mut self, api: &dyn AuthApi) -> Result<(), SubmitBlocked> {
        let pending = self.begin_login()?;
        let outcome = api.login(&pending.body).await;
        self.complete_login(pending, outcome);
        Ok(())
    }

    /// Submits the signup form and waits for the answer.
    pub async fn submit_signup(&mut self, api: &dyn AuthApi) -> Result<(), SubmitBlocked> {
        let pending = self.begin_signup()?;
        let outcome = api.signup(&pending.body).await;
        self.complete_signup(pending, outcome);
        Ok(())
    }

    /// Sends the logout request, then drops the user and shows an empty login form,
    /// whatever the server answered.
    pub async fn logout(&mut self, api: &dyn AuthApi) {
        api.logout().await;
        self.replace_screen(Screen::Login(LoginForm::new()));
    }
}
