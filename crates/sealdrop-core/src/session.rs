//! Session lifecycle: the authentication state machine and token persistence.
//!
//! A [`Session`] is constructed once at process start (restoring any
//! persisted token) and is the single authorized mutation path for the
//! shared [`TokenHandle`] the API client reads. Every transition below maps
//! to one lifecycle event: login, validate, register, logout, or a
//! server-reported invalid token.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::auth::{LoginReply, LoginRequest, RegisterRequest};
use crate::api::types::User;
use crate::api::{ApiClient, TokenHandle};
use crate::credentials::{CredentialStore, mask_token};

/// Message surfaced when account creation succeeds but the follow-up
/// automatic login does not. Distinct from the raw login error by design.
pub const REGISTERED_BUT_NOT_SIGNED_IN: &str = "Registration successful but login failed";

/// Authentication states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token, no user.
    Anonymous,
    /// A token exists (persisted, or a login is mid-flight) but the server
    /// has not confirmed it. Also covers the pending-second-factor window.
    Restoring,
    /// Token and user are both set and server-validated.
    Authenticated,
    /// The last attempt was rejected; `error` carries the message.
    Failed,
}

/// Result of a completed login or register flow.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    LoggedIn(User),
    /// Credentials accepted, but the server wants a one-time code on a
    /// second submission before it will issue a token.
    SecondFactorRequired,
}

/// The client-side session.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    user: Option<User>,
    token: TokenHandle,
    loading: bool,
    error: Option<String>,
    store: CredentialStore,
}

impl Session {
    /// Builds the session from persisted state.
    ///
    /// A persisted token puts the session in `Restoring` until a validate or
    /// login settles it; otherwise it starts `Anonymous`.
    pub fn load(store: CredentialStore) -> Result<Self> {
        let token = store.load()?;
        let state = if token.is_some() {
            SessionState::Restoring
        } else {
            SessionState::Anonymous
        };

        Ok(Self {
            state,
            user: None,
            token: TokenHandle::new(token),
            loading: false,
            error: None,
            store,
        })
    }

    /// Shares the token slot with an API client.
    pub fn token_handle(&self) -> TokenHandle {
        self.token.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_token(&self) -> bool {
        self.token.current().is_some()
    }

    /// True iff the most recent terminal event was a successful login or
    /// validation, with both token and user present, and no logout or
    /// invalid-token teardown has happened since.
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
            && self.user.is_some()
            && self.token.current().is_some()
    }

    // ---- transitions ----

    fn begin_attempt(&mut self) {
        self.state = SessionState::Restoring;
        self.loading = true;
        self.error = None;
    }

    fn apply_login_success(&mut self, token: String, user: User) -> Result<()> {
        self.store.save(&token).context("persist session token")?;
        info!(user = %user.display_name(), token = %mask_token(&token), "signed in");
        self.token.replace(Some(token));
        self.user = Some(user);
        self.state = SessionState::Authenticated;
        self.loading = false;
        self.error = None;
        Ok(())
    }

    fn apply_login_failure(&mut self, message: &str) {
        self.token.replace(None);
        if let Err(err) = self.store.clear() {
            debug!(%err, "failed to clear persisted token");
        }
        self.user = None;
        self.state = SessionState::Failed;
        self.loading = false;
        self.error = Some(message.to_string());
    }

    fn apply_second_factor_required(&mut self) {
        // Remains Restoring until a token is produced.
        self.loading = false;
    }

    /// User-initiated sign-out: resets to anonymous, clearing token, user
    /// and error, in memory and on disk.
    pub fn logout(&mut self) -> Result<()> {
        self.token.replace(None);
        self.user = None;
        self.state = SessionState::Anonymous;
        self.loading = false;
        self.error = None;
        self.store.clear().context("clear persisted token")?;
        info!("signed out");
        Ok(())
    }

    /// Teardown for a server-reported invalid/expired token. Identical to
    /// logout and safe to call repeatedly or from any state.
    pub fn expire(&mut self) -> Result<()> {
        self.logout()
    }

    // ---- flows ----

    /// Submits credentials and settles the session accordingly.
    pub async fn login(
        &mut self,
        client: &ApiClient,
        email: &str,
        password: &str,
        mfa_code: Option<&str>,
    ) -> Result<LoginOutcome> {
        self.begin_attempt();

        let request = LoginRequest {
            email,
            password,
            mfa_code,
        };
        match client.login(&request).await {
            Ok(LoginReply::Authenticated { token, user }) => {
                self.apply_login_success(token, user.clone())?;
                Ok(LoginOutcome::LoggedIn(user))
            }
            Ok(LoginReply::SecondFactorRequired) => {
                self.apply_second_factor_required();
                Ok(LoginOutcome::SecondFactorRequired)
            }
            Err(err) => {
                self.apply_login_failure(&err.message);
                Err(err.into())
            }
        }
    }

    /// Validates the persisted token against the server.
    ///
    /// Success settles `Authenticated` with the returned user; failure
    /// clears the persisted token and drops back to `Anonymous`.
    pub async fn validate(&mut self, client: &ApiClient) -> Result<User> {
        if self.token.current().is_none() {
            anyhow::bail!("Not signed in");
        }

        self.begin_attempt();
        match client.validate().await {
            Ok(user) => {
                self.user = Some(user.clone());
                self.state = SessionState::Authenticated;
                self.loading = false;
                Ok(user)
            }
            Err(err) => {
                self.logout()?;
                Err(err.into())
            }
        }
    }

    /// Creates an account, then signs in with the same credentials.
    ///
    /// When creation succeeds but the automatic login fails, the session
    /// stays unauthenticated and the surfaced error is
    /// [`REGISTERED_BUT_NOT_SIGNED_IN`] rather than the raw login error.
    pub async fn register(
        &mut self,
        client: &ApiClient,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome> {
        self.begin_attempt();

        let request = RegisterRequest {
            username,
            email,
            password,
        };
        let reply = match client.register(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                self.apply_login_failure(&err.message);
                return Err(err.into());
            }
        };

        if reply.user.is_none() {
            self.apply_login_failure("Registration failed");
            anyhow::bail!("Registration failed");
        }

        // Accounts are registered under their email address.
        match self.login(client, email, password, None).await {
            Ok(outcome) => Ok(outcome),
            Err(_) => {
                self.error = Some(REGISTERED_BUT_NOT_SIGNED_IN.to_string());
                anyhow::bail!(REGISTERED_BUT_NOT_SIGNED_IN);
            }
        }
    }
}
