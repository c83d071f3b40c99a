//! Observable login state for a UI layer.
//!
//! # Design
//! `SessionCoordinator` owns the only mutable session state and publishes it
//! through a `tokio::sync::watch` channel. Views hold receivers; only the
//! coordinator's methods write. Errors are turned into display strings here
//! and nowhere else.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::credentials::{CredentialError, SecretStore};
use crate::error::ApiError;
use crate::services::{AuthError, AuthService};
use crate::types::AuthResponse;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub is_logged_in: bool,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl SessionError {
    /// Text suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Auth(AuthError::Invalid(failure)) => failure.message.clone(),
            SessionError::Auth(AuthError::Api(api)) => api_message(api),
            SessionError::Credential(CredentialError::Save(_)) => {
                "Failed to save login information securely.".to_string()
            }
            SessionError::Credential(_) => UNEXPECTED.to_string(),
        }
    }
}

const UNEXPECTED: &str = "An unexpected error occurred. Please try again.";

fn api_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized => "Invalid email or password.".to_string(),
        ApiError::ServerError { status: 409, .. } => {
            "An account with this email already exists.".to_string()
        }
        ApiError::ServerError {
            message: Some(message),
            ..
        } => message.clone(),
        ApiError::ServerError { message: None, .. } => "Server error occurred.".to_string(),
        ApiError::NetworkError(_) => {
            "Network connection failed. Please check your internet connection.".to_string()
        }
        ApiError::Timeout => "Request timed out. Please try again.".to_string(),
        _ => UNEXPECTED.to_string(),
    }
}

/// Drives login, registration, restore and logout.
#[derive(Clone)]
pub struct SessionCoordinator {
    auth: AuthService,
    store: Arc<dyn SecretStore>,
    state: Arc<watch::Sender<SessionState>>,
    optimistic_restore: bool,
}

impl SessionCoordinator {
    /// The coordinator persists tokens in the same store `client` reads its
    /// bearer token from.
    pub fn new(client: ApiClient, optimistic_restore: bool) -> Self {
        let store = Arc::clone(client.store());
        let (state, _) = watch::channel(SessionState::default());
        Self {
            auth: AuthService::new(client),
            store,
            state: Arc::new(state),
            optimistic_restore,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resume a session from a stored token.
    ///
    /// With optimistic restore the session is reported as logged in at once
    /// and the token is checked in the background; the returned handle
    /// resolves when that check is done. Otherwise the check completes
    /// before this returns and no handle is given.
    pub async fn restore(&self) -> Option<JoinHandle<()>> {
        let Some(token) = self.stored_token() else {
            debug!("no stored token, staying logged out");
            return None;
        };
        self.state.send_modify(|s| s.is_logged_in = true);

        if self.optimistic_restore {
            let this = self.clone();
            Some(tokio::spawn(async move { this.check(token).await }))
        } else {
            self.check(token).await;
            None
        }
    }

    /// Confirm the stored token with the server; a rejected token logs out.
    /// Other failures leave the session as it is.
    pub async fn validate(&self) {
        let logged_in = self.state.borrow().is_logged_in;
        match self.stored_token() {
            Some(token) if logged_in => self.check(token).await,
            _ => self.logout(),
        }
    }

    /// A rejection only logs out while `token` is still the stored one; a
    /// login that finished during the check keeps its session.
    async fn check(&self, token: String) {
        match self.auth.check_token().await {
            Ok(_) => debug!("stored token accepted"),
            Err(ApiError::Unauthorized) if self.stored_token().as_ref() == Some(&token) => {
                info!("stored token rejected, logging out");
                self.logout();
            }
            Err(ApiError::Unauthorized) => debug!("token replaced during validation, keeping session"),
            Err(e) => warn!(error = %e, "token validation failed, keeping session"),
        }
    }

    fn stored_token(&self) -> Option<String> {
        self.store.get().ok().flatten()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        self.begin();
        let outcome = self.auth.login(email, password).await;
        let result = self.persist(outcome);
        self.finish(result)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), SessionError> {
        self.begin();
        let outcome = self.auth.register(name, email, password).await;
        let result = self.persist(outcome);
        self.finish(result)
    }

    /// Drop the stored token and report logged out, even if the vault
    /// refuses the delete.
    pub fn logout(&self) {
        if let Err(e) = self.store.delete() {
            warn!(error = %e, "failed to delete stored token");
        }
        self.state.send_modify(|s| {
            s.is_logged_in = false;
            s.error_message = None;
        });
        info!("logged out");
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error_message = None;
        });
    }

    fn persist(&self, outcome: Result<AuthResponse, AuthError>) -> Result<(), SessionError> {
        let response = outcome?;
        self.store.save(&response.token)?;
        Ok(())
    }

    fn finish(&self, result: Result<(), SessionError>) -> Result<(), SessionError> {
        self.state.send_modify(|s| {
            s.is_loading = false;
            match &result {
                Ok(()) => s.is_logged_in = true,
                Err(e) => s.error_message = Some(e.user_message()),
            }
        });
        if let Err(e) = &result {
            warn!(error = %e, "authentication failed");
        }
        result
    }
}
