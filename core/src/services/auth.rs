//! Authentication endpoints.
//!
//! # Design
//! Input is normalised and checked against the client-side rules before
//! anything is sent, so a rejected form never reaches the network. The
//! service returns tokens but never stores them; that is the session's job.

use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
    SuccessResponse, VerifyResetCodeRequest,
};
use crate::validation::{self, ValidationFailure};

const LOGIN: &str = "/api/auth/login";
const REGISTER: &str = "/api/auth/register";
const FORGOT_PASSWORD: &str = "/api/auth/forgot-password";
const VERIFY_RESET_CODE: &str = "/api/auth/verify-reset-code";
const RESET_PASSWORD: &str = "/api/auth/reset-password";
const TOKEN_CHECK: &str = "/api/test";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Rejected locally; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Login, registration and password reset.
///
/// Emails are trimmed and lowercased and names trimmed before validation,
/// so the server always sees the normalised form.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let request = LoginRequest {
            email: normalize_email(email),
            password: password.to_string(),
        };
        validation::check(&request)?;

        let response: AuthResponse = self.client.post(LOGIN, &request).await.inspect_err(|e| {
            warn!(email = %request.email, error = %e, "login failed");
        })?;
        info!(email = %request.email, "login succeeded");
        Ok(response)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let request = SignupRequest {
            name: name.trim().to_string(),
            email: normalize_email(email),
            password: password.to_string(),
        };
        validation::check(&request)?;

        let response: AuthResponse = self.client.post(REGISTER, &request).await.inspect_err(|e| {
            warn!(email = %request.email, error = %e, "registration failed");
        })?;
        info!(email = %request.email, "registration succeeded");
        Ok(response)
    }

    /// Ask the server to email a reset code. Returns the server's message.
    pub async fn forgot_password(&self, email: &str) -> Result<String, AuthError> {
        let request = ForgotPasswordRequest {
            email: normalize_email(email),
        };
        validation::check(&request)?;

        let response: SuccessResponse = self.client.post(FORGOT_PASSWORD, &request).await?;
        Ok(response.message)
    }

    pub async fn verify_reset_code(&self, email: &str, code: &str) -> Result<String, AuthError> {
        let request = VerifyResetCodeRequest {
            email: normalize_email(email),
            code: code.trim().to_string(),
        };
        validation::check(&request)?;

        let response: SuccessResponse = self.client.post(VERIFY_RESET_CODE, &request).await?;
        Ok(response.message)
    }

    pub async fn reset_password(&self, email: &str, code: &str, new_password: &str) -> Result<String, AuthError> {
        let request = ResetPasswordRequest {
            email: normalize_email(email),
            code: code.trim().to_string(),
            new_password: new_password.to_string(),
        };
        validation::check(&request)?;

        let response: SuccessResponse = self.client.post(RESET_PASSWORD, &request).await?;
        info!(email = %request.email, "password reset");
        Ok(response.message)
    }

    /// Lightweight authenticated call used to confirm a stored token.
    pub async fn check_token(&self) -> Result<String, ApiError> {
        self.client.get(TOKEN_CHECK).await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
