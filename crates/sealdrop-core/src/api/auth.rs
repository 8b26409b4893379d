//! Authentication endpoints (login, register, validate).
//!
//! Login and register are on the public allow-list: no bearer token is
//! attached and a 401 from them never tears the session down.

use serde::{Deserialize, Serialize};

use super::client::{ApiClient, Auth};
use super::error::{ApiError, ApiErrorKind, ApiResult};
use super::types::User;

pub const LOGIN_PATH: &str = "/api/auth/login/";
pub const REGISTER_PATH: &str = "/api/auth/register/";
pub const VALIDATE_PATH: &str = "/api/auth/validate/";

/// Credentials submitted to the login endpoint.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    /// One-time code, required once the server has signaled a second factor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa_code: Option<&'a str>,
}

/// Raw login response body. The server either issues a token, asks for a
/// second factor, or rejects with an error payload.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    mfa_required: bool,
}

/// Outcome of a login call.
#[derive(Debug, Clone)]
pub enum LoginReply {
    /// The server issued a token for this user.
    Authenticated { token: String, user: User },
    /// Credentials were accepted but a one-time code must be submitted with
    /// a second attempt before a token is produced.
    SecondFactorRequired,
}

/// Payload for account creation.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Response from account creation. A populated `user` signals the account
/// exists and an automatic login should follow.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    user: User,
}

impl ApiClient {
    /// Submits credentials; see [`LoginReply`] for the possible outcomes.
    pub async fn login(&self, request: &LoginRequest<'_>) -> ApiResult<LoginReply> {
        let response: LoginResponse = self
            .post_json(LOGIN_PATH, request, Auth::Public, "Login failed")
            .await?;

        if response.mfa_required {
            return Ok(LoginReply::SecondFactorRequired);
        }

        match (response.token, response.user) {
            (Some(token), Some(user)) => Ok(LoginReply::Authenticated { token, user }),
            // 200 without a token: treat like a rejection rather than
            // guessing at a half-issued session.
            _ => Err(ApiError::new(ApiErrorKind::Unauthorized, "Invalid credentials")),
        }
    }

    /// Creates an account. Does not sign in; the session layer chains the
    /// automatic login.
    pub async fn register(&self, request: &RegisterRequest<'_>) -> ApiResult<RegisterReply> {
        self.post_json(REGISTER_PATH, request, Auth::Public, "Registration failed")
            .await
    }

    /// Validates the current token and returns the account it belongs to.
    pub async fn validate(&self) -> ApiResult<User> {
        let response: ValidateResponse = self
            .get_json(VALIDATE_PATH, Auth::Bearer, "Session validation failed")
            .await?;
        Ok(response.user)
    }
}
