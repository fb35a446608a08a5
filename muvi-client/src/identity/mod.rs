//! Identity service access
//!
//! Sign-up, sign-in, password reset and session refresh against the hosted user pool.
//! [`CognitoClient`] talks to the real service; tests use in-memory fakes of
//! [`IdentityApi`].

mod cognito;
pub mod token;

pub use cognito::CognitoClient;
pub use token::TokenClaims;

use async_trait::async_trait;
use muvi_common::Result;
use std::collections::BTreeMap;

/// Tokens issued by a successful sign-in or refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub id_token: String,
    /// Absent on refresh responses; the previous refresh token stays valid
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user_sub: Option<String>,
    pub user_confirmed: bool,
}

/// Profile of the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityUser {
    pub username: String,
    pub attributes: BTreeMap<String, String>,
}

impl IdentityUser {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Hosted identity provider
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Register a new account keyed by email
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome>;

    /// Confirm a new account with the emailed code
    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<()>;

    /// Exchange credentials for tokens
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens>;

    /// Exchange a refresh token for fresh access and id tokens
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens>;

    /// Email a password reset code
    async fn forgot_password(&self, email: &str) -> Result<()>;

    /// Set a new password using the emailed code
    async fn confirm_password(&self, email: &str, code: &str, new_password: &str) -> Result<()>;

    async fn get_user(&self, access_token: &str) -> Result<IdentityUser>;

    /// Revoke all tokens issued to the user
    async fn sign_out(&self, access_token: &str) -> Result<()>;
}
