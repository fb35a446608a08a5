//! Sign-up, login, password reset and logout
//!
//! Each flow checks its form before calling the identity service and answers with the
//! message the user sees. Login and logout are the only emitters of `AuthChanged`.

use crate::identity::{IdentityApi, TokenClaims};
use crate::store::ClientStore;
use muvi_common::events::{AuthChangeReason, ClientEvent, EventBus};
use muvi_common::{Error, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Account actions against the identity service
#[derive(Clone)]
pub struct AuthFlows {
    identity: Arc<dyn IdentityApi>,
    store: ClientStore,
    bus: Arc<EventBus>,
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl AuthFlows {
    pub fn new(identity: Arc<dyn IdentityApi>, store: ClientStore, bus: Arc<EventBus>) -> Self {
        Self {
            identity,
            store,
            bus,
        }
    }

    /// Sign in and store the session; returns the user id
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        if blank(email) || password.is_empty() {
            return Err(Error::InvalidInput("Email and password are required.".to_string()));
        }

        let tokens = self.identity.authenticate(email.trim(), password).await?;
        let user_id = TokenClaims::decode(&tokens.id_token)?
            .sub
            .ok_or_else(|| Error::Parse("Id token has no subject".to_string()))?;

        self.store.save_sign_in(&tokens, &user_id).await?;
        info!(user_id = %user_id, "Logged in");

        self.bus
            .emit_lossy(ClientEvent::auth_changed(AuthChangeReason::SignedIn));
        Ok(user_id)
    }

    /// Clear the stored session and revoke tokens at the identity service
    ///
    /// Revocation is best effort; the local session is gone either way.
    pub async fn logout(&self) -> Result<&'static str> {
        let access_token = match self.store.identity_tokens().await? {
            Some(tokens) => Some(tokens.access_token),
            None => self.store.auth_token().await?,
        };

        self.store.clear_session().await?;

        if let Some(token) = access_token {
            if let Err(e) = self.identity.sign_out(&token).await {
                warn!("Identity sign-out failed: {}", e);
            }
        }

        info!("Logged out");
        self.bus
            .emit_lossy(ClientEvent::auth_changed(AuthChangeReason::SignedOut));
        Ok("Logged out successfully!")
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<&'static str> {
        if blank(email) || password.is_empty() || confirm_password.is_empty() {
            return Err(Error::InvalidInput("All fields are required.".to_string()));
        }
        if password != confirm_password {
            return Err(Error::InvalidInput("Passwords do not match.".to_string()));
        }

        let outcome = self.identity.sign_up(email.trim(), password).await?;
        if outcome.user_confirmed {
            return Ok("Account created. You can log in now.");
        }
        Ok("Signup successful! Please check your email for the verification code.")
    }

    pub async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<&'static str> {
        if blank(email) || blank(code) {
            return Err(Error::InvalidInput("All fields are required.".to_string()));
        }
        self.identity.confirm_sign_up(email.trim(), code.trim()).await?;
        Ok("Account verified! You can log in now.")
    }

    pub async fn forgot_password(&self, email: &str) -> Result<&'static str> {
        if blank(email) {
            return Err(Error::InvalidInput("Email is required".to_string()));
        }
        self.identity.forgot_password(email.trim()).await?;
        Ok("Verification code sent to your email.")
    }

    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<&'static str> {
        if blank(email) || blank(code) || new_password.is_empty() {
            return Err(Error::InvalidInput("All fields are required.".to_string()));
        }
        self.identity
            .confirm_password(email.trim(), code.trim(), new_password)
            .await?;
        Ok("Password changed! You can log in now.")
    }
}
