//! Session tracker
//!
//! Holds the tri-state authentication flag and re-evaluates it at startup and on every
//! `AuthChanged` event. The tracker only listens; it never emits auth events itself, so a
//! re-check cannot trigger another re-check.

use crate::identity::{IdentityApi, TokenClaims};
use crate::store::ClientStore;
use muvi_common::events::ClientEvent;
use muvi_common::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Authentication state as seen by views and the router
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Check not finished; render nothing that depends on auth
    #[default]
    Unknown,
    Authenticated {
        user_id: Option<String>,
    },
    Unauthenticated,
}

impl SessionState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Unknown)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

/// A session that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSession {
    pub access_token: String,
    pub user_id: Option<String>,
}

/// Outcome of the current-session lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    NoUser,
    Invalid,
    Valid(ValidSession),
}

/// Look up the stored identity session and validate it
///
/// The access token is valid while its `exp` claim lies in the future. An expired token
/// with a stored refresh token gets exactly one refresh attempt.
pub async fn current_session(
    identity: &dyn IdentityApi,
    store: &ClientStore,
    now: i64,
) -> Result<SessionLookup> {
    let Some(tokens) = store.identity_tokens().await? else {
        return Ok(SessionLookup::NoUser);
    };

    let user_id = |id_token: Option<&str>| {
        id_token
            .and_then(|t| TokenClaims::decode(t).ok())
            .and_then(|c| c.sub)
    };

    let claims = TokenClaims::decode(&tokens.access_token)?;
    if claims.is_valid_at(now) {
        return Ok(SessionLookup::Valid(ValidSession {
            user_id: user_id(tokens.id_token.as_deref()).or(claims.sub),
            access_token: tokens.access_token,
        }));
    }

    let Some(refresh_token) = tokens.refresh_token else {
        debug!("Access token expired and no refresh token stored");
        return Ok(SessionLookup::Invalid);
    };

    match identity.refresh(&refresh_token).await {
        Ok(fresh) => {
            store.save_identity_tokens(&fresh).await?;
            info!("Refreshed expired session");
            Ok(SessionLookup::Valid(ValidSession {
                user_id: user_id(Some(&fresh.id_token)),
                access_token: fresh.access_token,
            }))
        }
        Err(e) => {
            warn!("Session refresh failed: {}", e);
            Ok(SessionLookup::Invalid)
        }
    }
}

/// Tracks whether the user is signed in
pub struct SessionTracker {
    identity: Arc<dyn IdentityApi>,
    store: ClientStore,
    state: watch::Sender<SessionState>,
}

impl SessionTracker {
    pub fn new(identity: Arc<dyn IdentityApi>, store: ClientStore) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            identity,
            store,
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Re-evaluate the session
    ///
    /// The state reads Unknown while the lookup is in flight. Any failure resolves to
    /// Unauthenticated; there are no retries.
    pub async fn check(&self) -> SessionState {
        self.state.send_replace(SessionState::Unknown);

        let now = chrono::Utc::now().timestamp();
        let lookup = current_session(self.identity.as_ref(), &self.store, now).await;

        let next = match lookup {
            Ok(SessionLookup::Valid(session)) => {
                if let Err(e) = self.store.set_auth_token(&session.access_token).await {
                    warn!("Failed to persist access token: {}", e);
                }
                SessionState::Authenticated {
                    user_id: session.user_id,
                }
            }
            other => {
                match other {
                    Ok(lookup) => debug!(?lookup, "No valid session"),
                    Err(e) => warn!("Session check failed: {}", e),
                }
                if let Err(e) = self.store.clear_auth_token().await {
                    warn!("Failed to clear access token: {}", e);
                }
                SessionState::Unauthenticated
            }
        };

        info!(authenticated = next.is_authenticated(), "Session checked");
        self.state.send_replace(next.clone());
        next
    }

    /// Wait until the state leaves Unknown
    pub async fn resolved(&self) -> SessionState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(SessionState::is_resolved).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    /// Re-check on every auth change
    ///
    /// `events` must be subscribed before any auth event can be emitted.
    pub fn spawn_listener(
        self: Arc<Self>,
        mut events: broadcast::Receiver<ClientEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ClientEvent::AuthChanged { reason, .. }) => {
                        debug!(?reason, "Auth changed, re-checking session");
                        self.check().await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session listener lagged, re-checking");
                        self.check().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
