//! Persisted client state
//!
//! A small key-value table in `muvi.db` holding what a browser client would keep in local
//! storage. Two groups of keys live here:
//!
//! - identity session (`identity.*`): tokens as issued by the identity service, read by
//!   the current-session lookup
//! - application session (`auth_token`, `id_token`, `user_id`): the copy the rest of the
//!   client reads; the user id keys favorites requests

use crate::identity::AuthTokens;
use muvi_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;

pub const KEY_AUTH_TOKEN: &str = "auth_token";
pub const KEY_ID_TOKEN: &str = "id_token";
pub const KEY_USER_ID: &str = "user_id";

const KEY_IDENTITY_ACCESS: &str = "identity.access_token";
const KEY_IDENTITY_ID: &str = "identity.id_token";
const KEY_IDENTITY_REFRESH: &str = "identity.refresh_token";

const SESSION_KEYS: [&str; 6] = [
    KEY_AUTH_TOKEN,
    KEY_ID_TOKEN,
    KEY_USER_ID,
    KEY_IDENTITY_ACCESS,
    KEY_IDENTITY_ID,
    KEY_IDENTITY_REFRESH,
];

/// Tokens held for the identity session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTokens {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Key-value client store
#[derive(Clone)]
pub struct ClientStore {
    db: Pool<Sqlite>,
}

impl ClientStore {
    /// Open (creating if needed) the store at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .busy_timeout(Duration::from_millis(5000))
            .journal_mode(SqliteJournalMode::Wal)
            .create_if_missing(true);

        let db = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await?;

        tracing::debug!(path = %path.display(), "Opened client store");
        Self::with_pool(db).await
    }

    /// Store backed by a private in-memory database
    pub async fn in_memory() -> Result<Self> {
        // Each connection to sqlite::memory: is a separate database
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(db).await
    }

    async fn with_pool(db: Pool<Sqlite>) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS client_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&db)
        .await?;

        Ok(Self { db })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM client_state WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.db)
                .await?;
        Ok(value)
    }

    /// Insert or replace a value
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO client_state (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM client_state WHERE key = ?")
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// User id of the last sign-in
    pub async fn user_id(&self) -> Result<Option<String>> {
        self.get(KEY_USER_ID).await
    }

    pub async fn auth_token(&self) -> Result<Option<String>> {
        self.get(KEY_AUTH_TOKEN).await
    }

    pub async fn set_auth_token(&self, token: &str) -> Result<()> {
        self.set(KEY_AUTH_TOKEN, token).await
    }

    pub async fn clear_auth_token(&self) -> Result<()> {
        self.remove(KEY_AUTH_TOKEN).await
    }

    /// Record a completed sign-in for both the identity and application sessions
    pub async fn save_sign_in(&self, tokens: &AuthTokens, user_id: &str) -> Result<()> {
        self.save_identity_tokens(tokens).await?;
        self.set(KEY_AUTH_TOKEN, &tokens.access_token).await?;
        self.set(KEY_ID_TOKEN, &tokens.id_token).await?;
        self.set(KEY_USER_ID, user_id).await?;
        Ok(())
    }

    /// Replace identity session tokens, keeping the stored refresh token when none is issued
    pub async fn save_identity_tokens(&self, tokens: &AuthTokens) -> Result<()> {
        self.set(KEY_IDENTITY_ACCESS, &tokens.access_token).await?;
        self.set(KEY_IDENTITY_ID, &tokens.id_token).await?;
        if let Some(refresh) = tokens.refresh_token.as_deref() {
            self.set(KEY_IDENTITY_REFRESH, refresh).await?;
        }
        Ok(())
    }

    pub async fn identity_tokens(&self) -> Result<Option<StoredTokens>> {
        let Some(access_token) = self.get(KEY_IDENTITY_ACCESS).await? else {
            return Ok(None);
        };

        Ok(Some(StoredTokens {
            access_token,
            id_token: self.get(KEY_IDENTITY_ID).await?,
            refresh_token: self.get(KEY_IDENTITY_REFRESH).await?,
        }))
    }

    /// Forget every session key
    pub async fn clear_session(&self) -> Result<()> {
        for key in SESSION_KEYS {
            self.remove(key).await?;
        }
        tracing::debug!("Cleared stored session");
        Ok(())
    }
}
