//! Favorites synchronizer
//!
//! Keeps the signed-in user's favorite movies as full records. The server stores only
//! ids; every load resolves them to details concurrently. Toggles are confirmed by the
//! server's reply message before local state changes.

use crate::catalog::CatalogApi;
use crate::store::ClientStore;
use futures::future::join_all;
use muvi_common::events::{ClientEvent, EventBus};
use muvi_common::{Movie, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// How the server described a toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Neither "added" nor "removed" appears in the reply
    Unrecognized(String),
}

impl ToggleOutcome {
    /// Classify a toggle reply (case-insensitive; "removed" wins if both appear)
    pub fn parse(message: Option<&str>) -> Self {
        let text = message.unwrap_or_default();
        let lower = text.to_lowercase();
        if lower.contains("removed") {
            ToggleOutcome::Removed
        } else if lower.contains("added") {
            ToggleOutcome::Added
        } else {
            ToggleOutcome::Unrecognized(text.to_string())
        }
    }
}

/// What a toggle did to local state
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleResult {
    /// No signed-in user; nothing was sent
    NoUser,
    Added(Movie),
    Removed(String),
    /// Server replied with something unrecognized; state unchanged
    Unchanged(String),
}

/// Result of a favorites load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Ids whose detail fetch failed; left out of the list
    pub skipped: Vec<String>,
    /// A newer load or user change superseded this one
    pub discarded: bool,
}

#[derive(Debug, Default)]
struct FavoritesState {
    user_id: Option<String>,
    movies: Vec<Movie>,
    /// Bumped by every toggle that changed `movies`
    toggles: u64,
}

/// Favorites list shared by every view
pub struct FavoritesSync {
    catalog: Arc<dyn CatalogApi>,
    store: ClientStore,
    bus: Arc<EventBus>,
    state: RwLock<FavoritesState>,
}

impl FavoritesSync {
    pub fn new(catalog: Arc<dyn CatalogApi>, store: ClientStore, bus: Arc<EventBus>) -> Self {
        Self {
            catalog,
            store,
            bus,
            state: RwLock::new(FavoritesState::default()),
        }
    }

    pub async fn favorites(&self) -> Vec<Movie> {
        self.state.read().await.movies.clone()
    }

    /// User the current list belongs to
    pub async fn user_id(&self) -> Option<String> {
        self.state.read().await.user_id.clone()
    }

    pub async fn is_favorite(&self, movie: &Movie) -> bool {
        let key = movie.favorite_key();
        self.state
            .read()
            .await
            .movies
            .iter()
            .any(|fav| fav.favorite_key() == key || (!movie.id.is_empty() && fav.id == movie.id))
    }

    /// Replace the list with `user_id`'s favorites
    ///
    /// An error from the id-list call leaves the list as it was. Individual detail
    /// failures are skipped and reported. A toggle that lands while the fetch is in
    /// flight makes the load start over, so its result never overwrites that toggle.
    pub async fn load(&self, user_id: &str) -> Result<LoadReport> {
        {
            let mut state = self.state.write().await;
            if state.user_id.as_deref() != Some(user_id) {
                state.user_id = Some(user_id.to_string());
                state.movies.clear();
            }
        }

        loop {
            let toggles = self.state.read().await.toggles;
            let (movies, skipped) = self.fetch_favorites(user_id).await?;

            let mut state = self.state.write().await;
            if state.user_id.as_deref() != Some(user_id) {
                debug!(user_id = %user_id, "Discarding favorites for a previous user");
                return Ok(LoadReport {
                    discarded: true,
                    ..Default::default()
                });
            }
            if state.toggles != toggles {
                debug!(user_id = %user_id, "Favorites toggled during load, fetching again");
                continue;
            }
            state.movies = movies;
            let loaded = state.movies.len();
            drop(state);

            info!(user_id = %user_id, loaded, skipped = skipped.len(), "Loaded favorites");
            self.bus.emit_lossy(ClientEvent::favorites_changed(loaded));

            return Ok(LoadReport {
                loaded,
                skipped,
                discarded: false,
            });
        }
    }

    /// Favorite ids resolved to details; ids whose detail failed come back separately
    async fn fetch_favorites(&self, user_id: &str) -> Result<(Vec<Movie>, Vec<String>)> {
        let ids = self.catalog.list_favorite_ids(user_id).await?;

        let mut seen = HashSet::new();
        let ids: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();

        let fetches = ids.iter().map(|id| self.catalog.get_movie(id));
        let results = join_all(fetches).await;

        let mut movies = Vec::with_capacity(ids.len());
        let mut skipped = Vec::new();
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(movie) => movies.push(movie),
                Err(e) => {
                    warn!(movie_id = %id, "Skipping favorite, detail fetch failed: {}", e);
                    skipped.push(id);
                }
            }
        }
        Ok((movies, skipped))
    }

    /// Flip `movie`'s membership
    pub async fn toggle(&self, movie: &Movie) -> Result<ToggleResult> {
        let Some(user_id) = self.store.user_id().await? else {
            warn!("Favorite toggle without a signed-in user");
            return Ok(ToggleResult::NoUser);
        };

        // Signed in as someone the list does not belong to yet
        if self.user_id().await.as_deref() != Some(user_id.as_str()) {
            debug!(user_id = %user_id, "Syncing favorites before toggle");
            self.sync_with_store().await?;
        }

        let movie_id = movie.favorite_key().to_string();
        let response = self.catalog.toggle_favorite(&movie_id, &user_id).await?;

        match ToggleOutcome::parse(response.message.as_deref()) {
            ToggleOutcome::Removed => {
                let count = {
                    let mut state = self.state.write().await;
                    state.movies.retain(|fav| fav.favorite_key() != movie_id);
                    state.toggles += 1;
                    state.movies.len()
                };
                debug!(movie_id = %movie_id, "Removed favorite");
                self.bus.emit_lossy(ClientEvent::favorites_changed(count));
                Ok(ToggleResult::Removed(movie_id))
            }
            ToggleOutcome::Added => {
                let detail = self.catalog.get_movie(&movie_id).await?;
                let count = {
                    let mut state = self.state.write().await;
                    let present = state
                        .movies
                        .iter()
                        .any(|fav| fav.favorite_key() == detail.favorite_key());
                    if !present {
                        state.movies.push(detail.clone());
                    }
                    state.toggles += 1;
                    state.movies.len()
                };
                debug!(movie_id = %movie_id, "Added favorite");
                self.bus.emit_lossy(ClientEvent::favorites_changed(count));
                Ok(ToggleResult::Added(detail))
            }
            ToggleOutcome::Unrecognized(message) => {
                warn!(movie_id = %movie_id, message = %message, "Unrecognized toggle reply");
                Ok(ToggleResult::Unchanged(message))
            }
        }
    }

    /// Drop the list and its owner
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.user_id = None;
        state.movies.clear();
        drop(state);
        self.bus.emit_lossy(ClientEvent::favorites_changed(0));
    }

    /// Follow the stored user id: reload for a new user, clear when signed out
    pub async fn sync_with_store(&self) -> Result<()> {
        let stored = self.store.user_id().await?;
        let current = self.user_id().await;

        match stored {
            Some(uid) if current.as_deref() != Some(uid.as_str()) => {
                if let Err(e) = self.load(&uid).await {
                    error!(user_id = %uid, "Failed to load favorites: {}", e);
                }
            }
            Some(_) => {}
            None => {
                if current.is_some() {
                    self.clear().await;
                }
            }
        }
        Ok(())
    }

    /// Follow auth changes
    pub fn spawn_listener(
        self: Arc<Self>,
        mut events: broadcast::Receiver<ClientEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ClientEvent::AuthChanged { .. })
                    | Err(broadcast::error::RecvError::Lagged(_)) => {
                        if let Err(e) = self.sync_with_store().await {
                            warn!("Favorites sync failed: {}", e);
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toggle_outcome() {
        assert_eq!(
            ToggleOutcome::parse(Some("Added to favorites")),
            ToggleOutcome::Added
        );
        assert_eq!(
            ToggleOutcome::parse(Some("Movie REMOVED from favourites")),
            ToggleOutcome::Removed
        );
        assert_eq!(
            ToggleOutcome::parse(Some("ok")),
            ToggleOutcome::Unrecognized("ok".to_string())
        );
        assert_eq!(
            ToggleOutcome::parse(None),
            ToggleOutcome::Unrecognized(String::new())
        );
    }
}
