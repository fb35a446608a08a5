//! Application wiring
//!
//! Builds the clients, store, event bus, session tracker and favorites synchronizer, and
//! subscribes the listeners before anything can emit.

use crate::auth_flows::AuthFlows;
use crate::catalog::{CatalogApi, HttpCatalogClient};
use crate::favorites::FavoritesSync;
use crate::identity::{CognitoClient, IdentityApi};
use crate::router::{self, Navigation};
use crate::session::{SessionState, SessionTracker};
use crate::store::ClientStore;
use muvi_common::config::{ClientConfig, RootFolderInitializer};
use muvi_common::events::EventBus;
use muvi_common::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Shared client context
pub struct App {
    pub bus: Arc<EventBus>,
    pub store: ClientStore,
    pub catalog: Arc<dyn CatalogApi>,
    pub identity: Arc<dyn IdentityApi>,
    pub session: Arc<SessionTracker>,
    pub favorites: Arc<FavoritesSync>,
    pub auth: AuthFlows,
    listeners: Vec<JoinHandle<()>>,
}

impl App {
    /// Wire components together; must run inside a tokio runtime
    pub fn new(
        catalog: Arc<dyn CatalogApi>,
        identity: Arc<dyn IdentityApi>,
        store: ClientStore,
    ) -> Self {
        let bus = Arc::new(EventBus::default());
        let session = Arc::new(SessionTracker::new(identity.clone(), store.clone()));
        let favorites = Arc::new(FavoritesSync::new(
            catalog.clone(),
            store.clone(),
            bus.clone(),
        ));
        let auth = AuthFlows::new(identity.clone(), store.clone(), bus.clone());

        let listeners = vec![
            session.clone().spawn_listener(bus.subscribe()),
            favorites.clone().spawn_listener(bus.subscribe()),
        ];
        tracing::debug!(
            subscribers = bus.subscriber_count(),
            capacity = bus.capacity(),
            "Event listeners wired"
        );

        Self {
            bus,
            store,
            catalog,
            identity,
            session,
            favorites,
            auth,
            listeners,
        }
    }

    /// Build the production client from resolved configuration
    pub async fn from_config(config: &ClientConfig) -> Result<Self> {
        let initializer = RootFolderInitializer::new(config.root_folder.clone());
        initializer.ensure_directory_exists()?;
        let store = ClientStore::open(&initializer.database_path()).await?;

        let catalog = HttpCatalogClient::new(&config.catalog_url)?;
        let identity = CognitoClient::new(&config.identity_region, &config.identity_client_id)?;

        tracing::info!(
            catalog_url = %config.catalog_url,
            identity_region = %config.identity_region,
            root_folder = %config.root_folder.display(),
            "Client configured"
        );

        Ok(Self::new(Arc::new(catalog), Arc::new(identity), store))
    }

    /// Initial session check
    pub async fn start(&self) -> SessionState {
        self.session.check().await
    }

    /// Guarded navigation; waits for the session to resolve first
    pub async fn navigate(&self, path: &str) -> (Navigation, Vec<String>) {
        let state = self.session.resolved().await;
        router::resolve(path, &state)
    }

    /// Make sure the favorites list follows the stored user
    pub async fn sync_favorites(&self) -> Result<()> {
        self.favorites.sync_with_store().await
    }
}

impl Drop for App {
    fn drop(&mut self) {
        for handle in &self.listeners {
            handle.abort();
        }
    }
}
