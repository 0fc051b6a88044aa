//! services/app/src/tui/services.rs
//!
//! Centralized handle to the ports and stores.
//!
//! Created once at startup, then passed by reference to views that need
//! backend access; spawned tasks clone the `Arc`s they use plus the event
//! sender.

use std::sync::Arc;

use tokio::sync::mpsc;

use doclens_core::ports::{BackendService, ProfileStorage};

use crate::config::Config;
use crate::state::favorites::FavoritesStore;
use crate::state::session::SessionStore;
use crate::state::settings::SettingsStore;
use crate::state::toasts::ToastQueue;

use super::events::AppEvent;

pub struct Services {
    pub config: Arc<Config>,
    pub backend: Arc<dyn BackendService>,
    pub storage: Arc<dyn ProfileStorage>,
    pub session: Arc<SessionStore>,
    pub favorites: Arc<FavoritesStore>,
    pub settings: Arc<SettingsStore>,
    pub toasts: Arc<ToastQueue>,
    pub event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Services {
    /// Wires the stores onto the given port implementations.
    pub fn new(
        config: Arc<Config>,
        backend: Arc<dyn BackendService>,
        storage: Arc<dyn ProfileStorage>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let toasts = Arc::new(ToastQueue::new());
        let session = Arc::new(SessionStore::new(
            backend.clone(),
            storage.clone(),
            toasts.clone(),
        ));
        let favorites = Arc::new(FavoritesStore::new(storage.clone()));
        let settings = Arc::new(SettingsStore::new(storage.clone()));

        Self {
            config,
            backend,
            storage,
            session,
            favorites,
            settings,
            toasts,
            event_tx,
        }
    }
}
