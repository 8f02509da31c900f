// region:    --- Imports
use std::sync::Arc;
use std::time::Duration;

use crate::bidding::locks::ProductLocks;
use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::store::RecordStore;

// endregion: --- Imports

// region:    --- App State

/// Service-owned state: the record store collaborator, the subscriber
/// registry and the per-product lock registry. Created once at startup
/// and passed to every handler; nothing here is ambient module state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn RecordStore>,
    pub broadcaster: Arc<Broadcaster>,
    pub locks: ProductLocks,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RecordStore>) -> Arc<Self> {
        let locks = ProductLocks::new(Duration::from_millis(config.lock_timeout_ms));
        Arc::new(Self {
            config,
            store,
            broadcaster: Broadcaster::new(),
            locks,
        })
    }
}

// endregion: --- App State
