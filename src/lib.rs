pub mod commands;
pub mod logging;
mod state;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use seer_sdk::{ChainBackend, SeerNode, TransactionBackend};

pub use logging::{LogConfig, init_logging};
pub use state::{
    AppState, AppStateManager, ChainConfig, ChainStatus, SplitSession, SplitView, StateError,
    TxKind, TxRecord,
};

pub const APP_STATE_UPDATED_EVENT: &str = "app_state_updated";

const EVENT_CAPACITY: usize = 64;

/// The single app session: wizard, split form and chain config behind one
/// mutex, plus the node that talks to the chain.
///
/// Every mutating command bumps the state revision and broadcasts the new
/// snapshot to [`App::subscribe`] receivers.
pub struct App<B> {
    pub(crate) manager: Arc<Mutex<AppStateManager>>,
    pub(crate) node: SeerNode<B>,
    pub(crate) events: broadcast::Sender<AppState>,
}

impl<B> App<B>
where
    B: ChainBackend + TransactionBackend + Send + Sync + 'static,
{
    pub fn new(app_data_dir: PathBuf, backend: B) -> Self {
        Self::with_backend(app_data_dir, Arc::new(backend))
    }

    pub fn with_backend(app_data_dir: PathBuf, backend: Arc<B>) -> Self {
        let manager = AppStateManager::new(app_data_dir);
        let config = manager.config();
        let missing = config.contracts.missing();
        if !missing.is_empty() {
            log::warn!(
                "{}: contracts not configured: {}",
                config.chain,
                missing.join(", ")
            );
        }
        let node = SeerNode::with_backend(backend, config.contracts);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            manager: Arc::new(Mutex::new(manager)),
            node,
            events,
        }
    }

    /// Receiver for [`APP_STATE_UPDATED_EVENT`] snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<AppState> {
        self.events.subscribe()
    }

    pub fn node(&self) -> &SeerNode<B> {
        &self.node
    }
}

/// Install logging and open the app session.
pub fn run<B>(app_data_dir: PathBuf, backend: B, log_config: &LogConfig) -> App<B>
where
    B: ChainBackend + TransactionBackend + Send + Sync + 'static,
{
    init_logging(log_config);
    log::info!("app data dir: {}", app_data_dir.display());
    App::new(app_data_dir, backend)
}

pub(crate) fn emit_state(events: &broadcast::Sender<AppState>, state: &AppState) {
    // No receivers is fine.
    let _ = events.send(state.clone());
}
