// Application state module
// Shared, immutable runtime state handed to every connection

use std::sync::Arc;
use tokio::sync::Notify;

use super::types::Config;
use crate::replay::{PreviewRule, RedirectHandler};
use crate::store::FsStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub handler: RedirectHandler<FsStore, FsStore>,
    pub shutdown: Arc<Notify>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let store = Arc::new(FsStore::new(&config.store.root));
        let preview = PreviewRule::new(
            &config.store.preview_header,
            &config.store.preview_value,
            &config.store.preview_suffix,
        );
        let handler = RedirectHandler::new(Arc::clone(&store), store, preview)
            .with_replay_log(config.logging.replay_log);

        Self {
            config: config.clone(),
            handler,
            shutdown: Arc::new(Notify::new()),
        }
    }
}
