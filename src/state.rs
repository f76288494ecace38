use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::search::{Aggregator, QueryEngine};
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub engine: Arc<QueryEngine>,
    pub aggregator: Arc<Aggregator>,
    pub config: Config,
}

impl AppState {
    /// Wires the engine and aggregator to `store` according to `config`.
    pub fn new(config: Config, store: Arc<DocumentStore>) -> Self {
        let engine = Arc::new(QueryEngine::from_config(&config, store.clone()));
        let aggregator = Arc::new(Aggregator::new(engine.clone()));
        Self {
            store,
            engine,
            aggregator,
            config,
        }
    }
}

impl FromRef<AppState> for Arc<DocumentStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<QueryEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Arc<Aggregator> {
    fn from_ref(state: &AppState) -> Self {
        state.aggregator.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
