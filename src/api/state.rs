use std::sync::Arc;

use crate::bracket::BracketAdvancer;
use crate::storage::TournamentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TournamentStore>,
    pub advancer: Arc<BracketAdvancer>,
}

impl AppState {
    pub fn new(store: Arc<dyn TournamentStore>) -> Self {
        Self {
            advancer: Arc::new(BracketAdvancer::new(store.clone())),
            store,
        }
    }
}
