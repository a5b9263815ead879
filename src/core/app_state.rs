use std::sync::Arc;

use crate::core::config::Config;
use crate::store::gateway::Gateway;

/// Shared per-request state: the table gateway and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(gateway: Gateway, config: Config) -> Self {
        Self {
            gateway,
            config: Arc::new(config),
        }
    }
}
