//! Application state.

use dockhook_config::Repositories;
use dockhook_deployer::Deployer;
use dockhook_preflight::SystemProbe;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub repositories: Arc<Repositories>,
    pub deployer: Arc<Deployer>,
    pub system: SystemProbe,
}

impl AppState {
    pub fn new(deployer: Arc<Deployer>, system: SystemProbe) -> Self {
        Self {
            repositories: Arc::clone(deployer.repositories()),
            deployer,
            system,
        }
    }
}
