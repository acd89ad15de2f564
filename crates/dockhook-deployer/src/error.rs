//! Deployment errors.

use dockhook_core::CommandError;
use thiserror::Error;

use crate::Stage;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("repository {0} not found")]
    UnknownRepository(String),

    #[error("deployment already in progress for {0}")]
    AlreadyDeploying(String),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: CommandError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
