//! Deployment orchestration for dockhook.
//!
//! Runs the fetch, build, stop and start stages for one repository while
//! guaranteeing at most one run per repository name at a time.

pub mod error;
pub mod pipeline;
pub mod state;

pub use error::DeployError;
pub use pipeline::{DeployOutcome, Deployer, Stage};
pub use state::{DeploymentGuard, DeploymentState};
