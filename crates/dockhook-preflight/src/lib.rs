//! Pre-flight checks run before dockhook accepts traffic.
//!
//! - System capabilities: container engine, compose plugin, SSH access to GitHub
//! - Per-repository: webhook secret, remote reachability, branch existence

pub mod capabilities;
pub mod github;
pub mod validator;

pub use capabilities::{CapabilityReport, SystemProbe};
pub use github::{GitHubApi, ProbeError, RemoteProbe};
pub use validator::{ConfigValidator, ValidationResult};
