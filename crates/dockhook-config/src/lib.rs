//! Repository configuration for dockhook.
//!
//! This crate handles:
//! - The per-repository model and its defaulting rules
//! - Remote URL parsing (HTTPS and SSH forms)
//! - Secret lookup from the environment
//! - Loading the repository set from a KDL file

pub mod error;
pub mod file;
pub mod remote;
pub mod repository;
pub mod secret;

pub use error::{ConfigError, ConfigResult};
pub use file::{load_repositories, parse_repositories};
pub use remote::RemoteRef;
pub use repository::{
    DEFAULT_BRANCH, DEFAULT_COMPOSE_PATH, DEFAULT_OWNER, PLACEHOLDER_SECRET, RepositoryConfig,
    RepositoryOverrides, Repositories, TriggerOn, resolve,
};
pub use secret::{ProcessEnv, SecretLookup, secret_env_var};
