//! Repository set parsing from KDL.
//!
//! ```kdl
//! default-owner "saphitv"
//!
//! repository "AM-Suisse" trigger="release"
//!
//! repository "api" trigger="push" {
//!     owner "acme"
//!     url "git@github.com:acme/api.git"
//!     branch "production"
//!     compose "./deploy/docker-compose.yaml"
//!     secret "inline-secret"
//! }
//! ```
//!
//! Every field may be written either as a property on the `repository` node
//! or as a child node.

use crate::repository::{DEFAULT_OWNER, Repositories, RepositoryOverrides, TriggerOn, resolve};
use crate::secret::SecretLookup;
use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use std::path::Path;

/// Read and parse the repository file at `path`.
pub fn load_repositories(path: &Path, env: &dyn SecretLookup) -> ConfigResult<Repositories> {
    let text = std::fs::read_to_string(path)?;
    parse_repositories(&text, env)
}

/// Parse a repository set from KDL text, resolving every record.
pub fn parse_repositories(kdl: &str, env: &dyn SecretLookup) -> ConfigResult<Repositories> {
    let doc: KdlDocument = kdl.parse()?;

    let default_owner = doc
        .nodes()
        .iter()
        .find(|n| n.name().value() == "default-owner")
        .and_then(get_first_string_arg)
        .unwrap_or_else(|| DEFAULT_OWNER.to_string());

    let mut repositories = Repositories::new();
    for node in doc.nodes() {
        if node.name().value() != "repository" {
            continue;
        }
        let (name, overrides) = parse_repository(node)?;
        repositories.insert(resolve(&name, overrides, &default_owner, env)?)?;
    }

    Ok(repositories)
}

fn parse_repository(node: &KdlNode) -> ConfigResult<(String, RepositoryOverrides)> {
    let name = get_first_string_arg(node)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ConfigError::MissingField("repository name".to_string()))?;

    let trigger_on = match get_field(node, "trigger") {
        Some(value) => Some(value.parse::<TriggerOn>().map_err(|message| {
            ConfigError::InvalidValue {
                field: format!("trigger for repository '{name}'"),
                message,
            }
        })?),
        None => None,
    };

    let overrides = RepositoryOverrides {
        owner: get_field(node, "owner"),
        url: get_field(node, "url"),
        branch: get_field(node, "branch"),
        compose_path: get_field(node, "compose").or_else(|| get_field(node, "compose-path")),
        trigger_on,
        webhook_secret: get_field(node, "secret"),
    };

    Ok((name, overrides))
}

// Helper functions for extracting values from KDL nodes

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

/// Property `name="..."`, else the first argument of child node `name`.
fn get_field(node: &KdlNode, name: &str) -> Option<String> {
    get_string_prop(node, name).or_else(|| {
        node.children()?
            .nodes()
            .iter()
            .find(|child| child.name().value() == name)
            .and_then(get_first_string_arg)
    })
}
