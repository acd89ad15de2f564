//! Repository configuration model and defaulting rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::remote::RemoteRef;
use crate::secret::{SecretLookup, secret_env_var};
use crate::{ConfigError, ConfigResult};

/// Owner used when neither an explicit owner nor a parseable URL is given.
pub const DEFAULT_OWNER: &str = "saphitv";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_COMPOSE_PATH: &str = "./docker-compose.yaml";
/// Sentinel secret for repositories whose secret variable is unset.
pub const PLACEHOLDER_SECRET: &str = "your-webhook-secret";

const DEFAULT_HOST: &str = "github.com";

/// Source-control event kind that deploys a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerOn {
    Push,
    Release,
}

impl TriggerOn {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerOn::Push => "push",
            TriggerOn::Release => "release",
        }
    }

    /// Whether an event of kind `event` (the `X-GitHub-Event` header) with
    /// payload `action` should deploy. Releases only count once published.
    pub fn accepts(&self, event: &str, action: Option<&str>) -> bool {
        match self {
            TriggerOn::Push => event == "push",
            TriggerOn::Release => event == "release" && action == Some("published"),
        }
    }
}

impl fmt::Display for TriggerOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TriggerOn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(TriggerOn::Push),
            "release" => Ok(TriggerOn::Release),
            _ => Err(format!("unknown trigger: {s} (expected push or release)")),
        }
    }
}

/// Partially specified repository record. Absent fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryOverrides {
    pub owner: Option<String>,
    pub url: Option<String>,
    pub branch: Option<String>,
    pub compose_path: Option<String>,
    pub trigger_on: Option<TriggerOn>,
    pub webhook_secret: Option<String>,
}

/// Fully resolved repository record.
#[derive(Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Map key, local directory name and default remote repository name.
    pub name: String,
    pub owner: String,
    pub url: String,
    pub branch: String,
    /// Compose manifest, relative to the repository root.
    pub compose_path: String,
    pub trigger_on: TriggerOn,
    pub webhook_secret: String,
}

impl RepositoryConfig {
    /// Whether the secret is missing or still the placeholder.
    pub fn has_placeholder_secret(&self) -> bool {
        self.webhook_secret.is_empty() || self.webhook_secret == PLACEHOLDER_SECRET
    }
}

impl fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("url", &self.url)
            .field("branch", &self.branch)
            .field("compose_path", &self.compose_path)
            .field("trigger_on", &self.trigger_on)
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

/// Merge `overrides` for repository `name` against computed defaults.
///
/// Explicit values always win. The owner comes from the explicit value, else
/// the URL, else `default_owner`. The secret comes from the explicit value,
/// else `WEBHOOK_SECRET_<NAME>` in `env`, else [`PLACEHOLDER_SECRET`].
pub fn resolve(
    name: &str,
    overrides: RepositoryOverrides,
    default_owner: &str,
    env: &dyn SecretLookup,
) -> ConfigResult<RepositoryConfig> {
    let trigger_on = overrides
        .trigger_on
        .ok_or_else(|| ConfigError::MissingField(format!("trigger for repository '{name}'")))?;

    let owner = overrides
        .owner
        .or_else(|| {
            overrides
                .url
                .as_deref()
                .and_then(RemoteRef::parse)
                .map(|r| r.owner)
        })
        .unwrap_or_else(|| default_owner.to_string());

    let url = overrides
        .url
        .unwrap_or_else(|| format!("https://{DEFAULT_HOST}/{owner}/{name}"));

    let webhook_secret = overrides
        .webhook_secret
        .or_else(|| env.get(&secret_env_var(name)))
        .unwrap_or_else(|| PLACEHOLDER_SECRET.to_string());

    Ok(RepositoryConfig {
        name: name.to_string(),
        owner,
        url,
        branch: overrides
            .branch
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        compose_path: overrides
            .compose_path
            .unwrap_or_else(|| DEFAULT_COMPOSE_PATH.to_string()),
        trigger_on,
        webhook_secret,
    })
}

/// The configured repository set, keyed by unique name.
#[derive(Debug, Clone, Default)]
pub struct Repositories {
    by_name: BTreeMap<String, RepositoryConfig>,
}

impl Repositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository, rejecting a name that is already present.
    pub fn insert(&mut self, repo: RepositoryConfig) -> ConfigResult<()> {
        if self.by_name.contains_key(&repo.name) {
            return Err(ConfigError::Duplicate(format!("repository '{}'", repo.name)));
        }
        self.by_name.insert(repo.name.clone(), repo);
        Ok(())
    }

    pub fn from_configs(repos: impl IntoIterator<Item = RepositoryConfig>) -> ConfigResult<Self> {
        let mut set = Self::new();
        for repo in repos {
            set.insert(repo)?;
        }
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&RepositoryConfig> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryConfig> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    fn push_only() -> RepositoryOverrides {
        RepositoryOverrides {
            trigger_on: Some(TriggerOn::Push),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_record_gets_every_default() {
        let repo = resolve("AM-Suisse", push_only(), DEFAULT_OWNER, &no_env()).unwrap();

        assert_eq!(repo.name, "AM-Suisse");
        assert_eq!(repo.owner, "saphitv");
        assert_eq!(repo.url, "https://github.com/saphitv/AM-Suisse");
        assert_eq!(repo.branch, "main");
        assert_eq!(repo.compose_path, "./docker-compose.yaml");
        assert_eq!(repo.trigger_on, TriggerOn::Push);
        assert_eq!(repo.webhook_secret, PLACEHOLDER_SECRET);
        assert!(repo.has_placeholder_secret());
    }

    #[test]
    fn test_explicit_values_are_never_overwritten() {
        let overrides = RepositoryOverrides {
            owner: Some("acme".to_string()),
            url: Some("git@github.com:someone-else/api.git".to_string()),
            branch: Some("production".to_string()),
            compose_path: Some("./deploy/compose.yml".to_string()),
            trigger_on: Some(TriggerOn::Release),
            webhook_secret: Some("explicit".to_string()),
        };
        let env = HashMap::from([("WEBHOOK_SECRET_API".to_string(), "from-env".to_string())]);

        let repo = resolve("api", overrides, DEFAULT_OWNER, &env).unwrap();

        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.url, "git@github.com:someone-else/api.git");
        assert_eq!(repo.branch, "production");
        assert_eq!(repo.compose_path, "./deploy/compose.yml");
        assert_eq!(repo.trigger_on, TriggerOn::Release);
        assert_eq!(repo.webhook_secret, "explicit");
    }

    #[test]
    fn test_owner_is_parsed_from_url() {
        let https = RepositoryOverrides {
            url: Some("https://github.com/acme/site".to_string()),
            ..push_only()
        };
        let ssh = RepositoryOverrides {
            url: Some("git@github.com:other-org/site.git".to_string()),
            ..push_only()
        };

        assert_eq!(resolve("site", https, DEFAULT_OWNER, &no_env()).unwrap().owner, "acme");
        assert_eq!(resolve("site", ssh, DEFAULT_OWNER, &no_env()).unwrap().owner, "other-org");
    }

    #[test]
    fn test_unparseable_url_falls_back_to_default_owner() {
        let overrides = RepositoryOverrides {
            url: Some("/srv/git/site.git".to_string()),
            ..push_only()
        };
        let repo = resolve("site", overrides, "fallback-org", &no_env()).unwrap();
        assert_eq!(repo.owner, "fallback-org");
        assert_eq!(repo.url, "/srv/git/site.git");
    }

    #[test]
    fn test_secret_defaults_from_environment() {
        let env = HashMap::from([(
            "WEBHOOK_SECRET_AM_SUISSE".to_string(),
            "s3cret".to_string(),
        )]);
        let repo = resolve("AM-Suisse", push_only(), DEFAULT_OWNER, &env).unwrap();
        assert_eq!(repo.webhook_secret, "s3cret");
        assert!(!repo.has_placeholder_secret());
    }

    #[test]
    fn test_missing_trigger_is_an_error() {
        let err = resolve("api", RepositoryOverrides::default(), DEFAULT_OWNER, &no_env())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn test_trigger_parsing() {
        assert_eq!("push".parse::<TriggerOn>().unwrap(), TriggerOn::Push);
        assert_eq!("release".parse::<TriggerOn>().unwrap(), TriggerOn::Release);
        assert!("tag".parse::<TriggerOn>().is_err());
        assert_eq!(TriggerOn::Release.to_string(), "release");
    }

    #[test]
    fn test_trigger_policy() {
        assert!(TriggerOn::Push.accepts("push", None));
        assert!(!TriggerOn::Push.accepts("release", Some("published")));
        assert!(!TriggerOn::Push.accepts("ping", None));

        assert!(TriggerOn::Release.accepts("release", Some("published")));
        assert!(!TriggerOn::Release.accepts("release", Some("created")));
        assert!(!TriggerOn::Release.accepts("release", Some("edited")));
        assert!(!TriggerOn::Release.accepts("release", None));
        assert!(!TriggerOn::Release.accepts("push", Some("published")));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let a = resolve("api", push_only(), DEFAULT_OWNER, &no_env()).unwrap();
        let b = a.clone();
        let err = Repositories::from_configs([a, b]).unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let overrides = RepositoryOverrides {
            webhook_secret: Some("hunter2".to_string()),
            ..push_only()
        };
        let repo = resolve("api", overrides, DEFAULT_OWNER, &no_env()).unwrap();
        assert!(!format!("{repo:?}").contains("hunter2"));
    }
}
