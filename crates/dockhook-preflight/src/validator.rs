//! Startup validation of tooling and every configured repository.

use dockhook_config::{RemoteRef, Repositories, RepositoryConfig, secret_env_var};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{RemoteProbe, SystemProbe};

/// Name of the synthetic result carrying system capability failures.
pub const SYSTEM_RESULT: &str = "system";

/// Validation verdict for one repository, or for the system as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub repo_name: String,
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(repo_name: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            repo_name: repo_name.into(),
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

pub struct ConfigValidator {
    system: SystemProbe,
    remote: Arc<dyn RemoteProbe>,
    repositories: Arc<Repositories>,
}

impl ConfigValidator {
    pub fn new(
        system: SystemProbe,
        remote: Arc<dyn RemoteProbe>,
        repositories: Arc<Repositories>,
    ) -> Self {
        Self {
            system,
            remote,
            repositories,
        }
    }

    /// Validate system tooling, then every repository.
    ///
    /// If any capability is missing the result is a single `"system"` entry
    /// and no repository is checked. Never fails: every problem becomes an
    /// error string in the returned list.
    pub async fn validate_all(&self) -> Vec<ValidationResult> {
        let report = self.system.check().await;
        if !report.errors.is_empty() {
            warn!(errors = ?report.errors, "System requirements not met");
            return vec![ValidationResult::from_errors(SYSTEM_RESULT, report.errors)];
        }

        let checks = self.repositories.iter().map(|repo| async move {
            let errors = self.validate_repository(repo).await;
            if errors.is_empty() {
                info!(repo = %repo.name, "Repository configuration valid");
            }
            ValidationResult::from_errors(repo.name.clone(), errors)
        });
        join_all(checks).await
    }

    async fn validate_repository(&self, repo: &RepositoryConfig) -> Vec<String> {
        let mut errors = Vec::new();

        if repo.has_placeholder_secret() {
            errors.push(format!(
                "Missing webhook secret. Please set {} environment variable or configure it explicitly.",
                secret_env_var(&repo.name)
            ));
        }

        let Some(remote) = RemoteRef::parse(&repo.url) else {
            errors.push(format!(
                "Failed to validate repository {}: unrecognized remote URL",
                repo.url
            ));
            return errors;
        };

        match self.remote.repository_exists(&remote).await {
            Ok(true) => match self.remote.branch_exists(&remote, &repo.branch).await {
                Ok(true) => {}
                Ok(false) => errors.push(format!(
                    "Branch '{}' does not exist in repository {}",
                    repo.branch, repo.url
                )),
                Err(e) => errors.push(format!(
                    "Failed to validate repository {}: {}",
                    repo.url, e
                )),
            },
            Ok(false) => errors.push(format!("Repository not accessible at {}", repo.url)),
            Err(e) => errors.push(format!(
                "Failed to validate repository {}: {}",
                repo.url, e
            )),
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProbeError;
    use async_trait::async_trait;
    use dockhook_config::{DEFAULT_OWNER, RepositoryOverrides, TriggerOn, resolve};
    use dockhook_core::testing::ScriptedRunner;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRemote {
        repos: HashSet<String>,
        branches: HashSet<String>,
        broken: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRemote {
        fn with_branch(mut self, full_name: &str, branch: &str) -> Self {
            self.repos.insert(full_name.to_string());
            self.branches.insert(format!("{full_name}@{branch}"));
            self
        }

        fn broken(mut self, full_name: &str) -> Self {
            self.broken.insert(full_name.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteProbe for FakeRemote {
        async fn repository_exists(&self, remote: &RemoteRef) -> Result<bool, ProbeError> {
            let name = remote.full_name();
            self.calls.lock().unwrap().push(format!("repo {name}"));
            if self.broken.contains(&name) {
                return Err(ProbeError::Request("connection reset".to_string()));
            }
            Ok(self.repos.contains(&name))
        }

        async fn branch_exists(&self, remote: &RemoteRef, branch: &str) -> Result<bool, ProbeError> {
            let key = format!("{}@{}", remote.full_name(), branch);
            self.calls.lock().unwrap().push(format!("branch {key}"));
            Ok(self.branches.contains(&key))
        }
    }

    fn repo(name: &str, secret: Option<&str>) -> RepositoryConfig {
        let overrides = RepositoryOverrides {
            owner: Some("acme".to_string()),
            trigger_on: Some(TriggerOn::Push),
            webhook_secret: secret.map(str::to_string),
            ..Default::default()
        };
        resolve(name, overrides, DEFAULT_OWNER, &HashMap::<String, String>::new()).unwrap()
    }

    fn validator(
        runner: ScriptedRunner,
        remote: Arc<FakeRemote>,
        repos: Vec<RepositoryConfig>,
    ) -> ConfigValidator {
        ConfigValidator::new(
            SystemProbe::new(Arc::new(runner)),
            remote,
            Arc::new(Repositories::from_configs(repos).unwrap()),
        )
    }

    fn healthy_system() -> ScriptedRunner {
        ScriptedRunner::new().exit_code("ssh", 1)
    }

    #[tokio::test]
    async fn test_valid_repository() {
        let remote = Arc::new(FakeRemote::default().with_branch("acme/api", "main"));
        let results = validator(healthy_system(), remote, vec![repo("api", Some("s"))])
            .validate_all()
            .await;

        assert_eq!(
            results,
            vec![ValidationResult {
                repo_name: "api".to_string(),
                is_valid: true,
                errors: vec![],
            }]
        );
    }

    #[tokio::test]
    async fn test_system_failure_short_circuits() {
        let remote = Arc::new(FakeRemote::default().with_branch("acme/api", "main"));
        let runner = healthy_system().missing("docker version");
        let results = validator(runner, remote.clone(), vec![repo("api", Some("s"))])
            .validate_all()
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].repo_name, "system");
        assert!(!results[0].is_valid);
        assert_eq!(results[0].errors, vec!["Docker is not installed or not in PATH"]);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_repository_skips_branch_check() {
        let remote = Arc::new(FakeRemote::default());
        let results = validator(healthy_system(), remote.clone(), vec![repo("api", Some("s"))])
            .validate_all()
            .await;

        assert!(!results[0].is_valid);
        assert_eq!(
            results[0].errors,
            vec!["Repository not accessible at https://github.com/acme/api"]
        );
        assert_eq!(remote.calls(), vec!["repo acme/api"]);
    }

    #[tokio::test]
    async fn test_missing_branch() {
        let remote = Arc::new(FakeRemote::default().with_branch("acme/api", "develop"));
        let results = validator(healthy_system(), remote, vec![repo("api", Some("s"))])
            .validate_all()
            .await;

        assert_eq!(
            results[0].errors,
            vec!["Branch 'main' does not exist in repository https://github.com/acme/api"]
        );
    }

    #[tokio::test]
    async fn test_placeholder_secret_and_network_failure_are_collected() {
        let remote = Arc::new(
            FakeRemote::default()
                .with_branch("acme/site", "main")
                .broken("acme/AM-Suisse"),
        );
        let results = validator(
            healthy_system(),
            remote,
            vec![repo("AM-Suisse", None), repo("site", Some("s"))],
        )
        .validate_all()
        .await;

        let suisse = results.iter().find(|r| r.repo_name == "AM-Suisse").unwrap();
        assert!(!suisse.is_valid);
        assert_eq!(suisse.errors.len(), 2);
        assert!(suisse.errors[0].contains("WEBHOOK_SECRET_AM_SUISSE"));
        assert!(suisse.errors[1].contains("connection reset"));

        let site = results.iter().find(|r| r.repo_name == "site").unwrap();
        assert!(site.is_valid);
    }

    #[tokio::test]
    async fn test_unrecognized_url() {
        let mut local = repo("api", Some("s"));
        local.url = "/srv/git/api.git".to_string();
        let remote = Arc::new(FakeRemote::default());
        let results = validator(healthy_system(), remote.clone(), vec![local])
            .validate_all()
            .await;

        assert!(!results[0].is_valid);
        assert!(results[0].errors[0].contains("/srv/git/api.git"));
        assert!(remote.calls().is_empty());
    }
}
