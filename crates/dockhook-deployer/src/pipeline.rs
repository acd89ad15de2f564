//! Compose deployment pipeline.

use dockhook_config::{Repositories, RepositoryConfig};
use dockhook_core::command::argv;
use dockhook_core::{CommandError, CommandRunner};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::{DeployError, DeploymentGuard, DeploymentState};

/// One ordered step of a deployment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Clone, or pull if the working tree already exists.
    Fetch,
    /// `docker compose build`
    Build,
    /// `docker compose down`
    Stop,
    /// `docker compose up -d`
    Start,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Build => write!(f, "build"),
            Stage::Stop => write!(f, "stop"),
            Stage::Start => write!(f, "start"),
        }
    }
}

/// How a call to [`Deployer::deploy`] concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    /// All four stages succeeded.
    Deployed,
    /// Another run for the same repository was already in flight.
    Skipped,
}

/// Runs deployments for the configured repositories.
///
/// Each repository has a working tree at `<work_root>/<name>`, cloned on the
/// first run and pulled on later runs. No two runs for the same repository
/// overlap; runs for different repositories are independent.
pub struct Deployer {
    runner: Arc<dyn CommandRunner>,
    repositories: Arc<Repositories>,
    state: DeploymentState,
    work_root: PathBuf,
    stage_timeout: Option<Duration>,
}

impl Deployer {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        repositories: Arc<Repositories>,
        work_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            repositories,
            state: DeploymentState::new(),
            work_root: work_root.into(),
            stage_timeout: None,
        }
    }

    /// Bound every stage by `timeout`. Without one, a hung command holds the
    /// repository's in-progress mark until it exits.
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn state(&self) -> &DeploymentState {
        &self.state
    }

    pub fn repositories(&self) -> &Arc<Repositories> {
        &self.repositories
    }

    /// Local working tree of repository `name`.
    pub fn repo_dir(&self, name: &str) -> PathBuf {
        self.work_root.join(name)
    }

    pub fn is_deploying(&self, name: &str) -> bool {
        self.state.is_deploying(name)
    }

    /// Deploy `name` and wait for the run to finish.
    ///
    /// A call made while another run for `name` is in flight is dropped and
    /// reports [`DeployOutcome::Skipped`]; nothing is queued.
    pub async fn deploy(&self, name: &str) -> Result<DeployOutcome, DeployError> {
        let repo = self.lookup(name)?;
        let Some(guard) = self.state.claim(name) else {
            info!(repo = %name, "Deployment already in progress, skipping");
            return Ok(DeployOutcome::Skipped);
        };

        self.run(repo, guard).await?;
        Ok(DeployOutcome::Deployed)
    }

    /// Claim `name` now and run its deployment on a background task.
    ///
    /// The claim happens before this returns, so of several concurrent
    /// callers exactly one gets a handle and the rest get
    /// [`DeployError::AlreadyDeploying`]. The task logs its own result.
    pub fn try_spawn(
        self: &Arc<Self>,
        name: &str,
    ) -> Result<JoinHandle<Result<(), DeployError>>, DeployError> {
        let repo = self.lookup(name)?.clone();
        let guard = self
            .state
            .claim(name)
            .ok_or_else(|| DeployError::AlreadyDeploying(name.to_string()))?;

        let deployer = Arc::clone(self);
        Ok(tokio::spawn(async move { deployer.run(&repo, guard).await }))
    }

    fn lookup(&self, name: &str) -> Result<&RepositoryConfig, DeployError> {
        self.repositories.get(name).ok_or_else(|| {
            error!(repo = %name, "Repository not found");
            DeployError::UnknownRepository(name.to_string())
        })
    }

    async fn run(
        &self,
        repo: &RepositoryConfig,
        guard: DeploymentGuard,
    ) -> Result<(), DeployError> {
        let span = info_span!("deployment", repo = %repo.name, run_id = %Uuid::now_v7());

        let result = async {
            info!("Starting deployment");
            let result = self.run_stages(repo).await;
            match &result {
                Ok(()) => info!("Deployment completed successfully"),
                Err(e) => error!(error = %e, "Deployment failed"),
            }
            result
        }
        .instrument(span)
        .await;

        // Released last, whether the run succeeded or not.
        drop(guard);
        result
    }

    async fn run_stages(&self, repo: &RepositoryConfig) -> Result<(), DeployError> {
        let dir = self.repo_dir(&repo.name);

        info!(stage = %Stage::Fetch, "Pulling latest code");
        self.fetch(repo, &dir).await?;

        info!(stage = %Stage::Build, "Building new images");
        self.exec(Stage::Build, &dir, compose(repo, ["build"]))
            .await?;

        info!(stage = %Stage::Stop, "Stopping existing services");
        self.exec(Stage::Stop, &dir, compose(repo, ["down"])).await?;

        info!(stage = %Stage::Start, "Starting new services");
        self.exec(Stage::Start, &dir, compose(repo, ["up", "-d"]))
            .await?;

        Ok(())
    }

    /// Clone into the working root; if that fails (usually because the tree
    /// already exists), pull instead. Only a failed pull is fatal.
    async fn fetch(&self, repo: &RepositoryConfig, dir: &Path) -> Result<(), DeployError> {
        tokio::fs::create_dir_all(&self.work_root).await?;

        let clone = argv([
            "git",
            "clone",
            "-b",
            repo.branch.as_str(),
            repo.url.as_str(),
            repo.name.as_str(),
        ]);
        if let Err(e) = self.exec(Stage::Fetch, &self.work_root, clone).await {
            warn!(error = %e, "Clone failed, pulling instead");
            let pull = argv(["git", "pull", "origin", repo.branch.as_str()]);
            self.exec(Stage::Fetch, dir, pull).await?;
        }
        Ok(())
    }

    async fn exec(&self, stage: Stage, cwd: &Path, cmd: Vec<String>) -> Result<(), DeployError> {
        let run = self.runner.run(cwd, &cmd);
        let result = match self.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .unwrap_or_else(|_| {
                    Err(CommandError::TimedOut {
                        command: cmd.join(" "),
                        after: limit,
                    })
                }),
            None => run.await,
        };

        result
            .map(|_| ())
            .map_err(|source| DeployError::Stage { stage, source })
    }
}

fn compose<const N: usize>(repo: &RepositoryConfig, action: [&str; N]) -> Vec<String> {
    let mut cmd = argv(["docker", "compose", "-f", repo.compose_path.as_str()]);
    cmd.extend(action.iter().map(|s| s.to_string()));
    cmd
}
