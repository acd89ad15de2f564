//! Remote repository probes against the GitHub REST API.

use async_trait::async_trait;
use dockhook_config::RemoteRef;
use reqwest::StatusCode;
use std::time::Duration;

const GITHUB_HOST: &str = "github.com";
const GITHUB_API: &str = "https://api.github.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that prevent a remote probe from reaching a verdict.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected response status {0}")]
    Status(u16),

    #[error("unsupported host {0}")]
    UnsupportedHost(String),
}

/// Existence checks for remote repositories and branches.
#[async_trait]
pub trait RemoteProbe: Send + Sync {
    async fn repository_exists(&self, remote: &RemoteRef) -> Result<bool, ProbeError>;

    async fn branch_exists(&self, remote: &RemoteRef, branch: &str) -> Result<bool, ProbeError>;
}

/// GitHub API client for existence probes.
pub struct GitHubApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubApi {
    pub fn new(token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: GITHUB_API.to_string(),
            token,
        }
    }

    /// Point the client at another API root, e.g. a GitHub Enterprise server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// `<api>/repos/OWNER/REPO`
    pub fn repo_url(&self, remote: &RemoteRef) -> String {
        format!("{}/repos/{}/{}", self.base_url, remote.owner, remote.repo)
    }

    async fn exists(&self, remote: &RemoteRef, url: &str) -> Result<bool, ProbeError> {
        if remote.host != GITHUB_HOST {
            return Err(ProbeError::UnsupportedHost(remote.host.clone()));
        }

        let mut request = self
            .client
            .get(url)
            .header("User-Agent", "dockhook")
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(ProbeError::Status(s.as_u16())),
        }
    }
}

#[async_trait]
impl RemoteProbe for GitHubApi {
    async fn repository_exists(&self, remote: &RemoteRef) -> Result<bool, ProbeError> {
        self.exists(remote, &self.repo_url(remote)).await
    }

    async fn branch_exists(&self, remote: &RemoteRef, branch: &str) -> Result<bool, ProbeError> {
        // Branch names may hold `/`, `#` or `?`; keep them in one path segment.
        let url = format!(
            "{}/branches/{}",
            self.repo_url(remote),
            urlencoding::encode(branch)
        );
        self.exists(remote, &url).await
    }
}
