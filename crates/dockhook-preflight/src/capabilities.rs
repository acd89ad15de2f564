//! System capability probe.

use dockhook_core::command::argv;
use dockhook_core::{CommandOutput, CommandResult, CommandRunner};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// `ssh -T git@github.com` exits with 1 once authenticated, since GitHub
/// grants no shell.
const SSH_AUTHENTICATED_EXIT_CODE: i32 = 1;

/// Outcome of probing the external tools deployments depend on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityReport {
    pub docker: bool,
    pub docker_compose: bool,
    pub ssh: bool,
    #[serde(skip)]
    pub errors: Vec<String>,
}

impl CapabilityReport {
    pub fn healthy(&self) -> bool {
        self.docker && self.docker_compose && self.ssh
    }
}

/// Probes Docker, the Compose plugin and SSH access to GitHub.
#[derive(Clone)]
pub struct SystemProbe {
    runner: Arc<dyn CommandRunner>,
}

impl SystemProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn check(&self) -> CapabilityReport {
        let cwd = Path::new(".");
        let docker_cmd = argv(["docker", "version"]);
        let compose_cmd = argv(["docker", "compose", "version"]);
        let ssh_cmd = argv(["ssh", "-T", "-o", "BatchMode=yes", "git@github.com"]);

        let (docker, compose, ssh) = tokio::join!(
            self.runner.output(cwd, &docker_cmd),
            self.runner.output(cwd, &compose_cmd),
            self.runner.output(cwd, &ssh_cmd),
        );

        let mut errors = Vec::new();
        let docker = probe(
            docker,
            |out| out.success(),
            "Docker is not accessible. Make sure Docker daemon is running.",
            "Docker is not installed or not in PATH",
            &mut errors,
        );
        let docker_compose = probe(
            compose,
            |out| out.success(),
            "Docker Compose plugin is not working correctly",
            "Docker Compose plugin is not installed",
            &mut errors,
        );
        let ssh = probe(
            ssh,
            |out| out.code == Some(SSH_AUTHENTICATED_EXIT_CODE),
            "SSH connection to GitHub failed. Check your SSH key configuration.",
            "SSH is not installed or not in PATH",
            &mut errors,
        );

        let report = CapabilityReport {
            docker,
            docker_compose,
            ssh,
            errors,
        };
        debug!(?report, "System capability probe finished");
        report
    }
}

fn probe(
    result: CommandResult<CommandOutput>,
    ok: impl Fn(&CommandOutput) -> bool,
    failed: &str,
    missing: &str,
    errors: &mut Vec<String>,
) -> bool {
    match result {
        Ok(out) if ok(&out) => true,
        Ok(_) => {
            errors.push(failed.to_string());
            false
        }
        Err(_) => {
            errors.push(missing.to_string());
            false
        }
    }
}
