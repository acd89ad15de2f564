//! Command runner trait and output types.
//!
//! Every external tool dockhook touches (git, docker, ssh) is invoked through
//! a [`CommandRunner`], so pipelines and probes can be exercised against a
//! scripted fake.

use async_trait::async_trait;
use std::path::Path;

use crate::{CommandError, CommandResult};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Capability to run an external program to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv` inside `cwd` and capture its output.
    ///
    /// Only a failure to start the process is an error; a non-zero exit is
    /// reported through [`CommandOutput::code`].
    async fn output(&self, cwd: &Path, argv: &[String]) -> CommandResult<CommandOutput>;

    /// Run `argv` inside `cwd`, treating a non-zero exit as
    /// [`CommandError::Failed`] carrying the process's stderr.
    async fn run(&self, cwd: &Path, argv: &[String]) -> CommandResult<String> {
        let output = self.output(cwd, argv).await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(CommandError::Failed {
                command: argv.join(" "),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}

/// Build an owned argument vector from string slices.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
