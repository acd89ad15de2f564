//! Scripted [`CommandRunner`] for tests.
//!
//! Commands are matched by prefix against the space-joined argument vector;
//! the first matching rule wins and unmatched commands succeed with empty
//! output.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;

use crate::{CommandError, CommandOutput, CommandResult, CommandRunner};

/// One recorded call to the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub cwd: PathBuf,
    pub argv: Vec<String>,
}

impl Invocation {
    pub fn command(&self) -> String {
        self.argv.join(" ")
    }
}

#[derive(Debug, Clone)]
enum Behavior {
    Stdout(String),
    Fail(String),
    ExitCode(i32),
    Missing,
}

#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, Behavior)>,
    holds: Vec<(String, Arc<Semaphore>)>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with the given stdout.
    pub fn stdout(mut self, prefix: &str, stdout: &str) -> Self {
        self.rules
            .push((prefix.to_string(), Behavior::Stdout(stdout.to_string())));
        self
    }

    /// Exit with code 1 and the given stderr.
    pub fn fail(mut self, prefix: &str, stderr: &str) -> Self {
        self.rules
            .push((prefix.to_string(), Behavior::Fail(stderr.to_string())));
        self
    }

    /// Exit with an arbitrary code and no output.
    pub fn exit_code(mut self, prefix: &str, code: i32) -> Self {
        self.rules.push((prefix.to_string(), Behavior::ExitCode(code)));
        self
    }

    /// Fail to spawn, as if the program were not installed.
    pub fn missing(mut self, prefix: &str) -> Self {
        self.rules.push((prefix.to_string(), Behavior::Missing));
        self
    }

    /// Block matching commands until a permit is added to `gate`.
    pub fn hold(mut self, prefix: &str, gate: Arc<Semaphore>) -> Self {
        self.holds.push((prefix.to_string(), gate));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Space-joined command lines in call order.
    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(Invocation::command).collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn output(&self, cwd: &Path, argv: &[String]) -> CommandResult<CommandOutput> {
        let command = argv.join(" ");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Invocation {
                cwd: cwd.to_path_buf(),
                argv: argv.to_vec(),
            });

        if let Some((_, gate)) = self.holds.iter().find(|(p, _)| command.starts_with(p)) {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let behavior = self
            .rules
            .iter()
            .find(|(p, _)| command.starts_with(p))
            .map(|(_, b)| b.clone());

        match behavior {
            None => Ok(CommandOutput {
                code: Some(0),
                ..Default::default()
            }),
            Some(Behavior::Stdout(stdout)) => Ok(CommandOutput {
                code: Some(0),
                stdout,
                stderr: String::new(),
            }),
            Some(Behavior::Fail(stderr)) => Ok(CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr,
            }),
            Some(Behavior::ExitCode(code)) => Ok(CommandOutput {
                code: Some(code),
                ..Default::default()
            }),
            Some(Behavior::Missing) => Err(CommandError::Spawn {
                program: argv.first().cloned().unwrap_or_default(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}
