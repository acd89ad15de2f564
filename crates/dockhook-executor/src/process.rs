//! Local process runner.

use async_trait::async_trait;
use dockhook_core::{CommandError, CommandOutput, CommandResult, CommandRunner};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs commands as child processes of the daemon.
///
/// Children are killed when their future is dropped, so a caller-side
/// timeout does not leave orphaned builds behind.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn output(&self, cwd: &Path, argv: &[String]) -> CommandResult<CommandOutput> {
        let (program, args) = argv.split_first().ok_or(CommandError::Empty)?;

        debug!(cwd = %cwd.display(), command = %argv.join(" "), "Running command");

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                program: program.clone(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use dockhook_core::command::argv;

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let out = ProcessRunner::new()
            .output(dir.path(), &argv(["sh", "-c", "echo hello; echo oops >&2; exit 3"]))
            .await
            .unwrap();

        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "x").unwrap();

        let out = ProcessRunner::new()
            .run(dir.path(), &argv(["ls"]))
            .await
            .unwrap();
        assert!(out.contains("marker"));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProcessRunner::new()
            .output(dir.path(), &argv(["dockhook-definitely-not-installed"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_empty_argv_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProcessRunner::new().output(dir.path(), &[]).await.unwrap_err();
        assert!(matches!(err, CommandError::Empty));
    }
}
