use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Everything the command wrote to stdout.
    Output(String),
    /// The command exited with a non-zero status or was killed by a signal.
    Failed(String),
    /// The command was killed by the same ^C that is about to stop us.
    Interrupted,
}

#[cfg(unix)]
fn killed_by_interrupt(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;

    const SIGINT: i32 = 2;
    status.signal() == Some(SIGINT)
}

#[cfg(not(unix))]
fn killed_by_interrupt(_status: &ExitStatus) -> bool {
    false
}

/// Runs the watched command. Only one command is ever running at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send {
    async fn run(&mut self, command: &str) -> Result<CommandOutcome>;
}

/// Runs commands through `sh -c`, so pipes and globs in the command work as they would in a
/// terminal. Stderr of the command goes straight to ours.
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    #[instrument(skip(self))]
    async fn run(&mut self, command: &str) -> Result<CommandOutcome> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            // Dropping the future on interrupt shouldn't leave the command behind.
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to start sh for {command}"))?;

        debug!("Command finished with {}", output.status);
        if output.status.success() {
            Ok(CommandOutcome::Output(
                String::from_utf8_lossy(&output.stdout).into_owned(),
            ))
        } else if killed_by_interrupt(&output.status) {
            Ok(CommandOutcome::Interrupted)
        } else {
            Ok(CommandOutcome::Failed(output.status.to_string()))
        }
    }
}

#[cfg(test)]
mod command_tests {
    use anyhow::Result;

    use super::{killed_by_interrupt, CommandOutcome, CommandRunner, ShellRunner};

    #[tokio::test]
    async fn captures_stdout() -> Result<()> {
        let outcome = ShellRunner.run("echo 'Total: 100'; echo 40").await?;
        assert_eq!(outcome, CommandOutcome::Output("Total: 100\n40\n".into()));
        Ok(())
    }

    #[tokio::test]
    async fn reports_failure() -> Result<()> {
        let outcome = ShellRunner.run("echo partial; exit 3").await?;
        assert!(matches!(outcome, CommandOutcome::Failed(status) if status.contains('3')));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn interrupt_is_told_apart_from_failure() {
        use std::{os::unix::process::ExitStatusExt, process::ExitStatus};

        // Raw wait statuses: low bits carry the signal, the next byte the exit code.
        assert!(killed_by_interrupt(&ExitStatus::from_raw(2)));
        assert!(!killed_by_interrupt(&ExitStatus::from_raw(15)));
        assert!(!killed_by_interrupt(&ExitStatus::from_raw(3 << 8)));
        assert!(!killed_by_interrupt(&ExitStatus::from_raw(0)));
    }
}
