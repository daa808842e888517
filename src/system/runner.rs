// file: src/system/runner.rs
// version: 1.0.0
// guid: 5d8e3b90-1f72-4c46-ae15-92b0c4d7e681

//! Command execution trait and host implementation
//!
//! All system mutation goes through [`CommandRunner`] so steps can be
//! exercised against scripted runners in tests.

use std::process::Stdio;
use tokio::process::Command;

use crate::{ProvisionError, Result};

/// Captured result of an executed command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful empty output
    pub fn ok() -> Self {
        Self::with_stdout("")
    }

    /// Successful output with the given stdout
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Trait for executing host commands
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute a command, capturing output regardless of exit status
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Execute a command, turning a non-zero exit into an error that
    /// carries the command's own exit status
    async fn run_checked(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(program, args).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(ProvisionError::Command {
                command: format_command(program, args),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    /// Execute a command intended as a boolean check
    async fn check_silent(&self, program: &str, args: &[&str]) -> Result<bool> {
        Ok(self.run(program, args).await?.success())
    }
}

/// Render a command line for diagnostics
pub fn format_command(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Runner executing commands on the local host
pub struct HostRunner;

#[async_trait::async_trait]
impl CommandRunner for HostRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                ProvisionError::system(format!(
                    "Failed to spawn {}: {}",
                    format_command(program, args),
                    e
                ))
            })?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted runner for step and service tests

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Runner returning canned outputs keyed by the full command line.
    ///
    /// Responses for a command line are consumed in order; the last one
    /// repeats. Unscripted commands succeed with empty output. Every call
    /// is recorded for assertions.
    #[derive(Default)]
    pub(crate) struct ScriptedRunner {
        responses: Mutex<HashMap<String, Vec<CommandOutput>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, command_line: &str, output: CommandOutput) {
            self.responses
                .lock()
                .unwrap()
                .entry(command_line.to_string())
                .or_default()
                .push(output);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self, command_line: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.as_str() == command_line)
                .count()
        }
    }

    #[async_trait::async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
            let line = format_command(program, args);
            self.calls.lock().unwrap().push(line.clone());

            let mut responses = self.responses.lock().unwrap();
            match responses.get_mut(&line) {
                Some(queue) if queue.len() > 1 => Ok(queue.remove(0)),
                Some(queue) => Ok(queue[0].clone()),
                None => Ok(CommandOutput::ok()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedRunner;
    use super::*;

    #[test]
    fn test_format_command() {
        assert_eq!(format_command("ufw", &["allow", "22/tcp"]), "ufw allow 22/tcp");
        assert_eq!(format_command("true", &[]), "true");
    }

    #[tokio::test]
    async fn test_run_checked_carries_exit_status() {
        let runner = ScriptedRunner::new();
        runner.respond("apt-get install -y ufw", CommandOutput::failed(100, "broken"));

        let err = runner
            .run_checked("apt-get", &["install", "-y", "ufw"])
            .await
            .unwrap_err();
        match err {
            ProvisionError::Command { code, stderr, .. } => {
                assert_eq!(code, 100);
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scripted_responses_consume_in_order() {
        let runner = ScriptedRunner::new();
        runner.respond("systemctl is-active docker", CommandOutput::failed(3, ""));
        runner.respond("systemctl is-active docker", CommandOutput::ok());

        assert!(!runner.check_silent("systemctl", &["is-active", "docker"]).await.unwrap());
        assert!(runner.check_silent("systemctl", &["is-active", "docker"]).await.unwrap());
        // last response repeats
        assert!(runner.check_silent("systemctl", &["is-active", "docker"]).await.unwrap());
        assert_eq!(runner.call_count("systemctl is-active docker"), 3);
    }

    #[tokio::test]
    async fn test_host_runner_captures_output() {
        let runner = HostRunner;
        let output = runner.run("echo", &["hello"]).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout_trimmed(), "hello");
    }

    #[tokio::test]
    async fn test_host_runner_spawn_failure() {
        let runner = HostRunner;
        let err = runner.run("nonexistent-command-12345", &[]).await.unwrap_err();
        assert!(matches!(err, ProvisionError::System(_)));
    }
}
