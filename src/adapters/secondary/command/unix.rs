/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Unix command execution adapter

use crate::domain::{CommandError, SystemError};
use crate::ports::{CommandExecutor, CommandOutput, SystemCommand};
use async_trait::async_trait;
use log::{debug, warn};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Runs MegaCLI and smartctl as child processes with timeouts and retries
pub struct UnixCommandExecutor {
    /// Timeout for commands that don't set their own
    default_timeout: Duration,
    /// Extra attempts for commands that could not be run
    retry_count: u32,
}

impl UnixCommandExecutor {
    /// Create a new Unix command executor
    ///
    /// # Arguments
    /// * `default_timeout` - Timeout for commands without their own
    /// * `retry_count` - Number of retry attempts
    pub fn new(default_timeout: Duration, retry_count: u32) -> Self {
        Self {
            default_timeout,
            retry_count,
        }
    }

    /// Create a Unix command executor with default settings
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_secs(30), 0)
    }

    async fn execute_with_retry(
        &self,
        command: &SystemCommand,
        use_sudo: bool,
    ) -> Result<CommandOutput, CommandError> {
        let mut attempt = 0;
        loop {
            match self.execute_once(command, use_sudo).await {
                Ok(output) => return Ok(output),
                Err(e) if attempt < self.retry_count => {
                    attempt += 1;
                    warn!(
                        "'{}' failed on attempt {}: {}, retrying",
                        command.command_line(),
                        attempt,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn execute_once(
        &self,
        command: &SystemCommand,
        use_sudo: bool,
    ) -> Result<CommandOutput, CommandError> {
        let command_timeout = command.timeout.unwrap_or(self.default_timeout);

        let mut cmd = if use_sudo {
            let mut sudo_cmd = Command::new("sudo");
            sudo_cmd.arg("-n").arg(&command.program);
            sudo_cmd
        } else {
            Command::new(&command.program)
        };
        cmd.args(&command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("Executing: {}", command.command_line());

        match timeout(command_timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let exit_code = output.status.code();

                if !output.status.success() {
                    debug!(
                        "'{}' exited with {:?}: {}",
                        command.command_line(),
                        exit_code,
                        stderr.trim()
                    );
                }

                Ok(CommandOutput {
                    stdout,
                    stderr,
                    exit_code,
                    success: output.status.success(),
                })
            }
            Ok(Err(e)) => Err(match e.kind() {
                ErrorKind::NotFound => SystemError::CommandNotFound(command.program.clone()).into(),
                ErrorKind::PermissionDenied => {
                    SystemError::PermissionDenied(command.program.clone()).into()
                }
                _ => CommandError::ExecutionFailed(format!(
                    "Failed to execute command '{}': {}",
                    command.program, e
                )),
            }),
            Err(_) => Err(CommandError::TimedOut(format!(
                "'{}' after {:?}",
                command.command_line(),
                command_timeout
            ))),
        }
    }
}

#[async_trait]
impl CommandExecutor for UnixCommandExecutor {
    async fn execute(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
        self.execute_with_retry(command, false).await
    }

    async fn execute_with_privileges(
        &self,
        command: &SystemCommand,
    ) -> Result<CommandOutput, CommandError> {
        self.execute_with_retry(command, true).await
    }

    async fn is_command_available(&self, command_name: &str) -> Result<bool, CommandError> {
        if command_name.contains('/') {
            return Ok(Path::new(command_name).is_file());
        }

        let which_cmd = SystemCommand::new("which")
            .args(&[command_name])
            .timeout(Duration::from_secs(5));

        match self.execute_once(&which_cmd, false).await {
            Ok(output) => Ok(output.success && !output.stdout.trim().is_empty()),
            Err(_) => Ok(false),
        }
    }

    async fn has_elevated_privileges(&self) -> Result<bool, CommandError> {
        // SAFETY: geteuid has no preconditions and cannot fail
        Ok(unsafe { libc::geteuid() } == 0)
    }
}
