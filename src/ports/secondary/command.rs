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

use crate::domain::CommandError;
use async_trait::async_trait;
use std::time::Duration;

/// An invocation of an external diagnostic tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemCommand {
    /// Tool binary name or path
    pub program: String,
    /// Command arguments
    pub args: Vec<String>,
    /// Execution timeout
    pub timeout: Option<Duration>,
}

impl SystemCommand {
    /// Create a new system command
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Replace the command arguments
    pub fn args<S: AsRef<str>>(mut self, args: &[S]) -> Self {
        self.args = args.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Set execution timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The arguments joined by single spaces, as replay scripts key them
    pub fn args_line(&self) -> String {
        self.args.join(" ")
    }

    /// Program and arguments, for logs and error records
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args_line())
        }
    }
}

/// Command execution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Exit status code
    pub exit_code: Option<i32>,
    /// Whether command was successful
    pub success: bool,
}

impl CommandOutput {
    /// Output of a command that exited with status 0
    pub fn ok(stdout: &str) -> Self {
        Self::with_exit_code(stdout, 0)
    }

    /// Output of a command that exited with the given status
    pub fn with_exit_code(stdout: &str, exit_code: i32) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(exit_code),
            success: exit_code == 0,
        }
    }
}

/// Secondary port - Command execution abstraction
///
/// This interface abstracts running MegaCLI and smartctl, allowing for
/// different implementations (direct execution, replayed captures, mocks).
/// A command that ran and exited non-zero is still `Ok`; `Err` means the
/// command could not be run or did not finish in time.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute a system command
    ///
    /// # Arguments
    /// * `command` - The command to execute
    ///
    /// # Returns
    /// * `Ok(CommandOutput)` - Command output and status
    /// * `Err(CommandError)` - Error executing command
    async fn execute(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError>;

    /// Execute a command with privilege escalation (sudo)
    async fn execute_with_privileges(
        &self,
        command: &SystemCommand,
    ) -> Result<CommandOutput, CommandError>;

    /// Check if a command is available on the system
    ///
    /// # Arguments
    /// * `command_name` - Name or path of the command to check
    async fn is_command_available(&self, command_name: &str) -> Result<bool, CommandError>;

    /// Check if running with elevated privileges
    ///
    /// # Returns
    /// * `Ok(bool)` - true if running as root
    /// * `Err(CommandError)` - Error checking privileges
    async fn has_elevated_privileges(&self) -> Result<bool, CommandError>;
}
