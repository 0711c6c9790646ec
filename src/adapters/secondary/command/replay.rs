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

//! Replay command execution adapter
//!
//! Answers commands from previously captured tool output instead of running
//! anything. Captures are keyed by the full command line, so the program
//! path in a capture must match the configured `megacli_path`/`smartctl_path`.
//!
//! Capture files are TOML:
//!
//! ```toml
//! [[command]]
//! line = "/opt/MegaRAID/MegaCli/MegaCli64 -adpCount -NoLog"
//! stdout = "Controller Count: 1."
//!
//! [[command]]
//! line = "smartctl --nocheck standby --device sat /dev/sda"
//! exit_code = 2
//! ```

use crate::domain::{CommandError, DomainError};
use crate::ports::{CommandExecutor, CommandOutput, SystemCommand};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CaptureFile {
    #[serde(default)]
    command: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    line: String,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    exit_code: i32,
    /// Replays as a command that could not be run
    #[serde(default)]
    error: Option<String>,
}

/// Command executor that replays canned output
#[derive(Debug, Clone)]
pub struct ReplayCommandExecutor {
    responses: HashMap<String, Result<CommandOutput, CommandError>>,
    elevated: bool,
}

impl ReplayCommandExecutor {
    /// Create an executor with no recorded commands
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            elevated: true,
        }
    }

    /// Record the output of `program` invoked with `args`
    pub fn with_output(mut self, program: &str, args: &str, output: CommandOutput) -> Self {
        self.responses
            .insert(Self::key(program, args), Ok(output));
        self
    }

    /// Record a successful run printing `stdout`
    pub fn with_stdout(self, program: &str, args: &str, stdout: &str) -> Self {
        self.with_output(program, args, CommandOutput::ok(stdout))
    }

    /// Record a command that could not be run
    pub fn with_failure(mut self, program: &str, args: &str, error: CommandError) -> Self {
        self.responses.insert(Self::key(program, args), Err(error));
        self
    }

    /// Set what `has_elevated_privileges` answers
    pub fn with_elevated_privileges(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    /// Parse a TOML capture file's contents
    pub fn from_toml_str(content: &str) -> Result<Self, DomainError> {
        let file: CaptureFile = toml::from_str(content).map_err(|e| {
            DomainError::InvalidConfiguration(format!("Invalid capture file: {}", e))
        })?;

        let mut executor = Self::new();
        for capture in file.command {
            let response = match capture.error {
                Some(message) => Err(CommandError::ExecutionFailed(message)),
                None => Ok(CommandOutput::with_exit_code(&capture.stdout, capture.exit_code)),
            };
            executor
                .responses
                .insert(capture.line.trim().to_string(), response);
        }
        Ok(executor)
    }

    /// Load a TOML capture file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::InvalidConfiguration(format!(
                "Cannot read capture file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    fn key(program: &str, args: &str) -> String {
        if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args)
        }
    }
}

impl Default for ReplayCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for ReplayCommandExecutor {
    async fn execute(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
        let line = command.command_line();
        debug!("Replaying: {}", line);
        match self.responses.get(&line) {
            Some(response) => response.clone(),
            None => Err(CommandError::ExecutionFailed(format!(
                "no captured output for '{}'",
                line
            ))),
        }
    }

    async fn execute_with_privileges(
        &self,
        command: &SystemCommand,
    ) -> Result<CommandOutput, CommandError> {
        self.execute(command).await
    }

    async fn is_command_available(&self, command_name: &str) -> Result<bool, CommandError> {
        Ok(self
            .responses
            .keys()
            .any(|line| line.split_whitespace().next() == Some(command_name)))
    }

    async fn has_elevated_privileges(&self) -> Result<bool, CommandError> {
        Ok(self.elevated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_responses() {
        let executor = ReplayCommandExecutor::new()
            .with_stdout("megacli", "-adpCount -NoLog", "Controller Count: 1.")
            .with_output("smartctl", "--nocheck standby --device sat /dev/sda", CommandOutput::with_exit_code("", 2))
            .with_failure("smartctl", "-V", CommandError::TimedOut("smartctl -V".into()));

        let output = executor
            .execute(&SystemCommand::new("megacli").args(&["-adpCount", "-NoLog"]))
            .await
            .unwrap();
        assert_eq!(output.stdout, "Controller Count: 1.");

        let standby = executor
            .execute(&SystemCommand::new("smartctl").args(&["--nocheck", "standby", "--device", "sat", "/dev/sda"]))
            .await
            .unwrap();
        assert_eq!(standby.exit_code, Some(2));

        assert!(matches!(
            executor.execute(&SystemCommand::new("smartctl").args(&["-V"])).await,
            Err(CommandError::TimedOut(_))
        ));
        assert!(executor
            .execute(&SystemCommand::new("megacli").args(&["-v"]))
            .await
            .is_err());

        assert!(executor.is_command_available("megacli").await.unwrap());
        assert!(!executor.is_command_available("storcli").await.unwrap());
    }

    #[tokio::test]
    async fn test_capture_file() {
        let content = r#"
[[command]]
line = "megacli -adpCount -NoLog"
stdout = """
Controller Count: 2.
"""

[[command]]
line = "smartctl --nocheck standby --device sat /dev/sdb"
exit_code = 2

[[command]]
line = "megacli -AdpAllInfo -a1 -NoLog"
error = "adapter hung"
"#;
        let executor = ReplayCommandExecutor::from_toml_str(content).unwrap();

        let count = executor
            .execute(&SystemCommand::new("megacli").args(&["-adpCount", "-NoLog"]))
            .await
            .unwrap();
        assert_eq!(count.stdout.trim(), "Controller Count: 2.");
        assert!(count.success);

        let standby = executor
            .execute(&SystemCommand::new("smartctl").args(&["--nocheck", "standby", "--device", "sat", "/dev/sdb"]))
            .await
            .unwrap();
        assert!(!standby.success);

        let err = executor
            .execute(&SystemCommand::new("megacli").args(&["-AdpAllInfo", "-a1", "-NoLog"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("adapter hung"));

        assert!(ReplayCommandExecutor::from_toml_str("command = 3").is_err());
    }
}
