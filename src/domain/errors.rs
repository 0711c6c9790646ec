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

use thiserror::Error;

/// Domain-level errors that don't expose infrastructure details
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Inventory collection failed
    #[error("Inventory collection failed: {0}")]
    CollectionFailed(String),
    /// Insufficient privileges to query the controller
    #[error("Insufficient privileges: {0}")]
    InsufficientPrivileges(String),
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Required external tools missing
    #[error("Missing required dependencies: {}", .0.join(", "))]
    MissingDependencies(Vec<String>),
    /// Data parsing failed
    #[error("Data parsing failed: {0}")]
    ParsingFailed(String),
    /// Operation timed out
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Errors raised by the pure text parsers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Size reported with a unit other than MB/GB/TB
    #[error("Unrecognized size unit in '{0}'")]
    UnrecognizedUnit(String),
    /// Numeric part of a value could not be read
    #[error("Invalid number in '{0}'")]
    InvalidNumber(String),
}

impl From<ParseError> for DomainError {
    fn from(err: ParseError) -> Self {
        DomainError::ParsingFailed(err.to_string())
    }
}

/// Errors specific to the inventory reporting service
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    /// Domain operation failed
    #[error("{0}")]
    Domain(#[from] DomainError),
    /// Report generation failed
    #[error("Report generation failed: {0}")]
    GenerationFailed(String),
    /// Rendering to the requested output format failed
    #[error("Report rendering failed: {0}")]
    RenderFailed(String),
}

/// Errors specific to publishing rendered reports
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// Domain operation failed
    #[error("{0}")]
    Domain(#[from] DomainError),
    /// Writing the output failed
    #[error("Write failed: {0}")]
    WriteFailed(String),
    /// Serialization failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}

/// System-level errors for adapters (not exposed to domain)
#[derive(Debug, Clone, Error)]
pub enum SystemError {
    /// Command execution failed
    #[error("{}", describe_command_failure(.command, .exit_code, .stderr))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    /// Command not found
    #[error("Command not found: {0}")]
    CommandNotFound(String),
    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// I/O operation failed
    #[error("I/O error: {0}")]
    IoError(String),
    /// Timeout
    #[error("Timeout: {0}")]
    Timeout(String),
}

fn describe_command_failure(command: &str, exit_code: &Option<i32>, stderr: &str) -> String {
    let mut message = format!("Command '{}' failed", command);
    if let Some(code) = exit_code {
        message.push_str(&format!(" with exit code {}", code));
    }
    if !stderr.is_empty() {
        message.push_str(&format!(": {}", stderr));
    }
    message
}

/// Convert system errors to domain errors (with context loss for abstraction)
impl From<SystemError> for DomainError {
    fn from(err: SystemError) -> Self {
        match err {
            SystemError::CommandFailed { command, .. } => {
                DomainError::CollectionFailed(format!("System command failed: {}", command))
            }
            SystemError::CommandNotFound(cmd) => DomainError::MissingDependencies(vec![cmd]),
            SystemError::PermissionDenied(_) => {
                DomainError::InsufficientPrivileges("System access denied".to_string())
            }
            SystemError::IoError(msg) => DomainError::CollectionFailed(format!("I/O error: {}", msg)),
            SystemError::Timeout(msg) => DomainError::Timeout(msg),
        }
    }
}

/// Command execution errors
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// System error occurred
    #[error("{0}")]
    System(#[from] SystemError),
    /// Command could not be spawned
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),
    /// Command did not finish in time
    #[error("Command timed out: {0}")]
    TimedOut(String),
    /// Invalid command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

impl From<CommandError> for DomainError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::System(sys_err) => sys_err.into(),
            CommandError::ExecutionFailed(msg) => {
                DomainError::CollectionFailed(format!("Command execution failed: {}", msg))
            }
            CommandError::TimedOut(msg) => DomainError::Timeout(msg),
            CommandError::InvalidArguments(msg) => {
                DomainError::InvalidConfiguration(format!("Invalid command arguments: {}", msg))
            }
        }
    }
}
