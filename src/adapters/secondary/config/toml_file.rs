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

//! TOML file configuration adapter

use crate::domain::{DomainError, ReportConfig};
use crate::ports::{ConfigurationProvider, OutputFormat};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

/// On-disk layout: every `ReportConfig` field at top level plus `format`
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    format: Option<String>,
    #[serde(flatten)]
    report: ReportConfig,
}

/// Configuration provider backed by an optional TOML file
///
/// Missing keys fall back to `ReportConfig::default()`.
#[derive(Debug, Clone, Default)]
pub struct TomlConfigurationProvider {
    config: ReportConfig,
    format: OutputFormat,
}

impl TomlConfigurationProvider {
    /// Provider that answers with the built-in defaults
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Provider for an already assembled configuration
    pub fn new(config: ReportConfig, format: OutputFormat) -> Self {
        Self { config, format }
    }

    /// Parse TOML configuration text
    pub fn from_toml_str(content: &str) -> Result<Self, DomainError> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| DomainError::InvalidConfiguration(e.to_string()))?;

        let format = match file.format {
            Some(name) => name
                .parse::<OutputFormat>()
                .map_err(DomainError::InvalidConfiguration)?,
            None => OutputFormat::default(),
        };

        let provider = Self {
            config: file.report,
            format,
        };
        provider.validate()?;
        Ok(provider)
    }

    /// Load configuration from a TOML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::InvalidConfiguration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.config.command_timeout == 0 {
            return Err(DomainError::InvalidConfiguration(
                "command_timeout must be at least 1 second".to_string(),
            ));
        }
        if self.config.megacli_path.trim().is_empty() || self.config.smartctl_path.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "tool paths must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigurationProvider for TomlConfigurationProvider {
    async fn get_report_config(&self) -> Result<ReportConfig, DomainError> {
        Ok(self.config.clone())
    }

    async fn get_output_format(&self) -> Result<OutputFormat, DomainError> {
        Ok(self.format)
    }

    async fn get_command_timeout(&self) -> Result<u64, DomainError> {
        Ok(self.config.command_timeout)
    }

    async fn is_verbose_enabled(&self) -> Result<bool, DomainError> {
        Ok(self.config.verbose)
    }
}
