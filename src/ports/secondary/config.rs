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

use crate::domain::{DomainError, ReportConfig};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Secondary port - Configuration provider abstraction
///
/// This interface abstracts how configuration is loaded and managed,
/// allowing for different sources (CLI args, TOML files, defaults)
#[async_trait]
pub trait ConfigurationProvider: Send + Sync {
    /// Get report generation configuration
    ///
    /// # Returns
    /// * `Ok(ReportConfig)` - Report configuration
    /// * `Err(DomainError)` - Error loading configuration
    async fn get_report_config(&self) -> Result<ReportConfig, DomainError>;

    /// Get output format preference
    async fn get_output_format(&self) -> Result<OutputFormat, DomainError>;

    /// Get command timeout in seconds
    async fn get_command_timeout(&self) -> Result<u64, DomainError>;

    /// Check if verbose logging is enabled
    async fn is_verbose_enabled(&self) -> Result<bool, DomainError>;
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Padded text tables
    #[default]
    Table,
    /// Gauge metrics in exposition text format
    Metrics,
    /// JSON format
    Json,
    /// TOML format
    Toml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "metrics" | "prometheus" => Ok(OutputFormat::Metrics),
            "json" => Ok(OutputFormat::Json),
            "toml" => Ok(OutputFormat::Toml),
            _ => Err("Output format must be one of 'table', 'metrics', 'json' or 'toml'".to_string()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Table => "table",
            OutputFormat::Metrics => "metrics",
            OutputFormat::Json => "json",
            OutputFormat::Toml => "toml",
        };
        f.write_str(name)
    }
}
