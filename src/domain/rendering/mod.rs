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

//! Rendering of a storage report into the supported output formats

pub mod metrics;
pub mod table;

pub use metrics::{inventory_metrics, render_metrics, smart_metrics};
pub use table::{render_inventory_table, TextTable};

use crate::domain::{ReportError, StorageReport};
use crate::ports::OutputFormat;

/// Render a report in the requested format
pub fn render(report: &StorageReport, format: OutputFormat) -> Result<String, ReportError> {
    match format {
        OutputFormat::Table => Ok(render_inventory_table(report)),
        OutputFormat::Metrics => Ok(render_metrics(report)),
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| ReportError::RenderFailed(format!("JSON: {}", e))),
        OutputFormat::Toml => toml::to_string_pretty(report)
            .map_err(|e| ReportError::RenderFailed(format!("TOML: {}", e))),
    }
}
