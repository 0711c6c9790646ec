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

use crate::domain::{PublishError, ReportConfig, ReportError, StorageReport};
use async_trait::async_trait;

/// Primary port - Main interface offered by the storage inventory domain
///
/// This is what external systems (CLI, library consumers) use to interact
/// with the inventory and health collection.
#[async_trait]
pub trait InventoryReportingService: Send + Sync {
    /// Collect the MegaRAID inventory and SMART health of the current host
    ///
    /// Failures of individual controllers or devices are recorded in the
    /// report rather than returned as errors.
    ///
    /// # Arguments
    /// * `config` - Tool paths, timeouts and which collectors to run
    ///
    /// # Returns
    /// * `Ok(StorageReport)` - Inventory, SMART metrics and collection errors
    /// * `Err(ReportError)` - Configuration was unusable
    async fn generate_report(&self, config: ReportConfig) -> Result<StorageReport, ReportError>;

    /// Publish a rendered report through the configured publisher
    async fn publish_report(&self, rendered: &str) -> Result<(), PublishError>;

    /// Validate that the external tools are present
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Missing tools (empty if all present)
    /// * `Err(ReportError)` - Error occurred during validation
    async fn validate_dependencies(&self, config: &ReportConfig) -> Result<Vec<String>, ReportError>;

    /// Check if the current user may query the controllers directly
    async fn check_privileges(&self) -> Result<bool, ReportError>;
}
