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

//! RAID Report Library
//!
//! This library inventories MegaRAID controllers and SMART disk health by
//! running `MegaCli64` and `smartctl` and parsing their text output. It uses
//! a Ports and Adapters (Hexagonal) architecture so the parsers and collection
//! logic can be exercised against captured tool output.
//!
//! # Architecture
//!
//! - **Domain**: Entities, pure parsers, collection services and rendering
//! - **Ports**: Interfaces for running commands, resolving device paths and publishing
//! - **Adapters**: Process execution, capture replay, TOML config, stdout and textfile output
//!
//! # Usage
//!
//! ```rust,no_run
//! use raid_report::{render, OutputFormat, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = raid_report::create_service(None).await?;
//!
//!     let report = service.generate_report(ReportConfig::default()).await?;
//!     println!("{}", render(&report, OutputFormat::Table)?);
//!     println!("{} bad disk(s)", report.inventory.tallies.bad);
//!     Ok(())
//! }
//! ```
//!
//! The parsers can be used on their own:
//!
//! ```rust
//! use raid_report::domain::parsers::{normalize_size, parse_controller_count, output_lines};
//!
//! assert_eq!(parse_controller_count(&output_lines("Controller Count: 2.")), 2);
//! assert_eq!(normalize_size("557.750 GB").unwrap(), "558G");
//! ```

pub mod adapters;
pub mod container;
pub mod domain;
pub mod ports;

pub use adapters::{
    ByPathProbe, ReplayCommandExecutor, StdoutPublisher, TextfilePublisher,
    TomlConfigurationProvider, UnixCommandExecutor,
};
pub use container::{ContainerConfig, ContainerConfigBuilder, ServiceContainer};
pub use domain::{
    render, CollectionError, Inventory, PublishError, ReportConfig, ReportError, SmartReport,
    StorageReport,
};
pub use ports::{
    CommandExecutor, ConfigurationProvider, DevicePathProbe, InventoryReportingService,
    OutputFormat, ReportPublisher,
};

use std::error::Error;
use std::sync::Arc;

/// Create a storage reporting service with default adapters
///
/// # Arguments
/// * `output` - Textfile to publish reports to; stdout when `None`
///
/// # Returns
/// * `Ok(Arc<dyn InventoryReportingService>)` - Configured service ready to use
/// * `Err(Box<dyn Error>)` - Error occurred during service creation
pub async fn create_service(
    output: Option<std::path::PathBuf>,
) -> Result<Arc<dyn InventoryReportingService>, Box<dyn Error>> {
    let container = ServiceContainer::new(ContainerConfigBuilder::new().output(output).build());
    container.create_reporting_service().await
}

/// Create a storage reporting service with custom container configuration
pub async fn create_service_with_config(
    container_config: ContainerConfig,
) -> Result<Arc<dyn InventoryReportingService>, Box<dyn Error>> {
    ServiceContainer::new(container_config)
        .create_reporting_service()
        .await
}

/// Validate tool availability and privileges for a configuration
///
/// # Returns
/// * `Ok((missing_tools, has_privileges))`
///
/// # Example
///
/// ```rust,no_run
/// use raid_report::{validate_system, ReportConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (missing, has_privs) = validate_system(&ReportConfig::default()).await?;
///     if !missing.is_empty() {
///         println!("Missing tools: {:?}", missing);
///     }
///     if !has_privs {
///         println!("Warning: MegaCLI usually needs root");
///     }
///     Ok(())
/// }
/// ```
pub async fn validate_system(config: &ReportConfig) -> Result<(Vec<String>, bool), Box<dyn Error>> {
    let container = ServiceContainer::with_defaults();
    let missing_tools = container.validate_dependencies(config).await?;
    let has_privileges = container.check_privileges().await?;
    Ok((missing_tools, has_privileges))
}
