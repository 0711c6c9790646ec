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

//! Dependency injection container for storage reporting services

use crate::adapters::{
    ByPathProbe, ReplayCommandExecutor, StdoutPublisher, TextfilePublisher,
    TomlConfigurationProvider, UnixCommandExecutor,
};
use crate::domain::{InventoryCollectionService, ReportConfig};
use crate::ports::{
    CommandExecutor, ConfigurationProvider, DevicePathProbe, InventoryReportingService,
    ReportPublisher,
};
use log::info;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the dependency injection container
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Command execution timeout
    pub command_timeout: Duration,
    /// Command retry count
    pub retry_count: u32,
    /// Write reports to this file instead of stdout
    pub output: Option<PathBuf>,
    /// Answer commands from a capture file instead of running them
    pub replay: Option<PathBuf>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
            retry_count: 0,
            output: None,
            replay: None,
        }
    }
}

/// Dependency injection container
pub struct ServiceContainer {
    config: ContainerConfig,
}

impl ServiceContainer {
    /// Create a new service container with configuration
    pub fn new(config: ContainerConfig) -> Self {
        Self { config }
    }

    /// Create a service container with default configuration
    pub fn with_defaults() -> Self {
        Self::new(ContainerConfig::default())
    }

    /// Create the command executor, replaying captures when configured
    pub async fn create_command_executor(&self) -> Result<Arc<dyn CommandExecutor>, Box<dyn Error>> {
        match &self.config.replay {
            Some(path) => {
                info!("Replaying captured tool output from {}", path.display());
                Ok(Arc::new(ReplayCommandExecutor::from_file(path).await?))
            }
            None => Ok(Arc::new(UnixCommandExecutor::new(
                self.config.command_timeout,
                self.config.retry_count,
            ))),
        }
    }

    /// Create the by-path symlink resolver
    pub fn create_path_probe(&self) -> Arc<dyn DevicePathProbe> {
        Arc::new(ByPathProbe::new())
    }

    /// Create the report publisher
    pub fn create_report_publisher(&self) -> Arc<dyn ReportPublisher> {
        match &self.config.output {
            Some(path) => Arc::new(TextfilePublisher::new(path)),
            None => Arc::new(StdoutPublisher::new()),
        }
    }

    /// Load configuration from a TOML file, or defaults without one
    pub async fn create_configuration_provider(
        &self,
        path: Option<&Path>,
    ) -> Result<Arc<dyn ConfigurationProvider>, Box<dyn Error>> {
        let provider = match path {
            Some(path) => TomlConfigurationProvider::from_file(path).await?,
            None => TomlConfigurationProvider::with_defaults(),
        };
        Ok(Arc::new(provider))
    }

    /// Create the complete storage reporting service
    pub async fn create_reporting_service(
        &self,
    ) -> Result<Arc<dyn InventoryReportingService>, Box<dyn Error>> {
        let executor = self.create_command_executor().await?;
        let service = InventoryCollectionService::new(
            executor,
            self.create_path_probe(),
            self.create_report_publisher(),
        );
        Ok(Arc::new(service))
    }

    /// Report the external tools the configuration needs but cannot find
    pub async fn validate_dependencies(
        &self,
        report_config: &ReportConfig,
    ) -> Result<Vec<String>, Box<dyn Error>> {
        let service = self.create_reporting_service().await?;
        let missing = service
            .validate_dependencies(report_config)
            .await
            .map_err(|e| format!("Failed to check dependencies: {}", e))?;
        Ok(missing)
    }

    /// Check if the process can run the tools without sudo
    pub async fn check_privileges(&self) -> Result<bool, Box<dyn Error>> {
        let service = self.create_reporting_service().await?;
        let has_privileges = service
            .check_privileges()
            .await
            .map_err(|e| format!("Failed to check privileges: {}", e))?;
        Ok(has_privileges)
    }
}

/// Builder pattern for container configuration
pub struct ContainerConfigBuilder {
    config: ContainerConfig,
}

impl ContainerConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
        }
    }

    /// Set command timeout
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Set retry count
    pub fn retry_count(mut self, count: u32) -> Self {
        self.config.retry_count = count;
        self
    }

    /// Write reports to a textfile
    pub fn output(mut self, path: Option<PathBuf>) -> Self {
        self.config.output = path;
        self
    }

    /// Replay a capture file instead of running the tools
    pub fn replay(mut self, path: Option<PathBuf>) -> Self {
        self.config.replay = path;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ContainerConfig {
        self.config
    }
}

impl Default for ContainerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
