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

use super::megaraid::MegaRaidCollector;
use super::smart::SmartHealthCollector;
use crate::domain::{
    DomainError, Inventory, PublishError, ReportConfig, ReportError, SmartReport, StorageReport,
};
use crate::ports::{CommandExecutor, DevicePathProbe, InventoryReportingService, ReportPublisher};
use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Domain service that implements storage inventory collection
///
/// This service runs the MegaRAID and SMART collectors and aggregates their
/// results into a single storage report.
pub struct InventoryCollectionService {
    /// Runs the external tools
    command_executor: Arc<dyn CommandExecutor>,
    megaraid: MegaRaidCollector,
    smart: SmartHealthCollector,
    /// Destination of rendered reports
    publisher: Arc<dyn ReportPublisher>,
}

impl InventoryCollectionService {
    /// Create a new inventory collection service
    ///
    /// # Arguments
    /// * `command_executor` - Runs MegaCLI and smartctl
    /// * `path_probe` - Resolves by-path device links
    /// * `publisher` - Publisher for rendered reports
    pub fn new(
        command_executor: Arc<dyn CommandExecutor>,
        path_probe: Arc<dyn DevicePathProbe>,
        publisher: Arc<dyn ReportPublisher>,
    ) -> Self {
        Self {
            megaraid: MegaRaidCollector::new(command_executor.clone(), path_probe),
            smart: SmartHealthCollector::new(command_executor.clone()),
            command_executor,
            publisher,
        }
    }

    fn validate_config(config: &ReportConfig) -> Result<(), DomainError> {
        if config.command_timeout == 0 {
            return Err(DomainError::InvalidConfiguration(
                "command_timeout must be at least 1 second".to_string(),
            ));
        }
        if config.collect_megaraid && config.megacli_path.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "megacli_path is empty".to_string(),
            ));
        }
        if config.collect_smart && config.smartctl_path.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "smartctl_path is empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryReportingService for InventoryCollectionService {
    async fn generate_report(&self, config: ReportConfig) -> Result<StorageReport, ReportError> {
        Self::validate_config(&config)?;

        let collected_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| ReportError::GenerationFailed(format!("System clock error: {}", e)))?;

        // The two tools share no state, so they are queried side by side
        let (inventory, smart) = tokio::join!(
            async {
                if config.collect_megaraid {
                    self.megaraid.collect(&config).await
                } else {
                    Inventory::default()
                }
            },
            async {
                if config.collect_smart {
                    self.smart.collect(&config).await
                } else {
                    SmartReport::default()
                }
            },
        );

        let report = StorageReport {
            inventory,
            smart,
            collected_at,
        };
        info!(
            "Collected {} controller(s), {} SMART device(s), {} error(s)",
            report.inventory.controllers.len(),
            report.smart.devices.len(),
            report.errors().count()
        );
        Ok(report)
    }

    async fn publish_report(&self, rendered: &str) -> Result<(), PublishError> {
        self.publisher.publish(rendered).await
    }

    async fn validate_dependencies(&self, config: &ReportConfig) -> Result<Vec<String>, ReportError> {
        let mut required = Vec::new();
        if config.collect_megaraid {
            required.push(config.megacli_path.as_str());
        }
        if config.collect_smart {
            required.push(config.smartctl_path.as_str());
        }

        let mut missing = Vec::new();
        for tool in required {
            let available = self
                .command_executor
                .is_command_available(tool)
                .await
                .map_err(|e| {
                    ReportError::GenerationFailed(format!("Dependency validation failed: {}", e))
                })?;
            if !available {
                missing.push(tool.to_string());
            }
        }
        Ok(missing)
    }

    async fn check_privileges(&self) -> Result<bool, ReportError> {
        self.command_executor
            .has_elevated_privileges()
            .await
            .map_err(|e| ReportError::GenerationFailed(format!("Privilege check failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ReplayCommandExecutor;
    use crate::domain::services::fixtures::{self, MEGACLI, SMARTCTL};
    use std::sync::Mutex;

    struct NoLinks;

    #[async_trait]
    impl DevicePathProbe for NoLinks {
        async fn resolve(&self, _path: &str) -> Option<String> {
            None
        }
    }

    #[derive(Default)]
    struct CapturingPublisher {
        published: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReportPublisher for CapturingPublisher {
        async fn publish(&self, rendered: &str) -> Result<(), PublishError> {
            self.published
                .lock()
                .map_err(|e| PublishError::WriteFailed(e.to_string()))?
                .push(rendered.to_string());
            Ok(())
        }

        fn destination(&self) -> String {
            "memory".to_string()
        }
    }

    fn config() -> ReportConfig {
        ReportConfig {
            megacli_path: MEGACLI.to_string(),
            smartctl_path: SMARTCTL.to_string(),
            ..ReportConfig::default()
        }
    }

    fn service(executor: ReplayCommandExecutor) -> (InventoryCollectionService, Arc<CapturingPublisher>) {
        let publisher = Arc::new(CapturingPublisher::default());
        let service = InventoryCollectionService::new(
            Arc::new(executor),
            Arc::new(NoLinks),
            publisher.clone(),
        );
        (service, publisher)
    }

    #[tokio::test]
    async fn test_generate_full_report() {
        let (service, _) = service(fixtures::smart_host(fixtures::megaraid_host()));
        let report = service.generate_report(config()).await.unwrap();

        assert_eq!(report.inventory.controllers.len(), 1);
        assert_eq!(report.inventory.tallies.total, 8);
        assert_eq!(report.smart.devices.len(), 3);
        assert_eq!(report.errors().count(), 0);
        assert!(report.collected_at > 0);
    }

    #[tokio::test]
    async fn test_collectors_can_be_disabled() {
        let (service, _) = service(fixtures::megaraid_host());
        let config = ReportConfig {
            collect_smart: false,
            ..config()
        };
        let report = service.generate_report(config).await.unwrap();

        assert_eq!(report.inventory.controllers.len(), 1);
        assert_eq!(report.smart, SmartReport::default());
        assert_eq!(report.errors().count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_zero_timeout() {
        let (service, _) = service(ReplayCommandExecutor::new());
        let config = ReportConfig {
            command_timeout: 0,
            ..config()
        };
        assert!(matches!(
            service.generate_report(config).await,
            Err(ReportError::Domain(DomainError::InvalidConfiguration(_)))
        ));
    }

    #[tokio::test]
    async fn test_validate_dependencies() {
        let (service, _) = service(fixtures::megaraid_host());
        let missing = service.validate_dependencies(&config()).await.unwrap();
        assert_eq!(missing, vec![SMARTCTL.to_string()]);

        let config = ReportConfig {
            collect_smart: false,
            ..config()
        };
        assert!(service.validate_dependencies(&config).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_and_privileges() {
        let (service, publisher) =
            service(ReplayCommandExecutor::new().with_elevated_privileges(false));
        service.publish_report("megaraid_drives_total 8\n").await.unwrap();

        assert_eq!(
            *publisher.published.lock().unwrap(),
            vec!["megaraid_drives_total 8\n".to_string()]
        );
        assert!(!service.check_privileges().await.unwrap());
    }
}
