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

//! SMART health collection through smartctl

use crate::domain::parsers::{
    device_info_labels, parse_attributes, parse_device_info, parse_error_count,
    parse_health_passed, parse_scan_open, parse_smart_capabilities, parse_smartctl_version,
};
use crate::domain::{CollectionError, Device, Metric, ReportConfig, SmartReport};
use crate::ports::{CommandExecutor, CommandOutput, SystemCommand};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// smartctl exit status when `--nocheck standby` found the device asleep
const STANDBY_EXIT_CODE: i32 = 2;

/// Collects per-device SMART health metrics
pub struct SmartHealthCollector {
    executor: Arc<dyn CommandExecutor>,
}

impl SmartHealthCollector {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Scan for devices and query each one that is spun up
    pub async fn collect(&self, config: &ReportConfig) -> SmartReport {
        let mut report = SmartReport::default();

        match self.run(config, "host", &["-V".to_string()]).await {
            Ok(output) => report.smartctl_version = parse_smartctl_version(&output.stdout),
            Err(e) => {
                warn!("smartctl is not usable: {}", e.message);
                report.errors.push(e);
                return report;
            }
        }

        match self.run(config, "host", &["--scan-open".to_string()]).await {
            Ok(output) => report.devices = parse_scan_open(&output.stdout),
            Err(e) => {
                report.errors.push(e);
                return report;
            }
        }
        info!("Collecting SMART health from {} device(s)", report.devices.len());

        let started = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        for device in &report.devices {
            if let Err(e) = self.collect_device(config, device, started, &mut report.metrics).await {
                warn!("SMART query for {} failed: {}", device.path, e.message);
                report.errors.push(e);
            }
        }

        report
    }

    async fn collect_device(
        &self,
        config: &ReportConfig,
        device: &Device,
        started: u64,
        metrics: &mut Vec<Metric>,
    ) -> Result<(), CollectionError> {
        let labels = device.base_labels();
        metrics.push(Metric::new("smartctl_run", labels.clone(), started as f64));

        // Querying a sleeping disk would spin it up
        let active = match self.is_active(config, device).await {
            Ok(active) => active,
            Err(e) => {
                metrics.push(Metric::flag("device_active", labels, false));
                return Err(e);
            }
        };
        metrics.push(Metric::flag("device_active", labels.clone(), active));
        if !active {
            debug!("{} is in standby, skipping", device.path);
            return Ok(());
        }

        let output = self.query(config, device, &["--info"]).await?;
        let info = parse_device_info(&output.stdout);
        let mut info_labels = labels.clone();
        info_labels.extend(device_info_labels(&info));
        metrics.push(Metric::new("device_info", info_labels, 1.0));

        let (available, enabled) = parse_smart_capabilities(&info);
        metrics.push(Metric::flag("device_smart_available", labels.clone(), available));
        metrics.push(Metric::flag("device_smart_enabled", labels.clone(), enabled));
        if !available {
            return Ok(());
        }

        let output = self.query(config, device, &["--health"]).await?;
        metrics.push(Metric::flag(
            "device_smart_healthy",
            labels.clone(),
            parse_health_passed(&output.stdout),
        ));

        if device.is_ata() {
            let output = self.query(config, device, &["--attributes"]).await?;
            for attribute in parse_attributes(&output.stdout) {
                let mut attr_labels = labels.clone();
                attr_labels.insert("name".to_string(), attribute.name.clone());
                metrics.push(Metric::new("attr_value", attr_labels.clone(), attribute.value as f64));
                metrics.push(Metric::new("attr_worst", attr_labels.clone(), attribute.worst as f64));
                metrics.push(Metric::new("attr_threshold", attr_labels, attribute.threshold as f64));
            }

            let output = self.query(config, device, &["-l", "xerror,1"]).await?;
            metrics.push(Metric::new(
                "device_errors",
                labels,
                parse_error_count(&output.stdout) as f64,
            ));
        }

        Ok(())
    }

    /// A device that cannot be checked is treated as asleep
    async fn is_active(&self, config: &ReportConfig, device: &Device) -> Result<bool, CollectionError> {
        match self.query(config, device, &["--nocheck", "standby"]).await {
            Ok(output) => Ok(output.exit_code != Some(STANDBY_EXIT_CODE)),
            Err(e) => {
                warn!("Standby check for {} failed: {}", device.path, e.message);
                Err(e)
            }
        }
    }

    /// Run `smartctl <args> --device <type> <path>`
    async fn query(
        &self,
        config: &ReportConfig,
        device: &Device,
        args: &[&str],
    ) -> Result<CommandOutput, CollectionError> {
        let mut full: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        full.extend(device.select_args());
        self.run(config, &device.path, &full).await
    }

    async fn run(
        &self,
        config: &ReportConfig,
        scope: &str,
        args: &[String],
    ) -> Result<CommandOutput, CollectionError> {
        let command = SystemCommand::new(&config.smartctl_path)
            .args(args)
            .timeout(Duration::from_secs(config.command_timeout));
        let result = if config.use_sudo {
            self.executor.execute_with_privileges(&command).await
        } else {
            self.executor.execute(&command).await
        };

        result.map_err(|e| CollectionError {
            scope: scope.to_string(),
            command: command.command_line(),
            message: e.to_string(),
        })
    }
}
