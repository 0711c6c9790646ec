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

//! MegaRAID inventory collection
//!
//! Walks every controller in order: adapter summary, logical drives, then
//! configured and unconfigured physical disks. Each step depends on the
//! output of the previous one, so controllers are queried sequentially.

use crate::domain::parsers::{
    configured_slot_keys, count_unconfigured_drives, is_healthy_state, output_lines,
    parse_bbu_replacement, parse_configured_disks, parse_controller_count,
    parse_controller_summary, parse_logical_drive, parse_logical_drive_count,
    parse_logical_drive_probe, parse_megacli_version, parse_pci_address,
    parse_physical_drive_count, parse_rebuild_progress, parse_unconfigured_disks,
    reconcile_unconfigured, DiskSizeError, LogicalDriveProbe,
};
use crate::domain::{
    BbuStatus, CollectionError, DiskHealthLedger, Inventory, LogicalDrive, NestedArrayTable,
    PhysicalDisk, ReportConfig,
};
use crate::ports::{CommandExecutor, DevicePathProbe, SystemCommand};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on logical drive ids probed per controller
pub const MAX_LOGICAL_DRIVE_PROBES: u32 = 256;

/// SCSI channels probed for a logical drive's by-path link
const LOGICAL_DRIVE_CHANNELS: std::ops::RangeInclusive<u32> = 1..=7;

/// Collects the MegaRAID inventory through MegaCLI
pub struct MegaRaidCollector {
    executor: Arc<dyn CommandExecutor>,
    probe: Arc<dyn DevicePathProbe>,
}

/// Cross-controller state of one collection run
#[derive(Default)]
struct RunState {
    inventory: Inventory,
    ledger: DiskHealthLedger,
    nested: NestedArrayTable,
}

impl MegaRaidCollector {
    /// Create a new collector
    ///
    /// # Arguments
    /// * `executor` - Runs MegaCLI
    /// * `probe` - Resolves `/dev/disk/by-path` links
    pub fn new(executor: Arc<dyn CommandExecutor>, probe: Arc<dyn DevicePathProbe>) -> Self {
        Self { executor, probe }
    }

    /// Build the inventory of every controller on the host
    ///
    /// Never fails: a controller whose queries cannot be run is recorded in
    /// `Inventory::errors` and the remaining controllers are still collected.
    pub async fn collect(&self, config: &ReportConfig) -> Inventory {
        let mut state = RunState::default();

        match self.run(config, "host", &["-v"]).await {
            Ok(output) => state.inventory.megacli_version = parse_megacli_version(&output),
            Err(e) => state.inventory.errors.push(e),
        }

        let count = match self.run(config, "host", &["-adpCount", "-NoLog"]).await {
            Ok(output) => parse_controller_count(&output_lines(&output)),
            Err(e) => {
                warn!("Cannot count controllers: {}", e.message);
                state.inventory.errors.push(e);
                return state.inventory;
            }
        };
        info!("Collecting MegaRAID inventory from {} controller(s)", count);

        for controller_id in 0..count {
            if let Err(e) = self.collect_controller(config, controller_id, &mut state).await {
                warn!(
                    "Skipping rest of controller {}: '{}' failed: {}",
                    controller_id, e.command, e.message
                );
                state.inventory.errors.push(e);
            }
        }

        state.inventory.tallies.good = state.ledger.good();
        state.inventory.tallies.bad = state.ledger.bad();
        state.inventory
    }

    async fn collect_controller(
        &self,
        config: &ReportConfig,
        id: u32,
        state: &mut RunState,
    ) -> Result<(), CollectionError> {
        let scope = format!("c{}", id);
        let adapter = format!("-a{}", id);

        let output = self.run(config, &scope, &["-AdpAllInfo", &adapter, "-NoLog"]).await?;
        let mut summary = parse_controller_summary(id, &output_lines(&output));

        if summary.bbu == BbuStatus::Present {
            let output = self
                .run(config, &scope, &["-AdpBbuCmd", "-GetBbuStatus", &adapter, "-NoLog"])
                .await?;
            summary.bbu = parse_bbu_replacement(&output_lines(&output));
        }

        let output = self.run(config, &scope, &["-AdpGetPciInfo", &adapter, "-NoLog"]).await?;
        summary.pci_address = parse_pci_address(&output_lines(&output));
        let by_path_prefix = summary.pci_address.as_ref().map(|pci| pci.by_path_prefix());
        state.inventory.controllers.push(summary);

        let drives = self.collect_logical_drives(config, id, state).await?;
        let mut resolved = Vec::with_capacity(drives.len());
        for mut drive in drives {
            state.nested.set(id, drive.array_index, drive.nested);
            if let Some(prefix) = &by_path_prefix {
                drive.device_path = self.resolve_logical_drive(config, prefix, &drive).await;
            }
            resolved.push(drive);
        }
        state.inventory.logical_drives.insert(id, resolved);

        let output = self.run(config, &scope, &["-PDGetNum", &adapter, "-NoLog"]).await?;
        let total = parse_physical_drive_count(&output_lines(&output));
        state.inventory.tallies.total += total;

        let output = self.run(config, &scope, &["-LdPdInfo", &adapter, "-NoLog"]).await?;
        let lines = output_lines(&output);
        let configured = configured_slot_keys(id, &lines).len() as u32;
        state.inventory.tallies.configured += configured;

        let listing = parse_configured_disks(id, &lines, &state.nested);
        self.record_size_errors(config, &scope, &["-LdPdInfo", &adapter, "-NoLog"], listing.size_errors, state);
        for mut disk in listing.disks {
            if disk.needs_rebuild_progress() {
                self.fill_rebuild_progress(config, &mut disk, state).await;
            }
            state.ledger.record(disk.key(), is_healthy_state(&disk.state));
            state.inventory.configured_disks.push(disk);
        }

        let output = self.run(config, &scope, &["-PDList", &adapter, "-NoLog"]).await?;
        let lines = output_lines(&output);
        let literal = count_unconfigured_drives(&lines);
        state.inventory.tallies.unconfigured += reconcile_unconfigured(total, configured, literal);

        let listing = parse_unconfigured_disks(id, &lines);
        self.record_size_errors(config, &scope, &["-PDList", &adapter, "-NoLog"], listing.size_errors, state);
        for mut disk in listing.disks {
            if let Some(prefix) = &by_path_prefix {
                let path = format!("{}/{}0:{}:0", config.by_path_root, prefix, disk.slot_id);
                if let Some(real) = self.probe.resolve(&path).await {
                    disk.device_path = real;
                }
            }
            state.ledger.record(disk.key(), is_healthy_state(&disk.state));
            state.inventory.unconfigured_disks.push(disk);
        }

        Ok(())
    }

    /// Report each disk whose size could not be read, keeping the disk itself
    fn record_size_errors(
        &self,
        config: &ReportConfig,
        scope: &str,
        args: &[&str],
        errors: Vec<DiskSizeError>,
        state: &mut RunState,
    ) {
        for failure in errors {
            warn!(
                "{}: enclosure {} slot {}: {}",
                scope, failure.enclosure_id, failure.slot_id, failure.error
            );
            state.inventory.errors.push(CollectionError {
                scope: scope.to_string(),
                command: self.command(config, args).command_line(),
                message: format!(
                    "enclosure {} slot {}: {}",
                    failure.enclosure_id, failure.slot_id, failure.error
                ),
            });
        }
    }

    /// Probe logical drive ids upward until every enumerated drive is found
    async fn collect_logical_drives(
        &self,
        config: &ReportConfig,
        controller_id: u32,
        state: &mut RunState,
    ) -> Result<Vec<LogicalDrive>, CollectionError> {
        let scope = format!("c{}", controller_id);
        let adapter = format!("-a{}", controller_id);

        let output = self
            .run(config, &scope, &["-LDInfo", "-Lall", &adapter, "-NoLog"])
            .await?;
        let expected = parse_logical_drive_count(&output_lines(&output));

        let mut drives = Vec::new();
        let mut found = 0usize;
        let mut ld = 0u32;
        while found < expected && ld < MAX_LOGICAL_DRIVE_PROBES {
            let selector = format!("-L{}", ld);
            let args = ["-LDInfo", selector.as_str(), adapter.as_str(), "-NoLog"];
            let output = self.run(config, &scope, &args).await?;
            let lines = output_lines(&output);

            match parse_logical_drive_probe(&lines) {
                LogicalDriveProbe::Present => {
                    match parse_logical_drive(controller_id, ld, found, &lines) {
                        Ok(drive) => drives.push(drive),
                        Err(e) => state.inventory.errors.push(CollectionError {
                            scope: scope.clone(),
                            command: self.command(config, &args).command_line(),
                            message: e.to_string(),
                        }),
                    }
                    found += 1;
                }
                LogicalDriveProbe::Missing => debug!("c{}u{} does not exist", controller_id, ld),
                LogicalDriveProbe::Unrecognized => {
                    warn!("Unrecognized answer probing c{}u{}", controller_id, ld)
                }
            }
            ld += 1;
        }

        if found < expected {
            warn!(
                "Controller {} reports {} logical drives, found {} in {} ids",
                controller_id, expected, found, MAX_LOGICAL_DRIVE_PROBES
            );
        }

        Ok(drives)
    }

    /// First existing `<prefix><channel>:<target>:0` link, channels 1 to 7
    async fn resolve_logical_drive(
        &self,
        config: &ReportConfig,
        prefix: &str,
        drive: &LogicalDrive,
    ) -> String {
        if !drive.target_id.is_empty() {
            for channel in LOGICAL_DRIVE_CHANNELS {
                let path = format!(
                    "{}/{}{}:{}:0",
                    config.by_path_root, prefix, channel, drive.target_id
                );
                if let Some(real) = self.probe.resolve(&path).await {
                    return real;
                }
            }
        }
        drive.device_path.clone()
    }

    async fn fill_rebuild_progress(
        &self,
        config: &ReportConfig,
        disk: &mut PhysicalDisk,
        state: &mut RunState,
    ) {
        let physical = format!("-PhysDrv[{}:{}]", disk.enclosure_id, disk.slot_id);
        let adapter = format!("-a{}", disk.controller_id);
        let scope = format!("c{}", disk.controller_id);

        match self
            .run(config, &scope, &["-PDRbld", "-ShowProg", &physical, &adapter, "-NoLog"])
            .await
        {
            Ok(output) => disk.set_rebuild_progress(parse_rebuild_progress(&output_lines(&output))),
            Err(e) => state.inventory.errors.push(e),
        }
    }

    fn command(&self, config: &ReportConfig, args: &[&str]) -> SystemCommand {
        SystemCommand::new(&config.megacli_path)
            .args(args)
            .timeout(Duration::from_secs(config.command_timeout))
    }

    /// Run MegaCLI and return its stdout
    ///
    /// A non-zero exit is not an error here: MegaCLI reports counts through
    /// its exit status, and partial output is still worth parsing.
    async fn run(
        &self,
        config: &ReportConfig,
        scope: &str,
        args: &[&str],
    ) -> Result<String, CollectionError> {
        let command = self.command(config, args);
        let result = if config.use_sudo {
            self.executor.execute_with_privileges(&command).await
        } else {
            self.executor.execute(&command).await
        };

        match result {
            Ok(output) => {
                if !output.success && output.stdout.trim().is_empty() {
                    warn!(
                        "'{}' exited with {:?} and no output",
                        command.command_line(),
                        output.exit_code
                    );
                }
                Ok(output.stdout)
            }
            Err(e) => Err(CollectionError {
                scope: scope.to_string(),
                command: command.command_line(),
                message: e.to_string(),
            }),
        }
    }
}
