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

//! Human-readable inventory tables

use crate::domain::{CollectionError, Inventory, PhysicalDisk, StorageReport};
use std::fmt::Write;

/// Left-aligned text table padded to the widest cell of each column
#[derive(Debug, Clone)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; missing cells render empty and extra cells are dropped
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let widths: Vec<usize> = (0..self.headers.len())
            .map(|col| {
                self.rows
                    .iter()
                    .map(|row| row[col].chars().count())
                    .chain(std::iter::once(self.headers[col].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        for row in std::iter::once(&self.headers).chain(self.rows.iter()) {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

/// Render the inventory as the four section tables plus a tally line
pub fn render_inventory_table(report: &StorageReport) -> String {
    let inventory = &report.inventory;
    let mut out = String::new();

    out.push_str("-- Controller information --\n");
    out.push_str(&controller_table(inventory).render());
    out.push('\n');

    out.push_str("-- Array information --\n");
    out.push_str(&array_table(inventory).render());
    out.push('\n');

    out.push_str("-- Disk information --\n");
    out.push_str(&disk_table(&inventory.configured_disks).render());
    out.push('\n');

    out.push_str("-- Unconfigured Disk information --\n");
    out.push_str(&unconfigured_table(&inventory.unconfigured_disks).render());
    out.push('\n');

    let tallies = &inventory.tallies;
    let _ = writeln!(
        out,
        "Drives: {} total, {} configured, {} unconfigured. Disks: {} good, {} bad",
        tallies.total, tallies.configured, tallies.unconfigured, tallies.good, tallies.bad
    );

    let errors: Vec<&CollectionError> = report.errors().collect();
    if !errors.is_empty() {
        out.push_str("\n-- Collection errors --\n");
        let mut table = TextTable::new(&["Scope", "Command", "Error"]);
        for error in errors {
            table.push_row(vec![
                error.scope.clone(),
                error.command.clone(),
                error.message.clone(),
            ]);
        }
        out.push_str(&table.render());
    }

    out
}

fn controller_table(inventory: &Inventory) -> TextTable {
    let mut table = TextTable::new(&["ID", "H/W Model", "RAM", "Temp", "BBU", "Firmware"]);
    for controller in &inventory.controllers {
        table.push_row(vec![
            controller.label(),
            controller.model.clone(),
            controller.memory_size.clone(),
            controller.roc_temperature.clone(),
            controller.bbu.to_string(),
            format!("FW: {}", controller.firmware),
        ]);
    }
    table
}

fn array_table(inventory: &Inventory) -> TextTable {
    let mut table = TextTable::new(&[
        "ID", "Type", "Size", "Strpsz", "Flags", "DskCache", "Status", "OS Path", "CacheCade",
        "InProgress",
    ]);
    for drive in inventory.all_logical_drives() {
        table.push_row(vec![
            drive.id.clone(),
            drive.raid_type.clone(),
            drive.size.clone(),
            drive.strip_size.clone(),
            drive.cache_policy.clone(),
            drive.disk_cache.to_string(),
            drive.state.clone(),
            drive.device_path.clone(),
            drive.cachecade_label(),
            drive.in_progress.to_string(),
        ]);
    }
    table
}

fn disk_table(disks: &[PhysicalDisk]) -> TextTable {
    let mut table = TextTable::new(&[
        "ID", "Disk ID", "Type", "Drive Model", "Size", "Status", "Speed", "Temp", "Encl", "Slot",
        "LSI ID",
    ]);
    for disk in disks {
        table.push_row(vec![
            disk.membership.to_string(),
            disk.disk_id.clone(),
            disk.media_type.to_string(),
            disk.inquiry.raw.clone(),
            disk.size.clone(),
            disk.state.clone(),
            disk.speed.clone(),
            disk.temperature.clone(),
            disk.enclosure_id.clone(),
            disk.slot_id.clone(),
            disk.device_id.clone(),
        ]);
    }
    table
}

fn unconfigured_table(disks: &[PhysicalDisk]) -> TextTable {
    let mut table = TextTable::new(&[
        "Type", "Drive Model", "Size", "Status", "Speed", "Temp", "Encl", "Slot", "LSI ID",
        "OS Path",
    ]);
    for disk in disks {
        table.push_row(vec![
            disk.media_type.to_string(),
            disk.inquiry.raw.clone(),
            disk.size.clone(),
            disk.state.clone(),
            disk.speed.clone(),
            disk.temperature.clone(),
            disk.enclosure_id.clone(),
            disk.slot_id.clone(),
            disk.device_id.clone(),
            disk.device_path.clone(),
        ]);
    }
    table
}
