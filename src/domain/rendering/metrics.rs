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

//! Metric records derived from a storage report and their text exposition

use crate::domain::{CollectionError, Inventory, Metric, SmartReport, StorageReport};
use std::collections::BTreeMap;
use std::fmt::Write;

pub const MEGARAID_PREFIX: &str = "megaraid_";
pub const SMART_PREFIX: &str = "smartmon_";

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn error_metrics(errors: &[CollectionError]) -> impl Iterator<Item = Metric> + '_ {
    errors.iter().map(|e| {
        Metric::new(
            "collection_errors",
            labels(&[("scope", e.scope.as_str()), ("command", e.command.as_str())]),
            1.0,
        )
    })
}

/// Info and tally metrics for the MegaRAID inventory, without the version metric
pub fn inventory_metrics(inventory: &Inventory) -> Vec<Metric> {
    let mut metrics = Vec::new();

    for controller in &inventory.controllers {
        let id = controller.id.to_string();
        let bbu = controller.bbu.to_string();
        metrics.push(Metric::new(
            "hba_info",
            labels(&[
                ("controller", id.as_str()),
                ("model", controller.model.as_str()),
                ("memory_size", controller.memory_size.as_str()),
                ("temperature", controller.roc_temperature.as_str()),
                ("bbu_status", bbu.as_str()),
                ("firmware", controller.firmware.as_str()),
            ]),
            1.0,
        ));
    }

    for drive in inventory.all_logical_drives() {
        let controller = drive.controller_id.to_string();
        let disk_cache = drive.disk_cache.to_string();
        metrics.push(Metric::new(
            "array_info",
            labels(&[
                ("controller", controller.as_str()),
                ("id", drive.id.as_str()),
                ("target_id", drive.target_id.as_str()),
                ("raid_type", drive.raid_type.as_str()),
                ("size", drive.size.as_str()),
                ("strip_size", drive.strip_size.as_str()),
                ("state", drive.state.as_str()),
                ("cache_policy", drive.cache_policy.as_str()),
                ("disk_cache", disk_cache.as_str()),
                ("device_path", drive.device_path.as_str()),
            ]),
            1.0,
        ));
    }

    for disk in inventory
        .configured_disks
        .iter()
        .chain(inventory.unconfigured_disks.iter())
    {
        let controller = disk.controller_id.to_string();
        let array = disk.membership.to_string();
        let media_type = disk.media_type.to_string();
        metrics.push(Metric::new(
            "disk_info",
            labels(&[
                ("controller", controller.as_str()),
                ("array", array.as_str()),
                ("disk_id", disk.disk_id.as_str()),
                ("device_id", disk.device_id.as_str()),
                ("enclosure", disk.enclosure_id.as_str()),
                ("slot", disk.slot_id.as_str()),
                ("media_type", media_type.as_str()),
                ("model", disk.inquiry.raw.as_str()),
                ("size", disk.size.as_str()),
                ("state", disk.state.as_str()),
                ("speed", disk.speed.as_str()),
                ("device_path", disk.device_path.as_str()),
            ]),
            1.0,
        ));
    }

    let tallies = &inventory.tallies;
    for (name, value) in [
        ("drives_total", tallies.total),
        ("drives_configured", tallies.configured),
        ("drives_unconfigured", tallies.unconfigured),
        ("disks_good", tallies.good),
        ("disks_bad", tallies.bad),
    ] {
        metrics.push(Metric::new(name, BTreeMap::new(), value as f64));
    }

    metrics.extend(error_metrics(&inventory.errors));
    metrics
}

/// Per-device SMART metrics plus collection failures, without the version metric
pub fn smart_metrics(smart: &SmartReport) -> Vec<Metric> {
    smart
        .metrics
        .iter()
        .cloned()
        .chain(error_metrics(&smart.errors))
        .collect()
}

fn version_metric(name: &str, version: Option<&String>) -> Option<Metric> {
    version.map(|v| Metric::new(name, labels(&[("version", v.as_str())]), 1.0))
}

/// Render the whole report: the SMART block first, then the MegaRAID block
pub fn render_metrics(report: &StorageReport) -> String {
    let mut out = render_exposition(
        SMART_PREFIX,
        "SMART",
        version_metric("smartctl_version", report.smart.smartctl_version.as_ref()),
        smart_metrics(&report.smart),
    );
    out.push_str(&render_exposition(
        MEGARAID_PREFIX,
        "MegaRAID",
        version_metric("megacli_version", report.inventory.megacli_version.as_ref()),
        inventory_metrics(&report.inventory),
    ));
    out
}

/// Write one block of gauges
///
/// The version metric goes first. The rest are stably sorted by name and each
/// new name is preceded by its HELP and TYPE lines.
pub fn render_exposition(
    prefix: &str,
    help_label: &str,
    version: Option<Metric>,
    mut metrics: Vec<Metric>,
) -> String {
    metrics.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = String::new();
    let mut current: Option<String> = None;
    for metric in version.iter().chain(metrics.iter()) {
        if current.as_deref() != Some(metric.name.as_str()) {
            let _ = writeln!(
                out,
                "# HELP {}{} {} metric {}",
                prefix, metric.name, help_label, metric.name
            );
            let _ = writeln!(out, "# TYPE {}{} gauge", prefix, metric.name);
            current = Some(metric.name.clone());
        }
        let _ = writeln!(out, "{}", format_sample(prefix, metric));
    }
    out
}

/// `<prefix><name>{k="v",...} <value>`, braces omitted without labels
pub fn format_sample(prefix: &str, metric: &Metric) -> String {
    let value = format_value(metric.value);
    if metric.labels.is_empty() {
        return format!("{}{} {}", prefix, metric.name, value);
    }

    let labels = metric
        .labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect::<Vec<_>>()
        .join(",");
    format!("{}{}{{{}}} {}", prefix, metric.name, labels, value)
}

pub fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
