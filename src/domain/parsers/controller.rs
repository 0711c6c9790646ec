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

//! Controller (adapter) information parsing functions

use super::classifier::{classify, classify_lines, LineField};
use super::common::first_token;
use crate::domain::{BbuStatus, ControllerSummary, PciAddress, NOT_AVAILABLE, UNKNOWN};

/// Parse the controller count from `-adpCount`
///
/// Expected line: `Controller Count: 2.`
///
/// # Returns
///
/// Number of controllers, 0 when the line is missing or unreadable.
pub fn parse_controller_count(lines: &[&str]) -> u32 {
    classify_lines(lines.iter().copied())
        .find(|c| c.field == LineField::ControllerCount)
        .and_then(|c| c.value.trim_end_matches('.').trim().parse().ok())
        .unwrap_or(0)
}

/// Parse a controller summary from `-AdpAllInfo -a<id>`
///
/// BBU presence is reported as-is; call [`parse_bbu_replacement`] on the
/// `-AdpBbuCmd -GetBbuStatus` output when it is `Present`.
pub fn parse_controller_summary(id: u32, lines: &[&str]) -> ControllerSummary {
    let mut model = UNKNOWN.to_string();
    let mut memory_size = UNKNOWN.to_string();
    let mut firmware = UNKNOWN.to_string();
    let mut roc_temperature = String::new();
    let mut bbu: Option<BbuStatus> = None;

    for line in classify_lines(lines.iter().copied()) {
        match line.field {
            LineField::ProductName => model = line.value.to_string(),
            LineField::MemorySize => memory_size = line.value.to_string(),
            LineField::FirmwareBuild => firmware = line.value.to_string(),
            LineField::RocTemp => roc_temperature = first_token(line.value).to_string(),
            LineField::BbuPresence if bbu.is_none() => {
                bbu = Some(BbuStatus::from_presence(first_token(line.value)))
            }
            _ => {}
        }
    }

    ControllerSummary {
        id,
        model,
        memory_size,
        firmware,
        roc_temperature: if roc_temperature.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            format!("{}C", roc_temperature)
        },
        bbu: bbu.unwrap_or(BbuStatus::NotAvailable),
        pci_address: None,
    }
}

/// Parse `-AdpBbuCmd -GetBbuStatus` output into `Good` or `Replace`
pub fn parse_bbu_replacement(lines: &[&str]) -> BbuStatus {
    let replace = classify_lines(lines.iter().copied())
        .find(|c| c.field == LineField::BbuReplacementRequired)
        .map(|c| first_token(c.value) == "Yes")
        .unwrap_or(false);

    if replace {
        BbuStatus::Replace
    } else {
        BbuStatus::Good
    }
}

/// Parse `-AdpGetPciInfo` output
///
/// # Returns
///
/// `None` when no bus number was reported.
pub fn parse_pci_address(lines: &[&str]) -> Option<PciAddress> {
    let mut bus = None;
    let mut device = String::new();
    let mut function = String::new();

    for line in classify_lines(lines.iter().copied()) {
        match line.field {
            LineField::BusNumber => bus = Some(line.value.to_string()),
            LineField::DeviceNumber => device = line.value.to_string(),
            LineField::FunctionNumber => function = line.value.to_string(),
            _ => {}
        }
    }

    bus.filter(|b| !b.is_empty())
        .map(|b| PciAddress::new(&b, &device, &function))
}

/// Parse the physical drive count from `-PDGetNum`
///
/// Expected line: `Number of Physical Drives on Adapter 0: 8`
pub fn parse_physical_drive_count(lines: &[&str]) -> u32 {
    classify_lines(lines.iter().copied())
        .find(|c| c.field == LineField::PhysicalDriveCount)
        .and_then(|c| c.value.parse().ok())
        .unwrap_or(0)
}

/// Count logical drive headers in `-LDInfo -lall` output
pub fn parse_logical_drive_count(lines: &[&str]) -> usize {
    lines
        .iter()
        .filter(|line| classify(line).field == LineField::VirtualDriveHeader)
        .count()
}

/// Outcome of probing one logical drive id with `-LDInfo -l<id>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalDriveProbe {
    /// The id holds a logical drive
    Present,
    /// The controller reports the id as not existing
    Missing,
    /// Neither answer was recognised
    Unrecognized,
}

/// Interpret the output of a single-id `-LDInfo` query
pub fn parse_logical_drive_probe(lines: &[&str]) -> LogicalDriveProbe {
    for line in classify_lines(lines.iter().copied()) {
        match line.field {
            LineField::MissingLogicalDrive => return LogicalDriveProbe::Missing,
            LineField::VirtualDriveHeader => return LogicalDriveProbe::Present,
            _ => {}
        }
    }
    LogicalDriveProbe::Unrecognized
}

/// Parse the MegaCLI version from `-v`
///
/// Expected line: `MegaCLI SAS RAID Management Tool  Ver 8.07.14 Dec 16, 2013`
pub fn parse_megacli_version(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        tokens.find(|t| *t == "Ver")?;
        tokens.next().map(str::to_string)
    })
}
