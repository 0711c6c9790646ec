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

//! Physical disk parsing functions
//!
//! Both extractors walk the listing in order and keep a scratch record for
//! the disk being read. A new `Enclosure Device ID` line starts a new disk
//! (except for the very first one, which may follow fields already read),
//! and `Drive Temperature`, the last field MegaCLI prints per disk, flushes
//! the record.

use super::classifier::{classify_lines, LineField};
use super::common::{collapse_whitespace, first_token, normalize_size, strip_parenthetical};
use crate::domain::{
    ArrayMembership, DiskKey, InquiryData, MediaType, NestedArrayTable, ParseError, PhysicalDisk,
    NOT_AVAILABLE, UNKNOWN,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    static ref SIZE_SECTORS_RE: Regex = Regex::new(r"\s*\[.*$").unwrap();
    static ref REBUILD_PERCENT_RE: Regex = Regex::new(r"Completed\s+(\d+)%").unwrap();
}

/// Firmware states counted as healthy
const HEALTHY_STATES: &[&str] = &[
    "Online",
    "Online, Spun Up",
    "Unconfigured(good), Spun Up",
    "Unconfigured(good), Spun down",
    "JBOD",
    "Hotspare, Spun Up",
    "Hotspare, Spun down",
];

/// Scratch fields for the disk currently being read
#[derive(Debug)]
struct DiskScratch {
    enclosure: Option<String>,
    disk_id: String,
    device_id: String,
    slot_id: String,
    state: String,
    inquiry: Option<InquiryData>,
    media_type: MediaType,
    speed: String,
    size: String,
    size_error: Option<ParseError>,
    in_disk_group: bool,
}

/// Disks read from one listing
///
/// A disk whose coerced size cannot be normalized is still listed, with its
/// size set to `N/A`, and the failure is kept in `size_errors`.
#[derive(Debug, Default, PartialEq)]
pub struct DiskListing {
    pub disks: Vec<PhysicalDisk>,
    pub size_errors: Vec<DiskSizeError>,
}

/// A coerced size that could not be normalized
#[derive(Debug, Clone, PartialEq)]
pub struct DiskSizeError {
    pub enclosure_id: String,
    pub slot_id: String,
    pub error: ParseError,
}

impl Default for DiskScratch {
    fn default() -> Self {
        Self {
            enclosure: None,
            disk_id: NOT_AVAILABLE.to_string(),
            device_id: UNKNOWN.to_string(),
            slot_id: String::new(),
            state: "Offline".to_string(),
            inquiry: None,
            media_type: MediaType::NotAvailable,
            speed: UNKNOWN.to_string(),
            size: UNKNOWN.to_string(),
            size_error: None,
            in_disk_group: false,
        }
    }
}

impl DiskScratch {
    /// Record a new enclosure line, resetting the per-disk fields unless this
    /// is the first enclosure of the listing
    fn enter_enclosure(&mut self, value: &str, reset_membership: bool) {
        let first = self.enclosure.is_none();
        self.enclosure = Some(value.replace(NOT_AVAILABLE, ""));
        if !first {
            self.state = "Offline".to_string();
            self.inquiry = None;
            self.speed = UNKNOWN.to_string();
            self.slot_id = String::new();
            self.device_id = UNKNOWN.to_string();
            self.size_error = None;
            if reset_membership {
                self.in_disk_group = false;
            }
        }
    }

    fn set_size(&mut self, value: &str) {
        match parse_coerced_size(value) {
            Ok(size) => {
                self.size = size;
                self.size_error = None;
            }
            Err(e) => {
                self.size = NOT_AVAILABLE.to_string();
                self.size_error = Some(e);
            }
        }
    }

    /// Append the disk read so far, along with its size error if any
    fn flush(
        &mut self,
        listing: &mut DiskListing,
        controller_id: u32,
        membership: ArrayMembership,
        temperature: &str,
    ) {
        let disk = self.build(controller_id, membership, temperature);
        if let Some(error) = self.size_error.take() {
            listing.size_errors.push(DiskSizeError {
                enclosure_id: disk.enclosure_id.clone(),
                slot_id: disk.slot_id.clone(),
                error,
            });
        }
        listing.disks.push(disk);
    }

    fn build(&self, controller_id: u32, membership: ArrayMembership, temperature: &str) -> PhysicalDisk {
        PhysicalDisk {
            controller_id,
            membership,
            disk_id: self.disk_id.clone(),
            device_id: self.device_id.clone(),
            media_type: self.media_type,
            inquiry: self.inquiry.clone().unwrap_or_default(),
            size: self.size.clone(),
            state: self.state.clone(),
            speed: self.speed.clone(),
            temperature: strip_parenthetical(temperature),
            enclosure_id: self.enclosure.clone().unwrap_or_default(),
            slot_id: self.slot_id.clone(),
            device_path: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Normalize a `Coerced Size` value, dropping the sector count in brackets
fn parse_coerced_size(value: &str) -> Result<String, ParseError> {
    normalize_size(&SIZE_SECTORS_RE.replace(value, ""))
}

/// Parse configured disks from `-LdPdInfo -a<controller>`
///
/// Disks are attached to the logical drive whose header precedes them.
/// When that drive is nested (see [`NestedArrayTable`]) and a span header
/// was seen, the array reference carries an `s<span>` suffix.
pub fn parse_configured_disks(
    controller_id: u32,
    lines: &[&str],
    nested: &NestedArrayTable,
) -> DiskListing {
    let mut listing = DiskListing::default();
    let mut scratch = DiskScratch::default();
    let mut array_index: Option<usize> = None;
    let mut ld_number = String::new();
    let mut span: Option<String> = None;

    for line in classify_lines(lines.iter().copied()) {
        let value = line.value;
        match line.field {
            LineField::VirtualDriveHeader => {
                array_index = Some(array_index.map_or(0, |i| i + 1));
                ld_number = drive_number(value);
            }
            LineField::SpanHeader => span = Some(span_number(value)),
            LineField::EnclosureId => scratch.enter_enclosure(value, false),
            LineField::CoercedSize => scratch.set_size(value),
            LineField::PdHeader => {
                scratch.disk_id = value.split_whitespace().nth(1).unwrap_or("").to_string()
            }
            LineField::DeviceId => scratch.device_id = value.to_string(),
            LineField::SlotNumber => scratch.slot_id = value.to_string(),
            LineField::FirmwareState => scratch.state = value.to_string(),
            LineField::InquiryData => scratch.inquiry = Some(parse_inquiry(value)),
            LineField::MediaType => scratch.media_type = MediaType::from_megacli(value),
            LineField::DeviceSpeed => scratch.speed = value.to_string(),
            LineField::DriveTemperature if scratch.inquiry.is_some() => {
                let membership = match array_index {
                    Some(index) => {
                        let mut reference = format!("c{}u{}", controller_id, ld_number);
                        if let Some(span) = span.as_ref().filter(|_| nested.is_nested(controller_id, index)) {
                            reference.push('s');
                            reference.push_str(span);
                        }
                        ArrayMembership::Array(reference)
                    }
                    None => ArrayMembership::Unconfigured,
                };
                scratch.flush(&mut listing, controller_id, membership, value);
            }
            _ => {}
        }
    }

    listing
}

/// Parse disks that belong to no disk group from `-PDList -a<controller>`
pub fn parse_unconfigured_disks(controller_id: u32, lines: &[&str]) -> DiskListing {
    let mut listing = DiskListing::default();
    let mut scratch = DiskScratch::default();

    for line in classify_lines(lines.iter().copied()) {
        let value = line.value;
        match line.field {
            LineField::EnclosureId => scratch.enter_enclosure(value, true),
            LineField::CoercedSize => scratch.set_size(value),
            LineField::DriveGroupPosition => scratch.in_disk_group = true,
            LineField::DeviceId => scratch.device_id = value.to_string(),
            LineField::SlotNumber => scratch.slot_id = value.to_string(),
            LineField::FirmwareState => scratch.state = value.to_string(),
            LineField::InquiryData => scratch.inquiry = Some(parse_inquiry(value)),
            LineField::MediaType => scratch.media_type = MediaType::from_megacli(value),
            LineField::DeviceSpeed => scratch.speed = value.to_string(),
            LineField::DriveTemperature if !scratch.in_disk_group => {
                scratch.flush(&mut listing, controller_id, ArrayMembership::Unconfigured, value);
            }
            _ => {}
        }
    }

    listing
}

/// Logical drive number of a `Virtual Drive: 1 (Target Id: 1)` header
fn drive_number(header: &str) -> String {
    header
        .split('(')
        .next()
        .and_then(|head| head.split(':').nth(1))
        .map(str::trim)
        .unwrap_or("")
        .to_string()
}

/// Span number of a `Span: 1 - Number of PDs: 2` header
fn span_number(header: &str) -> String {
    first_token(header.split(':').nth(1).unwrap_or("")).to_string()
}

/// Split an inquiry string into manufacturer, model and serial
///
/// The first token is the manufacturer and the second the model; whatever
/// follows is the serial.
pub fn parse_inquiry(value: &str) -> InquiryData {
    let raw = collapse_whitespace(value);
    let mut tokens = raw.splitn(3, ' ');
    let manufacturer = tokens.next().unwrap_or("").to_string();
    let model = tokens.next().unwrap_or("").to_string();
    let serial = tokens.next().unwrap_or("").trim().to_string();

    InquiryData {
        raw,
        manufacturer,
        model,
        serial,
    }
}

/// Keys of the configured slots listed in `-LdPdInfo` output
///
/// A disk appears once per logical drive it serves; callers merge these
/// sets to count each `(controller, enclosure, slot)` once.
pub fn configured_slot_keys(controller_id: u32, lines: &[&str]) -> BTreeSet<DiskKey> {
    let mut keys = BTreeSet::new();
    let mut enclosure = NOT_AVAILABLE.to_string();

    for line in classify_lines(lines.iter().copied()) {
        match line.field {
            LineField::EnclosureId => enclosure = line.value.to_string(),
            LineField::SlotNumber => {
                keys.insert(DiskKey::new(controller_id, &enclosure, line.value));
            }
            _ => {}
        }
    }

    keys
}

/// Count unconfigured and hot spare drives in `-PDList` output
pub fn count_unconfigured_drives(lines: &[&str]) -> u32 {
    classify_lines(lines.iter().copied())
        .filter(|c| c.field == LineField::FirmwareState)
        .filter(|c| c.value.starts_with("Unconfigured") || c.value.starts_with("Hotspare"))
        .count() as u32
}

/// Reconcile the literal unconfigured count against the drive totals
///
/// A drive being absorbed by an array expansion is neither configured nor
/// listed as unconfigured, so the difference between the totals can exceed
/// the literal count.
///
/// # Examples
///
/// ```
/// use raid_report::domain::parsers::reconcile_unconfigured;
///
/// assert_eq!(reconcile_unconfigured(24, 20, 2), 4);
/// assert_eq!(reconcile_unconfigured(8, 8, 1), 1);
/// ```
pub fn reconcile_unconfigured(total: u32, configured: u32, literal: u32) -> u32 {
    literal.max(total.saturating_sub(configured))
}

/// Percentage from `pdrbld -showprog` output, 0 when not reported
pub fn parse_rebuild_progress(lines: &[&str]) -> u32 {
    classify_lines(lines.iter().copied())
        .filter(|c| c.field == LineField::RebuildProgress)
        .filter_map(|c| REBUILD_PERCENT_RE.captures(c.value))
        .filter_map(|caps| caps[1].parse().ok())
        .last()
        .unwrap_or(0)
}

/// Whether a firmware state counts toward the good disk tally
pub fn is_healthy_state(state: &str) -> bool {
    HEALTHY_STATES.contains(&state) || state.starts_with("Rebuilding (")
}
