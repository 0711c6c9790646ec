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

//! Line classifier for MegaCLI `field: value` output
//!
//! Every pattern is anchored at the start of the trimmed line. Patterns are
//! tried from most to least specific, so at most one field matches a line.
//! Lines that match nothing are reported as [`LineField::NoneOfTheAbove`]
//! and are skipped by the extractors; MegaCLI prints plenty of lines nobody
//! needs and new firmware only ever adds more.

use super::common::field_value;
use lazy_static::lazy_static;
use regex::Regex;

/// Semantic field of one MegaCLI output line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineField {
    ControllerCount,
    ProductName,
    MemorySize,
    FirmwareBuild,
    RocTemp,
    BbuPresence,
    BbuReplacementRequired,
    RaidLevel,
    Size,
    SpanDepth,
    State,
    StripSize,
    DrivesPerSpan,
    CurrentCachePolicy,
    DiskCachePolicy,
    VirtualDriveHeader,
    CacheCadeType,
    TargetIdAssociation,
    EnclosureId,
    CoercedSize,
    DriveGroupPosition,
    DeviceId,
    SlotNumber,
    FirmwareState,
    InquiryData,
    MediaType,
    DeviceSpeed,
    DriveTemperature,
    OngoingProgress,
    SpanHeader,
    PdHeader,
    MissingLogicalDrive,
    BusNumber,
    DeviceNumber,
    FunctionNumber,
    PhysicalDriveCount,
    RebuildProgress,
    NoneOfTheAbove,
}

/// A classified line and the raw value after its delimiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine<'a> {
    pub field: LineField,
    pub value: &'a str,
}

lazy_static! {
    // Order matters: the first matching pattern wins.
    static ref PATTERNS: Vec<(LineField, Regex)> = vec![
        (LineField::MissingLogicalDrive, r"^Adapter.*Virtual Drive .* Does not Exist"),
        (LineField::VirtualDriveHeader, r"^(CacheCade )?Virtual (Drive|Disk):"),
        (LineField::ControllerCount, r"^Controller Count"),
        (LineField::ProductName, r"^Product Name"),
        (LineField::MemorySize, r"^Memory Size"),
        (LineField::FirmwareBuild, r"^FW Package Build"),
        (LineField::RocTemp, r"^ROC temperature :"),
        (LineField::BbuPresence, r"^BBU +:"),
        (LineField::BbuReplacementRequired, r"^Battery Replacement required +:"),
        (LineField::RaidLevel, r"^RAID Level.*?:"),
        (LineField::Size, r"^Size.*?:"),
        (LineField::SpanDepth, r"^Span Depth.*?:"),
        (LineField::SpanHeader, r"^Span: [0-9]+ - Number of PDs:"),
        (LineField::State, r"^State.*?:"),
        (LineField::StripSize, r"^Strip Size.*?:"),
        (LineField::DrivesPerSpan, r"^Number Of Drives per span.*:"),
        (LineField::CurrentCachePolicy, r"^Current Cache Policy.*?:"),
        (LineField::DiskCachePolicy, r"^Disk Cache Policy.*?:"),
        (LineField::CacheCadeType, r"^Cache Cade Type\s*:"),
        (LineField::TargetIdAssociation, r"^Target Id of the Associated LDs\s*:"),
        (LineField::OngoingProgress, r"^Ongoing Progresses.*?:"),
        (LineField::EnclosureId, r"^Enclosure Device ID: "),
        (LineField::CoercedSize, r"^Coerced Size: "),
        (LineField::DriveGroupPosition, r"^Drive.s posi*tion: DiskGroup: [0-9]+,"),
        (LineField::PdHeader, r"^PD: [0-9]+ Information"),
        (LineField::DeviceId, r"^Device Id: "),
        (LineField::SlotNumber, r"^Slot Number: "),
        (LineField::FirmwareState, r"^Firmware state: "),
        (LineField::InquiryData, r"^Inquiry Data: "),
        (LineField::MediaType, r"^Media Type: "),
        (LineField::DeviceSpeed, r"^Device Speed: "),
        (LineField::DriveTemperature, r"^Drive Temperature :"),
        (LineField::BusNumber, r"^Bus Number.*:"),
        (LineField::DeviceNumber, r"^Device Number.*:"),
        (LineField::FunctionNumber, r"^Function Number.*:"),
        (LineField::PhysicalDriveCount, r"^Number of Physical Drives on Adapter.*:"),
        (LineField::RebuildProgress, r"^Rebuild Progress on Device at Enclosure.*, Slot .* Completed "),
    ]
    .into_iter()
    .map(|(field, pattern)| (field, Regex::new(pattern).unwrap()))
    .collect();
}

/// Classify one line of MegaCLI output
///
/// The value is the text after the first `:` for `field: value` lines; for
/// header-style fields that carry their data inline (PD header, rebuild
/// progress, missing drive notices) and for unmatched lines it is the whole
/// trimmed line.
pub fn classify(line: &str) -> ClassifiedLine<'_> {
    let trimmed = line.trim();
    for (field, pattern) in PATTERNS.iter() {
        if pattern.is_match(trimmed) {
            let value = match field {
                LineField::PdHeader
                | LineField::RebuildProgress
                | LineField::MissingLogicalDrive
                | LineField::VirtualDriveHeader
                | LineField::SpanHeader
                | LineField::DriveGroupPosition => trimmed,
                _ => field_value(trimmed),
            };
            return ClassifiedLine {
                field: *field,
                value,
            };
        }
    }

    ClassifiedLine {
        field: LineField::NoneOfTheAbove,
        value: trimmed,
    }
}

/// Classify every line of a block of output, dropping unmatched lines
pub fn classify_lines<'a, I>(lines: I) -> impl Iterator<Item = ClassifiedLine<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .map(classify)
        .filter(|c| c.field != LineField::NoneOfTheAbove)
}
