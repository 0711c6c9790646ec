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

//! Logical (virtual) drive parsing functions

use super::classifier::{classify, LineField};
use super::common::normalize_size;
use crate::domain::{
    CacheCadeInfo, DiskCachePolicy, InProgress, LogicalDrive, ParseError, NOT_AVAILABLE,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TARGET_ID_RE: Regex = Regex::new(r"Target Id: (\d+)").unwrap();
}

/// Fields that decide the RAID type; they survive a header reset
#[derive(Debug, Default)]
struct RaidContext {
    level: Option<u32>,
    span_depth: u32,
    drives_per_span: u32,
}

/// Per-record accumulator, reset on every drive header
#[derive(Debug)]
struct LogicalDriveFields {
    target_id: String,
    size: String,
    strip_size: String,
    cache_policy: String,
    disk_cache: DiskCachePolicy,
    state: String,
    in_progress: InProgress,
    cachecade: Option<CacheCadeInfo>,
}

impl Default for LogicalDriveFields {
    fn default() -> Self {
        Self {
            target_id: String::new(),
            size: String::new(),
            strip_size: String::new(),
            cache_policy: String::new(),
            disk_cache: DiskCachePolicy::NotAvailable,
            state: NOT_AVAILABLE.to_string(),
            in_progress: InProgress::None,
            cachecade: None,
        }
    }
}

/// Parse `-LDInfo -l<ld> -a<controller>` output into a logical drive
///
/// `array_index` is the drive's position in the controller enumeration and
/// is carried through so disks can later look up the nesting flag.
///
/// # Errors
///
/// Returns [`ParseError`] when the size is reported in an unknown unit.
pub fn parse_logical_drive(
    controller_id: u32,
    ld_number: u32,
    array_index: usize,
    lines: &[&str],
) -> Result<LogicalDrive, ParseError> {
    let mut raid = RaidContext::default();
    let mut fields = LogicalDriveFields::default();

    for (index, line) in lines.iter().enumerate() {
        let classified = classify(line);
        let value = classified.value;

        match classified.field {
            LineField::VirtualDriveHeader => {
                fields = LogicalDriveFields {
                    target_id: parse_target_id(value).unwrap_or_default(),
                    ..LogicalDriveFields::default()
                };
            }
            LineField::RaidLevel => raid.level = parse_primary_raid_level(value),
            LineField::Size => fields.size = normalize_size(value)?,
            LineField::SpanDepth => raid.span_depth = value.parse().unwrap_or(0),
            LineField::State => fields.state = value.to_string(),
            LineField::StripSize => fields.strip_size = value.to_string(),
            LineField::DrivesPerSpan => raid.drives_per_span = value.parse().unwrap_or(0),
            LineField::CurrentCachePolicy => fields.cache_policy = cache_policy_tokens(value),
            LineField::DiskCachePolicy => fields.disk_cache = disk_cache_policy(value),
            // The progress text sits on the line after the marker
            LineField::OngoingProgress => {
                if let Some(next) = lines.get(index + 1) {
                    fields.in_progress = parse_progress_line(next);
                }
            }
            LineField::CacheCadeType => {
                fields.cachecade = Some(CacheCadeInfo::Type(value.to_string()));
            }
            LineField::TargetIdAssociation => {
                let associated = associated_drive_ids(controller_id, value);
                if !associated.is_empty() {
                    fields.cachecade = Some(CacheCadeInfo::Associated(associated));
                }
            }
            _ => {}
        }
    }

    let (raid_type, nested) =
        derive_raid_type(raid.level, raid.span_depth, raid.drives_per_span);

    Ok(LogicalDrive {
        id: format!("c{}u{}", controller_id, ld_number),
        controller_id,
        ld_number,
        array_index,
        target_id: fields.target_id,
        raid_type,
        nested,
        size: fields.size,
        strip_size: fields.strip_size,
        cache_policy: fields.cache_policy,
        disk_cache: fields.disk_cache,
        state: fields.state,
        in_progress: fields.in_progress,
        cachecade: fields.cachecade,
        device_path: NOT_AVAILABLE.to_string(),
    })
}

/// SCSI target id embedded in a drive header, `Virtual Drive: 0 (Target Id: 0)`
pub fn parse_target_id(header: &str) -> Option<String> {
    TARGET_ID_RE
        .captures(header)
        .map(|caps| caps[1].to_string())
}

/// Primary level of `Primary-5, Secondary-0, RAID Level Qualifier-3`
fn parse_primary_raid_level(value: &str) -> Option<u32> {
    value
        .split(',')
        .next()
        .and_then(|primary| primary.split('-').nth(1))
        .and_then(|level| level.trim().parse().ok())
}

/// Derive the RAID type string and nesting flag
///
/// # Examples
///
/// ```
/// use raid_report::domain::parsers::derive_raid_type;
///
/// assert_eq!(derive_raid_type(Some(1), 1, 4), ("RAID-10".to_string(), true));
/// assert_eq!(derive_raid_type(Some(5), 2, 3), ("RAID-50".to_string(), true));
/// assert_eq!(derive_raid_type(Some(6), 1, 2), ("RAID-6".to_string(), false));
/// assert_eq!(derive_raid_type(None, 2, 2), ("N/A".to_string(), false));
/// ```
pub fn derive_raid_type(level: Option<u32>, span_depth: u32, drives_per_span: u32) -> (String, bool) {
    match level {
        None => (NOT_AVAILABLE.to_string(), false),
        Some(level) if span_depth >= 2 => (format!("RAID-{}0", level), true),
        Some(1) if drives_per_span > 2 => ("RAID-10".to_string(), true),
        Some(level) => (format!("RAID-{}", level), false),
    }
}

/// Short cache policy tokens for a `Current Cache Policy` value
pub fn cache_policy_tokens(value: &str) -> String {
    let mut tokens = String::new();
    if value.contains("ReadAdaptive") {
        tokens.push_str("ADRA");
    }
    if value.contains("ReadAheadNone") {
        tokens.push_str("NORA");
    } else if value.contains("ReadAhead") {
        tokens.push_str("RA");
    }
    if value.contains("WriteBack") {
        tokens.push_str(",WB");
    }
    if value.contains("WriteThrough") {
        tokens.push_str(",WT");
    }
    tokens
}

/// Map a `Disk Cache Policy` value; the last matching rule wins
pub fn disk_cache_policy(value: &str) -> DiskCachePolicy {
    lazy_static! {
        static ref DISK_DEFAULT_RE: Regex = Regex::new(r"Disk.s Default").unwrap();
    }

    let mut policy = DiskCachePolicy::NotAvailable;
    if value.contains("Disabled") {
        policy = DiskCachePolicy::Disabled;
    }
    if DISK_DEFAULT_RE.is_match(value) {
        policy = DiskCachePolicy::Default;
    }
    if value.contains("Enabled") {
        policy = DiskCachePolicy::Enabled;
    }
    policy
}

/// Normalize the spacing of a progress line, `Label:  value` -> label/value
fn parse_progress_line(line: &str) -> InProgress {
    let mut parts = line.trim().split(':');
    let label = parts.next().unwrap_or("").trim();
    let value = parts.next().unwrap_or("").trim();
    InProgress::Operation {
        label: label.to_string(),
        value: value.to_string(),
    }
}

/// Map `0,1,x` to `c<ctl>u0, c<ctl>u1`; non-numeric ids are dropped
fn associated_drive_ids(controller_id: u32, value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|id| id.parse::<u32>().ok())
        .map(|id| format!("c{}u{}", controller_id, id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parsers::output_lines;

    const LD_RAID10: &str = r#"

Adapter 0 -- Virtual Drive Information:
Virtual Drive: 0 (Target Id: 0)
Name                :
RAID Level          : Primary-1, Secondary-0, RAID Level Qualifier-0
Size                : 1.090 TB
Sector Size         : 512
Mirror Data         : 1.090 TB
State               : Optimal
Strip Size          : 64 KB
Number Of Drives per span:2
Span Depth          : 2
Default Cache Policy: WriteBack, ReadAhead, Direct, No Write Cache if Bad BBU
Current Cache Policy: WriteBack, ReadAhead, Direct, No Write Cache if Bad BBU
Default Access Policy: Read/Write
Current Access Policy: Read/Write
Disk Cache Policy   : Disk's Default
Ongoing Progresses:
  Background Initialization: Completed 43%, Taken 26 min.
Encryption Type     : None
Is VD Cached: No


Exit Code: 0x00
"#;

    const LD_CACHECADE: &str = r#"
Adapter 0 -- Virtual Drive Information:
CacheCade Virtual Drive: 2 (Target Id: 2)
Virtual Disk Size   : 185.750 GB
Cache Cade Type : Read Only
Target Id of the Associated LDs : 0,1
Default Cache Policy: WriteThrough, ReadAheadNone, Direct, No Write Cache if Bad BBU
Current Cache Policy: WriteThrough, ReadAheadNone, Direct, No Write Cache if Bad BBU
"#;

    #[test]
    fn test_parse_nested_logical_drive() {
        let ld = parse_logical_drive(0, 0, 0, &output_lines(LD_RAID10)).unwrap();
        assert_eq!(ld.id, "c0u0");
        assert_eq!(ld.target_id, "0");
        assert_eq!(ld.raid_type, "RAID-10");
        assert!(ld.nested);
        assert_eq!(ld.size, "1090G");
        assert_eq!(ld.strip_size, "64 KB");
        assert_eq!(ld.state, "Optimal");
        assert_eq!(ld.cache_policy, "RA,WB");
        assert_eq!(ld.disk_cache, DiskCachePolicy::Default);
        assert_eq!(
            ld.in_progress.to_string(),
            "Background Initialization : Completed 43%, Taken 26 min."
        );
        assert_eq!(ld.cachecade_label(), "None");
        assert_eq!(ld.device_path, "N/A");
    }

    #[test]
    fn test_parse_cachecade_drive() {
        let ld = parse_logical_drive(0, 2, 2, &output_lines(LD_CACHECADE)).unwrap();
        assert_eq!(ld.target_id, "2");
        assert_eq!(ld.raid_type, "N/A");
        assert!(!ld.nested);
        assert_eq!(ld.cache_policy, "NORA,WT");
        assert_eq!(ld.in_progress, InProgress::None);
        assert_eq!(
            ld.cachecade,
            Some(CacheCadeInfo::Associated(vec!["c0u0".into(), "c0u1".into()]))
        );
    }

    #[test]
    fn test_parse_is_repeatable() {
        let lines = output_lines(LD_RAID10);
        assert_eq!(
            parse_logical_drive(1, 3, 1, &lines).unwrap(),
            parse_logical_drive(1, 3, 1, &lines).unwrap()
        );
    }

    #[test]
    fn test_missing_fields_use_sentinels() {
        let ld = parse_logical_drive(0, 5, 0, &["Virtual Drive: 5 (Target Id: 5)"]).unwrap();
        assert_eq!(ld.raid_type, "N/A");
        assert_eq!(ld.state, "N/A");
        assert_eq!(ld.disk_cache, DiskCachePolicy::NotAvailable);
        assert_eq!(ld.size, "");
    }

    #[test]
    fn test_unknown_size_unit_is_an_error() {
        let lines = ["Virtual Drive: 0 (Target Id: 0)", "Size                : 512 KB"];
        assert!(matches!(
            parse_logical_drive(0, 0, 0, &lines),
            Err(ParseError::UnrecognizedUnit(_))
        ));
    }

    #[test]
    fn test_derive_raid_type() {
        assert_eq!(derive_raid_type(Some(1), 1, 4), ("RAID-10".to_string(), true));
        assert_eq!(derive_raid_type(Some(1), 1, 2), ("RAID-1".to_string(), false));
        assert_eq!(derive_raid_type(Some(5), 2, 3), ("RAID-50".to_string(), true));
        assert_eq!(derive_raid_type(Some(6), 1, 2), ("RAID-6".to_string(), false));
        assert_eq!(derive_raid_type(Some(0), 0, 0), ("RAID-0".to_string(), false));
    }

    #[test]
    fn test_cache_policy_tokens() {
        assert_eq!(cache_policy_tokens("ReadAhead, WriteBack"), "RA,WB");
        assert_eq!(cache_policy_tokens("ReadAheadNone, WriteThrough"), "NORA,WT");
        assert_eq!(
            cache_policy_tokens("WriteBack, ReadAdaptive, Cached, No Write Cache if Bad BBU"),
            "ADRA,WB"
        );
        assert_eq!(cache_policy_tokens("Direct"), "");
    }

    #[test]
    fn test_disk_cache_policy() {
        assert_eq!(disk_cache_policy("Disabled"), DiskCachePolicy::Disabled);
        assert_eq!(disk_cache_policy("Disk's Default"), DiskCachePolicy::Default);
        assert_eq!(disk_cache_policy("Enabled"), DiskCachePolicy::Enabled);
        assert_eq!(disk_cache_policy("Unchanged"), DiskCachePolicy::NotAvailable);
    }

    #[test]
    fn test_associated_ids_drop_non_numeric() {
        assert_eq!(associated_drive_ids(1, "0, 3,x,"), vec!["c1u0", "c1u3"]);
        assert!(associated_drive_ids(1, "None").is_empty());
    }
}
