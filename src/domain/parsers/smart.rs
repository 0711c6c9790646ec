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

//! smartctl output parsing functions

use super::common::{collapse_whitespace, leading_number};
use crate::domain::{Device, SmartAttribute};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref DEVICE_INFO_RE: Regex =
        Regex::new(r"^(?P<k>[^:]+?)(?:(?:\sis|):)\s*(?P<v>.*)$").unwrap();
    static ref HEALTH_PASSED_RE: Regex = Regex::new(r"(?m)^SMART.*(PASSED|OK)$").unwrap();
    static ref ERROR_COUNT_RE: Regex = Regex::new(r"(?m)^Error (\d+) \[\d+\] occurred").unwrap();
}

/// Device type used when a scan line selects none
pub const DEFAULT_DEVICE_TYPE: &str = "auto";

/// Identification keys reported as `device_info` labels
pub const DEVICE_INFO_LABELS: &[(&str, &str)] = &[
    ("Vendor", "vendor"),
    ("Product", "product"),
    ("Revision", "revision"),
    ("Logical Unit id", "lun_id"),
    ("Model Family", "model_family"),
    ("Device Model", "device_model"),
    ("Serial Number", "serial_number"),
    ("Firmware Version", "firmware_version"),
];

/// SMART attributes worth exporting
pub const SMART_ATTRIBUTE_WHITELIST: &[&str] = &[
    "airflow_temperature_cel",
    "command_timeout",
    "current_pending_sector",
    "end_to_end_error",
    "erase_fail_count_total",
    "g_sense_error_rate",
    "hardware_ecc_recovered",
    "host_reads_mib",
    "host_reads_32mib",
    "host_writes_mib",
    "host_writes_32mib",
    "load_cycle_count",
    "media_wearout_indicator",
    "wear_leveling_count",
    "nand_writes_1gib",
    "offline_uncorrectable",
    "power_cycle_count",
    "power_on_hours",
    "program_fail_count",
    "raw_read_error_rate",
    "reallocated_event_count",
    "reallocated_sector_ct",
    "reported_uncorrect",
    "sata_downshift_count",
    "seek_error_rate",
    "spin_retry_count",
    "spin_up_time",
    "start_stop_count",
    "temperature_case",
    "temperature_celsius",
    "temperature_internal",
    "total_lbas_read",
    "total_lbas_written",
    "udma_crc_error_count",
    "unsafe_shutdown_count",
    "workld_host_reads_perc",
    "workld_media_wear_indic",
    "workload_minutes",
];

/// Version from the first line of `smartctl -V`
pub fn parse_smartctl_version(output: &str) -> Option<String> {
    output
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
}

/// Parse `smartctl --scan-open` into devices
///
/// Each line is `<path> [-d <type>] [# comment]`. Lines without a path are
/// skipped and a missing type falls back to [`DEFAULT_DEVICE_TYPE`].
pub fn parse_scan_open(output: &str) -> Vec<Device> {
    output
        .lines()
        .filter_map(|line| {
            let content = line.split('#').next().unwrap_or("");
            let tokens: Vec<&str> = content.split_whitespace().collect();
            let path = tokens.first()?;

            let mut device_type = DEFAULT_DEVICE_TYPE;
            let mut rest = tokens[1..].iter();
            while let Some(token) = rest.next() {
                match *token {
                    "-d" | "--device" => {
                        if let Some(&value) = rest.next() {
                            device_type = value;
                        }
                    }
                    other => {
                        if let Some(value) = other.strip_prefix("--device=") {
                            device_type = value;
                        }
                    }
                }
            }

            Some(Device::new(path, device_type))
        })
        .collect()
}

/// Key/value pairs of `smartctl --info`
///
/// The banner (first three lines) is skipped. Keys end at `:` or ` is:`.
pub fn parse_device_info(output: &str) -> Vec<(String, String)> {
    output
        .trim()
        .lines()
        .skip(3)
        .filter_map(|line| DEVICE_INFO_RE.captures(line))
        .map(|caps| (caps["k"].to_string(), caps["v"].to_string()))
        .collect()
}

/// `device_info` labels from `--info` pairs, by [`DEVICE_INFO_LABELS`]
pub fn device_info_labels(info: &[(String, String)]) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    for (key, value) in info {
        if let Some((_, label)) = DEVICE_INFO_LABELS.iter().find(|(k, _)| k == key) {
            labels.insert(label.to_string(), value.clone());
        }
    }
    labels
}

/// SMART `(available, enabled)` from the `SMART support` info lines
pub fn parse_smart_capabilities(info: &[(String, String)]) -> (bool, bool) {
    let states: Vec<&str> = info
        .iter()
        .filter(|(key, _)| key == "SMART support")
        .filter_map(|(_, value)| value.split(' ').next())
        .collect();

    (states.contains(&"Available"), states.contains(&"Enabled"))
}

/// Whether `smartctl --health` reports a passed self-assessment
pub fn parse_health_passed(output: &str) -> bool {
    HEALTH_PASSED_RE.is_match(output)
}

/// Parse the attribute table of `smartctl --attributes`
///
/// Rows are `ID NAME FLAG VALUE WORST THRESH TYPE UPDATED WHEN_FAILED RAW...`
/// once whitespace runs are collapsed. Rows whose names are not whitelisted
/// or whose raw value has no leading number are dropped.
pub fn parse_attributes(output: &str) -> Vec<SmartAttribute> {
    output
        .lines()
        .filter_map(|line| {
            let line = collapse_whitespace(line);
            let tokens: Vec<&str> = line.split(' ').collect();
            if tokens.len() < 10 {
                return None;
            }
            let id: u32 = tokens[0].parse().ok()?;
            let name = tokens[1].to_lowercase();
            if !SMART_ATTRIBUTE_WHITELIST.contains(&name.as_str()) {
                return None;
            }
            let raw_value = leading_number(&tokens[9..].join(" "))?;

            Some(SmartAttribute {
                id,
                name,
                flag: tokens[2].to_string(),
                value: tokens[3].parse().ok()?,
                worst: tokens[4].parse().ok()?,
                threshold: tokens[5].parse().ok()?,
                type_: tokens[6].to_string(),
                updated: tokens[7].to_string(),
                when_failed: tokens[8].to_string(),
                raw_value,
            })
        })
        .collect()
}

/// Error count from `smartctl -l xerror,1`, 0 when no entry is logged
pub fn parse_error_count(output: &str) -> u64 {
    ERROR_COUNT_RE
        .captures(output)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO: &str = r#"smartctl 7.2 2020-12-30 r5155 [x86_64-linux-5.15.0-91-generic] (local build)
Copyright (C) 2002-20, Bruce Allen, Christian Franke, www.smartmontools.org

=== START OF INFORMATION SECTION ===
Model Family:     Seagate Exos 7E8
Device Model:     ST2000NM0055-1V4104
Serial Number:    ZC20ABCD
LU WWN Device Id: 5 000c50 0a1b2c3d4
Firmware Version: SN04
User Capacity:    2,000,398,934,016 bytes [2.00 TB]
Sector Sizes:     512 bytes logical, 4096 bytes physical
Rotation Rate:    7200 rpm
SMART support is: Available - device has SMART capability.
SMART support is: Enabled
"#;

    const ATTRIBUTES: &str = r#"smartctl 7.2 2020-12-30 r5155 [x86_64-linux-5.15.0-91-generic] (local build)
Copyright (C) 2002-20, Bruce Allen, Christian Franke, www.smartmontools.org

=== START OF READ SMART DATA SECTION ===
SMART Attributes Data Structure revision number: 10
Vendor Specific SMART Attributes with Thresholds:
ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
  1 Raw_Read_Error_Rate     0x000f   083   064   044    Pre-fail  Always       -       204269296
  5 Reallocated_Sector_Ct   0x0033   100   100   010    Pre-fail  Always       -       0
  7 Seek_Error_Rate         0x000f   087   060   045    Pre-fail  Always       -       522375218
 10 Spin_Retry_Count        0x0013   100   100   097    Pre-fail  Always       -       0
188 Command_Timeout         0x0032   100   100   000    Old_age   Always       -       0 0 0
190 Unknown_Attribute_Xyz   0x0022   064   045   040    Old_age   Always       -       36
194 Temperature_Celsius     0x0022   036   055   000    Old_age   Always       -       36 (0 19 0 0 0)
195 Hardware_ECC_Recovered  0x001a   006   001   000    Old_age   Always       -       -
"#;

    #[test]
    fn test_parse_smartctl_version() {
        assert_eq!(parse_smartctl_version(INFO), Some("7.2".to_string()));
        assert_eq!(parse_smartctl_version(""), None);
    }

    #[test]
    fn test_parse_scan_open() {
        let output = "/dev/sda -d scsi # /dev/sda, SCSI device\n/dev/bus/0 -d megaraid,4 # /dev/bus/0 [megaraid_disk_04], SCSI device\n/dev/nvme0 --device=nvme # /dev/nvme0, NVMe device\n# /dev/sdb -d sat, opened FAILED\n/dev/sdc\n\n";
        let devices = parse_scan_open(output);
        assert_eq!(
            devices,
            vec![
                Device::new("/dev/sda", "scsi"),
                Device::new("/dev/bus/0", "megaraid,4"),
                Device::new("/dev/nvme0", "nvme"),
                Device::new("/dev/sdc", "auto"),
            ]
        );
    }

    #[test]
    fn test_parse_device_info_and_labels() {
        let info = parse_device_info(INFO);
        assert!(info.contains(&("Model Family".to_string(), "Seagate Exos 7E8".to_string())));

        let labels = device_info_labels(&info);
        assert_eq!(labels.get("device_model").map(String::as_str), Some("ST2000NM0055-1V4104"));
        assert_eq!(labels.get("serial_number").map(String::as_str), Some("ZC20ABCD"));
        assert_eq!(labels.get("firmware_version").map(String::as_str), Some("SN04"));
        assert!(!labels.contains_key("vendor"));
    }

    #[test]
    fn test_parse_smart_capabilities() {
        assert_eq!(parse_smart_capabilities(&parse_device_info(INFO)), (true, true));

        let unavailable = INFO.replace(
            "SMART support is: Available - device has SMART capability.\nSMART support is: Enabled\n",
            "SMART support is: Unavailable - device lacks SMART capability.\n",
        );
        assert_eq!(parse_smart_capabilities(&parse_device_info(&unavailable)), (false, false));
    }

    #[test]
    fn test_parse_health_passed() {
        assert!(parse_health_passed(
            "=== START OF READ SMART DATA SECTION ===\nSMART overall-health self-assessment test result: PASSED\n"
        ));
        assert!(parse_health_passed("SMART Health Status: OK\n"));
        assert!(!parse_health_passed(
            "SMART overall-health self-assessment test result: FAILED!\n"
        ));
    }

    #[test]
    fn test_parse_attributes_filters_whitelist() {
        let attributes = parse_attributes(ATTRIBUTES);
        let names: Vec<&str> = attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "raw_read_error_rate",
                "reallocated_sector_ct",
                "seek_error_rate",
                "spin_retry_count",
                "command_timeout",
                "temperature_celsius",
            ]
        );

        let temperature = &attributes[5];
        assert_eq!(temperature.id, 194);
        assert_eq!(temperature.value, 36);
        assert_eq!(temperature.worst, 55);
        assert_eq!(temperature.threshold, 0);
        assert_eq!(temperature.type_, "Old_age");
        assert_eq!(temperature.raw_value, 36);
    }

    #[test]
    fn test_parse_error_count() {
        let log = "SMART Extended Comprehensive Error Log Version: 1 (6 sectors)\nDevice Error Count: 3\n\nError 3 [2] occurred at disk power-on lifetime: 1234 hours\n";
        assert_eq!(parse_error_count(log), 3);
        assert_eq!(parse_error_count("No Errors Logged\n"), 0);
    }
}
