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

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Sentinel used for any field the external tool never reported
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel used for disk fields that are reset between records
pub const UNKNOWN: &str = "Unknown";

/// Represents the full storage inventory of one host (root aggregate)
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Inventory {
    /// MegaCLI version string, if the tool answered
    pub megacli_version: Option<String>,
    /// Controllers in discovery order
    pub controllers: Vec<ControllerSummary>,
    /// Logical drives keyed by controller id
    #[serde(with = "controller_keyed")]
    pub logical_drives: BTreeMap<u32, Vec<LogicalDrive>>,
    /// Physical disks that belong to a logical drive
    pub configured_disks: Vec<PhysicalDisk>,
    /// Physical disks that are unconfigured, hot spares or JBOD
    pub unconfigured_disks: Vec<PhysicalDisk>,
    /// Running drive tallies
    pub tallies: DriveTallies,
    /// Collection failures, kept distinct from legitimately empty results
    pub errors: Vec<CollectionError>,
}

impl Inventory {
    /// All logical drives in controller order
    pub fn all_logical_drives(&self) -> impl Iterator<Item = &LogicalDrive> {
        self.logical_drives.values().flatten()
    }
}

/// Serializes controller-keyed maps with string keys, as TOML requires
mod controller_keyed {
    use super::LogicalDrive;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<u32, Vec<LogicalDrive>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        map.iter()
            .map(|(id, drives)| (id.to_string(), drives))
            .collect::<BTreeMap<String, &Vec<LogicalDrive>>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u32, Vec<LogicalDrive>>, D::Error> {
        BTreeMap::<String, Vec<LogicalDrive>>::deserialize(deserializer)?
            .into_iter()
            .map(|(id, drives)| Ok((id.parse().map_err(D::Error::custom)?, drives)))
            .collect()
    }
}

/// Cross-controller drive counts
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DriveTallies {
    /// Drives reported by the controllers
    pub total: u32,
    /// Drives that belong to a logical drive
    pub configured: u32,
    /// Unconfigured and hot spare drives, reconciled against the totals
    pub unconfigured: u32,
    /// Drives in a healthy firmware state
    pub good: u32,
    /// Drives in any other firmware state
    pub bad: u32,
}

/// Identifies a physical disk for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiskKey {
    pub controller_id: u32,
    pub enclosure_id: String,
    pub slot_id: String,
}

impl DiskKey {
    pub fn new(controller_id: u32, enclosure_id: &str, slot_id: &str) -> Self {
        Self {
            controller_id,
            enclosure_id: enclosure_id.to_string(),
            slot_id: slot_id.to_string(),
        }
    }
}

/// Good/bad disk accounting keyed by controller, enclosure and slot
#[derive(Debug, Clone, Default)]
pub struct DiskHealthLedger {
    good: HashSet<DiskKey>,
    bad: HashSet<DiskKey>,
}

impl DiskHealthLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation; returns false when the disk was already counted
    pub fn record(&mut self, key: DiskKey, healthy: bool) -> bool {
        if healthy {
            self.good.insert(key)
        } else {
            self.bad.insert(key)
        }
    }

    pub fn good(&self) -> u32 {
        self.good.len() as u32
    }

    pub fn bad(&self) -> u32 {
        self.bad.len() as u32
    }
}

/// Nesting flags keyed by `(controller_id, array_index)`
///
/// A logical drive is nested (RAID-10/50/60) when its span depth is at least
/// two, or when it is a RAID-1 with more than two drives per span.
#[derive(Debug, Clone, Default)]
pub struct NestedArrayTable {
    flags: HashMap<(u32, usize), bool>,
}

impl NestedArrayTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, controller_id: u32, array_index: usize, nested: bool) {
        self.flags.insert((controller_id, array_index), nested);
    }

    /// Unknown arrays are treated as flat
    pub fn is_nested(&self, controller_id: u32, array_index: usize) -> bool {
        self.flags
            .get(&(controller_id, array_index))
            .copied()
            .unwrap_or(false)
    }
}

/// Battery backup unit status
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum BbuStatus {
    Absent,
    Present,
    Good,
    Replace,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl BbuStatus {
    /// Map the first token of a `BBU :` line
    pub fn from_presence(token: &str) -> Self {
        match token {
            "Present" => BbuStatus::Present,
            "Absent" => BbuStatus::Absent,
            _ => BbuStatus::NotAvailable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BbuStatus::Absent => "Absent",
            BbuStatus::Present => "Present",
            BbuStatus::Good => "Good",
            BbuStatus::Replace => "Replace",
            BbuStatus::NotAvailable => NOT_AVAILABLE,
        }
    }
}

impl fmt::Display for BbuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One RAID controller (HBA)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ControllerSummary {
    /// Controller ordinal, 0-based
    pub id: u32,
    /// Product name
    pub model: String,
    /// Cache memory size, vendor units preserved
    pub memory_size: String,
    /// FW package build
    pub firmware: String,
    /// ROC temperature (`<n>C` or `N/A`)
    pub roc_temperature: String,
    /// Battery backup unit status
    pub bbu: BbuStatus,
    /// PCI address used for device path resolution
    pub pci_address: Option<PciAddress>,
}

impl ControllerSummary {
    pub fn label(&self) -> String {
        format!("c{}", self.id)
    }
}

/// PCI bus/device/function of a controller
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PciAddress {
    pub bus: String,
    pub device: String,
    pub function: String,
}

impl PciAddress {
    /// Build an address, zero-padding bus and device to two digits and the
    /// function to one
    pub fn new(bus: &str, device: &str, function: &str) -> Self {
        Self {
            bus: format!("{:0>2}", bus.trim()),
            device: format!("{:0>2}", device.trim()),
            function: format!("{:0>1}", function.trim()),
        }
    }

    /// `pci-0000:<bus>:<dev>.<fn>-scsi-0:`
    pub fn by_path_prefix(&self) -> String {
        format!(
            "pci-0000:{}:{}.{}-scsi-0:",
            self.bus, self.device, self.function
        )
    }
}

/// Disk cache policy of a logical drive
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiskCachePolicy {
    Disabled,
    Default,
    Enabled,
    #[default]
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl fmt::Display for DiskCachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiskCachePolicy::Disabled => "Disabled",
            DiskCachePolicy::Default => "Default",
            DiskCachePolicy::Enabled => "Enabled",
            DiskCachePolicy::NotAvailable => NOT_AVAILABLE,
        };
        f.write_str(s)
    }
}

/// Background operation running on a logical drive
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub enum InProgress {
    #[default]
    None,
    Operation { label: String, value: String },
}

impl fmt::Display for InProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InProgress::None => f.write_str("None"),
            InProgress::Operation { label, value } => write!(f, "{} : {}", label, value),
        }
    }
}

/// CacheCade details of a logical drive
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum CacheCadeInfo {
    /// `Cache Cade Type` of a CacheCade volume
    Type(String),
    /// Logical drives accelerated by this CacheCade volume, as `c<ctl>u<id>`
    Associated(Vec<String>),
}

impl fmt::Display for CacheCadeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheCadeInfo::Type(kind) => write!(f, "Type : {}", kind),
            CacheCadeInfo::Associated(ids) => write!(f, "Associated : {}", ids.join(", ")),
        }
    }
}

/// One logical (virtual) drive
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LogicalDrive {
    /// `c<controller>u<ld>`
    pub id: String,
    pub controller_id: u32,
    /// MegaCLI logical drive number
    pub ld_number: u32,
    /// Position in the controller's enumeration order
    pub array_index: usize,
    /// SCSI target id from the header line
    pub target_id: String,
    /// `RAID-<n>`, `RAID-<n>0` or `N/A`
    pub raid_type: String,
    /// Whether the drive is a nested (spanned) array
    pub nested: bool,
    /// Normalized size (`<n>G` / `<n>M`)
    pub size: String,
    pub strip_size: String,
    /// Cache policy tokens, e.g. `RA,WB`
    pub cache_policy: String,
    pub disk_cache: DiskCachePolicy,
    pub state: String,
    pub in_progress: InProgress,
    pub cachecade: Option<CacheCadeInfo>,
    /// Resolved OS device path, `N/A` when unresolved
    pub device_path: String,
}

impl LogicalDrive {
    pub fn cachecade_label(&self) -> String {
        self.cachecade
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "None".to_string())
    }
}

/// Logical drive a physical disk belongs to
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum ArrayMembership {
    /// Array reference, `c<ctl>u<ld>` or `c<ctl>u<ld>s<span>` for nested arrays
    Array(String),
    Unconfigured,
}

impl fmt::Display for ArrayMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayMembership::Array(id) => f.write_str(id),
            ArrayMembership::Unconfigured => f.write_str("unconfigured"),
        }
    }
}

/// Physical disk media type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[serde(rename = "HDD")]
    Hdd,
    #[serde(rename = "SSD")]
    Ssd,
    #[default]
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl MediaType {
    /// Exact-match map of MegaCLI's `Media Type` values
    pub fn from_megacli(value: &str) -> Self {
        match value {
            "Hard Disk Device" => MediaType::Hdd,
            "Solid State Device" => MediaType::Ssd,
            _ => MediaType::NotAvailable,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaType::Hdd => "HDD",
            MediaType::Ssd => "SSD",
            MediaType::NotAvailable => NOT_AVAILABLE,
        };
        f.write_str(s)
    }
}

/// Manufacturer, model and serial split out of an inquiry string
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct InquiryData {
    /// Whitespace-collapsed inquiry string
    pub raw: String,
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
}

/// One physical disk behind a controller
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PhysicalDisk {
    pub controller_id: u32,
    pub membership: ArrayMembership,
    /// `PD: <n>` position in the array listing
    pub disk_id: String,
    /// Controller device id
    pub device_id: String,
    pub media_type: MediaType,
    pub inquiry: InquiryData,
    /// Normalized coerced size
    pub size: String,
    /// Firmware state, e.g. `Online, Spun Up` or `Rebuilding (45%)`
    pub state: String,
    pub speed: String,
    pub temperature: String,
    pub enclosure_id: String,
    pub slot_id: String,
    /// Resolved OS device path, `N/A` when unresolved
    pub device_path: String,
}

impl PhysicalDisk {
    pub fn key(&self) -> DiskKey {
        DiskKey::new(self.controller_id, &self.enclosure_id, &self.slot_id)
    }

    /// Firmware state without its parenthetical qualifier
    pub fn base_state(&self) -> &str {
        match self.state.find('(') {
            Some(pos) => self.state[..pos].trim(),
            None => self.state.trim(),
        }
    }

    /// Whether a rebuild-progress query is required for this disk
    pub fn needs_rebuild_progress(&self) -> bool {
        self.base_state() == "Rebuild"
    }

    pub fn set_rebuild_progress(&mut self, percent: u32) {
        self.state = format!("Rebuilding ({}%)", percent);
    }
}

/// Subject of SMART health queries, as found by `smartctl --scan-open`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Device {
    /// Device node, e.g. `/dev/sda` or `/dev/bus/0`
    pub path: String,
    /// smartctl device type selector, e.g. `sat` or `megaraid,4`
    pub device_type: String,
}

impl Device {
    pub fn new(path: &str, device_type: &str) -> Self {
        Self {
            path: path.to_string(),
            device_type: device_type.to_string(),
        }
    }

    pub fn base_labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert("disk".to_string(), self.path.clone());
        labels.insert("type".to_string(), self.device_type.clone());
        labels
    }

    /// `--device <type> <path>`
    pub fn select_args(&self) -> Vec<String> {
        vec![
            "--device".to_string(),
            self.device_type.clone(),
            self.path.clone(),
        ]
    }

    pub fn is_ata(&self) -> bool {
        self.device_type.starts_with("sat")
    }
}

/// One row of the SMART attribute table
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SmartAttribute {
    pub id: u32,
    /// Lowercased attribute name
    pub name: String,
    pub flag: String,
    pub value: u32,
    pub worst: u32,
    pub threshold: u32,
    pub type_: String,
    pub updated: String,
    pub when_failed: String,
    /// Leading number of the raw value column
    pub raw_value: u64,
}

/// A metrics record: name, label set and value
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

impl Metric {
    pub fn new(name: &str, labels: BTreeMap<String, String>, value: f64) -> Self {
        Self {
            name: name.to_string(),
            labels,
            value,
        }
    }

    pub fn flag(name: &str, labels: BTreeMap<String, String>, value: bool) -> Self {
        Self::new(name, labels, if value { 1.0 } else { 0.0 })
    }
}

/// SMART health collected from `smartctl`
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SmartReport {
    /// smartctl version, e.g. `7.2`
    pub smartctl_version: Option<String>,
    /// Devices found by `--scan-open`
    pub devices: Vec<Device>,
    /// Per-device metrics in collection order
    pub metrics: Vec<Metric>,
    pub errors: Vec<CollectionError>,
}

/// Everything one collection run produced
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct StorageReport {
    pub inventory: Inventory,
    pub smart: SmartReport,
    /// Seconds since the epoch when collection started
    pub collected_at: u64,
}

impl StorageReport {
    /// Collection errors from both collectors
    pub fn errors(&self) -> impl Iterator<Item = &CollectionError> {
        self.inventory.errors.iter().chain(self.smart.errors.iter())
    }
}

/// A failed collection step
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CollectionError {
    /// `c<id>` for a controller, a device path for SMART queries, `host` otherwise
    pub scope: String,
    /// Command line that failed
    pub command: String,
    pub message: String,
}

/// Configuration for inventory collection
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Path of the MegaCLI binary
    pub megacli_path: String,
    /// Path of the smartctl binary
    pub smartctl_path: String,
    /// Timeout for each external command, in seconds
    pub command_timeout: u64,
    /// Retries for commands that could not be run
    pub retry_count: u32,
    /// Root of the by-path symlink farm
    pub by_path_root: String,
    /// Run the external tools through sudo
    pub use_sudo: bool,
    /// Collect MegaRAID inventory
    pub collect_megaraid: bool,
    /// Collect SMART health
    pub collect_smart: bool,
    /// Enable verbose output
    pub verbose: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            megacli_path: "/opt/MegaRAID/MegaCli/MegaCli64".to_string(),
            smartctl_path: "smartctl".to_string(),
            command_timeout: 30,
            retry_count: 0,
            by_path_root: "/dev/disk/by-path".to_string(),
            use_sudo: false,
            collect_megaraid: true,
            collect_smart: true,
            verbose: false,
        }
    }
}
