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

//! Common parsing utilities and helper functions

use crate::domain::ParseError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref WHITESPACE_RUN_RE: Regex = Regex::new(r"[\t ]+").unwrap();
    pub static ref LEADING_NUMBER_RE: Regex = Regex::new(r"^(\d+)").unwrap();
    pub static ref PARENTHETICAL_RE: Regex = Regex::new(r"\s*\(.*\)").unwrap();
}

/// Split raw command output into lines
///
/// Leading and trailing blank lines are dropped, as the tools pad their
/// output with them.
pub fn output_lines(output: &str) -> Vec<&str> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.lines().collect()
}

/// Text after the first `:` of a line, trimmed
///
/// Returns an empty string when the line has no separator.
pub fn field_value(line: &str) -> &str {
    match line.find(':') {
        Some(pos) => line[pos + 1..].trim(),
        None => "",
    }
}

/// Text between the first and second `:` of a line, trimmed
///
/// Matches how MegaCLI values that embed another colon are reported
/// (`Drive's position: DiskGroup: 0, Span: 0, Arm: 1`).
pub fn first_field_value(line: &str) -> &str {
    line.split(':').nth(1).map(str::trim).unwrap_or("")
}

/// First whitespace-separated token of a value
pub fn first_token(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or("")
}

/// Collapse runs of spaces and tabs into single spaces
pub fn collapse_whitespace(value: &str) -> String {
    WHITESPACE_RUN_RE.replace_all(value.trim(), " ").into_owned()
}

/// Remove a trailing parenthetical qualifier, e.g. `36C (96.80 F)` -> `36C`
pub fn strip_parenthetical(value: &str) -> String {
    PARENTHETICAL_RE.replace(value, "").trim().to_string()
}

/// Leading decimal digits of a value, e.g. `36 (Min/Max 24/40)` -> `36`
pub fn leading_number(value: &str) -> Option<u64> {
    LEADING_NUMBER_RE
        .captures(value.trim())
        .and_then(|caps| caps[1].parse().ok())
}

/// Round half-up to the nearest integer
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Normalize a MegaCLI size to `<n>G` or `<n>M`
///
/// * `MB` above 1000 becomes gigabytes, otherwise stays megabytes
/// * `TB` is multiplied by 1000 into gigabytes
/// * `GB` or a bare number is taken as gigabytes
///
/// Any other unit is rejected.
///
/// # Examples
///
/// ```
/// use raid_report::domain::parsers::normalize_size;
///
/// assert_eq!(normalize_size("2500 MB").unwrap(), "3G");
/// assert_eq!(normalize_size("512 MB").unwrap(), "512M");
/// assert_eq!(normalize_size("2 TB").unwrap(), "2000G");
/// assert!(normalize_size("300 KB").is_err());
/// ```
pub fn normalize_size(raw: &str) -> Result<String, ParseError> {
    let raw = raw.trim();
    let (number, unit) = match raw.find(|c: char| c.is_ascii_alphabetic()) {
        Some(pos) => (raw[..pos].trim(), raw[pos..].trim()),
        None => (raw, ""),
    };

    let value: f64 = number
        .parse()
        .map_err(|_| ParseError::InvalidNumber(raw.to_string()))?;

    match unit {
        "MB" if value > 1000.0 => Ok(format!("{}G", round_half_up(value / 1000.0))),
        "MB" => Ok(format!("{}M", round_half_up(value))),
        "TB" => Ok(format!("{}G", round_half_up(value * 1000.0))),
        "GB" | "" => Ok(format!("{}G", round_half_up(value))),
        _ => Err(ParseError::UnrecognizedUnit(raw.to_string())),
    }
}
