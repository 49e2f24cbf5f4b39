//! Decoding of raw device codes and vendor strings.
//!
//! Every function here is total: values outside a known enumeration map to a
//! fallback instead of an error.

use serde::{Deserialize, Serialize};

/// Printer state, merged from the three status enumerations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterState {
    Other,
    #[default]
    Unknown,
    Idle,
    Printing,
    Warmup,
    Running,
    Warning,
    Testing,
    Down,
}

impl PrinterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::Unknown => "unknown",
            Self::Idle => "idle",
            Self::Printing => "printing",
            Self::Warmup => "warmup",
            Self::Running => "running",
            Self::Warning => "warning",
            Self::Testing => "testing",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for PrinterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// hrPrinterStatus (HOST-RESOURCES-MIB).
pub fn generic_status(code: i64) -> PrinterState {
    match code {
        1 => PrinterState::Other,
        2 => PrinterState::Unknown,
        3 => PrinterState::Idle,
        4 => PrinterState::Printing,
        5 => PrinterState::Warmup,
        _ => PrinterState::Unknown,
    }
}

/// Vendor general status.
pub fn general_status(code: i64) -> PrinterState {
    match code {
        0 | 3 => PrinterState::Idle,
        4 => PrinterState::Printing,
        5 => PrinterState::Warmup,
        _ => PrinterState::Unknown,
    }
}

/// hrDeviceStatus (HOST-RESOURCES-MIB).
pub fn device_class_status(code: i64) -> PrinterState {
    match code {
        1 => PrinterState::Unknown,
        2 => PrinterState::Running,
        3 => PrinterState::Warning,
        4 => PrinterState::Testing,
        5 => PrinterState::Down,
        _ => PrinterState::Unknown,
    }
}

/// Error bits, in ascending bit order: (bit, paper status name, description).
pub const ERROR_BITS: [(u32, &str, &str); 6] = [
    (0, "paper_out", "Paper out"),
    (1, "paper_jam", "Paper jam"),
    (2, "toner_low", "Toner low"),
    (3, "door_open", "Door open"),
    (4, "toner_empty", "Toner empty"),
    (5, "service_required", "Service required"),
];

fn bit_set(code: i64, bit: u32) -> bool {
    code & (1i64 << bit) != 0
}

/// Describe an error bitmask as a comma-joined list of reasons.
pub fn describe_error_state(code: i64) -> String {
    if code == 0 {
        return "No errors".to_string();
    }

    let reasons: Vec<&str> = ERROR_BITS
        .iter()
        .filter(|(bit, _, _)| bit_set(code, *bit))
        .map(|(_, _, description)| *description)
        .collect();

    if reasons.is_empty() {
        format!("Unknown error (code: {})", code)
    } else {
        reasons.join(", ")
    }
}

/// Derive the paper status from an error bitmask.
///
/// Only paper out, paper jam and toner low are named, in that priority.
pub fn paper_status(code: i64) -> &'static str {
    if code == 0 {
        return "ok";
    }
    ERROR_BITS[..3]
        .iter()
        .find(|(bit, _, _)| bit_set(code, *bit))
        .map(|(_, name, _)| *name)
        .unwrap_or("error")
}

/// Parse a `KEY:value;KEY:value;` capability descriptor into trimmed pairs.
///
/// Segments without a colon or with an empty key are skipped.
pub fn parse_capabilities(descriptor: &str) -> Vec<(String, String)> {
    descriptor
        .split(';')
        .filter_map(|segment| {
            let (key, value) = segment.split_once(':')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Extract the model from the `MDL:` key of a capability descriptor.
pub fn extract_model(descriptor: &str) -> Option<String> {
    let (_, rest) = descriptor.split_once("MDL:")?;
    let model = rest.split(';').next().unwrap_or_default().trim();
    (!model.is_empty()).then(|| model.to_string())
}

/// Parse vendor maintenance text made of `KEY="value"` assignments.
///
/// Assignments may be separated by whitespace, `;` or `,`. Values may contain
/// separators; an unterminated quote ends the input.
pub fn parse_maintenance(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = text;

    while let Some((key_part, after_eq)) = rest.split_once('=') {
        let key = key_part
            .rsplit(|c: char| c.is_whitespace() || c == ';' || c == ',')
            .next()
            .unwrap_or_default()
            .trim();

        let Some(quoted) = after_eq.strip_prefix('"') else {
            rest = after_eq;
            continue;
        };
        let Some((value, after_value)) = quoted.split_once('"') else {
            break;
        };

        if !key.is_empty() {
            pairs.push((key.to_string(), value.trim().to_string()));
        }
        rest = after_value;
    }

    pairs
}

/// Name of a prtMarkerCounterUnit code.
pub fn counter_unit_name(code: i64) -> Option<&'static str> {
    match code {
        3 => Some("ten-thousandths of inches"),
        4 => Some("micrometers"),
        5 => Some("characters"),
        6 => Some("lines"),
        7 => Some("impressions"),
        8 => Some("sheets"),
        9 => Some("dot rows"),
        11 => Some("hours"),
        16 => Some("feet"),
        17 => Some("meters"),
        _ => None,
    }
}

/// Availability part (bits 0-2) of a Printer-MIB sub-unit status.
pub fn tray_availability(status: i64) -> &'static str {
    match status & 0b111 {
        0 => "available (idle)",
        1 => "unavailable (on request)",
        2 => "available (standby)",
        3 => "unavailable (broken)",
        4 => "available (active)",
        5 => "unknown",
        6 => "available (busy)",
        _ => "unknown",
    }
}
