//! The aggregated per-device status record and its text rendering.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decode::{PrinterState, counter_unit_name, parse_capabilities, tray_availability};

/// Remaining amount of a consumable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyLevel {
    /// Computed percentage of max capacity.
    Percent(u8),
    /// The device reports the supply but not how much is left.
    Unknown,
    /// No usable data for this supply.
    #[default]
    NotApplicable,
}

impl fmt::Display for SupplyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplyLevel::Percent(p) => write!(f, "{}%", p),
            SupplyLevel::Unknown => write!(f, "Unknown"),
            SupplyLevel::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// One consumable as reported by the supplies table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    pub description: String,
    /// Raw current level (may be a negative device sentinel).
    pub level: i64,
    /// Raw max capacity (may be a negative device sentinel).
    pub max_capacity: i64,
    pub remaining: SupplyLevel,
}

/// One input tray.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperTray {
    /// Composite table index (e.g. "1.2").
    pub index: String,
    pub name: String,
    /// Raw sub-unit status code.
    pub status: i64,
    pub capacity: i64,
}

/// Status of one device, produced by a single poll.
///
/// Every field may stay at its default when the device did not provide it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub host: String,
    pub last_seen: DateTime<Utc>,

    // Identity
    pub model: String,
    pub serial_number: String,
    pub firmware: String,
    pub device_name: String,
    pub printer_name: String,
    pub system_description: String,

    // Status
    pub status: PrinterState,
    pub uptime_ticks: u32,
    pub device_status_code: i64,

    // Error state
    pub error_code: i64,
    pub error_description: String,
    pub paper_status: String,

    // Counters
    pub total_pages: i64,
    pub counter_unit: i64,

    // Consumables
    pub toner: Supply,
    pub drum: Supply,

    // Alerts
    pub alerts: Vec<String>,
    pub error_count: usize,
    pub last_error: String,

    pub trays: Vec<PaperTray>,

    /// Raw vendor capability descriptor.
    pub capabilities: String,
}

impl DeviceStatus {
    /// An empty record for `host`, stamped with the current time.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            last_seen: Utc::now(),
            model: String::new(),
            serial_number: String::new(),
            firmware: String::new(),
            device_name: String::new(),
            printer_name: String::new(),
            system_description: String::new(),
            status: PrinterState::default(),
            uptime_ticks: 0,
            device_status_code: 0,
            error_code: 0,
            error_description: String::new(),
            paper_status: String::new(),
            total_pages: 0,
            counter_unit: 0,
            toner: Supply::default(),
            drum: Supply::default(),
            alerts: Vec::new(),
            error_count: 0,
            last_error: String::new(),
            trays: Vec::new(),
            capabilities: String::new(),
        }
    }

    /// Set the alert list and the values derived from it.
    pub fn set_alerts(&mut self, alerts: Vec<String>) {
        self.error_count = alerts.len();
        self.last_error = alerts.first().cloned().unwrap_or_default();
        self.alerts = alerts;
    }

    /// The capability descriptor split into key/value pairs.
    pub fn capability_pairs(&self) -> Vec<(String, String)> {
        parse_capabilities(&self.capabilities)
    }

    /// Multi-section text report.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() { "Unknown" } else { value }
}

/// Format TimeTicks (hundredths of a second) as `Nd HH:MM:SS`.
fn format_uptime(ticks: u32) -> String {
    let secs = ticks / 100;
    let (days, rem) = (secs / 86_400, secs % 86_400);
    format!(
        "{}d {:02}:{:02}:{:02}",
        days,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

fn write_supply(f: &mut fmt::Formatter<'_>, label: &str, supply: &Supply) -> fmt::Result {
    match supply.remaining {
        SupplyLevel::Percent(_) => writeln!(
            f,
            "    {}: {} ({}/{})",
            label, supply.remaining, supply.level, supply.max_capacity
        ),
        _ => writeln!(f, "    {}: {}", label, supply.remaining),
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Printer: {}", self.host)?;

        writeln!(f, "  Identity")?;
        writeln!(f, "    Model: {}", or_unknown(&self.model))?;
        writeln!(f, "    Serial Number: {}", or_unknown(&self.serial_number))?;
        writeln!(f, "    Firmware: {}", or_unknown(&self.firmware))?;
        writeln!(f, "    Device Name: {}", or_unknown(&self.device_name))?;
        writeln!(f, "    Printer Name: {}", or_unknown(&self.printer_name))?;
        if !self.system_description.is_empty() {
            writeln!(f, "    Description: {}", self.system_description)?;
        }

        writeln!(f, "  Status")?;
        writeln!(f, "    State: {}", self.status)?;
        writeln!(f, "    Uptime: {}", format_uptime(self.uptime_ticks))?;
        writeln!(f, "    Device Status Code: {}", self.device_status_code)?;
        writeln!(f, "    Paper Status: {}", or_unknown(&self.paper_status))?;
        writeln!(f, "    Errors: {}", or_unknown(&self.error_description))?;

        writeln!(f, "  Counters")?;
        match counter_unit_name(self.counter_unit) {
            Some(unit) => writeln!(f, "    Total Pages Printed: {} ({})", self.total_pages, unit)?,
            None => writeln!(f, "    Total Pages Printed: {}", self.total_pages)?,
        }

        writeln!(f, "  Consumables")?;
        write_supply(f, "Toner Level", &self.toner)?;
        write_supply(f, "Drum Level", &self.drum)?;

        writeln!(f, "  Alerts")?;
        writeln!(f, "    Error Count: {}", self.error_count)?;
        if !self.last_error.is_empty() {
            writeln!(f, "    Last Error: {}", self.last_error)?;
        }
        for alert in &self.alerts {
            writeln!(f, "    - {}", alert)?;
        }

        writeln!(f, "  Paper Trays")?;
        if self.trays.is_empty() {
            writeln!(f, "    (none reported)")?;
        }
        for tray in &self.trays {
            writeln!(
                f,
                "    - {} [{}]: {}, capacity {}",
                tray.name,
                tray.index,
                tray_availability(tray.status),
                tray.capacity
            )?;
        }

        let pairs = self.capability_pairs();
        if !pairs.is_empty() {
            writeln!(f, "  Capabilities")?;
            for (key, value) in pairs {
                writeln!(f, "    {}: {}", key, value)?;
            }
        }

        writeln!(
            f,
            "  Last Checked: {}",
            self.last_seen.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_alerts_derives_count_and_last_error() {
        let mut status = DeviceStatus::new("10.0.0.5:161");
        status.set_alerts(vec!["2".to_string(), "paper jam".to_string()]);

        assert_eq!(status.error_count, 2);
        assert_eq!(status.last_error, "2");

        status.set_alerts(Vec::new());
        assert_eq!(status.error_count, 0);
        assert_eq!(status.last_error, "");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0d 00:00:00");
        // 1 day, 2 hours, 3 minutes, 4 seconds
        assert_eq!(format_uptime(9_378_400), "1d 02:03:04");
    }

    #[test]
    fn test_render_sections_in_order() {
        let mut status = DeviceStatus::new("192.168.50.250:161");
        status.model = "HL-L2350DW series".to_string();
        status.status = PrinterState::Idle;
        status.total_pages = 1200;
        status.counter_unit = 7;
        status.toner = Supply {
            description: "Black Toner Cartridge".to_string(),
            level: 45,
            max_capacity: 100,
            remaining: SupplyLevel::Percent(45),
        };
        status.drum.remaining = SupplyLevel::Unknown;
        status.set_alerts(vec!["Toner Low".to_string()]);
        status.trays.push(PaperTray {
            index: "1.1".to_string(),
            name: "Tray 1".to_string(),
            status: 0,
            capacity: 250,
        });
        status.capabilities = "MFG:Brother;MDL:HL-L2350DW series;".to_string();

        let text = status.render();

        assert!(text.starts_with("Printer: 192.168.50.250:161\n"));
        assert!(text.contains("    Model: HL-L2350DW series\n"));
        assert!(text.contains("    Serial Number: Unknown\n"));
        assert!(text.contains("    State: idle\n"));
        assert!(text.contains("    Total Pages Printed: 1200 (impressions)\n"));
        assert!(text.contains("    Toner Level: 45% (45/100)\n"));
        assert!(text.contains("    Drum Level: Unknown\n"));
        assert!(text.contains("    Last Error: Toner Low\n"));
        assert!(text.contains("    - Tray 1 [1.1]: available (idle), capacity 250\n"));
        assert!(text.contains("    MFG: Brother\n"));

        let sections = [
            "  Identity",
            "  Status",
            "  Counters",
            "  Consumables",
            "  Alerts",
            "  Paper Trays",
            "  Capabilities",
            "  Last Checked",
        ];
        let positions: Vec<usize> = sections
            .iter()
            .map(|s| text.find(s).unwrap_or(usize::MAX))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);
    }

    #[test]
    fn test_render_is_deterministic() {
        let status = DeviceStatus::new("10.0.0.5:161");
        assert_eq!(status.render(), status.render());
    }

    #[test]
    fn test_supply_level_serialization() {
        assert_eq!(
            serde_json::to_string(&SupplyLevel::Percent(45)).unwrap(),
            r#"{"percent":45}"#
        );
        assert_eq!(
            serde_json::to_string(&SupplyLevel::NotApplicable).unwrap(),
            r#""not_applicable""#
        );
    }
}
