use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use printsight_common::{Error, Format, LoggingConfig, Result};

use crate::aggregator::PollSettings;

/// Default SNMP agent port.
pub const DEFAULT_PORT: u16 = 161;

/// Root configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentFileConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Polling settings and device list.
    pub agent: AgentConfig,
}

/// Report output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format: "text", "json" or "cbor".
    #[serde(default)]
    pub format: ReportFormat,
}

/// How status records are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Multi-section text report (default).
    #[default]
    Text,
    /// One JSON document per line.
    Json,
    /// Concatenated CBOR items.
    Cbor,
}

impl ReportFormat {
    /// The serialization format, or `None` for the text report.
    pub fn encoding(&self) -> Option<Format> {
        match self {
            ReportFormat::Text => None,
            ReportFormat::Json => Some(Format::Json),
            ReportFormat::Cbor => Some(Format::Cbor),
        }
    }
}

/// Polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// SNMP community string.
    #[serde(default = "default_community")]
    pub community: String,

    /// SNMP version ("v1" or "v2c").
    #[serde(default)]
    pub version: SnmpVersion,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Additional attempts after a timed out request.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Number of devices polled concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Read sysUpTime.0 when connecting and treat silence as unreachable.
    #[serde(default = "default_true")]
    pub handshake: bool,

    /// Seconds between polling passes; 0 polls once and exits.
    #[serde(default)]
    pub poll_interval_secs: u64,

    /// Device addresses (`host` or `host:port`).
    #[serde(default)]
    pub devices: Vec<String>,
}

fn default_community() -> String {
    "public".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_retries() -> u32 {
    3
}

fn default_workers() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            community: default_community(),
            version: SnmpVersion::default(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            workers: default_workers(),
            handshake: true,
            poll_interval_secs: 0,
            devices: Vec::new(),
        }
    }
}

/// SNMP protocol version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnmpVersion {
    #[serde(rename = "v1")]
    V1,
    #[default]
    #[serde(rename = "v2c")]
    V2c,
}

impl AgentFileConfig {
    /// Load configuration from a JSON5 file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        printsight_common::load_config(path)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self> {
        printsight_common::parse_config(content)
    }

    /// Check the settings that would make polling impossible.
    pub fn validate(&self) -> Result<()> {
        let agent = &self.agent;
        if agent.devices.is_empty() {
            return Err(Error::Config("No devices configured".to_string()));
        }
        if agent.workers == 0 {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        if agent.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be greater than 0".to_string()));
        }
        if let Some(device) = agent.devices.iter().find(|d| d.trim().is_empty()) {
            return Err(Error::Config(format!("Invalid device address '{}'", device)));
        }
        Ok(())
    }
}

impl AgentConfig {
    /// Settings for every poll of this run.
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            community: self.community.clone(),
            version: self.version,
            timeout: Duration::from_millis(self.timeout_ms),
            retries: self.retries,
            handshake: self.handshake,
        }
    }

    /// Device addresses with the default port filled in, duplicates removed.
    pub fn device_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = Vec::with_capacity(self.devices.len());
        for device in &self.devices {
            let address = normalize_address(device);
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }
        addresses
    }
}

/// Append the default port when `address` has none.
///
/// Bare IPv6 addresses are bracketed.
pub fn normalize_address(address: &str) -> String {
    let address = address.trim();

    if address.parse::<SocketAddr>().is_ok() {
        return address.to_string();
    }
    if let Ok(ip) = address.parse::<IpAddr>() {
        return SocketAddr::new(ip, DEFAULT_PORT).to_string();
    }
    if address.starts_with('[') && address.ends_with(']') {
        return format!("{}:{}", address, DEFAULT_PORT);
    }

    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
            address.to_string()
        }
        _ => format!("{}:{}", address, DEFAULT_PORT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printsight_common::LogFormat;

    #[test]
    fn test_parse_config() {
        let json5 = r#"
        {
            logging: {
                level: "debug",
                format: "json",
            },
            report: {
                format: "cbor",
            },
            agent: {
                community: "private",
                version: "v1",
                timeout_ms: 2500,
                retries: 1,
                workers: 8,
                handshake: false,
                poll_interval_secs: 300,
                devices: ["192.168.50.250", "printer.lan:1161"],
            },
        }
        "#;

        let config = AgentFileConfig::parse(json5).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.report.format, ReportFormat::Cbor);
        assert_eq!(config.agent.community, "private");
        assert_eq!(config.agent.version, SnmpVersion::V1);
        assert_eq!(config.agent.workers, 8);
        assert!(!config.agent.handshake);
        assert_eq!(config.agent.poll_interval_secs, 300);
        assert!(config.validate().is_ok());

        let settings = config.agent.poll_settings();
        assert_eq!(settings.timeout, Duration::from_millis(2500));
        assert_eq!(settings.retries, 1);
        assert_eq!(settings.community, "private");
    }

    #[test]
    fn test_defaults() {
        let config = AgentFileConfig::parse(r#"{ agent: { devices: ["10.0.0.5"] } }"#).unwrap();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.report.format, ReportFormat::Text);
        assert_eq!(config.agent.community, "public");
        assert_eq!(config.agent.version, SnmpVersion::V2c);
        assert_eq!(config.agent.timeout_ms, 10_000);
        assert_eq!(config.agent.retries, 3);
        assert_eq!(config.agent.workers, 5);
        assert!(config.agent.handshake);
        assert_eq!(config.agent.poll_interval_secs, 0);
    }

    #[test]
    fn test_missing_agent_section() {
        assert!(AgentFileConfig::parse("{}").is_err());
    }

    #[test]
    fn test_unsupported_version() {
        assert!(AgentFileConfig::parse(r#"{ agent: { version: "v3" } }"#).is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = AgentFileConfig::parse("{ agent: {} }").unwrap();
        assert!(config.validate().is_err());

        config.agent.devices.push("10.0.0.5".to_string());
        assert!(config.validate().is_ok());

        config.agent.workers = 0;
        assert!(config.validate().is_err());

        config.agent.workers = 1;
        config.agent.timeout_ms = 0;
        assert!(config.validate().is_err());

        config.agent.timeout_ms = 100;
        config.agent.devices.push("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address("192.168.50.250"), "192.168.50.250:161");
        assert_eq!(normalize_address("192.168.50.250:1161"), "192.168.50.250:1161");
        assert_eq!(normalize_address("printer.lan"), "printer.lan:161");
        assert_eq!(normalize_address("printer.lan:162"), "printer.lan:162");
        assert_eq!(normalize_address("fe80::1"), "[fe80::1]:161");
        assert_eq!(normalize_address("[fe80::1]"), "[fe80::1]:161");
        assert_eq!(normalize_address("[fe80::1]:162"), "[fe80::1]:162");
    }

    #[test]
    fn test_device_addresses_dedup() {
        let agent = AgentConfig {
            devices: vec![
                "10.0.0.5".to_string(),
                "10.0.0.5:161".to_string(),
                "10.0.0.6".to_string(),
            ],
            ..AgentConfig::default()
        };

        assert_eq!(agent.device_addresses(), vec!["10.0.0.5:161", "10.0.0.6:161"]);
    }

    #[test]
    fn test_report_encoding() {
        assert_eq!(ReportFormat::Text.encoding(), None);
        assert_eq!(ReportFormat::Json.encoding(), Some(Format::Json));
        assert_eq!(ReportFormat::Cbor.encoding(), Some(Format::Cbor));
    }
}
