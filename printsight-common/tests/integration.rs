//! Integration tests for printsight-common library.

use std::io::Write;

use printsight_common::{
    Format, LogFormat, LoggingConfig, decode, decode_auto, encode, load_config, parse_config,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AgentSection {
    community: String,
    devices: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    logging: LoggingConfig,
    agent: AgentSection,
}

#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join(format!("printsight-common-{}.json5", std::process::id()));
    let mut file = std::fs::File::create(&path).expect("create temp config");
    writeln!(
        file,
        r#"{{
            logging: {{ level: "warn", format: "json" }},
            agent: {{ community: "private", devices: ["10.0.0.5", "10.0.0.6:1161"] }},
        }}"#
    )
    .expect("write temp config");
    drop(file);

    let config: FileConfig = load_config(&path).expect("load config");
    std::fs::remove_file(&path).ok();

    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.agent.community, "private");
    assert_eq!(config.agent.devices.len(), 2);
}

#[test]
fn test_report_encoding_workflow() {
    let section = AgentSection {
        community: "public".to_string(),
        devices: vec!["192.168.50.250".to_string()],
    };

    let json_bytes = encode(&section, Format::Json).expect("JSON encode failed");
    let decoded: AgentSection = decode(&json_bytes, Format::Json).expect("JSON decode failed");
    assert_eq!(decoded, section);

    let cbor_bytes = encode(&section, Format::Cbor).expect("CBOR encode failed");
    let auto_decoded: AgentSection = decode_auto(&cbor_bytes).expect("Auto decode failed");
    assert_eq!(auto_decoded, section);
}

#[test]
fn test_missing_required_section() {
    let result: printsight_common::Result<FileConfig> = parse_config("{ logging: {} }");
    assert!(result.is_err());
}
