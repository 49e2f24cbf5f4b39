//! Static probe catalog.
//!
//! Each scalar probe is `(name, oid, decoder, priority)`: one GET whose value
//! the decoder turns into zero or more field observations. The priority ranks
//! sources for the merge policy and also fixes the order probes are issued in.
//!
//! OIDs come from SNMPv2-MIB, HOST-RESOURCES-MIB, Printer-MIB (RFC 3805) and
//! the Brother enterprise tree (1.3.6.1.4.1.2435).

use crate::decode::{
    describe_error_state, device_class_status, extract_model, general_status, generic_status,
    paper_status, parse_maintenance,
};
use crate::error::ProbeError;
use crate::merge::{Field, FieldValue};
use crate::value::SnmpValue;

/// sysUpTime.0, read once while connecting to prove the agent answers.
pub const HANDSHAKE_OID: &str = "1.3.6.1.2.1.1.3.0";

/// How a scalar value is turned into field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    /// DisplayString into a text field.
    Text(Field),
    /// TimeTicks into the uptime.
    Ticks,
    /// Raw INTEGER into a numeric field.
    Code(Field),
    /// hrPrinterStatus.
    GenericStatus,
    /// Vendor general status.
    GeneralStatus,
    /// hrDeviceStatus: the state plus the raw code.
    DeviceClassStatus,
    /// Error bitmask: code, paper status and description. A text answer only
    /// feeds the description.
    ErrorState,
    /// Page counter of any integer width.
    PageCount,
    /// `KEY:value;` capability descriptor: raw string plus `MDL` model.
    Capabilities,
    /// `KEY="value"` maintenance text: model, serial and firmware.
    Maintenance,
}

/// Maintenance keys and the fields they feed.
const MAINTENANCE_KEYS: [(&str, Field); 3] = [
    ("MODEL", Field::Model),
    ("SERIAL", Field::SerialNumber),
    ("FIRMWARE", Field::Firmware),
];

impl Decoder {
    /// Fields this decoder can produce.
    pub fn fields(&self) -> &[Field] {
        match self {
            Decoder::Text(field) | Decoder::Code(field) => std::slice::from_ref(field),
            Decoder::Ticks => &[Field::Uptime],
            Decoder::GenericStatus | Decoder::GeneralStatus => &[Field::Status],
            Decoder::DeviceClassStatus => &[Field::Status, Field::DeviceStatusCode],
            Decoder::ErrorState => &[
                Field::ErrorCode,
                Field::PaperStatus,
                Field::ErrorDescription,
            ],
            Decoder::PageCount => &[Field::TotalPages],
            Decoder::Capabilities => &[Field::Capabilities, Field::Model],
            Decoder::Maintenance => &[Field::Model, Field::SerialNumber, Field::Firmware],
        }
    }

    /// Decode one value. A value of the wrong type is a probe error.
    pub fn decode(&self, value: &SnmpValue) -> Result<Vec<(Field, FieldValue)>, ProbeError> {
        let decoded = match self {
            Decoder::Text(field) => vec![(*field, FieldValue::Text(value.display_string()?))],
            Decoder::Ticks => vec![(Field::Uptime, FieldValue::Ticks(value.ticks()?))],
            Decoder::Code(field) => vec![(*field, FieldValue::Integer(value.integer()?))],
            Decoder::GenericStatus => vec![(
                Field::Status,
                FieldValue::State(generic_status(value.integer()?)),
            )],
            Decoder::GeneralStatus => vec![(
                Field::Status,
                FieldValue::State(general_status(value.integer()?)),
            )],
            Decoder::DeviceClassStatus => {
                let code = value.integer()?;
                vec![
                    (Field::Status, FieldValue::State(device_class_status(code))),
                    (Field::DeviceStatusCode, FieldValue::Integer(code)),
                ]
            }
            Decoder::ErrorState => match value {
                SnmpValue::OctetString(_) => vec![(
                    Field::ErrorDescription,
                    FieldValue::Text(value.display_string()?),
                )],
                other => error_bitmask(other.integer()?),
            },
            Decoder::PageCount => vec![(Field::TotalPages, FieldValue::Integer(value.counter()?))],
            Decoder::Capabilities => {
                let descriptor = value.display_string()?;
                let mut decoded = Vec::with_capacity(2);
                if let Some(model) = extract_model(&descriptor) {
                    decoded.push((Field::Model, FieldValue::Text(model)));
                }
                decoded.push((Field::Capabilities, FieldValue::Text(descriptor)));
                decoded
            }
            Decoder::Maintenance => {
                let text = value.display_string()?;
                parse_maintenance(&text)
                    .into_iter()
                    .filter_map(|(key, value)| {
                        MAINTENANCE_KEYS
                            .iter()
                            .find(|(name, _)| *name == key)
                            .map(|(_, field)| (*field, FieldValue::Text(value)))
                    })
                    .collect()
            }
        };
        Ok(decoded)
    }
}

fn error_bitmask(code: i64) -> Vec<(Field, FieldValue)> {
    let description = describe_error_state(code);
    let paper = paper_status(code).to_string();
    if code == 0 {
        return vec![
            (Field::ErrorCode, FieldValue::Integer(0)),
            (Field::PaperStatus, FieldValue::Clear(paper)),
            (Field::ErrorDescription, FieldValue::Clear(description)),
        ];
    }
    vec![
        (Field::ErrorCode, FieldValue::Integer(code)),
        (Field::PaperStatus, FieldValue::Text(paper)),
        (Field::ErrorDescription, FieldValue::Text(description)),
    ]
}

/// One scalar read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarProbe {
    pub name: &'static str,
    pub oid: &'static str,
    pub decoder: Decoder,
    pub priority: u16,
}

const fn scalar(name: &'static str, oid: &'static str, decoder: Decoder, priority: u16) -> ScalarProbe {
    ScalarProbe {
        name,
        oid,
        decoder,
        priority,
    }
}

/// Scalar probes, in issue order (ascending priority).
///
/// Status sources run generic, then vendor general, then device class, so
/// the most device-specific enumeration has the final say. Page counters are
/// listed standard, alternate, vendor, vendor alternate, vendor maintenance.
pub const SCALAR_PROBES: &[ScalarProbe] = &[
    // Identity
    scalar("sysDescr", "1.3.6.1.2.1.1.1.0", Decoder::Text(Field::SystemDescription), 10),
    scalar("sysName", "1.3.6.1.2.1.1.5.0", Decoder::Text(Field::DeviceName), 20),
    scalar("sysUpTime", "1.3.6.1.2.1.1.3.0", Decoder::Ticks, 30),
    scalar(
        "prtGeneralPrinterName",
        "1.3.6.1.2.1.43.5.1.1.16.1",
        Decoder::Text(Field::PrinterName),
        40,
    ),
    scalar(
        "prtGeneralSerialNumber",
        "1.3.6.1.2.1.43.5.1.1.17.1",
        Decoder::Text(Field::SerialNumber),
        50,
    ),
    scalar(
        "brCapabilities",
        "1.3.6.1.4.1.2435.2.3.9.1.1.7.0",
        Decoder::Capabilities,
        60,
    ),
    // Status
    scalar("hrPrinterStatus", "1.3.6.1.2.1.25.3.5.1.1.1", Decoder::GenericStatus, 70),
    scalar(
        "brGeneralStatus",
        "1.3.6.1.4.1.2435.2.3.9.4.2.1.5.4.1.0",
        Decoder::GeneralStatus,
        80,
    ),
    scalar("hrDeviceStatus", "1.3.6.1.2.1.25.3.2.1.5.1", Decoder::DeviceClassStatus, 90),
    // Error state
    scalar(
        "hrPrinterDetectedErrorState",
        "1.3.6.1.2.1.25.3.5.1.2.1",
        Decoder::ErrorState,
        100,
    ),
    scalar("brErrorStatus", "1.3.6.1.4.1.2435.2.3.9.1.1.2.0", Decoder::ErrorState, 110),
    scalar(
        "brErrorDescription",
        "1.3.6.1.4.1.2435.2.3.9.1.1.3.0",
        Decoder::Text(Field::ErrorDescription),
        120,
    ),
    // Page counters
    scalar(
        "prtMarkerCounterUnit",
        "1.3.6.1.2.1.43.10.2.1.3.1.1",
        Decoder::Code(Field::CounterUnit),
        130,
    ),
    scalar("prtMarkerLifeCount", "1.3.6.1.2.1.43.10.2.1.4.1.1", Decoder::PageCount, 140),
    scalar("prtMarkerLifeCountAlt", "1.3.6.1.2.1.43.10.2.1.4.1.2", Decoder::PageCount, 150),
    scalar(
        "brPageCount",
        "1.3.6.1.4.1.2435.2.3.9.4.2.1.1.1.6.1.4",
        Decoder::PageCount,
        160,
    ),
    scalar(
        "brPageCountAlt",
        "1.3.6.1.4.1.2435.2.3.9.4.2.1.1.1.6.1.5",
        Decoder::PageCount,
        170,
    ),
    scalar(
        "brMaintenancePageCount",
        "1.3.6.1.4.1.2435.2.4.3.99.3.1.6.1.2.1",
        Decoder::PageCount,
        180,
    ),
    // Vendor maintenance identity, most specific identity source
    scalar(
        "brMaintenanceInfo",
        "1.3.6.1.4.1.2435.2.4.3.99.3.1.6.1.2.2",
        Decoder::Maintenance,
        190,
    ),
];

/// Which accumulator a walked table feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Supplies,
    Alerts,
    Trays,
}

/// One subtree walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableProbe {
    pub name: &'static str,
    pub oid: &'static str,
    pub table: Table,
}

/// Table walks, in issue order.
pub const TABLE_PROBES: &[TableProbe] = &[
    TableProbe {
        name: "prtMarkerSuppliesEntry",
        oid: "1.3.6.1.2.1.43.11.1.1",
        table: Table::Supplies,
    },
    TableProbe {
        name: "prtAlertDescription",
        oid: "1.3.6.1.2.1.43.18.1.1.8",
        table: Table::Alerts,
    },
    TableProbe {
        name: "prtInputEntry",
        oid: "1.3.6.1.2.1.43.8.2.1",
        table: Table::Trays,
    },
];
