//! Typed values returned by the transport.

use crate::error::ProbeError;

/// A value read from a device, tagged with its SNMP type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    /// INTEGER.
    Integer(i64),
    /// Counter32.
    Counter32(u32),
    /// Unsigned32, Gauge32 or Counter64, widened to the platform-width unsigned.
    Unsigned(u64),
    /// TimeTicks (hundredths of a second).
    Timeticks(u32),
    /// OCTET STRING, usually a DisplayString.
    OctetString(Vec<u8>),
}

impl SnmpValue {
    /// Build a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Self::OctetString(s.into().into_bytes())
    }

    /// Name of the SNMP type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "Integer",
            Self::Counter32(_) => "Counter32",
            Self::Unsigned(_) => "Unsigned",
            Self::Timeticks(_) => "Timeticks",
            Self::OctetString(_) => "OctetString",
        }
    }

    /// Read a signed INTEGER.
    pub fn integer(&self) -> Result<i64, ProbeError> {
        match self {
            Self::Integer(n) => Ok(*n),
            other => Err(ProbeError::mismatch("Integer", other.type_name())),
        }
    }

    /// Read a counter that may arrive as INTEGER, Counter32 or an unsigned.
    ///
    /// Values beyond `i64::MAX` cannot be represented and are rejected.
    pub fn counter(&self) -> Result<i64, ProbeError> {
        match self {
            Self::Integer(n) => Ok(*n),
            Self::Counter32(n) => Ok(i64::from(*n)),
            Self::Unsigned(n) => {
                i64::try_from(*n).map_err(|_| ProbeError::mismatch("i64 counter", "Unsigned"))
            }
            other => Err(ProbeError::mismatch("counter", other.type_name())),
        }
    }

    /// Read TimeTicks.
    pub fn ticks(&self) -> Result<u32, ProbeError> {
        match self {
            Self::Timeticks(n) => Ok(*n),
            other => Err(ProbeError::mismatch("Timeticks", other.type_name())),
        }
    }

    /// Read a printable text string.
    ///
    /// Binary strings (control characters other than newline/tab) are a type
    /// mismatch. Trailing NULs and surrounding whitespace are stripped.
    pub fn display_string(&self) -> Result<String, ProbeError> {
        match self {
            Self::OctetString(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => {
                    let text = text.trim_end_matches('\0').trim();
                    if text
                        .chars()
                        .all(|c| !c.is_control() || c == '\n' || c == '\t')
                    {
                        Ok(text.to_string())
                    } else {
                        Err(ProbeError::mismatch("DisplayString", "binary OctetString"))
                    }
                }
                Err(_) => Err(ProbeError::mismatch("DisplayString", "binary OctetString")),
            },
            other => Err(ProbeError::mismatch("OctetString", other.type_name())),
        }
    }

    /// Render any value as text: numbers in decimal, strings lossily.
    pub fn to_text(&self) -> String {
        match self {
            Self::Integer(n) => n.to_string(),
            Self::Counter32(n) | Self::Timeticks(n) => n.to_string(),
            Self::Unsigned(n) => n.to_string(),
            Self::OctetString(bytes) => String::from_utf8_lossy(bytes)
                .trim_end_matches('\0')
                .trim()
                .to_string(),
        }
    }
}
