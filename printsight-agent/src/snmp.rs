//! SNMP transport built on `snmp2`.

use std::time::Duration;

use snmp2::{AsyncSession, Oid, Value};
use tokio::time::timeout;

use crate::catalog::HANDSHAKE_OID;
use crate::config::SnmpVersion;
use crate::error::{ConnectionError, ProbeError};
use crate::oid::{oid_starts_with, oid_to_string, parse_oid};
use crate::transport::{ConnectParams, Connection, Transport};
use crate::value::SnmpValue;

/// Opens SNMPv1/v2c sessions over UDP.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnmpTransport;

impl SnmpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for SnmpTransport {
    type Connection = SnmpConnection;

    async fn connect(&self, params: &ConnectParams) -> Result<SnmpConnection, ConnectionError> {
        check_address(&params.address)?;
        let community = params.community.as_bytes();

        let session = match params.version {
            SnmpVersion::V1 => AsyncSession::new_v1(params.address.as_str(), community, 0).await,
            SnmpVersion::V2c => AsyncSession::new_v2c(params.address.as_str(), community, 0).await,
        }
        .map_err(|source| ConnectionError::Session {
            address: params.address.clone(),
            source,
        })?;

        let mut connection = SnmpConnection {
            address: params.address.clone(),
            session,
            timeout: params.timeout,
            retries: params.retries,
        };

        if params.handshake {
            match connection.get(HANDSHAKE_OID).await {
                // Any answer, even an error varbind, proves the agent is there.
                Ok(_) | Err(ProbeError::NoSuchObject) | Err(ProbeError::TypeMismatch { .. }) => {}
                Err(e) => {
                    return Err(ConnectionError::Handshake {
                        address: params.address.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(device = %params.address, version = ?params.version, "SNMP session opened");

        Ok(connection)
    }
}

/// Reject addresses without a numeric port before any I/O.
fn check_address(address: &str) -> Result<(), ConnectionError> {
    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
        _ => Err(ConnectionError::InvalidAddress {
            address: address.to_string(),
            reason: "expected host:port".to_string(),
        }),
    }
}

/// An open SNMP session to one device.
pub struct SnmpConnection {
    address: String,
    session: AsyncSession,
    timeout: Duration,
    retries: u32,
}

#[derive(Clone, Copy)]
enum Request {
    Get,
    GetNext,
}

impl SnmpConnection {
    /// Send one request, retrying on timeout, and return the first varbind.
    async fn request(
        &mut self,
        kind: Request,
        oid: &Oid<'_>,
    ) -> Result<Option<(Oid<'static>, Result<SnmpValue, ProbeError>)>, ProbeError> {
        let mut attempt = 0;

        loop {
            let response = match kind {
                Request::Get => timeout(self.timeout, self.session.get(oid)).await,
                Request::GetNext => timeout(self.timeout, self.session.getnext(oid)).await,
            };

            match response {
                Ok(Ok(pdu)) => {
                    return Ok(pdu
                        .varbinds
                        .into_iter()
                        .next()
                        .map(|(resp_oid, value)| (resp_oid.to_owned(), convert_value(&value))));
                }
                Ok(Err(e)) => return Err(ProbeError::Request(format!("{:?}", e))),
                Err(_) if attempt < self.retries => {
                    attempt += 1;
                    tracing::trace!(
                        device = %self.address,
                        oid = %oid_to_string(oid),
                        attempt,
                        "SNMP request timed out, retrying"
                    );
                }
                Err(_) => return Err(ProbeError::Timeout),
            }
        }
    }
}

impl Connection for SnmpConnection {
    async fn get(&mut self, oid_str: &str) -> Result<SnmpValue, ProbeError> {
        let oid = parse_oid(oid_str)?;

        match self.request(Request::Get, &oid).await? {
            Some((_, value)) => value,
            None => Err(ProbeError::NoSuchObject),
        }
    }

    async fn walk(
        &mut self,
        subtree_str: &str,
        visit: &mut (dyn FnMut(&str, SnmpValue) + Send),
    ) -> Result<(), ProbeError> {
        let subtree = parse_oid(subtree_str)?;
        let mut current_oid = subtree.clone();

        loop {
            let Some((resp_oid, value)) = self.request(Request::GetNext, &current_oid).await?
            else {
                break;
            };

            // Check if we're still within the subtree
            if !oid_starts_with(&resp_oid, &subtree) {
                break;
            }

            let oid_string = oid_to_string(&resp_oid);

            // Agents that do not advance would loop forever
            if oid_string == oid_to_string(&current_oid) {
                break;
            }

            match value {
                Ok(value) => visit(&oid_string, value),
                // End of MIB view
                Err(ProbeError::NoSuchObject) => break,
                Err(e) => {
                    tracing::trace!(device = %self.address, oid = %oid_string, error = %e, "Skipping walk entry");
                }
            }

            current_oid = resp_oid;
        }

        Ok(())
    }
}

/// Convert an snmp2 Value into a typed value.
fn convert_value(value: &Value) -> Result<SnmpValue, ProbeError> {
    match value {
        Value::Integer(n) => Ok(SnmpValue::Integer(i64::from(*n))),
        Value::OctetString(s) => Ok(SnmpValue::OctetString(s.to_vec())),
        Value::Counter32(n) => Ok(SnmpValue::Counter32(*n)),
        Value::Unsigned32(n) => Ok(SnmpValue::Unsigned(u64::from(*n))),
        Value::Counter64(n) => Ok(SnmpValue::Unsigned(*n)),
        Value::Timeticks(n) => Ok(SnmpValue::Timeticks(*n)),
        Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
            Err(ProbeError::NoSuchObject)
        }
        Value::ObjectIdentifier(_) => Err(ProbeError::mismatch("scalar", "ObjectIdentifier")),
        Value::IpAddress(_) => Err(ProbeError::mismatch("scalar", "IpAddress")),
        _ => Err(ProbeError::mismatch("scalar", "unsupported")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_address() {
        assert!(check_address("192.168.50.250:161").is_ok());
        assert!(check_address("[fe80::1]:161").is_ok());
        assert!(matches!(
            check_address("192.168.50.250"),
            Err(ConnectionError::InvalidAddress { .. })
        ));
        assert!(check_address(":161").is_err());
    }

    #[test]
    fn test_convert_value() {
        assert_eq!(convert_value(&Value::Integer(-2)), Ok(SnmpValue::Integer(-2)));
        assert_eq!(
            convert_value(&Value::Counter64(5_000_000_000)),
            Ok(SnmpValue::Unsigned(5_000_000_000))
        );
        assert_eq!(
            convert_value(&Value::OctetString(b"Tray 1")),
            Ok(SnmpValue::text("Tray 1"))
        );
        assert_eq!(convert_value(&Value::NoSuchInstance), Err(ProbeError::NoSuchObject));
        assert!(matches!(
            convert_value(&Value::IpAddress([10, 0, 0, 5])),
            Err(ProbeError::TypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_rejects_address_without_port() {
        let params = ConnectParams {
            address: "printer.lan".to_string(),
            community: "public".to_string(),
            version: SnmpVersion::V2c,
            timeout: Duration::from_millis(10),
            retries: 0,
            handshake: false,
        };

        let result = SnmpTransport::new().connect(&params).await;
        assert!(matches!(result, Err(ConnectionError::InvalidAddress { .. })));
    }
}
