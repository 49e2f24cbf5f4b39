//! Transport seam between the aggregator and the wire protocol.
//!
//! The aggregator only sees these traits. [`crate::snmp::SnmpTransport`] is the
//! production implementation; tests plug in in-memory devices.

use std::future::Future;
use std::time::Duration;

use crate::config::SnmpVersion;
use crate::error::{ConnectionError, ProbeError};
use crate::value::SnmpValue;

/// Everything needed to open one device connection.
///
/// Timeout and retries apply uniformly to every read and walk issued on the
/// resulting connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Device address (`host:port`).
    pub address: String,
    /// Community string.
    pub community: String,
    /// Protocol version.
    pub version: SnmpVersion,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Additional attempts after a timed out request.
    pub retries: u32,
    /// Probe the device once while connecting and fail if it does not answer.
    pub handshake: bool,
}

/// Opens device connections.
pub trait Transport: Send + Sync {
    type Connection: Connection;

    /// Open a connection. Failure here is the only error a poll surfaces.
    fn connect(
        &self,
        params: &ConnectParams,
    ) -> impl Future<Output = Result<Self::Connection, ConnectionError>> + Send;
}

/// One open device connection, exclusively owned by a single poll.
///
/// Dropping the connection releases it.
pub trait Connection: Send {
    /// Scalar read of the value at exactly `oid`.
    fn get(&mut self, oid: &str) -> impl Future<Output = Result<SnmpValue, ProbeError>> + Send;

    /// Walk every object below `subtree`, calling `visit` with the full row OID
    /// and its value, in the order the device returns them.
    fn walk(
        &mut self,
        subtree: &str,
        visit: &mut (dyn FnMut(&str, SnmpValue) + Send),
    ) -> impl Future<Output = Result<(), ProbeError>> + Send;
}
