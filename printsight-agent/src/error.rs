//! Error types for device polling and job scheduling.

use thiserror::Error;

/// A device could not be reached; fatal to one poll, no record is produced.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Invalid device address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to open SNMP session to {address}: {source}")]
    Session {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Device {address} did not answer the handshake: {reason}")]
    Handshake { address: String, reason: String },
}

/// A single read or walk failed. Absorbed by the probe that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("Request timed out")]
    Timeout,

    #[error("No such object")]
    NoSuchObject,

    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid OID '{0}'")]
    InvalidOid(String),

    #[error("SNMP request failed: {0}")]
    Request(String),
}

impl ProbeError {
    pub(crate) fn mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }
}

/// Errors returned by the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Scheduler is closed and no longer accepts jobs")]
    Closed,
}
