//! printsight agent library
//!
//! Polls printers over SNMP and reconciles standard Printer-MIB and vendor
//! data into one [`DeviceStatus`] per device:
//!
//! - [`scheduler`] - Bounded worker pool running one poll job per device
//! - [`aggregator`] - One poll: connect, run the probe catalog, merge
//! - [`catalog`] - Declarative scalar probes and table walks
//! - [`merge`] - Per-field merge policy
//! - [`table`] - Accumulation of walked tables
//! - [`decode`] - Status enumerations, error bits and vendor strings
//! - [`transport`] / [`snmp`] - Transport traits and the `snmp2` implementation
//! - [`report`] - Text, JSON and CBOR output

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod decode;
pub mod error;
pub mod merge;
pub mod oid;
pub mod report;
pub mod scheduler;
pub mod snmp;
pub mod status;
pub mod table;
pub mod transport;
pub mod value;

pub use aggregator::{Aggregator, PollSettings};
pub use config::{AgentConfig, AgentFileConfig, ReportFormat, SnmpVersion};
pub use decode::PrinterState;
pub use error::{ConnectionError, ProbeError, SchedulerError};
pub use report::{PassSummary, Reporter};
pub use scheduler::Scheduler;
pub use snmp::SnmpTransport;
pub use status::{DeviceStatus, PaperTray, Supply, SupplyLevel};
pub use transport::{ConnectParams, Connection, Transport};
pub use value::SnmpValue;
