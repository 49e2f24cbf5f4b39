//! One poll of one device.
//!
//! The aggregator connects, issues every scalar probe in catalog order, walks
//! the supplies, alert and input tables, and returns a single status record.
//! Only connecting can fail a poll; a failed read or walk leaves its fields
//! at their defaults.

use std::time::Duration;

use crate::catalog::{SCALAR_PROBES, ScalarProbe, TABLE_PROBES, Table, TableProbe};
use crate::config::SnmpVersion;
use crate::error::{ConnectionError, ProbeError};
use crate::merge::Observations;
use crate::status::DeviceStatus;
use crate::table::{AlertList, SUPPLY_DRUM, SUPPLY_TONER, SupplyTable, TrayTable};
use crate::transport::{ConnectParams, Connection, Transport};

/// Connection settings shared by every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub community: String,
    pub version: SnmpVersion,
    pub timeout: Duration,
    pub retries: u32,
    pub handshake: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            community: "public".to_string(),
            version: SnmpVersion::default(),
            timeout: Duration::from_secs(10),
            retries: 3,
            handshake: true,
        }
    }
}

/// Builds [`DeviceStatus`] records. Holds no per-device state, so one
/// instance can serve any number of concurrent polls.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    settings: PollSettings,
}

impl Aggregator {
    pub fn new(settings: PollSettings) -> Self {
        Self { settings }
    }

    fn connect_params(&self, host: &str) -> ConnectParams {
        ConnectParams {
            address: host.to_string(),
            community: self.settings.community.clone(),
            version: self.settings.version,
            timeout: self.settings.timeout,
            retries: self.settings.retries,
            handshake: self.settings.handshake,
        }
    }

    /// Poll `host` and return its status.
    pub async fn poll<T: Transport>(
        &self,
        transport: &T,
        host: &str,
    ) -> Result<DeviceStatus, ConnectionError> {
        let mut connection = transport.connect(&self.connect_params(host)).await?;
        let mut status = DeviceStatus::new(host);

        let observations = read_scalars(&mut connection, host, SCALAR_PROBES).await;
        tracing::debug!(
            device = %host,
            observations = observations.len(),
            "Scalar probes complete"
        );
        observations.apply(&mut status);

        for probe in TABLE_PROBES {
            walk_table(&mut connection, host, probe, &mut status).await;
        }

        tracing::debug!(
            device = %host,
            state = %status.status,
            total_pages = status.total_pages,
            alerts = status.error_count,
            "Poll complete"
        );

        Ok(status)
    }
}

/// Issue every scalar probe in order and collect what decodes.
///
/// A probe whose fields are all first-positive and already settled by an
/// earlier source is not sent.
async fn read_scalars<C: Connection>(
    connection: &mut C,
    host: &str,
    probes: &[ScalarProbe],
) -> Observations {
    let mut observations = Observations::new();

    for probe in probes {
        let fields = probe.decoder.fields();
        if !fields.is_empty()
            && fields
                .iter()
                .all(|field| observations.is_settled(*field, probe.priority))
        {
            tracing::trace!(device = %host, probe = probe.name, "Skipping settled probe");
            continue;
        }

        let decoded = match connection.get(probe.oid).await {
            Ok(value) => probe.decoder.decode(&value),
            Err(e) => Err(e),
        };

        match decoded {
            Ok(values) => {
                for (field, value) in values {
                    observations.push(field, probe.priority, value);
                }
            }
            Err(e) => log_probe_error(host, probe.name, probe.oid, &e),
        }
    }

    observations
}

/// Walk one table into a local accumulator and commit it only if the walk
/// completed.
async fn walk_table<C: Connection>(
    connection: &mut C,
    host: &str,
    probe: &TableProbe,
    status: &mut DeviceStatus,
) {
    match probe.table {
        Table::Supplies => {
            let mut table = SupplyTable::new();
            let result = connection
                .walk(probe.oid, &mut |oid, value| table.visit(probe.oid, oid, &value))
                .await;
            match result {
                Ok(()) => {
                    status.toner = table.summarize(SUPPLY_TONER);
                    status.drum = table.summarize(SUPPLY_DRUM);
                }
                Err(e) => log_probe_error(host, probe.name, probe.oid, &e),
            }
        }
        Table::Alerts => {
            let mut alerts = AlertList::new();
            let result = connection
                .walk(probe.oid, &mut |_, value| alerts.visit(&value))
                .await;
            match result {
                Ok(()) => status.set_alerts(alerts.into_alerts()),
                Err(e) => log_probe_error(host, probe.name, probe.oid, &e),
            }
        }
        Table::Trays => {
            let mut table = TrayTable::new();
            let result = connection
                .walk(probe.oid, &mut |oid, value| table.visit(probe.oid, oid, &value))
                .await;
            match result {
                Ok(()) => status.trays = table.trays(),
                Err(e) => log_probe_error(host, probe.name, probe.oid, &e),
            }
        }
    }
}

fn log_probe_error(host: &str, probe: &str, oid: &str, error: &ProbeError) {
    match error {
        // Most devices implement only some sources.
        ProbeError::NoSuchObject => {
            tracing::trace!(device = %host, probe, oid, "Object not present");
        }
        _ => {
            tracing::debug!(device = %host, probe, oid, error = %error, "Probe failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Decoder;
    use crate::merge::Field;
    use crate::value::SnmpValue;
    use std::collections::HashMap;

    /// Answers GETs from a map and records every requested OID.
    struct ScriptedConnection {
        values: HashMap<&'static str, SnmpValue>,
        requested: Vec<String>,
    }

    impl Connection for ScriptedConnection {
        async fn get(&mut self, oid: &str) -> Result<SnmpValue, ProbeError> {
            self.requested.push(oid.to_string());
            self.values.get(oid).cloned().ok_or(ProbeError::NoSuchObject)
        }

        async fn walk(
            &mut self,
            _subtree: &str,
            _visit: &mut (dyn FnMut(&str, SnmpValue) + Send),
        ) -> Result<(), ProbeError> {
            Err(ProbeError::Timeout)
        }
    }

    const PROBES: &[ScalarProbe] = &[
        ScalarProbe {
            name: "a",
            oid: "1.1",
            decoder: Decoder::PageCount,
            priority: 1,
        },
        ScalarProbe {
            name: "b",
            oid: "1.2",
            decoder: Decoder::PageCount,
            priority: 2,
        },
        ScalarProbe {
            name: "c",
            oid: "1.3",
            decoder: Decoder::PageCount,
            priority: 3,
        },
        ScalarProbe {
            name: "d",
            oid: "1.4",
            decoder: Decoder::Text(Field::Model),
            priority: 4,
        },
    ];

    #[tokio::test]
    async fn test_settled_counter_skips_later_sources() {
        let mut connection = ScriptedConnection {
            values: HashMap::from([
                ("1.1", SnmpValue::Integer(0)),
                ("1.2", SnmpValue::Counter32(1200)),
                ("1.3", SnmpValue::Integer(900)),
                ("1.4", SnmpValue::text("HL-L2350DW")),
            ]),
            requested: Vec::new(),
        };

        let observations = read_scalars(&mut connection, "h", PROBES).await;

        assert_eq!(connection.requested, vec!["1.1", "1.2", "1.4"]);
        let mut status = DeviceStatus::new("h");
        observations.apply(&mut status);
        assert_eq!(status.total_pages, 1200);
        assert_eq!(status.model, "HL-L2350DW");
    }

    #[tokio::test]
    async fn test_type_mismatch_is_absorbed() {
        let mut connection = ScriptedConnection {
            values: HashMap::from([("1.1", SnmpValue::text("many"))]),
            requested: Vec::new(),
        };

        let observations = read_scalars(&mut connection, "h", PROBES).await;

        assert!(observations.is_empty());
        assert_eq!(connection.requested.len(), 4);
    }

    #[test]
    fn test_connect_params_carry_settings() {
        let aggregator = Aggregator::new(PollSettings {
            community: "private".to_string(),
            version: SnmpVersion::V1,
            timeout: Duration::from_millis(250),
            retries: 0,
            handshake: false,
        });

        let params = aggregator.connect_params("10.0.0.5:161");

        assert_eq!(params.address, "10.0.0.5:161");
        assert_eq!(params.community, "private");
        assert_eq!(params.version, SnmpVersion::V1);
        assert_eq!(params.timeout, Duration::from_millis(250));
        assert_eq!(params.retries, 0);
        assert!(!params.handshake);
    }
}
