//! Field merge policy.
//!
//! Scalar probes do not write into the record directly. Each decoded value is
//! recorded as an [`Observation`] tagged with its source's merge priority, and
//! [`Observations::apply`] resolves every field once, after all probes ran,
//! using the rule listed for it in [`POLICY`]. Sources are visited in
//! ascending priority, so the outcome does not depend on execution order.
//!
//! Table-backed fields (toner, drum, alerts, trays) each come from a single
//! walk and are assigned by the aggregator.

use crate::decode::PrinterState;
use crate::status::DeviceStatus;

/// A scalar field of [`DeviceStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Model,
    SerialNumber,
    Firmware,
    DeviceName,
    PrinterName,
    SystemDescription,
    Capabilities,
    Status,
    Uptime,
    DeviceStatusCode,
    ErrorCode,
    PaperStatus,
    ErrorDescription,
    TotalPages,
    CounterUnit,
}

/// How conflicting observations of one field are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// A later non-empty value replaces an earlier one; an empty value only
    /// fills a field nothing else has set.
    NonEmptyLastWins,
    /// The last observation in priority order wins unconditionally.
    LastWins,
    /// The first strictly positive value wins; later sources are not queried.
    FirstPositive,
}

/// The merge rule of every scalar field.
pub const POLICY: &[(Field, MergeRule)] = &[
    (Field::Model, MergeRule::NonEmptyLastWins),
    (Field::SerialNumber, MergeRule::NonEmptyLastWins),
    (Field::Firmware, MergeRule::NonEmptyLastWins),
    (Field::DeviceName, MergeRule::NonEmptyLastWins),
    (Field::PrinterName, MergeRule::NonEmptyLastWins),
    (Field::SystemDescription, MergeRule::NonEmptyLastWins),
    (Field::Capabilities, MergeRule::NonEmptyLastWins),
    (Field::Status, MergeRule::LastWins),
    (Field::Uptime, MergeRule::LastWins),
    (Field::DeviceStatusCode, MergeRule::LastWins),
    (Field::ErrorCode, MergeRule::NonEmptyLastWins),
    (Field::PaperStatus, MergeRule::NonEmptyLastWins),
    (Field::ErrorDescription, MergeRule::NonEmptyLastWins),
    (Field::TotalPages, MergeRule::FirstPositive),
    (Field::CounterUnit, MergeRule::LastWins),
];

/// Look up the rule for a field.
pub fn rule_for(field: Field) -> MergeRule {
    POLICY
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, rule)| *rule)
        .unwrap_or(MergeRule::LastWins)
}

/// A decoded value for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Ticks(u32),
    State(PrinterState),
    /// Text from a source that found nothing to report, such as "No errors".
    /// Fills an unset field but never replaces a reported value.
    Clear(String),
}

impl FieldValue {
    /// A zero integer is empty too; only the error code merges integers
    /// under [`MergeRule::NonEmptyLastWins`].
    fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Integer(n) => *n == 0,
            FieldValue::Clear(_) => true,
            _ => false,
        }
    }

    fn is_positive(&self) -> bool {
        matches!(self, FieldValue::Integer(n) if *n > 0)
    }
}

/// One decoded value from one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub field: Field,
    pub priority: u16,
    pub value: FieldValue,
}

/// Observations collected during one poll.
#[derive(Debug, Clone, Default)]
pub struct Observations {
    entries: Vec<Observation>,
}

impl Observations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field, priority: u16, value: FieldValue) {
        self.entries.push(Observation {
            field,
            priority,
            value,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when `field` is first-positive and already has a positive value
    /// from a source ranked at or before `priority`.
    pub fn is_settled(&self, field: Field, priority: u16) -> bool {
        rule_for(field) == MergeRule::FirstPositive
            && self
                .entries
                .iter()
                .any(|o| o.field == field && o.priority <= priority && o.value.is_positive())
    }

    /// Resolve one field according to its rule.
    pub fn resolve(&self, field: Field) -> Option<&FieldValue> {
        let mut candidates: Vec<&Observation> =
            self.entries.iter().filter(|o| o.field == field).collect();
        // Stable: equal priorities keep recording order.
        candidates.sort_by_key(|o| o.priority);

        match rule_for(field) {
            MergeRule::LastWins => candidates.last().map(|o| &o.value),
            MergeRule::FirstPositive => candidates
                .iter()
                .find(|o| o.value.is_positive())
                .map(|o| &o.value),
            MergeRule::NonEmptyLastWins => {
                candidates
                    .iter()
                    .fold(None, |current: Option<&FieldValue>, o| match current {
                        Some(prev) if o.value.is_empty() && !prev.is_empty() => Some(prev),
                        _ => Some(&o.value),
                    })
            }
        }
    }

    /// Write every resolved field into `status`.
    pub fn apply(&self, status: &mut DeviceStatus) {
        for (field, _) in POLICY {
            let Some(value) = self.resolve(*field) else {
                continue;
            };
            assign(status, *field, value);
        }
    }
}

fn assign(status: &mut DeviceStatus, field: Field, value: &FieldValue) {
    match (field, value) {
        (Field::Model, FieldValue::Text(s)) => status.model = s.clone(),
        (Field::SerialNumber, FieldValue::Text(s)) => status.serial_number = s.clone(),
        (Field::Firmware, FieldValue::Text(s)) => status.firmware = s.clone(),
        (Field::DeviceName, FieldValue::Text(s)) => status.device_name = s.clone(),
        (Field::PrinterName, FieldValue::Text(s)) => status.printer_name = s.clone(),
        (Field::SystemDescription, FieldValue::Text(s)) => status.system_description = s.clone(),
        (Field::Capabilities, FieldValue::Text(s)) => status.capabilities = s.clone(),
        (Field::Status, FieldValue::State(state)) => status.status = *state,
        (Field::Uptime, FieldValue::Ticks(ticks)) => status.uptime_ticks = *ticks,
        (Field::DeviceStatusCode, FieldValue::Integer(n)) => status.device_status_code = *n,
        (Field::ErrorCode, FieldValue::Integer(n)) => status.error_code = *n,
        (Field::PaperStatus, FieldValue::Text(s) | FieldValue::Clear(s)) => {
            status.paper_status = s.clone();
        }
        (Field::ErrorDescription, FieldValue::Text(s) | FieldValue::Clear(s)) => {
            status.error_description = s.clone();
        }
        (Field::TotalPages, FieldValue::Integer(n)) => status.total_pages = *n,
        (Field::CounterUnit, FieldValue::Integer(n)) => status.counter_unit = *n,
        (field, value) => {
            tracing::warn!(?field, ?value, "Decoded value does not fit field");
        }
    }
}
