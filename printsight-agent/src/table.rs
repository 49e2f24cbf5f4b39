//! Accumulation of walked SNMP tables.
//!
//! A walk delivers one column value per callback, in whatever order the agent
//! returns them. Rows are keyed by their composite index and kept in the
//! order each index was first seen.

use std::collections::HashMap;

use crate::oid::{row_suffix, split_column};
use crate::status::{PaperTray, Supply, SupplyLevel};
use crate::value::SnmpValue;

/// Insertion-ordered map from composite row index to row.
#[derive(Debug, Clone)]
pub struct IndexedRows<R> {
    rows: Vec<(String, R)>,
    positions: HashMap<String, usize>,
}

impl<R> Default for IndexedRows<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<R: Default> IndexedRows<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The row for `index`, created empty on first sight.
    pub fn entry(&mut self, index: &str) -> &mut R {
        let position = match self.positions.get(index) {
            Some(&position) => position,
            None => {
                self.rows.push((index.to_string(), R::default()));
                self.positions.insert(index.to_string(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        &mut self.rows[position].1
    }
}

impl<R> IndexedRows<R> {
    pub fn get(&self, index: &str) -> Option<&R> {
        self.positions.get(index).map(|&position| &self.rows[position].1)
    }

    /// Rows in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &R)> {
        self.rows.iter().map(|(index, row)| (index.as_str(), row))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// prtMarkerSuppliesType value for toner.
pub const SUPPLY_TONER: i64 = 3;
/// prtMarkerSuppliesType value for the photoconductor (drum).
pub const SUPPLY_DRUM: i64 = 9;
/// Levels a device reports for a present supply of unknown amount.
pub const LEVEL_SENTINELS: [i64; 2] = [-2, -3];

// prtMarkerSuppliesEntry columns
const SUPPLY_COL_TYPE: u32 = 5;
const SUPPLY_COL_DESCRIPTION: u32 = 6;
const SUPPLY_COL_MAX_CAPACITY: u32 = 8;
const SUPPLY_COL_LEVEL: u32 = 9;

/// One row of the supplies table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplyRow {
    pub class: Option<i64>,
    pub description: String,
    pub max_capacity: Option<i64>,
    pub level: Option<i64>,
}

/// Supplies table accumulated from a walk of prtMarkerSuppliesEntry.
#[derive(Debug, Clone, Default)]
pub struct SupplyTable {
    rows: IndexedRows<SupplyRow>,
}

impl SupplyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one walked value. Columns other than type, description,
    /// capacity and level are ignored.
    pub fn visit(&mut self, prefix: &str, oid: &str, value: &SnmpValue) {
        let Some((column, index)) = row_suffix(oid, prefix).and_then(split_column) else {
            return;
        };

        match column {
            SUPPLY_COL_TYPE => self.rows.entry(index).class = value.integer().ok(),
            SUPPLY_COL_DESCRIPTION => self.rows.entry(index).description = value.to_text(),
            SUPPLY_COL_MAX_CAPACITY => self.rows.entry(index).max_capacity = value.integer().ok(),
            SUPPLY_COL_LEVEL => self.rows.entry(index).level = value.integer().ok(),
            _ => {}
        }
    }

    /// Summarize the first usable row of a supply class.
    ///
    /// The first row with a positive capacity and a non-negative level gives
    /// `floor(level * 100 / max)`, capped at 100. Otherwise a row reporting a
    /// level sentinel makes the supply `Unknown`. Rows are never averaged.
    pub fn summarize(&self, class: i64) -> Supply {
        let rows: Vec<&SupplyRow> = self
            .rows
            .iter()
            .map(|(_, row)| row)
            .filter(|row| row.class == Some(class))
            .collect();

        let describe = |row: &SupplyRow, remaining: SupplyLevel| Supply {
            description: row.description.clone(),
            level: row.level.unwrap_or_default(),
            max_capacity: row.max_capacity.unwrap_or_default(),
            remaining,
        };

        let computed = rows.iter().find_map(|row| {
            let (max, level) = (row.max_capacity?, row.level?);
            // Device values can be anywhere in i64; the product needs more room.
            (max > 0 && level >= 0)
                .then(|| (*row, (i128::from(level) * 100 / i128::from(max)).min(100)))
        });
        if let Some((row, percent)) = computed {
            let percent = u8::try_from(percent).unwrap_or(100);
            return describe(row, SupplyLevel::Percent(percent));
        }

        if let Some(row) = rows
            .iter()
            .find(|row| row.level.is_some_and(|level| LEVEL_SENTINELS.contains(&level)))
        {
            return describe(*row, SupplyLevel::Unknown);
        }

        rows.first()
            .map(|row| describe(*row, SupplyLevel::NotApplicable))
            .unwrap_or_default()
    }
}

// prtInputEntry columns
const TRAY_COL_MAX_CAPACITY: u32 = 9;
const TRAY_COL_STATUS: u32 = 11;
const TRAY_COL_NAME: u32 = 13;

/// Highest valid Printer-MIB sub-unit status.
const TRAY_STATUS_MAX: i64 = 126;

/// One row of the input (tray) table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrayRow {
    pub name: String,
    pub status: Option<i64>,
    pub capacity: Option<i64>,
}

/// Input table accumulated from a walk of prtInputEntry.
#[derive(Debug, Clone, Default)]
pub struct TrayTable {
    rows: IndexedRows<TrayRow>,
}

impl TrayTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visit(&mut self, prefix: &str, oid: &str, value: &SnmpValue) {
        let Some((column, index)) = row_suffix(oid, prefix).and_then(split_column) else {
            return;
        };

        match column {
            TRAY_COL_NAME => self.rows.entry(index).name = value.to_text(),
            TRAY_COL_STATUS => self.rows.entry(index).status = value.integer().ok(),
            TRAY_COL_MAX_CAPACITY => self.rows.entry(index).capacity = value.integer().ok(),
            _ => {}
        }
    }

    /// Trays with a name and a recognized status, in first-seen order.
    pub fn trays(&self) -> Vec<PaperTray> {
        self.rows
            .iter()
            .filter_map(|(index, row)| {
                let status = row.status.filter(|s| (0..=TRAY_STATUS_MAX).contains(s))?;
                (!row.name.is_empty()).then(|| PaperTray {
                    index: index.to_string(),
                    name: row.name.clone(),
                    status,
                    capacity: row.capacity.unwrap_or(0),
                })
            })
            .collect()
    }
}

/// Alert entries kept from a walk, in visit order.
#[derive(Debug, Clone, Default)]
pub struct AlertList {
    alerts: Vec<String>,
}

impl AlertList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the value unless it is empty or `"0"`.
    pub fn visit(&mut self, value: &SnmpValue) {
        let text = value.to_text();
        if !text.is_empty() && text != "0" {
            self.alerts.push(text);
        }
    }

    pub fn into_alerts(self) -> Vec<String> {
        self.alerts
    }
}
