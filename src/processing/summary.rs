//! Named two-column result tables handed to the charting layer.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::processing::aggregate::BoxStats;
use crate::types::{GroupKey, Value};

/// One `key -> value` row of a [`SummaryTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub key: GroupKey,
    pub value: Value,
}

/// A grouping-key-to-aggregate table with named columns.
///
/// Serializes as a list of records, e.g.
/// `[{"Property_type": "Apartment", "Listings": 12}, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub key_column: String,
    pub value_column: String,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn new(key_column: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            value_column: value_column.into(),
            rows: Vec::new(),
        }
    }

    /// Counts in the order given (see [`crate::processing::count_by`]).
    pub fn from_counts(
        key_column: impl Into<String>,
        value_column: impl Into<String>,
        counts: Vec<(GroupKey, usize)>,
    ) -> Self {
        let mut table = Self::new(key_column, value_column);
        table.rows = counts
            .into_iter()
            .map(|(key, n)| SummaryRow {
                key,
                value: Value::Int64(n as i64),
            })
            .collect();
        table
    }

    /// Means in ascending key order (see [`crate::processing::mean_by`]).
    pub fn from_means(
        key_column: impl Into<String>,
        value_column: impl Into<String>,
        means: BTreeMap<GroupKey, f64>,
    ) -> Self {
        let mut table = Self::new(key_column, value_column);
        table.rows = means
            .into_iter()
            .map(|(key, m)| SummaryRow {
                key,
                value: Value::Float64(m),
            })
            .collect();
        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value for `key`, if the group is present.
    pub fn get(&self, key: &GroupKey) -> Option<&Value> {
        self.rows.iter().find(|r| &r.key == key).map(|r| &r.value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.rows.iter().map(|r| &r.key)
    }

    /// Stable sort by ascending value; nulls sort last.
    pub fn sort_by_value_ascending(&mut self) {
        self.rows.sort_by(|a, b| match (a.value.as_f64(), b.value.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }

    /// Keep only the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        self.rows.truncate(n);
    }

    /// Replace float values by their integer part (truncation toward zero).
    pub fn truncate_values_to_int(&mut self) {
        for row in &mut self.rows {
            if let Value::Float64(f) = row.value {
                row.value = Value::Int64(f.trunc() as i64);
            }
        }
    }
}

impl Serialize for SummaryTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&Record {
                key_column: &self.key_column,
                value_column: &self.value_column,
                row,
            })?;
        }
        seq.end()
    }
}

struct Record<'a> {
    key_column: &'a str,
    value_column: &'a str,
    row: &'a SummaryRow,
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.key_column, &self.row.key)?;
        map.serialize_entry(self.value_column, &self.row.value)?;
        map.end()
    }
}

/// Per-group [`BoxStats`] keyed by a named column.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxTable {
    pub key_column: String,
    pub value_column: String,
    pub groups: Vec<(GroupKey, BoxStats)>,
}

impl BoxTable {
    pub fn new(
        key_column: impl Into<String>,
        value_column: impl Into<String>,
        groups: BTreeMap<GroupKey, BoxStats>,
    ) -> Self {
        Self {
            key_column: key_column.into(),
            value_column: value_column.into(),
            groups: groups.into_iter().collect(),
        }
    }
}

impl Serialize for BoxTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.groups.len()))?;
        for (key, stats) in &self.groups {
            seq.serialize_element(&BoxRecord {
                key_column: &self.key_column,
                key,
                stats,
            })?;
        }
        seq.end()
    }
}

struct BoxRecord<'a> {
    key_column: &'a str,
    key: &'a GroupKey,
    stats: &'a BoxStats,
}

impl Serialize for BoxRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7))?;
        map.serialize_entry(self.key_column, self.key)?;
        map.serialize_entry("count", &self.stats.count)?;
        map.serialize_entry("min", &self.stats.min)?;
        map.serialize_entry("q1", &self.stats.q1)?;
        map.serialize_entry("median", &self.stats.median)?;
        map.serialize_entry("q3", &self.stats.q3)?;
        map.serialize_entry("max", &self.stats.max)?;
        map.end()
    }
}
