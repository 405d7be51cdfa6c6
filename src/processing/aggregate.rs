//! Group-by aggregations over a [`DataView`].
//!
//! Every function here is pure: groups absent from the view never appear in the output (no
//! zero-filling), rows with a null grouping key are skipped, and an empty view yields an empty
//! result rather than an error.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::QueryResult;
use crate::processing::view::DataView;
use crate::types::{GroupKey, Value};

/// Per-group row counts, sorted by descending count.
///
/// Ties are broken by ascending key so the order is deterministic. With `top_n` set, only the
/// first `top_n` groups are returned.
pub fn count_by(
    view: &DataView<'_>,
    key_column: &str,
    top_n: Option<usize>,
) -> QueryResult<Vec<(GroupKey, usize)>> {
    let (key_idx, _) = view.schema().require(key_column)?;
    Ok(rank_counts(count_groups(view.rows(), key_idx), top_n))
}

/// Mean of `value_column` per group, in ascending key order.
///
/// Null values are skipped; a group whose values are all null is omitted. The mean is computed
/// in `f64` for integer and float columns alike.
pub fn mean_by(
    view: &DataView<'_>,
    key_column: &str,
    value_column: &str,
) -> QueryResult<BTreeMap<GroupKey, f64>> {
    let (key_idx, _) = view.schema().require(key_column)?;
    let (value_idx, _) = view.schema().require_numeric(value_column)?;
    Ok(finish_means(sum_groups(view.rows(), key_idx, value_idx)))
}

/// Per-group count of non-null `counted_column` values, in ascending key order.
pub fn count_non_null_by(
    view: &DataView<'_>,
    key_column: &str,
    counted_column: &str,
) -> QueryResult<Vec<(GroupKey, usize)>> {
    let (key_idx, _) = view.schema().require(key_column)?;
    let (counted_idx, _) = view.schema().require(counted_column)?;

    let mut counts: BTreeMap<GroupKey, usize> = BTreeMap::new();
    for row in view.rows() {
        let Some(key) = row.get(key_idx).and_then(GroupKey::from_value) else {
            continue;
        };
        let n = counts.entry(key).or_insert(0);
        if row.get(counted_idx).is_some_and(|v| !v.is_null()) {
            *n += 1;
        }
    }
    Ok(counts.into_iter().collect())
}

/// Five-number summary of one group, as drawn by a box plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxStats {
    /// `None` for an empty slice. Quartiles use linear interpolation between closest ranks.
    pub fn from_values(values: &mut [f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        Some(Self {
            count: values.len(),
            min: values[0],
            q1: quantile_sorted(values, 0.25),
            median: quantile_sorted(values, 0.5),
            q3: quantile_sorted(values, 0.75),
            max: values[values.len() - 1],
        })
    }
}

fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// [`BoxStats`] of `value_column` per group, in ascending key order. Nulls are skipped.
pub fn box_stats_by(
    view: &DataView<'_>,
    key_column: &str,
    value_column: &str,
) -> QueryResult<BTreeMap<GroupKey, BoxStats>> {
    let (key_idx, _) = view.schema().require(key_column)?;
    let (value_idx, _) = view.schema().require_numeric(value_column)?;

    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    for row in view.rows() {
        let (Some(key), Some(v)) = (
            row.get(key_idx).and_then(GroupKey::from_value),
            row.get(value_idx).and_then(Value::as_f64),
        ) else {
            continue;
        };
        groups.entry(key).or_default().push(v);
    }

    Ok(groups
        .into_iter()
        .filter_map(|(k, mut vals)| BoxStats::from_values(&mut vals).map(|s| (k, s)))
        .collect())
}

/// Sorted distinct non-null values of `column`.
pub fn distinct_values(view: &DataView<'_>, column: &str) -> QueryResult<BTreeSet<GroupKey>> {
    let (idx, _) = view.schema().require(column)?;
    Ok(view
        .rows()
        .filter_map(|row| row.get(idx).and_then(GroupKey::from_value))
        .collect())
}

/// `(min, max)` of a numeric column ignoring nulls, or `None` if there are no values.
pub fn numeric_range(view: &DataView<'_>, column: &str) -> QueryResult<Option<(f64, f64)>> {
    let (idx, _) = view.schema().require_numeric(column)?;
    Ok(view
        .rows()
        .filter_map(|row| row.get(idx).and_then(Value::as_f64))
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        }))
}

// Partial aggregates. The execution engine builds these per chunk and merges them.

pub(crate) fn count_groups<'r>(
    rows: impl Iterator<Item = &'r [Value]>,
    key_idx: usize,
) -> BTreeMap<GroupKey, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        if let Some(key) = row.get(key_idx).and_then(GroupKey::from_value) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

pub(crate) fn sum_groups<'r>(
    rows: impl Iterator<Item = &'r [Value]>,
    key_idx: usize,
    value_idx: usize,
) -> BTreeMap<GroupKey, (f64, usize)> {
    let mut sums: BTreeMap<GroupKey, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let (Some(key), Some(v)) = (
            row.get(key_idx).and_then(GroupKey::from_value),
            row.get(value_idx).and_then(Value::as_f64),
        ) else {
            continue;
        };
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }
    sums
}

pub(crate) fn rank_counts(counts: BTreeMap<GroupKey, usize>, top_n: Option<usize>) -> Vec<(GroupKey, usize)> {
    let mut ranked: Vec<(GroupKey, usize)> = counts.into_iter().collect();
    // Stable: equal counts keep ascending key order from the map.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some(n) = top_n {
        ranked.truncate(n);
    }
    ranked
}

pub(crate) fn finish_means(sums: BTreeMap<GroupKey, (f64, usize)>) -> BTreeMap<GroupKey, f64> {
    sums.into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect()
}
