//! Filter criteria and the row predicates they compile to.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::listing::{columns, ListingDataset};
use crate::processing::aggregate::{distinct_values, numeric_range};
use crate::processing::view::DataView;
use crate::types::{DataType, Schema, Value};

/// A single column constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The string value of `column` must be one of `allowed`. An empty set matches nothing.
    OneOf {
        column: String,
        allowed: BTreeSet<String>,
    },
    /// The numeric value of `column` must lie in the inclusive interval `[min, max]`.
    Between { column: String, min: f64, max: f64 },
}

impl Predicate {
    pub fn one_of<I, S>(column: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf {
            column: column.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn between(column: impl Into<String>, min: f64, max: f64) -> Self {
        Self::Between {
            column: column.into(),
            min,
            max,
        }
    }
}

/// User-selected constraints narrowing which listings are considered.
///
/// All constraints are conjunctive. An empty allowed set excludes every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub countries: BTreeSet<String>,
    pub property_types: BTreeSet<String>,
    pub room_types: BTreeSet<String>,
    pub price_min: f64,
    pub price_max: f64,
}

impl FilterCriteria {
    /// Criteria that select every listing: all distinct values of each categorical column and
    /// the full observed price range. This is the dashboard's initial widget state.
    ///
    /// An empty dataset yields empty sets and a `[0, 0]` price range.
    pub fn select_all(listings: &ListingDataset) -> QueryResult<Self> {
        let view = DataView::all(listings.dataset());
        let strings = |column: &str| -> QueryResult<BTreeSet<String>> {
            Ok(distinct_values(&view, column)?
                .into_iter()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect())
        };
        let (price_min, price_max) = numeric_range(&view, columns::PRICE)?.unwrap_or((0.0, 0.0));

        Ok(Self {
            countries: strings(columns::COUNTRY)?,
            property_types: strings(columns::PROPERTY_TYPE)?,
            room_types: strings(columns::ROOM_TYPE)?,
            price_min,
            price_max,
        })
    }

    /// Returns [`QueryError::InvalidRange`] unless `price_min <= price_max` with finite bounds.
    pub fn validate(&self) -> QueryResult<()> {
        check_range(self.price_min, self.price_max)
    }

    /// The four predicates these criteria stand for.
    pub fn predicates(&self) -> Vec<Predicate> {
        vec![
            Predicate::one_of(columns::COUNTRY, self.countries.iter().cloned()),
            Predicate::one_of(columns::PROPERTY_TYPE, self.property_types.iter().cloned()),
            Predicate::one_of(columns::ROOM_TYPE, self.room_types.iter().cloned()),
            Predicate::between(columns::PRICE, self.price_min, self.price_max),
        ]
    }
}

fn check_range(min: f64, max: f64) -> QueryResult<()> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(QueryError::InvalidRange { min, max })
    }
}

#[derive(Debug, Clone)]
enum Check {
    OneOf { idx: usize, allowed: BTreeSet<String> },
    Between { idx: usize, min: f64, max: f64 },
}

/// Predicates resolved against a schema, ready to test rows.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    checks: Vec<Check>,
}

impl CompiledFilter {
    /// Resolve column names and validate bounds.
    ///
    /// Errors with [`QueryError::UnknownColumn`] for absent columns, [`QueryError::ColumnType`]
    /// when a set constraint targets a non-string column or a range targets a non-numeric one,
    /// and [`QueryError::InvalidRange`] for inverted or non-finite bounds.
    pub fn compile(schema: &Schema, predicates: &[Predicate]) -> QueryResult<Self> {
        let checks = predicates
            .iter()
            .map(|p| match p {
                Predicate::OneOf { column, allowed } => {
                    let (idx, data_type) = schema.require(column)?;
                    if data_type != DataType::Utf8 {
                        return Err(QueryError::ColumnType {
                            column: column.clone(),
                            expected: "Utf8",
                        });
                    }
                    Ok(Check::OneOf {
                        idx,
                        allowed: allowed.clone(),
                    })
                }
                Predicate::Between { column, min, max } => {
                    let (idx, _) = schema.require_numeric(column)?;
                    check_range(*min, *max)?;
                    Ok(Check::Between {
                        idx,
                        min: *min,
                        max: *max,
                    })
                }
            })
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(Self { checks })
    }

    /// True if `row` satisfies every check. Nulls never satisfy a check.
    pub fn matches(&self, row: &[Value]) -> bool {
        self.checks.iter().all(|check| match check {
            Check::OneOf { idx, allowed } => row
                .get(*idx)
                .and_then(Value::as_str)
                .is_some_and(|s| allowed.contains(s)),
            Check::Between { idx, min, max } => row
                .get(*idx)
                .and_then(Value::as_f64)
                .is_some_and(|v| *min <= v && v <= *max),
        })
    }
}
