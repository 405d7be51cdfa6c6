//! The listing dataset: canonical schema, typed row access and load-time validation.
//!
//! A [`ListingDataset`] is constructed once (usually via [`ListingDataset::load`]) and then
//! shared read-only by every query. Cloning it only bumps a reference count.

use std::path::Path;
use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use crate::error::{IngestionError, IngestionResult};
use crate::ingestion::unified::{load_and_report, read_path};
use crate::ingestion::IngestionOptions;
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Column names of the cleaned listings file.
pub mod columns {
    pub const COUNTRY: &str = "Country";
    pub const PROPERTY_TYPE: &str = "Property_type";
    pub const ROOM_TYPE: &str = "Room_type";
    pub const HOST_NAME: &str = "Host_name";
    pub const NAME: &str = "Name";
    pub const PRICE: &str = "Price";
    pub const AVAILABILITY_365: &str = "Availability_365";
}

/// Upper bound of `Availability_365` (days in a year).
pub const MAX_AVAILABILITY: i64 = 365;

/// The typed schema every listing dataset is ingested with.
pub fn listing_schema() -> Schema {
    Schema::new(vec![
        Field::new(columns::COUNTRY, DataType::Utf8),
        Field::new(columns::PROPERTY_TYPE, DataType::Utf8),
        Field::new(columns::ROOM_TYPE, DataType::Utf8),
        Field::new(columns::HOST_NAME, DataType::Utf8),
        Field::new(columns::NAME, DataType::Utf8),
        Field::new(columns::PRICE, DataType::Float64),
        Field::new(columns::AVAILABILITY_365, DataType::Int64),
    ])
}

/// Borrowed, typed view of one dataset row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listing<'a> {
    pub country: Option<&'a str>,
    pub property_type: Option<&'a str>,
    pub room_type: Option<&'a str>,
    pub host_name: Option<&'a str>,
    pub name: Option<&'a str>,
    pub price: Option<f64>,
    pub availability_365: Option<i64>,
}

/// Owned listing record, handy for building datasets in code.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListingRecord {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Property_type")]
    pub property_type: String,
    #[serde(rename = "Room_type")]
    pub room_type: String,
    #[serde(rename = "Host_name")]
    pub host_name: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Availability_365")]
    pub availability_365: i64,
}

impl ListingRecord {
    fn into_row(self) -> Vec<Value> {
        vec![
            Value::Utf8(self.country),
            Value::Utf8(self.property_type),
            Value::Utf8(self.room_type),
            Value::Utf8(self.host_name),
            Value::Utf8(self.name),
            Value::Float64(self.price),
            Value::Int64(self.availability_365),
        ]
    }
}

/// Positions of the listing columns inside a dataset schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ListingColumns {
    country: usize,
    property_type: usize,
    room_type: usize,
    host_name: usize,
    name: usize,
    price: usize,
    availability_365: usize,
}

impl ListingColumns {
    fn resolve(schema: &Schema) -> IngestionResult<Self> {
        let find = |name: &str, accepts: fn(DataType) -> bool, expected: &str| -> IngestionResult<usize> {
            let idx = schema.index_of(name).ok_or_else(|| IngestionError::SchemaMismatch {
                message: format!("listing dataset is missing column '{name}'"),
            })?;
            if !accepts(schema.fields[idx].data_type) {
                return Err(IngestionError::SchemaMismatch {
                    message: format!(
                        "listing column '{name}' must be {expected}, found {:?}",
                        schema.fields[idx].data_type
                    ),
                });
            }
            Ok(idx)
        };
        let text = |t: DataType| t == DataType::Utf8;

        Ok(Self {
            country: find(columns::COUNTRY, text, "Utf8")?,
            property_type: find(columns::PROPERTY_TYPE, text, "Utf8")?,
            room_type: find(columns::ROOM_TYPE, text, "Utf8")?,
            host_name: find(columns::HOST_NAME, text, "Utf8")?,
            name: find(columns::NAME, text, "Utf8")?,
            price: find(columns::PRICE, DataType::is_numeric, "numeric")?,
            availability_365: find(columns::AVAILABILITY_365, |t: DataType| t == DataType::Int64, "Int64")?,
        })
    }
}

/// Immutable, shareable handle to a validated listing dataset.
#[derive(Debug, Clone)]
pub struct ListingDataset {
    data: Arc<DataSet>,
    cols: ListingColumns,
}

impl ListingDataset {
    /// Ingest `path` with [`listing_schema`] and validate it.
    ///
    /// Observers configured in `options` see a single outcome: a file that parses but breaks a
    /// listing invariant is reported as a failure.
    pub fn load(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<Self> {
        let path = path.as_ref();
        load_and_report(path, options, |format| {
            read_path(path, format, &listing_schema()).and_then(Self::from_dataset)
        })
    }

    /// Wrap an already-ingested dataset after checking schema and invariants.
    pub fn from_dataset(dataset: DataSet) -> IngestionResult<Self> {
        let cols = ListingColumns::resolve(&dataset.schema)?;
        validate_rows(&dataset, &cols)?;
        debug!("listing dataset ready: {} rows", dataset.row_count());
        Ok(Self {
            data: Arc::new(dataset),
            cols,
        })
    }

    /// Build a dataset from owned records.
    pub fn from_records(records: impl IntoIterator<Item = ListingRecord>) -> IngestionResult<Self> {
        let rows = records.into_iter().map(ListingRecord::into_row).collect();
        Self::from_dataset(DataSet::new(listing_schema(), rows))
    }

    /// The underlying dataset.
    pub fn dataset(&self) -> &DataSet {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.rows.is_empty()
    }

    /// Typed access to row `idx`.
    pub fn listing(&self, idx: usize) -> Option<Listing<'_>> {
        self.data.row(idx).map(|row| self.typed(row))
    }

    /// Iterate all rows as [`Listing`]s in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = Listing<'_>> + '_ {
        self.data.rows.iter().map(|row| self.typed(row))
    }

    fn typed<'a>(&self, row: &'a [Value]) -> Listing<'a> {
        let text = |idx: usize| row.get(idx).and_then(Value::as_str);
        Listing {
            country: text(self.cols.country),
            property_type: text(self.cols.property_type),
            room_type: text(self.cols.room_type),
            host_name: text(self.cols.host_name),
            name: text(self.cols.name),
            price: row.get(self.cols.price).and_then(Value::as_f64),
            availability_365: match row.get(self.cols.availability_365) {
                Some(Value::Int64(v)) => Some(*v),
                _ => None,
            },
        }
    }
}

impl AsRef<DataSet> for ListingDataset {
    fn as_ref(&self) -> &DataSet {
        &self.data
    }
}

/// Per-row listing invariants:
///
/// - `Price` must be finite and `>= 0`
/// - `Availability_365` must lie in `0..=365`
///
/// Nulls are accepted; they simply never satisfy a filter.
fn validate_rows(dataset: &DataSet, cols: &ListingColumns) -> IngestionResult<()> {
    for (idx0, row) in dataset.rows.iter().enumerate() {
        let row_num = idx0 + 1;
        if let Some(price) = row.get(cols.price).and_then(Value::as_f64) {
            if !price.is_finite() || price < 0.0 {
                return Err(IngestionError::InvalidValue {
                    row: row_num,
                    column: columns::PRICE.to_string(),
                    message: format!("price must be a finite number >= 0, got {price}"),
                });
            }
        }
        if let Some(Value::Int64(days)) = row.get(cols.availability_365) {
            if !(0..=MAX_AVAILABILITY).contains(days) {
                return Err(IngestionError::InvalidValue {
                    row: row_num,
                    column: columns::AVAILABILITY_365.to_string(),
                    message: format!("availability must be within 0..={MAX_AVAILABILITY}, got {days}"),
                });
            }
        }
    }
    Ok(())
}
