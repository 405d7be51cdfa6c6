//! CSV ingestion.
//!
//! Listing exports come from dataframe tools and spreadsheets, so the reader is lenient about
//! layout: columns are matched by (trimmed) header name in any order, unknown columns such as an
//! exported index are ignored, a UTF-8 byte-order mark on the first header is dropped, and blank
//! cells become [`Value::Null`]. Types are not lenient: a cell that does not parse as its schema
//! type fails the whole load with its line number.

use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Ingest a CSV file (with a header row) into an in-memory [`DataSet`].
pub fn ingest_csv_from_path(path: impl AsRef<Path>, schema: &Schema) -> IngestionResult<DataSet> {
    let path = path.as_ref();
    debug!("reading csv from {}", path.display());
    let mut rdr = reader_builder().from_path(path)?;
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Ingest CSV held in memory.
pub fn ingest_csv_from_str(input: &str, schema: &Schema) -> IngestionResult<DataSet> {
    let mut rdr = reader_builder().from_reader(input.as_bytes());
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Ingest CSV data from an existing reader. The reader must have been built with headers on.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
) -> IngestionResult<DataSet> {
    let plan = ColumnPlan::resolve(rdr.headers()?, schema)?;

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record)? {
        let line = record.position().map_or(rows.len() + 2, |p| p.line() as usize);
        rows.push(plan.parse_row(line, &record)?);
    }

    debug!("parsed {} csv rows", rows.len());
    Ok(DataSet::new(schema.clone(), rows))
}

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(true).trim(Trim::All);
    builder
}

/// Where each schema field lives in the CSV record.
struct ColumnPlan<'s> {
    columns: Vec<(&'s Field, usize)>,
}

impl<'s> ColumnPlan<'s> {
    fn resolve(headers: &StringRecord, schema: &'s Schema) -> IngestionResult<Self> {
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            let name = header.trim_start_matches('\u{feff}').trim();
            if by_name.insert(name, idx).is_some() && schema.index_of(name).is_some() {
                return Err(IngestionError::SchemaMismatch {
                    message: format!("column '{name}' appears more than once in the csv header"),
                });
            }
        }

        let columns = schema
            .fields
            .iter()
            .map(|field| match by_name.get(field.name.as_str()) {
                Some(&idx) => Ok((field, idx)),
                None => Err(IngestionError::SchemaMismatch {
                    message: format!(
                        "missing required column '{}'. headers={:?}",
                        field.name,
                        headers.iter().collect::<Vec<_>>()
                    ),
                }),
            })
            .collect::<IngestionResult<Vec<_>>>()?;
        Ok(Self { columns })
    }

    fn parse_row(&self, line: usize, record: &StringRecord) -> IngestionResult<Vec<Value>> {
        self.columns
            .iter()
            .map(|(field, idx)| {
                let raw = record.get(*idx).unwrap_or("");
                parse_typed_value(line, &field.name, field.data_type, raw)
            })
            .collect()
    }
}

fn parse_typed_value(line: usize, column: &str, data_type: DataType, raw: &str) -> IngestionResult<Value> {
    let cell = raw.trim();
    if cell.is_empty() {
        return Ok(Value::Null);
    }

    let parsed = match data_type {
        DataType::Utf8 => Ok(Value::Utf8(cell.to_owned())),
        DataType::Int64 => parse_int(cell).map(Value::Int64),
        DataType::Float64 => cell.parse::<f64>().map(Value::Float64).map_err(|e| e.to_string()),
        DataType::Bool => parse_bool(cell).map(Value::Bool),
    };
    parsed.map_err(|message| IngestionError::ParseError {
        row: line,
        column: column.to_owned(),
        raw: raw.to_owned(),
        message,
    })
}

/// Integer columns written by dataframe exports often carry a `.0` suffix; those are accepted
/// when the value is integral.
pub(crate) fn parse_int(s: &str) -> Result<i64, String> {
    match s.parse::<i64>() {
        Ok(v) => Ok(v),
        Err(int_err) => s.parse::<f64>().ok().and_then(integral).ok_or_else(|| int_err.to_string()),
    }
}

/// `f` as an `i64` when it is finite, has no fractional part and fits.
pub(crate) fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}
