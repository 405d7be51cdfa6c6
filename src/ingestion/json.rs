//! JSON ingestion implementation.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"Price":1}, {"Price":2}]`
//! - Newline-delimited JSON (NDJSON), e.g. a `mongoexport` dump
//!
//! Nested fields are addressed with dot paths in schema field names (e.g. `address.country`).
//! MongoDB extended-JSON number wrappers (`{"$numberDecimal": "80.00"}` and friends) are
//! unwrapped before conversion. Integer columns accept integral floats such as `239.0`.

use std::fs;
use std::path::Path;

use log::debug;
use serde_json::{Map, Value as JsonValue};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, DataType, Schema, Value};

use super::csv::{integral, parse_int};

const EXTENDED_NUMBER_KEYS: [&str; 4] = ["$numberDecimal", "$numberDouble", "$numberInt", "$numberLong"];

/// Ingest a JSON file into an in-memory `DataSet`.
pub fn ingest_json_from_path(path: impl AsRef<Path>, schema: &Schema) -> IngestionResult<DataSet> {
    let path = path.as_ref();
    debug!("reading json from {}", path.display());
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text, schema)
}

/// Ingest JSON from an in-memory string into a [`DataSet`].
pub fn ingest_json_from_str(input: &str, schema: &Schema) -> IngestionResult<DataSet> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // A single document (array or object) first, NDJSON otherwise.
    if let Ok(v) = serde_json::from_str::<JsonValue>(trimmed) {
        match &v {
            JsonValue::Array(items) => ingest_json_values(items, schema),
            JsonValue::Object(_) => ingest_json_values(std::slice::from_ref(&v), schema),
            _ => Err(IngestionError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        }
    } else {
        let mut values = Vec::new();
        for (i, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v = serde_json::from_str::<JsonValue>(line).map_err(|e| IngestionError::SchemaMismatch {
                message: format!("invalid ndjson at line {}: {}", i + 1, e),
            })?;
            values.push(v);
        }
        ingest_json_values(&values, schema)
    }
}

fn ingest_json_values(values: &[JsonValue], schema: &Schema) -> IngestionResult<DataSet> {
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(values.len());

    for (idx0, v) in values.iter().enumerate() {
        let row_num = idx0 + 1;
        let obj = v.as_object().ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!("row {row_num} is not a json object"),
        })?;

        let mut row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let jv = get_by_dot_path(obj, &field.name).ok_or_else(|| IngestionError::SchemaMismatch {
                message: format!("row {row_num} missing required field '{}'", field.name),
            })?;
            row.push(convert_json_value(row_num, &field.name, field.data_type, unwrap_extended(jv))?);
        }
        rows.push(row);
    }

    debug!("parsed {} json rows", rows.len());
    Ok(DataSet::new(schema.clone(), rows))
}

fn get_by_dot_path<'a>(root: &'a Map<String, JsonValue>, path: &str) -> Option<&'a JsonValue> {
    // Exact key first: exported column names may themselves contain dots.
    if let Some(v) = root.get(path) {
        return Some(v);
    }

    let mut segments = path.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// `{"$numberDecimal": "80.00"}` -> `"80.00"`; anything else is returned unchanged.
fn unwrap_extended(v: &JsonValue) -> &JsonValue {
    match v.as_object() {
        Some(map) if map.len() == 1 => EXTENDED_NUMBER_KEYS
            .iter()
            .find_map(|k| map.get(*k))
            .unwrap_or(v),
        _ => v,
    }
}

fn convert_json_value(
    row: usize,
    column: &str,
    data_type: DataType,
    v: &JsonValue,
) -> IngestionResult<Value> {
    if v.is_null() {
        return Ok(Value::Null);
    }

    let parse_error = |message: &str| IngestionError::ParseError {
        row,
        column: column.to_string(),
        raw: v.to_string(),
        message: message.to_string(),
    };

    match data_type {
        DataType::Utf8 => v
            .as_str()
            .map(|s| Value::Utf8(s.to_string()))
            .ok_or_else(|| parse_error("expected string")),
        DataType::Bool => v.as_bool().map(Value::Bool).ok_or_else(|| parse_error("expected bool")),
        DataType::Int64 => {
            if let Some(n) = v.as_i64() {
                Ok(Value::Int64(n))
            } else if let Some(n) = v.as_u64() {
                i64::try_from(n)
                    .map(Value::Int64)
                    .map_err(|_| parse_error("u64 out of range for i64"))
            } else if let Some(f) = v.as_f64() {
                integral(f)
                    .map(Value::Int64)
                    .ok_or_else(|| parse_error("expected integer number"))
            } else if let Some(s) = v.as_str() {
                parse_int(s.trim())
                    .map(Value::Int64)
                    .map_err(|_| parse_error("expected integer number"))
            } else {
                Err(parse_error("expected integer number"))
            }
        }
        DataType::Float64 => match v {
            JsonValue::Number(n) => n
                .as_f64()
                .map(Value::Float64)
                .ok_or_else(|| parse_error("expected number")),
            // Extended-JSON decimals arrive as strings.
            JsonValue::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float64)
                .map_err(|_| parse_error("expected number")),
            _ => Err(parse_error("expected number")),
        },
    }
}
