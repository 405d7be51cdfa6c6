//! Path-based ingestion with format detection and outcome reporting.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, Schema};

use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::{csv, json};

/// File formats listings can be loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// A JSON array of objects, a single object, or NDJSON (one object per line).
    Json,
}

impl IngestionFormat {
    /// Case-insensitive lookup by file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" | "jsonl" => Some(Self::Json),
            _ => None,
        }
    }

    /// The forced format if any, otherwise the one implied by the path's extension.
    pub fn resolve(forced: Option<Self>, path: &Path) -> IngestionResult<Self> {
        if let Some(format) = forced {
            return Ok(format);
        }
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!(
                "cannot tell the format of {} from its extension; expected .csv, .json, .ndjson or .jsonl",
                path.display()
            ),
        })
    }
}

/// How a file is loaded and who hears about it.
#[derive(Clone)]
pub struct IngestionOptions {
    /// `None` detects the format from the file extension.
    pub format: Option<IngestionFormat>,
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Failures at or above this severity also trigger [`IngestionObserver::on_alert`].
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Read `path` into a [`DataSet`] shaped by `schema`.
///
/// The observer in `options`, if any, is told about the outcome exactly once.
///
/// ```no_run
/// use listing_insights::ingestion::{ingest_from_path, IngestionOptions};
/// use listing_insights::types::{DataType, Field, Schema};
///
/// # fn main() -> Result<(), listing_insights::IngestionError> {
/// let schema = Schema::new(vec![
///     Field::new("Country", DataType::Utf8),
///     Field::new("Price", DataType::Float64),
/// ]);
/// let ds = ingest_from_path("Airbnb_data.csv", &schema, &IngestionOptions::default())?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    schema: &Schema,
    options: &IngestionOptions,
) -> IngestionResult<DataSet> {
    let path = path.as_ref();
    load_and_report(path, options, |format| read_path(path, format, schema))
}

/// Resolve the format, run `load`, and report its outcome to the configured observer.
///
/// A format that cannot be resolved is reported against [`IngestionFormat::Csv`].
pub(crate) fn load_and_report<T, F>(path: &Path, options: &IngestionOptions, load: F) -> IngestionResult<T>
where
    T: AsRef<DataSet>,
    F: FnOnce(IngestionFormat) -> IngestionResult<T>,
{
    let format = IngestionFormat::resolve(options.format, path);
    let reported_as = *format.as_ref().unwrap_or(&IngestionFormat::Csv);
    let result = format.and_then(load);

    if let Some(obs) = options.observer.as_deref() {
        let ctx = IngestionContext::new(path, reported_as);
        match &result {
            Ok(loaded) => obs.on_success(&ctx, IngestionStats::of(loaded.as_ref())),
            Err(e) => {
                let severity = IngestionSeverity::of(e);
                obs.on_failure(&ctx, severity, e);
                if severity >= options.alert_at_or_above {
                    obs.on_alert(&ctx, severity, e);
                }
            }
        }
    }
    result
}

pub(crate) fn read_path(path: &Path, format: IngestionFormat, schema: &Schema) -> IngestionResult<DataSet> {
    match format {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path, schema),
        IngestionFormat::Json => json::ingest_json_from_path(path, schema),
    }
}
