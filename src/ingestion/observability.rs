//! Hooks for watching loads succeed or fail.

use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::error::IngestionError;
use crate::types::{DataSet, Value};

use super::unified::IngestionFormat;

/// How bad a failed load is. Ordered, so it can be compared with an alert threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// The file was read but its content was rejected (bad header, bad cell, broken invariant).
    Error,
    /// The file could not be read at all.
    Critical,
}

impl IngestionSeverity {
    pub(crate) fn of(error: &IngestionError) -> Self {
        match error {
            IngestionError::Io(_) => Self::Critical,
            IngestionError::Csv(err) if matches!(err.kind(), ::csv::ErrorKind::Io(_)) => Self::Critical,
            _ => Self::Error,
        }
    }
}

/// Which file a load was about.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    pub path: PathBuf,
    pub format: IngestionFormat,
}

impl IngestionContext {
    pub fn new(path: &Path, format: IngestionFormat) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
        }
    }
}

/// Shape of a successfully loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    pub rows: usize,
    pub columns: usize,
    /// Cells that were blank or missing in the source.
    pub null_cells: usize,
}

impl IngestionStats {
    pub fn of(dataset: &DataSet) -> Self {
        Self {
            rows: dataset.row_count(),
            columns: dataset.schema.fields.len(),
            null_cells: dataset.rows.iter().flatten().filter(|v| matches!(v, Value::Null)).count(),
        }
    }
}

/// Observer interface for load outcomes.
pub trait IngestionObserver: Send + Sync {
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called after [`Self::on_failure`] when the severity reaches the configured threshold.
    ///
    /// Defaults to doing nothing more.
    fn on_alert(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}
}

/// Writes load outcomes to the `log` facade under target `ingest`.
#[derive(Debug, Default)]
pub struct LogObserver;

impl IngestionObserver for LogObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        info!(
            target: "ingest",
            "loaded {} rows x {} columns from {} ({:?})",
            stats.rows,
            stats.columns,
            ctx.path.display(),
            ctx.format
        );
        if stats.null_cells > 0 {
            warn!(
                target: "ingest",
                "{} has {} empty cells; those rows are skipped by filters and aggregates on that column",
                ctx.path.display(),
                stats.null_cells
            );
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        error!(target: "ingest", "[{severity:?}] cannot load {}: {error}", ctx.path.display());
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, _error: &IngestionError) {
        error!(target: "ingest", "ALERT {severity:?}: dataset {} is unavailable", ctx.path.display());
    }
}
