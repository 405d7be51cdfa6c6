use thiserror::Error;

pub type IngestionResult<T> = Result<T, IngestionError>;

pub type QueryResult<T> = Result<T, QueryError>;

/// Why a listings file could not be turned into a dataset.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The file's columns or document shape do not fit the schema.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A cell is not a valid value of its column type. For CSV, `row` is the file line.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// A well-typed cell breaks a listing invariant (negative price, availability past 365).
    /// `row` counts data rows from 1.
    #[error("invalid value at row {row} column '{column}': {message}")]
    InvalidValue {
        row: usize,
        column: String,
        message: String,
    },
}

/// Why a filter or aggregation could not be evaluated.
///
/// Empty results are never errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// `min > max`, or a bound is NaN or infinite.
    #[error("invalid criteria: price range [{min}, {max}] is not a valid interval")]
    InvalidRange { min: f64, max: f64 },

    #[error("invalid criteria: unknown column '{column}'")]
    UnknownColumn { column: String },

    /// E.g. a mean over a text column.
    #[error("invalid criteria: column '{column}' must be {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },
}
