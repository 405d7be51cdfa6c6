//! Reading listing files into a [`crate::types::DataSet`].
//!
//! [`ingest_from_path`] picks the reader from the extension (or [`IngestionOptions::format`]) and
//! tells an optional [`IngestionObserver`] how the load went. Listing code normally goes through
//! [`crate::listing::ListingDataset::load`], which adds validation on top. The per-format readers
//! live in [`csv`] and [`json`].

pub mod csv;
pub mod json;
pub mod observability;
pub mod unified;

pub use observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, LogObserver};
pub use unified::{ingest_from_path, IngestionFormat, IngestionOptions};
