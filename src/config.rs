//! File-based configuration for the dashboard binary.
//!
//! Options are read from a JSON document; every field is optional and falls back to
//! [`DashboardOptions::default`]:
//!
//! ```json
//! {
//!   "data_path": "Airbnb_data.csv",
//!   "format": "csv",
//!   "top_n": 10,
//!   "chunk_size": 4096,
//!   "selection": { "countries": ["Spain", "Portugal"], "price_max": 500.0 }
//! }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::dashboard::DEFAULT_TOP_N;
use crate::ingestion::IngestionFormat;
use crate::processing::FilterCriteria;

/// Error returned when a config file cannot be read or parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Dashboard settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardOptions {
    /// Listings file to load.
    pub data_path: PathBuf,
    /// Overrides extension-based format detection.
    pub format: Option<IngestionFormat>,
    /// Size of the "top N" bar charts.
    pub top_n: usize,
    /// Rows per chunk when running on the parallel engine.
    pub chunk_size: usize,
    /// Initial selection; unset parts select everything.
    pub selection: Selection,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("Airbnb_data.csv"),
            format: None,
            top_n: DEFAULT_TOP_N,
            chunk_size: 4_096,
            selection: Selection::default(),
        }
    }
}

impl DashboardOptions {
    /// Read options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// A partial selection. `None` means "everything" for that widget.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Selection {
    pub countries: Option<BTreeSet<String>>,
    pub property_types: Option<BTreeSet<String>>,
    pub room_types: Option<BTreeSet<String>>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

impl Selection {
    /// Overlay the set parts of this selection on `base` (usually the select-all criteria).
    pub fn apply_to(&self, mut base: FilterCriteria) -> FilterCriteria {
        if let Some(c) = &self.countries {
            base.countries = c.clone();
        }
        if let Some(p) = &self.property_types {
            base.property_types = p.clone();
        }
        if let Some(r) = &self.room_types {
            base.room_types = r.clone();
        }
        if let Some(min) = self.price_min {
            base.price_min = min;
        }
        if let Some(max) = self.price_max {
            base.price_max = max;
        }
        base
    }

    /// Fields set in `other` win.
    pub fn merge(self, other: Selection) -> Selection {
        Selection {
            countries: other.countries.or(self.countries),
            property_types: other.property_types.or(self.property_types),
            room_types: other.room_types.or(self.room_types),
            price_min: other.price_min.or(self.price_min),
            price_max: other.price_max.or(self.price_max),
        }
    }
}
