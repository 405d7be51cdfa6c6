//! `listing-insights` loads a cleaned dataset of short-term rental listings into an in-memory
//! [`types::DataSet`] and answers the filter-and-aggregate queries behind a three-page
//! (Home / Overview / Explore) dashboard.
//!
//! ## Loading
//!
//! [`listing::ListingDataset::load`] ingests a CSV or JSON file with the canonical
//! [`listing::listing_schema`]:
//!
//! | column             | type    |
//! |--------------------|---------|
//! | `Country`          | Utf8    |
//! | `Property_type`    | Utf8    |
//! | `Room_type`        | Utf8    |
//! | `Host_name`        | Utf8    |
//! | `Name`             | Utf8    |
//! | `Price`            | Float64 |
//! | `Availability_365` | Int64   |
//!
//! and rejects rows with a negative price or an availability outside `0..=365`. The result is an
//! immutable handle that is cheap to clone and safe to share across threads.
//!
//! ```no_run
//! use listing_insights::ingestion::IngestionOptions;
//! use listing_insights::listing::ListingDataset;
//!
//! # fn main() -> Result<(), listing_insights::IngestionError> {
//! let listings = ListingDataset::load("Airbnb_data.csv", &IngestionOptions::default())?;
//! println!("rows={}", listings.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Querying
//!
//! [`processing::apply`] turns [`processing::FilterCriteria`] (allowed countries, property types,
//! room types and an inclusive price range) into a [`processing::DataView`]. Empty allowed sets
//! select nothing. Aggregations such as [`processing::count_by`] and [`processing::mean_by`] turn a
//! view into grouped results; an empty view gives empty results, never an error.
//!
//! ```rust
//! use listing_insights::listing::{columns, ListingDataset, ListingRecord};
//! use listing_insights::processing::{apply, count_by, FilterCriteria};
//!
//! let listings = ListingDataset::from_records(vec![ListingRecord {
//!     country: "Portugal".into(),
//!     property_type: "Apartment".into(),
//!     room_type: "Entire home/apt".into(),
//!     host_name: "Rui".into(),
//!     name: "Ribeira view".into(),
//!     price: 80.0,
//!     availability_365: 239,
//! }])
//! .unwrap();
//!
//! let criteria = FilterCriteria::select_all(&listings).unwrap();
//! let view = apply(listings.dataset(), &criteria).unwrap();
//! let top = count_by(&view, columns::PROPERTY_TYPE, Some(10)).unwrap();
//! assert_eq!(top.len(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: unified ingestion entrypoints and format-specific implementations
//! - [`listing`]: listing schema, typed rows and load-time validation
//! - [`processing`]: filter criteria, views, group-by aggregations and summary tables
//! - [`execution`]: the same queries on a chunked rayon pool
//! - [`dashboard`]: Home / Overview / Explore page reports built from the queries
//! - [`config`]: JSON options for the dashboard binary
//! - [`types`]: schema + in-memory dataset types
//! - [`error`]: error types

pub mod config;
pub mod dashboard;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod listing;
pub mod processing;
pub mod types;

pub use error::{IngestionError, IngestionResult, QueryError, QueryResult};
