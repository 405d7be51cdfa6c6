//! The filter-and-aggregate query layer.
//!
//! Queries read a [`crate::types::DataSet`] through borrowed [`DataView`]s and never mutate it,
//! so one loaded dataset can serve any number of independent queries.
//!
//! - [`apply()`] / [`filter_where()`] / [`filter()`]: row selection by criteria, predicates or closure
//! - [`count_by()`], [`mean_by()`], [`count_non_null_by()`], [`box_stats_by()`]: group-by reductions
//! - [`distinct_values()`], [`numeric_range()`]: widget option helpers
//! - [`reduce()`]: whole-column count/sum/min/max/mean
//! - [`SummaryTable`]: named two-column results for charts
//!
//! ## Example: filter → aggregate
//!
//! ```rust
//! use listing_insights::listing::{columns, ListingDataset, ListingRecord};
//! use listing_insights::processing::{apply, count_by, mean_by, FilterCriteria};
//! use listing_insights::types::GroupKey;
//!
//! let rec = |country: &str, property: &str, room: &str, price: f64| ListingRecord {
//!     country: country.into(),
//!     property_type: property.into(),
//!     room_type: room.into(),
//!     host_name: "Host".into(),
//!     name: "Listing".into(),
//!     price,
//!     availability_365: 180,
//! };
//! let listings = ListingDataset::from_records(vec![
//!     rec("US", "House", "Entire", 100.0),
//!     rec("US", "Flat", "Private", 50.0),
//!     rec("FR", "House", "Entire", 200.0),
//! ])
//! .unwrap();
//!
//! let criteria = FilterCriteria::select_all(&listings).unwrap();
//! let view = apply(listings.dataset(), &criteria).unwrap();
//! assert_eq!(view.len(), 3);
//!
//! let means = mean_by(&view, columns::ROOM_TYPE, columns::PRICE).unwrap();
//! assert_eq!(means[&GroupKey::from("Entire")], 150.0);
//! assert_eq!(means[&GroupKey::from("Private")], 50.0);
//!
//! let top = count_by(&view, columns::PROPERTY_TYPE, Some(1)).unwrap();
//! assert_eq!(top, vec![(GroupKey::from("House"), 2)]);
//! ```

pub mod aggregate;
pub mod criteria;
pub mod filter;
pub mod reduce;
pub mod summary;
pub mod view;

pub use aggregate::{
    box_stats_by, count_by, count_non_null_by, distinct_values, mean_by, numeric_range, BoxStats,
};
pub use criteria::{CompiledFilter, FilterCriteria, Predicate};
pub use filter::{apply, filter, filter_where};
pub use reduce::{reduce, ReduceOp};
pub use summary::{BoxTable, SummaryRow, SummaryTable};
pub use view::DataView;
