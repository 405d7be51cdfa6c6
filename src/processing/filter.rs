//! Row filtering for [`crate::types::DataSet`].

use log::debug;

use crate::error::QueryResult;
use crate::processing::criteria::{CompiledFilter, FilterCriteria, Predicate};
use crate::processing::view::DataView;
use crate::types::{DataSet, Value};

/// Returns a view of the rows for which `predicate` returns `true`.
pub fn filter<F>(dataset: &DataSet, mut predicate: F) -> DataView<'_>
where
    F: FnMut(&[Value]) -> bool,
{
    let indices = dataset
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| predicate(row.as_slice()))
        .map(|(i, _)| i)
        .collect();
    DataView::from_sorted_indices(dataset, indices)
}

/// Returns a view of the rows satisfying every predicate in `predicates`.
pub fn filter_where<'a>(dataset: &'a DataSet, predicates: &[Predicate]) -> QueryResult<DataView<'a>> {
    let compiled = CompiledFilter::compile(&dataset.schema, predicates)?;
    Ok(filter(dataset, |row| compiled.matches(row)))
}

/// Apply listing [`FilterCriteria`]: a row is kept iff its country, property type and room type
/// are in the allowed sets and its price lies in `[price_min, price_max]`.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeSet;
///
/// use listing_insights::listing::{ListingDataset, ListingRecord};
/// use listing_insights::processing::{apply, FilterCriteria};
///
/// let listings = ListingDataset::from_records(vec![ListingRecord {
///     country: "Spain".into(),
///     property_type: "Apartment".into(),
///     room_type: "Private room".into(),
///     host_name: "Ana".into(),
///     name: "Near the beach".into(),
///     price: 45.0,
///     availability_365: 200,
/// }])
/// .unwrap();
///
/// let mut criteria = FilterCriteria::select_all(&listings).unwrap();
/// assert_eq!(apply(listings.dataset(), &criteria).unwrap().len(), 1);
///
/// criteria.room_types = BTreeSet::new();
/// assert!(apply(listings.dataset(), &criteria).unwrap().is_empty());
/// ```
pub fn apply<'a>(dataset: &'a DataSet, criteria: &FilterCriteria) -> QueryResult<DataView<'a>> {
    criteria.validate()?;
    let view = filter_where(dataset, &criteria.predicates())?;
    debug!("filter kept {} of {} rows", view.len(), dataset.row_count());
    Ok(view)
}
