//! Read-only row selections over a [`DataSet`].

use serde_json::{Map, Value as JsonValue};

use crate::types::{DataSet, Schema, Value};

/// A borrowed selection of rows from a [`DataSet`].
///
/// Views hold row positions, never row copies. Positions are strictly increasing, so a view
/// iterates rows in dataset order and cannot contain duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct DataView<'a> {
    dataset: &'a DataSet,
    indices: Vec<usize>,
}

impl<'a> DataView<'a> {
    /// A view over every row.
    pub fn all(dataset: &'a DataSet) -> Self {
        Self {
            dataset,
            indices: (0..dataset.row_count()).collect(),
        }
    }

    /// Callers guarantee `indices` is strictly increasing and in bounds.
    pub(crate) fn from_sorted_indices(dataset: &'a DataSet, indices: Vec<usize>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(indices.last().is_none_or(|&i| i < dataset.row_count()));
        Self { dataset, indices }
    }

    pub fn dataset(&self) -> &'a DataSet {
        self.dataset
    }

    pub fn schema(&self) -> &'a Schema {
        &self.dataset.schema
    }

    /// Positions of the selected rows in the underlying dataset.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate the selected rows in dataset order.
    pub fn rows(&self) -> impl Iterator<Item = &'a [Value]> + '_ {
        let rows = &self.dataset.rows;
        self.indices.iter().map(move |&i| rows[i].as_slice())
    }

    /// Copy the selected rows into a standalone dataset.
    pub fn to_dataset(&self) -> DataSet {
        DataSet::new(self.dataset.schema.clone(), self.rows().map(<[Value]>::to_vec).collect())
    }

    /// Selected rows as JSON objects keyed by column name (the "raw data" table).
    pub fn to_records(&self) -> Vec<Map<String, JsonValue>> {
        let names: Vec<&str> = self.schema().field_names().collect();
        self.rows()
            .map(|row| {
                names
                    .iter()
                    .zip(row)
                    .map(|(name, v)| (name.to_string(), to_json(v)))
                    .collect()
            })
            .collect()
    }
}

fn to_json(v: &Value) -> JsonValue {
    match v {
        Value::Null => JsonValue::Null,
        Value::Int64(n) => JsonValue::from(*n),
        // Non-finite floats have no JSON representation.
        Value::Float64(f) => serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Utf8(s) => JsonValue::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::DataView;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn dataset() -> DataSet {
        DataSet::new(
            Schema::new(vec![
                Field::new("Room_type", DataType::Utf8),
                Field::new("Price", DataType::Float64),
            ]),
            vec![
                vec![Value::Utf8("Private room".into()), Value::Float64(40.0)],
                vec![Value::Utf8("Entire home/apt".into()), Value::Null],
            ],
        )
    }

    #[test]
    fn all_covers_every_row_in_order() {
        let ds = dataset();
        let view = DataView::all(&ds);
        assert_eq!(view.indices(), &[0, 1]);
        assert_eq!(view.to_dataset(), ds);
    }

    #[test]
    fn records_are_keyed_by_column() {
        let ds = dataset();
        let view = DataView::from_sorted_indices(&ds, vec![1]);
        let records = view.to_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Room_type"], "Entire home/apt");
        assert!(records[0]["Price"].is_null());
    }
}
