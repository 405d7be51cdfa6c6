//! Whole-column reductions over a [`DataView`].

use serde::Serialize;

use crate::error::QueryResult;
use crate::processing::view::DataView;
use crate::types::{DataType, Value};

/// Built-in reduction operations over a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReduceOp {
    /// Count all rows (including nulls).
    Count,
    /// Sum numeric values, ignoring nulls.
    Sum,
    /// Minimum numeric value, ignoring nulls.
    Min,
    /// Maximum numeric value, ignoring nulls.
    Max,
    /// Arithmetic mean of numeric values as `Float64`, ignoring nulls.
    Mean,
}

/// Reduce a column of the view using a built-in [`ReduceOp`].
///
/// - Errors if `column` does not exist, or is not numeric for anything but `Count`.
/// - `Sum`/`Min`/`Max` keep the column type; `Mean` is always `Float64`.
/// - Returns `Value::Null` when there are no non-null values (an empty view included), and for
///   an integer `Sum` that overflows `i64`.
pub fn reduce(view: &DataView<'_>, column: &str, op: ReduceOp) -> QueryResult<Value> {
    if op == ReduceOp::Count {
        view.schema().require(column)?;
        return Ok(Value::Int64(view.len() as i64));
    }

    let (idx, data_type) = view.schema().require_numeric(column)?;
    let out = match data_type {
        DataType::Int64 => {
            let values = view.rows().filter_map(|row| match row.get(idx) {
                Some(Value::Int64(v)) => Some(*v),
                _ => None,
            });
            match op {
                ReduceOp::Sum => checked_sum(values),
                ReduceOp::Min => values.min().map(Value::Int64),
                ReduceOp::Max => values.max().map(Value::Int64),
                _ => mean(values.map(|v| v as f64)).map(Value::Float64),
            }
        }
        _ => {
            let values = view.rows().filter_map(|row| match row.get(idx) {
                Some(Value::Float64(v)) => Some(*v),
                _ => None,
            });
            let out = match op {
                ReduceOp::Sum => values.reduce(|a, v| a + v),
                ReduceOp::Min => values.reduce(f64::min),
                ReduceOp::Max => values.reduce(f64::max),
                _ => mean(values),
            };
            out.map(Value::Float64)
        }
    };
    Ok(out.unwrap_or(Value::Null))
}

/// `None` for no values or on overflow.
fn checked_sum(mut values: impl Iterator<Item = i64>) -> Option<Value> {
    let first = values.next()?;
    values.try_fold(first, i64::checked_add).map(Value::Int64)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::{reduce, ReduceOp};
    use crate::error::QueryError;
    use crate::processing::filter::filter;
    use crate::processing::view::DataView;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn numeric_dataset_with_nulls() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("Availability_365", DataType::Int64),
            Field::new("Price", DataType::Float64),
            Field::new("Name", DataType::Utf8),
        ]);

        let rows = vec![
            vec![Value::Int64(1), Value::Float64(10.0), Value::Utf8("a".into())],
            vec![Value::Int64(2), Value::Null, Value::Null],
            vec![Value::Int64(3), Value::Float64(5.5), Value::Utf8("c".into())],
        ];

        DataSet::new(schema, rows)
    }

    #[test]
    fn reduce_count_counts_rows() {
        let ds = numeric_dataset_with_nulls();
        let view = DataView::all(&ds);
        assert_eq!(reduce(&view, "Price", ReduceOp::Count), Ok(Value::Int64(3)));
        assert_eq!(reduce(&view, "Name", ReduceOp::Count), Ok(Value::Int64(3)));
    }

    #[test]
    fn reduce_sum_ignores_nulls_and_preserves_type() {
        let ds = numeric_dataset_with_nulls();
        let view = DataView::all(&ds);
        assert_eq!(reduce(&view, "Price", ReduceOp::Sum), Ok(Value::Float64(15.5)));
        assert_eq!(reduce(&view, "Availability_365", ReduceOp::Sum), Ok(Value::Int64(6)));
    }

    #[test]
    fn reduce_min_max_mean() {
        let ds = numeric_dataset_with_nulls();
        let view = DataView::all(&ds);
        assert_eq!(reduce(&view, "Price", ReduceOp::Min), Ok(Value::Float64(5.5)));
        assert_eq!(reduce(&view, "Price", ReduceOp::Max), Ok(Value::Float64(10.0)));
        assert_eq!(reduce(&view, "Price", ReduceOp::Mean), Ok(Value::Float64(7.75)));
        assert_eq!(reduce(&view, "Availability_365", ReduceOp::Mean), Ok(Value::Float64(2.0)));
    }

    #[test]
    fn reduce_rejects_missing_and_text_columns() {
        let ds = numeric_dataset_with_nulls();
        let view = DataView::all(&ds);
        assert!(matches!(
            reduce(&view, "missing", ReduceOp::Count),
            Err(QueryError::UnknownColumn { .. })
        ));
        assert!(matches!(
            reduce(&view, "Name", ReduceOp::Sum),
            Err(QueryError::ColumnType { .. })
        ));
    }

    #[test]
    fn reduce_sum_overflow_is_null() {
        let schema = Schema::new(vec![Field::new("Availability_365", DataType::Int64)]);
        let ds = DataSet::new(schema, vec![vec![Value::Int64(i64::MAX)], vec![Value::Int64(1)]]);
        let view = DataView::all(&ds);
        assert_eq!(reduce(&view, "Availability_365", ReduceOp::Sum), Ok(Value::Null));
        assert_eq!(reduce(&view, "Availability_365", ReduceOp::Max), Ok(Value::Int64(i64::MAX)));
    }

    #[test]
    fn reduce_on_empty_view_is_null() {
        let ds = numeric_dataset_with_nulls();
        let empty = filter(&ds, |_| false);
        assert_eq!(reduce(&empty, "Price", ReduceOp::Mean), Ok(Value::Null));
        assert_eq!(reduce(&empty, "Price", ReduceOp::Count), Ok(Value::Int64(0)));
        assert_eq!(reduce(&empty, "Availability_365", ReduceOp::Sum), Ok(Value::Null));
    }
}
