use super::{CustomDbRow, ResultSet};
use crate::error::PgKeenError;
use crate::types::RowValues;

/// All rows of the result.
#[must_use]
pub fn as_rows(result: ResultSet) -> Vec<CustomDbRow> {
    result.results
}

/// The only row of the result, or `None` when it is empty.
///
/// # Errors
/// Returns `PgKeenError::UnexpectedRowCount` when the result holds more than one row.
pub fn as_row(result: ResultSet) -> Result<Option<CustomDbRow>, PgKeenError> {
    let mut rows = result.results;
    match rows.len() {
        0 | 1 => Ok(rows.pop()),
        count => Err(PgKeenError::UnexpectedRowCount { count }),
    }
}

/// The single value of the single row, or `None` when the result is empty.
///
/// # Errors
/// Returns `PgKeenError::UnexpectedRowCount` for more than one row and
/// `PgKeenError::UnexpectedColumnCount` unless the row has exactly one column.
pub fn as_scalar(result: ResultSet) -> Result<Option<RowValues>, PgKeenError> {
    as_row(result)?.map(row_scalar).transpose()
}

/// The single value of every row.
///
/// # Errors
/// Returns `PgKeenError::UnexpectedColumnCount` unless every row has exactly one column.
pub fn as_scalars(result: ResultSet) -> Result<Vec<RowValues>, PgKeenError> {
    result.results.into_iter().map(row_scalar).collect()
}

fn row_scalar(row: CustomDbRow) -> Result<RowValues, PgKeenError> {
    let mut values = row.rows;
    if values.len() == 1 {
        Ok(values.remove(0))
    } else {
        Err(PgKeenError::UnexpectedColumnCount {
            count: values.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn result_set(columns: &[&str], rows: Vec<Vec<RowValues>>) -> ResultSet {
        let mut rs = ResultSet::with_capacity(rows.len());
        rs.set_column_names(Arc::new(columns.iter().map(|c| (*c).to_string()).collect()));
        for row in rows {
            rs.add_row_values(row);
        }
        rs
    }

    #[test]
    fn row_of_empty_result_is_none() {
        assert!(as_row(result_set(&["a"], vec![])).unwrap().is_none());
        assert!(as_scalar(result_set(&["a"], vec![])).unwrap().is_none());
    }

    #[test]
    fn row_rejects_two_rows() {
        let rs = result_set(&["a"], vec![vec![RowValues::Int(1)], vec![RowValues::Int(2)]]);
        let err = as_row(rs).unwrap_err();
        assert!(matches!(err, PgKeenError::UnexpectedRowCount { count: 2 }));
        assert!(err.to_string().starts_with("Expected 0 or 1 row"));
    }

    #[test]
    fn row_returns_the_single_row() {
        let rs = result_set(&["a", "b"], vec![vec![RowValues::Int(1), RowValues::Bool(true)]]);
        let row = as_row(rs).unwrap().unwrap();
        assert_eq!(row.get("b"), Some(&RowValues::Bool(true)));
    }

    #[test]
    fn scalar_rejects_two_columns() {
        let rs = result_set(&["a", "b"], vec![vec![RowValues::Int(1), RowValues::Int(2)]]);
        assert!(matches!(
            as_scalar(rs),
            Err(PgKeenError::UnexpectedColumnCount { count: 2 })
        ));
    }

    #[test]
    fn scalars_collect_each_row() {
        let rs = result_set(
            &["n"],
            vec![vec![RowValues::Int(1)], vec![RowValues::Int(2)], vec![RowValues::Null]],
        );
        assert_eq!(
            as_scalars(rs).unwrap(),
            vec![RowValues::Int(1), RowValues::Int(2), RowValues::Null]
        );
    }

    #[test]
    fn rows_pass_through() {
        let rs = result_set(&["n"], vec![vec![RowValues::Int(1)], vec![RowValues::Int(2)]]);
        assert_eq!(as_rows(rs).len(), 2);
    }
}
