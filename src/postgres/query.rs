use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde_json::Value;
use tokio_postgres::{Client, Row, Statement};

use super::params::Params;
use crate::error::PgKeenError;
use crate::results::{ResultSet, camelize_all};
use crate::types::RowValues;

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// # Errors
/// Returns `PgKeenError` if the column cannot be retrieved.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<RowValues, PgKeenError> {
    let type_info = row.columns()[idx].type_();

    match type_info.name() {
        "int2" => {
            let val: Option<i16> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Int))
        }
        "float4" => {
            let val: Option<f32> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))))
        }
        "float8" => {
            let val: Option<f64> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Float))
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Bool))
        }
        "timestamp" => {
            let val: Option<NaiveDateTime> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Timestamp))
        }
        "timestamptz" => {
            let val: Option<chrono::DateTime<chrono::Utc>> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Timestamp(v.naive_utc())))
        }
        "date" => {
            let val: Option<NaiveDate> = row.try_get(idx)?;
            Ok(val
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map_or(RowValues::Null, RowValues::Timestamp))
        }
        "json" | "jsonb" => {
            let val: Option<Value> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::JSON))
        }
        "bytea" => {
            let val: Option<Vec<u8>> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Blob))
        }
        _ => {
            // text, varchar, bpchar, name and anything else that reads as a string
            let val: Option<String> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Text))
        }
    }
}

/// Column names from statement metadata, camelized on request.
#[must_use]
pub fn column_names(stmt: &Statement, camelize: bool) -> Arc<Vec<String>> {
    let names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    if camelize {
        Arc::new(camelize_all(&names))
    } else {
        Arc::new(names)
    }
}

/// Build a result set from rows sharing the given column names.
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_result_set(
    column_names: &Arc<Vec<String>>,
    rows: &[Row],
) -> Result<ResultSet, PgKeenError> {
    let column_count = column_names.len();
    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_column_names(Arc::clone(column_names));

    for row in rows {
        let mut row_values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Prepare and run a query, returning every row.
///
/// # Errors
/// Returns errors from preparation, parameter binding, or row extraction.
pub async fn select(
    client: &Client,
    query: &str,
    params: &[RowValues],
    camelize: bool,
) -> Result<ResultSet, PgKeenError> {
    let stmt = client.prepare(query).await?;
    let converted = Params::convert(params);
    let rows = client.query(&stmt, converted.as_refs()).await?;
    build_result_set(&column_names(&stmt, camelize), &rows)
}

/// Run a statement and return the affected row count.
///
/// # Errors
/// Returns errors from parameter binding or execution.
pub async fn execute(
    client: &Client,
    query: &str,
    params: &[RowValues],
) -> Result<usize, PgKeenError> {
    let converted = Params::convert(params);
    let rows = client.execute(query, converted.as_refs()).await?;
    usize::try_from(rows).map_err(|e| {
        PgKeenError::ExecutionError(format!("postgres affected rows conversion error: {e}"))
    })
}

/// Run a query and stream its rows in result sets of at most `batch_size` rows.
///
/// # Errors
/// Returns `PgKeenError::ParameterError` for a zero batch size, or errors from preparing
/// and starting the query. Later row errors arrive through the stream.
pub async fn select_batches(
    client: &Client,
    query: &str,
    params: &[RowValues],
    camelize: bool,
    batch_size: usize,
) -> Result<BoxStream<'static, Result<ResultSet, PgKeenError>>, PgKeenError> {
    if batch_size == 0 {
        return Err(PgKeenError::ParameterError(
            "batch size must be greater than 0".to_string(),
        ));
    }

    let stmt = client.prepare(query).await?;
    let names = column_names(&stmt, camelize);
    let rows = client.query_raw(&stmt, params.iter()).await?;

    let batches = rows.chunks(batch_size).map(move |chunk| -> Result<ResultSet, PgKeenError> {
        let rows = chunk.into_iter().collect::<Result<Vec<Row>, _>>()?;
        build_result_set(&names, &rows)
    });
    Ok(batches.boxed())
}
