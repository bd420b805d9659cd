use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::PgKeenError;
use crate::types::RowValues;

/// Parameters for a single call: none, positional (`$1`, `$2`, ...), or a named bag for
/// `:name` templates.
///
/// A JSON object converts to a named bag and a JSON array to positional values:
/// ```rust
/// use pg_keen::query::QueryParams;
/// use pg_keen::types::RowValues;
/// use serde_json::json;
///
/// assert!(matches!(QueryParams::from(json!({ "id": 1 })), QueryParams::Named(_)));
/// assert_eq!(
///     QueryParams::from(json!([1, "a"])),
///     QueryParams::Positional(vec![RowValues::Int(1), RowValues::Text("a".into())])
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum QueryParams {
    #[default]
    None,
    Positional(Vec<RowValues>),
    Named(JsonValue),
}

impl QueryParams {
    /// Named parameters from any serializable value.
    ///
    /// # Errors
    /// Returns `PgKeenError::JsonError` if `params` cannot be represented as JSON.
    pub fn named<T: Serialize + ?Sized>(params: &T) -> Result<Self, PgKeenError> {
        Ok(QueryParams::Named(serde_json::to_value(params)?))
    }

    #[must_use]
    pub fn is_named(&self) -> bool {
        matches!(self, QueryParams::Named(_))
    }
}

impl From<()> for QueryParams {
    fn from((): ()) -> Self {
        QueryParams::None
    }
}

impl From<Vec<RowValues>> for QueryParams {
    fn from(values: Vec<RowValues>) -> Self {
        QueryParams::Positional(values)
    }
}

impl From<&[RowValues]> for QueryParams {
    fn from(values: &[RowValues]) -> Self {
        QueryParams::Positional(values.to_vec())
    }
}

impl<const N: usize> From<[RowValues; N]> for QueryParams {
    fn from(values: [RowValues; N]) -> Self {
        QueryParams::Positional(values.into())
    }
}

impl<const N: usize> From<&[RowValues; N]> for QueryParams {
    fn from(values: &[RowValues; N]) -> Self {
        QueryParams::Positional(values.to_vec())
    }
}

impl From<JsonValue> for QueryParams {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => QueryParams::None,
            JsonValue::Object(_) => QueryParams::Named(value),
            JsonValue::Array(items) => {
                QueryParams::Positional(items.into_iter().map(RowValues::from).collect())
            }
            scalar => QueryParams::Positional(vec![RowValues::from(scalar)]),
        }
    }
}
