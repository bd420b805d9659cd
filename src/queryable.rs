use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::PgKeenError;
use crate::parameterize::bind;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Anything that can run positional SQL.
///
/// Named templates layer on top: [`Queryable::query_named`] rewrites the template and
/// hands the positional form to [`Queryable::query_positional`].
#[async_trait]
pub trait Queryable: Send + Sync {
    /// Run `text` with `values[i]` bound to `$(i+1)`.
    ///
    /// # Errors
    /// Returns whatever the underlying executor reports.
    async fn query_positional(
        &self,
        text: &str,
        values: &[RowValues],
    ) -> Result<ResultSet, PgKeenError>;

    /// Bind `template` against `params` and run it.
    ///
    /// # Errors
    /// Returns whatever [`Queryable::query_positional`] reports.
    async fn query_named(
        &self,
        template: &str,
        params: &JsonValue,
    ) -> Result<ResultSet, PgKeenError> {
        let bound = bind(template, params);
        self.query_positional(&bound.text, &bound.values).await
    }
}

#[cfg(feature = "postgres")]
#[async_trait]
impl Queryable for tokio_postgres::Client {
    async fn query_positional(
        &self,
        text: &str,
        values: &[RowValues],
    ) -> Result<ResultSet, PgKeenError> {
        crate::postgres::select(self, text, values, false).await
    }
}
