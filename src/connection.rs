use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::Object;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use serde_json::Value as JsonValue;

use crate::config::ConnectionSettings;
use crate::error::PgKeenError;
use crate::events::{QueryEvent, ResultEvent};
use crate::lock::lock_key;
use crate::parameterize::BoundQuery;
use crate::postgres;
use crate::query::QueryParams;
use crate::queryable::Queryable;
use crate::results::{CustomDbRow, ResultSet, as_row, as_rows, as_scalar, as_scalars};
use crate::types::RowValues;

/// A pooled Postgres connection.
///
/// Dropping it hands the underlying client back to the pool, unless a transaction is still
/// open or an advisory lock may still be held. Such a client is detached and closed instead
/// of being reused, which also covers futures cancelled halfway through a scoped helper.
pub struct Connection {
    client: Option<Object>,
    settings: Arc<ConnectionSettings>,
    in_transaction: bool,
    /// Advisory locks taken by `synchronized` and not yet released.
    held_locks: usize,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("attached", &self.client.is_some())
            .field("in_transaction", &self.in_transaction)
            .field("held_locks", &self.held_locks)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub(crate) fn new(client: Object, settings: Arc<ConnectionSettings>) -> Self {
        Self {
            client: Some(client),
            settings,
            in_transaction: false,
            held_locks: 0,
        }
    }

    /// The underlying driver client.
    ///
    /// # Errors
    /// Returns `PgKeenError::ConnectionError` once the connection was detached.
    pub fn pg_client(&self) -> Result<&tokio_postgres::Client, PgKeenError> {
        match &self.client {
            Some(object) => {
                let client: &tokio_postgres::Client = object;
                Ok(client)
            }
            None => Err(PgKeenError::ConnectionError(
                "connection was detached from the pool".to_string(),
            )),
        }
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Whether session state may have leaked, so the client must not go back to the pool.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.in_transaction || self.held_locks > 0
    }

    fn bind_call(&self, sql: &str, params: QueryParams) -> Result<BoundQuery, PgKeenError> {
        match params {
            QueryParams::None => Ok(BoundQuery {
                text: sql.to_string(),
                values: Vec::new(),
            }),
            QueryParams::Positional(values) => Ok(BoundQuery {
                text: sql.to_string(),
                values,
            }),
            QueryParams::Named(bag) => self
                .settings
                .templates
                .extract(sql)
                .bind_with(&bag, self.settings.missing_params),
        }
    }

    async fn run_select(&self, text: &str, values: &[RowValues]) -> Result<ResultSet, PgKeenError> {
        let listeners = &self.settings.listeners;
        listeners.emit_query(&QueryEvent { text, values });
        let result =
            postgres::select(self.pg_client()?, text, values, self.settings.camelize_columns)
                .await?;
        listeners.emit_result(&ResultEvent {
            text,
            values,
            row_count: result.len(),
        });
        Ok(result)
    }

    async fn run_execute(&self, text: &str, values: &[RowValues]) -> Result<usize, PgKeenError> {
        let listeners = &self.settings.listeners;
        listeners.emit_query(&QueryEvent { text, values });
        let affected = postgres::execute(self.pg_client()?, text, values).await?;
        listeners.emit_result(&ResultEvent {
            text,
            values,
            row_count: affected,
        });
        Ok(affected)
    }

    /// Run a query and return the full result set.
    ///
    /// Named parameters (a JSON object) rewrite `:name` placeholders first; positional
    /// parameters are sent as-is.
    ///
    /// # Errors
    /// Returns binding errors under the strict missing-parameter policy, and any driver error.
    pub async fn query_raw(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<ResultSet, PgKeenError> {
        let bound = self.bind_call(sql, params.into())?;
        self.run_select(&bound.text, &bound.values).await
    }

    /// # Errors
    /// See [`Connection::query_raw`].
    pub async fn query(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<Vec<CustomDbRow>, PgKeenError> {
        Ok(as_rows(self.query_raw(sql, params).await?))
    }

    /// First row, or `None` for an empty result.
    ///
    /// # Errors
    /// Returns `PgKeenError::UnexpectedRowCount` when more than one row comes back.
    pub async fn query_one(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<Option<CustomDbRow>, PgKeenError> {
        as_row(self.query_raw(sql, params).await?)
    }

    /// Single value of a single row.
    ///
    /// # Errors
    /// Returns `PgKeenError::UnexpectedRowCount` or `PgKeenError::UnexpectedColumnCount`
    /// when the result is not one column of at most one row.
    pub async fn query_scalar(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<Option<RowValues>, PgKeenError> {
        as_scalar(self.query_raw(sql, params).await?)
    }

    /// First column of every row.
    ///
    /// # Errors
    /// Returns `PgKeenError::UnexpectedColumnCount` unless the result has exactly one column.
    pub async fn query_scalars(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<Vec<RowValues>, PgKeenError> {
        as_scalars(self.query_raw(sql, params).await?)
    }

    /// Run a statement and return the affected row count.
    ///
    /// # Errors
    /// See [`Connection::query_raw`].
    pub async fn execute(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<usize, PgKeenError> {
        let bound = self.bind_call(sql, params.into())?;
        self.run_execute(&bound.text, &bound.values).await
    }

    /// Run one or more `;`-separated statements without parameters.
    ///
    /// # Errors
    /// Returns the first statement error.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), PgKeenError> {
        let listeners = &self.settings.listeners;
        listeners.emit_query(&QueryEvent {
            text: sql,
            values: &[],
        });
        self.pg_client()?.batch_execute(sql).await?;
        listeners.emit_result(&ResultEvent {
            text: sql,
            values: &[],
            row_count: 0,
        });
        Ok(())
    }

    /// Stream rows in result sets of at most `batch_size` rows.
    ///
    /// # Errors
    /// Returns `PgKeenError::ParameterError` for a zero batch size, binding errors, and errors
    /// starting the query. Row errors arrive through the stream.
    pub async fn query_batches(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
        batch_size: usize,
    ) -> Result<BoxStream<'static, Result<ResultSet, PgKeenError>>, PgKeenError> {
        let bound = self.bind_call(sql, params.into())?;
        self.settings.listeners.emit_query(&QueryEvent {
            text: &bound.text,
            values: &bound.values,
        });
        postgres::select_batches(
            self.pg_client()?,
            &bound.text,
            &bound.values,
            self.settings.camelize_columns,
            batch_size,
        )
        .await
    }

    /// Run `f` inside `BEGIN`/`COMMIT`.
    ///
    /// An error from `f` rolls the transaction back and is returned unchanged. If the
    /// rollback fails as well, both errors come back in `PgKeenError::RollbackFailed`.
    ///
    /// ```rust,no_run
    /// use pg_keen::prelude::*;
    /// use serde_json::json;
    ///
    /// # async fn demo(conn: &mut Connection) -> Result<(), PgKeenError> {
    /// let id = conn
    ///     .transaction(|tx| {
    ///         Box::pin(async move {
    ///             tx.execute("INSERT INTO t (v) VALUES (:v)", json!({ "v": 1 })).await?;
    ///             tx.query_scalar("SELECT max(id) FROM t", ()).await
    ///         })
    ///     })
    ///     .await?;
    /// # let _ = id;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns `PgKeenError::ExecutionError` when a transaction is already open on this
    /// connection, the error from `f`, or errors from `BEGIN`/`COMMIT`.
    pub async fn transaction<T, F>(&mut self, f: F) -> Result<T, PgKeenError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Connection) -> BoxFuture<'c, Result<T, PgKeenError>> + Send,
    {
        if self.in_transaction {
            return Err(PgKeenError::ExecutionError(
                "a transaction is already open on this connection".to_string(),
            ));
        }

        self.execute_batch("BEGIN").await?;
        self.in_transaction = true;

        match f(&mut *self).await {
            Ok(value) => {
                // a failed COMMIT still ends the transaction server-side
                let committed = self.execute_batch("COMMIT").await;
                self.in_transaction = false;
                committed.map(|()| value)
            }
            Err(error) => match self.execute_batch("ROLLBACK").await {
                Ok(()) => {
                    self.in_transaction = false;
                    Err(error)
                }
                Err(rollback_error) => {
                    tracing::warn!(%error, %rollback_error, "rollback failed");
                    Err(PgKeenError::RollbackFailed {
                        error: Box::new(error),
                        rollback_error: Box::new(rollback_error),
                    })
                }
            },
        }
    }

    /// Run `f` while holding the session advisory lock named `lock_name`.
    ///
    /// The lock is released whether or not `f` succeeds.
    ///
    /// # Errors
    /// Returns the error from `f`, lock or unlock errors, or `PgKeenError::UnlockFailed`
    /// when `f` and the unlock both fail.
    pub async fn synchronized<T, F>(&mut self, lock_name: &str, f: F) -> Result<T, PgKeenError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Connection) -> BoxFuture<'c, Result<T, PgKeenError>> + Send,
    {
        let lock = lock_key(lock_name);
        tracing::debug!(lock_name, lock, "advisory lock");
        let key = [RowValues::Int(i64::from(lock))];

        // counted before the lock call, which may be cancelled after the server granted it
        self.held_locks += 1;
        if let Err(error) = self.run_execute("SELECT pg_advisory_lock($1)", &key).await {
            self.held_locks -= 1;
            return Err(error);
        }
        let outcome = f(&mut *self).await;
        let unlocked = self
            .run_execute("SELECT pg_advisory_unlock($1)", &key)
            .await;
        if unlocked.is_ok() {
            self.held_locks -= 1;
        }

        match (outcome, unlocked) {
            (Ok(value), Ok(_)) => Ok(value),
            (Err(error), Ok(_)) | (Ok(_), Err(error)) => Err(error),
            (Err(error), Err(unlock_error)) => Err(PgKeenError::UnlockFailed {
                error: Box::new(error),
                unlock_error: Box::new(unlock_error),
            }),
        }
    }

    /// Remove the client from the pool so it is closed rather than reused. `cause` is the
    /// error that made the client unusable, if any.
    pub(crate) fn detach(mut self, cause: Option<&PgKeenError>) {
        self.close_client(cause);
    }

    fn close_client(&mut self, cause: Option<&PgKeenError>) {
        if let Some(object) = self.client.take() {
            drop(Object::take(object));
            self.settings.listeners.emit_destroy(cause);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.is_dirty() && self.client.is_some() {
            tracing::warn!(
                in_transaction = self.in_transaction,
                held_locks = self.held_locks,
                "connection dropped with open session state, detaching it from the pool"
            );
            self.close_client(None);
        }
    }
}

#[async_trait]
impl Queryable for Connection {
    async fn query_positional(
        &self,
        text: &str,
        values: &[RowValues],
    ) -> Result<ResultSet, PgKeenError> {
        self.run_select(text, values).await
    }

    async fn query_named(
        &self,
        template: &str,
        params: &JsonValue,
    ) -> Result<ResultSet, PgKeenError> {
        self.query_raw(template, QueryParams::Named(params.clone()))
            .await
    }
}
