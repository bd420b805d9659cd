use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde_json::Value as JsonValue;

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::PgKeenError;
use crate::pool::Pool;
use crate::query::QueryParams;
use crate::queryable::Queryable;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

/// Entry point: a pool plus one-shot query helpers that check a connection out per call.
///
/// ```rust,no_run
/// use pg_keen::prelude::*;
/// use serde_json::json;
///
/// # async fn demo() -> Result<(), PgKeenError> {
/// let client = Client::new(ClientConfig::new("postgres://app@localhost/app")).await?;
/// let name = client
///     .query_scalar("SELECT name FROM users WHERE id = :id", json!({ "id": 7 }))
///     .await?;
/// # let _ = name;
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    pool: Pool,
}

/// Check a connection out, run one call on it, and hand it back through [`Pool::finish`].
macro_rules! on_connection {
    ($self:ident, |$conn:ident| $call:expr) => {{
        let $conn = $self.pool.acquire().await?;
        let result = $call.await;
        $self.pool.finish($conn, result)
    }};
}

impl Client {
    /// # Errors
    /// Returns configuration errors and, when `pool.min > 0`, connection errors.
    pub async fn new(config: ClientConfig) -> Result<Self, PgKeenError> {
        let pool = Pool::connect(&config).await?;
        tracing::info!(max = config.pool.max, min = config.pool.min, "client ready");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Run `f` on one connection, released on success and destroyed on failure.
    ///
    /// # Errors
    /// Returns acquisition errors or the error from `f`.
    pub async fn connection<T, F>(&self, f: F) -> Result<T, PgKeenError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Connection) -> BoxFuture<'c, Result<T, PgKeenError>> + Send,
    {
        self.pool.with_client(f).await
    }

    /// # Errors
    /// See [`Connection::query_raw`].
    pub async fn query_raw(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<ResultSet, PgKeenError> {
        let params = params.into();
        on_connection!(self, |conn| conn.query_raw(sql, params))
    }

    /// # Errors
    /// See [`Connection::query`].
    pub async fn query(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<Vec<CustomDbRow>, PgKeenError> {
        let params = params.into();
        on_connection!(self, |conn| conn.query(sql, params))
    }

    /// # Errors
    /// See [`Connection::query_one`].
    pub async fn query_one(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<Option<CustomDbRow>, PgKeenError> {
        let params = params.into();
        on_connection!(self, |conn| conn.query_one(sql, params))
    }

    /// # Errors
    /// See [`Connection::query_scalar`].
    pub async fn query_scalar(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<Option<RowValues>, PgKeenError> {
        let params = params.into();
        on_connection!(self, |conn| conn.query_scalar(sql, params))
    }

    /// # Errors
    /// See [`Connection::query_scalars`].
    pub async fn query_scalars(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<Vec<RowValues>, PgKeenError> {
        let params = params.into();
        on_connection!(self, |conn| conn.query_scalars(sql, params))
    }

    /// # Errors
    /// See [`Connection::execute`].
    pub async fn execute(
        &self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<usize, PgKeenError> {
        let params = params.into();
        on_connection!(self, |conn| conn.execute(sql, params))
    }

    /// # Errors
    /// See [`Connection::execute_batch`].
    pub async fn execute_batch(&self, sql: &str) -> Result<(), PgKeenError> {
        on_connection!(self, |conn| conn.execute_batch(sql))
    }

    /// Run `f` in a transaction on a freshly checked-out connection.
    ///
    /// # Errors
    /// See [`Connection::transaction`].
    pub async fn transaction<T, F>(&self, f: F) -> Result<T, PgKeenError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Connection) -> BoxFuture<'c, Result<T, PgKeenError>> + Send,
    {
        let mut conn = self.pool.acquire().await?;
        let result = conn.transaction(f).await;
        self.pool.finish(conn, result)
    }

    /// Run `f` while holding the advisory lock `lock_name`.
    ///
    /// # Errors
    /// See [`Connection::synchronized`].
    pub async fn synchronized<T, F>(&self, lock_name: &str, f: F) -> Result<T, PgKeenError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Connection) -> BoxFuture<'c, Result<T, PgKeenError>> + Send,
    {
        let mut conn = self.pool.acquire().await?;
        let result = conn.synchronized(lock_name, f).await;
        self.pool.finish(conn, result)
    }

    /// Drain the pool. Later calls fail with a pool error.
    pub fn close(&self) {
        self.pool.drain();
    }
}

#[async_trait]
impl Queryable for Client {
    async fn query_positional(
        &self,
        text: &str,
        values: &[RowValues],
    ) -> Result<ResultSet, PgKeenError> {
        let conn = self.pool.acquire().await?;
        let result = conn.query_positional(text, values).await;
        self.pool.finish(conn, result)
    }

    async fn query_named(
        &self,
        template: &str,
        params: &JsonValue,
    ) -> Result<ResultSet, PgKeenError> {
        let conn = self.pool.acquire().await?;
        let result = conn.query_named(template, params).await;
        self.pool.finish(conn, result)
    }
}
