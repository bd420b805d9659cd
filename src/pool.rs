use std::sync::Arc;

use deadpool_postgres::{Pool as DeadpoolPostgresPool, Runtime};
use futures_util::future::{BoxFuture, try_join_all};
use tokio_postgres::NoTls;

use crate::config::{ClientConfig, ConnectionSettings};
use crate::connection::Connection;
use crate::error::PgKeenError;
use crate::parameterize::TemplateCache;

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub max_size: usize,
    /// Connections currently open, idle or checked out.
    pub size: usize,
    /// Idle connections ready to be handed out.
    pub available: usize,
    /// Callers waiting for a connection.
    pub waiting: usize,
}

/// Bounded pool of Postgres connections.
///
/// Cloning is cheap; clones share the same connections and settings.
#[derive(Clone)]
pub struct Pool {
    inner: DeadpoolPostgresPool,
    settings: Arc<ConnectionSettings>,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("inner", &self.inner)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Pool {
    /// Build the pool and open `config.pool.min` connections up front.
    ///
    /// # Errors
    /// Returns `PgKeenError::ConfigError` for an invalid configuration, pool creation errors,
    /// and connection errors while warming the pool.
    pub async fn connect(config: &ClientConfig) -> Result<Self, PgKeenError> {
        let inner = config
            .to_deadpool_config()?
            .create_pool(Some(Runtime::Tokio1), NoTls)?;
        let pool = Self {
            inner,
            settings: Arc::new(ConnectionSettings::from_config(config)),
        };
        pool.warm(config.pool.min).await?;
        Ok(pool)
    }

    async fn warm(&self, min: usize) -> Result<(), PgKeenError> {
        if min == 0 {
            return Ok(());
        }
        let held = try_join_all((0..min).map(|_| self.acquire())).await?;
        drop(held);
        tracing::debug!(min, "pool warmed");
        Ok(())
    }

    /// Check out a connection, waiting for one to become free if the pool is at capacity.
    ///
    /// # Errors
    /// Returns `PgKeenError::PoolErrorPostgres` when no connection can be opened. The
    /// connect-error listener sees the error first.
    pub async fn acquire(&self) -> Result<Connection, PgKeenError> {
        match self.inner.get().await {
            Ok(client) => Ok(Connection::new(client, Arc::clone(&self.settings))),
            Err(e) => {
                let error = PgKeenError::from(e);
                self.settings.listeners.emit_connect_error(&error);
                Err(error)
            }
        }
    }

    /// Return a healthy connection for reuse.
    pub fn release(&self, conn: Connection) {
        drop(conn);
    }

    /// Close a connection instead of returning it; the pool opens a fresh one on demand.
    pub fn destroy(&self, conn: Connection) {
        conn.detach(None);
    }

    /// Run `f` with a checked-out connection.
    ///
    /// The connection is released when `f` succeeds and destroyed when it fails.
    ///
    /// # Errors
    /// Returns acquisition errors or the error from `f`.
    pub async fn with_client<T, F>(&self, f: F) -> Result<T, PgKeenError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Connection) -> BoxFuture<'c, Result<T, PgKeenError>> + Send,
    {
        let mut conn = self.acquire().await?;
        let result = f(&mut conn).await;
        self.finish(conn, result)
    }

    pub(crate) fn finish<T>(
        &self,
        conn: Connection,
        result: Result<T, PgKeenError>,
    ) -> Result<T, PgKeenError> {
        match result {
            Ok(value) => {
                self.release(conn);
                Ok(value)
            }
            Err(error) => {
                tracing::debug!(%error, "destroying connection after error");
                conn.detach(Some(&error));
                Err(error)
            }
        }
    }

    /// Stop handing out connections and close the idle ones. Checked-out connections close
    /// when they are returned.
    pub fn drain(&self) {
        self.inner.close();
        tracing::debug!("pool drained");
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let status = self.inner.status();
        PoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }

    /// Parsed templates shared by this pool's connections.
    #[must_use]
    pub fn template_cache(&self) -> &TemplateCache {
        &self.settings.templates
    }
}
