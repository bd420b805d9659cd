//! Convenient imports for common functionality.

pub use crate::error::PgKeenError;
pub use crate::events::{EventListeners, QueryEvent, ResultEvent};
pub use crate::parameterize::{
    BoundQuery, Extracted, MissingParamPolicy, NamedQuery, TemplateCache, bind, bind_serialize,
    bind_strict, extract,
};
pub use crate::query::QueryParams;
pub use crate::queryable::Queryable;
pub use crate::results::{CustomDbRow, ResultSet, as_row, as_rows, as_scalar, as_scalars};
pub use crate::sql_files::SqlFiles;
pub use crate::types::RowValues;

pub use futures_util::future::BoxFuture;

#[cfg(feature = "postgres")]
pub use crate::client::Client;
#[cfg(feature = "postgres")]
pub use crate::config::{ClientConfig, PoolSize};
#[cfg(feature = "postgres")]
pub use crate::connection::Connection;
#[cfg(feature = "postgres")]
pub use crate::pool::{Pool, PoolStatus};
