//! Named-parameter SQL templates for Postgres.
//!
//! Write `:name` placeholders, bind them from a JSON bag, and run the positional result
//! through a pooled `tokio-postgres` client.

pub mod error;
pub mod lock;
pub mod parameterize;
pub mod prelude;
pub mod query;
pub mod queryable;
pub mod results;
pub mod sql_files;
pub mod types;

#[cfg(feature = "postgres")]
pub mod client;
#[cfg(feature = "postgres")]
pub mod config;
#[cfg(feature = "postgres")]
pub mod connection;
pub mod events;
#[cfg(feature = "postgres")]
pub mod pool;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use error::PgKeenError;
pub use parameterize::{BoundQuery, Extracted, NamedQuery, bind, bind_strict, extract};
pub use types::RowValues;

#[cfg(feature = "postgres")]
pub use client::Client;
#[cfg(feature = "postgres")]
pub use config::ClientConfig;
