//! Embedded Postgres server for integration tests and benches.

use deadpool_postgres::Config as PgConfig;
use postgresql_embedded::PostgreSQL;

use crate::client::Client;
use crate::config::ClientConfig;

/// A running embedded Postgres instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub port: u16,
    pub database_url: String,
    /// Client configuration pointing at `dbname` with the server's own credentials.
    pub config: ClientConfig,
}

/// Start an embedded server and create `dbname` on it.
///
/// # Errors
/// Returns an error if the server cannot be set up or started, if the database cannot be
/// created, or if the post-start connectivity check fails.
pub async fn setup_postgres_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    let mut postgresql = PostgreSQL::default();
    postgresql.setup().await?;
    postgresql.start().await?;
    postgresql.create_database(dbname).await?;

    let settings = postgresql.settings();
    let port = settings.port;
    let mut host = PgConfig::new();
    host.host = Some(settings.host.clone());
    host.port = Some(port);
    host.user = Some(settings.username.clone());
    host.password = Some(settings.password.clone());
    host.dbname = Some(dbname.to_string());
    let database_url = format!(
        "postgres://{}:{}@{}:{port}/{dbname}",
        settings.username, settings.password, settings.host
    );
    let config = ClientConfig::new(database_url.clone()).with_host(host);

    let client = Client::new(config.clone()).await?;
    client.execute_batch("SELECT 1").await?;
    client.close();
    tracing::info!(port, dbname, "embedded postgres started");

    Ok(EmbeddedPostgres {
        postgresql,
        port,
        database_url,
        config,
    })
}

/// Stop a server started by [`setup_postgres_embedded`].
pub async fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres {
        postgresql, port, ..
    } = postgres;
    if let Err(error) = postgresql.stop().await {
        tracing::warn!(port, %error, "embedded postgres did not stop cleanly");
    }
}
