use pg_keen::prelude::*;
use pg_keen::test_utils::{EmbeddedPostgres, setup_postgres_embedded, stop_postgres_embedded};

/// A database for one test: the server named by `PG_KEEN_TEST_URL`, or an embedded one.
pub struct TestDb {
    pub config: ClientConfig,
    embedded: Option<EmbeddedPostgres>,
}

impl TestDb {
    pub async fn start(dbname: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if let Ok(url) = std::env::var("PG_KEEN_TEST_URL") {
            return Ok(Self {
                config: ClientConfig::new(url),
                embedded: None,
            });
        }
        let embedded = setup_postgres_embedded(dbname).await?;
        Ok(Self {
            config: embedded.config.clone(),
            embedded: Some(embedded),
        })
    }

    pub async fn stop(self) {
        if let Some(embedded) = self.embedded {
            stop_postgres_embedded(embedded).await;
        }
    }
}

pub fn table_name(prefix: &str) -> String {
    format!("{prefix}_{}", std::process::id())
}
