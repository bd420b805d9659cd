use std::str::FromStr;

use deadpool_postgres::{Config as PgConfig, ManagerConfig, PoolConfig, RecyclingMethod};
use serde::{Deserialize, Serialize};

use crate::error::PgKeenError;
use crate::events::EventListeners;
use crate::parameterize::{MissingParamPolicy, TemplateCache};

pub const DEFAULT_URL: &str = "postgres://localhost:5432/postgres";

/// Pool bounds. `min` connections are opened when the client is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSize {
    pub min: usize,
    pub max: usize,
}

impl Default for PoolSize {
    fn default() -> Self {
        Self { min: 0, max: 1 }
    }
}

/// Everything a [`Client`](crate::client::Client) needs, handed over at construction.
///
/// Deserializes from partial documents; absent fields keep their defaults:
/// ```rust
/// use pg_keen::config::ClientConfig;
///
/// let config: ClientConfig =
///     serde_json::from_str(r#"{ "pool": { "max": 4 }, "camelize_columns": true }"#).unwrap();
/// assert_eq!(config.pool.max, 4);
/// assert!(config.camelize_columns);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connection url, ignored when `host` is set.
    pub url: String,
    /// Explicit connection parameters.
    pub host: Option<PgConfig>,
    pub pool: PoolSize,
    /// Rename result columns to camelCase (`created_at` becomes `createdAt`).
    pub camelize_columns: bool,
    /// Reuse parsed named-parameter templates by source text.
    pub cache_templates: bool,
    /// Most templates kept before the least recently used one is evicted.
    pub template_cache_capacity: usize,
    pub missing_params: MissingParamPolicy,
    #[serde(skip)]
    pub event_listeners: EventListeners,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            host: None,
            pool: PoolSize::default(),
            camelize_columns: false,
            cache_templates: true,
            template_cache_capacity: TemplateCache::DEFAULT_CAPACITY,
            missing_params: MissingParamPolicy::default(),
            event_listeners: EventListeners::default(),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: PgConfig) -> Self {
        self.host = Some(host);
        self
    }

    #[must_use]
    pub fn with_pool_size(mut self, min: usize, max: usize) -> Self {
        self.pool = PoolSize { min, max };
        self
    }

    #[must_use]
    pub fn with_camelize_columns(mut self, camelize: bool) -> Self {
        self.camelize_columns = camelize;
        self
    }

    #[must_use]
    pub fn with_template_cache(mut self, enabled: bool) -> Self {
        self.cache_templates = enabled;
        self
    }

    #[must_use]
    pub fn with_template_cache_capacity(mut self, capacity: usize) -> Self {
        self.template_cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_missing_params(mut self, policy: MissingParamPolicy) -> Self {
        self.missing_params = policy;
        self
    }

    #[must_use]
    pub fn with_event_listeners(mut self, listeners: EventListeners) -> Self {
        self.event_listeners = listeners;
        self
    }

    /// # Errors
    /// Returns `PgKeenError::ConfigError` for an empty or inverted pool, or an unparsable url.
    pub fn validate(&self) -> Result<(), PgKeenError> {
        if self.pool.max == 0 {
            return Err(PgKeenError::ConfigError(
                "pool max must be greater than 0".to_string(),
            ));
        }
        if self.pool.min > self.pool.max {
            return Err(PgKeenError::ConfigError(format!(
                "pool min ({}) cannot exceed pool max ({})",
                self.pool.min, self.pool.max
            )));
        }
        if self.host.is_none() {
            tokio_postgres::Config::from_str(&self.url).map_err(|e| {
                PgKeenError::ConfigError(format!("invalid connection url: {e}"))
            })?;
        }
        Ok(())
    }

    /// Build the deadpool configuration for this client.
    ///
    /// # Errors
    /// Returns the validation errors of [`ClientConfig::validate`].
    pub fn to_deadpool_config(&self) -> Result<PgConfig, PgKeenError> {
        self.validate()?;

        let mut cfg = match &self.host {
            Some(host) => host.clone(),
            None => {
                let mut cfg = PgConfig::new();
                cfg.url = Some(self.url.clone());
                cfg
            }
        };
        cfg.pool = Some(PoolConfig::new(self.pool.max));
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        Ok(cfg)
    }
}

/// Per-client state shared by every connection the pool hands out.
#[derive(Debug)]
pub(crate) struct ConnectionSettings {
    pub(crate) camelize_columns: bool,
    pub(crate) missing_params: MissingParamPolicy,
    pub(crate) listeners: EventListeners,
    pub(crate) templates: TemplateCache,
}

impl ConnectionSettings {
    pub(crate) fn from_config(config: &ClientConfig) -> Self {
        Self {
            camelize_columns: config.camelize_columns,
            missing_params: config.missing_params,
            listeners: config.event_listeners.clone(),
            templates: if config.cache_templates {
                TemplateCache::with_capacity(config.template_cache_capacity)
            } else {
                TemplateCache::disabled()
            },
        }
    }
}
