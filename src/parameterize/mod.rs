use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::PgKeenError;
use crate::types::RowValues;

mod cache;
mod parsers;
mod resolve;
mod scanner;

pub use cache::TemplateCache;
pub use resolve::{lookup, resolve};

/// A template rewritten to positional placeholders.
///
/// `names[i]` is the parameter that every `$(i+1)` in `text` stands for, in order of first
/// appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extracted {
    pub text: String,
    pub names: Vec<String>,
}

/// Query text plus the values for its positional placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub text: String,
    pub values: Vec<RowValues>,
}

/// What to do when a named parameter is absent from the parameter bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MissingParamPolicy {
    /// Bind [`RowValues::Missing`] and let execution fail in the driver.
    #[default]
    PassThrough,
    /// Fail with [`PgKeenError::MissingParameter`] before anything is sent.
    Strict,
}

/// Rewrite `:name` placeholders in `template` into `$1`, `$2`, ...
///
/// Repeated names share one index. Placeholders after a `--` comment marker on the same
/// line, and the colons of `::` casts, are left untouched:
/// ```rust
/// use pg_keen::parameterize::extract;
///
/// let extracted = extract("WHERE d = :d::date AND a = :a -- or :b");
/// assert_eq!(extracted.text, "WHERE d = $1::date AND a = $2 -- or :b");
/// assert_eq!(extracted.names, vec!["d", "a"]);
/// ```
#[must_use]
pub fn extract(template: &str) -> Extracted {
    scanner::extract_params(template)
}

/// Extract `template` and resolve every name against `params`.
///
/// Absent names bind as [`RowValues::Missing`].
#[must_use]
pub fn bind(template: &str, params: &JsonValue) -> BoundQuery {
    extract(template).bind(params)
}

/// Like [`bind`], but fails on the first name `params` cannot resolve.
///
/// # Errors
/// Returns `PgKeenError::MissingParameter` naming the unresolved path.
pub fn bind_strict(template: &str, params: &JsonValue) -> Result<BoundQuery, PgKeenError> {
    extract(template).bind_strict(params)
}

/// Bind against any serializable value, typically a struct with named fields.
///
/// # Errors
/// Returns `PgKeenError::JsonError` if `params` cannot be represented as JSON.
pub fn bind_serialize<T: Serialize + ?Sized>(
    template: &str,
    params: &T,
) -> Result<BoundQuery, PgKeenError> {
    let bag = serde_json::to_value(params)?;
    Ok(bind(template, &bag))
}

impl Extracted {
    #[must_use]
    pub fn bind(&self, params: &JsonValue) -> BoundQuery {
        BoundQuery {
            text: self.text.clone(),
            values: self.names.iter().map(|name| resolve(name, params)).collect(),
        }
    }

    /// # Errors
    /// Returns `PgKeenError::MissingParameter` for the first name `params` lacks.
    pub fn bind_strict(&self, params: &JsonValue) -> Result<BoundQuery, PgKeenError> {
        let values = self
            .names
            .iter()
            .map(|name| match resolve(name, params) {
                RowValues::Missing => Err(PgKeenError::MissingParameter { name: name.clone() }),
                value => Ok(value),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BoundQuery {
            text: self.text.clone(),
            values,
        })
    }

    /// # Errors
    /// Fails only under [`MissingParamPolicy::Strict`], see [`Extracted::bind_strict`].
    pub fn bind_with(
        &self,
        params: &JsonValue,
        policy: MissingParamPolicy,
    ) -> Result<BoundQuery, PgKeenError> {
        match policy {
            MissingParamPolicy::PassThrough => Ok(self.bind(params)),
            MissingParamPolicy::Strict => self.bind_strict(params),
        }
    }
}

/// A template parsed once and bound many times.
///
/// ```rust
/// use pg_keen::parameterize::NamedQuery;
/// use pg_keen::types::RowValues;
/// use serde_json::json;
///
/// let by_val = NamedQuery::new("SELECT 1 FROM foo WHERE val = :val");
/// let bound = by_val.bind(&json!({ "val": 1 }));
/// assert_eq!(bound.text, "SELECT 1 FROM foo WHERE val = $1");
/// assert_eq!(bound.values, vec![RowValues::Int(1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    extracted: Arc<Extracted>,
}

impl NamedQuery {
    #[must_use]
    pub fn new(template: &str) -> Self {
        Self {
            extracted: Arc::new(extract(template)),
        }
    }

    /// Parse through `cache`, sharing the result with other users of the same text.
    #[must_use]
    pub fn cached(template: &str, cache: &TemplateCache) -> Self {
        Self {
            extracted: cache.extract(template),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.extracted.text
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.extracted.names
    }

    #[must_use]
    pub fn extracted(&self) -> &Extracted {
        &self.extracted
    }

    #[must_use]
    pub fn bind(&self, params: &JsonValue) -> BoundQuery {
        self.extracted.bind(params)
    }

    /// # Errors
    /// Returns `PgKeenError::MissingParameter` for the first name `params` lacks.
    pub fn bind_strict(&self, params: &JsonValue) -> Result<BoundQuery, PgKeenError> {
        self.extracted.bind_strict(params)
    }

    /// Turn this query into a reusable binding function.
    pub fn binder(&self) -> impl Fn(&JsonValue) -> BoundQuery + Send + Sync + 'static {
        let extracted = Arc::clone(&self.extracted);
        move |params: &JsonValue| extracted.bind(params)
    }
}

impl From<&str> for NamedQuery {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}
