use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;

use super::{Extracted, extract};

/// Parsed-template cache keyed by source text, bounded to its capacity with LRU eviction.
///
/// A disabled cache parses on every call; both modes return identical results.
#[derive(Debug)]
pub struct TemplateCache {
    entries: Option<Mutex<LruCache<String, Arc<Extracted>>>>,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TemplateCache {
    pub const DEFAULT_CAPACITY: usize = 256;

    /// An enabled cache holds up to [`Self::DEFAULT_CAPACITY`] templates.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        if enabled {
            Self::with_capacity(Self::DEFAULT_CAPACITY)
        } else {
            Self::disabled()
        }
    }

    /// A capacity of 0 disables the cache.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { entries: None }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| {
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .cap()
                .get()
        })
    }

    /// Extract `template`, reusing an earlier parse of the same text when enabled.
    pub fn extract(&self, template: &str) -> Arc<Extracted> {
        let Some(entries) = &self.entries else {
            return Arc::new(extract(template));
        };

        if let Some(hit) = entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(template)
        {
            return Arc::clone(hit);
        }

        // parse outside the lock; a concurrent miss on the same text keeps the first entry
        let parsed = Arc::new(extract(template));
        let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.get_or_insert(template.to_string(), || parsed))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| {
            entries.lock().unwrap_or_else(PoisonError::into_inner).len()
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }
}
