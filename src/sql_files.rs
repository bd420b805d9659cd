use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use crate::error::PgKeenError;

type Slot = Arc<OnceCell<Arc<str>>>;

/// Loads `.sql` files below a root directory and keeps their contents for reuse.
///
/// Concurrent first reads of one path share a single load. A failed read leaves nothing
/// behind, so the next call tries the file again.
#[derive(Debug)]
pub struct SqlFiles {
    root: PathBuf,
    slots: Mutex<HashMap<String, Slot>>,
}

impl SqlFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Contents of `relative_path`, read from disk on first use.
    ///
    /// # Errors
    /// Returns `PgKeenError::IoError` when the file cannot be read.
    pub async fn get(&self, relative_path: &str) -> Result<Arc<str>, PgKeenError> {
        let slot = self.slot(relative_path);
        let path = self.root.join(relative_path);
        let sql = slot
            .get_or_try_init(|| async {
                tracing::debug!(path = %path.display(), "loading sql file");
                let text = tokio::fs::read_to_string(&path).await?;
                Ok::<_, PgKeenError>(Arc::from(text))
            })
            .await?;
        Ok(Arc::clone(sql))
    }

    /// Number of paths that have been requested, loaded or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, relative_path: &str) -> Slot {
        let mut slots = self.lock();
        Arc::clone(slots.entry(relative_path.to_string()).or_default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
