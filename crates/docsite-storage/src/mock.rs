//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem or network access.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::storage::{
    ContentSource, PathLister, StorageError, StorageErrorKind, is_content_path, version_root,
};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Mock storage for testing.
///
/// Stores content in memory. Listing order is insertion order, which makes
/// tie-breaking in tree ordering observable from tests.
///
/// # Example
///
/// ```ignore
/// use docsite_storage::{ContentSource, MockStorage, PathLister};
///
/// let storage = MockStorage::new()
///     .with_file("docs/8.1/guide.mdx", "---\ntitle: Guide\n---\n")
///     .with_failure("docs/8.1/broken.mdx", StorageErrorKind::Unavailable);
///
/// let paths = storage.list("8.1").unwrap();
/// let content = storage.read("docs/8.1/guide.mdx").unwrap();
/// ```
#[derive(Debug)]
pub struct MockStorage {
    docs_dir: String,
    /// Listed paths in insertion order.
    listed: RwLock<Vec<String>>,
    contents: RwLock<HashMap<String, String>>,
    failures: RwLock<HashMap<String, StorageErrorKind>>,
    list_failure: RwLock<Option<StorageErrorKind>>,
    reads: AtomicUsize,
}

impl Default for MockStorage {
    fn default() -> Self {
        Self {
            docs_dir: "docs".to_owned(),
            listed: RwLock::new(Vec::new()),
            contents: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            list_failure: RwLock::new(None),
            reads: AtomicUsize::new(0),
        }
    }
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the docs directory used to compute version roots.
    #[must_use]
    pub fn with_docs_dir(mut self, docs_dir: impl Into<String>) -> Self {
        self.docs_dir = docs_dir.into();
        self
    }

    /// Add a file that is both listed and readable.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        self.listed.write().unwrap().push(path.clone());
        self.contents.write().unwrap().insert(path, content.into());
        self
    }

    /// Add readable content without listing it.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_content(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.contents
            .write()
            .unwrap()
            .insert(path.into(), content.into());
        self
    }

    /// List a path that has no content (reads as absent).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_listed(self, path: impl Into<String>) -> Self {
        self.listed.write().unwrap().push(path.into());
        self
    }

    /// Make reads of `path` fail with the given error kind.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, path: impl Into<String>, kind: StorageErrorKind) -> Self {
        self.failures.write().unwrap().insert(path.into(), kind);
        self
    }

    /// Make every listing fail with the given error kind.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_list_failure(self, kind: StorageErrorKind) -> Self {
        *self.list_failure.write().unwrap() = Some(kind);
        self
    }

    /// Number of `read` calls made so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ContentSource for MockStorage {
    fn read(&self, path: &str) -> Result<Option<String>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        if let Some(kind) = self.failures.read().unwrap().get(path) {
            return Err(StorageError::new(*kind)
                .with_backend(BACKEND)
                .with_path(path));
        }

        Ok(self.contents.read().unwrap().get(path).cloned())
    }
}

impl PathLister for MockStorage {
    fn list(&self, version: &str) -> Result<Vec<String>, StorageError> {
        if let Some(kind) = self.list_failure.read().unwrap().as_ref() {
            return Err(StorageError::new(*kind).with_backend(BACKEND));
        }

        let root = version_root(&self.docs_dir, version);
        Ok(self
            .listed
            .read()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with(&root) && is_content_path(p))
            .cloned()
            .collect())
    }
}
