//! Content collaborator traits and error types.
//!
//! Provides [`ContentSource`] and [`PathLister`] for abstracting content access,
//! along with [`StorageError`] for unified error handling across backends.
//!
//! Absence is part of the contract, not an error: [`ContentSource::read`]
//! returns `Ok(None)` for a resource that does not exist, and callers turn that
//! into a "not found" response.

use std::path::PathBuf;

/// Extensions recognised as content files.
const CONTENT_EXTENSIONS: [&str; 2] = [".mdx", ".md"];

/// Semantic error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist where one was required (e.g. content root).
    NotFound,
    /// Permission denied (filesystem) or rejected credentials (remote).
    PermissionDenied,
    /// Invalid path or identifier.
    InvalidPath,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Too many requests.
    RateLimited,
    /// Operation timed out.
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance. Informational: nothing in the site retries.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (config error, invalid path).
    #[default]
    Permanent,
    /// Retry immediately (timeout, connection reset).
    Temporary,
    /// Retry with backoff (rate limited, service unavailable).
    Persistent,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Github", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Attach a plain message as the error source.
    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        self.with_source(std::io::Error::other(message.into()))
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => StorageErrorKind::Timeout,
            _ => StorageErrorKind::Other,
        };
        let status = match err.kind() {
            std::io::ErrorKind::TimedOut => ErrorStatus::Temporary,
            _ => ErrorStatus::Permanent,
        };
        let mut error = Self::new(kind).with_status(status).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: docs/foo.mdx)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::RateLimited => "Rate limited",
            StorageErrorKind::Timeout => "Timeout",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Reads raw content by path.
pub trait ContentSource: Send + Sync {
    /// Read the raw text behind a content path.
    ///
    /// # Arguments
    ///
    /// * `path` - Content path relative to the content root
    ///   (e.g., `docs/8.1/get-started/index.mdx`)
    ///
    /// # Returns
    ///
    /// - `Ok(Some(text))` - the resource exists
    /// - `Ok(None)` - the resource does not exist
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on transport or filesystem failure.
    fn read(&self, path: &str) -> Result<Option<String>, StorageError>;
}

/// Enumerates the content paths of a documentation version.
pub trait PathLister: Send + Sync {
    /// List every content path under the version root, in a deterministic order.
    ///
    /// An unknown version lists as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the listing cannot be fetched.
    fn list(&self, version: &str) -> Result<Vec<String>, StorageError>;
}

impl<T: ContentSource + ?Sized> ContentSource for std::sync::Arc<T> {
    fn read(&self, path: &str) -> Result<Option<String>, StorageError> {
        (**self).read(path)
    }
}

impl<T: PathLister + ?Sized> PathLister for std::sync::Arc<T> {
    fn list(&self, version: &str) -> Result<Vec<String>, StorageError> {
        (**self).list(version)
    }
}

/// Check whether a path names a content file (`.md` or `.mdx`).
#[must_use]
pub fn is_content_path(path: &str) -> bool {
    CONTENT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Version root prefix for a docs directory, with trailing slash.
///
/// ```
/// use docsite_storage::version_root;
///
/// assert_eq!(version_root("docs", "8.1"), "docs/8.1/");
/// assert_eq!(version_root("docs/", "8.1"), "docs/8.1/");
/// ```
#[must_use]
pub fn version_root(docs_dir: &str, version: &str) -> String {
    format!("{}/{version}/", docs_dir.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_is_content_path() {
        assert!(is_content_path("docs/8.1/index.mdx"));
        assert!(is_content_path("docs/8.1/readme.md"));
        assert!(!is_content_path("docs/8.1/image.png"));
        assert!(!is_content_path("docs/8.1/mdx"));
    }

    #[test]
    fn test_version_root() {
        assert_eq!(version_root("docs", "7.6"), "docs/7.6/");
        assert_eq!(version_root("content/docs", "7.6"), "content/docs/7.6/");
    }

    #[test]
    fn test_storage_error_new() {
        let err = StorageError::new(StorageErrorKind::Unavailable);

        assert_eq!(err.kind, StorageErrorKind::Unavailable);
        assert_eq!(err.status, ErrorStatus::Permanent);
        assert!(err.path.is_none());
        assert!(err.backend.is_none());
    }

    #[test]
    fn test_storage_error_with_path() {
        let err = StorageError::new(StorageErrorKind::InvalidPath).with_path("../etc/passwd");

        assert_eq!(err.path.as_deref(), Some(Path::new("../etc/passwd")));
    }

    #[test]
    fn test_storage_error_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::new(StorageErrorKind::NotFound).with_source(io_err);

        assert!(err.downcast_source::<std::io::Error>().is_some());
    }

    #[test]
    fn test_storage_error_io_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::io(io_err, None);

        assert_eq!(err.kind, StorageErrorKind::PermissionDenied);
    }

    #[test]
    fn test_storage_error_io_timeout() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = StorageError::io(io_err, None);

        assert_eq!(err.kind, StorageErrorKind::Timeout);
        assert_eq!(err.status, ErrorStatus::Temporary);
    }

    #[test]
    fn test_storage_error_display_full() {
        let err = StorageError::new(StorageErrorKind::RateLimited)
            .with_backend("Github")
            .with_path("docs/8.1/index.mdx")
            .with_message("HTTP 429");

        assert_eq!(
            err.to_string(),
            "[Github] Rate limited: HTTP 429 (path: docs/8.1/index.mdx)"
        );
    }

    #[test]
    fn test_storage_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }
}
