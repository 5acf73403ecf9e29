//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`] for reading content from a local directory.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::storage::{
    ContentSource, PathLister, StorageError, StorageErrorKind, is_content_path, version_root,
};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Default include patterns for listing.
const DEFAULT_PATTERNS: [&str; 2] = ["**/*.md", "**/*.mdx"];

/// Filesystem storage implementation.
///
/// Reads content relative to a content root and lists the content files of a
/// documentation version by walking `<content_dir>/<docs_dir>/<version>/`.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use docsite_storage::{FsStorage, PathLister};
///
/// let storage = FsStorage::new(PathBuf::from("content"));
/// let paths = storage.list("8.1")?;
/// ```
#[derive(Debug)]
pub struct FsStorage {
    /// Content root directory.
    content_dir: PathBuf,
    /// Docs directory, relative to the content root.
    docs_dir: String,
    /// Include patterns, matched against paths relative to the version root.
    patterns: Vec<Pattern>,
}

impl FsStorage {
    /// Create a filesystem storage with the default `docs` directory and patterns.
    #[must_use]
    pub fn new(content_dir: PathBuf) -> Self {
        Self {
            content_dir,
            docs_dir: "docs".to_owned(),
            patterns: DEFAULT_PATTERNS
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
        }
    }

    /// Set the docs directory (relative to the content root).
    #[must_use]
    pub fn with_docs_dir(mut self, docs_dir: impl Into<String>) -> Self {
        self.docs_dir = docs_dir.into();
        self
    }

    /// Replace the include patterns used by [`PathLister::list`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if any pattern is not a valid glob.
    pub fn with_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, StorageError> {
        self.patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|e| {
                    StorageError::new(StorageErrorKind::InvalidPath)
                        .with_backend(BACKEND)
                        .with_source(e)
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Content root directory.
    #[must_use]
    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Validate that a path doesn't escape the content root.
    ///
    /// Rejects parent directory components (`..`) and absolute paths.
    fn validate_path(path: &Path) -> Result<(), StorageError> {
        let escapes = path.components().any(|c| {
            matches!(
                c,
                std::path::Component::ParentDir
                    | std::path::Component::RootDir
                    | std::path::Component::Prefix(_)
            )
        });

        if escapes {
            return Err(StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(path)
                .with_backend(BACKEND));
        }
        Ok(())
    }

    fn matches_patterns(&self, relative: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(relative))
    }

    /// Walk a directory, pushing content paths relative to the content root.
    ///
    /// `prefix` is the `/`-joined path of `dir` relative to the content root,
    /// `relative` the same relative to the version root.
    fn walk(
        &self,
        dir: &Path,
        prefix: &str,
        relative: &str,
        out: &mut Vec<String>,
    ) -> Result<(), StorageError> {
        let entries = fs::read_dir(dir)
            .map_err(|e| StorageError::io(e, Some(dir.to_path_buf())).with_backend(BACKEND))?;

        let mut entries: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| {
                let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
                let name = e.file_name().to_string_lossy().into_owned();
                (e, is_dir, name)
            })
            .collect();

        // Files first, then directories, each alphabetical
        entries.sort_by(|(_, a_is_dir, a_name), (_, b_is_dir, b_name)| {
            a_is_dir.cmp(b_is_dir).then_with(|| a_name.cmp(b_name))
        });

        for (entry, is_dir, name) in entries {
            // Skip hidden and underscore-prefixed files/dirs
            if name.starts_with('.') || name.starts_with('_') {
                continue;
            }

            let content_path = format!("{prefix}{name}");
            let version_path = format!("{relative}{name}");

            if is_dir {
                if name == "node_modules" {
                    continue;
                }
                self.walk(
                    &entry.path(),
                    &format!("{content_path}/"),
                    &format!("{version_path}/"),
                    out,
                )?;
            } else if is_content_path(&name) && self.matches_patterns(&version_path) {
                out.push(content_path);
            }
        }

        Ok(())
    }
}

impl ContentSource for FsStorage {
    fn read(&self, path: &str) -> Result<Option<String>, StorageError> {
        let relative = Path::new(path);
        Self::validate_path(relative)?;
        let full_path = self.content_dir.join(relative);

        if full_path.is_dir() {
            return Ok(None);
        }

        match fs::read_to_string(&full_path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(e, Some(full_path)).with_backend(BACKEND)),
        }
    }
}

impl PathLister for FsStorage {
    fn list(&self, version: &str) -> Result<Vec<String>, StorageError> {
        let root = version_root(&self.docs_dir, version);
        Self::validate_path(Path::new(&root))?;

        let dir = self.content_dir.join(&root);
        if !dir.is_dir() {
            tracing::debug!(version, dir = %dir.display(), "Version directory missing");
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        self.walk(&dir, &root, "", &mut paths)?;
        tracing::debug!(version, count = paths.len(), "Listed content paths");
        Ok(paths)
    }
}
