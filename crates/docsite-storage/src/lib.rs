//! Content source and path listing backends for the docs site.
//!
//! Two small traits describe everything the site needs from a content backend:
//!
//! - [`ContentSource`] reads the raw MDX/Markdown text behind a content path.
//!   A missing resource is `Ok(None)`, never an error.
//! - [`PathLister`] enumerates the content paths that belong to a documentation
//!   version.
//!
//! # Backends
//!
//! - [`FsStorage`]: local content directory
//! - [`GithubStorage`]: raw files and git trees from a GitHub repository
//! - [`MockStorage`]: in-memory backend for tests (behind the `mock` feature)
//!
//! # Path Convention
//!
//! Content paths are relative to the content root, `/`-separated and keep their
//! extension, e.g. `docs/8.1/get-started/index.mdx`.
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use docsite_storage::{ContentSource, FsStorage, PathLister};
//!
//! let storage = FsStorage::new(PathBuf::from("content"));
//! for path in storage.list("8.1")? {
//!     let source = storage.read(&path)?;
//! }
//! ```

mod fs;
mod github;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use fs::FsStorage;
pub use github::{GithubConfig, GithubStorage};
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use storage::{
    ContentSource, ErrorStatus, PathLister, StorageError, StorageErrorKind, is_content_path,
    version_root,
};
