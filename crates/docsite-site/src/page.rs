//! Content resolution.
//!
//! [`Resolver`] reads a content file through a [`ContentSource`], compiles it
//! (or only parses its frontmatter) and derives the page identity.

use std::sync::Arc;

use docsite_renderer::{CompileError, Compiler, Frontmatter, TocEntry};
use docsite_storage::{ContentSource, StorageError};
use serde::Serialize;

use crate::identity::{
    content_id, effective_leaf, file_name, segments, slug_for, title_from_name, version_root_of,
};

/// Page metadata derived from a content file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Content path without extension (e.g., `docs/8.1/get-started/index`).
    pub id: String,
    /// Content path as read (e.g., `docs/8.1/get-started/index.mdx`).
    pub path: String,
    /// File name with extension.
    pub name: String,
    pub slug: String,
    pub title: String,
    /// Navigation title, falls back to `title`.
    pub short_title: String,
    pub is_tab: bool,
    /// Path segments below the version root.
    pub segments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// Fully resolved page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    pub meta: PageMeta,
    /// Compiled HTML body.
    pub content: String,
    pub toc: Vec<TocEntry>,
}

/// Error resolving a page.
///
/// Absence is not an error: resolvers return `Ok(None)` for it.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Malformed frontmatter or disallowed embedded component.
    #[error("Failed to compile {path}: {source}")]
    Compile {
        path: String,
        #[source]
        source: CompileError,
    },
    /// Filesystem or network failure.
    #[error("Failed to read content: {0}")]
    Transport(#[from] StorageError),
}

/// Content resolver.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use docsite_renderer::Compiler;
/// use docsite_site::Resolver;
/// use docsite_storage::FsStorage;
///
/// let storage = Arc::new(FsStorage::new("content".into()));
/// let resolver = Resolver::new(storage, Compiler::default());
///
/// match resolver.resolve("docs/8.1/get-started/index.mdx")? {
///     Some(page) => println!("{}", page.meta.title),
///     None => println!("not found"),
/// }
/// ```
pub struct Resolver {
    source: Arc<dyn ContentSource>,
    compiler: Compiler,
    docs_dir: String,
}

impl Resolver {
    /// Create a resolver with the default `docs` directory.
    #[must_use]
    pub fn new(source: Arc<dyn ContentSource>, compiler: Compiler) -> Self {
        Self {
            source,
            compiler,
            docs_dir: "docs".to_owned(),
        }
    }

    /// Set the docs directory used to find version roots.
    #[must_use]
    pub fn with_docs_dir(mut self, docs_dir: impl Into<String>) -> Self {
        self.docs_dir = docs_dir.into().trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn docs_dir(&self) -> &str {
        &self.docs_dir
    }

    /// Resolve a page with compiled content.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Compile`] if the source does not compile and
    /// [`ResolveError::Transport`] if it cannot be read.
    pub fn resolve(&self, path: &str) -> Result<Option<RenderedPage>, ResolveError> {
        let Some(source) = self.read(path)? else {
            return Ok(None);
        };

        let compiled = self
            .compiler
            .compile(&source)
            .map_err(|source| ResolveError::Compile {
                path: path.to_owned(),
                source,
            })?;

        Ok(Some(RenderedPage {
            meta: self.meta_for(path, &compiled.frontmatter),
            content: compiled.html,
            toc: compiled.toc,
        }))
    }

    /// Resolve only the page metadata, without compiling the body.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Compile`] for malformed frontmatter and
    /// [`ResolveError::Transport`] if the source cannot be read.
    pub fn resolve_meta(&self, path: &str) -> Result<Option<PageMeta>, ResolveError> {
        let Some(source) = self.read(path)? else {
            return Ok(None);
        };

        let frontmatter =
            self.compiler
                .frontmatter_only(&source)
                .map_err(|source| ResolveError::Compile {
                    path: path.to_owned(),
                    source,
                })?;

        Ok(Some(self.meta_for(path, &frontmatter)))
    }

    fn read(&self, path: &str) -> Result<Option<String>, ResolveError> {
        if path.is_empty() {
            return Ok(None);
        }

        let source = self.source.read(path)?;
        if source.is_none() {
            tracing::debug!(path, "Content not found");
        }
        Ok(source)
    }

    fn meta_for(&self, path: &str, frontmatter: &Frontmatter) -> PageMeta {
        let id = content_id(path);
        let root = version_root_of(path, &self.docs_dir);
        let segments = segments(id, &root);

        let title = frontmatter
            .title
            .clone()
            .unwrap_or_else(|| title_from_name(effective_leaf(&segments)));
        let short_title = frontmatter
            .short_title()
            .map_or_else(|| title.clone(), str::to_owned);

        PageMeta {
            id: id.to_owned(),
            path: path.to_owned(),
            name: file_name(path).to_owned(),
            slug: slug_for(&segments),
            title,
            short_title,
            is_tab: frontmatter.is_tab(),
            segments,
            parent: frontmatter.parent.clone(),
            order: frontmatter.order,
        }
    }
}
