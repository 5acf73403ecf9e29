//! Content resolver and navigation tree builder for the docs site.
//!
//! [`Resolver`] turns a content path into a [`RenderedPage`] (or only its
//! [`PageMeta`]). [`TreeBuilder`] lists every page of a documentation version,
//! resolves their metadata and assembles a navigation [`DocsTree`] of up to
//! three levels.
//!
//! Missing content is not an error: both return `Ok(None)` or skip the page.
//! Pages that cannot be placed in the tree are reported in
//! [`DocsTree::dropped`] rather than disappearing.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docsite_renderer::Compiler;
//! use docsite_site::{Resolver, TreeBuilder};
//! use docsite_storage::{ContentSource, FsStorage};
//!
//! let storage = Arc::new(FsStorage::new("content".into()));
//! let source = Arc::clone(&storage) as Arc<dyn ContentSource>;
//! let resolver = Arc::new(Resolver::new(source, Compiler::default()));
//! let tree = TreeBuilder::new(resolver, storage).build("8.1")?;
//!
//! for node in &tree.items {
//!     println!("{} ({})", node.meta.short_title, node.children.len());
//! }
//! ```

mod identity;
mod page;
mod tree;

pub use docsite_renderer::TocEntry;
pub use identity::{
    content_id, effective_leaf, file_name, is_index, qualify_parent, segments, slug_for,
    title_from_name, version_root_of,
};
pub use page::{PageMeta, RenderedPage, ResolveError, Resolver};
pub use tree::{
    DocsTree, DropReason, DroppedNode, Placement, TreeBuilder, TreeNode, assemble, level_for,
};
