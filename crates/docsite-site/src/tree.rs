//! Navigation tree assembly.
//!
//! The tree has at most three levels. A page's level depends only on whether
//! it is an `index` file and how many segments it has below the version root:
//!
//! | Shape                         | Depth | Level |
//! |-------------------------------|-------|-------|
//! | `faq.mdx`                     | 1     | 1     |
//! | `get-started/index.mdx`       | 2     | 1     |
//! | `get-started/install.mdx`     | 2     | 2     |
//! | `api/doc-blocks/index.mdx`    | 3     | 2     |
//! | `api/doc-blocks/canvas.mdx`   | 3     | 3     |
//!
//! Level-2 pages hang under the level-1 page named by their `parent`
//! frontmatter, level-3 pages under the level-2 page. Pages that cannot be
//! placed are returned in [`DocsTree::dropped`] with a [`DropReason`].

use std::collections::HashMap;
use std::sync::Arc;

use docsite_storage::{PathLister, version_root};
use rayon::prelude::*;
use serde::Serialize;

use crate::identity::{is_index, qualify_parent};
use crate::page::{PageMeta, ResolveError, Resolver};

/// Page placed in the navigation tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub meta: PageMeta,
    pub level: u8,
    pub children: Vec<TreeNode>,
}

/// Why a page is missing from the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropReason {
    /// Rendered as an in-page tab, not a navigation entry.
    TabPage,
    /// Path shape has no level.
    UnsupportedShape { depth: usize, is_index: bool },
    /// Declared parent is missing or not in the tree.
    OrphanedParent { parent: Option<String> },
}

/// Page left out of the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DroppedNode {
    pub id: String,
    pub path: String,
    pub reason: DropReason,
}

/// Outcome of placing a single page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    Included(TreeNode),
    Dropped(DroppedNode),
}

impl Placement {
    /// Classify a page by tab flag and path shape.
    ///
    /// Included nodes have no children yet.
    #[must_use]
    pub fn of(meta: PageMeta) -> Self {
        if meta.is_tab {
            return Self::Dropped(DroppedNode::new(meta, DropReason::TabPage));
        }

        let depth = meta.segments.len();
        let is_index = is_index(&meta.segments);
        match level_for(is_index, depth) {
            Some(level) => Self::Included(TreeNode {
                meta,
                level,
                children: Vec::new(),
            }),
            None => Self::Dropped(DroppedNode::new(
                meta,
                DropReason::UnsupportedShape { depth, is_index },
            )),
        }
    }
}

impl DroppedNode {
    fn new(meta: PageMeta, reason: DropReason) -> Self {
        Self {
            id: meta.id,
            path: meta.path,
            reason,
        }
    }
}

/// Navigation forest plus the pages that were left out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DocsTree {
    pub items: Vec<TreeNode>,
    pub dropped: Vec<DroppedNode>,
}

/// Tree level for a page shape, `None` when the shape is unsupported.
///
/// ```
/// use docsite_site::level_for;
///
/// assert_eq!(level_for(true, 2), Some(1));
/// assert_eq!(level_for(false, 4), None);
/// ```
#[must_use]
pub fn level_for(is_index: bool, depth: usize) -> Option<u8> {
    match (is_index, depth) {
        (false, 1) | (true, 2) => Some(1),
        (false, 2) | (true, 3) => Some(2),
        (false, 3) => Some(3),
        _ => None,
    }
}

/// Assemble a tree from page metadata in listing order.
///
/// `root` is the version root used to qualify relative parent references.
#[must_use]
pub fn assemble(metas: Vec<PageMeta>, root: &str) -> DocsTree {
    let mut dropped = Vec::new();
    let mut levels: [Vec<TreeNode>; 3] = Default::default();

    for meta in metas {
        match Placement::of(meta) {
            Placement::Included(node) => levels[usize::from(node.level) - 1].push(node),
            Placement::Dropped(node) => {
                log_dropped(&node);
                dropped.push(node);
            }
        }
    }

    let [mut first, mut second, third] = levels;
    attach(&mut second, third, root, &mut dropped);
    attach(&mut first, second, root, &mut dropped);
    sort_by_order(&mut first);

    DocsTree {
        items: first,
        dropped,
    }
}

/// Move each child under the parent its `parent` field names.
fn attach(
    parents: &mut [TreeNode],
    children: Vec<TreeNode>,
    root: &str,
    dropped: &mut Vec<DroppedNode>,
) {
    let mut by_id: HashMap<String, usize> = HashMap::with_capacity(parents.len());
    for (i, node) in parents.iter().enumerate() {
        by_id.entry(node.meta.id.clone()).or_insert(i);
    }

    for child in children {
        let target = child
            .meta
            .parent
            .as_deref()
            .map(|parent| qualify_parent(parent, root))
            .and_then(|parent| by_id.get(&parent).copied());

        match target {
            Some(i) => parents[i].children.push(child),
            None => drop_orphan(child, dropped),
        }
    }

    for parent in parents {
        sort_by_order(&mut parent.children);
    }
}

/// Report an orphan and everything already attached below it.
fn drop_orphan(node: TreeNode, dropped: &mut Vec<DroppedNode>) {
    let TreeNode { meta, children, .. } = node;
    let reason = DropReason::OrphanedParent {
        parent: meta.parent.clone(),
    };
    let entry = DroppedNode::new(meta, reason);
    log_dropped(&entry);
    dropped.push(entry);

    for child in children {
        drop_orphan(child, dropped);
    }
}

/// Stable sort by `order`, unordered pages last.
fn sort_by_order(nodes: &mut [TreeNode]) {
    nodes.sort_by_key(|node| (node.meta.order.is_none(), node.meta.order));
}

fn log_dropped(node: &DroppedNode) {
    match &node.reason {
        DropReason::TabPage => tracing::debug!(id = %node.id, "Skipping tab page"),
        DropReason::UnsupportedShape { depth, is_index } => {
            tracing::warn!(id = %node.id, depth, is_index, "Dropping page with unsupported path shape");
        }
        DropReason::OrphanedParent { parent } => {
            tracing::warn!(id = %node.id, parent = ?parent, "Dropping page with unknown parent");
        }
    }
}

/// Builds navigation trees for documentation versions.
///
/// Lists every content path of a version, resolves metadata for each and
/// assembles the result with [`assemble`].
pub struct TreeBuilder {
    resolver: Arc<Resolver>,
    lister: Arc<dyn PathLister>,
    pool: Option<rayon::ThreadPool>,
}

impl TreeBuilder {
    /// Create a sequential tree builder.
    #[must_use]
    pub fn new(resolver: Arc<Resolver>, lister: Arc<dyn PathLister>) -> Self {
        Self {
            resolver,
            lister,
            pool: None,
        }
    }

    /// Resolve pages on a pool of `threads` workers.
    ///
    /// One thread keeps resolution sequential.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread pool cannot be created.
    pub fn with_parallelism(mut self, threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        self.pool = if threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("docsite-tree-{i}"))
                    .build()?,
            )
        } else {
            None
        };
        Ok(self)
    }

    /// Build the tree for a version.
    ///
    /// # Errors
    ///
    /// Returns the first listing, read or frontmatter failure, in listing order.
    pub fn build(&self, version: &str) -> Result<DocsTree, ResolveError> {
        let paths = self.lister.list(version)?;
        tracing::debug!(version, count = paths.len(), "Building docs tree");

        let resolved: Vec<Result<Option<PageMeta>, ResolveError>> = match &self.pool {
            Some(pool) => pool.install(|| {
                paths
                    .par_iter()
                    .map(|path| self.resolver.resolve_meta(path))
                    .collect()
            }),
            None => paths
                .iter()
                .map(|path| self.resolver.resolve_meta(path))
                .collect(),
        };

        let mut metas = Vec::with_capacity(paths.len());
        for (path, result) in paths.iter().zip(resolved) {
            match result? {
                Some(meta) => metas.push(meta),
                None => tracing::debug!(path = %path, "Listed path is absent, skipping"),
            }
        }

        let root = version_root(self.resolver.docs_dir(), version);
        let tree = assemble(metas, &root);
        tracing::info!(
            version,
            items = tree.items.len(),
            dropped = tree.dropped.len(),
            "Built docs tree"
        );
        Ok(tree)
    }
}
