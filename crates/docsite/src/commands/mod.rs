//! CLI command implementations.

pub(crate) mod page;
pub(crate) mod serve;
pub(crate) mod tree;

pub(crate) use page::PageArgs;
pub(crate) use serve::ServeArgs;
pub(crate) use tree::TreeArgs;
