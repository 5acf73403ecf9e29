//! MDX compiler for the docs site.
//!
//! Turns an MDX document into [`CompiledPage`]: parsed [`Frontmatter`],
//! rendered HTML, a heading outline and the list of embedded components.
//!
//! # Pipeline
//!
//! 1. [`split_frontmatter`] separates the YAML block from the body.
//! 2. Component tags are checked against a [`ComponentRegistry`] and rewritten
//!    into `data-component` containers. Unknown components fail compilation.
//! 3. The body is parsed with `pulldown-cmark` and passed through three event
//!    stages in order: code highlighting, heading slugs, heading autolinks.
//!
//! [`Compiler::frontmatter_only`] stops after step 1, for callers that need
//! metadata without paying for compilation.
//!
//! # Example
//!
//! ```
//! use docsite_renderer::{CompileError, Compiler};
//!
//! let compiler = Compiler::default();
//!
//! let page = compiler.compile("<Callout>Read this</Callout>").unwrap();
//! assert_eq!(page.components, vec!["Callout"]);
//!
//! let err = compiler.compile("<Blink>no</Blink>").unwrap_err();
//! assert!(matches!(err, CompileError::UnknownComponent { .. }));
//! ```

mod compiler;
mod components;
mod error;
mod frontmatter;
mod heading;
mod highlight;
mod util;

pub use compiler::{CompiledPage, Compiler};
pub use components::{ComponentRegistry, DEFAULT_COMPONENTS};
pub use error::CompileError;
pub use frontmatter::{Frontmatter, split_frontmatter};
pub use heading::{TocEntry, slugify};
pub use highlight::highlight;
pub use util::escape_html;
