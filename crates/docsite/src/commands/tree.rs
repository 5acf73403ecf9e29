//! `docsite tree` command implementation.

use std::path::PathBuf;

use clap::Args;
use docsite_config::Config;
use docsite_server::Content;
use docsite_site::{DropReason, TreeNode};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tree command.
#[derive(Args)]
pub(crate) struct TreeArgs {
    /// Documentation version (e.g., 8.1).
    version: String,

    /// Path to configuration file (default: auto-discover docsite.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the tree as JSON.
    #[arg(long)]
    json: bool,
}

impl TreeArgs {
    /// Execute the tree command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or a page cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let content = Content::from_config(&config)?;
        if config.version(&self.version).is_none() {
            tracing::debug!(version = %self.version, "Version not listed in [[versions]]");
        }

        let tree = content.tree.build(&self.version)?;

        if self.json {
            output.data(&serde_json::to_string_pretty(&tree)?);
        } else {
            let mut lines = Vec::new();
            render_lines(&tree.items, 0, &output, &mut lines);
            for line in lines {
                output.data(&line);
            }
        }

        for dropped in &tree.dropped {
            output.warning(&format!(
                "Dropped {}: {}",
                dropped.path,
                describe(&dropped.reason)
            ));
        }

        if tree.items.is_empty() && tree.dropped.is_empty() {
            output.warning(&format!("No pages found for version {}", self.version));
        }

        Ok(())
    }
}

/// Indented `short title (slug)` lines, two spaces per level.
fn render_lines(nodes: &[TreeNode], depth: usize, output: &Output, lines: &mut Vec<String>) {
    for node in nodes {
        lines.push(format!(
            "{}{} {}",
            "  ".repeat(depth),
            node.meta.short_title,
            output.dimmed(&format!("({})", node.meta.slug))
        ));
        render_lines(&node.children, depth + 1, output, lines);
    }
}

fn describe(reason: &DropReason) -> String {
    match reason {
        DropReason::TabPage => "tab page".to_owned(),
        DropReason::UnsupportedShape { depth, is_index } => {
            let kind = if *is_index { "index page" } else { "page" };
            format!("unsupported {kind} at depth {depth}")
        }
        DropReason::OrphanedParent { parent: Some(parent) } => {
            format!("parent '{parent}' not in tree")
        }
        DropReason::OrphanedParent { parent: None } => "no parent declared".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use docsite_site::PageMeta;
    use pretty_assertions::assert_eq;

    use super::*;

    fn node(title: &str, slug: &str, level: u8, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            meta: PageMeta {
                id: format!("docs/8.1/{slug}"),
                path: format!("docs/8.1/{slug}.mdx"),
                name: format!("{slug}.mdx"),
                slug: slug.to_owned(),
                title: title.to_owned(),
                short_title: title.to_owned(),
                is_tab: false,
                segments: vec![slug.to_owned()],
                parent: None,
                order: None,
            },
            level,
            children,
        }
    }

    #[test]
    fn test_render_lines_indents_children() {
        console::set_colors_enabled(false);
        let output = Output::new();
        let tree = vec![
            node(
                "Get started",
                "get-started",
                1,
                vec![node("Install", "install", 2, vec![])],
            ),
            node("FAQ", "faq", 1, vec![]),
        ];

        let mut lines = Vec::new();
        render_lines(&tree, 0, &output, &mut lines);

        assert_eq!(
            lines,
            vec![
                "Get started (get-started)",
                "  Install (install)",
                "FAQ (faq)",
            ]
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&DropReason::TabPage), "tab page");
        assert_eq!(
            describe(&DropReason::UnsupportedShape {
                depth: 4,
                is_index: false,
            }),
            "unsupported page at depth 4"
        );
        assert_eq!(
            describe(&DropReason::OrphanedParent {
                parent: Some("docs/8.1/api/index".to_owned()),
            }),
            "parent 'docs/8.1/api/index' not in tree"
        );
        assert_eq!(
            describe(&DropReason::OrphanedParent { parent: None }),
            "no parent declared"
        );
    }
}
