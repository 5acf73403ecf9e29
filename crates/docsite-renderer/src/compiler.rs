//! MDX compilation pipeline.
//!
//! `source → frontmatter split → component expansion → markdown events →
//! highlight → slug → autolink → HTML`.
//!
//! The three event passes run in that fixed order: heading links must point at
//! the ids assigned by the slug pass.

use std::collections::HashMap;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;

use crate::components::{ComponentRegistry, expand_components};
use crate::error::CompileError;
use crate::frontmatter::{Frontmatter, split_frontmatter};
use crate::heading::{HeadingState, TocEntry};
use crate::highlight::{code_block, parse_fence_info};
use crate::util::{escape_html, heading_level_to_num, line_at};

/// Output of a full compilation.
#[derive(Clone, Debug, Serialize)]
pub struct CompiledPage {
    pub frontmatter: Frontmatter,
    /// Rendered body HTML.
    pub html: String,
    /// Outline of h2-h6 headings.
    pub toc: Vec<TocEntry>,
    /// Embedded components in order of first use.
    pub components: Vec<String>,
}

/// MDX compiler bound to a component allow-list.
///
/// # Example
///
/// ```
/// use docsite_renderer::Compiler;
///
/// let page = Compiler::default()
///     .compile("---\ntitle: Hello\n---\n## Install\n")
///     .unwrap();
///
/// assert_eq!(page.frontmatter.title.as_deref(), Some("Hello"));
/// assert_eq!(
///     page.html,
///     "<h2 id=\"install\"><a href=\"#install\">Install</a></h2>\n"
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Compiler {
    registry: ComponentRegistry,
    gfm: bool,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(ComponentRegistry::default())
    }
}

impl Compiler {
    /// Create a compiler with GFM enabled.
    #[must_use]
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry,
            gfm: true,
        }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }

    /// Compile a document into frontmatter, HTML and outline.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] for malformed frontmatter and for component
    /// tags that are unknown, unbalanced or malformed. Line numbers refer to
    /// the full source, frontmatter included.
    pub fn compile(&self, source: &str) -> Result<CompiledPage, CompileError> {
        let (frontmatter, body) = split_frontmatter(source)?;
        let body_offset = line_at(source, source.len() - body.len()) - 1;

        let options = self.parser_options();
        let expanded = expand_components(body, &self.registry, options)
            .map_err(|e| e.offset_line(body_offset))?;

        let events: Vec<Event<'_>> = Parser::new_ext(&expanded.body, options).collect();
        let events = highlight_code_blocks(events);
        let mut headings = HeadingState::default();
        let events = slug_headings(events, &mut headings);
        let events = autolink_headings(events);

        let mut html = String::with_capacity(expanded.body.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut html, events.into_iter());

        Ok(CompiledPage {
            frontmatter,
            html,
            toc: headings.take_toc(),
            components: expanded.components,
        })
    }

    /// Parse only the frontmatter, leaving the body uncompiled.
    ///
    /// Component and markup errors in the body are not detected.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Frontmatter`] for malformed frontmatter.
    pub fn frontmatter_only(&self, source: &str) -> Result<Frontmatter, CompileError> {
        split_frontmatter(source).map(|(frontmatter, _)| frontmatter)
    }
}

/// Replace fenced and indented code blocks with highlighted HTML.
fn highlight_code_blocks(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut block: Option<(Option<String>, HashMap<String, String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let (lang, attrs) = match kind {
                    CodeBlockKind::Fenced(ref info) if !info.is_empty() => {
                        let (lang, attrs) = parse_fence_info(info);
                        (if lang.is_empty() { None } else { Some(lang) }, attrs)
                    }
                    _ => (None, HashMap::new()),
                };
                block = Some((lang, attrs, String::new()));
            }
            Event::Text(text) if block.is_some() => {
                if let Some((_, _, code)) = block.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, attrs, code)) = block.take() {
                    let html = code_block(lang.as_deref(), &attrs, &code);
                    out.push(Event::Html(CowStr::from(html)));
                }
            }
            other => out.push(other),
        }
    }

    out
}

/// Assign unique ids to headings.
fn slug_headings<'a>(events: Vec<Event<'a>>, headings: &mut HeadingState) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    // Index of the open heading's start event, and its plain text so far
    let mut open: Option<(usize, String)> = None;

    for event in events {
        match &event {
            Event::Start(Tag::Heading { .. }) => {
                open = Some((out.len(), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buffer)) = open.as_mut() {
                    buffer.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(level)) => {
                if let Some((index, text)) = open.take() {
                    let id = headings.complete_heading(heading_level_to_num(*level), &text);
                    if let Some(Event::Start(Tag::Heading { id: slot, .. })) = out.get_mut(index) {
                        *slot = Some(CowStr::from(id));
                    }
                }
            }
            _ => {}
        }
        out.push(event);
    }

    out
}

/// Wrap heading content in a link to the heading's own id.
fn autolink_headings(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut linked = false;

    for event in events {
        match &event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => {
                let anchor = format!(r##"<a href="#{}">"##, escape_html(id));
                out.push(event);
                out.push(Event::InlineHtml(CowStr::from(anchor)));
                linked = true;
                continue;
            }
            Event::End(TagEnd::Heading(_)) if linked => {
                out.push(Event::InlineHtml(CowStr::Borrowed("</a>")));
                linked = false;
            }
            _ => {}
        }
        out.push(event);
    }

    out
}
