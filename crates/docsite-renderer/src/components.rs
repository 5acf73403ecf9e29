//! Embedded component handling.
//!
//! MDX documents embed components as JSX-like tags whose name starts with an
//! uppercase letter (`<Callout variant="info">`). Before markdown parsing,
//! every such tag outside code is checked against a [`ComponentRegistry`] and
//! rewritten into a hydration container:
//!
//! ```text
//! <Callout variant="info">      ->  <div data-component="Callout" data-props='{"variant":"info"}'>
//! </Callout>                    ->  </div>
//! <YouTubeCallout id="x" />     ->  <div data-component="YouTubeCallout" data-props='{"id":"x"}'></div>
//! ```
//!
//! MDX comments (`{/* ... */}`) are dropped.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser, Tag};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::CompileError;
use crate::util::line_at;

/// Components embeddable without extra configuration.
pub const DEFAULT_COMPONENTS: &[&str] = &[
    "Callout",
    "CodeSnippets",
    "CustomImage",
    "FeatureSnippets",
    "H1",
    "H3",
    "IfRenderer",
    "P",
    "Video",
    "YouTubeCallout",
];

/// Start of a component tag or an MDX comment.
static TAG_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{/\*|<(/?)([A-Z][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)").unwrap()
});

/// Allow-list of component names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentRegistry {
    names: BTreeSet<String>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self {
            names: DEFAULT_COMPONENTS.iter().map(|&n| n.to_owned()).collect(),
        }
    }
}

impl ComponentRegistry {
    /// Create a registry with no components at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Add a component name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    /// Add several component names.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Body with component tags rewritten.
#[derive(Debug)]
pub(crate) struct Expanded {
    pub(crate) body: String,
    /// Component names in order of first use.
    pub(crate) components: Vec<String>,
}

/// A parsed opening tag.
struct OpenTag {
    props: Map<String, Value>,
    self_closing: bool,
    /// Bytes consumed after the tag name, including the closing `>`.
    len: usize,
}

/// Rewrite component tags in `body`.
///
/// Line numbers in errors are relative to `body`.
pub(crate) fn expand_components(
    body: &str,
    registry: &ComponentRegistry,
    options: Options,
) -> Result<Expanded, CompileError> {
    let code = code_ranges(body, options);
    let mut out = String::with_capacity(body.len() + body.len() / 4);
    let mut components: Vec<String> = Vec::new();
    let mut stack: Vec<(String, usize)> = Vec::new();
    let mut pos = 0;

    while let Some(caps) = TAG_START.captures_at(body, pos) {
        let Some(whole) = caps.get(0) else { break };
        let start = whole.start();

        if let Some(range) = code.iter().find(|r| r.contains(&start)) {
            out.push_str(&body[pos..range.end]);
            pos = range.end;
            continue;
        }

        out.push_str(&body[pos..start]);

        // MDX comment
        let Some(name_match) = caps.get(2) else {
            match body[whole.end()..].find("*/}") {
                Some(i) => pos = whole.end() + i + 3,
                None => {
                    out.push_str(whole.as_str());
                    pos = whole.end();
                }
            }
            continue;
        };

        let name = name_match.as_str();
        let after_name = &body[whole.end()..];
        if !after_name.starts_with(|c: char| c.is_whitespace() || c == '/' || c == '>') {
            // Not a tag, e.g. `<Foo-bar`
            out.push_str(whole.as_str());
            pos = whole.end();
            continue;
        }

        let line = line_at(body, start);
        if !registry.contains(name) {
            return Err(CompileError::UnknownComponent {
                name: name.to_owned(),
                line,
            });
        }

        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let (html, end) = if closing {
            let len = closing_tag_len(after_name).ok_or_else(|| CompileError::MalformedTag {
                name: name.to_owned(),
                line,
                message: "expected `>`".to_owned(),
            })?;
            match stack.pop() {
                Some((open, _)) if open == name => {}
                _ => {
                    return Err(CompileError::UnexpectedClosingTag {
                        name: name.to_owned(),
                        line,
                    });
                }
            }
            ("</div>".to_owned(), whole.end() + len)
        } else {
            let tag = parse_open_tag(after_name).map_err(|message| CompileError::MalformedTag {
                name: name.to_owned(),
                line,
                message,
            })?;
            if !tag.self_closing {
                stack.push((name.to_owned(), line));
            }
            if !components.iter().any(|c| c == name) {
                components.push(name.to_owned());
            }
            (container(name, &tag), whole.end() + tag.len)
        };

        if alone_on_line(body, start, end) {
            // Blank lines around block-level tags keep the content markdown.
            out.push('\n');
            out.push_str(&html);
            out.push('\n');
        } else {
            out.push_str(&html);
        }
        pos = end;
    }

    if let Some((name, line)) = stack.pop() {
        return Err(CompileError::UnclosedComponent { name, line });
    }

    out.push_str(&body[pos..]);
    Ok(Expanded {
        body: out,
        components,
    })
}

/// Byte ranges of inline code spans and code blocks.
///
/// A component tag directly followed by a fence on the next line makes
/// CommonMark read both as one HTML block, so fences are also found line by
/// line and code spans on the remaining lines by matching backtick runs.
fn code_ranges(body: &str, options: Options) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Parser::new_ext(body, options)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Code(_) | Event::Start(Tag::CodeBlock(_)) => Some(range),
            _ => None,
        })
        .collect();

    let fences = fence_ranges(body);
    let mut pos = 0;
    for fence in &fences {
        ranges.extend(span_ranges(body, pos..fence.start));
        pos = fence.end;
    }
    ranges.extend(span_ranges(body, pos..body.len()));
    ranges.extend(fences);

    ranges.sort_by_key(|r| (r.start, std::cmp::Reverse(r.end)));
    ranges
}

/// Fenced code blocks (```` ``` ```` or `~~~`), each from its opening line
/// to the end of its closing line. An unclosed fence runs to the end.
fn fence_ranges(body: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut open: Option<(usize, char, usize)> = None;
    let mut offset = 0;

    for line in body.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            continue;
        }
        let text = line[indent..].trim_end();
        let Some(marker) = text.chars().next().filter(|c| matches!(c, '`' | '~')) else {
            continue;
        };
        let run = text.len() - text.trim_start_matches(marker).len();
        if run < 3 {
            continue;
        }

        match open {
            None => {
                let info = &text[run..];
                if marker == '`' && info.contains('`') {
                    continue;
                }
                open = Some((start, marker, run));
            }
            Some((from, fence, len)) if marker == fence && run >= len && text.len() == run => {
                ranges.push(from..offset);
                open = None;
            }
            Some(_) => {}
        }
    }

    if let Some((from, _, _)) = open {
        ranges.push(from..body.len());
    }
    ranges
}

/// Inline code spans within `within`: a backtick run up to the next run of
/// the same length in the same paragraph.
fn span_ranges(body: &str, within: Range<usize>) -> Vec<Range<usize>> {
    let text = &body[within.clone()];
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run = backtick_run(bytes, i);
        let mut j = i + run;
        let mut closed = None;
        while j < bytes.len() {
            let blank_line_follows = bytes[j] == b'\n'
                && text[j + 1..]
                    .lines()
                    .next()
                    .is_none_or(|l| l.trim().is_empty());
            if blank_line_follows {
                break;
            }
            if bytes[j] == b'`' {
                let len = backtick_run(bytes, j);
                if len == run {
                    closed = Some(j + len);
                    break;
                }
                j += len;
            } else {
                j += 1;
            }
        }
        match closed {
            Some(end) => {
                ranges.push(within.start + i..within.start + end);
                i = end;
            }
            None => i += run,
        }
    }

    ranges
}

fn backtick_run(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().take_while(|&&b| b == b'`').count()
}

fn alone_on_line(body: &str, start: usize, end: usize) -> bool {
    let line_start = body[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = body[end..].find('\n').map_or(body.len(), |i| end + i);
    body[line_start..start].trim().is_empty() && body[end..line_end].trim().is_empty()
}

fn container(name: &str, tag: &OpenTag) -> String {
    let props = Value::Object(tag.props.clone()).to_string();
    let mut html = format!(
        r#"<div data-component="{name}" data-props='{}'>"#,
        escape_attr(&props)
    );
    if tag.self_closing {
        html.push_str("</div>");
    }
    html
}

/// Escape a value for a single-quoted attribute.
fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('\'', "&#39;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Length of `</Name` remainder: optional whitespace then `>`.
fn closing_tag_len(rest: &str) -> Option<usize> {
    let trimmed = rest.trim_start();
    trimmed
        .starts_with('>')
        .then(|| rest.len() - trimmed.len() + 1)
}

/// Parse attributes after the tag name up to and including `>` or `/>`.
fn parse_open_tag(rest: &str) -> Result<OpenTag, String> {
    let mut props = Map::new();
    let mut i = 0;

    loop {
        i += whitespace_len(&rest[i..]);
        let tail = &rest[i..];

        if tail.is_empty() {
            return Err("unterminated tag".to_owned());
        }
        if tail.starts_with("/>") {
            return Ok(OpenTag {
                props,
                self_closing: true,
                len: i + 2,
            });
        }
        if tail.starts_with('>') {
            return Ok(OpenTag {
                props,
                self_closing: false,
                len: i + 1,
            });
        }

        let name_len = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')))
            .unwrap_or(tail.len());
        if name_len == 0 {
            return Err(format!("unexpected `{}`", tail.chars().next().unwrap_or(' ')));
        }
        let key = &tail[..name_len];
        i += name_len;

        let ws = whitespace_len(&rest[i..]);
        if !rest[i + ws..].starts_with('=') {
            props.insert(key.to_owned(), Value::Bool(true));
            continue;
        }
        i += ws + 1;
        i += whitespace_len(&rest[i..]);

        let value_src = &rest[i..];
        let (value, len) = match value_src.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let end = value_src[1..]
                    .find(q)
                    .ok_or_else(|| format!("unterminated value for `{key}`"))?;
                (Value::String(value_src[1..=end].to_owned()), end + 2)
            }
            Some('{') => {
                let len = balanced_len(value_src)
                    .ok_or_else(|| format!("unbalanced braces in `{key}`"))?;
                (expression_value(&value_src[1..len - 1]), len)
            }
            _ => return Err(format!("expected value for `{key}`")),
        };
        props.insert(key.to_owned(), value);
        i += len;
    }
}

fn whitespace_len(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// Length of a `{...}` expression including both braces, string-aware.
fn balanced_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Interpret a JSX expression as a JSON value where possible.
///
/// JSON literals parse directly; single-quoted strings and trailing commas are
/// normalised first. Anything else is kept as its source text.
fn expression_value(expr: &str) -> Value {
    let expr = expr.trim();
    if let Ok(value) = serde_json::from_str(expr) {
        return value;
    }
    if let Some(inner) = expr
        .strip_prefix('`')
        .and_then(|e| e.strip_suffix('`'))
        .filter(|inner| !inner.contains("${"))
    {
        return Value::String(inner.to_owned());
    }
    serde_json::from_str(&js_to_json(expr)).unwrap_or_else(|_| Value::String(expr.to_owned()))
}

/// Convert single-quoted strings to double-quoted and drop trailing commas.
fn js_to_json(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut chars = expr.chars().peekable();
    let mut in_double = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_double => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '"' => {
                in_double = !in_double;
                out.push(c);
            }
            '\'' if !in_double => {
                out.push('"');
                while let Some(s) = chars.next() {
                    match s {
                        '\'' => break,
                        '"' => out.push_str("\\\""),
                        '\\' => {
                            if let Some(next) = chars.next() {
                                if next == '\'' {
                                    out.push('\'');
                                } else {
                                    out.push('\\');
                                    out.push(next);
                                }
                            }
                        }
                        _ => out.push(s),
                    }
                }
                out.push('"');
            }
            ',' if !in_double => {
                let mut lookahead = chars.clone();
                while lookahead.peek().is_some_and(|c| c.is_whitespace()) {
                    lookahead.next();
                }
                if !matches!(lookahead.peek(), Some(']' | '}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}
