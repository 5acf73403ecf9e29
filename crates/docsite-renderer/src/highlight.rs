//! Syntax highlighting for fenced code blocks.
//!
//! Produces `hljs-*` token spans so existing highlight.js themes style the
//! output. The tokenizer is lexical only: comments, strings, numbers,
//! keywords and literals.

use std::collections::HashMap;

use crate::util::escape_html;

/// Lexical rules for one language family.
struct Grammar {
    keywords: &'static [&'static str],
    literals: &'static [&'static str],
    line_comment: Option<&'static str>,
    block_comment: Option<(&'static str, &'static str)>,
    /// Line comments only start after whitespace or at line start (`#` in shells).
    comment_needs_space: bool,
    quotes: &'static [char],
}

const JS_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "break", "case", "catch", "class", "const", "continue",
    "debugger", "declare", "default", "delete", "do", "else", "enum", "export", "extends",
    "finally", "for", "from", "function", "get", "if", "implements", "import", "in",
    "instanceof", "interface", "keyof", "let", "namespace", "new", "of", "private", "protected",
    "public", "readonly", "return", "satisfies", "set", "static", "super", "switch", "this",
    "throw", "try", "type", "typeof", "var", "void", "while", "with", "yield",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "type",
    "unsafe", "use", "where", "while",
];

const SH_KEYWORDS: &[&str] = &[
    "case", "cd", "do", "done", "echo", "elif", "else", "esac", "export", "fi", "for",
    "function", "if", "in", "local", "npm", "npx", "pnpm", "return", "then", "until", "while",
    "yarn",
];

const JS: Grammar = Grammar {
    keywords: JS_KEYWORDS,
    literals: &["true", "false", "null", "undefined", "NaN", "Infinity"],
    line_comment: Some("//"),
    block_comment: Some(("/*", "*/")),
    comment_needs_space: false,
    quotes: &['"', '\'', '`'],
};

const JSON: Grammar = Grammar {
    keywords: &[],
    literals: &["true", "false", "null"],
    line_comment: None,
    block_comment: None,
    comment_needs_space: false,
    quotes: &['"'],
};

const RUST: Grammar = Grammar {
    keywords: RUST_KEYWORDS,
    literals: &["true", "false"],
    line_comment: Some("//"),
    block_comment: Some(("/*", "*/")),
    comment_needs_space: false,
    quotes: &['"'],
};

const SHELL: Grammar = Grammar {
    keywords: SH_KEYWORDS,
    literals: &[],
    line_comment: Some("#"),
    block_comment: None,
    comment_needs_space: true,
    quotes: &['"', '\''],
};

const YAML: Grammar = Grammar {
    keywords: &[],
    literals: &["true", "false", "null", "yes", "no"],
    line_comment: Some("#"),
    block_comment: None,
    comment_needs_space: true,
    quotes: &['"', '\''],
};

const CSS: Grammar = Grammar {
    keywords: &[],
    literals: &[],
    line_comment: None,
    block_comment: Some(("/*", "*/")),
    comment_needs_space: false,
    quotes: &['"', '\''],
};

const MARKUP: Grammar = Grammar {
    keywords: &[],
    literals: &[],
    line_comment: None,
    block_comment: Some(("<!--", "-->")),
    comment_needs_space: false,
    quotes: &['"'],
};

const MARKDOWN: Grammar = Grammar {
    keywords: &[],
    literals: &[],
    line_comment: None,
    block_comment: Some(("<!--", "-->")),
    comment_needs_space: false,
    quotes: &[],
};

/// Look up the grammar for a fence language.
fn grammar_for(language: &str) -> Option<&'static Grammar> {
    let grammar = match language.to_ascii_lowercase().as_str() {
        "js" | "javascript" | "mjs" | "cjs" | "jsx" | "ts" | "typescript" | "tsx" => &JS,
        "json" | "json5" => &JSON,
        "rust" | "rs" => &RUST,
        "sh" | "bash" | "shell" | "zsh" | "console" => &SHELL,
        "yaml" | "yml" => &YAML,
        "css" | "scss" | "less" => &CSS,
        "html" | "xml" | "svg" | "vue" => &MARKUP,
        "md" | "markdown" | "mdx" => &MARKDOWN,
        _ => return None,
    };
    Some(grammar)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

impl Grammar {
    /// Classify the token at the start of `rest`.
    ///
    /// Returns the `hljs` class (if any) and the token length in bytes, which
    /// is always at least one character.
    fn token(&self, rest: &str, prev: Option<char>) -> (Option<&'static str>, usize) {
        if let Some((open, close)) = self.block_comment
            && rest.starts_with(open)
        {
            let end = rest[open.len()..]
                .find(close)
                .map_or(rest.len(), |i| open.len() + i + close.len());
            return (Some("hljs-comment"), end);
        }

        if let Some(marker) = self.line_comment
            && rest.starts_with(marker)
            && (!self.comment_needs_space || prev.is_none_or(char::is_whitespace))
        {
            let end = rest.find('\n').unwrap_or(rest.len());
            return (Some("hljs-comment"), end);
        }

        let Some(first) = rest.chars().next() else {
            return (None, 0);
        };

        if self.quotes.contains(&first) {
            return (Some("hljs-string"), string_len(rest, first));
        }

        let after_ident = prev.is_some_and(is_ident_char);

        if first.is_ascii_digit() && !after_ident {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '_'))
                .unwrap_or(rest.len());
            return (Some("hljs-number"), end);
        }

        if is_ident_char(first) && !after_ident {
            let end = rest
                .find(|c: char| !is_ident_char(c))
                .unwrap_or(rest.len());
            let word = &rest[..end];
            let class = if self.keywords.contains(&word) {
                Some("hljs-keyword")
            } else if self.literals.contains(&word) {
                Some("hljs-literal")
            } else {
                None
            };
            return (class, end);
        }

        (None, first.len_utf8())
    }
}

/// Length of a quoted string starting at `rest[0]`, including both quotes.
///
/// Strings other than template literals stop at the end of the line.
fn string_len(rest: &str, quote: char) -> usize {
    let mut escaped = false;
    for (i, c) in rest.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return i + c.len_utf8();
        } else if c == '\n' && quote != '`' {
            return i;
        }
    }
    rest.len()
}

/// Highlight `code` for `language`, returning the inner HTML of a `<code>` element.
///
/// Unknown languages are escaped verbatim.
#[must_use]
pub fn highlight(language: &str, code: &str) -> String {
    let Some(grammar) = grammar_for(language) else {
        return escape_html(code);
    };

    let mut out = String::with_capacity(code.len() + code.len() / 2);
    let mut rest = code;
    let mut prev = None;

    while !rest.is_empty() {
        let (class, len) = grammar.token(rest, prev);
        let (token, tail) = rest.split_at(len);
        match class {
            Some(class) => {
                out.push_str(&format!(
                    r#"<span class="{class}">{}</span>"#,
                    escape_html(token)
                ));
            }
            None => out.push_str(&escape_html(token)),
        }
        prev = token.chars().last();
        rest = tail;
    }

    out
}

/// Render a complete highlighted code block.
///
/// A `title` fence attribute becomes `data-title` on the `<pre>` element.
pub(crate) fn code_block(
    language: Option<&str>,
    attrs: &HashMap<String, String>,
    code: &str,
) -> String {
    let mut html = String::with_capacity(code.len() + 64);
    html.push_str("<pre");
    if let Some(title) = attrs.get("title") {
        html.push_str(&format!(r#" data-title="{}""#, escape_html(title)));
    }
    let inner = match language {
        Some(lang) => format!(
            r#"><code class="hljs language-{}">{}</code></pre>"#,
            escape_html(lang),
            highlight(lang, code)
        ),
        None => format!(r#"><code class="hljs">{}</code></pre>"#, escape_html(code)),
    };
    html.push_str(&inner);
    html
}

/// Parse a fence info string into language and attributes.
///
/// `tsx title="Button.tsx"` yields `("tsx", {"title": "Button.tsx"})`.
pub(crate) fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let mut parts = info.split_whitespace();
    let language = parts.next().unwrap_or("").to_owned();

    let mut attrs = HashMap::new();
    for part in parts {
        if let Some((key, value)) = part.split_once('=') {
            let value = value.trim_matches('"').trim_matches('\'');
            attrs.insert(key.to_owned(), value.to_owned());
        }
    }

    (language, attrs)
}
