//! Identity derivation for content paths.
//!
//! Every content file gets an id (its path without extension) and a list of
//! segments relative to its version root:
//!
//! | Path                                   | Id                               | Segments                  |
//! |----------------------------------------|----------------------------------|---------------------------|
//! | `docs/8.1/faq.mdx`                     | `docs/8.1/faq`                   | `["faq"]`                 |
//! | `docs/8.1/get-started/index.mdx`       | `docs/8.1/get-started/index`     | `["get-started", "index"]`|
//! | `docs/8.1/get-started/install.md`      | `docs/8.1/get-started/install`   | `["get-started", "install"]` |
//!
//! An `index` file stands for its directory, so its effective leaf (and slug)
//! comes from the segment one level up.

use docsite_renderer::slugify;

/// Literal file stem of directory index pages.
const INDEX: &str = "index";

/// Strip the content extension (`.mdx` or `.md`) from a path.
#[must_use]
pub fn content_id(path: &str) -> &str {
    path.strip_suffix(".mdx")
        .or_else(|| path.strip_suffix(".md"))
        .unwrap_or(path)
}

/// Version root of a content path, with trailing slash.
///
/// `docs/8.1/get-started/index.mdx` with docs dir `docs` has root `docs/8.1/`.
/// A file directly in the docs dir has the docs dir as root; a path outside the
/// docs dir has an empty root.
#[must_use]
pub fn version_root_of(path: &str, docs_dir: &str) -> String {
    let docs_dir = docs_dir.trim_end_matches('/');
    let Some(rest) = path
        .strip_prefix(docs_dir)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return String::new();
    };

    match rest.split_once('/') {
        Some((version, _)) => format!("{docs_dir}/{version}/"),
        None => format!("{docs_dir}/"),
    }
}

/// Split an id into segments below `root`.
#[must_use]
pub fn segments(id: &str, root: &str) -> Vec<String> {
    id.strip_prefix(root)
        .unwrap_or(id)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Whether the last segment is the literal `index`.
#[must_use]
pub fn is_index(segments: &[String]) -> bool {
    segments.last().is_some_and(|s| s == INDEX)
}

/// Name that identifies the page.
///
/// The last segment, or the segment one level up when the last is `index`.
/// A lone `index` segment stays `index`.
#[must_use]
pub fn effective_leaf(segments: &[String]) -> &str {
    match segments {
        [.., parent, last] if last == INDEX => parent.as_str(),
        [.., last] => last.as_str(),
        [] => "",
    }
}

/// URL slug derived from the effective leaf.
#[must_use]
pub fn slug_for(segments: &[String]) -> String {
    slugify(effective_leaf(segments))
}

/// Last path component, extension included.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Fallback title from a file or directory name.
///
/// Replaces dashes and underscores with spaces and capitalizes each word.
///
/// ```
/// use docsite_site::title_from_name;
///
/// assert_eq!(title_from_name("get-started"), "Get Started");
/// assert_eq!(title_from_name("api_reference"), "Api Reference");
/// ```
#[must_use]
pub fn title_from_name(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Qualify a parent reference with the version root.
///
/// Parents may be written as full ids (`docs/8.1/get-started/index`), relative
/// to the version root (`get-started/index`), and with or without extension.
#[must_use]
pub fn qualify_parent(parent: &str, root: &str) -> String {
    let parent = content_id(parent.trim().trim_start_matches('/'));
    if root.is_empty() || parent.starts_with(root) {
        parent.to_owned()
    } else {
        format!("{root}{parent}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn segs(items: &[&str]) -> Vec<String> {
        items.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn test_content_id() {
        assert_eq!(content_id("docs/8.1/faq.mdx"), "docs/8.1/faq");
        assert_eq!(content_id("docs/8.1/faq.md"), "docs/8.1/faq");
        assert_eq!(content_id("docs/8.1/faq"), "docs/8.1/faq");
    }

    #[test]
    fn test_version_root_of() {
        assert_eq!(version_root_of("docs/8.1/a/index.mdx", "docs"), "docs/8.1/");
        assert_eq!(version_root_of("docs/8.1/faq.mdx", "docs/"), "docs/8.1/");
        assert_eq!(version_root_of("docs/index.mdx", "docs"), "docs/");
        assert_eq!(version_root_of("blog/post.mdx", "docs"), "");
        assert_eq!(version_root_of("docsite/8.1/a.mdx", "docs"), "");
    }

    #[test]
    fn test_segments() {
        assert_eq!(
            segments("docs/8.1/get-started/index", "docs/8.1/"),
            segs(&["get-started", "index"])
        );
        assert_eq!(segments("blog/post", ""), segs(&["blog", "post"]));
    }

    #[test]
    fn test_effective_leaf_of_index_is_parent_segment() {
        assert_eq!(effective_leaf(&segs(&["get-started", "index"])), "get-started");
        assert_eq!(effective_leaf(&segs(&["a", "foo", "index"])), "foo");
        assert_eq!(effective_leaf(&segs(&["faq"])), "faq");
        assert_eq!(effective_leaf(&segs(&["index"])), "index");
        assert_eq!(effective_leaf(&[]), "");
    }

    #[test]
    fn test_slug_for() {
        assert_eq!(slug_for(&segs(&["writing-stories", "index"])), "writing-stories");
        assert_eq!(slug_for(&segs(&["api", "Doc_Blocks"])), "doc-blocks");
    }

    #[test]
    fn test_is_index() {
        assert!(is_index(&segs(&["a", "index"])));
        assert!(!is_index(&segs(&["a", "indexes"])));
        assert!(!is_index(&[]));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("docs/8.1/get-started/index.mdx"), "index.mdx");
        assert_eq!(file_name("faq.md"), "faq.md");
    }

    #[test]
    fn test_title_from_name() {
        assert_eq!(title_from_name("why-storybook"), "Why Storybook");
        assert_eq!(title_from_name("faq"), "Faq");
        assert_eq!(title_from_name("--double--dash"), "Double Dash");
        assert_eq!(title_from_name(""), "");
    }

    #[test]
    fn test_qualify_parent() {
        let root = "docs/8.1/";

        assert_eq!(
            qualify_parent("docs/8.1/get-started/index", root),
            "docs/8.1/get-started/index"
        );
        assert_eq!(
            qualify_parent("get-started/index", root),
            "docs/8.1/get-started/index"
        );
        assert_eq!(
            qualify_parent("/get-started/index.mdx", root),
            "docs/8.1/get-started/index"
        );
        assert_eq!(qualify_parent("faq", ""), "faq");
    }
}
