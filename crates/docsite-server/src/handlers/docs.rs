//! Docs tree and page endpoints.
//!
//! Both resolve content on the blocking pool, since storage reads may be
//! network requests.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use docsite_site::{DocsTree, RenderedPage, ResolveError, Resolver};
use docsite_storage::version_root;
use md5::{Digest, Md5};

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /api/docs/{version}/tree.
pub(crate) async fn get_tree(
    Path(version): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DocsTree>, ServerError> {
    if !state.has_version(&version) {
        return Err(ServerError::VersionNotFound(version));
    }

    let builder = Arc::clone(&state.tree);
    let tree = tokio::task::spawn_blocking(move || builder.build(&version)).await??;

    Ok(Json(tree))
}

/// Handle GET /api/docs/{version}/pages (version landing page).
pub(crate) async fn get_root_page(
    Path(version): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    get_page_impl(version, String::new(), state, headers).await
}

/// Handle GET /api/docs/{version}/pages/{*path}.
pub(crate) async fn get_page(
    Path((version, path)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    get_page_impl(version, path, state, headers).await
}

async fn get_page_impl(
    version: String,
    path: String,
    state: Arc<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    if !state.has_version(&version) {
        return Err(ServerError::VersionNotFound(version));
    }

    let Some(candidates) = page_candidates(state.resolver.docs_dir(), &version, &path) else {
        return Err(ServerError::PageNotFound(path));
    };

    let resolver = Arc::clone(&state.resolver);
    let page = tokio::task::spawn_blocking(move || resolve_first(&resolver, &candidates))
        .await??
        .ok_or_else(move || ServerError::PageNotFound(path))?;

    let body = serde_json::to_vec(&page)?;
    let etag = compute_etag(&version, &body);

    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(if_none_match) = if_none_match.to_str()
        && etag_matches(if_none_match, &etag)
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    tracing::debug!(version = %version, path = %page.meta.path, "Serving page");

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_owned()),
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "private, max-age=60".to_owned()),
        ],
        body,
    )
        .into_response())
}

/// Content paths tried for a page URL, in order.
///
/// Returns `None` for paths with `.` or `..` segments.
fn page_candidates(docs_dir: &str, version: &str, path: &str) -> Option<Vec<String>> {
    let path = path.trim_matches('/');
    if path.split('/').any(|s| s == "." || s == "..") {
        return None;
    }

    let root = version_root(docs_dir, version);
    if path.is_empty() {
        return Some(vec![format!("{root}index.mdx"), format!("{root}index.md")]);
    }

    Some(vec![
        format!("{root}{path}.mdx"),
        format!("{root}{path}.md"),
        format!("{root}{path}/index.mdx"),
        format!("{root}{path}/index.md"),
    ])
}

fn resolve_first(
    resolver: &Resolver,
    candidates: &[String],
) -> Result<Option<RenderedPage>, ResolveError> {
    for candidate in candidates {
        if let Some(page) = resolver.resolve(candidate)? {
            return Ok(Some(page));
        }
    }
    Ok(None)
}

/// Compute `ETag` from docs version and the serialized page (meta, toc and
/// content).
///
/// MD5 truncated to 64 bits (16 hex chars).
fn compute_etag(version: &str, body: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(version.as_bytes());
    hasher.update(b":");
    hasher.update(body);
    format!("\"{}\"", &hex::encode(hasher.finalize())[..16])
}

/// Whether an `If-None-Match` value matches `etag`.
///
/// Accepts `*`, comma-separated lists and weak validators.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .map(str::trim)
        .any(|tag| tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag)
}
