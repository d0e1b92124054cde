//! Static asset serving module
//!
//! Serves the admin panel page and plain files (the slideshow page and the
//! pictures it references) from the configured static root, with `ETag`
//! conditional responses and directory traversal protection.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Serve the admin panel page
pub async fn serve_admin(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let page = &state.config.storage.admin_page;
    match fs::read_to_string(page).await {
        Ok(content) => {
            if ctx.access_log {
                logger::log_response(content.len());
            }
            http::build_html_response(content, ctx.is_head)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => http::build_404_response("Admin page not found"),
        Err(e) => {
            logger::log_error(&format!("Failed to read admin page '{page}': {e}"));
            http::build_500_response(&format!("Error serving admin page: {e}"))
        }
    }
}

/// Serve a static file from the configured static root
pub async fn serve_static(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let root = &state.config.storage.static_root;
    let index_files = &state.config.storage.index_files;

    match load_static(root, ctx.path, index_files).await {
        Some((content, content_type)) => {
            if ctx.access_log {
                logger::log_response(content.len());
            }
            let etag = generate_etag(&content);
            if etag_matches(ctx.if_none_match.as_deref(), &etag) {
                return http::build_304_response(&etag);
            }
            http::build_file_response(content, content_type, &etag, ctx.is_head)
        }
        None => http::build_404_response("Not Found"),
    }
}

/// Load a file under `root` with index file support
async fn load_static(
    root: &str,
    path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    // Remove leading slash and prevent directory traversal
    let relative = path.trim_start_matches('/').replace("..", "");
    let mut file_path = Path::new(root).join(&relative);

    let root_canonical = match Path::new(root).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static root not found or inaccessible '{root}': {e}"
            ));
            return None;
        }
    };

    // Directory request: try index files
    if file_path.is_dir() || relative.is_empty() || relative.ends_with('/') {
        for index_file in index_files {
            let candidate = file_path.join(index_file);
            if candidate.is_file() {
                file_path = candidate;
                break;
            }
        }
    }

    // File not found is common (404), no need to log
    let canonical = file_path.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {path} -> {}",
            canonical.display()
        ));
        return None;
    }

    let content = match fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            return None;
        }
    };

    let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}

/// Generate a weak-style `ETag` from content length and a fast hash
fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let hash = hasher.finish();
    format!("\"{:x}-{hash:x}\"", content.len())
}

/// Check the client's `If-None-Match` header against the computed `ETag`
fn etag_matches(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .any(|e| e.trim() == etag || e.trim() == "*")
    })
}
