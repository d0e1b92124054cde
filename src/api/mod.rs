// API module entry
// Admin JSON API for the slideshow display

mod handlers;
mod response;
mod types;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

/// API route handler
///
/// Dispatches to handler functions based on request path and method.
pub async fn handle_api(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/api/pictures") => handlers::pictures_list(state).await?,
        (&Method::GET, "/api/countdown") => handlers::countdown_get(state).await?,
        (&Method::POST, "/api/countdown") => handlers::countdown_update(req, state).await?,
        (&Method::POST, "/api/upload") => handlers::upload(req, state).await?,
        (&Method::POST, "/api/upload-background") => {
            handlers::upload_background(req, state).await?
        }
        (&Method::GET, "/api/custom-slide") => handlers::slide_get(state).await?,
        (&Method::POST, "/api/custom-slide") => handlers::slide_save(req, state).await?,
        (&Method::DELETE, "/api/custom-slide") => handlers::slide_delete(state).await?,
        (&Method::DELETE, p) => match p.strip_prefix("/api/delete/") {
            Some(encoded_name) => handlers::picture_delete(encoded_name, state).await?,
            None => response::not_found(),
        },
        _ => response::not_found(),
    };

    logger::log_api_request(method.as_str(), &path, response.status().as_u16());
    Ok(response)
}
