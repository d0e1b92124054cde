// Admin API handlers module

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::sync::Arc;

use super::response::{error_response, json_response};
use super::types::{
    ActionResponse, BackgroundUploaded, CountdownUpdated, PicturesResponse, UploadResponse,
};
use crate::config::AppState;
use crate::error::ApiError;
use crate::http::multipart;
use crate::logger;
use crate::store::countdown::{CountdownPatch, CountdownSnapshot};

/// Current countdown state
pub async fn countdown_get(state: Arc<AppState>) -> Result<Response<Full<Bytes>>, Infallible> {
    let snapshot = state.countdown.current().await;
    json_response(StatusCode::OK, &snapshot)
}

/// Apply a countdown patch
pub async fn countdown_update(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match update_countdown(req, &state).await {
        Ok(snapshot) => json_response(StatusCode::OK, &CountdownUpdated::from(snapshot)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn update_countdown(
    req: Request<hyper::body::Incoming>,
    state: &Arc<AppState>,
) -> Result<CountdownSnapshot, ApiError> {
    let body = collect_body(req).await?;
    let patch: CountdownPatch = serde_json::from_slice(&body)
        .map_err(|e| ApiError::validation(format!("Invalid JSON: {e}")))?;
    state.countdown.update(&patch).await
}

/// List displayable pictures
pub async fn pictures_list(state: Arc<AppState>) -> Result<Response<Full<Bytes>>, Infallible> {
    match state.pictures.list().await {
        Ok(pictures) => json_response(
            StatusCode::OK,
            &PicturesResponse {
                count: pictures.len(),
                pictures,
            },
        ),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Store uploaded pictures
pub async fn upload(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match parse_upload(req).await {
        Ok(parts) => match state.pictures.save_images(&parts).await {
            Ok(saved) => json_response(
                StatusCode::OK,
                &UploadResponse {
                    success: true,
                    count: saved.len(),
                    uploaded_files: saved,
                },
            ),
            Err(e) => Ok(error_response(&e)),
        },
        Err(e) => Ok(error_response(&e)),
    }
}

/// Store the custom slide background
pub async fn upload_background(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match parse_upload(req).await {
        Ok(parts) => match state.pictures.save_background(&parts).await {
            Ok(filename) => json_response(
                StatusCode::OK,
                &BackgroundUploaded {
                    success: true,
                    filename,
                    message: "Background image uploaded successfully".to_string(),
                },
            ),
            Err(e) => Ok(error_response(&e)),
        },
        Err(e) => Ok(error_response(&e)),
    }
}

async fn parse_upload(
    req: Request<hyper::body::Incoming>,
) -> Result<Vec<multipart::Part>, ApiError> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let boundary = multipart::boundary_from_content_type(&content_type)?;
    let body = collect_body(req).await?;
    Ok(multipart::parse(&body, &boundary))
}

/// Delete a picture by filename
pub async fn picture_delete(
    encoded_name: &str,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let filename = percent_decode_str(encoded_name)
        .decode_utf8_lossy()
        .into_owned();
    match state.pictures.delete(&filename).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &ActionResponse::ok(format!("File {filename} deleted successfully")),
        ),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Current custom slide document
pub async fn slide_get(state: Arc<AppState>) -> Result<Response<Full<Bytes>>, Infallible> {
    let doc = state.slide.get().await;
    json_response(StatusCode::OK, &doc)
}

/// Save the custom slide document
pub async fn slide_save(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let doc: serde_json::Value = match collect_body(req).await.and_then(|body| {
        serde_json::from_slice(&body).map_err(|e| ApiError::validation(format!("Invalid JSON: {e}")))
    }) {
        Ok(doc) => doc,
        Err(e) => return Ok(error_response(&e)),
    };

    // Best-effort persistence: the write failure is logged, the request
    // still succeeds.
    if let Err(e) = state.slide.save(&doc).await {
        logger::log_error(&format!("Custom slide not persisted: {e}"));
    }
    json_response(
        StatusCode::OK,
        &ActionResponse::ok("Custom slide saved successfully"),
    )
}

/// Delete the custom slide document and its background
pub async fn slide_delete(state: Arc<AppState>) -> Result<Response<Full<Bytes>>, Infallible> {
    match state.slide.delete().await {
        Ok(()) => json_response(
            StatusCode::OK,
            &ActionResponse::ok("Custom slide deleted successfully"),
        ),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn collect_body(req: Request<hyper::body::Incoming>) -> Result<Bytes, ApiError> {
    match req.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(_) => Err(ApiError::validation("Failed to read request body")),
    }
}
