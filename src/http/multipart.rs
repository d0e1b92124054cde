//! `multipart/form-data` parsing.
//!
//! A small dedicated parser for admin-panel uploads: the body is split on
//! the `--boundary` delimiter, each part's header block is separated from
//! its data at the blank line, and a single trailing CRLF (the one owned by
//! the following delimiter) is trimmed off the data.

use crate::error::ApiError;

/// One body part with its decoded headers and raw bytes.
#[derive(Debug, Clone, Default)]
pub struct Part {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    /// Whether the part's headers declare an image payload.
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// Extract the boundary token from a `Content-Type` header value.
pub fn boundary_from_content_type(content_type: &str) -> Result<String, ApiError> {
    if !content_type.trim_start().starts_with("multipart/form-data") {
        return Err(ApiError::validation("Invalid content type"));
    }

    let after_key = content_type
        .split("boundary=")
        .nth(1)
        .ok_or_else(|| ApiError::validation("Missing multipart boundary"))?;
    let boundary = after_key
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"');
    if boundary.is_empty() {
        return Err(ApiError::validation("Missing multipart boundary"));
    }
    Ok(boundary.to_string())
}

/// Parse a multipart body. Segments that don't form a valid part (the
/// preamble, the closing delimiter, header-less fragments) are skipped.
pub fn parse(body: &[u8], boundary: &str) -> Vec<Part> {
    let delimiter = format!("--{boundary}").into_bytes();
    split_on(body, &delimiter)
        .into_iter()
        .filter_map(parse_segment)
        .collect()
}

fn parse_segment(segment: &[u8]) -> Option<Part> {
    let segment = segment.strip_prefix(b"\r\n").unwrap_or(segment);
    // The closing delimiter leaves a lone "--" segment behind.
    if segment.is_empty() || segment.starts_with(b"--") {
        return None;
    }

    let header_end = find(segment, b"\r\n\r\n")?;
    let (header_block, rest) = segment.split_at(header_end);
    let data = &rest[4..];
    let data = data.strip_suffix(b"\r\n").unwrap_or(data);

    let mut part = Part {
        data: data.to_vec(),
        ..Part::default()
    };
    for raw_line in header_block.split(|&b| b == b'\n') {
        let line = String::from_utf8_lossy(raw_line);
        let line = line.trim_end_matches('\r').trim();
        if let Some(value) = header_value(line, "content-disposition") {
            part.name = quoted_param(value, "name");
            part.filename = quoted_param(value, "filename");
        } else if let Some(value) = header_value(line, "content-type") {
            part.content_type = Some(value.to_string());
        }
    }
    Some(part)
}

fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (key, value) = line.split_once(':')?;
    if key.trim().eq_ignore_ascii_case(name) {
        Some(value.trim())
    } else {
        None
    }
}

/// Extract a `param="value"` from a header, requiring a non-word character
/// before the parameter name so `name=` never matches inside `filename=`.
fn quoted_param(header: &str, param: &str) -> Option<String> {
    let marker = format!("{param}=\"");
    let mut search = 0;
    while let Some(found) = header[search..].find(&marker) {
        let at = search + found;
        let word_start = at == 0 || !header.as_bytes()[at - 1].is_ascii_alphanumeric();
        if word_start {
            let start = at + marker.len();
            let end = header[start..].find('"')? + start;
            return Some(header[start..end].to_string());
        }
        search = at + marker.len();
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn split_on<'a>(haystack: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut segments = Vec::new();
    let mut rest = haystack;
    while let Some(at) = find(rest, delimiter) {
        segments.push(&rest[..at]);
        rest = &rest[at + delimiter.len()..];
    }
    segments.push(rest);
    segments
}
