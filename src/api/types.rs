// API type definitions module
// Response payloads for the admin JSON API

use serde::Serialize;

use crate::store::countdown::CountdownSnapshot;

#[derive(Debug, Serialize)]
pub struct PicturesResponse {
    pub pictures: Vec<String>,
    pub count: usize,
}

/// Successful countdown update, echoing the new effective state
#[derive(Debug, Serialize)]
pub struct CountdownUpdated {
    pub success: bool,
    pub text: String,
    pub duration: i64,
    pub target_time: Option<String>,
}

impl From<CountdownSnapshot> for CountdownUpdated {
    fn from(snapshot: CountdownSnapshot) -> Self {
        Self {
            success: true,
            text: snapshot.text,
            duration: snapshot.duration,
            target_time: snapshot.target_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub uploaded_files: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct BackgroundUploaded {
    pub success: bool,
    pub filename: String,
    pub message: String,
}

/// Generic `{success, message}` acknowledgement
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
