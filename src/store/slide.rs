//! Custom slide document store.
//!
//! The slide is an opaque JSON document authored by the admin panel. The
//! `backgroundImage` field is never trusted from disk; it is recomputed from
//! the background slot on every read so the document can't go stale.

use serde_json::{json, Value};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::{ApiError, PersistError};
use crate::logger;
use crate::store::pictures::PictureStore;

const DEFAULT_BACKGROUND_COLOR: &str = "#f9f9f9";

#[derive(Debug, Clone)]
pub struct SlideStore {
    path: PathBuf,
    pictures: PictureStore,
    // Single writer for the document file
    writes: Arc<Mutex<()>>,
}

impl SlideStore {
    pub fn new(path: impl Into<PathBuf>, pictures: PictureStore) -> Self {
        Self {
            path: path.into(),
            pictures,
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Read the slide document, defaulting on a missing or corrupt file,
    /// with `backgroundImage` overlaid from the live background slot.
    pub async fn get(&self) -> Value {
        let mut doc = match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(doc @ Value::Object(_)) => doc,
                Ok(_) | Err(_) => {
                    logger::log_warning(&format!(
                        "Custom slide document {} is not a JSON object, using defaults",
                        self.path.display()
                    ));
                    default_slide()
                }
            },
            // Missing document is the normal first-run state.
            Err(_) => default_slide(),
        };

        let background = self.pictures.background().await;
        if let Value::Object(map) = &mut doc {
            map.insert(
                "backgroundImage".to_string(),
                background.map_or(Value::Null, Value::String),
            );
        }
        doc
    }

    /// Overwrite the document verbatim.
    pub async fn save(&self, doc: &Value) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(doc)?;
        let _guard = self.writes.lock().await;
        fs::write(&self.path, content)
            .await
            .map_err(|source| PersistError::Write {
                path: self.path.clone(),
                source,
            })
    }

    /// Remove the document, the background slot, and the reserved
    /// subdirectory if it ends up empty.
    pub async fn delete(&self) -> Result<(), ApiError> {
        {
            let _guard = self.writes.lock().await;
            match fs::remove_file(&self.path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.pictures.remove_background().await
    }
}

fn default_slide() -> Value {
    json!({
        "elements": [],
        "backgroundColor": DEFAULT_BACKGROUND_COLOR,
    })
}
