//! Picture directory store.
//!
//! Owns the flat pictures directory: listing, upload writes, deletes, and
//! the reserved background slot for the custom slide.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::ApiError;
use crate::http::multipart::Part;

/// Extensions the slideshow will display.
pub const PICTURE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Base name of the custom-slide background file, any extension.
pub const BACKGROUND_STEM: &str = "background_main_slide";

/// Reserved subdirectory holding the background slot.
pub const BACKGROUND_DIR: &str = "main_slide_bg";

/// Probe order when the background's extension is unknown. The first hit
/// wins, which keeps reads deterministic even if uploads with different
/// extensions left more than one candidate behind.
const BACKGROUND_PROBE_ORDER: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

#[derive(Debug, Clone)]
pub struct PictureStore {
    root: PathBuf,
    // Serializes writes and deletes; reads go lock-free
    mutations: Arc<Mutex<()>>,
}

impl PictureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mutations: Arc::new(Mutex::new(())),
        }
    }

    /// List displayable pictures as relative paths, sorted ascending.
    ///
    /// Creates the pictures directory on first use. Non-files, non-image
    /// extensions and the reserved background name are filtered out.
    pub async fn list(&self) -> Result<Vec<String>, ApiError> {
        fs::create_dir_all(&self.root).await?;

        let mut pictures = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if is_listed_picture(name) {
                pictures.push(self.root.join(name).to_string_lossy().into_owned());
            }
        }

        pictures.sort();
        Ok(pictures)
    }

    /// Write every image part to the pictures directory, overwriting files
    /// of the same name. Returns the stored names in encounter order.
    pub async fn save_images(&self, parts: &[Part]) -> Result<Vec<String>, ApiError> {
        let _guard = self.mutations.lock().await;
        fs::create_dir_all(&self.root).await?;

        let mut saved = Vec::new();
        for part in parts {
            let Some(name) = image_filename(part) else {
                continue;
            };
            fs::write(self.root.join(&name), &part.data).await?;
            saved.push(name);
        }

        if saved.is_empty() {
            return Err(ApiError::validation("No valid image files found"));
        }
        Ok(saved)
    }

    /// Remove a picture by bare filename.
    pub async fn delete(&self, filename: &str) -> Result<(), ApiError> {
        if filename.contains(['/', '\\']) || filename.contains("..") {
            return Err(ApiError::validation("Invalid filename"));
        }
        let _guard = self.mutations.lock().await;

        let path = self.root.join(filename);
        let metadata = fs::metadata(&path)
            .await
            .map_err(|_| ApiError::not_found("File not found"))?;
        if !metadata.is_file() {
            return Err(ApiError::not_found("Not a regular file"));
        }

        fs::remove_file(&path).await?;
        Ok(())
    }

    /// Store the first image part as the background slot, named after the
    /// reserved stem plus the upload's own extension (lower-cased).
    pub async fn save_background(&self, parts: &[Part]) -> Result<String, ApiError> {
        let _guard = self.mutations.lock().await;
        let (filename, data) = parts
            .iter()
            .find_map(|p| {
                if p.is_image() {
                    p.filename.as_deref().map(|f| (f, &p.data))
                } else {
                    None
                }
            })
            .ok_or_else(|| ApiError::validation("No valid image file found"))?;

        let stored_name = background_filename(filename);
        let dir = self.background_dir();
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(&stored_name), data).await?;
        Ok(stored_name)
    }

    /// Relative path of the current background, if one exists.
    pub async fn background(&self) -> Option<String> {
        self.background_path()
            .await
            .map(|p| p.to_string_lossy().into_owned())
    }

    /// Remove the background slot: the first probe-order match, then the
    /// reserved subdirectory. Leftover candidates with other extensions
    /// keep the directory non-empty; that is fine.
    pub async fn remove_background(&self) -> Result<(), ApiError> {
        let _guard = self.mutations.lock().await;
        if let Some(path) = self.background_path().await {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        let _ = fs::remove_dir(self.background_dir()).await;
        Ok(())
    }

    pub fn background_dir(&self) -> PathBuf {
        self.root.join(BACKGROUND_DIR)
    }

    async fn background_path(&self) -> Option<PathBuf> {
        let dir = self.background_dir();
        for ext in BACKGROUND_PROBE_ORDER {
            let candidate = dir.join(format!("{BACKGROUND_STEM}.{ext}"));
            if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
                return Some(candidate);
            }
        }
        None
    }
}

fn is_listed_picture(name: &str) -> bool {
    let path = Path::new(name);
    let allowed_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            PICTURE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        });
    let reserved = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem == BACKGROUND_STEM);
    allowed_extension && !reserved
}

/// Stored filename for an upload part, or None if the part is not an image
/// upload. Client-supplied names are flattened to their final path component
/// so the directory stays flat.
fn image_filename(part: &Part) -> Option<String> {
    if !part.is_image() {
        return None;
    }
    let filename = part.filename.as_deref()?;
    let base = filename.rsplit(['/', '\\']).next().unwrap_or("");
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_string())
}

fn background_filename(original: &str) -> String {
    match Path::new(original).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{BACKGROUND_STEM}.{}", ext.to_ascii_lowercase()),
        None => BACKGROUND_STEM.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_part(filename: &str, data: &[u8]) -> Part {
        Part {
            name: Some("files".to_string()),
            filename: Some(filename.to_string()),
            content_type: Some("image/png".to_string()),
            data: data.to_vec(),
        }
    }

    fn text_part() -> Part {
        Part {
            name: Some("note".to_string()),
            filename: Some("note.txt".to_string()),
            content_type: Some("text/plain".to_string()),
            data: b"hello".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pictures");
        std::fs::create_dir(&root).unwrap();
        for name in [
            "b.JPG",
            "a.png",
            "notes.txt",
            "background_main_slide.png",
            "c.webp",
        ] {
            std::fs::write(root.join(name), b"x").unwrap();
        }

        let store = PictureStore::new(&root);
        let listed = store.list().await.unwrap();

        let names: Vec<_> = listed
            .iter()
            .map(|p| Path::new(p).file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.png", "b.JPG", "c.webp"]);
    }

    #[tokio::test]
    async fn test_list_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pictures");

        let store = PictureStore::new(&root);
        assert_eq!(store.list().await.unwrap(), Vec::<String>::new());
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_save_images_skips_non_image_parts() {
        let dir = tempfile::tempdir().unwrap();
        let store = PictureStore::new(dir.path().join("pictures"));

        let parts = vec![
            image_part("one.png", b"PNG1"),
            text_part(),
            image_part("two.png", b"PNG2"),
        ];
        let saved = store.save_images(&parts).await.unwrap();

        assert_eq!(saved, ["one.png", "two.png"]);
        assert_eq!(
            std::fs::read(dir.path().join("pictures/one.png")).unwrap(),
            b"PNG1"
        );
        assert!(!dir.path().join("pictures/note.txt").exists());
    }

    #[tokio::test]
    async fn test_save_images_flattens_client_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = PictureStore::new(dir.path().join("pictures"));

        let parts = vec![image_part("../evil/../../shot.png", b"PNG")];
        let saved = store.save_images(&parts).await.unwrap();

        assert_eq!(saved, ["shot.png"]);
        assert!(dir.path().join("pictures/shot.png").is_file());
    }

    #[tokio::test]
    async fn test_save_images_without_any_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = PictureStore::new(dir.path().join("pictures"));

        let result = store.save_images(&[text_part()]).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = PictureStore::new(dir.path().join("pictures"));

        for name in ["../etc/passwd", "a/b.png", "..", r"evil\..\x.png"] {
            assert!(
                matches!(store.delete(name).await, Err(ApiError::Validation(_))),
                "expected {name:?} to be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = PictureStore::new(dir.path().join("pictures"));

        assert!(matches!(
            store.delete("missing.png").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pictures");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("gone.png"), b"x").unwrap();

        let store = PictureStore::new(&root);
        store.delete("gone.png").await.unwrap();
        assert!(!root.join("gone.png").exists());
    }

    #[tokio::test]
    async fn test_background_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PictureStore::new(dir.path().join("pictures"));
        assert_eq!(store.background().await, None);

        let stored = store
            .save_background(&[image_part("Sunset.PNG", b"PNG")])
            .await
            .unwrap();
        assert_eq!(stored, "background_main_slide.png");

        let found = store.background().await.unwrap();
        assert!(found.ends_with("main_slide_bg/background_main_slide.png"));
    }

    #[tokio::test]
    async fn test_background_probe_priority() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pictures");
        let bg_dir = root.join(BACKGROUND_DIR);
        std::fs::create_dir_all(&bg_dir).unwrap();
        std::fs::write(bg_dir.join("background_main_slide.webp"), b"w").unwrap();
        std::fs::write(bg_dir.join("background_main_slide.jpeg"), b"j").unwrap();

        let store = PictureStore::new(&root);
        let found = store.background().await.unwrap();
        assert!(found.ends_with("background_main_slide.jpeg"));
    }
}
