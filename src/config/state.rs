// Application state module
// Owns the stores and cached configuration flags shared across requests

use std::sync::atomic::AtomicBool;

use super::types::Config;
use crate::store::{CountdownStore, PictureStore, SlideStore};

/// Application state
///
/// One instance is created at startup and shared behind an `Arc`; the
/// stores guard their own on-disk state.
pub struct AppState {
    pub config: Config,
    pub countdown: CountdownStore,
    pub pictures: PictureStore,
    pub slide: SlideStore,

    // Cached config value for lock-free access on the request path
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let countdown = CountdownStore::load(&config.storage.settings_file);
        let pictures = PictureStore::new(&config.storage.pictures_dir);
        let slide = SlideStore::new(&config.storage.slide_file, pictures.clone());

        Self {
            config: config.clone(),
            countdown,
            pictures,
            slide,
            cached_access_log: AtomicBool::new(config.logging.access_log),
        }
    }
}
