//! Persistent stores backing the API.
//!
//! Each store owns one piece of on-disk state: the countdown settings file,
//! the pictures directory, and the custom-slide document.

pub mod countdown;
pub mod pictures;
pub mod slide;

pub use countdown::{CountdownPatch, CountdownStore};
pub use pictures::PictureStore;
pub use slide::SlideStore;
