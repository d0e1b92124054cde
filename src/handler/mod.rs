//! Request handler module
//!
//! Responsible for request routing dispatch: the admin JSON API, the admin
//! page, and static file serving for the slideshow front-end.

pub mod assets;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
