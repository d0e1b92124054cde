//! HTTP building blocks.
//!
//! MIME detection, multipart parsing, and response builders, decoupled from
//! routing and business logic.

pub mod mime;
pub mod multipart;
pub mod response;

pub use response::*;
