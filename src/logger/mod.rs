//! Logger module
//!
//! Logging utilities for the server: lifecycle messages, access logging,
//! and error/warning output, optionally redirected to files.

mod writer;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration.
///
/// Should be called once at application startup; before that, messages fall
/// back to stdout/stderr.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

pub fn log_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

pub fn log_error(message: &str) {
    let message = format!("[ERROR] {message}");
    match writer::get() {
        Some(w) => w.write_error(&message),
        None => eprintln!("{message}"),
    }
}

pub fn log_warning(message: &str) {
    let message = format!("[WARN] {message}");
    match writer::get() {
        Some(w) => w.write_error(&message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    log_info("======================================");
    log_info("Slideshow server started successfully");
    log_info(&format!("Slideshow:   http://{addr}"));
    log_info(&format!("Admin panel: http://{addr}/admin"));
    log_info(&format!(
        "Pictures directory: {}",
        config.storage.pictures_dir
    ));
    log_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log: {path}"));
    }
    log_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

pub fn log_request(method: &hyper::Method, uri: &hyper::Uri, version: hyper::Version) {
    log_info(&format!("[Request] {method} {uri} {version:?}"));
}

pub fn log_response(bytes: usize) {
    log_info(&format!("[Response] {bytes} bytes"));
}

pub fn log_headers_count(count: usize, show: bool) {
    if show {
        log_info(&format!("[Headers] Count: {count}"));
    }
}

pub fn log_api_request(method: &str, path: &str, status: u16) {
    log_info(&format!("[API] {method} {path} - {status}"));
}
