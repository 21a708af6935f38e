//! Logger module
//!
//! Provides logging utilities for the replay server including:
//! - Server lifecycle logging
//! - Per-request replay logging (text or JSON)
//! - Leveled error, warning and info logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::ReplayLogEntry;

use crate::config::{Config, LogFormat, LogLevel};
use chrono::Local;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        config.logging.level,
        config.logging.format,
    )
}

fn enabled(level: LogLevel) -> bool {
    writer::get().map_or(LogLevel::Info, writer::LogWriter::level) >= level
}

fn stamped(message: &str) -> String {
    format!("[{}] {message}", Local::now().format("%Y/%m/%d %H:%M:%S"))
}

/// Write to info/access log
fn write_info(message: &str) {
    if !enabled(LogLevel::Info) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_access(&stamped(message)),
        None => println!("{}", stamped(message)),
    }
}

/// Write to error log
fn write_error(level: LogLevel, message: &str) {
    if !enabled(level) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_error(&stamped(message)),
        None => eprintln!("{}", stamped(message)),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Replay server started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Descriptor root: {}", config.store.root));
    write_info(&format!(
        "Preview variant: {}: {} -> *{}",
        config.store.preview_header, config.store.preview_value, config.store.preview_suffix
    ));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

pub fn log_error(message: &str) {
    write_error(LogLevel::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(LogLevel::Warn, &format!("[WARN] {message}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

/// Log one replayed request; entries carry their own timestamp
pub fn log_replay(entry: &ReplayLogEntry) {
    if !enabled(LogLevel::Info) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_access(&entry.format(w.format())),
        None => println!("{}", entry.format(LogFormat::Text)),
    }
}
