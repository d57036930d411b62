#![deny(missing_docs)]
//! MediaFire relay
//!
//! Resolves MediaFire share links to direct download links through a chain
//! of third-party APIs and a page scraper, then sends the file details to a
//! Telegram chat.

/// Configuration management
pub mod config;
/// Tracing setup with token redaction
pub mod logging;
/// Telegram delivery
pub mod notify;
/// Resolve, probe and notify in one call
pub mod relay;
/// Request validation
pub mod request;
/// Link resolution strategies and the fallback pipeline
pub mod resolver;
/// HTTP API
pub mod server;
/// Remote file size probing
pub mod size;
pub mod utils;
