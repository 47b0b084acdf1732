#![deny(missing_docs)]

//! Core library for the docbrief document summarization service.

/// HTTP routing and REST handlers.
pub mod api;
/// Document catalogue, statistics, and upload staging.
pub mod catalogue;
/// Environment-driven configuration management.
pub mod config;
/// Text extraction for supported document formats.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Summarization pipeline counters.
pub mod metrics;
/// Upload orchestration shared by the HTTP surface.
pub mod service;
/// Prompting, model fallback, response recovery, and summary degradation.
pub mod summarization;
