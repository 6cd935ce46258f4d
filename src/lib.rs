#![deny(missing_docs)]

//! Core library for the item registry service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// In-memory item registry: data model, validation, and service.
pub mod registry;
