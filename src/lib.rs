//! Library crate for ringette-tagger, exposing modules for binaries and integration tests.

/// Runtime configuration loaded from disk.
pub mod config;
/// Access to the remote tagging backend.
pub mod dao;
/// Request, response and event payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP route handlers.
pub mod routes;
/// Application services behind the routes.
pub mod services;
/// Shared state, question graph and navigation.
pub mod state;
