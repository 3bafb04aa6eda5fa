/// Basic application code
pub mod app;
/// Application authorization
pub mod auth;
/// Controllers for REST endpoints
pub mod controller;
/// Cryptography-related objects
pub mod crypto;
/// Domain objects
pub mod domain;
/// Error enums
pub mod error;
/// Subscription lifecycle and expiry evaluation
pub mod lifecycle;
/// Stored records
pub mod model;
/// Pagination of list endpoints
pub mod pagination;
/// Repositories
pub mod repo;
/// Application settings
pub mod settings;
/// Application telemetry for tracing and logging
pub mod telemetry;
