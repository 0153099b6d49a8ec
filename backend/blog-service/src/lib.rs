/// Blog Service Library
///
/// A blogging backend: posts, threaded comments and users, persisted as
/// JSON collections on disk.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the `/api` route table
/// - `models`: Post, Comment and User records
/// - `services`: Listing pipeline, comment threads, enrichment and the
///   post/comment/user operations built on them
/// - `db`: Record store over a pluggable storage backend
/// - `security`: Password hashing and bearer tokens
/// - `middleware`: Bearer token authentication
/// - `permissions`: Ownership checks
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
