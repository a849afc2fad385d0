//! # Tunedex Common Library
//!
//! Shared code for tunedex microservices including:
//! - Catalog data model (kinds, entries, chunk geometry)
//! - Event types (TunedexEvent enum) and the EventBus
//! - Configuration resolution (CLI > env > TOML file > default)
//! - SSE streaming helpers
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod sse;

pub use error::{Error, Result};
