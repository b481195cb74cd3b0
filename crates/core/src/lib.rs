//! mdatlas Core Library
//!
//! This crate provides the foundational utilities shared by every mdatlas crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (application, cache and access settings)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AccessConfig, AppConfig, CacheConfig};
pub use error::{AppError, AppResult};
