//! Bakery Core - Foundational Types and Abstractions
//!
//! This module provides the error taxonomy, engine configuration, and
//! telemetry setup shared across the Bakery workspace.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{BakeryError, Result};

/// Bakery version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
