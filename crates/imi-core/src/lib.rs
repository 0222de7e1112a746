//! # imi-core
//!
//! Core crate for the IMI order-book reconstruction system, providing:
//!
//! - **Types** (`types`) — sides, decoded feed messages, stream records
//! - **Configuration** (`config`) — JSON runner config deserialization
//! - **Error types** (`error`) — domain-specific `ImiError` via thiserror
//! - **Time utilities** (`time`) — microsecond-of-day helpers
//! - **Logging** (`logging`) — tracing-based structured logging

pub mod config;
pub mod error;
pub mod logging;
pub mod time;
pub mod types;

// Re-export types at crate root for convenience.
pub use types::*;
