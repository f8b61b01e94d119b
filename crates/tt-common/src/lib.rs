//! Time-tag analysis common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the tt-* crates:
//! - Detector channel identity
//! - Common error types with stable codes
//! - Report output formats
//! - Output schema versioning

pub mod error;
pub mod id;
pub mod output;
pub mod schema;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use id::{ChannelId, ChannelPair};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
