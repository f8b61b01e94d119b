//! Time-tag analysis configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for analysis.json
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots embedded in reports

pub mod analysis;
pub mod load;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use analysis::AnalysisConfig;
pub use load::{load_config, ConfigError, ResolvedConfig};
pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_analysis, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
