//! Output schema versioning.

/// Schema version stamped into every JSON payload emitted by the CLI.
///
/// Bump the minor version for additive fields, the major version for
/// renamed or removed fields.
pub const SCHEMA_VERSION: &str = "1.0.0";
