//! Reading `analysis.json` and recording where it came from.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::AnalysisConfig;
use crate::resolve::{resolve_config, ConfigSource};
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_analysis, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} does not exist", .0.display())]
    Missing(PathBuf),

    #[error("cannot read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid analysis config: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} was written for schema {found}, this build reads {expected}", .path.display())]
    SchemaVersion {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },

    #[error("invalid setting {0}")]
    Invalid(#[from] ValidationError),
}

impl From<ConfigError> for tt_common::Error {
    fn from(err: ConfigError) -> Self {
        tt_common::Error::Config(err.to_string())
    }
}

/// An [`AnalysisConfig`] plus its provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub analysis: AnalysisConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    /// SHA-256 of the file bytes, when a file was read.
    pub hash: Option<String>,
}

impl ResolvedConfig {
    pub fn defaults() -> Self {
        ResolvedConfig {
            analysis: AnalysisConfig::default(),
            path: None,
            source: ConfigSource::BuiltinDefault,
            hash: None,
        }
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(self)
    }
}

/// Find, read and validate the configuration. No file means defaults.
pub fn load_config(cli_path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    let found = resolve_config(cli_path);
    let Some(path) = found.path else {
        return Ok(ResolvedConfig::defaults());
    };
    if !path.exists() {
        return Err(ConfigError::Missing(path));
    }

    let (analysis, hash) = load_from_file(&path)?;
    validate_analysis(&analysis)?;
    Ok(ResolvedConfig {
        analysis,
        path: Some(path),
        source: found.source,
        hash: Some(hash),
    })
}

/// Parse one file and check its schema version. Returns the config and the
/// SHA-256 of the raw bytes; semantic validation is left to the caller.
pub fn load_from_file(path: &Path) -> Result<(AnalysisConfig, String), ConfigError> {
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let analysis: AnalysisConfig =
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    if analysis.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ConfigError::SchemaVersion {
            path: path.to_path_buf(),
            expected: crate::CONFIG_SCHEMA_VERSION,
            found: analysis.schema_version,
        });
    }
    Ok((analysis, compute_hash(&bytes)))
}

pub(crate) fn compute_hash(content: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(content.as_ref()))
}
