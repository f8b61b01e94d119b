//! Finding `analysis.json`.
//!
//! Candidates are tried in order and the first existing file wins:
//! `--config`, `$TT_CONFIG`, `$TT_CONFIG_DIR/analysis.json`, then
//! `<config dir>/timetag/analysis.json`. An explicit `--config` is taken even
//! when missing, so loading can report it. With no file the built-in defaults
//! apply.

use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "TT_CONFIG";
pub const ENV_CONFIG_DIR: &str = "TT_CONFIG_DIR";
pub const CONFIG_FILENAME: &str = "analysis.json";

const APP_DIR: &str = "timetag";

/// Which candidate supplied the configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    CliArgument,
    Environment,
    XdgConfig,
    #[default]
    BuiltinDefault,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::CliArgument => "--config",
            ConfigSource::Environment => "environment",
            ConfigSource::XdgConfig => "user config dir",
            ConfigSource::BuiltinDefault => "built-in defaults",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`resolve_config`]; `path` is `None` for built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigPath {
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPath {
    if let Some(path) = cli_path {
        return ConfigPath {
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    let env = |key: &str| std::env::var_os(key).map(PathBuf::from);
    let candidates = [
        (env(ENV_CONFIG_PATH), ConfigSource::Environment),
        (
            env(ENV_CONFIG_DIR).map(|d| d.join(CONFIG_FILENAME)),
            ConfigSource::Environment,
        ),
        (
            xdg_config_dir().map(|d| d.join(CONFIG_FILENAME)),
            ConfigSource::XdgConfig,
        ),
    ];

    candidates
        .into_iter()
        .find_map(|(path, source)| {
            path.filter(|p| p.is_file()).map(|p| ConfigPath {
                path: Some(p),
                source,
            })
        })
        .unwrap_or_default()
}

/// `$XDG_CONFIG_HOME/timetag` when set and non-empty, else the platform
/// config dir.
pub fn xdg_config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)?;
    Some(base.join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_kept_even_if_missing() {
        let missing = Path::new("/nonexistent/analysis.json");
        let resolved = resolve_config(Some(missing));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path.as_deref(), Some(missing));
    }

    #[test]
    fn source_labels() {
        assert_eq!(ConfigSource::default().to_string(), "built-in defaults");
        assert_eq!(ConfigSource::CliArgument.to_string(), "--config");
    }
}
