use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::{CliError, Result};

/// Contents of `config.toml`.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Log filter used when `RUST_LOG` is not set, e.g. `"info"`.
    pub log_level: Option<String>,
    #[serde(default)]
    pub compute: ComputeConfig,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ComputeConfig {
    pub parallel: bool,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        ComputeConfig { parallel: true }
    }
}

pub(crate) fn default_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridbase")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

pub(crate) fn parse(path: &Path, content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a config file that must exist.
pub(crate) fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &content)
}

/// Load the user's config if there is one. A missing file means defaults.
pub(crate) fn load_default() -> Result<Config> {
    match default_config_path() {
        Some(path) if path.is_file() => load(&path),
        _ => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(content: &str) -> Result<Config> {
        parse(Path::new("config.toml"), content)
    }

    #[test]
    fn default_config_path_is_deterministic() {
        // Should never panic and should either be Some(path) or None.
        let _ = default_config_path();
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.compute.parallel);
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn full_config() {
        let config = parse_str("log_level = \"debug\"\n\n[compute]\nparallel = false\n").unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(!config.compute.parallel);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(parse_str("colour = 1"), Err(CliError::Config { .. })));
        assert!(parse_str("[compute]\nthreads = 4").is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = load(Path::new("/nonexistent/gridbase/config.toml")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
