use crate::error::{FdError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Optional overrides loaded from `fd.toml` in the working directory.
/// A missing file is not an error; every field has a built-in default.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Root data directory holding one subdirectory per agency/dataset.
    pub directory: Option<PathBuf>,
    /// Fact-table rows held in memory per fragment.
    pub chunk_size: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "fd.toml";
        if !Path::new(config_path).exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            FdError::Config(format!("Failed to read config file '{}': {}", config_path, e))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let config: Config = toml::from_str("directory = \"/tmp/fdata\"\nchunk_size = 500\n")
            .expect("valid config");
        assert_eq!(config.directory.as_deref(), Some(Path::new("/tmp/fdata")));
        assert_eq!(config.chunk_size, Some(500));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").expect("empty config");
        assert!(config.directory.is_none());
        assert!(config.chunk_size.is_none());
    }
}
