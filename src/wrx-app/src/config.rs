// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),
}

/// Default search paths for `wrx-rs.toml`: current directory, then the
/// user config directory, then `/etc`.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("wrx-rs.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("wrx-rs").join("wrx-rs.toml"));
    }
    paths.push(PathBuf::from("/etc/wrx-rs/wrx-rs.toml"));
    paths
}

/// Parse `content` and deserialize the `key` table, if present.
fn parse_section<T: DeserializeOwned>(
    path: &Path,
    content: &str,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let parse_err =
        |e: &dyn std::fmt::Display| ConfigError::ParseError(path.to_path_buf(), e.to_string());

    let table: toml::Table = toml::from_str(content).map_err(|e| parse_err(&e))?;
    let Some(section) = table.get(key) else {
        return Ok(None);
    };

    // Round-trip through text so serde defaults fill missing fields.
    let section_toml = toml::to_string(section).map_err(|e| parse_err(&e))?;
    toml::from_str::<T>(&section_toml)
        .map(Some)
        .map_err(|e| parse_err(&e))
}

fn load_section_from_file<T: DeserializeOwned>(
    path: &Path,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
    parse_section(path, &content, key)
}

/// A configuration type stored as one section of `wrx-rs.toml`.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    /// Section key, e.g. `"wrx-server"`.
    fn section_key() -> &'static str;

    /// Load the section from a specific file. A file without the section
    /// is an error.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        load_section_from_file::<Self>(path, Self::section_key())?.ok_or_else(|| {
            ConfigError::ParseError(
                path.to_path_buf(),
                format!("missing [{}] section", Self::section_key()),
            )
        })
    }

    /// Load the first default-path file that contains the section.
    ///
    /// Returns `(Default::default(), None)` when none does.
    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in config_search_paths() {
            if path.exists() {
                if let Some(cfg) = load_section_from_file::<Self>(&path, Self::section_key())? {
                    return Ok((cfg, Some(path)));
                }
            }
        }
        Ok((Self::default(), None))
    }

    /// Parse the section out of in-memory TOML text.
    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let origin = Path::new("<inline>");
        Ok(parse_section::<Self>(origin, content, Self::section_key())?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        port: u16,
        name: String,
    }

    impl ConfigFile for Sample {
        fn section_key() -> &'static str {
            "sample"
        }
    }

    #[test]
    fn test_section_defaults_apply() {
        let cfg = Sample::from_toml_str("[sample]\nport = 9001\n").unwrap();
        assert_eq!(cfg.port, 9001);
        assert_eq!(cfg.name, "");
    }

    #[test]
    fn test_missing_section_yields_default() {
        let cfg = Sample::from_toml_str("[other]\nport = 1\n").unwrap();
        assert_eq!(cfg, Sample::default());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Sample::from_toml_str("[sample\nport = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_, _)));
    }

    #[test]
    fn test_load_from_file_requires_section() {
        let path = std::env::temp_dir().join(format!("wrx-app-test-{}.toml", std::process::id()));
        std::fs::write(&path, "[other]\nport = 1\n").unwrap();
        let err = Sample::load_from_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(err.to_string().contains("missing [sample] section"));
    }

    #[test]
    fn test_load_from_missing_file_is_read_error() {
        let err = Sample::load_from_file(Path::new("/nonexistent/wrx-rs.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_, _)));
    }

    #[test]
    fn test_search_paths_start_in_cwd() {
        let paths = config_search_paths();
        assert_eq!(paths[0], PathBuf::from("wrx-rs.toml"));
        assert_eq!(
            paths.last().unwrap(),
            &PathBuf::from("/etc/wrx-rs/wrx-rs.toml")
        );
    }
}
