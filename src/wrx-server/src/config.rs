// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for wrx-server.
//!
//! Config is loaded from the `[wrx-server]` section of `wrx-rs.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./wrx-rs.toml`
//! 3. `~/.config/wrx-rs/wrx-rs.toml`
//! 4. `/etc/wrx-rs/wrx-rs.toml`

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wrx_app::{ConfigError, ConfigFile};
use wrx_core::band::{BandWindow, CENTER_OFFSET_HZ, DEFAULT_BAND};

/// Top-level server configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// General settings
    pub general: GeneralConfig,
    /// TCP listener configuration
    pub listen: ListenConfig,
    /// Viewer session limits
    pub sessions: SessionsConfig,
    /// Receiver front end
    pub receiver: ReceiverConfig,
    /// Spectrum engines
    pub spectrum: SpectrumConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

/// TCP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// IP address to listen on
    pub listen: IpAddr,
    /// TCP port to listen on
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            listen: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 9001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Concurrent viewers; further connections are refused
    pub max_sessions: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self { max_sessions: 20 }
    }
}

/// Receiver front end configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Sample source: "tone" or "mock"
    pub source: String,
    /// Band code selected at startup
    pub initial_band: u32,
    /// Front end gain reduction (dB)
    pub gain_reduction_db: u32,
    /// Analog bandwidth requested from the front end (Hz)
    pub bandwidth_hz: u32,
    /// Test tone offset from the receiver centre (Hz), "tone" source only
    pub tone_offset_hz: i32,
    /// Test tone amplitude, "tone" source only
    pub tone_amplitude: f32,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            source: "tone".to_string(),
            initial_band: DEFAULT_BAND,
            gain_reduction_db: 20,
            bandwidth_hz: 600_000,
            tone_offset_hz: 100_000,
            tone_amplitude: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    /// Offset added to every level (dB)
    pub calibration_db: f32,
    /// Minimum spacing between spectrum frames (ms)
    pub update_interval_ms: u64,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            calibration_db: wrx_dsp::spectrum::DEFAULT_CALIBRATION_DB,
            update_interval_ms: 100,
        }
    }
}

impl SpectrumConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        if self.listen.port == 0 {
            return Err("[listen].port must be > 0".to_string());
        }
        if self.sessions.max_sessions == 0 {
            return Err("[sessions].max_sessions must be > 0".to_string());
        }

        match self.receiver.source.as_str() {
            "tone" | "mock" => {}
            other => {
                return Err(format!(
                    "[receiver].source '{}' is invalid (expected 'tone' or 'mock')",
                    other
                ))
            }
        }
        BandWindow::for_band(self.receiver.initial_band)
            .map_err(|e| format!("[receiver].initial_band: {}", e))?;
        if self.receiver.bandwidth_hz == 0 {
            return Err("[receiver].bandwidth_hz must be > 0".to_string());
        }
        if self.receiver.tone_offset_hz.unsigned_abs() > CENTER_OFFSET_HZ {
            return Err(format!(
                "[receiver].tone_offset_hz must be within ±{} Hz",
                CENTER_OFFSET_HZ
            ));
        }
        if !self.receiver.tone_amplitude.is_finite() || self.receiver.tone_amplitude < 0.0 {
            return Err("[receiver].tone_amplitude must be a non-negative number".to_string());
        }

        if self.spectrum.update_interval_ms == 0 {
            return Err("[spectrum].update_interval_ms must be > 0".to_string());
        }
        if !self.spectrum.calibration_db.is_finite() {
            return Err("[spectrum].calibration_db must be finite".to_string());
        }
        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        <Self as ConfigFile>::load_from_file(path)
    }

    /// Load configuration from the default search paths.
    /// Returns default config if no config file is found.
    pub fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        <Self as ConfigFile>::load_from_default_paths()
    }

    /// Generate an example configuration wrapped under the `[wrx-server]`
    /// section header, suitable for use in a combined `wrx-rs.toml` file.
    pub fn example_combined_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(rename = "wrx-server")]
            inner: ServerConfig,
        }
        let example = ServerConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            ..ServerConfig::default()
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

impl ConfigFile for ServerConfig {
    fn section_key() -> &'static str {
        "wrx-server"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen.port, 9001);
        assert_eq!(config.listen.listen, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.sessions.max_sessions, 20);
        assert_eq!(config.receiver.source, "tone");
        assert_eq!(config.receiver.initial_band, 20);
        assert_eq!(config.receiver.gain_reduction_db, 20);
        assert_eq!(config.receiver.bandwidth_hz, 600_000);
        assert_eq!(config.spectrum.calibration_db, -115.0);
        assert_eq!(config.spectrum.update_interval(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[sessions]
max_sessions = 4
"#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sessions.max_sessions, 4);
        assert_eq!(config.listen.port, 9001);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[wrx-server.general]
log_level = "debug"

[wrx-server.listen]
listen = "127.0.0.1"
port = 9100

[wrx-server.sessions]
max_sessions = 8

[wrx-server.receiver]
source = "mock"
initial_band = 40
gain_reduction_db = 30
bandwidth_hz = 1536000
tone_offset_hz = -12000
tone_amplitude = 0.5

[wrx-server.spectrum]
calibration_db = -100.0
update_interval_ms = 250
"#;
        let config = ServerConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.general.log_level.as_deref(), Some("debug"));
        assert_eq!(config.listen.listen, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.listen.port, 9100);
        assert_eq!(config.sessions.max_sessions, 8);
        assert_eq!(config.receiver.source, "mock");
        assert_eq!(config.receiver.initial_band, 40);
        assert_eq!(config.receiver.tone_offset_hz, -12_000);
        assert_eq!(config.spectrum.calibration_db, -100.0);
        assert_eq!(config.spectrum.update_interval_ms, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_combined_toml_parses() {
        let example = ServerConfig::example_combined_toml();
        let table: toml::Table = toml::from_str(&example).unwrap();
        let section = toml::to_string(table.get("wrx-server").unwrap()).unwrap();
        let config: ServerConfig = toml::from_str(&section).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = ServerConfig::default();
        config.general.log_level = Some("loud".to_string());
        assert!(config.validate().unwrap_err().contains("log_level"));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = ServerConfig::default();
        config.sessions.max_sessions = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.listen.port = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.spectrum.update_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_source_and_band() {
        let mut config = ServerConfig::default();
        config.receiver.source = "rtl".to_string();
        assert!(config.validate().unwrap_err().contains("[receiver].source"));

        let mut config = ServerConfig::default();
        config.receiver.initial_band = 99;
        assert!(config.validate().unwrap_err().contains("initial_band"));
    }

    #[test]
    fn test_validate_tone_offset_range() {
        let mut config = ServerConfig::default();
        config.receiver.tone_offset_hz = -240_000;
        assert!(config.validate().is_ok());
        config.receiver.tone_offset_hz = 240_001;
        assert!(config.validate().is_err());
    }
}
