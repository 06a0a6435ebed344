//! EO Client Configuration Management
//!
//! Loads the client configuration from `config/settings.ini`.
//!
//! # File Format
//!
//! ```text
//! [CONNECTION]
//! Host=game.endless-online.com
//! Port=8078
//!
//! [VERSION]
//! Major=0
//! Minor=0
//! Client=28
//!
//! [SETTINGS]
//! DataDir=data
//! LogLevel=info
//! ConnectTimeout=10
//! HDID=111111111
//! ```
//!
//! Section and key names are case-insensitive. Lines starting with `#` or
//! `;` are comments. Values that fail to parse keep their default and log a
//! warning.

use eoclient_core::{ClientVersion, EoError, Result};
use eoclient_network::NetworkConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/settings.ini";

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    // ========== [CONNECTION] ==========
    /// Server host (from "Host", default: 127.0.0.1)
    pub host: String,
    /// Server port (from "Port", default: 8078)
    pub port: u16,

    // ========== [VERSION] ==========
    /// Version sent in the init request (from "Major", "Minor", "Client")
    pub version: ClientVersion,

    // ========== [SETTINGS] ==========
    /// Directory holding `pub/` and `maps/` (from "DataDir")
    pub data_dir: PathBuf,
    /// Default tracing filter (from "LogLevel"); `RUST_LOG` overrides it
    pub log_level: String,
    /// Connect and handshake timeout (from "ConnectTimeout", in seconds)
    pub connect_timeout: Duration,
    /// Hardware id (from "HDID")
    pub hdid: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8078,
            version: ClientVersion::default(),
            data_dir: PathBuf::from("data"),
            log_level: "info".into(),
            connect_timeout: Duration::from_secs(10),
            hdid: "111111111".into(),
        }
    }
}

/// Sections of the settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Connection,
    Version,
    Settings,
    Unknown,
}

impl ClientConfig {
    /// Load configuration from an INI file
    ///
    /// A missing file is not an error: the defaults are returned and a
    /// warning is logged.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Ok(Self::parse(&content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("{} not found, using default configuration", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(EoError::Config(format!("Failed to read {}: {}", path.display(), e))),
        }
    }

    /// Load configuration from `config/settings.ini`
    pub fn load_default() -> Result<Self> {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Parse settings file content
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        let mut section = Section::None;

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = match name.trim().to_ascii_uppercase().as_str() {
                    "CONNECTION" => Section::Connection,
                    "VERSION" => Section::Version,
                    "SETTINGS" => Section::Settings,
                    other => {
                        tracing::debug!("Ignoring unknown config section [{}]", other);
                        Section::Unknown
                    }
                };
                continue;
            }

            // Parse key=value
            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim().to_ascii_lowercase();
                let value = line[eq_pos + 1..].trim();

                config.parse_option(section, &key, value);
            }
        }

        config
    }

    fn parse_option(&mut self, section: Section, key: &str, value: &str) {
        match (section, key) {
            (Section::Connection, "host") => self.host = value.into(),
            (Section::Connection, "port") => self.port = parse_or(key, value, self.port),
            (Section::Version, "major") => self.version.major = parse_or(key, value, self.version.major),
            (Section::Version, "minor") => self.version.minor = parse_or(key, value, self.version.minor),
            (Section::Version, "client") => self.version.build = parse_or(key, value, self.version.build),
            (Section::Settings, "datadir") => self.data_dir = PathBuf::from(value),
            (Section::Settings, "loglevel") => self.log_level = value.into(),
            (Section::Settings, "connecttimeout") => {
                let secs = parse_or(key, value, self.connect_timeout.as_secs());
                self.connect_timeout = Duration::from_secs(secs);
            }
            (Section::Settings, "hdid") => self.hdid = value.into(),
            _ => {
                tracing::debug!("Unknown config option: {} = {}", key, value);
            }
        }
    }

    /// Connection options for the network layer
    pub fn to_network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            connect_timeout: self.connect_timeout,
            version: self.version,
            hdid: self.hdid.clone(),
            ..Default::default()
        }
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Client configuration:");
        tracing::info!("  [CONNECTION]");
        tracing::info!("    Server: {}:{}", self.host, self.port);
        tracing::info!("  [VERSION]");
        tracing::info!("    Client version: {}", self.version);
        tracing::info!("  [SETTINGS]");
        tracing::info!("    Data dir: {}", self.data_dir.display());
        tracing::info!("    Log level: {}", self.log_level);
        tracing::info!("    Connect timeout: {:?}", self.connect_timeout);
    }
}

fn parse_or<T: std::str::FromStr + Copy>(key: &str, value: &str, default: T) -> T {
    value.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid value for {}: {:?}, keeping default", key, value);
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.port, 8078);
        assert_eq!(config.version, ClientVersion::new(0, 0, 28));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_parse_full_config() {
        let config_text = r#"
# client settings
[CONNECTION]
Host = eo.example.org
Port = 8079

[Version]
Major=1
Minor=2
Client=30

[SETTINGS]
DataDir=/tmp/eo
LogLevel=debug
ConnectTimeout=3
HDID=123456789
"#;
        let config = ClientConfig::parse(config_text);
        assert_eq!(config.host, "eo.example.org");
        assert_eq!(config.port, 8079);
        assert_eq!(config.version, ClientVersion::new(1, 2, 30));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/eo"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.hdid, "123456789");
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ClientConfig::parse("[CONNECTION]\nPort=lots\n[VERSION]\nClient=999\n");
        assert_eq!(config.port, 8078);
        assert_eq!(config.version.build, 28);
    }

    #[test]
    fn test_keys_outside_their_section_ignored() {
        let config = ClientConfig::parse("Port=1\n[SETTINGS]\nHost=elsewhere\n[OTHER]\nPort=2\n");
        assert_eq!(config.port, 8078);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig::load_from_file(dir.path().join("settings.ini")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.ini");
        std::fs::write(&path, "[CONNECTION]\nHost=10.0.0.2\n").unwrap();

        let config = ClientConfig::load_from_file(&path).unwrap();
        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.port, 8078);
    }

    #[test]
    fn test_to_network_config() {
        let config = ClientConfig::parse("[CONNECTION]\nHost=h\nPort=9\n[SETTINGS]\nConnectTimeout=4\n");
        let network = config.to_network_config();
        assert_eq!(network.address(), "h:9");
        assert_eq!(network.connect_timeout, Duration::from_secs(4));
        assert_eq!(network.version, config.version);
        assert!(network.validate().is_ok());
    }
}
