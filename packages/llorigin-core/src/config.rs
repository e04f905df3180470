//! Top-level server configuration and the streams-file loader.
//!
//! Configuration is split across two JSON files: the main config (host,
//! port, TLS paths, ...) and a secondary streams file it points to
//! (per-stream packager settings). Both are loaded once at startup; any
//! failure here is fatal.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, RelayResult};
use crate::model::StreamConfig;

/// Top-level configuration, loaded once from a JSON file at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub host: Option<String>,
    pub port: u16,
    #[serde(rename = "sslKeyFile", default)]
    pub ssl_key_file: Option<String>,
    #[serde(rename = "sslCertFile", default)]
    pub ssl_cert_file: Option<String>,
    #[serde(default)]
    pub verbose: bool,
    /// Path to the secondary streams-definition JSON file.
    pub streams: String,
    #[serde(rename = "timeDisplacement", default)]
    pub time_displacement: i64,
    #[serde(rename = "waitForAbsentSegment", default = "default_true")]
    pub wait_for_absent_segment: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// `true` if both TLS files are configured — HTTPS.
    pub fn tls_enabled(&self) -> bool {
        self.ssl_key_file.is_some() && self.ssl_cert_file.is_some()
    }

    /// Loads `Config` from `path`, then loads and parses the streams file
    /// it references. Any failure here is fatal at startup.
    pub fn load(path: &Path) -> RelayResult<(Self, Vec<StreamConfig>)> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Configuration(format!("reading {}: {e}", path.display())))?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| RelayError::Configuration(format!("parsing {}: {e}", path.display())))?;

        let streams_raw = std::fs::read_to_string(&config.streams).map_err(|e| {
            RelayError::Configuration(format!("reading streams file {}: {e}", config.streams))
        })?;
        let streams: Vec<StreamConfig> = serde_json::from_str(&streams_raw).map_err(|e| {
            RelayError::Configuration(format!("parsing streams file {}: {e}", config.streams))
        })?;

        Ok((config, streams))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_minimal_config_and_streams() {
        let dir = tempfile::tempdir().unwrap();
        let streams_path = dir.path().join("streams.json");
        std::fs::write(
            &streams_path,
            r#"[{"stream":"s1","name":"s1","type":"GEN"}]"#,
        )
        .unwrap();

        let config_path = dir.path().join("config.json");
        let mut f = std::fs::File::create(&config_path).unwrap();
        write!(
            f,
            r#"{{"port":8080,"streams":"{}"}}"#,
            streams_path.display()
        )
        .unwrap();

        let (config, streams) = Config::load(&config_path).unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.tls_enabled());
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].stream, "s1");
    }

    #[test]
    fn wait_for_absent_segment_defaults_true_when_omitted() {
        let config: Config = serde_json::from_str(r#"{"port":8080,"streams":"streams.json"}"#).unwrap();
        assert!(config.wait_for_absent_segment);
    }

    #[test]
    fn wait_for_absent_segment_honors_explicit_false() {
        let config: Config = serde_json::from_str(
            r#"{"port":8080,"streams":"streams.json","waitForAbsentSegment":false}"#,
        )
        .unwrap();
        assert!(!config.wait_for_absent_segment);
    }

    #[test]
    fn tls_requires_both_files() {
        let config = Config {
            host: None,
            port: 8080,
            ssl_key_file: Some("key.pem".into()),
            ssl_cert_file: None,
            verbose: false,
            streams: "streams.json".into(),
            time_displacement: 0,
            wait_for_absent_segment: false,
        };
        assert!(!config.tls_enabled());
    }

    #[test]
    fn missing_config_file_is_configuration_error() {
        let err = Config::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, RelayError::Configuration(_)));
    }
}
