//! Binary-level configuration: loads the core `Config`/streams-file pair
//! and derives the logging setup from the environment.
//!
//! The config file itself only carries the fields the relay core needs
//! (host, port, TLS paths, per-stream packager settings, ...); the
//! logging knobs live in the environment (`LOG_LEVEL`, `JSON_LOGS`)
//! rather than the config file, so they can be flipped without touching
//! a deployed config.

use std::path::Path;

use anyhow::{Context, Result};
use llorigin_core::config::Config;
use llorigin_core::model::StreamConfig;

/// Resolved configuration for the standalone binary: the core `Config`
/// and its streams, plus the environment-driven logging settings.
pub struct ServerConfig {
    pub core: Config,
    pub streams: Vec<StreamConfig>,
    pub log_level: log::LevelFilter,
    pub json_logs: bool,
}

impl ServerConfig {
    /// Loads the config file at `path` (and the streams file it points
    /// to), then layers the environment-driven logging configuration on
    /// top.
    pub fn load(path: &Path) -> Result<Self> {
        let (core, streams) = Config::load(path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("loading configuration from {}", path.display()))?;

        let log_level = resolve_log_level(std::env::var("LOG_LEVEL").ok().as_deref(), core.verbose)?;
        let json_logs = matches!(std::env::var("JSON_LOGS").as_deref(), Ok("1"));

        Ok(Self {
            core,
            streams,
            log_level,
            json_logs,
        })
    }
}

/// Resolves the effective log level: an explicit `LOG_LEVEL` wins, else
/// `verbose` (from the config file) selects DEBUG over the default INFO.
fn resolve_log_level(env_value: Option<&str>, verbose: bool) -> Result<log::LevelFilter> {
    match env_value {
        Some(v) => v
            .parse()
            .with_context(|| format!("invalid LOG_LEVEL value: {v}")),
        None if verbose => Ok(log::LevelFilter::Debug),
        None => Ok(log::LevelFilter::Info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_log_level_overrides_verbose() {
        let level = resolve_log_level(Some("warn"), true).unwrap();
        assert_eq!(level, log::LevelFilter::Warn);
    }

    #[test]
    fn verbose_defaults_to_debug_without_env_override() {
        let level = resolve_log_level(None, true).unwrap();
        assert_eq!(level, log::LevelFilter::Debug);
    }

    #[test]
    fn defaults_to_info_when_not_verbose() {
        let level = resolve_log_level(None, false).unwrap();
        assert_eq!(level, log::LevelFilter::Info);
    }

    #[test]
    fn invalid_log_level_is_an_error() {
        assert!(resolve_log_level(Some("not-a-level"), false).is_err());
    }

    #[test]
    fn load_reads_core_config_and_streams() {
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

        let server_config = ServerConfig::load(&config_path).unwrap();
        assert_eq!(server_config.core.port, 8080);
        assert_eq!(server_config.streams.len(), 1);
    }
}
