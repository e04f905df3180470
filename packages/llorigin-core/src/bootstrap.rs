//! Composition root: wires the stream registry, network context, and
//! inactivity reaper into a single [`AppState`] consumed by the HTTP layer.
//!
//! Construction order is leaves first: the registry has no dependents, so
//! it's built before the reaper task that reads it, which is spawned
//! before the `AppState` wrapping both is returned.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::context::NetworkContext;
use crate::error::{RelayError, RelayResult};
use crate::reaper;
use crate::registry::StreamRegistry;
use crate::runtime::TaskSpawner;

/// Shared application state passed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StreamRegistry>,
    pub network: NetworkContext,
    pub config: Arc<Config>,
    /// Cancels the reaper task on shutdown.
    pub cancel: CancellationToken,
}

/// Builds an `AppState` from a loaded `Config` and its streams, and spawns
/// the inactivity reaper in the background. Local-IP auto-detection and
/// CLI/config resolution happen in `apps/server` before this is called,
/// keeping this crate free of CLI parsing.
pub fn bootstrap(
    config: Config,
    streams: Vec<crate::model::StreamConfig>,
    network: NetworkContext,
    spawner: &dyn TaskSpawner,
) -> RelayResult<AppState> {
    if streams.is_empty() {
        tracing::warn!("bootstrapping with zero configured streams");
    }
    let registry = Arc::new(StreamRegistry::new(streams));
    let cancel = CancellationToken::new();

    let reaper_registry = Arc::clone(&registry);
    let reaper_cancel = cancel.clone();
    spawner.spawn(async move {
        reaper::run(reaper_registry, reaper_cancel).await;
    });

    Ok(AppState {
        registry,
        network,
        config: Arc::new(config),
        cancel,
    })
}

impl AppState {
    /// Signals the reaper task to stop. Does not wait for it to exit;
    /// callers that need that should await the spawned task's `JoinHandle`
    /// directly if they kept one.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Convenience for `apps/server`'s error reporting: wraps an I/O/parse
/// failure encountered before `AppState` exists.
pub fn startup_error(context: &str, err: impl std::fmt::Display) -> RelayError {
    RelayError::Configuration(format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::TokioSpawner;

    fn test_config() -> Config {
        Config {
            host: None,
            port: 0,
            ssl_key_file: None,
            ssl_cert_file: None,
            verbose: false,
            streams: "streams.json".into(),
            time_displacement: 0,
            wait_for_absent_segment: false,
        }
    }

    #[tokio::test]
    async fn bootstrap_spawns_reaper_and_builds_empty_registry() {
        let spawner = TokioSpawner::current();
        let state = bootstrap(test_config(), Vec::new(), NetworkContext::for_test(), &spawner).unwrap();
        assert!(state.registry.is_empty());
        state.shutdown();
    }
}
