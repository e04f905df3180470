//! llorigin-server - standalone headless binary for the low-latency DASH
//! relay origin.
//!
//! Loads a JSON config file, validates the environment (config file
//! present and non-empty, `ffprobe` reachable on `PATH` for the packager
//! it will spawn), wires up logging, then starts the HTTP server and
//! waits for a shutdown signal.

mod config;

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use llorigin_core::context::NetworkContext;
use llorigin_core::runtime::TokioSpawner;
use llorigin_core::{api, bootstrap, Config as CoreConfig};
use tokio::signal;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ServerConfig;

/// llorigin-server - HTTP origin relay for segmented live video.
#[derive(Parser, Debug)]
#[command(name = "llorigin-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (JSON).
    #[arg(short, long, value_name = "FILE", env = "LLORIGIN_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    check_config_file(&args.config)?;
    check_ffprobe_on_path()?;

    let server_config = ServerConfig::load(&args.config).context("failed to load configuration")?;
    init_logging(server_config.log_level, server_config.json_logs);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        streams = server_config.streams.len(),
        tls = server_config.core.tls_enabled(),
        "llorigin-server starting"
    );

    let network = resolve_network(&server_config.core)?;
    let spawner = TokioSpawner::current();
    let state = bootstrap::bootstrap(
        server_config.core,
        server_config.streams,
        network,
        &spawner,
    )
    .context("failed to bootstrap services")?;

    let server_state = state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = api::start_server(server_state).await {
            tracing::error!(error = %e, "server error");
        }
    });

    shutdown_signal().await;
    tracing::info!("shutdown signal received, cleaning up");

    state.shutdown();
    server_handle.abort();
    Ok(())
}

/// Fails fast if `path` is missing or empty.
fn check_config_file(path: &PathBuf) -> Result<()> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("config file not found: {}", path.display()))?;
    if metadata.len() == 0 {
        bail!("config file is empty: {}", path.display());
    }
    Ok(())
}

/// Fails fast if the packager probe tool isn't reachable on `PATH`: the
/// packager supervisor spawns an ffmpeg pipeline whose correctness this
/// process can't verify, but a missing `ffprobe` is a reliable early
/// signal that the toolchain isn't installed at all.
fn check_ffprobe_on_path() -> Result<()> {
    let probe = if cfg!(windows) { "ffprobe.exe" } else { "ffprobe" };
    let found = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(probe).is_file()))
        .unwrap_or(false);
    if !found {
        bail!("{probe} not found on PATH; install ffmpeg before starting llorigin-server");
    }
    Ok(())
}

/// Resolves the network context the packager supervisor uses to build
/// its own callback URLs: an explicit `host` in the config wins, else the
/// server auto-detects its local IP.
fn resolve_network(core: &CoreConfig) -> Result<NetworkContext> {
    match &core.host {
        Some(host) => {
            let ip: IpAddr = host
                .parse()
                .with_context(|| format!("invalid \"host\" address in config: {host}"))?;
            Ok(NetworkContext::explicit(core.port, ip))
        }
        None => NetworkContext::auto_detect(core.port).context(
            "failed to auto-detect local IP address; set \"host\" in the config file to override",
        ),
    }
}

/// Initializes `tracing-subscriber` as the sink for both `tracing` events
/// and bridged `log` events, honoring `LOG_LEVEL`/`RUST_LOG` and
/// `JSON_LOGS`.
fn init_logging(level: log::LevelFilter, json: bool) {
    let _ = tracing_log::LogTracer::init();
    let filter =
        EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let subscriber = fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
