//! Inactivity reaper: periodically stops streams that haven't been
//! touched by a player GET in a while.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::model::StreamStatus;
use crate::protocol_constants::{INACTIVITY_THRESHOLD_SECS, REAPER_TICK_SECS};
use crate::registry::StreamRegistry;
use crate::utils::now_millis;

/// Runs the reaper sweep loop until `cancel` fires.
///
/// Only `Started` streams are considered: a `Stopped` stream has nothing
/// to tear down, and a stream never PUT to is left alone until a GET
/// starts its packager.
pub async fn run(registry: Arc<StreamRegistry>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_secs(REAPER_TICK_SECS));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("reaper shutting down");
                return;
            }
            _ = ticker.tick() => sweep(&registry).await,
        }
    }
}

async fn sweep(registry: &StreamRegistry) {
    let now = now_millis() as i64;
    for stream in registry.iter() {
        if stream.status() != StreamStatus::Started {
            continue;
        }
        let idle_secs = (now - stream.last_access_millis()) / 1000;
        if idle_secs > INACTIVITY_THRESHOLD_SECS {
            tracing::info!(stream = %stream.id, idle_secs, "reaping inactive stream");
            stream.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QualitiesConfig, Quality, StreamConfig, StreamType};
    use std::sync::Arc;

    fn cfg(id: &str) -> StreamConfig {
        StreamConfig {
            stream: id.to_string(),
            name: id.to_string(),
            stream_type: StreamType::Gen,
            input: None,
            frame_rate: None,
            intra_interval: None,
            segment_duration: None,
            fragment_duration: None,
            width: None,
            bitrate: None,
            target_latency: None,
            ssrs: None,
            save_stats: None,
            qualities: Some(QualitiesConfig {
                video: vec![Quality {
                    target_width: "1920".into(),
                    target_bitrate: "2000".into(),
                }],
            }),
        }
    }

    #[tokio::test]
    async fn sweep_stops_only_stale_started_streams() {
        let registry = Arc::new(StreamRegistry::new(vec![cfg("fresh"), cfg("stale"), cfg("idle")]));

        let fresh = registry.get("fresh").unwrap();
        fresh.set_status(StreamStatus::Started);
        fresh.touch();

        let stale = registry.get("stale").unwrap();
        stale.set_status(StreamStatus::Started);
        stale.set_last_access_millis_for_test(now_millis() as i64 - 20_000);

        // "idle" stream was never started; must be left alone regardless
        // of its stale last-access value.

        sweep(&registry).await;

        assert_eq!(fresh.status(), StreamStatus::Started);
        assert_eq!(stale.status(), StreamStatus::Stopped);
        assert_eq!(registry.get("idle").unwrap().status(), StreamStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn run_exits_promptly_on_cancellation() {
        let registry = Arc::new(StreamRegistry::new(vec![]));
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        let handle = tokio::spawn(run(registry, cancel_clone));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reaper did not exit after cancellation")
            .unwrap();
    }
}
