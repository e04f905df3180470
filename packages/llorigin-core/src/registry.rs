//! Global stream registry: frozen at startup, read concurrently without
//! locking; a parallel `DashMap` carries the runtime-mutable SSRS
//! manual-override map.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::model::{Stream, StreamConfig};

/// Mapping from stream id to `Stream` record, frozen after construction.
pub struct StreamRegistry {
    streams: HashMap<String, Arc<Stream>>,
    /// Manual SSRS override per stream, settable via `/ssss/{stream}/{id}`.
    ssrs_overrides: DashMap<String, usize>,
}

impl StreamRegistry {
    /// Builds the registry from the loaded streams configuration. No
    /// dynamic stream creation is supported after this point.
    pub fn new(configs: Vec<StreamConfig>) -> Self {
        let streams = configs
            .into_iter()
            .map(|c| (c.stream.clone(), Stream::new(c)))
            .collect();
        Self {
            streams,
            ssrs_overrides: DashMap::new(),
        }
    }

    /// Looks up a stream by id.
    pub fn get(&self, id: &str) -> Option<Arc<Stream>> {
        self.streams.get(id).cloned()
    }

    /// Iterates over all registered streams.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Stream>> {
        self.streams.values()
    }

    /// Number of registered streams.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Sets a manual SSRS override for `stream_id`, provided `adaptation_set`
    /// is within `[0, max_adaptation_set - 1]`. Returns `false` if the
    /// stream is unknown or the index is out of range.
    pub fn set_ssrs_override(&self, stream_id: &str, adaptation_set: usize) -> bool {
        let Some(stream) = self.get(stream_id) else {
            return false;
        };
        let max = stream.config.max_adaptation_set();
        if max == 0 || adaptation_set >= max {
            return false;
        }
        self.ssrs_overrides.insert(stream_id.to_string(), adaptation_set);
        true
    }

    /// Returns the manual SSRS override for `stream_id`, if any.
    pub fn ssrs_override(&self, stream_id: &str) -> Option<usize> {
        self.ssrs_overrides.get(stream_id).map(|v| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QualitiesConfig, Quality, StreamType};

    fn cfg(id: &str, n_qualities: usize) -> StreamConfig {
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
            ssrs: Some(true),
            save_stats: None,
            qualities: Some(QualitiesConfig {
                video: (0..n_qualities)
                    .map(|_| Quality {
                        target_width: "1920".into(),
                        target_bitrate: "2000".into(),
                    })
                    .collect(),
            }),
        }
    }

    #[test]
    fn unknown_stream_is_none() {
        let reg = StreamRegistry::new(vec![cfg("s1", 3)]);
        assert!(reg.get("nope").is_none());
        assert!(reg.get("s1").is_some());
    }

    #[test]
    fn ssrs_override_out_of_range_rejected() {
        let reg = StreamRegistry::new(vec![cfg("s1", 3)]);
        // max_adaptation_set = 2, valid range is 0..=1
        assert!(!reg.set_ssrs_override("s1", 2));
        assert!(reg.set_ssrs_override("s1", 1));
        assert_eq!(reg.ssrs_override("s1"), Some(1));
    }

    #[test]
    fn ssrs_override_unknown_stream_rejected() {
        let reg = StreamRegistry::new(vec![cfg("s1", 3)]);
        assert!(!reg.set_ssrs_override("nope", 0));
    }
}
