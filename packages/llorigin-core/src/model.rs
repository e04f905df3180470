//! Data model: Chunk, Segment, InitialSegment, Manifest, Stream.
//!
//! One-shot readiness is `tokio::sync::Notify` paired with an `AtomicBool`
//! so a waiter that arrives after the signal already fired doesn't block
//! forever (`Notify::notified()` only wakes *future* calls to
//! `notify_waiters()`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::protocol_constants::{
    DEFAULT_BITRATE_KBPS, DEFAULT_FRAGMENT_DURATION, DEFAULT_FRAME_RATE, DEFAULT_INTRA_INTERVAL,
    DEFAULT_SAVE_STATS, DEFAULT_SEGMENT_DURATION, DEFAULT_SERVER_SIDE_REPRESENTATION_SWITCHING,
    DEFAULT_TARGET_LATENCY, DEFAULT_WIDTH, MANIFEST_SKIP_COUNT,
};

/// A one-shot readiness signal: fires exactly once, and a waiter that
/// checks after the fact still observes it as fired.
#[derive(Default)]
struct OnceSignal {
    fired: AtomicBool,
    notify: Notify,
}

impl OnceSignal {
    fn new() -> Self {
        Self::default()
    }

    fn fire(&self) {
        // Flip the flag before notifying so a racing waiter that checks
        // the flag right after missing the notify still sees it fired.
        self.fired.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    fn is_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Waits up to `timeout` for the signal to fire. Returns `true` if
    /// fired (now or already), `false` on timeout.
    async fn wait(&self, timeout: Duration) -> bool {
        if self.is_fired() {
            return true;
        }
        let notified = self.notify.notified();
        tokio::select! {
            _ = notified => true,
            _ = tokio::time::sleep(timeout) => self.is_fired(),
        }
    }
}

/// Smallest unit of bytes delivered by the packager in one body read.
pub struct Chunk {
    data: RwLock<Option<Bytes>>,
    signal: OnceSignal,
}

impl Chunk {
    /// Creates an empty placeholder chunk.
    pub fn placeholder() -> Arc<Self> {
        Arc::new(Self {
            data: RwLock::new(None),
            signal: OnceSignal::new(),
        })
    }

    /// Fills the placeholder with bytes and signals readiness.
    ///
    /// Called exactly once per chunk by the one producer task that owns
    /// the segment.
    pub fn fill(&self, data: Bytes) {
        *self.data.write() = Some(data);
        self.signal.fire();
    }

    /// Signals readiness without ever storing bytes (the trailing
    /// placeholder signaled empty on segment completion).
    pub fn fill_empty(&self) {
        self.signal.fire();
    }

    /// Waits up to `timeout` for this chunk to be ready.
    pub async fn wait_ready(&self, timeout: Duration) -> bool {
        self.signal.wait(timeout).await
    }

    /// Returns the chunk's bytes if already filled, `None` if still a
    /// placeholder or filled-empty.
    pub fn bytes(&self) -> Option<Bytes> {
        self.data.read().clone()
    }
}

/// A media segment: an ordered, growing sequence of chunks plus a
/// completion flag and concatenated buffer.
///
/// Invariant: while `completed == false`, `chunks` always ends with an
/// unfilled placeholder so a consumer can always await "the next chunk".
pub struct Segment {
    pub name: String,
    chunks: Mutex<Vec<Arc<Chunk>>>,
    completed: AtomicBool,
    completed_data: Mutex<BytesMut>,
    first_byte: OnceSignal,
}

impl Segment {
    /// Creates a new segment with a single trailing placeholder chunk.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            chunks: Mutex::new(vec![Chunk::placeholder()]),
            completed: AtomicBool::new(false),
            completed_data: Mutex::new(BytesMut::new()),
            first_byte: OnceSignal::new(),
        })
    }

    /// Waits up to `timeout` for the first byte to have arrived.
    pub async fn wait_first_byte(&self, timeout: Duration) -> bool {
        self.first_byte.wait(timeout).await
    }

    /// Fires the first-byte signal without requiring any bytes to have
    /// arrived yet. The producer calls this right after creating or
    /// looking up the segment, ahead of reading any body blobs, so a
    /// waiting GET unblocks even if the PUT turns out to carry zero blobs.
    pub fn mark_started(&self) {
        self.first_byte.fire();
    }

    /// Appends a new byte-blob: fills the trailing placeholder, appends a
    /// fresh placeholder after it, and signals first-byte (idempotent).
    pub fn push_blob(&self, data: Bytes) {
        let trailing = {
            let mut chunks = self.chunks.lock();
            let trailing = chunks.last().expect("segment always has a trailing chunk").clone();
            chunks.push(Chunk::placeholder());
            trailing
        };
        self.completed_data.lock().extend_from_slice(&data);
        trailing.fill(data);
        self.first_byte.fire();
    }

    /// Marks the segment complete: signals the final trailing placeholder
    /// (releasing any reader awaiting "the next chunk") and freezes
    /// `completed_data`.
    pub fn finish(&self) {
        let trailing = self
            .chunks
            .lock()
            .last()
            .expect("segment always has a trailing chunk")
            .clone();
        trailing.fill_empty();
        self.completed.store(true, Ordering::SeqCst);
    }

    /// Returns whether the segment has been finalized.
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns the concatenated bytes of a completed segment.
    pub fn completed_data(&self) -> Bytes {
        self.completed_data.lock().clone().freeze()
    }

    /// Returns the chunk at index `i`, if it exists yet.
    pub fn chunk_at(&self, i: usize) -> Option<Arc<Chunk>> {
        self.chunks.lock().get(i).cloned()
    }

    /// Returns the current number of chunks (filled + trailing placeholder).
    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().len()
    }
}

/// One-time per-quality header file required before chunks can be decoded.
pub struct InitialSegment {
    data: RwLock<Option<Bytes>>,
    signal: OnceSignal,
}

impl InitialSegment {
    /// Creates a fresh, unsignaled init segment.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            data: RwLock::new(None),
            signal: OnceSignal::new(),
        })
    }

    /// Stores the init segment bytes and signals readiness.
    pub fn set(&self, data: Bytes) {
        *self.data.write() = Some(data);
        self.signal.fire();
    }

    /// Waits up to `timeout` for readiness, returning the bytes if ready.
    pub async fn wait_get(&self, timeout: Duration) -> Option<Bytes> {
        if self.signal.wait(timeout).await {
            self.data.read().clone()
        } else {
            None
        }
    }
}

/// The MPEG-DASH MPD describing the live presentation, plus its
/// SSRS-filtered variant.
pub struct Manifest {
    skip_count: AtomicU32,
    data: RwLock<Option<Bytes>>,
    ssrs_data: RwLock<Option<Bytes>>,
    signal: OnceSignal,
}

impl Manifest {
    /// Creates a fresh manifest with the skip counter reset to zero.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            skip_count: AtomicU32::new(0),
            data: RwLock::new(None),
            ssrs_data: RwLock::new(None),
            signal: OnceSignal::new(),
        })
    }

    /// Records a manifest PUT. Returns `true` if the payload was stored
    /// (skip counter exhausted), `false` if discarded as a warmup skip.
    ///
    /// `transform` produces the SSRS-filtered variant from the raw bytes;
    /// injected so this module doesn't depend on `manifest::transform`
    /// directly (kept decoupled for unit testing).
    pub fn put<E>(
        &self,
        raw: Bytes,
        transform: impl FnOnce(&[u8]) -> Result<Bytes, E>,
    ) -> Result<bool, E> {
        if self.skip_count.load(Ordering::SeqCst) < MANIFEST_SKIP_COUNT {
            self.skip_count.fetch_add(1, Ordering::SeqCst);
            return Ok(false);
        }
        let ssrs = transform(&raw)?;
        *self.data.write() = Some(raw);
        *self.ssrs_data.write() = Some(ssrs);
        self.signal.fire();
        Ok(true)
    }

    /// Waits up to `timeout` for manifest-ready, returning `(raw, ssrs)`.
    pub async fn wait_get(&self, timeout: Duration) -> Option<(Bytes, Bytes)> {
        if self.signal.wait(timeout).await {
            let raw = self.data.read().clone()?;
            let ssrs = self.ssrs_data.read().clone()?;
            Some((raw, ssrs))
        } else {
            None
        }
    }
}

/// A single quality rung: target resolution and bitrate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quality {
    #[serde(rename = "targetWidth")]
    pub target_width: String,
    #[serde(rename = "targetBitrate")]
    pub target_bitrate: String,
}

/// Packager input type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamType {
    /// Synthetic test-source generator pipeline.
    Gen,
    /// RTSP camera transcoder pipeline.
    Rtsp,
}

/// Raw per-stream configuration as loaded from the streams file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub stream: String,
    pub name: String,
    #[serde(rename = "type")]
    pub stream_type: StreamType,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(rename = "targetFps", default)]
    pub frame_rate: Option<String>,
    #[serde(rename = "intraInterval", default)]
    pub intra_interval: Option<String>,
    #[serde(rename = "segmentDuration", default)]
    pub segment_duration: Option<String>,
    #[serde(rename = "fragmentDuration", default)]
    pub fragment_duration: Option<String>,
    #[serde(rename = "targetWidth", default)]
    pub width: Option<String>,
    #[serde(rename = "targetBitrate", default)]
    pub bitrate: Option<String>,
    #[serde(rename = "targetLatency", default)]
    pub target_latency: Option<String>,
    #[serde(rename = "serverSideRepresentationSwitching", default)]
    pub ssrs: Option<bool>,
    #[serde(rename = "saveStats", default)]
    pub save_stats: Option<bool>,
    #[serde(default)]
    pub qualities: Option<QualitiesConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QualitiesConfig {
    #[serde(default)]
    pub video: Vec<Quality>,
}

impl StreamConfig {
    pub fn frame_rate(&self) -> &str {
        self.frame_rate.as_deref().unwrap_or(DEFAULT_FRAME_RATE)
    }
    pub fn intra_interval(&self) -> &str {
        self.intra_interval
            .as_deref()
            .unwrap_or(DEFAULT_INTRA_INTERVAL)
    }
    pub fn segment_duration(&self) -> &str {
        self.segment_duration
            .as_deref()
            .unwrap_or(DEFAULT_SEGMENT_DURATION)
    }
    pub fn fragment_duration(&self) -> &str {
        self.fragment_duration
            .as_deref()
            .unwrap_or(DEFAULT_FRAGMENT_DURATION)
    }
    pub fn width(&self) -> &str {
        self.width.as_deref().unwrap_or(DEFAULT_WIDTH)
    }
    pub fn bitrate(&self) -> &str {
        self.bitrate.as_deref().unwrap_or(DEFAULT_BITRATE_KBPS)
    }
    pub fn target_latency(&self) -> &str {
        self.target_latency
            .as_deref()
            .unwrap_or(DEFAULT_TARGET_LATENCY)
    }
    pub fn ssrs_enabled(&self) -> bool {
        self.ssrs
            .unwrap_or(DEFAULT_SERVER_SIDE_REPRESENTATION_SWITCHING)
    }
    pub fn save_stats(&self) -> bool {
        self.save_stats.unwrap_or(DEFAULT_SAVE_STATS)
    }
    pub fn qualities(&self) -> &[Quality] {
        self.qualities
            .as_ref()
            .map(|q| q.video.as_slice())
            .unwrap_or(&[])
    }
    pub fn max_adaptation_set(&self) -> usize {
        self.qualities().len().saturating_sub(1)
    }
}

/// Packager process lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PackagerStatus {
    Stopped = 0,
    Starting = 1,
    Started = 2,
}

impl From<u8> for PackagerStatus {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Starting,
            2 => Self::Started,
            _ => Self::Stopped,
        }
    }
}

/// Stream lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StreamStatus {
    Stopped = 0,
    Started = 1,
}

impl From<u8> for StreamStatus {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Started,
            _ => Self::Stopped,
        }
    }
}

/// Handle to a running packager child process, plus its lifecycle state.
#[derive(Default)]
pub struct PackagerHandle {
    pub child: Option<tokio::process::Child>,
    status: AtomicU8,
}

impl PackagerHandle {
    pub fn status(&self) -> PackagerStatus {
        self.status.load(Ordering::SeqCst).into()
    }

    pub fn set_status(&self, status: PackagerStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    /// Kills the child process, if any, and resets to the default (empty,
    /// stopped) state.
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
        }
        self.status = AtomicU8::new(PackagerStatus::Stopped as u8);
    }
}

/// A live stream: registry entry owning everything needed to serve one
/// packager/players session.
pub struct Stream {
    pub id: String,
    pub config: StreamConfig,
    manifest: RwLock<Arc<Manifest>>,
    init_segments: RwLock<HashMap<usize, Arc<InitialSegment>>>,
    segments: Mutex<HashMap<String, Arc<Segment>>>,
    pub packager: tokio::sync::Mutex<PackagerHandle>,
    status: AtomicU8,
    last_access_millis: AtomicI64,
    current_segment: AtomicU64,
    pub ssrs_override: RwLock<Option<usize>>,
}

impl Stream {
    /// Builds a stream record from its configuration, with fresh empty
    /// manifest/init-map/segment-map and last-access set far in the past
    /// (mirrors the original's "now minus one hour" initial value so the
    /// reaper never mistakes a never-touched stream for recently active).
    pub fn new(config: StreamConfig) -> Arc<Self> {
        let qualities = config.qualities().len();
        let mut init_segments = HashMap::with_capacity(qualities);
        for idx in 0..qualities {
            init_segments.insert(idx, InitialSegment::new());
        }
        Arc::new(Self {
            id: config.stream.clone(),
            config,
            manifest: RwLock::new(Manifest::new()),
            init_segments: RwLock::new(init_segments),
            segments: Mutex::new(HashMap::new()),
            packager: tokio::sync::Mutex::new(PackagerHandle::default()),
            status: AtomicU8::new(StreamStatus::Stopped as u8),
            last_access_millis: AtomicI64::new(crate::utils::now_millis() as i64 - 3_600_000),
            current_segment: AtomicU64::new(0),
            ssrs_override: RwLock::new(None),
        })
    }

    pub fn status(&self) -> StreamStatus {
        self.status.load(Ordering::SeqCst).into()
    }

    pub fn set_status(&self, status: StreamStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    pub fn manifest(&self) -> Arc<Manifest> {
        self.manifest.read().clone()
    }

    pub fn reset_manifest(&self) {
        *self.manifest.write() = Manifest::new();
    }

    pub fn init_segment(&self, idx: usize) -> Option<Arc<InitialSegment>> {
        self.init_segments.read().get(&idx).cloned()
    }

    pub fn reset_init_segments(&self) {
        let qualities = self.config.qualities().len();
        let mut map = HashMap::with_capacity(qualities);
        for idx in 0..qualities {
            map.insert(idx, InitialSegment::new());
        }
        *self.init_segments.write() = map;
    }

    /// Returns the existing segment by name, or inserts and returns a
    /// fresh one. Mutation happens entirely under the segment-map mutex.
    pub fn get_or_create_segment(&self, name: &str) -> Arc<Segment> {
        let mut segments = self.segments.lock();
        segments
            .entry(name.to_string())
            .or_insert_with(|| Segment::new(name))
            .clone()
    }

    /// Looks up a segment without creating one.
    pub fn get_segment(&self, name: &str) -> Option<Arc<Segment>> {
        self.segments.lock().get(name).cloned()
    }

    pub fn remove_segment(&self, name: &str) -> Option<Arc<Segment>> {
        self.segments.lock().remove(name)
    }

    pub fn clear_segments(&self) {
        self.segments.lock().clear();
    }

    pub fn last_access_millis(&self) -> i64 {
        self.last_access_millis.load(Ordering::SeqCst)
    }

    pub fn touch(&self) {
        self.last_access_millis
            .store(crate::utils::now_millis() as i64, Ordering::SeqCst);
    }

    /// Backdates the last-access timestamp for reaper tests, since
    /// `now_millis()` reads the real clock and isn't affected by Tokio's
    /// paused-time test utilities.
    #[cfg(test)]
    pub fn set_last_access_millis_for_test(&self, millis: i64) {
        self.last_access_millis.store(millis, Ordering::SeqCst);
    }

    /// Records the highest segment number seen on an incoming PUT.
    /// Monotonically non-decreasing during a run.
    pub fn observe_segment_number(&self, n: u64) {
        self.current_segment.fetch_max(n, Ordering::SeqCst);
    }

    pub fn current_segment(&self) -> u64 {
        self.current_segment.load(Ordering::SeqCst)
    }

    /// Tears down the stream: kills the packager, resets manifest and
    /// init segments, clears the segment map, and marks stopped. Performed
    /// atomically from the outside perspective (caller holds no other lock
    /// while this runs other than the packager mutex it acquires).
    pub async fn stop(&self) {
        self.packager.lock().await.stop().await;
        self.reset_manifest();
        self.reset_init_segments();
        self.clear_segments();
        self.set_status(StreamStatus::Stopped);
    }
}
