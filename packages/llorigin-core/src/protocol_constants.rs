//! Fixed timing constants that should NOT be changed.
//!
//! These values come from the inherited packager/player contract (warmup
//! manifest count, hardware init delay, per-wait timeouts) and changing them
//! would desynchronize this server from both.

// ─────────────────────────────────────────────────────────────────────────────
// Manifest warmup
// ─────────────────────────────────────────────────────────────────────────────

/// Number of manifest PUTs to silently discard before exposing one.
///
/// Absorbs warmup manifests the packager emits before steady state.
pub const MANIFEST_SKIP_COUNT: u32 = 5;

/// How long a manifest GET waits for manifest-ready before returning 404.
pub const MANIFEST_WAIT_SECS: u64 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Initialization segments
// ─────────────────────────────────────────────────────────────────────────────

/// Delay before reading an init segment's PUT body.
///
/// Some camera encoders emit an empty init segment first; this delay gives
/// the real one a chance to land instead.
pub const INIT_PUT_DELAY_MS: u64 = 200;

/// How long an init segment GET waits for its ready signal before 404.
pub const INIT_WAIT_SECS: u64 = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Chunk / segment streaming
// ─────────────────────────────────────────────────────────────────────────────

/// Per-chunk wait timeout while streaming a growing segment.
///
/// On timeout the response ends cleanly rather than erroring; this is the
/// normal way a streamed GET finishes once the producer goes quiet.
pub const CHUNK_WAIT_SECS: u64 = 1;

/// Wait timeout for a segment's first byte when the segment doesn't exist yet.
pub const FIRST_BYTE_WAIT_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Inactivity reaper
// ─────────────────────────────────────────────────────────────────────────────

/// Interval between reaper sweeps.
pub const REAPER_TICK_SECS: u64 = 2;

/// Idle threshold after which a started stream is stopped.
///
/// 15s tolerates brief client disconnects without tearing down the packager.
pub const INACTIVITY_THRESHOLD_SECS: i64 = 15;

// ─────────────────────────────────────────────────────────────────────────────
// Defaults for stream configuration fields
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_FRAME_RATE: &str = "30";
pub const DEFAULT_INTRA_INTERVAL: &str = "30";
pub const DEFAULT_SEGMENT_DURATION: &str = "1";
pub const DEFAULT_FRAGMENT_DURATION: &str = "0.1";
pub const DEFAULT_WIDTH: &str = "1920";
pub const DEFAULT_BITRATE_KBPS: &str = "2000";
pub const DEFAULT_TARGET_LATENCY: &str = "0.5";
pub const DEFAULT_SERVER_SIDE_REPRESENTATION_SWITCHING: bool = false;
pub const DEFAULT_SAVE_STATS: bool = false;

/// Default time subtracted from `/isotime`'s UTC-now value, in seconds.
pub const DEFAULT_TIME_DISPLACEMENT_SECS: i64 = 0;

/// Application name used in the `/version` banner.
pub const APP_NAME: &str = "llorigin";

/// Version banner string returned by `/version` and `/`.
pub const VERSION: &str = concat!("llorigin ", env!("CARGO_PKG_VERSION"));
