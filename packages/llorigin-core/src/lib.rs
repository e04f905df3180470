//! llorigin-core - shared library for the llorigin low-latency origin
//! relay.
//!
//! This crate holds everything needed to serve a live DASH presentation
//! to players while a packager is still streaming it in: the incremental
//! segment cache, the manifest/init/chunk HTTP surface, the packager
//! supervisor, the inactivity reaper, and server-side representation
//! switching. It is built to be used by a standalone headless server
//! binary (`apps/server`), but doesn't assume one — task spawning goes
//! through the [`TaskSpawner`](runtime::TaskSpawner) trait so an embedder
//! can supply its own runtime.
//!
//! # Architecture
//!
//! - [`model`]: the data model — `Chunk`, `Segment`, `InitialSegment`,
//!   `Manifest`, `Stream`, `StreamConfig`.
//! - [`registry`]: the frozen stream registry plus the SSRS override map.
//! - [`manifest`]: the DASH MPD namespace-strip / representation-filter
//!   transform.
//! - [`packager`]: packager process supervision and command assembly.
//! - [`reaper`]: the inactivity sweep that stops idle streams.
//! - [`ssrs`]: object-name parsing and the representation-switching
//!   rewrite.
//! - [`api`]: the HTTP surface (`axum` router + handlers).
//! - [`context`]: network/base-URL plumbing handed to the packager.
//! - [`config`]: the on-disk configuration schema and loader.
//! - [`error`]: the crate-wide error type and its `IntoResponse` mapping.
//! - [`bootstrap`]: the composition root wiring all of the above into an
//!   [`AppState`](bootstrap::AppState).
//! - [`runtime`]: the task-spawning abstraction embedders can swap out.

#![warn(clippy::all)]

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod error;
pub mod manifest;
pub mod model;
pub mod packager;
pub mod protocol_constants;
pub mod reaper;
pub mod registry;
pub mod runtime;
pub mod ssrs;
pub mod utils;

pub use api::{start_server, AppState, ServerError};
pub use bootstrap::bootstrap;
pub use config::Config;
pub use context::{NetworkContext, NetworkError, UrlBuilder};
pub use error::{ErrorCode, RelayError, RelayResult};
pub use model::{
    Chunk, InitialSegment, Manifest, PackagerHandle, PackagerStatus, QualitiesConfig, Quality,
    Segment, Stream, StreamConfig, StreamStatus, StreamType,
};
pub use registry::StreamRegistry;
pub use runtime::{TaskSpawner, TokioSpawner};
pub use utils::now_millis;
