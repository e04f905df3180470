//! Packager supervisor: mutex-guarded process launch plus ffmpeg command
//! assembly.

use std::ffi::OsStr;
use std::sync::{Arc, OnceLock};

use tokio::process::Command;
use tokio::sync::Mutex as AsyncMutex;

use crate::model::{PackagerStatus, Stream, StreamType};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Applies the Windows `CREATE_NO_WINDOW` flag to child processes so a
/// console window doesn't flash up when spawning the packager. No-op on
/// other platforms. Vendored from `process-utils` rather than pulled in
/// as a path dependency since only this much of it is needed.
trait NoWindowExt {
    fn no_window(&mut self) -> &mut Self;
}

impl NoWindowExt for Command {
    fn no_window(&mut self) -> &mut Self {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
        self
    }
}

fn tokio_command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    cmd.no_window();
    cmd
}

fn packager_lock() -> &'static AsyncMutex<()> {
    static LOCK: OnceLock<AsyncMutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| AsyncMutex::new(()))
}

/// Ensures the packager for `stream` has been started, spawning it under
/// the process-wide lock if it is currently `stopped`. Concurrent callers
/// observe the non-stopped state and return without spawning a second
/// process. Spawn failures are logged and leave the stream `stopped` so a
/// later manifest GET retries.
pub async fn ensure_started(stream: &Arc<Stream>, base_url: &str) {
    let _guard = packager_lock().lock().await;

    let mut handle = stream.packager.lock().await;
    if handle.status() != PackagerStatus::Stopped {
        return;
    }
    handle.set_status(PackagerStatus::Starting);

    let command = build_command(base_url, stream);
    tracing::debug!(stream = %stream.id, command = ?command, "spawning packager");

    let Some((program, args)) = command.split_first() else {
        tracing::warn!(stream = %stream.id, "empty packager command, not spawning");
        handle.set_status(PackagerStatus::Stopped);
        return;
    };

    match tokio_command(program).args(args).spawn() {
        Ok(child) => {
            handle.child = Some(child);
            handle.set_status(PackagerStatus::Started);
            stream.set_status(crate::model::StreamStatus::Started);
        }
        Err(err) => {
            tracing::warn!(stream = %stream.id, error = %err, "packager spawn failed");
            handle.set_status(PackagerStatus::Stopped);
        }
    }
}

/// Builds the packager command line for `stream`, rooted at `base_url`
/// (this server's own reachable HTTP base, used for `-utc_timing_url`
/// and the output MPD destination).
pub fn build_command(base_url: &str, stream: &Stream) -> Vec<String> {
    match stream.config.stream_type {
        StreamType::Gen => build_gen_command(base_url, &stream.id),
        StreamType::Rtsp => build_rtsp_command(base_url, stream),
    }
}

fn s(v: &str) -> String {
    v.to_string()
}

/// Mirrors `ffmpeg_gen_video_command`: a fixed test-source pipeline with
/// only the time-server URL (index 30) and output destination (index 59)
/// substituted.
fn build_gen_command(base_url: &str, stream_id: &str) -> Vec<String> {
    vec![
        s("ffmpeg"),
        s("-hide_banner"),
        s("-re"),
        s("-f"),
        s("lavfi"),
        s("-i"),
        s("testsrc2=size=320x240:rate=30"),
        s("-pix_fmt"),
        s("yuv420p"),
        s("-c:v"),
        s("libx264"),
        s("-x264opts"),
        s("keyint=15:min-keyint=15:scenecut=-1"),
        s("-tune"),
        s("zerolatency"),
        s("-profile:v"),
        s("baseline"),
        s("-preset"),
        s("veryfast"),
        s("-bf"),
        s("0"),
        s("-refs"),
        s("3"),
        s("-b:v"),
        s("500k"),
        s("-bufsize"),
        s("500k"),
        s("-vf"),
        s("drawtext=fontfile='/Library/Fonts/Arial.ttf':text='%{localtime}':box=1:fontcolor=black:boxcolor=white:fontsize=100':x=40:y=400'"),
        s("-utc_timing_url"),
        format!("{base_url}/isotime"),
        s("-use_timeline"),
        s("0"),
        s("-format_options"),
        s("movflags=cmaf"),
        s("-frag_type"),
        s("duration"),
        s("-adaptation_sets"),
        s("id=0, seg_duration=1, frag_duration=0.1, streams=v"),
        s("-streaming"),
        s("1"),
        s("-ldash"),
        s("1"),
        s("-export_side_data"),
        s("prft"),
        s("-write_prft"),
        s("1"),
        s("-target_latency"),
        s("0.5"),
        s("-window_size"),
        s("5"),
        s("-extra_window_size"),
        s("10"),
        s("-remove_at_exit"),
        s("1"),
        s("-method"),
        s("PUT"),
        s("-f"),
        s("dash"),
        format!("{base_url}/{stream_id}/manifest.mpd"),
    ]
}

/// Mirrors `ffmpeg_rtsp_video_command` and the per-quality option splicing
/// in `ffmpeg_command()`: a base template with a single `-map`/option
/// placeholder block (index 11) that gets replaced by nine option groups,
/// one entry per configured quality, each group contiguous and in the
/// same relative order as the Python implementation's insert loop.
fn build_rtsp_command(base_url: &str, stream: &Stream) -> Vec<String> {
    let cfg = &stream.config;
    let input = cfg.input.clone().unwrap_or_default();

    let mut command = vec![
        s("ffmpeg"),
        s("-fflags"),
        s("nobuffer"),
        s("-flags"),
        s("low_delay"),
        s("-avioflags"),
        s("direct"),
        s("-f"),
        s("rtsp"),
        s("-i"),
        input,
        s("__QUALITIES__"),
        s("-utc_timing_url"),
        format!("{base_url}/isotime"),
        s("-use_timeline"),
        s("0"),
        s("-use_template"),
        s("1"),
        s("-format_options"),
        s("movflags=cmaf"),
        s("-frag_type"),
        s("duration"),
        s("-adaptation_sets"),
        format!(
            "id=0,streams=v,seg_duration={},frag_duration={}",
            cfg.segment_duration(),
            cfg.fragment_duration()
        ),
        s("-streaming"),
        s("1"),
        s("-ldash"),
        s("1"),
        s("-export_side_data"),
        s("prft"),
        s("-write_prft"),
        s("1"),
        s("-target_latency"),
        cfg.target_latency().to_string(),
        s("-window_size"),
        s("10"),
        s("-extra_window_size"),
        s("120"),
        s("-remove_at_exit"),
        s("1"),
        s("-method"),
        s("PUT"),
        s("-f"),
        s("dash"),
        format!("{base_url}/{}/manifest.mpd", stream.id),
    ];

    let placeholder = command
        .iter()
        .position(|tok| tok == "__QUALITIES__")
        .expect("placeholder inserted above");

    let mut groups: Vec<Vec<String>> = Vec::new();
    let mut mapping = Vec::new();
    let mut bitrate = Vec::new();
    let mut bufsize = Vec::new();
    let mut filter = Vec::new();
    let mut codec = Vec::new();
    let mut x264opts = Vec::new();
    let mut tune = Vec::new();
    let mut profile = Vec::new();
    let mut preset = Vec::new();
    let mut b_frames = Vec::new();
    let mut refs = Vec::new();

    for (i, q) in cfg.qualities().iter().enumerate() {
        mapping.push(s("-map"));
        mapping.push(s("0:v:0"));

        bitrate.push(format!("-b:v:{i}"));
        bitrate.push(format!("{}k", q.target_bitrate));

        bufsize.push(format!("-bufsize:v:{i}"));
        bufsize.push(format!("{}k", q.target_bitrate));

        filter.push(format!("-filter:v:{i}"));
        filter.push(format!("fps={},scale={}:-2", cfg.frame_rate(), q.target_width));

        codec.push(format!("-c:v:{i}"));
        codec.push(s("libx264"));

        x264opts.push(format!("-x264opts:v:{i}"));
        x264opts.push(format!(
            "keyint={0}:min-keyint={0}:scenecut=-1",
            cfg.intra_interval()
        ));

        tune.push(format!("-tune:v:{i}"));
        tune.push(s("zerolatency"));

        profile.push(format!("-profile:v:{i}"));
        profile.push(s("baseline"));

        preset.push(format!("-preset:v:{i}"));
        preset.push(s("veryfast"));

        b_frames.push(format!("-bf:v:{i}"));
        b_frames.push(s("0"));

        refs.push(format!("-refs:v:{i}"));
        refs.push(s("0"));
    }

    groups.push(mapping);
    groups.push(bitrate);
    groups.push(bufsize);
    groups.push(filter);
    groups.push(codec);
    groups.push(x264opts);
    groups.push(tune);
    groups.push(profile);
    groups.push(preset);
    groups.push(b_frames);
    groups.push(refs);

    let spliced: Vec<String> = groups.into_iter().flatten().collect();
    command.splice(placeholder..=placeholder, spliced);
    command
}
