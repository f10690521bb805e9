//! FFmpeg composition engine.
//!
//! Each transform takes input path(s) and writes one output whose name is
//! derived from the job's [`Artifacts`](crate::Artifacts), so a repeated run
//! for the same job overwrites its own files:
//!
//! 1. [`Compositor::normalize_and_concat`] re-encodes every scene to one
//!    frame size, rate and codec set, then stream-copies them together.
//! 2. [`Compositor::burn_captions`] renders one caption cue per scene, timed
//!    from the measured durations of the normalized clips.
//! 3. [`Compositor::append_end_card`] renders a static branded card with a
//!    silent audio track that matches the main asset, then stream-copies it
//!    onto the end.
//!
//! [`Compositor::synthesize_gradient`] produces the locally generated scene
//! clips used by the template engine.

mod captions;
mod endcard;
mod normalize;
mod synth;

pub use captions::{build_cues, format_timestamp, render_ass, CaptionStyle, Cue};
pub use endcard::{escape_drawtext, escape_filtergraph, EndCard};
pub use normalize::{concat_list_entry, ConcatOutput};

use crate::artifacts::Artifacts;
use crate::command::{ToolCommand, DEFAULT_TIMEOUT};
use crate::tools::Toolchain;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Output encoding shared by every rendered clip.
///
/// Stream-copy concatenation only works when all inputs agree on these, so
/// every encode in this module goes through [`Compositor::encode_args`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub audio_sample_rate: u32,
    pub audio_channels: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 20,
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
            audio_sample_rate: 44100,
            audio_channels: 2,
        }
    }
}

impl RenderSettings {
    /// `WxH` as used by lavfi sources.
    pub fn size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Scale to cover the target frame, center-crop, then fix rate and SAR.
    pub fn normalize_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},fps={fps},setsar=1,format=yuv420p",
            w = self.width,
            h = self.height,
            fps = self.fps,
        )
    }

    /// Silent lavfi audio source in the render's audio format.
    pub fn silent_audio_source(&self) -> String {
        silent_audio_source(
            self.audio_sample_rate,
            &crate::probe::channel_layout_for(self.audio_channels),
        )
    }
}

/// `anullsrc` with the given sample rate and channel layout.
pub fn silent_audio_source(sample_rate: u32, layout: &str) -> String {
    format!("anullsrc=r={}:cl={}", sample_rate, layout)
}

/// Runs ffmpeg transforms with one set of render settings.
#[derive(Debug, Clone)]
pub struct Compositor {
    toolchain: Toolchain,
    settings: RenderSettings,
    timeout: Duration,
}

impl Compositor {
    pub fn new(toolchain: Toolchain, settings: RenderSettings) -> Self {
        Self {
            toolchain,
            settings,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Run all three composition transforms in order.
    ///
    /// Returns the concat result (with measured durations) and the final path.
    pub async fn compose(
        &self,
        artifacts: &Artifacts,
        clips: &[PathBuf],
        captions: &[String],
        style: &CaptionStyle,
        card: &EndCard,
    ) -> Result<(ConcatOutput, PathBuf)> {
        let concat = self.normalize_and_concat(artifacts, clips).await?;
        let cues = build_cues(&concat.durations, captions)?;
        let overlays = self.burn_captions(artifacts, &concat.path, &cues, style).await?;
        let final_path = self.append_end_card(artifacts, &overlays, card).await?;
        Ok((concat, final_path))
    }

    /// An ffmpeg invocation that overwrites its output and only reports errors.
    fn ffmpeg(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.toolchain.ffmpeg.clone());
        cmd.args(["-hide_banner", "-nostdin", "-y", "-loglevel", "error"])
            .timeout(self.timeout);
        cmd
    }

    /// Video and audio encoder arguments for a re-encode.
    fn encode_args(&self) -> Vec<String> {
        let s = &self.settings;
        vec![
            "-c:v".into(),
            s.video_codec.clone(),
            "-preset".into(),
            s.preset.clone(),
            "-crf".into(),
            s.crf.to_string(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-r".into(),
            s.fps.to_string(),
            "-c:a".into(),
            s.audio_codec.clone(),
            "-b:a".into(),
            s.audio_bitrate.clone(),
            "-ar".into(),
            s.audio_sample_rate.to_string(),
            "-ac".into(),
            s.audio_channels.to_string(),
            "-movflags".into(),
            "+faststart".into(),
        ]
    }
}

/// Remove a stale output so a failed run never leaves a previous result
/// looking current.
async fn remove_stale(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Confirm ffmpeg actually wrote a non-empty output.
async fn ensure_output(path: &Path) -> Result<PathBuf> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(path.to_path_buf()),
        Ok(_) => Err(crate::Error::tool_failed(
            "ffmpeg",
            format!("empty output {}", path.display()),
        )),
        Err(_) => Err(crate::Error::tool_failed(
            "ffmpeg",
            format!("missing output {}", path.display()),
        )),
    }
}
