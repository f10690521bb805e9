//! # jobreel-av
//!
//! Media inspection and composition for render jobs.
//!
//! This crate provides:
//! - Probing media files through ffprobe (duration, resolution, frame rate,
//!   audio layout)
//! - Synthesizing branded gradient clips
//! - Normalizing clips to one encoding and stream-copy concatenation
//! - Burning per-scene captions timed from measured clip durations
//! - Appending a branded end card with matching silent audio
//! - Deterministic, job-scoped artifact naming
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use jobreel_av::{probe, Toolchain};
//! use std::path::Path;
//!
//! # async fn example() -> jobreel_av::Result<()> {
//! let tools = Toolchain::resolve(None, None)?;
//! let info = probe(&tools, Path::new("/work/job_final.mp4")).await?;
//! println!("Duration: {:?}", info.duration_secs());
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod command;
pub mod compose;
mod error;
pub mod probe;
pub mod tools;

// Re-exports
pub use artifacts::{find_reusable_scene, Artifacts};
pub use command::{ToolCommand, ToolOutput};
pub use compose::{CaptionStyle, Compositor, ConcatOutput, Cue, EndCard, RenderSettings};
pub use error::{Error, Result};
pub use probe::{AudioTrack, MediaInfo, VideoTrack};
pub use tools::{check_tool, check_tools, require_tool, ToolInfo, Toolchain};

/// Probe a media file and return its metadata.
pub async fn probe(toolchain: &Toolchain, path: &std::path::Path) -> Result<MediaInfo> {
    probe::probe(toolchain, path).await
}
