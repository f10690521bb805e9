//! Media file probing.
//!
//! Inspection goes through the ffprobe CLI and its JSON output. The render
//! pipeline uses it for measured clip durations, for validating downloaded
//! clips, for matching end-card audio to the main asset, and for the final
//! quality check.

mod ffprobe;
mod types;

pub use ffprobe::{parse_ffprobe_json, probe_with_ffprobe};
pub use types::*;

use crate::tools::Toolchain;
use crate::Result;
use std::path::Path;

/// Probe a media file with the toolchain's ffprobe.
pub async fn probe(toolchain: &Toolchain, path: &Path) -> Result<MediaInfo> {
    probe_with_ffprobe(&toolchain.ffprobe, path).await
}

/// Measured duration of a media file in seconds.
pub async fn probe_duration(toolchain: &Toolchain, path: &Path) -> Result<f64> {
    let info = probe(toolchain, path).await?;
    info.duration_secs().ok_or_else(|| {
        crate::Error::parse_error("ffprobe", format!("no duration for {}", path.display()))
    })
}
