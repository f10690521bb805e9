//! Locally synthesized scene clips.

use super::{ensure_output, remove_stale, Compositor};
use crate::{Error, Result};
use jobreel_common::HexColor;
use std::path::{Path, PathBuf};

impl Compositor {
    /// Render a slowly moving two-color gradient with a silent audio track.
    ///
    /// The clip is already in the render format, so normalizing it again is
    /// cheap and lossless in geometry and rate.
    pub async fn synthesize_gradient(
        &self,
        output: &Path,
        seconds: f64,
        primary: HexColor,
        secondary: HexColor,
    ) -> Result<PathBuf> {
        if !(seconds.is_finite() && seconds > 0.0) {
            return Err(Error::InvalidInput(format!(
                "clip length must be positive, got {}",
                seconds
            )));
        }

        let s = self.settings();
        let source = format!(
            "gradients=s={size}:r={fps}:c0={c0}:c1={c1}:n=2:speed=0.01:d={secs:.3}",
            size = s.size(),
            fps = s.fps,
            c0 = primary.to_ffmpeg(),
            c1 = secondary.to_ffmpeg(),
            secs = seconds,
        );

        #[cfg(feature = "tracing")]
        tracing::debug!(output = %output.display(), seconds, "Synthesizing gradient clip");

        remove_stale(output).await?;

        let mut cmd = self.ffmpeg();
        cmd.args(["-f", "lavfi", "-i"])
            .arg(source)
            .args(["-f", "lavfi", "-i"])
            .arg(s.silent_audio_source())
            .args(["-map", "0:v:0", "-map", "1:a:0", "-t"])
            .arg(format!("{:.3}", seconds))
            .args(self.encode_args())
            .path_arg(output);
        cmd.execute().await?;

        ensure_output(output).await
    }
}
