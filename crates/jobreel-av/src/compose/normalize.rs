//! Normalization and stream-copy concatenation.

use super::{ensure_output, remove_stale, Compositor};
use crate::artifacts::Artifacts;
use crate::probe;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Result of [`Compositor::normalize_and_concat`].
#[derive(Debug, Clone)]
pub struct ConcatOutput {
    /// The concatenated video.
    pub path: PathBuf,
    /// Normalized clips, in scene order.
    pub normalized: Vec<PathBuf>,
    /// Measured duration of each normalized clip in seconds, in scene order.
    pub durations: Vec<f64>,
}

impl ConcatOutput {
    /// Sum of the measured scene durations.
    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }
}

/// One line of an ffmpeg concat-demuxer list.
pub fn concat_list_entry(path: &Path) -> String {
    format!("file '{}'", path.display().to_string().replace('\'', "'\\''"))
}

impl Compositor {
    /// Re-encode one clip to the render format.
    ///
    /// Inputs without an audio stream get a silent track so every normalized
    /// clip has the same stream layout.
    pub async fn normalize(&self, input: &Path, output: &Path) -> Result<PathBuf> {
        let info = probe::probe(self.toolchain(), input).await?;
        if info.primary_video().is_none() {
            return Err(Error::InvalidInput(format!(
                "no video stream in {}",
                input.display()
            )));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            has_audio = info.has_audio(),
            "Normalizing clip"
        );

        remove_stale(output).await?;

        let mut cmd = self.ffmpeg();
        cmd.arg("-i").path_arg(input);
        if info.has_audio() {
            cmd.args(["-map", "0:v:0", "-map", "0:a:0"]);
        } else {
            cmd.args(["-f", "lavfi", "-i"])
                .arg(self.settings().silent_audio_source())
                .args(["-map", "0:v:0", "-map", "1:a:0", "-shortest"]);
        }
        cmd.arg("-vf")
            .arg(self.settings().normalize_filter())
            .args(self.encode_args())
            .path_arg(output);
        cmd.execute().await?;

        ensure_output(output).await
    }

    /// Stream-copy `inputs` into `output` through the concat demuxer, writing
    /// the list to `list_path`. Inputs must share one encoding.
    pub async fn concat(&self, inputs: &[PathBuf], list_path: &Path, output: &Path) -> Result<PathBuf> {
        if inputs.is_empty() {
            return Err(Error::InvalidInput("nothing to concatenate".to_string()));
        }

        let mut list = String::new();
        for input in inputs {
            let absolute = absolute(input)?;
            list.push_str(&concat_list_entry(&absolute));
            list.push('\n');
        }
        tokio::fs::write(list_path, list).await?;

        remove_stale(output).await?;

        let mut cmd = self.ffmpeg();
        cmd.args(["-f", "concat", "-safe", "0", "-i"])
            .path_arg(list_path)
            .args(["-c", "copy", "-movflags", "+faststart"])
            .path_arg(output);
        cmd.execute().await?;

        ensure_output(output).await
    }

    /// Normalize every scene clip, measure each result, and concatenate them
    /// in order into `{job}_concat.mp4`.
    pub async fn normalize_and_concat(
        &self,
        artifacts: &Artifacts,
        clips: &[PathBuf],
    ) -> Result<ConcatOutput> {
        let mut normalized = Vec::with_capacity(clips.len());
        let mut durations = Vec::with_capacity(clips.len());

        for (index, clip) in clips.iter().enumerate() {
            let out = self.normalize(clip, &artifacts.scene_normalized(index)).await?;
            durations.push(probe::probe_duration(self.toolchain(), &out).await?);
            normalized.push(out);
        }

        let path = self
            .concat(&normalized, &artifacts.concat_list(), &artifacts.concat())
            .await?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            scenes = normalized.len(),
            total_secs = durations.iter().sum::<f64>(),
            "Concatenated normalized scenes"
        );

        Ok(ConcatOutput {
            path,
            normalized,
            durations,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::RenderSettings;
    use crate::tools::Toolchain;

    #[test]
    fn test_concat_list_entry_quotes() {
        assert_eq!(
            concat_list_entry(Path::new("/work/a_scene0_norm.mp4")),
            "file '/work/a_scene0_norm.mp4'"
        );
        assert_eq!(
            concat_list_entry(Path::new("/work/it's.mp4")),
            r"file '/work/it'\''s.mp4'"
        );
    }

    #[test]
    fn test_total_duration() {
        let out = ConcatOutput {
            path: PathBuf::from("/work/c.mp4"),
            normalized: vec![],
            durations: vec![7.98, 8.02, 4.0],
        };
        assert!((out.total_duration() - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_concat_requires_inputs() {
        let c = Compositor::new(Toolchain::default(), RenderSettings::default());
        let result = c
            .concat(&[], Path::new("/tmp/list.txt"), Path::new("/tmp/out.mp4"))
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
