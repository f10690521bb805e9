//! Branded end card.

use super::{ensure_output, remove_stale, silent_audio_source, Compositor};
use crate::artifacts::Artifacts;
use crate::probe;
use crate::{Error, Result};
use jobreel_common::HexColor;
use std::path::{Path, PathBuf};

/// Escape a value for a filter option: backslash, colon, slash and
/// apostrophe are prefixed with a backslash.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if matches!(c, '\\' | ':' | '/' | '\'') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape an already option-escaped value for the filtergraph parser.
pub fn escape_filtergraph(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn filter_value(raw: &str) -> String {
    escape_filtergraph(&escape_drawtext(raw))
}

/// What the end card shows.
#[derive(Debug, Clone)]
pub struct EndCard {
    pub cta_text: String,
    pub cta_url: Option<String>,
    pub background: HexColor,
    pub seconds: f64,
    pub font: String,
    pub font_file: Option<PathBuf>,
    pub font_size: u32,
}

impl EndCard {
    fn font_option(&self) -> String {
        match &self.font_file {
            Some(path) => format!("fontfile={}", filter_value(&path.display().to_string())),
            None => format!("font={}", filter_value(&self.font)),
        }
    }

    /// `drawtext` chain: the CTA centered, the URL (if any) below it.
    pub fn drawtext_filter(&self) -> String {
        let font = self.font_option();
        let mut filter = format!(
            "drawtext={font}:expansion=none:text={text}:fontcolor=white:fontsize={size}:x=(w-text_w)/2:y=(h-text_h)/2",
            text = filter_value(self.cta_text.trim()),
            size = self.font_size,
        );
        if let Some(url) = self.cta_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            let small = (self.font_size * 3 / 5).max(1);
            filter.push_str(&format!(
                ",drawtext={font}:expansion=none:text={text}:fontcolor=white:fontsize={small}:x=(w-text_w)/2:y=(h/2)+{gap}",
                text = filter_value(url),
                gap = self.font_size * 3 / 2,
            ));
        }
        filter
    }
}

impl Compositor {
    /// Render the end card as `{job}_endcard.mp4`, with silent audio in the
    /// same sample rate and layout as `main`'s audio stream.
    pub async fn render_end_card(&self, artifacts: &Artifacts, main: &Path, card: &EndCard) -> Result<PathBuf> {
        if !(card.seconds.is_finite() && card.seconds > 0.0) {
            return Err(Error::InvalidInput(format!(
                "end card length must be positive, got {}",
                card.seconds
            )));
        }

        let info = probe::probe(self.toolchain(), main).await?;
        let s = self.settings();
        let silence = match info.primary_audio() {
            Some(audio) => silent_audio_source(
                audio.sample_rate.unwrap_or(s.audio_sample_rate),
                &audio.layout_name(),
            ),
            None => s.silent_audio_source(),
        };

        let output = artifacts.end_card();
        remove_stale(&output).await?;

        let source = format!(
            "color=c={}:s={}:r={}:d={:.3}",
            card.background.to_ffmpeg(),
            s.size(),
            s.fps,
            card.seconds
        );

        let mut cmd = self.ffmpeg();
        cmd.args(["-f", "lavfi", "-i"])
            .arg(source)
            .args(["-f", "lavfi", "-i"])
            .arg(silence)
            .args(["-map", "0:v:0", "-map", "1:a:0", "-vf"])
            .arg(card.drawtext_filter())
            .arg("-t")
            .arg(format!("{:.3}", card.seconds))
            .args(self.encode_args());

        // Match the main asset's audio exactly so stream copy concatenates.
        if let Some(audio) = info.primary_audio() {
            cmd.arg("-ac").arg(audio.channels.to_string());
            if let Some(rate) = audio.sample_rate {
                cmd.arg("-ar").arg(rate.to_string());
            }
        }
        cmd.path_arg(&output);
        cmd.execute().await?;

        ensure_output(&output).await
    }

    /// Append the end card to `main`, producing `{job}_final.mp4`.
    pub async fn append_end_card(&self, artifacts: &Artifacts, main: &Path, card: &EndCard) -> Result<PathBuf> {
        let end_card = self.render_end_card(artifacts, main, card).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(end_card = %end_card.display(), "Appending end card");

        self.concat(
            &[main.to_path_buf(), end_card],
            &artifacts.end_card_list(),
            &artifacts.final_output(),
        )
        .await
    }
}
