//! Caption cues and ASS rendering.

use super::endcard::{escape_drawtext, escape_filtergraph};
use super::{ensure_output, remove_stale, Compositor};
use crate::artifacts::Artifacts;
use crate::{Error, Result};
use jobreel_common::HexColor;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// One timed caption event, offsets in seconds from the start of the video.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Lay out one cue per scene back to back, using measured scene durations.
///
/// Cue `i` starts where cue `i - 1` ended, so the last cue ends at the sum
/// of `durations`.
pub fn build_cues(durations: &[f64], texts: &[String]) -> Result<Vec<Cue>> {
    if durations.len() != texts.len() {
        return Err(Error::InvalidInput(format!(
            "{} scene durations but {} caption texts",
            durations.len(),
            texts.len()
        )));
    }
    if let Some(bad) = durations.iter().find(|d| !(d.is_finite() && **d >= 0.0)) {
        return Err(Error::InvalidInput(format!("invalid scene duration {}", bad)));
    }

    let mut offset = 0.0;
    Ok(durations
        .iter()
        .zip(texts)
        .map(|(duration, text)| {
            let start = offset;
            offset += duration;
            Cue {
                start,
                end: offset,
                text: text.clone(),
            }
        })
        .collect())
}

/// `H:MM:SS.CC`, rounded to the nearest centisecond.
pub fn format_timestamp(seconds: f64) -> String {
    let centis = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 100.0).round() as u64
    } else {
        0
    };
    let hours = centis / 360_000;
    let minutes = (centis / 6_000) % 60;
    let secs = (centis / 100) % 60;
    let cs = centis % 100;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, cs)
}

/// Caption look. The box behind the text takes the brand color.
#[derive(Debug, Clone)]
pub struct CaptionStyle {
    pub font: String,
    pub font_size: u32,
    pub text_color: HexColor,
    pub box_color: HexColor,
    /// ASS alpha for the box (`0x00` opaque, `0xFF` transparent).
    pub box_alpha: u8,
    pub play_res_x: u32,
    pub play_res_y: u32,
    pub margin_h: u32,
    pub margin_v: u32,
}

impl CaptionStyle {
    pub fn new(font: impl Into<String>, font_size: u32, brand: HexColor, box_alpha: u8) -> Self {
        Self {
            font: font.into(),
            font_size,
            text_color: HexColor::WHITE,
            box_color: brand,
            box_alpha,
            play_res_x: 1080,
            play_res_y: 1920,
            margin_h: 80,
            margin_v: 320,
        }
    }

    /// Match the script resolution to the video frame.
    pub fn with_frame(mut self, width: u32, height: u32) -> Self {
        self.play_res_x = width;
        self.play_res_y = height;
        self.margin_h = width / 13;
        self.margin_v = height / 6;
        self
    }
}

/// Render a complete ASS script with one dialogue event per cue.
pub fn render_ass(style: &CaptionStyle, cues: &[Cue]) -> String {
    let text = style.text_color.to_ass(0x00);
    let back = style.box_color.to_ass(style.box_alpha);

    let mut out = String::with_capacity(1024 + cues.len() * 96);
    out.push_str("[Script Info]\n");
    out.push_str("ScriptType: v4.00+\n");
    let _ = writeln!(out, "PlayResX: {}", style.play_res_x);
    let _ = writeln!(out, "PlayResY: {}", style.play_res_y);
    out.push_str("WrapStyle: 0\n");
    out.push_str("ScaledBorderAndShadow: yes\n\n");

    out.push_str("[V4+ Styles]\n");
    out.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    // BorderStyle 3 draws an opaque box in OutlineColour.
    let _ = writeln!(
        out,
        "Style: Caption,{font},{size},{text},{text},{back},{back},-1,0,0,0,100,100,0,0,3,{pad},0,2,{mh},{mh},{mv},1",
        font = style.font,
        size = style.font_size,
        pad = (style.font_size / 4).max(1),
        mh = style.margin_h,
        mv = style.margin_v,
    );
    out.push('\n');

    out.push_str("[Events]\n");
    out.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");
    for cue in cues {
        let _ = writeln!(
            out,
            "Dialogue: 0,{},{},Caption,,0,0,0,,{}",
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            escape_ass_text(&cue.text)
        );
    }
    out
}

/// Keep caption text literal: no override blocks, no stray line breaks.
fn escape_ass_text(text: &str) -> String {
    text.trim()
        .replace('\\', "/")
        .replace('{', "(")
        .replace('}', ")")
        .replace("\r\n", "\\N")
        .replace('\n', "\\N")
}

impl Compositor {
    /// Write `{job}_captions.ass` and burn it into `input`, producing
    /// `{job}_overlays.mp4`. Audio is stream-copied.
    pub async fn burn_captions(
        &self,
        artifacts: &Artifacts,
        input: &Path,
        cues: &[Cue],
        style: &CaptionStyle,
    ) -> Result<PathBuf> {
        let script_path = artifacts.captions();
        tokio::fs::write(&script_path, render_ass(style, cues)).await?;

        let output = artifacts.overlays();
        remove_stale(&output).await?;

        let script = script_path.display().to_string();
        let filter = format!("ass=filename={}", escape_filtergraph(&escape_drawtext(&script)));

        #[cfg(feature = "tracing")]
        tracing::debug!(cues = cues.len(), script = %script, "Burning captions");

        let s = self.settings();
        let mut cmd = self.ffmpeg();
        cmd.arg("-i")
            .path_arg(input)
            .args(["-map", "0:v:0", "-map", "0:a:0?", "-vf"])
            .arg(filter)
            .arg("-c:v")
            .arg(s.video_codec.clone())
            .arg("-preset")
            .arg(s.preset.clone())
            .arg("-crf")
            .arg(s.crf.to_string())
            .args(["-pix_fmt", "yuv420p", "-r"])
            .arg(s.fps.to_string())
            .args(["-c:a", "copy", "-movflags", "+faststart"])
            .path_arg(&output);
        cmd.execute().await?;

        ensure_output(&output).await
    }
}
