//! FFprobe-based media probing.

use super::types::*;
use crate::command::ToolCommand;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: String,
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
    channels: Option<u32>,
    channel_layout: Option<String>,
    sample_rate: Option<String>,
}

/// Probe a media file using the given ffprobe binary.
pub async fn probe_with_ffprobe(ffprobe: &Path, path: &Path) -> Result<MediaInfo> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let output = ToolCommand::new(ffprobe.to_path_buf())
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .path_arg(path)
        .timeout(PROBE_TIMEOUT)
        .execute()
        .await?;

    parse_ffprobe_json(path, &output.stdout)
}

/// Parse ffprobe's `-print_format json -show_format -show_streams` output.
pub fn parse_ffprobe_json(path: &Path, json: &str) -> Result<MediaInfo> {
    let output: FfprobeOutput = serde_json::from_str(json)?;
    let format = output
        .format
        .ok_or_else(|| Error::parse_error("ffprobe", "no container format in output"))?;

    let mut info = MediaInfo {
        file_path: path.to_path_buf(),
        file_size: format.size.and_then(|s| s.parse().ok()).unwrap_or(0),
        container: format.format_name,
        duration: format.duration.as_deref().and_then(parse_seconds),
        video_tracks: Vec::new(),
        audio_tracks: Vec::new(),
    };

    let mut video_index = 0u32;
    let mut audio_index = 0u32;

    for stream in output.streams {
        match stream.codec_type.as_str() {
            "video" => {
                // Still images (cover art) report 0/0 as their average rate.
                let frame_rate = stream
                    .r_frame_rate
                    .as_deref()
                    .and_then(parse_frame_rate)
                    .or_else(|| stream.avg_frame_rate.as_deref().and_then(parse_frame_rate));

                info.video_tracks.push(VideoTrack {
                    index: video_index,
                    codec: stream.codec_name.unwrap_or_default(),
                    width: stream.width.unwrap_or(0),
                    height: stream.height.unwrap_or(0),
                    frame_rate,
                    duration: stream.duration.as_deref().and_then(parse_seconds),
                });
                video_index += 1;
            }
            "audio" => {
                info.audio_tracks.push(AudioTrack {
                    index: audio_index,
                    codec: stream.codec_name.unwrap_or_default(),
                    channels: stream.channels.unwrap_or(2),
                    sample_rate: stream.sample_rate.and_then(|s| s.parse().ok()),
                    channel_layout: stream.channel_layout,
                });
                audio_index += 1;
            }
            _ => {}
        }
    }

    if info.video_tracks.is_empty() && info.audio_tracks.is_empty() {
        return Err(Error::parse_error(
            "ffprobe",
            format!("no audio or video streams in {}", path.display()),
        ));
    }

    Ok(info)
}

fn parse_seconds(s: &str) -> Option<Duration> {
    let secs: f64 = s.trim().parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let parts: Vec<&str> = rate_str.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 && num > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate_str.parse().ok().filter(|r: &f64| *r > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264",
             "width": 1080, "height": 1920, "r_frame_rate": "30/1",
             "avg_frame_rate": "30/1", "duration": "8.000000"},
            {"index": 1, "codec_type": "audio", "codec_name": "aac",
             "channels": 2, "channel_layout": "stereo", "sample_rate": "44100",
             "duration": "8.010000"}
        ],
        "format": {"filename": "a.mp4", "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                   "duration": "8.010000", "size": "123456"}
    }"#;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("24000/1001"), Some(23.976023976023978));
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("invalid"), None);
    }

    #[test]
    fn test_parse_sample() {
        let info = parse_ffprobe_json(Path::new("a.mp4"), SAMPLE).unwrap();
        assert_eq!(info.file_size, 123456);
        assert_eq!(info.resolution(), Some((1080, 1920)));
        assert_eq!(info.primary_video().unwrap().frame_rate, Some(30.0));
        let audio = info.primary_audio().unwrap();
        assert_eq!(audio.sample_rate, Some(44100));
        assert_eq!(audio.layout_name(), "stereo");
        assert!((info.duration_secs().unwrap() - 8.01).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_ffprobe_json(Path::new("x"), "not json").is_err());
        assert!(parse_ffprobe_json(Path::new("x"), r#"{"streams": []}"#).is_err());
        let no_streams = r#"{"streams": [], "format": {"format_name": "mp4"}}"#;
        assert!(matches!(
            parse_ffprobe_json(Path::new("x"), no_streams),
            Err(Error::ParseError { .. })
        ));
    }
}
