use jobreel_av::RenderSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when `llm.api_key` is unset.
pub const LLM_API_KEY_ENV: &str = "JOBREEL_LLM_API_KEY";

/// Environment variable consulted when `generation.api_key` is unset.
pub const GENERATION_API_KEY_ENV: &str = "JOBREEL_GENERATION_API_KEY";

/// Largest scene count a request may ask for.
pub const MAX_SCENE_COUNT: u32 = 12;

/// Longest default scene length, in seconds.
pub const MAX_SCENE_SECONDS: u32 = 120;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// Directory for intermediate artifacts. Never cleaned up automatically.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            work_dir: default_work_dir(),
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
            render: RenderConfig::default(),
            quality: QualityConfig::default(),
            storage: StorageConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("./work")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// OpenAI-compatible chat completions endpoint used by the planning
/// collaborators.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Bearer token. Falls back to `JOBREEL_LLM_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Flat cost estimate per completion call, for the debug trace.
    #[serde(default = "default_cost_per_call")]
    pub cost_per_call_usd: f64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_llm_timeout() -> u64 {
    60
}
fn default_cost_per_call() -> f64 {
    0.002
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: None,
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            cost_per_call_usd: default_cost_per_call(),
        }
    }
}

impl LlmConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), LLM_API_KEY_ENV)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Asynchronous video generation service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Service root. When unset the generative engine always falls back to
    /// template clips.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token. Falls back to `JOBREEL_GENERATION_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Downloads smaller than this are rejected.
    #[serde(default = "default_min_clip_bytes")]
    pub min_clip_bytes: u64,

    /// Pause after a download before the file is validated.
    #[serde(default = "default_settle_millis")]
    pub settle_millis: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_cost_per_second")]
    pub cost_per_second_usd: f64,
}

fn default_poll_interval() -> u64 {
    10
}
fn default_max_poll_attempts() -> u32 {
    60
}
fn default_min_clip_bytes() -> u64 {
    50_000
}
fn default_settle_millis() -> u64 {
    2_000
}
fn default_request_timeout() -> u64 {
    120
}
fn default_cost_per_second() -> f64 {
    0.35
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            poll_interval_secs: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            min_clip_bytes: default_min_clip_bytes(),
            settle_millis: default_settle_millis(),
            request_timeout_secs: default_request_timeout(),
            cost_per_second_usd: default_cost_per_second(),
        }
    }
}

impl GenerationConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), GENERATION_API_KEY_ENV)
    }
}

fn resolve_key(configured: Option<&str>, env: &str) -> Option<String> {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var(env).ok())
        .filter(|k| !k.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default = "default_crf")]
    pub crf: u8,
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
    #[serde(default = "default_audio_sample_rate")]
    pub audio_sample_rate: u32,
    #[serde(default = "default_audio_channels")]
    pub audio_channels: u32,

    /// Planned length of one scene when the request gives no total.
    #[serde(default = "default_scene_seconds")]
    pub scene_seconds: u32,

    #[serde(default = "default_scene_count")]
    pub default_scene_count: u32,

    /// ASS alpha byte for the caption box.
    #[serde(default = "default_caption_alpha")]
    pub caption_alpha: u8,
    #[serde(default = "default_caption_font")]
    pub caption_font: String,
    #[serde(default = "default_caption_font_size")]
    pub caption_font_size: u32,
    /// Narrative beats used as captions are cut to this many characters.
    #[serde(default = "default_caption_max_chars")]
    pub caption_max_chars: usize,

    #[serde(default = "default_end_card_seconds")]
    pub end_card_seconds: u32,
    /// Literal call to action on the end card.
    #[serde(default = "default_cta_text")]
    pub cta_text: String,
    /// Font file for the end card. Without one, `caption_font` is looked up
    /// through fontconfig.
    #[serde(default)]
    pub font_file: Option<PathBuf>,
}

fn default_width() -> u32 {
    1080
}
fn default_height() -> u32 {
    1920
}
fn default_fps() -> u32 {
    30
}
fn default_video_codec() -> String {
    "libx264".to_string()
}
fn default_preset() -> String {
    "veryfast".to_string()
}
fn default_crf() -> u8 {
    20
}
fn default_audio_codec() -> String {
    "aac".to_string()
}
fn default_audio_bitrate() -> String {
    "128k".to_string()
}
fn default_audio_sample_rate() -> u32 {
    44100
}
fn default_audio_channels() -> u32 {
    2
}
fn default_scene_seconds() -> u32 {
    8
}
fn default_scene_count() -> u32 {
    3
}
fn default_caption_alpha() -> u8 {
    0x40
}
fn default_caption_font() -> String {
    "Arial".to_string()
}
fn default_caption_font_size() -> u32 {
    64
}
fn default_caption_max_chars() -> usize {
    80
}
fn default_end_card_seconds() -> u32 {
    3
}
fn default_cta_text() -> String {
    "Apply now".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            audio_sample_rate: default_audio_sample_rate(),
            audio_channels: default_audio_channels(),
            scene_seconds: default_scene_seconds(),
            default_scene_count: default_scene_count(),
            caption_alpha: default_caption_alpha(),
            caption_font: default_caption_font(),
            caption_font_size: default_caption_font_size(),
            caption_max_chars: default_caption_max_chars(),
            end_card_seconds: default_end_card_seconds(),
            cta_text: default_cta_text(),
            font_file: None,
        }
    }
}

impl RenderConfig {
    /// Encoder settings for the composition engine.
    pub fn settings(&self) -> RenderSettings {
        RenderSettings {
            width: self.width,
            height: self.height,
            fps: self.fps,
            video_codec: self.video_codec.clone(),
            preset: self.preset.clone(),
            crf: self.crf,
            audio_codec: self.audio_codec.clone(),
            audio_bitrate: self.audio_bitrate.clone(),
            audio_sample_rate: self.audio_sample_rate,
            audio_channels: self.audio_channels,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QualityConfig {
    #[serde(default = "default_duration_tolerance")]
    pub duration_tolerance_secs: f64,

    #[serde(default = "default_min_fps")]
    pub min_fps: f64,

    #[serde(default = "default_min_contrast")]
    pub min_contrast_ratio: f64,
}

fn default_duration_tolerance() -> f64 {
    1.0
}
fn default_min_fps() -> f64 {
    24.0
}
fn default_min_contrast() -> f64 {
    jobreel_common::color::MIN_TEXT_CONTRAST
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            duration_tolerance_secs: default_duration_tolerance(),
            min_fps: default_min_fps(),
            min_contrast_ratio: default_min_contrast(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Published assets land here as `{job_id}.mp4`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./published")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}
