//! Core enums shared by the render pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a render job.
///
/// `Queued -> Running -> {Ready, Error}`. Ready and Error are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    /// Accepted, not yet started.
    Queued,
    /// The pipeline is executing.
    Running,
    /// The final asset was produced and published.
    Ready,
    /// A fatal stage failed.
    Error,
}

impl JobStatus {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running) | (Self::Running, Self::Ready) | (Self::Running, Self::Error)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "QUEUED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Ready => write!(f, "READY"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Brand tone requested for the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Calm, corporate.
    #[default]
    Professional,
    /// Warm, approachable.
    Friendly,
    /// Fast, upbeat.
    Energetic,
    /// Understated, high-end.
    Premium,
}

impl Tone {
    /// Parse a tone identifier, falling back to [`Tone::Professional`].
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// Music mood used when a shot plan is built locally.
    pub fn music_mood(self) -> &'static str {
        match self {
            Self::Professional => "corporate_ambient",
            Self::Friendly => "warm_acoustic",
            Self::Energetic => "upbeat_electronic",
            Self::Premium => "minimal_piano",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Professional => write!(f, "professional"),
            Self::Friendly => write!(f, "friendly"),
            Self::Energetic => write!(f, "energetic"),
            Self::Premium => write!(f, "premium"),
        }
    }
}

impl std::str::FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "professional" | "corporate" => Ok(Self::Professional),
            "friendly" | "casual" => Ok(Self::Friendly),
            "energetic" | "bold" => Ok(Self::Energetic),
            "premium" | "luxury" => Ok(Self::Premium),
            _ => Err(format!("Unknown tone: {}", s)),
        }
    }
}

/// Scene acquisition strategy chosen at job acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Locally synthesized branded gradient clips.
    #[default]
    Template,
    /// Long-running external video generation with template fallback.
    Generative,
    /// Placeholder engine that delegates to the template engine.
    Stub,
}

impl EngineKind {
    /// Resolve an optional engine identifier. Unknown or absent identifiers
    /// select [`EngineKind::Template`].
    pub fn from_identifier(id: Option<&str>) -> Self {
        match id.map(|s| s.trim().to_lowercase()) {
            Some(s) => match s.as_str() {
                "generative" | "veo" | "video-gen" => Self::Generative,
                "stub" | "runway" => Self::Stub,
                _ => Self::Template,
            },
            None => Self::Template,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => write!(f, "template"),
            Self::Generative => write!(f, "generative"),
            Self::Stub => write!(f, "stub"),
        }
    }
}
