use crate::acquisition::AcquiredScene;
use crate::config::{RenderConfig, MAX_SCENE_COUNT};
use crate::planning::{JobBrief, Script, ShotPlan};
use crate::quality::QcReport;
use chrono::{DateTime, Utc};
use jobreel_common::{EngineKind, Error, HexColor, JobId, JobStatus, Result, Tone};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PRIMARY: &str = "#0B5FFF";
pub const DEFAULT_SECONDARY: &str = "#111827";

fn default_locale() -> String {
    "en".to_string()
}
fn default_primary() -> String {
    DEFAULT_PRIMARY.to_string()
}
fn default_secondary() -> String {
    DEFAULT_SECONDARY.to_string()
}

/// A request to turn a job posting into a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Free-text job posting.
    pub posting: String,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default)]
    pub scene_count: Option<u32>,

    /// Legacy total length; split evenly across scenes.
    #[serde(default)]
    pub duration_secs: Option<u32>,

    #[serde(default)]
    pub tone: Option<String>,

    #[serde(default)]
    pub brand: Brand,

    /// Scene engine identifier (`template`, `generative`, `stub`, ...).
    #[serde(default)]
    pub engine: Option<String>,

    /// Use the newest existing raw scene clips from the work directory.
    #[serde(default)]
    pub reuse_existing_clips: bool,

    /// Ask for short per-scene pitch lines to use as captions.
    #[serde(default)]
    pub enrich_pitch: bool,
}

impl RenderRequest {
    pub fn new(posting: impl Into<String>) -> Self {
        Self {
            posting: posting.into(),
            locale: default_locale(),
            scene_count: None,
            duration_secs: None,
            tone: None,
            brand: Brand::default(),
            engine: None,
            reuse_existing_clips: false,
            enrich_pitch: false,
        }
    }

    /// Validate the request and resolve every optional field.
    pub fn resolve(&self, render: &RenderConfig) -> Result<JobSettings> {
        if self.posting.trim().is_empty() {
            return Err(Error::validation("posting cannot be empty"));
        }

        let scene_count = self.scene_count.unwrap_or(render.default_scene_count);
        if scene_count == 0 || scene_count > MAX_SCENE_COUNT {
            return Err(Error::validation(format!(
                "scene_count must be between 1 and {}, got {}",
                MAX_SCENE_COUNT, scene_count
            )));
        }

        let total_secs = match self.duration_secs {
            Some(0) => return Err(Error::validation("duration_secs must be positive")),
            Some(d) => f64::from(d),
            None => f64::from(scene_count) * f64::from(render.scene_seconds),
        };

        let primary = HexColor::parse(&self.brand.primary_color)
            .map_err(|e| Error::validation(format!("brand.primary_color: {}", e)))?;
        let secondary = HexColor::parse(&self.brand.secondary_color)
            .map_err(|e| Error::validation(format!("brand.secondary_color: {}", e)))?;

        Ok(JobSettings {
            scene_count: scene_count as usize,
            total_secs,
            scene_secs: total_secs / f64::from(scene_count),
            tone: self.tone.as_deref().map(Tone::parse_or_default).unwrap_or_default(),
            engine: EngineKind::from_identifier(self.engine.as_deref()),
            locale: if self.locale.trim().is_empty() {
                default_locale()
            } else {
                self.locale.trim().to_string()
            },
            brand_name: self.brand.name.clone().filter(|n| !n.trim().is_empty()),
            primary,
            secondary,
            reuse_existing_clips: self.reuse_existing_clips,
            enrich_pitch: self.enrich_pitch,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_primary")]
    pub primary_color: String,
    #[serde(default = "default_secondary")]
    pub secondary_color: String,
}

impl Default for Brand {
    fn default() -> Self {
        Self {
            name: None,
            primary_color: default_primary(),
            secondary_color: default_secondary(),
        }
    }
}

/// Request parameters after validation, fixed at acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSettings {
    pub scene_count: usize,
    pub total_secs: f64,
    pub scene_secs: f64,
    pub tone: Tone,
    pub engine: EngineKind,
    pub locale: String,
    pub brand_name: Option<String>,
    pub primary: HexColor,
    pub secondary: HexColor,
    pub reuse_existing_clips: bool,
    pub enrich_pitch: bool,
}

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Ok,
    /// Recovered with a local fallback.
    Degraded,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub outcome: StepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugTrace {
    pub cost_estimate_usd: f64,
    pub total_latency_ms: u64,
    pub steps: Vec<StepRecord>,
    pub warnings: Vec<String>,
    pub qc: Option<QcReport>,
}

impl DebugTrace {
    /// Append a step record; total latency is the sum of recorded steps.
    pub fn record(&mut self, name: &str, elapsed: Duration, outcome: StepOutcome, detail: Option<String>) {
        let duration_ms = elapsed.as_millis() as u64;
        self.total_latency_ms += duration_ms;
        self.steps.push(StepRecord {
            name: name.to_string(),
            duration_ms,
            timestamp: Utc::now(),
            outcome,
            detail,
        });
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn add_cost(&mut self, usd: f64) {
        self.cost_estimate_usd += usd;
    }
}

/// One render job's full state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    pub id: JobId,
    pub request: RenderRequest,
    pub settings: JobSettings,
    pub status: JobStatus,
    pub brief: Option<JobBrief>,
    pub script: Option<Script>,
    pub shot_plan: Option<ShotPlan>,
    pub pitch_segments: Option<Vec<String>>,
    /// Acquired clips, positionally aligned with `shot_plan.scenes`.
    pub scenes: Vec<AcquiredScene>,
    pub final_path: Option<PathBuf>,
    pub published_url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub debug: DebugTrace,
}

impl RenderJob {
    pub fn new(request: RenderRequest, settings: JobSettings) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            request,
            settings,
            status: JobStatus::Queued,
            brief: None,
            script: None,
            shot_plan: None,
            pitch_segments: None,
            scenes: Vec::new(),
            final_path: None,
            published_url: None,
            error: None,
            created_at: now,
            updated_at: now,
            debug: DebugTrace::default(),
        }
    }

    /// Move to `next`, refusing anything the state machine forbids.
    pub fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition(JobStatus::Running)
    }

    pub fn complete(&mut self) -> Result<()> {
        self.transition(JobStatus::Ready)
    }

    pub fn fail(&mut self, error: &str) -> Result<()> {
        self.transition(JobStatus::Error)?;
        self.error = Some(error.to_string());
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Clip paths in scene order.
    pub fn scene_files(&self) -> Vec<PathBuf> {
        self.scenes.iter().map(|s| s.path.clone()).collect()
    }
}
