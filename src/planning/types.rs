use jobreel_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Structured form of a job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobBrief {
    pub title: String,
    /// One sentence on why the role matters.
    pub impact: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub seniority: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub remote_mode: Option<String>,
    #[serde(default)]
    pub cta_url: Option<String>,
}

impl JobBrief {
    /// Reject briefs without the two fields every later stage relies on.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("brief is missing a title"));
        }
        if self.impact.trim().is_empty() {
            return Err(Error::validation("brief is missing an impact statement"));
        }
        Ok(())
    }
}

/// Narrative plan for the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub hook: String,
    /// One narrative beat per scene.
    pub beats: Vec<String>,
    /// One short overlay line per scene.
    pub on_screen_text: Vec<String>,
    pub cta_text: String,
    #[serde(default)]
    pub cta_url: Option<String>,
    pub estimated_duration_secs: f64,
}

impl Script {
    /// Check that the script lines up with the requested scene count.
    pub fn validate(&self, scene_count: usize) -> Result<()> {
        if self.beats.len() != scene_count {
            return Err(Error::validation(format!(
                "script beats has {} entries, expected {}",
                self.beats.len(),
                scene_count
            )));
        }
        if self.on_screen_text.len() != scene_count {
            return Err(Error::validation(format!(
                "script on_screen_text has {} entries, expected {}",
                self.on_screen_text.len(),
                scene_count
            )));
        }
        if self.beats.iter().all(|b| b.trim().is_empty()) {
            return Err(Error::validation("script beats are all empty"));
        }
        Ok(())
    }
}

/// One planned visual segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Planned length in seconds.
    pub duration_secs: f64,
    /// What the clip should show; the prompt for generative engines.
    pub visual: String,
    pub overlay_text: String,
}

/// Where a shot plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Generated,
    Fallback,
}

/// Ordered scenes plus presentation parameters.
///
/// `scenes.len()` always equals the job's scene count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotPlan {
    pub aspect_ratio: String,
    pub music_mood: String,
    pub subtitle_style: String,
    pub scenes: Vec<Scene>,
    pub source: PlanSource,
}

impl ShotPlan {
    pub fn planned_duration(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration_secs).sum()
    }
}
