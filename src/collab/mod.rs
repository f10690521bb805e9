//! External planning collaborators.
//!
//! Each stage that asks a language model for structured output goes through
//! one of these traits. The orchestrator only ever sees validated values or
//! an error; transport failures are [`Error::External`] and malformed
//! responses are [`Error::Validation`].
//!
//! [`Error::External`]: jobreel_common::Error::External
//! [`Error::Validation`]: jobreel_common::Error::Validation

mod llm;
mod planner;

pub use llm::{ChatMessage, LlmClient};
pub use planner::LlmPlanner;

use crate::planning::{JobBrief, Scene, Script};
use async_trait::async_trait;
use jobreel_common::{Result, Tone};
use std::sync::Arc;

/// Turns a free-text posting into a structured brief.
#[async_trait]
pub trait BriefExtractor: Send + Sync {
    async fn extract(&self, posting: &str, locale: &str) -> Result<JobBrief>;
}

/// Writes the narrative script.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    /// The returned script may still mismatch `scene_count`; the caller
    /// validates it.
    async fn write(
        &self,
        brief: &JobBrief,
        tone: Tone,
        duration_secs: f64,
        scene_count: usize,
    ) -> Result<Script>;
}

/// Proposes one scene per beat.
#[async_trait]
pub trait ShotPlanner: Send + Sync {
    async fn plan(
        &self,
        script: &Script,
        brief: &JobBrief,
        duration_secs: f64,
        tone: Tone,
        scene_count: usize,
    ) -> Result<Vec<Scene>>;
}

/// Writes one short caption line per scene.
#[async_trait]
pub trait PitchWriter: Send + Sync {
    async fn pitch(&self, brief: &JobBrief, tone: Tone, scene_count: usize) -> Result<Vec<String>>;
}

/// The planning collaborators a pipeline run uses.
#[derive(Clone)]
pub struct Collaborators {
    pub briefs: Arc<dyn BriefExtractor>,
    pub scripts: Arc<dyn ScriptWriter>,
    pub shots: Arc<dyn ShotPlanner>,
    pub pitches: Arc<dyn PitchWriter>,
}

impl Collaborators {
    /// All four roles served by one language-model planner.
    pub fn from_llm(planner: LlmPlanner) -> Self {
        let planner = Arc::new(planner);
        Self {
            briefs: planner.clone(),
            scripts: planner.clone(),
            shots: planner.clone(),
            pitches: planner,
        }
    }
}
