//! Language-model backed planning collaborators.

use super::llm::{ChatMessage, LlmClient};
use super::{BriefExtractor, PitchWriter, ScriptWriter, ShotPlanner};
use crate::planning::{JobBrief, Scene, Script};
use async_trait::async_trait;
use jobreel_common::{Error, Result, Tone};
use serde::Deserialize;

const BRIEF_SYSTEM: &str = "You extract structured facts from job postings. Reply with one JSON \
object with keys: title, impact, responsibilities (array), requirements (array), benefits \
(array), company, location, seniority, salary, remote_mode, cta_url. Use null for unknown values.";

const SCRIPT_SYSTEM: &str = "You write short vertical recruiting video scripts. Reply with one \
JSON object with keys: hook, beats (array, exactly one per scene), on_screen_text (array, \
exactly one short line per scene, at most six words each), cta_text, cta_url, \
estimated_duration_secs.";

const SHOTS_SYSTEM: &str = "You plan shots for vertical recruiting videos. Reply with one JSON \
object with key scenes: an array with exactly one entry per beat, each with keys \
duration_secs, visual (a concrete camera-ready description, no text on screen) and \
overlay_text.";

const PITCH_SYSTEM: &str = "You write punchy caption lines for recruiting videos. Reply with one \
JSON object with key segments: an array with exactly one caption per scene, at most ten \
words each.";

// ---------------------------------------------------------------------------
// Raw response shapes (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBrief {
    title: Option<String>,
    impact: Option<String>,
    responsibilities: Option<Vec<String>>,
    requirements: Option<Vec<String>>,
    benefits: Option<Vec<String>>,
    company: Option<String>,
    location: Option<String>,
    seniority: Option<String>,
    salary: Option<String>,
    remote_mode: Option<String>,
    cta_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawScript {
    hook: Option<String>,
    beats: Option<Vec<String>>,
    on_screen_text: Option<Vec<String>>,
    cta_text: Option<String>,
    cta_url: Option<String>,
    #[serde(alias = "estimated_duration")]
    estimated_duration_secs: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawShotPlan {
    scenes: Option<Vec<RawScene>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawScene {
    #[serde(alias = "duration")]
    duration_secs: Option<f64>,
    #[serde(alias = "description")]
    visual: Option<String>,
    overlay_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPitch {
    segments: Option<Vec<String>>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn clean_list(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl TryFrom<RawBrief> for JobBrief {
    type Error = Error;

    fn try_from(raw: RawBrief) -> Result<Self> {
        let brief = JobBrief {
            title: non_empty(raw.title).ok_or_else(|| Error::validation("brief is missing a title"))?,
            impact: non_empty(raw.impact)
                .ok_or_else(|| Error::validation("brief is missing an impact statement"))?,
            responsibilities: clean_list(raw.responsibilities),
            requirements: clean_list(raw.requirements),
            benefits: clean_list(raw.benefits),
            company: non_empty(raw.company),
            location: non_empty(raw.location),
            seniority: non_empty(raw.seniority),
            salary: non_empty(raw.salary),
            remote_mode: non_empty(raw.remote_mode),
            cta_url: non_empty(raw.cta_url),
        };
        brief.validate()?;
        Ok(brief)
    }
}

impl TryFrom<RawScript> for Script {
    type Error = Error;

    /// Array lengths are checked against the scene count by the caller.
    fn try_from(raw: RawScript) -> Result<Self> {
        let beats = raw
            .beats
            .ok_or_else(|| Error::validation("script is missing beats"))?;
        let on_screen_text = raw
            .on_screen_text
            .ok_or_else(|| Error::validation("script is missing on_screen_text"))?;
        Ok(Script {
            hook: non_empty(raw.hook).ok_or_else(|| Error::validation("script is missing a hook"))?,
            beats: beats.into_iter().map(|b| b.trim().to_string()).collect(),
            on_screen_text: on_screen_text.into_iter().map(|t| t.trim().to_string()).collect(),
            cta_text: non_empty(raw.cta_text).unwrap_or_default(),
            cta_url: non_empty(raw.cta_url),
            estimated_duration_secs: raw.estimated_duration_secs.unwrap_or(0.0),
        })
    }
}

fn scenes_from_raw(raw: RawShotPlan, default_secs: f64) -> Result<Vec<Scene>> {
    raw.scenes
        .ok_or_else(|| Error::validation("shot plan is missing scenes"))?
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let visual = non_empty(s.visual)
                .ok_or_else(|| Error::validation(format!("shot plan scene {} has no visual", i)))?;
            Ok(Scene {
                duration_secs: s
                    .duration_secs
                    .filter(|d| d.is_finite() && *d > 0.0)
                    .unwrap_or(default_secs),
                visual,
                overlay_text: non_empty(s.overlay_text).unwrap_or_default(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Serves every planning role from one chat completions client.
#[derive(Debug, Clone)]
pub struct LlmPlanner {
    client: LlmClient,
}

impl LlmPlanner {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

fn brief_context(brief: &JobBrief) -> String {
    serde_json::to_string(brief).unwrap_or_else(|_| brief.title.clone())
}

#[async_trait]
impl BriefExtractor for LlmPlanner {
    async fn extract(&self, posting: &str, locale: &str) -> Result<JobBrief> {
        let messages = [
            ChatMessage::system(BRIEF_SYSTEM),
            ChatMessage::user(format!("Locale: {}\n\nJob posting:\n{}", locale, posting.trim())),
        ];
        let raw: RawBrief = self.client.complete_json(&messages).await?;
        JobBrief::try_from(raw)
    }
}

#[async_trait]
impl ScriptWriter for LlmPlanner {
    async fn write(
        &self,
        brief: &JobBrief,
        tone: Tone,
        duration_secs: f64,
        scene_count: usize,
    ) -> Result<Script> {
        let messages = [
            ChatMessage::system(SCRIPT_SYSTEM),
            ChatMessage::user(format!(
                "Tone: {}\nTotal duration: {:.0} seconds\nScenes: {}\nBrief: {}",
                tone,
                duration_secs,
                scene_count,
                brief_context(brief)
            )),
        ];
        let raw: RawScript = self.client.complete_json(&messages).await?;
        Script::try_from(raw)
    }
}

#[async_trait]
impl ShotPlanner for LlmPlanner {
    async fn plan(
        &self,
        script: &Script,
        brief: &JobBrief,
        duration_secs: f64,
        tone: Tone,
        scene_count: usize,
    ) -> Result<Vec<Scene>> {
        let beats = script
            .beats
            .iter()
            .enumerate()
            .map(|(i, b)| format!("{}. {}", i + 1, b))
            .collect::<Vec<_>>()
            .join("\n");
        let messages = [
            ChatMessage::system(SHOTS_SYSTEM),
            ChatMessage::user(format!(
                "Tone: {}\nTotal duration: {:.0} seconds\nScenes: {}\nRole: {}\nBeats:\n{}",
                tone, duration_secs, scene_count, brief.title, beats
            )),
        ];
        let raw: RawShotPlan = self.client.complete_json(&messages).await?;
        scenes_from_raw(raw, duration_secs / scene_count.max(1) as f64)
    }
}

#[async_trait]
impl PitchWriter for LlmPlanner {
    async fn pitch(&self, brief: &JobBrief, tone: Tone, scene_count: usize) -> Result<Vec<String>> {
        let messages = [
            ChatMessage::system(PITCH_SYSTEM),
            ChatMessage::user(format!(
                "Tone: {}\nScenes: {}\nBrief: {}",
                tone,
                scene_count,
                brief_context(brief)
            )),
        ];
        let raw: RawPitch = self.client.complete_json(&messages).await?;
        // Positions are kept: segment i captions scene i, and a blank slot
        // falls through to the next caption source.
        let segments: Vec<String> = raw
            .segments
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.trim().to_string())
            .collect();
        if segments.iter().all(|s| s.is_empty()) {
            return Err(Error::validation("pitch returned no segments"));
        }
        Ok(segments)
    }
}
