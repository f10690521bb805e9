//! Drives one job through every stage.

use super::captions::caption_texts;
use super::stage::{Stage, StagePolicy, StageReport, STAGES};
use crate::acquisition::{GenerativeSettings, SceneAcquisition, SceneEngine, TemplateEngine, VideoGenerator};
use crate::collab::Collaborators;
use crate::config::Config;
use crate::planning::{fallback_plan, subtitle_style, PlanSource, ShotPlan, ASPECT_RATIO};
use crate::publish::Publisher;
use crate::quality::{QcTarget, QualityValidator};
use crate::state::{RenderJob, SharedJobStore, StepOutcome};
use jobreel_av::compose::build_cues;
use jobreel_av::{Artifacts, CaptionStyle, Compositor, ConcatOutput, EndCard, Toolchain};
use jobreel_common::{Error, JobId, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Per-run state that does not belong on the job record.
struct RunContext {
    artifacts: Artifacts,
    compositor: Compositor,
    acquisition: SceneAcquisition,
    concat: Option<ConcatOutput>,
    overlays: Option<PathBuf>,
}

fn require<'a, T: ?Sized>(value: Option<&'a T>, what: &str) -> Result<&'a T> {
    value.ok_or_else(|| Error::internal(format!("{} missing before it was needed", what)))
}

/// Whether `stage` absorbs `err` instead of failing the job.
fn absorbs(stage: Stage, err: &Error) -> bool {
    match stage.policy() {
        StagePolicy::Fatal => false,
        StagePolicy::Degradable => !err.is_fatal(),
        StagePolicy::Advisory => true,
    }
}

/// Runs the ordered stages for a job, saving a snapshot after each.
pub struct Orchestrator {
    config: Arc<Config>,
    store: SharedJobStore,
    collaborators: Collaborators,
    publisher: Arc<dyn Publisher>,
    generator: Option<Arc<dyn VideoGenerator>>,
    toolchain: Toolchain,
    validator: QualityValidator,
}

impl Orchestrator {
    pub fn new(
        config: Arc<Config>,
        store: SharedJobStore,
        collaborators: Collaborators,
        publisher: Arc<dyn Publisher>,
        toolchain: Toolchain,
    ) -> Self {
        let validator = QualityValidator::new(toolchain.clone(), config.quality.clone());
        Self {
            config,
            store,
            collaborators,
            publisher,
            generator: None,
            toolchain,
            validator,
        }
    }

    /// Service used by the generative engine. Without one, generative jobs
    /// render template clips.
    pub fn with_generator(mut self, generator: Option<Arc<dyn VideoGenerator>>) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn store(&self) -> &SharedJobStore {
        &self.store
    }

    fn context(&self, job: &RenderJob) -> RunContext {
        let compositor = Compositor::new(self.toolchain.clone(), self.config.render.settings());
        let template = TemplateEngine::new(
            compositor.clone(),
            job.settings.primary,
            job.settings.secondary,
        );
        let engine = SceneEngine::select(
            job.settings.engine,
            template,
            self.generator.clone(),
            GenerativeSettings::from(&self.config.generation),
        );
        RunContext {
            artifacts: Artifacts::new(&self.config.work_dir, job.id),
            compositor,
            acquisition: SceneAcquisition::new(engine, job.settings.reuse_existing_clips),
            concat: None,
            overlays: None,
        }
    }

    /// Run a queued job to a terminal state and return the final record.
    ///
    /// Stage failures end in `ERROR` on the returned record; `Err` is only
    /// returned when the job cannot be loaded or saved.
    pub async fn run(&self, id: JobId) -> Result<RenderJob> {
        let mut job = self
            .store
            .get(id)
            .ok_or_else(|| Error::not_found(id.to_string()))?;
        job.start()?;
        self.store.save(&job)?;
        info!(
            job_id = %id,
            engine = %job.settings.engine,
            scenes = job.settings.scene_count,
            "Render started"
        );

        let mut ctx = self.context(&job);
        for stage in STAGES {
            let started = Instant::now();
            let result = self.execute(stage, &mut job, &mut ctx).await;
            let elapsed = started.elapsed();

            match result {
                Ok(report) => {
                    info!(job_id = %id, stage = %stage, elapsed_ms = elapsed.as_millis() as u64, "Stage finished");
                    job.debug.record(stage.name(), elapsed, report.outcome, report.detail);
                }
                Err(e) if absorbs(stage, &e) => {
                    warn!(job_id = %id, stage = %stage, "Stage degraded: {}", e);
                    job.debug.warn(format!("{}: {}", stage, e));
                    job.debug.record(stage.name(), elapsed, StepOutcome::Degraded, Some(e.to_string()));
                }
                Err(e) => {
                    error!(job_id = %id, stage = %stage, "Stage failed: {}", e);
                    job.debug.record(stage.name(), elapsed, StepOutcome::Failed, Some(e.to_string()));
                    job.fail(&format!("{} failed: {}", stage, e))?;
                    self.store.save(&job)?;
                    return Ok(job);
                }
            }
            job.touch();
            self.store.save(&job)?;
        }

        job.complete()?;
        self.store.save(&job)?;
        info!(
            job_id = %id,
            latency_ms = job.debug.total_latency_ms,
            cost_usd = job.debug.cost_estimate_usd,
            "Render ready"
        );
        Ok(job)
    }

    async fn execute(&self, stage: Stage, job: &mut RenderJob, ctx: &mut RunContext) -> Result<StageReport> {
        match stage {
            Stage::Parse => self.parse(job).await,
            Stage::Pitch => self.pitch(job).await,
            Stage::Script => self.script(job).await,
            Stage::ShotPlan => self.shot_plan(job).await,
            Stage::Scenes => self.scenes(job, ctx).await,
            Stage::NormalizeConcat => self.normalize_concat(job, ctx).await,
            Stage::Overlay => self.overlay(job, ctx).await,
            Stage::EndCard => self.end_card(job, ctx).await,
            Stage::QualityCheck => self.quality_check(job).await,
            Stage::Publish => self.publish(job).await,
        }
    }

    fn charge_llm_call(&self, job: &mut RenderJob) {
        job.debug.add_cost(self.config.llm.cost_per_call_usd);
    }

    async fn parse(&self, job: &mut RenderJob) -> Result<StageReport> {
        let result = self
            .collaborators
            .briefs
            .extract(&job.request.posting, &job.settings.locale)
            .await;
        self.charge_llm_call(job);
        let brief = result?;
        brief.validate()?;
        let detail = brief.title.clone();
        job.brief = Some(brief);
        Ok(StageReport::ok_with(detail))
    }

    async fn pitch(&self, job: &mut RenderJob) -> Result<StageReport> {
        if !job.settings.enrich_pitch {
            return Ok(StageReport::skipped("not requested"));
        }
        let count = job.settings.scene_count;
        let result = {
            let brief = require(job.brief.as_ref(), "brief")?;
            self.collaborators
                .pitches
                .pitch(brief, job.settings.tone, count)
                .await
        };
        self.charge_llm_call(job);

        let segments = result.map_err(|e| Error::degraded("pitch", e.to_string()))?;
        if segments.len() != count {
            return Err(Error::degraded(
                "pitch",
                format!("pitch returned {} segments, expected {}", segments.len(), count),
            ));
        }
        job.pitch_segments = Some(segments);
        Ok(StageReport::ok_with(format!("{} segments", count)))
    }

    async fn script(&self, job: &mut RenderJob) -> Result<StageReport> {
        let count = job.settings.scene_count;
        let result = {
            let brief = require(job.brief.as_ref(), "brief")?;
            self.collaborators
                .scripts
                .write(brief, job.settings.tone, job.settings.total_secs, count)
                .await
        };
        self.charge_llm_call(job);
        let script = result?;
        script.validate(count)?;
        job.script = Some(script);
        Ok(StageReport::ok_with(format!("{} beats", count)))
    }

    /// Never fails: a planner error or a wrong scene count falls back to the
    /// local template plan.
    async fn shot_plan(&self, job: &mut RenderJob) -> Result<StageReport> {
        let settings = job.settings.clone();
        let count = settings.scene_count;
        let brief = require(job.brief.as_ref(), "brief")?;
        let script = require(job.script.as_ref(), "script")?;

        let result = self
            .collaborators
            .shots
            .plan(script, brief, settings.total_secs, settings.tone, count)
            .await;
        let fallback_reason = match result {
            Ok(scenes) if scenes.len() == count => {
                job.shot_plan = Some(ShotPlan {
                    aspect_ratio: ASPECT_RATIO.to_string(),
                    music_mood: settings.tone.music_mood().to_string(),
                    subtitle_style: subtitle_style(settings.tone).to_string(),
                    scenes,
                    source: PlanSource::Generated,
                });
                None
            }
            Ok(scenes) => Some(format!(
                "planner returned {} scenes, expected {}",
                scenes.len(),
                count
            )),
            Err(e) => Some(e.to_string()),
        };

        let report = match fallback_reason {
            None => StageReport::ok_with(format!("{} scenes", count)),
            Some(reason) => {
                let plan = fallback_plan(brief, script, settings.tone, settings.total_secs, count);
                warn!(job_id = %job.id, "Shot plan fell back to templates: {}", reason);
                job.shot_plan = Some(plan);
                job.debug.warn(format!("shot_plan: fallback used ({})", reason));
                StageReport::degraded(reason)
            }
        };
        self.charge_llm_call(job);
        Ok(report)
    }

    async fn scenes(&self, job: &mut RenderJob, ctx: &mut RunContext) -> Result<StageReport> {
        ctx.artifacts.ensure_dir().await?;
        let plan = require(job.shot_plan.as_ref(), "shot plan")?;
        let scenes = ctx.acquisition.acquire_all(&plan.scenes, &ctx.artifacts).await?;

        let billed: f64 = scenes.iter().map(|s| s.billed_generation_secs).sum();
        job.debug
            .add_cost(billed * self.config.generation.cost_per_second_usd);

        let total = scenes.len();
        let mut fallbacks = 0;
        for scene in scenes.iter().filter(|s| s.is_fallback()) {
            fallbacks += 1;
            job.debug.warn(format!(
                "scene {}: template fallback ({})",
                scene.index,
                scene.note.as_deref().unwrap_or("unknown reason")
            ));
        }
        job.scenes = scenes;

        let engine = ctx.acquisition.engine().kind();
        Ok(if fallbacks > 0 {
            StageReport::degraded(format!("{} of {} scenes fell back to template", fallbacks, total))
        } else {
            StageReport::ok_with(format!("{} clips via {}", total, engine))
        })
    }

    async fn normalize_concat(&self, job: &mut RenderJob, ctx: &mut RunContext) -> Result<StageReport> {
        let clips = job.scene_files();
        let concat = ctx.compositor.normalize_and_concat(&ctx.artifacts, &clips).await?;
        let detail = format!("{:.2}s across {} clips", concat.total_duration(), clips.len());
        ctx.concat = Some(concat);
        Ok(StageReport::ok_with(detail))
    }

    async fn overlay(&self, job: &mut RenderJob, ctx: &mut RunContext) -> Result<StageReport> {
        let render = &self.config.render;
        let concat = require(ctx.concat.as_ref(), "concat output")?;
        let plan = require(job.shot_plan.as_ref(), "shot plan")?;

        let texts = caption_texts(
            plan,
            job.script.as_ref(),
            job.pitch_segments.as_deref(),
            render.caption_max_chars,
        );
        let cues = build_cues(&concat.durations, &texts)?;
        let style = CaptionStyle::new(
            render.caption_font.clone(),
            render.caption_font_size,
            job.settings.primary,
            render.caption_alpha,
        )
        .with_frame(render.width, render.height);

        let path = ctx
            .compositor
            .burn_captions(&ctx.artifacts, &concat.path, &cues, &style)
            .await?;
        ctx.overlays = Some(path);
        Ok(StageReport::ok_with(format!("{} cues", cues.len())))
    }

    async fn end_card(&self, job: &mut RenderJob, ctx: &mut RunContext) -> Result<StageReport> {
        let render = &self.config.render;
        let overlays = require(ctx.overlays.as_deref(), "overlay output")?;

        let cta_url = job
            .script
            .as_ref()
            .and_then(|s| s.cta_url.clone())
            .or_else(|| job.brief.as_ref().and_then(|b| b.cta_url.clone()));
        let card = EndCard {
            cta_text: render.cta_text.clone(),
            cta_url,
            background: job.settings.primary,
            seconds: f64::from(render.end_card_seconds),
            font: render.caption_font.clone(),
            font_file: render.font_file.clone(),
            font_size: render.caption_font_size,
        };

        let final_path = ctx
            .compositor
            .append_end_card(&ctx.artifacts, overlays, &card)
            .await?;
        job.final_path = Some(final_path);
        Ok(StageReport::ok())
    }

    /// Never fails the job; findings become warnings.
    async fn quality_check(&self, job: &mut RenderJob) -> Result<StageReport> {
        let render = &self.config.render;
        let final_path = require(job.final_path.as_deref(), "final asset")?;
        let target = QcTarget {
            duration_secs: job.settings.total_secs + f64::from(render.end_card_seconds),
            width: render.width,
            height: render.height,
        };

        let report = self
            .validator
            .check(final_path, &target, job.settings.primary)
            .await;
        for issue in &report.issues {
            warn!(job_id = %job.id, "QC issue: {}", issue.message);
            job.debug.warn(format!("qc: {}", issue.message));
        }
        if let Some(contrast) = report.contrast.filter(|c| !c.passes) {
            job.debug.warn(format!(
                "qc: caption contrast {:.2}:1 on {} is below threshold",
                contrast.ratio, contrast.background
            ));
        }

        let verdict = report.verdict();
        job.debug.qc = Some(report);
        verdict.map(StageReport::ok_with)
    }

    async fn publish(&self, job: &mut RenderJob) -> Result<StageReport> {
        let final_path = require(job.final_path.as_deref(), "final asset")?;
        let url = self.publisher.publish(job.id, final_path).await?;
        job.published_url = Some(url.clone());
        Ok(StageReport::ok_with(url))
    }
}
