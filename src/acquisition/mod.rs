//! Scene acquisition.
//!
//! Every planned scene is turned into one media clip by a [`SceneEngine`],
//! picked once per job from the request's engine identifier. Only the
//! template engine talks to nothing but the local ffmpeg; the generative
//! engine falls back to it for any scene it cannot deliver, so acquisition
//! as a whole fails only when ffmpeg itself does.

mod generator;
mod poll;

pub use generator::{
    GenerationFailure, GenerationRequest, GenerationStatus, HttpVideoGenerator, VideoGenerator,
};
pub use poll::{poll_until, PollError, PollPolicy};

use crate::config::GenerationConfig;
use crate::planning::{Scene, ASPECT_RATIO};
use jobreel_av::{find_reusable_scene, Artifacts, Compositor};
use jobreel_common::{EngineKind, Error, HexColor, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where a scene clip came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipOrigin {
    Template,
    Generative,
    /// Picked up from an earlier run's work directory.
    Reused,
    /// The generative engine failed and the template engine stood in.
    TemplateFallback,
}

/// One acquired clip, positionally aligned with its planned scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquiredScene {
    pub index: usize,
    pub path: PathBuf,
    pub origin: ClipOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Seconds submitted to the generation service, billed whether or not
    /// the clip was usable.
    #[serde(default)]
    pub billed_generation_secs: f64,
}

impl AcquiredScene {
    fn new(index: usize, path: PathBuf, origin: ClipOrigin) -> Self {
        Self {
            index,
            path,
            origin,
            note: None,
            billed_generation_secs: 0.0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == ClipOrigin::TemplateFallback
    }
}

/// Synthesizes branded gradient clips locally.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    compositor: Compositor,
    primary: HexColor,
    secondary: HexColor,
}

impl TemplateEngine {
    pub fn new(compositor: Compositor, primary: HexColor, secondary: HexColor) -> Self {
        Self {
            compositor,
            primary,
            secondary,
        }
    }

    async fn render(&self, scene: &Scene, output: &Path) -> Result<()> {
        self.compositor
            .synthesize_gradient(output, scene.duration_secs, self.primary, self.secondary)
            .await?;
        Ok(())
    }

    pub async fn acquire(&self, scene: &Scene, artifacts: &Artifacts, index: usize) -> Result<AcquiredScene> {
        self.render(scene, &artifacts.scene_partial(index)).await?;
        let path = artifacts.commit_scene(index).await?;
        Ok(AcquiredScene::new(index, path, ClipOrigin::Template))
    }
}

/// Polling and validation knobs for the generative engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerativeSettings {
    pub policy: PollPolicy,
    pub min_clip_bytes: u64,
    pub settle: Duration,
}

impl From<&GenerationConfig> for GenerativeSettings {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            policy: PollPolicy::new(
                Duration::from_secs(config.poll_interval_secs),
                config.max_poll_attempts,
            ),
            min_clip_bytes: config.min_clip_bytes,
            settle: Duration::from_millis(config.settle_millis),
        }
    }
}

/// Asks a long-running generation service for each clip, falling back to
/// the template engine on any failure.
#[derive(Clone)]
pub struct GenerativeEngine {
    template: TemplateEngine,
    generator: Option<Arc<dyn VideoGenerator>>,
    settings: GenerativeSettings,
}

impl GenerativeEngine {
    pub fn new(
        template: TemplateEngine,
        generator: Option<Arc<dyn VideoGenerator>>,
        settings: GenerativeSettings,
    ) -> Self {
        Self {
            template,
            generator,
            settings,
        }
    }

    pub async fn acquire(&self, scene: &Scene, artifacts: &Artifacts, index: usize) -> Result<AcquiredScene> {
        let Some(generator) = &self.generator else {
            return self
                .fall_back(scene, artifacts, index, "no generation service configured".to_string(), 0.0)
                .await;
        };

        let billed = scene.duration_secs;
        let partial = artifacts.scene_partial(index);
        match self.generate(generator.as_ref(), scene, &partial).await {
            Ok(bytes) => {
                info!(scene = index, bytes, "Generated scene clip");
                let output = artifacts.commit_scene(index).await?;
                let mut acquired = AcquiredScene::new(index, output, ClipOrigin::Generative);
                acquired.billed_generation_secs = billed;
                Ok(acquired)
            }
            Err(e) => self.fall_back(scene, artifacts, index, e.to_string(), billed).await,
        }
    }

    async fn fall_back(
        &self,
        scene: &Scene,
        artifacts: &Artifacts,
        index: usize,
        reason: String,
        billed: f64,
    ) -> Result<AcquiredScene> {
        warn!(scene = index, reason = %reason, "Generation failed, using template clip");
        let mut acquired = self.template.acquire(scene, artifacts, index).await?;
        acquired.origin = ClipOrigin::TemplateFallback;
        acquired.note = Some(reason);
        acquired.billed_generation_secs = billed;
        Ok(acquired)
    }

    /// Submit, poll, download and validate one clip. Every failure is
    /// reported as degradable.
    async fn generate(&self, generator: &dyn VideoGenerator, scene: &Scene, output: &Path) -> Result<u64> {
        let degraded = |message: String| Error::degraded("scene_acquisition", message);

        let request = GenerationRequest {
            prompt: scene.visual.clone(),
            duration_seconds: scene.duration_secs.round().max(1.0) as u32,
            aspect_ratio: ASPECT_RATIO.to_string(),
        };
        let operation = generator
            .submit(&request)
            .await
            .map_err(|e| degraded(format!("submit failed: {}", e)))?;
        debug!(operation = %operation, "Generation submitted");

        let status = poll_until(
            self.settings.policy,
            |_| generator.status(&operation),
            |status: &GenerationStatus| status.done,
        )
        .await
        .map_err(|e| degraded(format!("polling {} failed: {}", operation, e)))?;

        if let Some(failure) = status.error {
            return Err(degraded(format!("generation error: {}", failure.message)));
        }
        let uri = status
            .video_uri
            .ok_or_else(|| degraded("generation finished without a video uri".to_string()))?;

        generator
            .download(&uri, output)
            .await
            .map_err(|e| degraded(format!("download failed: {}", e)))?;
        tokio::time::sleep(self.settings.settle).await;

        self.validate(output).await.map_err(|e| degraded(e.to_string()))
    }

    /// Reject undersized files and anything ffprobe cannot read as video.
    async fn validate(&self, path: &Path) -> Result<u64> {
        let size = tokio::fs::metadata(path).await?.len();
        if size < self.settings.min_clip_bytes {
            return Err(Error::validation(format!(
                "clip is {} bytes, below the {} byte minimum",
                size, self.settings.min_clip_bytes
            )));
        }
        let info = jobreel_av::probe(self.template.compositor.toolchain(), path).await?;
        if info.primary_video().is_none() {
            return Err(Error::validation("clip has no video stream"));
        }
        Ok(size)
    }
}

/// The closed set of acquisition strategies.
#[derive(Clone)]
pub enum SceneEngine {
    Template(TemplateEngine),
    Generative(GenerativeEngine),
    /// Placeholder for a further external engine; renders template clips.
    Stub(TemplateEngine),
}

impl SceneEngine {
    pub fn select(
        kind: EngineKind,
        template: TemplateEngine,
        generator: Option<Arc<dyn VideoGenerator>>,
        settings: GenerativeSettings,
    ) -> Self {
        match kind {
            EngineKind::Template => Self::Template(template),
            EngineKind::Generative => {
                Self::Generative(GenerativeEngine::new(template, generator, settings))
            }
            EngineKind::Stub => Self::Stub(template),
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            Self::Template(_) => EngineKind::Template,
            Self::Generative(_) => EngineKind::Generative,
            Self::Stub(_) => EngineKind::Stub,
        }
    }

    pub async fn acquire(&self, scene: &Scene, artifacts: &Artifacts, index: usize) -> Result<AcquiredScene> {
        match self {
            Self::Template(engine) | Self::Stub(engine) => engine.acquire(scene, artifacts, index).await,
            Self::Generative(engine) => engine.acquire(scene, artifacts, index).await,
        }
    }
}

/// A job's engine plus its reuse-existing-clips switch.
#[derive(Clone)]
pub struct SceneAcquisition {
    engine: SceneEngine,
    reuse_existing: bool,
}

impl SceneAcquisition {
    pub fn new(engine: SceneEngine, reuse_existing: bool) -> Self {
        Self {
            engine,
            reuse_existing,
        }
    }

    pub fn engine(&self) -> &SceneEngine {
        &self.engine
    }

    /// Acquire the clip for scene `index`, preferring an existing raw clip
    /// from the work directory in reuse mode.
    pub async fn acquire(&self, scene: &Scene, artifacts: &Artifacts, index: usize) -> Result<AcquiredScene> {
        if self.reuse_existing {
            if let Some(path) = find_reusable_scene(artifacts.work_dir(), index).await? {
                info!(scene = index, path = %path.display(), "Reusing existing clip");
                return Ok(AcquiredScene::new(index, path, ClipOrigin::Reused));
            }
        }
        self.engine.acquire(scene, artifacts, index).await
    }

    /// Acquire every scene in order.
    pub async fn acquire_all(&self, scenes: &[Scene], artifacts: &Artifacts) -> Result<Vec<AcquiredScene>> {
        let mut acquired = Vec::with_capacity(scenes.len());
        for (index, scene) in scenes.iter().enumerate() {
            acquired.push(self.acquire(scene, artifacts, index).await?);
        }
        Ok(acquired)
    }
}
