//! Shared test harness for integration tests.
//!
//! Provides scripted stand-ins for the language-model collaborators and the
//! generation service, plus [`TestHarness`] which wires them into a
//! [`RenderService`] whose work and output directories live in a temp dir.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobreel::acquisition::{GenerationRequest, GenerationStatus, VideoGenerator};
use jobreel::collab::{BriefExtractor, Collaborators, PitchWriter, ScriptWriter, ShotPlanner};
use jobreel::config::Config;
use jobreel::pipeline::{Orchestrator, RenderService};
use jobreel::planning::{JobBrief, Scene, Script};
use jobreel::publish::LocalPublisher;
use jobreel::server::{create_router, AppContext};
use jobreel::state::{InMemoryJobStore, RenderJob, SharedJobStore};
use jobreel_av::Toolchain;
use jobreel_common::{Error, JobId, Result, Tone};
use tempfile::TempDir;

/// Whether ffmpeg and ffprobe are on PATH.
pub fn media_tools_available() -> bool {
    which::which("ffmpeg").is_ok() && which::which("ffprobe").is_ok()
}

/// A toolchain whose binaries do not exist.
pub fn missing_toolchain() -> Toolchain {
    Toolchain {
        ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
        ffprobe: PathBuf::from("/nonexistent/ffprobe"),
    }
}

/// A toolchain whose ffmpeg is a shell script that writes a small file to
/// its last argument, and whose ffprobe does not exist. Scene synthesis
/// succeeds without real media tools; anything that probes fails.
#[cfg(unix)]
pub fn scripted_ffmpeg() -> (TempDir, Toolchain) {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let ffmpeg = dir.path().join("ffmpeg");
    std::fs::write(
        &ffmpeg,
        "#!/bin/sh\nfor last; do :; done\nprintf 'scripted clip' > \"$last\"\n",
    )
    .expect("failed to write ffmpeg script");
    std::fs::set_permissions(&ffmpeg, std::fs::Permissions::from_mode(0o755))
        .expect("failed to mark ffmpeg script executable");

    let toolchain = Toolchain {
        ffmpeg,
        ffprobe: PathBuf::from("/nonexistent/ffprobe"),
    };
    (dir, toolchain)
}

pub fn sample_brief() -> JobBrief {
    JobBrief {
        title: "Senior Backend Engineer".into(),
        impact: "Keep payouts flowing for two million merchants".into(),
        responsibilities: vec!["Own the ledger service".into()],
        requirements: vec!["Rust or Go in production".into()],
        benefits: vec!["Remote-first".into()],
        company: Some("Acme".into()),
        location: Some("Berlin".into()),
        seniority: Some("senior".into()),
        salary: None,
        remote_mode: Some("remote".into()),
        cta_url: Some("https://acme.io/jobs/42".into()),
    }
}

pub fn sample_script(beats: usize) -> Script {
    Script {
        hook: "Want your code to move money?".into(),
        beats: (0..beats).map(|i| format!("Beat {}", i + 1)).collect(),
        on_screen_text: (0..beats).map(|i| format!("Line {}", i + 1)).collect(),
        cta_text: "Apply now".into(),
        cta_url: Some("https://acme.io/jobs/42".into()),
        estimated_duration_secs: 8.0 * beats as f64,
    }
}

/// How the scripted planner answers the shot-plan call.
#[derive(Debug, Clone, Copy)]
pub enum ShotBehavior {
    /// One scene per requested scene.
    Exact,
    /// A fixed (wrong) number of scenes.
    Count(usize),
    Fail,
}

/// Scripted planner serving all four collaborator roles.
pub struct FakePlanner {
    pub brief: std::result::Result<JobBrief, String>,
    /// Beats returned by the script call; `None` means "as requested".
    pub script_beats: Option<usize>,
    pub shots: ShotBehavior,
    /// Pitch segments returned; `None` means "as requested".
    pub pitch_segments: Option<usize>,
    pub calls: AtomicU32,
}

impl Default for FakePlanner {
    fn default() -> Self {
        Self {
            brief: Ok(sample_brief()),
            script_beats: None,
            shots: ShotBehavior::Exact,
            pitch_segments: None,
            calls: AtomicU32::new(0),
        }
    }
}

impl FakePlanner {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BriefExtractor for FakePlanner {
    async fn extract(&self, _posting: &str, _locale: &str) -> Result<JobBrief> {
        self.tick();
        self.brief.clone().map_err(|e| Error::external("llm", e))
    }
}

#[async_trait]
impl ScriptWriter for FakePlanner {
    async fn write(
        &self,
        _brief: &JobBrief,
        _tone: Tone,
        _duration_secs: f64,
        scene_count: usize,
    ) -> Result<Script> {
        self.tick();
        Ok(sample_script(self.script_beats.unwrap_or(scene_count)))
    }
}

#[async_trait]
impl ShotPlanner for FakePlanner {
    async fn plan(
        &self,
        _script: &Script,
        _brief: &JobBrief,
        duration_secs: f64,
        _tone: Tone,
        scene_count: usize,
    ) -> Result<Vec<Scene>> {
        self.tick();
        let count = match self.shots {
            ShotBehavior::Exact => scene_count,
            ShotBehavior::Count(n) => n,
            ShotBehavior::Fail => return Err(Error::external("llm", "planner unavailable")),
        };
        Ok((0..count)
            .map(|i| Scene {
                duration_secs: duration_secs / scene_count as f64,
                visual: format!("Planned visual {}", i),
                overlay_text: format!("Planned overlay {}", i),
            })
            .collect())
    }
}

#[async_trait]
impl PitchWriter for FakePlanner {
    async fn pitch(&self, _brief: &JobBrief, _tone: Tone, scene_count: usize) -> Result<Vec<String>> {
        self.tick();
        let n = self.pitch_segments.unwrap_or(scene_count);
        Ok((0..n).map(|i| format!("Pitch {}", i + 1)).collect())
    }
}

/// Generation service that accepts work and then always reports failure.
#[derive(Default)]
pub struct FailingGenerator {
    pub submitted: AtomicU32,
}

#[async_trait]
impl VideoGenerator for FailingGenerator {
    async fn submit(&self, _request: &GenerationRequest) -> Result<String> {
        let n = self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(format!("op-{}", n))
    }

    async fn status(&self, _operation_id: &str) -> Result<GenerationStatus> {
        Err(Error::external("generation", "service unavailable"))
    }

    async fn download(&self, _uri: &str, _dest: &Path) -> Result<u64> {
        Err(Error::external("generation", "nothing to download"))
    }
}

/// Config rooted in `dir`, with fast polling and small scenes.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.work_dir = dir.join("work");
    config.storage.output_dir = dir.join("published");
    config.render.scene_seconds = 2;
    config.render.end_card_seconds = 1;
    config.generation.poll_interval_secs = 0;
    config.generation.max_poll_attempts = 2;
    config.generation.settle_millis = 0;
    config
}

/// A render service wired to scripted collaborators.
pub struct TestHarness {
    pub service: RenderService,
    pub store: SharedJobStore,
    pub planner: Arc<FakePlanner>,
    pub config: Arc<Config>,
    pub dir: TempDir,
}

pub struct HarnessBuilder {
    planner: FakePlanner,
    generator: Option<Arc<dyn VideoGenerator>>,
    toolchain: Option<Toolchain>,
    configure: Option<Box<dyn FnOnce(&mut Config)>>,
}

impl HarnessBuilder {
    pub fn planner(mut self, planner: FakePlanner) -> Self {
        self.planner = planner;
        self
    }

    pub fn generator(mut self, generator: Arc<dyn VideoGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    pub fn configure(mut self, f: impl FnOnce(&mut Config) + 'static) -> Self {
        self.configure = Some(Box::new(f));
        self
    }

    pub fn build(self) -> TestHarness {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = test_config(dir.path());
        if let Some(f) = self.configure {
            f(&mut config);
        }
        let config = Arc::new(config);

        let planner = Arc::new(self.planner);
        let collaborators = Collaborators {
            briefs: planner.clone(),
            scripts: planner.clone(),
            shots: planner.clone(),
            pitches: planner.clone(),
        };
        let toolchain = self
            .toolchain
            .unwrap_or_else(|| Toolchain::resolve(None, None).unwrap_or_default());
        let store = InMemoryJobStore::shared();
        let orchestrator = Orchestrator::new(
            config.clone(),
            store.clone(),
            collaborators,
            Arc::new(LocalPublisher::new(config.storage.output_dir.clone())),
            toolchain,
        )
        .with_generator(self.generator);

        TestHarness {
            service: RenderService::new(orchestrator),
            store,
            planner,
            config,
            dir,
        }
    }
}

impl TestHarness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            planner: FakePlanner::default(),
            generator: None,
            toolchain: None,
            configure: None,
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn app_context(&self) -> AppContext {
        AppContext {
            config: self.config.clone(),
            service: self.service.clone(),
        }
    }

    /// Start an Axum server on a random port.
    pub async fn serve(&self) -> SocketAddr {
        let app = create_router(self.app_context());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        addr
    }

    /// Poll the store until the job reaches a terminal status.
    pub async fn wait_terminal(&self, id: JobId) -> RenderJob {
        for _ in 0..600 {
            if let Some(job) = self.store.get(id) {
                if job.status.is_terminal() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("job {} did not finish in time", id);
    }
}
