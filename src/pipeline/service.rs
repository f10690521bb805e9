use super::Orchestrator;
use crate::acquisition::{HttpVideoGenerator, VideoGenerator};
use crate::collab::{Collaborators, LlmClient, LlmPlanner};
use crate::config::Config;
use crate::publish::LocalPublisher;
use crate::state::{RenderJob, RenderRequest, SharedJobStore};
use jobreel_av::Toolchain;
use jobreel_common::{JobId, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Accepts render requests and runs them in the background.
#[derive(Clone)]
pub struct RenderService {
    orchestrator: Arc<Orchestrator>,
}

impl RenderService {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(config: Arc<Config>, store: SharedJobStore) -> Result<Self> {
        let planner = LlmPlanner::new(LlmClient::new(&config.llm)?);
        let generator = HttpVideoGenerator::from_config(&config.generation)?
            .map(|g| Arc::new(g) as Arc<dyn VideoGenerator>);
        if generator.is_none() {
            info!("No generation service configured; generative jobs will use template clips");
        }

        let toolchain = Toolchain::resolve(
            config.tools.ffmpeg_path.as_deref(),
            config.tools.ffprobe_path.as_deref(),
        )
        .unwrap_or_else(|e| {
            warn!("{}; deferring tool lookup to spawn time", e);
            Toolchain::from_path_lookup()
        });

        let publisher = Arc::new(LocalPublisher::new(config.storage.output_dir.clone()));
        let orchestrator = Orchestrator::new(
            config,
            store,
            Collaborators::from_llm(planner),
            publisher,
            toolchain,
        )
        .with_generator(generator);
        Ok(Self::new(orchestrator))
    }

    fn store(&self) -> &SharedJobStore {
        self.orchestrator.store()
    }

    /// Validate and store a new QUEUED job without running it.
    pub fn accept(&self, request: RenderRequest) -> Result<RenderJob> {
        let settings = request.resolve(&self.orchestrator.config().render)?;
        let job = RenderJob::new(request, settings);
        self.store().insert(job.clone())?;
        info!(job_id = %job.id, "Job accepted");
        Ok(job)
    }

    /// Accept a job and start it in the background. Returns the QUEUED
    /// snapshot immediately.
    pub fn submit(&self, request: RenderRequest) -> Result<RenderJob> {
        let job = self.accept(request)?;
        let orchestrator = self.orchestrator.clone();
        let id = job.id;
        tokio::spawn(async move {
            if let Err(e) = orchestrator.run(id).await {
                error!(job_id = %id, "Render run aborted: {}", e);
            }
        });
        Ok(job)
    }

    /// Accept a job and run it to completion on the current task.
    pub async fn render_and_wait(&self, request: RenderRequest) -> Result<RenderJob> {
        let job = self.accept(request)?;
        self.orchestrator.run(job.id).await
    }

    pub fn get(&self, id: JobId) -> Option<RenderJob> {
        self.store().get(id)
    }

    pub fn list(&self) -> Vec<RenderJob> {
        self.store().list()
    }
}
