use crate::state::StepOutcome;

/// How the orchestrator treats a stage's errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePolicy {
    /// Any error moves the job to `ERROR`.
    Fatal,
    /// Collaborator failures are replaced by a local fallback. Errors that
    /// are still fatal (a local tool failing) abort the job.
    Degradable,
    /// Never fails the job; problems become warnings.
    Advisory,
}

/// A named pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Parse,
    Pitch,
    Script,
    ShotPlan,
    Scenes,
    NormalizeConcat,
    Overlay,
    EndCard,
    QualityCheck,
    Publish,
}

/// Execution order.
pub const STAGES: [Stage; 10] = [
    Stage::Parse,
    Stage::Pitch,
    Stage::Script,
    Stage::ShotPlan,
    Stage::Scenes,
    Stage::NormalizeConcat,
    Stage::Overlay,
    Stage::EndCard,
    Stage::QualityCheck,
    Stage::Publish,
];

impl Stage {
    /// Step record name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Pitch => "pitch",
            Self::Script => "script",
            Self::ShotPlan => "shot_plan",
            Self::Scenes => "scene_acquisition",
            Self::NormalizeConcat => "normalize_concat",
            Self::Overlay => "overlay",
            Self::EndCard => "end_card",
            Self::QualityCheck => "quality_check",
            Self::Publish => "publish",
        }
    }

    pub fn policy(self) -> StagePolicy {
        match self {
            Self::Parse | Self::Script => StagePolicy::Fatal,
            Self::NormalizeConcat | Self::Overlay | Self::EndCard | Self::Publish => StagePolicy::Fatal,
            Self::Pitch | Self::ShotPlan | Self::Scenes => StagePolicy::Degradable,
            Self::QualityCheck => StagePolicy::Advisory,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a stage reports back for its step record.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub outcome: StepOutcome,
    pub detail: Option<String>,
}

impl StageReport {
    pub fn ok() -> Self {
        Self {
            outcome: StepOutcome::Ok,
            detail: None,
        }
    }

    pub fn ok_with(detail: impl Into<String>) -> Self {
        Self {
            outcome: StepOutcome::Ok,
            detail: Some(detail.into()),
        }
    }

    pub fn degraded(detail: impl Into<String>) -> Self {
        Self {
            outcome: StepOutcome::Degraded,
            detail: Some(detail.into()),
        }
    }

    pub fn skipped(detail: impl Into<String>) -> Self {
        Self {
            outcome: StepOutcome::Skipped,
            detail: Some(detail.into()),
        }
    }
}
