//! The render pipeline: ordered stages driven by the [`Orchestrator`], and
//! the [`RenderService`] that accepts jobs and runs them in the background.

mod captions;
mod orchestrator;
mod service;
mod stage;

pub use captions::{caption_texts, truncate_caption};
pub use orchestrator::Orchestrator;
pub use service::RenderService;
pub use stage::{Stage, StagePolicy, StageReport, STAGES};
