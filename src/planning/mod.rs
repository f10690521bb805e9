//! Planning data: brief, script, shot plan, and the local shot-plan fallback.

mod fallback;
mod types;

pub use fallback::{fallback_plan, subtitle_style, ASPECT_RATIO};
pub use types::*;
