//! Deterministic shot plan used when the shot planner fails.

use super::types::{JobBrief, PlanSource, Scene, Script, ShotPlan};
use jobreel_common::{TemplateContext, Tone};

/// Vertical video.
pub const ASPECT_RATIO: &str = "9:16";

const PROFESSIONAL: &[&str] = &[
    "Wide shot of a bright, modern office where the {title} team at {company} works together",
    "Close-up of focused hands at a laptop, clean desk, soft daylight, {location}",
    "A confident {title} presenting to colleagues in a glass meeting room",
    "Slow push-in on a whiteboard covered in plans, team nodding in agreement",
];

const FRIENDLY: &[&str] = &[
    "Warm handheld shot of the {company} team laughing over coffee",
    "A new {title} being welcomed at their desk with a high five",
    "Colleagues pairing at a shared screen in a sunny corner of {location}",
    "Casual team lunch around a long table, everyone chatting",
];

const ENERGETIC: &[&str] = &[
    "Fast tracking shot through a buzzing {company} workspace",
    "Quick cuts of a {title} shipping work, screens lighting up",
    "Team celebrating a launch with raised hands, dynamic angle",
    "Time-lapse of a busy day in {location}, people moving with purpose",
];

const PREMIUM: &[&str] = &[
    "Slow cinematic dolly across a minimal, elegant {company} studio",
    "Soft-focus portrait of a {title} by a tall window, golden light",
    "Detail shot of fine materials and a quiet, focused workspace in {location}",
    "Calm wide shot of a small team in thoughtful discussion",
];

fn templates(tone: Tone) -> &'static [&'static str] {
    match tone {
        Tone::Professional => PROFESSIONAL,
        Tone::Friendly => FRIENDLY,
        Tone::Energetic => ENERGETIC,
        Tone::Premium => PREMIUM,
    }
}

pub fn subtitle_style(tone: Tone) -> &'static str {
    match tone {
        Tone::Energetic => "bold_bottom",
        Tone::Premium => "minimal_bottom",
        _ => "boxed_bottom",
    }
}

/// Build a plan with exactly `scene_count` scenes of `total / scene_count`
/// seconds each. Visuals cycle through the tone's templates; overlay text
/// comes from the script, falling back to its beats.
pub fn fallback_plan(
    brief: &JobBrief,
    script: &Script,
    tone: Tone,
    total_secs: f64,
    scene_count: usize,
) -> ShotPlan {
    let count = scene_count.max(1);
    let length = total_secs / count as f64;

    let ctx = TemplateContext::new()
        .with_var("title", brief.title.trim())
        .with_var("company", "the team")
        .with_var("location", "the office")
        .with_opt_var("company", brief.company.as_deref())
        .with_opt_var("location", brief.location.as_deref());

    let visuals = templates(tone);
    let scenes = (0..scene_count)
        .map(|i| {
            let overlay = script
                .on_screen_text
                .get(i)
                .filter(|t| !t.trim().is_empty())
                .or_else(|| script.beats.get(i))
                .cloned()
                .unwrap_or_default();
            Scene {
                duration_secs: length,
                visual: ctx.substitute(visuals[i % visuals.len()]),
                overlay_text: overlay,
            }
        })
        .collect();

    ShotPlan {
        aspect_ratio: ASPECT_RATIO.to_string(),
        music_mood: tone.music_mood().to_string(),
        subtitle_style: subtitle_style(tone).to_string(),
        scenes,
        source: PlanSource::Fallback,
    }
}
