//! Caption text selection.

use crate::planning::{Script, ShotPlan};

/// Cut `text` to at most `max_chars` characters on a word boundary where
/// possible, marking the cut with an ellipsis.
pub fn truncate_caption(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if max_chars == 0 || text.chars().count() <= max_chars {
        return text.to_string();
    }
    // One character is reserved for the ellipsis.
    let budget = max_chars - 1;
    let cut: Vec<char> = text.chars().take(budget).collect();
    let end = cut
        .iter()
        .rposition(|c| c.is_whitespace())
        .filter(|&i| i > budget / 2)
        .unwrap_or(cut.len());
    let kept: String = cut[..end].iter().collect();
    format!("{}…", kept.trim_end())
}

/// One caption per planned scene, in scene order.
///
/// Sources, in priority: the pitch segment for that index, the scene's
/// overlay text, the script's on-screen text, then the beat (truncated).
pub fn caption_texts(
    plan: &ShotPlan,
    script: Option<&Script>,
    pitch: Option<&[String]>,
    max_chars: usize,
) -> Vec<String> {
    let non_blank = |s: Option<&String>| s.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string);

    (0..plan.scenes.len())
        .map(|i| {
            non_blank(pitch.and_then(|p| p.get(i)))
                .or_else(|| non_blank(plan.scenes.get(i).map(|s| &s.overlay_text)))
                .or_else(|| non_blank(script.and_then(|s| s.on_screen_text.get(i))))
                .or_else(|| {
                    non_blank(script.and_then(|s| s.beats.get(i)))
                        .map(|beat| truncate_caption(&beat, max_chars))
                })
                .unwrap_or_default()
        })
        .collect()
}
