//! Post-render quality check.
//!
//! A failing report is attached to the job's debug trace and surfaces as a
//! non-fatal [`Error::Quality`]. The asset is still published.

use crate::config::QualityConfig;
use jobreel_av::{MediaInfo, Toolchain};
use jobreel_common::{check_contrast, ContrastCheck, Error, HexColor, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QcIssueKind {
    Duration,
    Resolution,
    FrameRate,
    MissingAudio,
    Probe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcIssue {
    pub kind: QcIssueKind,
    pub message: String,
}

impl QcIssue {
    fn new(kind: QcIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// What the finished asset should look like.
#[derive(Debug, Clone, PartialEq)]
pub struct QcTarget {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcReport {
    pub passed: bool,
    pub issues: Vec<QcIssue>,
    pub target_duration_secs: f64,
    pub duration_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub has_audio: bool,
    /// Caption text against the brand color. Informational only.
    pub contrast: Option<ContrastCheck>,
}

impl QcReport {
    /// Issue messages joined for a warning line.
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(|i| i.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// The summary when the asset passed, otherwise a quality error.
    pub fn verdict(&self) -> Result<String> {
        if self.passed {
            Ok(self.summary())
        } else {
            Err(Error::Quality(self.summary()))
        }
    }
}

/// Compare probed metadata with the target.
pub fn assess(info: &MediaInfo, target: &QcTarget, thresholds: &QualityConfig) -> Vec<QcIssue> {
    let mut issues = Vec::new();

    match info.duration_secs() {
        Some(actual) => {
            let delta = (actual - target.duration_secs).abs();
            if delta > thresholds.duration_tolerance_secs {
                issues.push(QcIssue::new(
                    QcIssueKind::Duration,
                    format!(
                        "duration {:.2}s deviates from target {:.2}s by {:.2}s",
                        actual, target.duration_secs, delta
                    ),
                ));
            }
        }
        None => issues.push(QcIssue::new(QcIssueKind::Duration, "duration unknown")),
    }

    match info.primary_video() {
        Some(video) => {
            if (video.width, video.height) != (target.width, target.height) {
                issues.push(QcIssue::new(
                    QcIssueKind::Resolution,
                    format!(
                        "resolution {}x{} differs from {}x{}",
                        video.width, video.height, target.width, target.height
                    ),
                ));
            }
            match video.frame_rate {
                Some(fps) if fps >= thresholds.min_fps => {}
                Some(fps) => issues.push(QcIssue::new(
                    QcIssueKind::FrameRate,
                    format!("frame rate {:.2} below minimum {:.2}", fps, thresholds.min_fps),
                )),
                None => issues.push(QcIssue::new(QcIssueKind::FrameRate, "frame rate unknown")),
            }
        }
        None => issues.push(QcIssue::new(QcIssueKind::Resolution, "no video stream")),
    }

    if !info.has_audio() {
        issues.push(QcIssue::new(QcIssueKind::MissingAudio, "no audio stream"));
    }

    issues
}

/// Probes finished assets and reports on them.
#[derive(Debug, Clone)]
pub struct QualityValidator {
    toolchain: Toolchain,
    thresholds: QualityConfig,
}

impl QualityValidator {
    pub fn new(toolchain: Toolchain, thresholds: QualityConfig) -> Self {
        Self {
            toolchain,
            thresholds,
        }
    }

    /// Probe `path` and build a report. A probe failure becomes an issue.
    pub async fn check(&self, path: &Path, target: &QcTarget, brand: HexColor) -> QcReport {
        let contrast = Some(self.contrast(HexColor::WHITE, brand));

        let info = match jobreel_av::probe(&self.toolchain, path).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("QC probe failed for {:?}: {}", path, e);
                return QcReport {
                    passed: false,
                    issues: vec![QcIssue::new(QcIssueKind::Probe, format!("probe failed: {}", e))],
                    target_duration_secs: target.duration_secs,
                    duration_secs: None,
                    width: None,
                    height: None,
                    fps: None,
                    has_audio: false,
                    contrast,
                };
            }
        };

        let issues = assess(&info, target, &self.thresholds);
        let video = info.primary_video();
        QcReport {
            passed: issues.is_empty(),
            issues,
            target_duration_secs: target.duration_secs,
            duration_secs: info.duration_secs(),
            width: video.map(|v| v.width),
            height: video.map(|v| v.height),
            fps: video.and_then(|v| v.frame_rate),
            has_audio: info.has_audio(),
            contrast,
        }
    }

    /// WCAG contrast against the configured threshold.
    pub fn contrast(&self, foreground: HexColor, background: HexColor) -> ContrastCheck {
        check_contrast(foreground, background, self.thresholds.min_contrast_ratio)
    }
}
