//! End-to-end renders through real ffmpeg.
//!
//! Skipped when ffmpeg/ffprobe are not on PATH. Renders use a small frame
//! size and two-second scenes to stay fast.

mod common;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{media_tools_available, FailingGenerator, TestHarness};
use jobreel::acquisition::ClipOrigin;
use jobreel::state::{RenderJob, RenderRequest, StepOutcome};
use jobreel_av::compose::format_timestamp;
use jobreel_av::probe::probe_duration;
use jobreel_av::Toolchain;
use jobreel_common::JobStatus;

fn small_frame(config: &mut jobreel::config::Config) {
    config.render.width = 270;
    config.render.height = 480;
    config.render.fps = 24;
    config.render.caption_font_size = 24;
}

fn request(scene_count: u32, engine: &str) -> RenderRequest {
    let mut request = RenderRequest::new("Acme is hiring a senior backend engineer.");
    request.scene_count = Some(scene_count);
    request.engine = Some(engine.into());
    request.tone = Some("professional".into());
    request
}

fn artifact(h: &TestHarness, job: &RenderJob, suffix: &str) -> PathBuf {
    h.config.work_dir.join(format!("{}{}", job.id, suffix))
}

#[tokio::test]
async fn template_render_reaches_ready() {
    if !media_tools_available() {
        eprintln!("Skipping: ffmpeg/ffprobe not found on PATH");
        return;
    }
    let h = TestHarness::builder().configure(small_frame).build();

    let job = h.service.render_and_wait(request(1, "template")).await.unwrap();

    assert_eq!(job.status, JobStatus::Ready, "error: {:?}", job.error);
    assert_eq!(job.scenes.len(), 1);
    assert_eq!(job.scenes[0].origin, ClipOrigin::Template);

    let ordered = [
        "_scene0.mp4",
        "_scene0_norm.mp4",
        "_concat.mp4",
        "_overlays.mp4",
        "_endcard.mp4",
        "_final.mp4",
    ];
    let mut previous = None;
    for suffix in ordered {
        let path = artifact(&h, &job, suffix);
        let meta = std::fs::metadata(&path).unwrap_or_else(|_| panic!("missing {:?}", path));
        assert!(meta.len() > 0, "{:?} is empty", path);
        let modified = meta.modified().unwrap();
        if let Some(prev) = previous {
            assert!(modified >= prev, "{} written out of order", suffix);
        }
        previous = Some(modified);
    }
    assert!(artifact(&h, &job, "_captions.ass").exists());

    let qc = job.debug.qc.as_ref().unwrap();
    assert!(qc.passed, "qc issues: {:?}", qc.issues);
    let duration = qc.duration_secs.unwrap();
    assert!((duration - qc.target_duration_secs).abs() <= 1.0, "{} vs {}", duration, qc.target_duration_secs);
    assert_eq!((qc.width, qc.height), (Some(270), Some(480)));
    assert!(qc.has_audio);

    let url = job.published_url.as_deref().unwrap();
    let published = url.strip_prefix("file://").unwrap();
    assert!(std::path::Path::new(published).exists());

    assert_eq!(job.debug.steps.len(), 10);
    assert!(job.debug.steps.iter().all(|s| s.outcome != StepOutcome::Failed));
}

#[tokio::test]
async fn generative_failures_fall_back_to_template() {
    if !media_tools_available() {
        eprintln!("Skipping: ffmpeg/ffprobe not found on PATH");
        return;
    }
    let generator = Arc::new(FailingGenerator::default());
    let h = TestHarness::builder()
        .configure(small_frame)
        .generator(generator.clone())
        .build();

    let job = h.service.render_and_wait(request(2, "generative")).await.unwrap();

    assert_eq!(job.status, JobStatus::Ready, "error: {:?}", job.error);
    assert_eq!(generator.submitted.load(Ordering::SeqCst), 2);
    assert_eq!(job.scenes.len(), 2);
    for (i, scene) in job.scenes.iter().enumerate() {
        assert_eq!(scene.index, i);
        assert_eq!(scene.origin, ClipOrigin::TemplateFallback);
        assert!(scene.note.is_some());
        assert!(scene.path.exists());
    }
    let scene_step = job
        .debug
        .steps
        .iter()
        .find(|s| s.name == "scene_acquisition")
        .unwrap();
    assert_eq!(scene_step.outcome, StepOutcome::Degraded);

    // three model calls plus 2 x 2s of billed generation
    let expected = 3.0 * h.config.llm.cost_per_call_usd + 4.0 * h.config.generation.cost_per_second_usd;
    assert!((job.debug.cost_estimate_usd - expected).abs() < 1e-9);
}

#[tokio::test]
async fn last_cue_ends_at_measured_total() {
    if !media_tools_available() {
        eprintln!("Skipping: ffmpeg/ffprobe not found on PATH");
        return;
    }
    let h = TestHarness::builder().configure(small_frame).build();

    let job = h.service.render_and_wait(request(3, "template")).await.unwrap();
    assert_eq!(job.status, JobStatus::Ready, "error: {:?}", job.error);

    let toolchain = Toolchain::resolve(None, None).unwrap();
    let mut measured = 0.0;
    for i in 0..3 {
        let norm = artifact(&h, &job, &format!("_scene{}_norm.mp4", i));
        measured += probe_duration(&toolchain, &norm).await.unwrap();
    }

    let ass = std::fs::read_to_string(artifact(&h, &job, "_captions.ass")).unwrap();
    let dialogues: Vec<&str> = ass.lines().filter(|l| l.starts_with("Dialogue:")).collect();
    assert_eq!(dialogues.len(), 3);
    let last_end = dialogues[2].split(',').nth(2).unwrap();
    assert_eq!(last_end, format_timestamp(measured));

    // shot plan overlays win over the script lines
    assert!(dialogues[0].ends_with("Planned overlay 0"));
}

#[tokio::test]
async fn reuse_mode_picks_up_existing_clips() {
    if !media_tools_available() {
        eprintln!("Skipping: ffmpeg/ffprobe not found on PATH");
        return;
    }
    let h = TestHarness::builder().configure(small_frame).build();

    let first = h.service.render_and_wait(request(1, "template")).await.unwrap();
    assert_eq!(first.status, JobStatus::Ready, "error: {:?}", first.error);

    let mut req = request(2, "template");
    req.reuse_existing_clips = true;
    let second = h.service.render_and_wait(req).await.unwrap();

    assert_eq!(second.status, JobStatus::Ready, "error: {:?}", second.error);
    assert_eq!(second.scenes[0].origin, ClipOrigin::Reused);
    assert_eq!(second.scenes[0].path, artifact(&h, &first, "_scene0.mp4"));
    assert_eq!(second.scenes[1].origin, ClipOrigin::Template);
}
