//! Deterministic artifact naming.
//!
//! Every file a job writes lives in the work directory and is named from the
//! job id plus a stage suffix, so re-running a job overwrites its own files
//! and every intermediate stays inspectable:
//!
//! | Artifact | Name |
//! |---|---|
//! | raw scene clip | `{job}_scene{i}.mp4` |
//! | raw clip being written | `{job}_scene{i}.partial.mp4` |
//! | normalized scene | `{job}_scene{i}_norm.mp4` |
//! | concat list / output | `{job}_concat.txt` / `{job}_concat.mp4` |
//! | captions script | `{job}_captions.ass` |
//! | captioned video | `{job}_overlays.mp4` |
//! | end card clip / list | `{job}_endcard.mp4` / `{job}_endcard.txt` |
//! | final asset | `{job}_final.mp4` |

use crate::Result;
use jobreel_common::JobId;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extension for every video artifact.
pub const VIDEO_EXT: &str = "mp4";

/// Artifact paths for one job.
#[derive(Debug, Clone)]
pub struct Artifacts {
    work_dir: PathBuf,
    prefix: String,
}

impl Artifacts {
    pub fn new(work_dir: impl Into<PathBuf>, job_id: JobId) -> Self {
        Self {
            work_dir: work_dir.into(),
            prefix: job_id.to_string(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.work_dir.join(format!("{}_{}", self.prefix, suffix))
    }

    pub fn scene(&self, index: usize) -> PathBuf {
        self.file(&format!("scene{}.{}", index, VIDEO_EXT))
    }

    /// Raw clips are written here first, then committed with
    /// [`Artifacts::commit_scene`], so reuse never sees a clip mid-write.
    pub fn scene_partial(&self, index: usize) -> PathBuf {
        self.file(&format!("scene{}.partial.{}", index, VIDEO_EXT))
    }

    /// Rename the finished partial clip for `index` to its raw clip name.
    pub async fn commit_scene(&self, index: usize) -> Result<PathBuf> {
        let dest = self.scene(index);
        tokio::fs::rename(self.scene_partial(index), &dest).await?;
        Ok(dest)
    }

    pub fn scene_normalized(&self, index: usize) -> PathBuf {
        self.file(&format!("scene{}_norm.{}", index, VIDEO_EXT))
    }

    pub fn concat_list(&self) -> PathBuf {
        self.file("concat.txt")
    }

    pub fn concat(&self) -> PathBuf {
        self.file(&format!("concat.{}", VIDEO_EXT))
    }

    pub fn captions(&self) -> PathBuf {
        self.file("captions.ass")
    }

    pub fn overlays(&self) -> PathBuf {
        self.file(&format!("overlays.{}", VIDEO_EXT))
    }

    pub fn end_card(&self) -> PathBuf {
        self.file(&format!("endcard.{}", VIDEO_EXT))
    }

    pub fn end_card_list(&self) -> PathBuf {
        self.file("endcard.txt")
    }

    pub fn final_output(&self) -> PathBuf {
        self.file(&format!("final.{}", VIDEO_EXT))
    }

    /// Create the work directory if needed.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        Ok(())
    }
}

/// Most recently modified raw scene clip for `index` from any job in
/// `work_dir`. Normalized and partial clips are never returned.
pub async fn find_reusable_scene(work_dir: &Path, index: usize) -> Result<Option<PathBuf>> {
    let suffix = format!("_scene{}.{}", index, VIDEO_EXT);
    let mut entries = match tokio::fs::read_dir(work_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.ends_with(&suffix) {
            continue;
        }
        let meta = entry.metadata().await?;
        if !meta.is_file() || meta.len() == 0 {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, entry.path()));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_names() {
        let id: JobId = "2f1c6a52-8f9e-4f43-9c1e-0d7f5b2a9e10".parse().unwrap();
        let a = Artifacts::new("/work", id);
        let p = |p: PathBuf| p.file_name().unwrap().to_string_lossy().to_string();
        let pre = id.to_string();
        assert_eq!(p(a.scene(0)), format!("{pre}_scene0.mp4"));
        assert_eq!(p(a.scene_partial(0)), format!("{pre}_scene0.partial.mp4"));
        assert_eq!(p(a.scene_normalized(2)), format!("{pre}_scene2_norm.mp4"));
        assert_eq!(p(a.concat()), format!("{pre}_concat.mp4"));
        assert_eq!(p(a.concat_list()), format!("{pre}_concat.txt"));
        assert_eq!(p(a.captions()), format!("{pre}_captions.ass"));
        assert_eq!(p(a.overlays()), format!("{pre}_overlays.mp4"));
        assert_eq!(p(a.end_card()), format!("{pre}_endcard.mp4"));
        assert_eq!(p(a.end_card_list()), format!("{pre}_endcard.txt"));
        assert_eq!(p(a.final_output()), format!("{pre}_final.mp4"));
        assert_eq!(a.scene(1).parent().unwrap(), Path::new("/work"));
    }

    #[tokio::test]
    async fn test_find_reusable_scene() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("aaa_scene1.mp4");
        let new = dir.path().join("bbb_scene1.mp4");
        std::fs::write(&old, b"old").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        std::fs::write(&new, b"new").unwrap();
        std::fs::write(dir.path().join("ccc_scene1_norm.mp4"), b"norm").unwrap();
        std::fs::write(dir.path().join("ddd_scene11.mp4"), b"other").unwrap();

        let found = find_reusable_scene(dir.path(), 1).await.unwrap();
        assert_eq!(found, Some(new));
        assert_eq!(find_reusable_scene(dir.path(), 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_partial_clip_is_not_reusable_until_committed() {
        let dir = tempfile::tempdir().unwrap();
        let a = Artifacts::new(dir.path(), JobId::new());
        std::fs::write(a.scene_partial(2), b"half written").unwrap();
        assert_eq!(find_reusable_scene(dir.path(), 2).await.unwrap(), None);

        let committed = a.commit_scene(2).await.unwrap();
        assert_eq!(committed, a.scene(2));
        assert!(!a.scene_partial(2).exists());
        assert_eq!(find_reusable_scene(dir.path(), 2).await.unwrap(), Some(a.scene(2)));
    }

    #[tokio::test]
    async fn test_find_reusable_scene_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(find_reusable_scene(&missing, 0).await.unwrap(), None);
    }
}
