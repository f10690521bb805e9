//! Final asset delivery.

use async_trait::async_trait;
use jobreel_common::{Error, JobId, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Makes a finished asset available and returns where it can be fetched.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, job_id: JobId, path: &Path) -> Result<String>;
}

/// Copies final assets into a local output directory.
#[derive(Debug, Clone)]
pub struct LocalPublisher {
    output_dir: PathBuf,
}

impl LocalPublisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn failed(path: &Path, e: impl std::fmt::Display) -> Error {
        Error::resource("publish", format!("{}: {}", path.display(), e))
    }

    /// Remove a leftover temp file after a failed copy or rename.
    async fn discard(tmp: &Path) {
        match tokio::fs::remove_file(tmp).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(tmp = %tmp.display(), "Failed to remove publish temp file: {}", e),
        }
    }
}

#[async_trait]
impl Publisher for LocalPublisher {
    /// Copy to `{output_dir}/{job_id}.mp4` through a temp file so readers
    /// never see a partial asset.
    async fn publish(&self, job_id: JobId, path: &Path) -> Result<String> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| Self::failed(&self.output_dir, e))?;

        let dest = self.output_dir.join(format!("{}.mp4", job_id));
        let tmp = self.output_dir.join(format!(".{}.mp4.tmp", job_id));
        if let Err(e) = tokio::fs::copy(path, &tmp).await {
            Self::discard(&tmp).await;
            return Err(Self::failed(path, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &dest).await {
            Self::discard(&tmp).await;
            return Err(Self::failed(&dest, e));
        }

        let absolute = tokio::fs::canonicalize(&dest)
            .await
            .map_err(|e| Self::failed(&dest, e))?;
        info!(job_id = %job_id, dest = %absolute.display(), "Published asset");
        Ok(format!("file://{}", absolute.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_publish_copies_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("final.mp4");
        tokio::fs::write(&src, b"video").await.unwrap();

        let publisher = LocalPublisher::new(dir.path().join("out/nested"));
        let id = JobId::new();
        let url = publisher.publish(id, &src).await.unwrap();

        assert!(url.starts_with("file://"));
        assert!(url.ends_with(&format!("{}.mp4", id)));
        let dest = publisher.output_dir().join(format!("{}.mp4", id));
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"video");

        let leftovers: Vec<_> = std::fs::read_dir(publisher.output_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    fn temp_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(".tmp"))
            .collect()
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("final.mp4");
        tokio::fs::write(&src, b"video").await.unwrap();

        let out = dir.path().join("out");
        let id = JobId::new();
        // A non-empty directory squatting on the destination name.
        let blocker = out.join(format!("{}.mp4", id));
        std::fs::create_dir_all(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"x").unwrap();

        let publisher = LocalPublisher::new(&out);
        let result = publisher.publish(id, &src).await;
        assert_matches!(result, Err(Error::Resource { ref tool, .. }) if tool == "publish");
        assert!(temp_files(&out).is_empty(), "{:?}", temp_files(&out));
    }

    #[tokio::test]
    async fn test_failed_copy_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = LocalPublisher::new(dir.path().join("out"));
        let id = JobId::new();
        // A directory is not a copyable source.
        let result = publisher.publish(id, dir.path()).await;
        assert!(result.is_err());
        assert!(temp_files(publisher.output_dir()).is_empty());
    }

    #[tokio::test]
    async fn test_publish_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = LocalPublisher::new(dir.path());
        let result = publisher.publish(JobId::new(), &dir.path().join("missing.mp4")).await;
        assert_matches!(result, Err(Error::Resource { ref tool, .. }) if tool == "publish");
    }
}
