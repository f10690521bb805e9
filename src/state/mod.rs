//! Job records and the job store.
//!
//! The store hands out snapshots. During a run the orchestrator owns the
//! live [`RenderJob`] and saves a snapshot after every stage, so readers
//! never contend with the pipeline for a record.

mod types;

pub use types::*;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jobreel_common::{Error, JobId, Result};
use std::sync::Arc;

/// Keyed job storage, safe to share across concurrently running jobs.
pub trait JobStore: Send + Sync {
    /// Add a new job. Fails with [`Error::Conflict`] if the id exists.
    fn insert(&self, job: RenderJob) -> Result<()>;

    /// Snapshot of a job.
    fn get(&self, id: JobId) -> Option<RenderJob>;

    /// Replace a job's stored snapshot.
    ///
    /// The stored status may only stay the same or take one legal step, so
    /// a stale snapshot can never move a job backwards.
    fn save(&self, job: &RenderJob) -> Result<()>;

    /// All jobs, newest first.
    fn list(&self) -> Vec<RenderJob>;
}

pub type SharedJobStore = Arc<dyn JobStore>;

/// In-memory store on a sharded concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: DashMap<JobId, RenderJob>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedJobStore {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: RenderJob) -> Result<()> {
        match self.jobs.entry(job.id) {
            Entry::Occupied(_) => Err(Error::Conflict(format!("job {} already exists", job.id))),
            Entry::Vacant(slot) => {
                slot.insert(job);
                Ok(())
            }
        }
    }

    fn get(&self, id: JobId) -> Option<RenderJob> {
        self.jobs.get(&id).map(|j| j.value().clone())
    }

    fn save(&self, job: &RenderJob) -> Result<()> {
        let mut stored = self
            .jobs
            .get_mut(&job.id)
            .ok_or_else(|| Error::not_found(job.id.to_string()))?;

        if stored.status != job.status && !stored.status.can_transition_to(job.status) {
            return Err(Error::InvalidTransition {
                from: stored.status,
                to: job.status,
            });
        }

        *stored = job.clone();
        Ok(())
    }

    fn list(&self) -> Vec<RenderJob> {
        let mut jobs: Vec<RenderJob> = self.jobs.iter().map(|j| j.value().clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use assert_matches::assert_matches;
    use jobreel_common::JobStatus;

    fn job() -> RenderJob {
        let req = RenderRequest::new("Hiring a welder");
        let settings = req.resolve(&RenderConfig::default()).unwrap();
        RenderJob::new(req, settings)
    }

    #[test]
    fn test_insert_get_list() {
        let store = InMemoryJobStore::new();
        let a = job();
        let b = job();
        store.insert(a.clone()).unwrap();
        store.insert(b.clone()).unwrap();
        assert_matches!(store.insert(a.clone()), Err(Error::Conflict(_)));

        assert_eq!(store.get(a.id).unwrap().id, a.id);
        assert!(store.get(JobId::new()).is_none());
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_save_enforces_state_machine() {
        let store = InMemoryJobStore::new();
        let mut live = job();
        store.insert(live.clone()).unwrap();

        live.start().unwrap();
        store.save(&live).unwrap();
        live.debug.warn("scene 0 fell back");
        store.save(&live).unwrap();
        live.complete().unwrap();
        store.save(&live).unwrap();
        assert_eq!(store.get(live.id).unwrap().status, JobStatus::Ready);

        // a stale RUNNING snapshot cannot overwrite READY
        let mut stale = live.clone();
        stale.status = JobStatus::Running;
        assert_matches!(store.save(&stale), Err(Error::InvalidTransition { .. }));
    }

    #[test]
    fn test_save_unknown_job() {
        let store = InMemoryJobStore::new();
        assert_matches!(store.save(&job()), Err(Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_jobs_are_isolated() {
        let store: SharedJobStore = InMemoryJobStore::shared();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut j = job();
                store.insert(j.clone()).unwrap();
                j.start().unwrap();
                for i in 0..10 {
                    j.debug.warn(format!("w{i}"));
                    store.save(&j).unwrap();
                    tokio::task::yield_now().await;
                }
                j.id
            }));
        }
        for h in handles {
            let id = h.await.unwrap();
            let stored = store.get(id).unwrap();
            assert_eq!(stored.debug.warnings.len(), 10);
            assert_eq!(stored.status, JobStatus::Running);
        }
    }
}
