use std::collections::BTreeMap;

use crate::job::{Job, JobId};
use crate::snapshot::ProgressSnapshot;

/// Orchestrator-side tracking of jobs by id.
///
/// BTreeMap keeps iteration deterministic for reporting. Entries are created
/// on the first snapshot for an id and dropped on an explicit delete; a job
/// that has reached a terminal status ignores further snapshots.
#[derive(Debug, Default)]
pub struct JobLedger {
    jobs: BTreeMap<JobId, Job>,
}

impl JobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a snapshot, upserting the job row. Returns false when the
    /// snapshot was ignored because the job already reached a terminal
    /// status.
    pub fn apply(&mut self, snapshot: &ProgressSnapshot) -> bool {
        if let Some(existing) = self.jobs.get(&snapshot.job_id) {
            if existing.status.is_terminal() {
                return false;
            }
        }
        self.jobs.insert(
            snapshot.job_id.clone(),
            Job {
                id: snapshot.job_id.clone(),
                source_filename: snapshot.filename.clone(),
                output_filename: snapshot.output_filename.clone(),
                status: snapshot.status,
                progress: snapshot.progress,
                file_size_label: snapshot.file_size_label.clone(),
                compression_percent: snapshot.compression_percent,
            },
        );
        true
    }

    /// Best-effort delete: drop the job from tracking if present.
    pub fn remove(&mut self, id: &str) -> bool {
        self.jobs.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
