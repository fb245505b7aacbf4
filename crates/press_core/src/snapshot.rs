use crate::job::{JobId, JobStatus};

/// Immutable point-in-time progress report for one job.
///
/// Broadcast at each milestone; consumers treat it as a value, never as a
/// delta to accumulate.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub job_id: JobId,
    pub filename: String,
    pub status: JobStatus,
    pub progress: f64,
    pub output_filename: String,
    pub compression_percent: f64,
    pub file_size_label: String,
}
