use std::sync::Arc;

use press_core::{JobId, JobStatus, ProgressSnapshot};

/// Receives progress snapshots as the pipeline produces them.
pub trait SnapshotSink: Send + Sync {
    fn emit(&self, snapshot: ProgressSnapshot);
}

/// Sink backed by an unbounded channel; the consumer is typically the
/// connection writer task.
pub struct ChannelSnapshotSink {
    tx: tokio::sync::mpsc::UnboundedSender<ProgressSnapshot>,
}

impl ChannelSnapshotSink {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<ProgressSnapshot>) -> Self {
        Self { tx }
    }
}

impl SnapshotSink for ChannelSnapshotSink {
    fn emit(&self, snapshot: ProgressSnapshot) {
        let _ = self.tx.send(snapshot);
    }
}

/// Builds milestone snapshots for one job and pushes them to the sink.
///
/// Snapshots carry the job identity and the resolved filenames from the
/// first emission on; progress never decreases across emissions for a job.
pub struct JobReporter {
    job_id: JobId,
    filename: String,
    output_filename: String,
    sink: Arc<dyn SnapshotSink>,
    last_progress: f64,
}

impl JobReporter {
    pub fn new(
        job_id: JobId,
        filename: String,
        output_filename: String,
        sink: Arc<dyn SnapshotSink>,
    ) -> Self {
        Self {
            job_id,
            filename,
            output_filename,
            sink,
            last_progress: 0.0,
        }
    }

    pub fn downloading(&mut self, progress: f64) {
        self.milestone(JobStatus::Downloading, progress, 0.0, String::new());
    }

    pub fn converting(&mut self, progress: f64) {
        self.milestone(JobStatus::Converting, progress, 0.0, String::new());
    }

    /// Terminal success snapshot: progress 100 with the final metrics.
    pub fn done(&mut self, file_size_label: String, compression_percent: f64) {
        self.milestone(JobStatus::Done, 100.0, compression_percent, file_size_label);
    }

    /// Terminal failure snapshot; echoes the last reported progress so
    /// observers are not left at a stale in-flight percentage.
    pub fn failed(&mut self) {
        self.milestone(JobStatus::Error, self.last_progress, 0.0, String::new());
    }

    fn milestone(
        &mut self,
        status: JobStatus,
        progress: f64,
        compression_percent: f64,
        file_size_label: String,
    ) {
        self.last_progress = progress;
        self.sink.emit(ProgressSnapshot {
            job_id: self.job_id.clone(),
            filename: self.filename.clone(),
            status,
            progress,
            output_filename: self.output_filename.clone(),
            compression_percent,
            file_size_label,
        });
    }
}
