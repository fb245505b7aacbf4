use std::path::PathBuf;
use std::sync::Arc;

use press_logging::{press_info, press_warn};
use tokio::sync::mpsc::UnboundedReceiver;

use press_core::{JobConfig, JobId};

use crate::document::DocumentOpener;
use crate::download::SourceFetcher;
use crate::filename::{derive_names, SourceNames};
use crate::progress::{JobReporter, SnapshotSink};
use crate::transform::rewrite_images;
use crate::types::JobError;

/// One decoded job message, paired with the reply handle its progress goes
/// back through.
pub struct JobAssignment {
    pub job_id: JobId,
    pub config: JobConfig,
    pub sink: Arc<dyn SnapshotSink>,
}

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Shared working directory for downloaded sources and rewritten
    /// outputs.
    pub shared_dir: PathBuf,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            shared_dir: PathBuf::from("./shared"),
        }
    }
}

/// Final metrics for a completed job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobMetrics {
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// `(1 - out/in) * 100`, two decimals; negative when the output grew.
    pub compression_percent: f64,
    /// Output size in megabytes, two decimals, unit-suffixed.
    pub file_size_label: String,
}

impl JobMetrics {
    pub fn from_sizes(input_bytes: u64, output_bytes: u64) -> Self {
        let compression_percent = if input_bytes == 0 {
            0.0
        } else {
            round2((1.0 - output_bytes as f64 / input_bytes as f64) * 100.0)
        };
        let megabytes = output_bytes as f64 / (1024.0 * 1024.0);
        Self {
            input_bytes,
            output_bytes,
            compression_percent,
            file_size_label: format!("{:.2} MB", round2(megabytes)),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The single consumer of the job queue: runs one job at a time, in
/// submission order, driving download then transform and emitting progress
/// through each job's own reply handle.
pub struct Executor {
    fetcher: Arc<dyn SourceFetcher>,
    opener: Arc<dyn DocumentOpener>,
    settings: ExecutorSettings,
}

impl Executor {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        opener: Arc<dyn DocumentOpener>,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            fetcher,
            opener,
            settings,
        }
    }

    /// Drain the queue until every sender is gone. A failed job emits a
    /// terminal error snapshot and never stops the loop.
    pub async fn run(&self, mut queue: UnboundedReceiver<JobAssignment>) {
        while let Some(assignment) = queue.recv().await {
            self.run_job(assignment).await;
        }
    }

    pub async fn run_job(&self, assignment: JobAssignment) {
        let names = derive_names(&assignment.config.source_url);
        let mut report = JobReporter::new(
            assignment.job_id.clone(),
            names.source.clone(),
            names.output.clone(),
            Arc::clone(&assignment.sink),
        );
        press_info!("processing job {}", assignment.job_id);

        match self.execute(&assignment.config, &names, &mut report).await {
            Ok(metrics) => {
                report.done(metrics.file_size_label.clone(), metrics.compression_percent);
                press_info!(
                    "job {} done ({} -> {} bytes)",
                    assignment.job_id,
                    metrics.input_bytes,
                    metrics.output_bytes
                );
            }
            Err(err) => {
                press_warn!("job {} failed: {}", assignment.job_id, err);
                report.failed();
            }
        }
    }

    async fn execute(
        &self,
        config: &JobConfig,
        names: &SourceNames,
        report: &mut JobReporter,
    ) -> Result<JobMetrics, JobError> {
        tokio::fs::create_dir_all(&self.settings.shared_dir).await?;
        let source_path = self.settings.shared_dir.join(&names.source);
        let output_path = self.settings.shared_dir.join(&names.output);

        report.downloading(0.0);
        let input_bytes = self
            .fetcher
            .download(&config.source_url, &source_path, report)
            .await?;

        report.converting(50.0);
        let mut editor = self.opener.open(&source_path)?;
        let outcome = rewrite_images(editor.as_mut(), config, &output_path, report)?;

        Ok(JobMetrics::from_sizes(input_bytes, outcome.output_bytes))
    }
}
