use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::DynamicImage;
use press_core::{ImageFormat, JobConfig, JobStatus, ProgressSnapshot};
use press_engine::{
    DocumentEditor, DocumentOpener, DownloadError, EncodedImage, Executor, ExecutorSettings,
    ImageHandle, JobAssignment, JobMetrics, JobReporter, SnapshotSink, SourceFetcher,
    TransformError,
};

fn config(url: &str) -> JobConfig {
    JobConfig {
        source_url: url.to_string(),
        format: ImageFormat::Jpeg,
        quality: 80,
        resize_ratio: 1.0,
        grayscale: false,
    }
}

struct CollectingSink {
    snapshots: Arc<Mutex<Vec<ProgressSnapshot>>>,
}

impl SnapshotSink for CollectingSink {
    fn emit(&self, snapshot: ProgressSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }
}

/// Writes a fixed body and walks the checkpoint band like the real fetcher.
struct FakeFetcher {
    body: Vec<u8>,
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
    async fn download(
        &self,
        _url: &str,
        dest: &Path,
        report: &mut JobReporter,
    ) -> Result<u64, DownloadError> {
        tokio::fs::write(dest, &self.body).await?;
        for checkpoint in [10.0, 20.0, 30.0, 40.0, 50.0] {
            report.downloading(checkpoint);
        }
        Ok(self.body.len() as u64)
    }
}

/// Two imageless pages; saving reports a fixed output size.
struct FakeEditor {
    saved_bytes: u64,
}

impl DocumentEditor for FakeEditor {
    fn page_count(&self) -> usize {
        2
    }

    fn page_images(&self, _page_index: usize) -> Result<Vec<ImageHandle>, TransformError> {
        Ok(Vec::new())
    }

    fn load_pixels(&self, handle: &ImageHandle) -> Result<DynamicImage, TransformError> {
        Err(TransformError::Document(format!(
            "no pixels for {}",
            handle.name
        )))
    }

    fn replace_image(
        &mut self,
        _handle: &ImageHandle,
        _encoded: &EncodedImage,
    ) -> Result<(), TransformError> {
        Ok(())
    }

    fn remove_image(
        &mut self,
        _page_index: usize,
        _handle: &ImageHandle,
    ) -> Result<(), TransformError> {
        Ok(())
    }

    fn save(&mut self, _path: &Path) -> Result<u64, TransformError> {
        Ok(self.saved_bytes)
    }
}

/// Fails for sources whose derived filename contains "bad".
struct FakeOpener {
    saved_bytes: u64,
}

impl DocumentOpener for FakeOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentEditor>, TransformError> {
        if path.to_string_lossy().contains("bad") {
            return Err(TransformError::Document("corrupt document".to_string()));
        }
        Ok(Box::new(FakeEditor {
            saved_bytes: self.saved_bytes,
        }))
    }
}

fn executor(body_len: usize, saved_bytes: u64) -> (Executor, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let executor = Executor::new(
        Arc::new(FakeFetcher {
            body: vec![1u8; body_len],
        }),
        Arc::new(FakeOpener { saved_bytes }),
        ExecutorSettings {
            shared_dir: dir.path().to_path_buf(),
        },
    );
    (executor, dir)
}

#[tokio::test]
async fn a_job_walks_the_full_status_sequence_and_ends_done() {
    let (executor, dir) = executor(1000, 500);
    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::new(CollectingSink {
        snapshots: snapshots.clone(),
    });

    executor
        .run_job(JobAssignment {
            job_id: "job-1".to_string(),
            config: config("https://x/test.pdf"),
            sink,
        })
        .await;

    let snapshots = snapshots.lock().unwrap();
    let first = snapshots.first().unwrap();
    assert_eq!(first.status, JobStatus::Downloading);
    assert_eq!(first.progress, 0.0);
    assert_eq!(first.filename, "test.pdf");
    assert_eq!(first.output_filename, "test_converted.pdf");

    // Progress never decreases and the terminal snapshot comes last.
    let progress: Vec<f64> = snapshots.iter().map(|s| s.progress).collect();
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));

    let last = snapshots.last().unwrap();
    assert_eq!(last.status, JobStatus::Done);
    assert_eq!(last.progress, 100.0);
    assert_eq!(last.compression_percent, 50.0);
    assert_eq!(last.file_size_label, "0.00 MB");

    // The download landed in the shared directory under the derived name.
    assert!(dir.path().join("test.pdf").exists());
}

#[tokio::test]
async fn a_failed_job_reports_error_and_the_loop_continues() {
    let (executor, _dir) = executor(1000, 400);
    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let sink: Arc<dyn SnapshotSink> = Arc::new(CollectingSink {
        snapshots: snapshots.clone(),
    });

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    tx.send(JobAssignment {
        job_id: "job-bad".to_string(),
        config: config("https://x/bad.pdf"),
        sink: sink.clone(),
    })
    .unwrap();
    tx.send(JobAssignment {
        job_id: "job-good".to_string(),
        config: config("https://x/good.pdf"),
        sink,
    })
    .unwrap();
    drop(tx);

    executor.run(rx).await;

    let snapshots = snapshots.lock().unwrap();
    let bad_last = snapshots
        .iter()
        .filter(|s| s.job_id == "job-bad")
        .next_back()
        .unwrap();
    assert_eq!(bad_last.status, JobStatus::Error);
    // The failure snapshot echoes the last reported progress.
    assert_eq!(bad_last.progress, 50.0);

    let good_last = snapshots
        .iter()
        .filter(|s| s.job_id == "job-good")
        .next_back()
        .unwrap();
    assert_eq!(good_last.status, JobStatus::Done);
    assert_eq!(good_last.progress, 100.0);

    // Jobs ran in submission order.
    let first_good = snapshots.iter().position(|s| s.job_id == "job-good").unwrap();
    let last_bad = snapshots
        .iter()
        .rposition(|s| s.job_id == "job-bad")
        .unwrap();
    assert!(last_bad < first_good);
}

#[test]
fn metrics_round_to_two_decimals() {
    let metrics = JobMetrics::from_sizes(3_000_000, 1_234_567);
    assert_eq!(metrics.compression_percent, 58.85);
    assert_eq!(metrics.file_size_label, "1.18 MB");
}

#[test]
fn output_larger_than_input_is_a_negative_compression_not_an_error() {
    let metrics = JobMetrics::from_sizes(100, 150);
    assert_eq!(metrics.compression_percent, -50.0);
}

#[test]
fn empty_input_never_divides_by_zero() {
    let metrics = JobMetrics::from_sizes(0, 10);
    assert_eq!(metrics.compression_percent, 0.0);
}
