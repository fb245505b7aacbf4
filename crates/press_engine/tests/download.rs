use std::sync::{Arc, Mutex};

use press_core::{JobStatus, ProgressSnapshot};
use press_engine::{
    CheckpointTracker, DownloadError, DownloadSettings, JobReporter, ReqwestFetcher, SnapshotSink,
    SourceFetcher, DOWNLOAD_CHECKPOINTS,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct CollectingSink {
    snapshots: Arc<Mutex<Vec<ProgressSnapshot>>>,
}

impl SnapshotSink for CollectingSink {
    fn emit(&self, snapshot: ProgressSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }
}

fn reporter() -> (JobReporter, Arc<Mutex<Vec<ProgressSnapshot>>>) {
    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::new(CollectingSink {
        snapshots: snapshots.clone(),
    });
    let reporter = JobReporter::new(
        "job-1".to_string(),
        "paper.pdf".to_string(),
        "paper_converted.pdf".to_string(),
        sink,
    );
    (reporter, snapshots)
}

#[test]
fn tracker_fires_each_checkpoint_once_in_order() {
    let mut tracker = CheckpointTracker::new();

    // 10% of the bytes is 5 of the 50 points: nothing crossed yet.
    assert!(tracker.advance(10, 100).is_empty());
    assert_eq!(tracker.advance(40, 100), vec![10, 20]);
    // No checkpoint ever re-fires.
    assert!(tracker.advance(40, 100).is_empty());
    assert_eq!(tracker.advance(100, 100), vec![30, 40, 50]);
    assert!(tracker.exhausted());
    assert!(tracker.advance(200, 100).is_empty());
}

#[test]
fn tracker_with_unknown_total_never_fires() {
    let mut tracker = CheckpointTracker::new();
    assert!(tracker.advance(1_000_000, 0).is_empty());
    assert!(!tracker.exhausted());
}

#[test]
fn checkpoints_cover_only_the_download_band() {
    assert_eq!(DOWNLOAD_CHECKPOINTS, [0, 10, 20, 30, 40, 50]);
}

#[tokio::test]
async fn download_streams_to_disk_and_reports_increasing_checkpoints() {
    let body = vec![7u8; 100_000];
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/paper.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("paper.pdf");
    let (mut report, snapshots) = reporter();

    let fetcher = ReqwestFetcher::new(DownloadSettings::default());
    let written = fetcher
        .download(&format!("{}/paper.pdf", server.uri()), &dest, &mut report)
        .await
        .expect("download ok");

    assert_eq!(written, body.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), body);

    let progress: Vec<f64> = snapshots
        .lock()
        .unwrap()
        .iter()
        .map(|snapshot| {
            assert_eq!(snapshot.status, JobStatus::Downloading);
            snapshot.progress
        })
        .collect();
    assert_eq!(progress, vec![10.0, 20.0, 30.0, 40.0, 50.0]);
    assert!(progress.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn existing_destination_skips_the_download_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("paper.pdf");
    std::fs::write(&dest, b"cached").unwrap();

    let (mut report, snapshots) = reporter();
    let fetcher = ReqwestFetcher::new(DownloadSettings::default());
    // Nothing listens at this address; a hit would fail the test.
    let written = fetcher
        .download("http://127.0.0.1:9/paper.pdf", &dest, &mut report)
        .await
        .expect("cache hit");

    assert_eq!(written, 6);
    assert_eq!(std::fs::read(&dest).unwrap(), b"cached");
    assert!(snapshots.lock().unwrap().is_empty());
}

#[tokio::test]
async fn http_error_fails_the_download_and_leaves_no_partial_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("missing.pdf");
    let (mut report, _snapshots) = reporter();

    let fetcher = ReqwestFetcher::new(DownloadSettings::default());
    let err = fetcher
        .download(&format!("{}/missing.pdf", server.uri()), &dest, &mut report)
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::HttpStatus(404)));
    assert!(!dest.exists());
}
