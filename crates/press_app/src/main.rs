//! Pdfpress worker daemon: accepts the orchestrator connection and runs
//! queued compression jobs one at a time.
use std::path::Path;
use std::sync::Arc;

use press_app::{Worker, WorkerSettings};
use press_engine::{DownloadSettings, LopdfOpener, ReqwestFetcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    press_logging::initialize(Path::new("./worker.log"));

    let worker = Worker::bind(
        WorkerSettings::from_env(),
        Arc::new(ReqwestFetcher::new(DownloadSettings::default())),
        Arc::new(LopdfOpener),
    )
    .await?;
    worker.serve().await?;
    Ok(())
}
