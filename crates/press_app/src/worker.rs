use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use press_logging::{press_error, press_info, press_warn};
use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use press_core::{ImageFormat, JobConfig, ProgressSnapshot};
use press_engine::{
    ChannelSnapshotSink, DocumentOpener, Executor, ExecutorSettings, JobAssignment, SnapshotSink,
    SourceFetcher,
};
use press_proto::{
    decode_command, read_frame, write_frame, Command, Decoded, JobRequest, SnapshotData, Update,
};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub listen_addr: String,
    /// Shared working directory for downloads and rewritten outputs.
    pub shared_dir: PathBuf,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            shared_dir: PathBuf::from("./shared"),
        }
    }
}

impl WorkerSettings {
    /// Settings from `PRESS_WORKER_ADDR` / `PRESS_SHARED_DIR`, falling back
    /// to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_addr: std::env::var("PRESS_WORKER_ADDR").unwrap_or(defaults.listen_addr),
            shared_dir: std::env::var("PRESS_SHARED_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.shared_dir),
        }
    }
}

/// The executor daemon: owns the listener and the job queue feeding the
/// single executor task.
pub struct Worker {
    listener: TcpListener,
    job_tx: UnboundedSender<JobAssignment>,
}

impl Worker {
    pub async fn bind(
        settings: WorkerSettings,
        fetcher: Arc<dyn SourceFetcher>,
        opener: Arc<dyn DocumentOpener>,
    ) -> Result<Self, WorkerError> {
        let listener = TcpListener::bind(&settings.listen_addr).await?;
        press_info!("worker listening on {}", listener.local_addr()?);

        let (job_tx, job_rx) = unbounded_channel();
        let executor = Executor::new(
            fetcher,
            opener,
            ExecutorSettings {
                shared_dir: settings.shared_dir,
            },
        );
        tokio::spawn(async move { executor.run(job_rx).await });

        Ok(Self { listener, job_tx })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept orchestrator connections for the process lifetime.
    pub async fn serve(self) -> Result<(), WorkerError> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            press_info!("orchestrator connected from {peer}");
            tokio::spawn(handle_connection(stream, self.job_tx.clone()));
        }
    }
}

async fn handle_connection(stream: TcpStream, job_tx: UnboundedSender<JobAssignment>) {
    let (read_half, mut write_half) = stream.into_split();

    // Writer task: one update frame per snapshot, flushed before the next.
    let (snapshot_tx, mut snapshot_rx) = unbounded_channel::<ProgressSnapshot>();
    tokio::spawn(async move {
        while let Some(snapshot) = snapshot_rx.recv().await {
            if let Err(err) = write_frame(&mut write_half, &to_update(&snapshot)).await {
                press_error!("connection writer failed: {err}");
                break;
            }
        }
    });

    let sink: Arc<dyn SnapshotSink> = Arc::new(ChannelSnapshotSink::new(snapshot_tx));
    let mut reader = BufReader::new(read_half);
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(line)) => match decode_command(&line) {
                Ok(Decoded::Command(Command::Job { info })) => {
                    press_info!("queueing job {}", info.job_id);
                    let assignment = JobAssignment {
                        job_id: info.job_id.clone(),
                        config: to_config(&info),
                        sink: Arc::clone(&sink),
                    };
                    if job_tx.send(assignment).is_err() {
                        press_error!("executor is gone; closing connection");
                        break;
                    }
                }
                Ok(Decoded::Command(Command::Delete { info })) => {
                    // Advisory only: the queue is not searched and a running
                    // job is not preempted.
                    press_info!("delete requested for job {}", info.job_id);
                }
                Ok(Decoded::Unknown(kind)) => {
                    press_warn!("ignoring unknown message kind {kind:?}");
                }
                Err(err) => {
                    press_error!("malformed frame ends the session: {err}");
                    break;
                }
            },
            Ok(None) => {
                press_info!("orchestrator disconnected");
                break;
            }
            Err(err) => {
                press_error!("connection read failed: {err}");
                break;
            }
        }
    }
}

fn to_config(info: &JobRequest) -> JobConfig {
    let format = ImageFormat::parse(&info.img_format).unwrap_or_else(|| {
        press_warn!(
            "unknown image format {:?} for job {}, defaulting to jpeg",
            info.img_format,
            info.job_id
        );
        ImageFormat::default()
    });
    JobConfig {
        source_url: info.url.clone(),
        format,
        quality: info.quality.clamp(0, 100) as u8,
        resize_ratio: info.ratio.max(0.0).min(1.0) as f32,
        grayscale: info.is_gray,
    }
}

fn to_update(snapshot: &ProgressSnapshot) -> Update {
    Update {
        id: snapshot.job_id.clone(),
        data: SnapshotData {
            filename: snapshot.filename.clone(),
            status: snapshot.status.wire_label().to_string(),
            progress: snapshot.progress,
            output_filename: snapshot.output_filename.clone(),
            compress: snapshot.compression_percent,
            file_size: snapshot.file_size_label.clone(),
        },
    }
}
