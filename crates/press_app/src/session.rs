use std::sync::{Arc, Mutex};

use press_logging::{press_error, press_info, press_warn};
use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;

use press_core::{DraftError, Job, JobId, JobLedger, JobStatus, ProgressSnapshot};
use press_engine::{Intake, IntakeSettings, ValidationReport};
use press_proto::{
    decode_update, read_frame, write_frame, CodecError, Command, DeleteRequest, JobRequest, Update,
};

use crate::broadcast::{Broadcaster, ObserverId};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("submission rejected: {0}")]
    Draft(#[from] DraftError),
}

/// Orchestrator side of the duplex connection.
///
/// Owns the write half, the intake, the job ledger and the broadcaster; a
/// spawned relay task decodes executor updates, applies them to the ledger
/// and publishes them to all observers. One session per connection; there is
/// no reconnect, so a dropped connection ends the session.
pub struct Session {
    intake: Intake,
    writer: OwnedWriteHalf,
    ledger: Arc<Mutex<JobLedger>>,
    broadcaster: Arc<Mutex<Broadcaster>>,
}

impl Session {
    /// Connect to the executor and start relaying its updates.
    pub async fn connect(addr: &str) -> Result<Self, SessionError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, writer) = stream.into_split();
        let ledger = Arc::new(Mutex::new(JobLedger::new()));
        let broadcaster = Arc::new(Mutex::new(Broadcaster::new()));
        tokio::spawn(relay_updates(
            read_half,
            Arc::clone(&ledger),
            Arc::clone(&broadcaster),
        ));
        press_info!("connected to executor at {addr}");
        Ok(Self {
            intake: Intake::new(IntakeSettings::default()),
            writer,
            ledger,
            broadcaster,
        })
    }

    pub async fn validate_source(&mut self, url: &str) -> ValidationReport {
        self.intake.validate_source(url).await
    }

    pub fn set_format(&mut self, label: &str) -> bool {
        self.intake.set_format(label)
    }

    pub fn set_quality(&mut self, quality: i64) {
        self.intake.set_quality(quality);
    }

    pub fn set_ratio(&mut self, ratio: f64) {
        self.intake.set_ratio(ratio);
    }

    pub fn set_grayscale(&mut self, grayscale: bool) {
        self.intake.set_grayscale(grayscale);
    }

    pub fn mark_configured(&mut self) {
        self.intake.mark_configured();
    }

    pub fn reset(&mut self) {
        self.intake.reset();
    }

    /// Freeze the pending configuration and send it as a `job` message.
    pub async fn submit(&mut self) -> Result<JobId, SessionError> {
        let order = self.intake.submit()?;
        let info = JobRequest {
            job_id: order.job_id.clone(),
            url: order.config.source_url.clone(),
            img_format: order.config.format.wire_name().to_string(),
            quality: i64::from(order.config.quality),
            ratio: f64::from(order.config.resize_ratio),
            is_gray: order.config.grayscale,
        };
        write_frame(&mut self.writer, &Command::Job { info }).await?;
        press_info!("submitted job {}", order.job_id);
        Ok(order.job_id)
    }

    /// Best-effort delete: signal the executor and drop the job from
    /// tracking. A job already executing is not preempted.
    pub async fn delete_job(&mut self, job_id: &str) -> Result<(), SessionError> {
        write_frame(
            &mut self.writer,
            &Command::Delete {
                info: DeleteRequest {
                    job_id: job_id.to_string(),
                },
            },
        )
        .await?;
        self.ledger.lock().unwrap().remove(job_id);
        Ok(())
    }

    pub fn subscribe(&self) -> (ObserverId, UnboundedReceiver<String>) {
        self.broadcaster.lock().unwrap().subscribe()
    }

    pub fn unsubscribe(&self, id: ObserverId) {
        self.broadcaster.lock().unwrap().unsubscribe(id);
    }

    pub fn job(&self, job_id: &str) -> Option<Job> {
        self.ledger.lock().unwrap().get(job_id).cloned()
    }

    pub fn tracked_jobs(&self) -> Vec<Job> {
        self.ledger.lock().unwrap().jobs().cloned().collect()
    }
}

async fn relay_updates(
    read_half: OwnedReadHalf,
    ledger: Arc<Mutex<JobLedger>>,
    broadcaster: Arc<Mutex<Broadcaster>>,
) {
    let mut reader = BufReader::new(read_half);
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(line)) => match decode_update(&line) {
                Ok(update) => {
                    apply_update(&ledger, &update);
                    broadcaster.lock().unwrap().publish(&update);
                }
                Err(err) => {
                    press_error!("malformed update ends the session: {err}");
                    break;
                }
            },
            Ok(None) => {
                press_info!("executor connection closed");
                break;
            }
            Err(err) => {
                press_error!("executor connection failed: {err}");
                break;
            }
        }
    }
}

fn apply_update(ledger: &Arc<Mutex<JobLedger>>, update: &Update) {
    let Some(status) = JobStatus::from_wire_label(&update.data.status) else {
        press_warn!("unknown status label {:?}", update.data.status);
        return;
    };
    ledger.lock().unwrap().apply(&ProgressSnapshot {
        job_id: update.id.clone(),
        filename: update.data.filename.clone(),
        status,
        progress: update.data.progress,
        output_filename: update.data.output_filename.clone(),
        compression_percent: update.data.compress,
        file_size_label: update.data.file_size.clone(),
    });
}
