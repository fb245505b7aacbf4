//! Pdfpress core: pure job configuration and tracking state.
mod config;
mod job;
mod ledger;
mod snapshot;

pub use config::{is_http_url, DraftError, ImageFormat, JobConfig, JobDraft};
pub use job::{Job, JobId, JobStatus};
pub use ledger::JobLedger;
pub use snapshot::ProgressSnapshot;
