//! Pdfpress engine: intake probe, download and transform stages, and the
//! single-consumer executor loop.
mod document;
mod download;
mod executor;
mod filename;
mod intake;
mod progress;
mod recode;
mod transform;
mod types;

pub use document::{DocumentEditor, DocumentOpener, ImageHandle, LopdfEditor, LopdfOpener};
pub use download::{CheckpointTracker, DownloadSettings, ReqwestFetcher, SourceFetcher,
    DOWNLOAD_CHECKPOINTS};
pub use executor::{Executor, ExecutorSettings, JobAssignment, JobMetrics};
pub use filename::{derive_names, SourceNames};
pub use intake::{Intake, IntakeSettings, JobOrder, ValidationReport};
pub use progress::{ChannelSnapshotSink, JobReporter, SnapshotSink};
pub use recode::{recode, EncodedImage, StreamFilter};
pub use transform::{rewrite_images, TransformOutcome};
pub use types::{DownloadError, JobError, TransformError};
