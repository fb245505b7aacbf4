use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("document error: {0}")]
    Document(String),
    #[error("unsupported image {name}: {detail}")]
    UnsupportedImage { name: String, detail: String },
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("image encode failed: {0}")]
    Encode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can end one job; the executor catches this, reports the
/// failure, and moves on to the next queued job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),
    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
