//! Pdfpress app: the worker daemon composition and the orchestrator session
//! consumed by the front-end.
mod broadcast;
mod session;
mod worker;

pub use broadcast::{Broadcaster, ObserverId};
pub use session::{Session, SessionError};
pub use worker::{Worker, WorkerError, WorkerSettings};
