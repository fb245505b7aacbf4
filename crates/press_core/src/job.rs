use std::fmt;

/// Process-unique job identifier, generated at submission.
pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Downloading,
    Converting,
    Done,
    Error,
}

impl JobStatus {
    /// The label carried on the wire and shown to observers.
    pub fn wire_label(&self) -> &'static str {
        match self {
            JobStatus::Idle => "Idle",
            JobStatus::Downloading => "Downloading...",
            JobStatus::Converting => "Converting...",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    pub fn from_wire_label(label: &str) -> Option<Self> {
        match label {
            "Idle" => Some(JobStatus::Idle),
            "Downloading..." => Some(JobStatus::Downloading),
            "Converting..." => Some(JobStatus::Converting),
            "done" => Some(JobStatus::Done),
            "error" => Some(JobStatus::Error),
            _ => None,
        }
    }

    /// Done and Error admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_label())
    }
}

/// One tracked compression job, as the orchestrator side sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub source_filename: String,
    pub output_filename: String,
    pub status: JobStatus,
    /// 0..=100.
    pub progress: f64,
    /// Human-readable output size, populated on Done only.
    pub file_size_label: String,
    /// Populated on Done only; negative when the output grew.
    pub compression_percent: f64,
}
