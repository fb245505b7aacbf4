use serde::{Deserialize, Serialize};

/// Orchestrator→executor messages, tagged by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Command {
    Job { info: JobRequest },
    Delete { info: DeleteRequest },
}

/// Payload of a `job` command: the full configuration for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_id: String,
    pub url: String,
    /// `"jpeg"` or `"png"`.
    pub img_format: String,
    pub quality: i64,
    pub ratio: f64,
    pub is_gray: bool,
}

/// Payload of a `delete` command; a best-effort removal signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub job_id: String,
}

/// Executor→orchestrator progress update, distinguished by carrying
/// `id` + `data` rather than a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub id: String,
    pub data: SnapshotData,
}

/// The snapshot body of an [`Update`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData {
    pub filename: String,
    pub status: String,
    pub progress: f64,
    pub output_filename: String,
    pub compress: f64,
    /// Human-readable label such as `"1.25 MB"`; empty until done.
    pub file_size: String,
}

/// Envelope delivered to observers: one update wrapped in an `updates` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverFrame {
    pub updates: Vec<Update>,
}

impl ObserverFrame {
    pub fn single(update: Update) -> Self {
        Self {
            updates: vec![update],
        }
    }
}
