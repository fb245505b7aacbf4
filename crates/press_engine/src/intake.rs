use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use uuid::Uuid;

use press_core::{is_http_url, DraftError, JobConfig, JobDraft, JobId};

#[derive(Debug, Clone)]
pub struct IntakeSettings {
    pub request_timeout: Duration,
    pub max_megabytes: f64,
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_megabytes: 500.0,
        }
    }
}

/// Outcome of a source probe; validation failures are values, never errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub ok: bool,
    pub reason: String,
    pub content_type: Option<String>,
    pub size_megabytes: Option<f64>,
}

impl ValidationReport {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: reason.into(),
            content_type: None,
            size_megabytes: None,
        }
    }

    fn accepted(content_type: String, size_megabytes: Option<f64>) -> Self {
        Self {
            ok: true,
            reason: "PDF is valid and downloadable".to_string(),
            content_type: Some(content_type),
            size_megabytes,
        }
    }
}

/// A submission ready to be framed as a `job` message.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOrder {
    pub job_id: JobId,
    pub config: JobConfig,
}

/// Collaborator-facing intake: validates a candidate source and assembles the
/// pending configuration one setter at a time, gated by `mark_configured`.
pub struct Intake {
    draft: JobDraft,
    settings: IntakeSettings,
}

impl Intake {
    pub fn new(settings: IntakeSettings) -> Self {
        Self {
            draft: JobDraft::new(),
            settings,
        }
    }

    /// Probe `url` for a downloadable PDF. On success the URL is recorded as
    /// the pending configuration's source. Transport errors are caught and
    /// surfaced in the report.
    pub async fn validate_source(&mut self, url: &str) -> ValidationReport {
        if !is_http_url(url) {
            return ValidationReport::rejected("Invalid protocol");
        }
        match self.probe(url).await {
            Ok(report) => {
                if report.ok {
                    self.draft.record_source(url);
                }
                report
            }
            Err(err) => ValidationReport::rejected(err.to_string()),
        }
    }

    async fn probe(&self, url: &str) -> Result<ValidationReport, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(self.settings.request_timeout)
            .build()?;

        let head = client.head(url).send().await?;
        let status = head.status();
        if !status.is_success() {
            return Ok(ValidationReport::rejected(format!(
                "HTTP error: {}",
                status.as_u16()
            )));
        }

        let content_type = head
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.to_ascii_lowercase().contains("pdf") {
            return Ok(ValidationReport::rejected(format!(
                "Not a PDF content type: {content_type}"
            )));
        }

        // The advertised size, not the (empty) HEAD body length.
        let size_megabytes = head
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .map(|bytes| bytes as f64 / (1024.0 * 1024.0));
        if let Some(size) = size_megabytes {
            if size > self.settings.max_megabytes {
                return Ok(ValidationReport::rejected(format!(
                    "File too large: {size:.2} MB"
                )));
            }
        }

        // Confirm the resource actually streams: read the first body chunk.
        let body = client.get(url).send().await?;
        let mut stream = body.bytes_stream();
        match stream.next().await {
            Some(Ok(chunk)) if !chunk.is_empty() => {
                Ok(ValidationReport::accepted(content_type, size_megabytes))
            }
            Some(Err(err)) => Err(err),
            _ => Ok(ValidationReport::rejected("Empty file / cannot stream")),
        }
    }

    pub fn set_format(&mut self, label: &str) -> bool {
        self.draft.set_format(label)
    }

    pub fn set_quality(&mut self, quality: i64) {
        self.draft.set_quality(quality);
    }

    pub fn set_ratio(&mut self, ratio: f64) {
        self.draft.set_ratio(ratio);
    }

    pub fn set_grayscale(&mut self, grayscale: bool) {
        self.draft.set_grayscale(grayscale);
    }

    pub fn mark_configured(&mut self) {
        self.draft.mark_configured();
    }

    pub fn is_configured(&self) -> bool {
        self.draft.is_configured()
    }

    pub fn source_url(&self) -> &str {
        self.draft.source_url()
    }

    /// Freeze the configuration and mint a fresh job id. The Job itself is
    /// constructed on the executor side.
    pub fn submit(&self) -> Result<JobOrder, DraftError> {
        let config = self.draft.finalize()?;
        Ok(JobOrder {
            job_id: Uuid::new_v4().to_string(),
            config,
        })
    }

    /// Restore default configuration and clear the submission gate.
    pub fn reset(&mut self) {
        self.draft.reset();
    }
}
