use std::fmt;

use url::Url;

/// Output encoding for rewritten images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Parse the wire/front-end label. Only `jpeg` and `png` are accepted,
    /// case-insensitively.
    pub fn parse(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("jpeg") {
            Some(ImageFormat::Jpeg)
        } else if label.eq_ignore_ascii_case("png") {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        }
    }
}

/// Normalized, immutable description of one compression job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub source_url: String,
    pub format: ImageFormat,
    /// 0..=100; 0 means "remove the image instead of recompressing".
    pub quality: u8,
    /// 0.0..=1.0 scale factor applied to both image dimensions.
    pub resize_ratio: f32,
    pub grayscale: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftError {
    /// `finalize` was called before `mark_configured`.
    NotConfigured,
    /// The draft has no validated source URL.
    MissingSource,
}

impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftError::NotConfigured => write!(f, "configuration has not been marked complete"),
            DraftError::MissingSource => write!(f, "no source url has been set"),
        }
    }
}

impl std::error::Error for DraftError {}

/// Mutable intake builder for a [`JobConfig`].
///
/// Setters clamp their input and may be called in any order; submission is
/// gated on an explicit `mark_configured` call, after which `finalize`
/// produces an owned configuration snapshot. `reset` restores the defaults
/// and clears the gate.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDraft {
    source_url: String,
    format: ImageFormat,
    quality: u8,
    resize_ratio: f32,
    grayscale: bool,
    configured: bool,
}

impl Default for JobDraft {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            format: ImageFormat::Jpeg,
            quality: 100,
            resize_ratio: 1.0,
            grayscale: false,
            configured: false,
        }
    }
}

impl JobDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a source URL that has already been validated by the intake
    /// probe.
    pub fn record_source(&mut self, url: &str) {
        self.source_url = url.to_string();
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Returns false and leaves the draft untouched for unknown labels.
    pub fn set_format(&mut self, label: &str) -> bool {
        match ImageFormat::parse(label) {
            Some(format) => {
                self.format = format;
                true
            }
            None => false,
        }
    }

    pub fn set_quality(&mut self, quality: i64) {
        self.quality = quality.clamp(0, 100) as u8;
    }

    pub fn set_ratio(&mut self, ratio: f64) {
        self.resize_ratio = ratio.max(0.0).min(1.0) as f32;
    }

    pub fn set_grayscale(&mut self, grayscale: bool) {
        self.grayscale = grayscale;
    }

    pub fn mark_configured(&mut self) {
        self.configured = true;
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Produce an immutable configuration copy. Later mutation of the draft
    /// must not affect the returned value.
    pub fn finalize(&self) -> Result<JobConfig, DraftError> {
        if !self.configured {
            return Err(DraftError::NotConfigured);
        }
        if self.source_url.is_empty() {
            return Err(DraftError::MissingSource);
        }
        Ok(JobConfig {
            source_url: self.source_url.clone(),
            format: self.format,
            quality: self.quality,
            resize_ratio: self.resize_ratio,
            grayscale: self.grayscale,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// True when `candidate` parses as an absolute HTTP or HTTPS URL.
pub fn is_http_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
