/// Filenames derived from a job's source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNames {
    /// Trailing path segment of the URL; where the download lands.
    pub source: String,
    /// `<stem>_converted.pdf`.
    pub output: String,
}

/// Derive the download and output filenames from the URL's trailing path
/// segment. Two distinct URLs sharing a basename collide; the cache keyed on
/// these names accepts that.
pub fn derive_names(url: &str) -> SourceNames {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    let basename = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let source = if basename.is_empty() {
        "document.pdf".to_string()
    } else {
        basename.to_string()
    };
    let stem = source.split(".pdf").next().unwrap_or(&source);
    SourceNames {
        output: format!("{stem}_converted.pdf"),
        source,
    }
}
