use thiserror::Error;

/// Why a pipeline stage produced nothing. Boundary operations collapse all of
/// these into empty values; the `try_*` entry points surface them.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unreadable image '{path}': {reason}")]
    UnreadableImage { path: String, reason: String },
    #[error("Decoding backend not available: {0}")]
    DecodingBackendUnavailable(String),
    #[error("Malformed code payload: {0}")]
    MalformedCodePayload(String),
    #[error("No text found")]
    NoTextFound,
    #[error("No codes found")]
    NoCodesFound,
}

impl ExtractError {
    pub fn unreadable(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        ExtractError::UnreadableImage { path: path.display().to_string(), reason: reason.to_string() }
    }

    /// True for outcomes that mean "ran fine, found nothing".
    pub fn is_empty_result(&self) -> bool {
        matches!(self, ExtractError::NoTextFound | ExtractError::NoCodesFound)
    }
}
