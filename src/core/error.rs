use thiserror::Error;

/// Errors that abort an export, in whole or for one artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{format} generation failed: {message}")]
    Generation { format: &'static str, message: String },

    #[error("orchestration error: {0}")]
    Orchestration(String),
}

impl ExportError {
    pub fn generation(format: &'static str, err: impl std::fmt::Display) -> Self {
        ExportError::Generation {
            format,
            message: err.to_string(),
        }
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Per-image failure during materialization. Recovered locally: the batch
/// continues and the affected index renders as a placeholder.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("bad image reference: {0}")]
    Reference(String),
}
