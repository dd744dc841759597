use thiserror::Error;

/// Error taxonomy shared across the workspace.
///
/// Upstream failures (embedding service, vector index, reasoning service)
/// are distinguished from a missing collection: an unavailable index must
/// never be reported as "no relevant regulation found".
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid line item: {0}")]
    Validation(String),

    #[error("{service} unavailable: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("collection not found: {0}")]
    NotFound(String),

    #[error("missing configuration: {0}")]
    Configuration(String),
}

impl Error {
    /// Short machine-readable kind for per-item failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Upstream { .. } => "upstream",
            Self::NotFound(_) => "not_found",
            Self::Configuration(_) => "configuration",
        }
    }
}
