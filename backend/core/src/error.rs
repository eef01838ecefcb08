use thiserror::Error;

/// Error kinds for a docsift batch run.
///
/// Some kinds are recoverable (the affected document or stage is skipped or
/// falls back) and some abort the run; see [`DocsiftError::is_recoverable`].
#[derive(Debug, Error)]
pub enum DocsiftError {
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("document not found: {document}")]
    MissingDocument { document: String },

    #[error("failed to parse {document}: {message}")]
    ParseFailure { document: String, message: String },

    #[error("malformed block on page {page}: {reason}")]
    MalformedBlock { page: u32, reason: String },

    #[error("no chunk longer than {min_words} words in {documents} parsed document(s)")]
    EmptyResult { documents: usize, min_words: usize },

    #[error("query expansion failed: {0}")]
    ExpansionFailure(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DocsiftError {
    /// Whether the run can continue after this error (skip or fall back).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DocsiftError::MissingDocument { .. }
                | DocsiftError::ParseFailure { .. }
                | DocsiftError::MalformedBlock { .. }
                | DocsiftError::ExpansionFailure(_)
        )
    }
}

pub type DocsiftResult<T> = std::result::Result<T, DocsiftError>;
