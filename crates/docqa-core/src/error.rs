//! Error types for docqa

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds, one per pipeline stage so the CLI can tell the user which step failed
#[derive(Error, Debug)]
pub enum Error {
    #[error("No API key provided")]
    MissingCredential,

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Could not read the PDF: {0}")]
    Parse(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Generation service error: {0}")]
    GenerationService(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("No document has been indexed yet")]
    NoDocument,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_stage() {
        assert_eq!(
            Error::Parse("bad header".into()).to_string(),
            "Could not read the PDF: bad header"
        );
        assert_eq!(
            Error::EmbeddingService("refused".into()).to_string(),
            "Embedding service error: refused"
        );
    }
}
