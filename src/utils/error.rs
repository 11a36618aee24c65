// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 400 Bad Request, 403 Forbidden, 503 Unavailable

    #[error("Gemini rate limit exceeded")]
    RateLimited,

    #[error("Prompt was blocked by the model: {0}")]
    Blocked(String),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Failed to parse Gemini response: {0}")]
    Parse(String),
}

impl GeminiError {
    /// Whether another attempt at the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GeminiError::Network(e) => e.is_timeout() || e.is_connect(),
            GeminiError::Http(status) => status.is_server_error(),
            GeminiError::RateLimited => true,
            GeminiError::Blocked(_) | GeminiError::EmptyResponse | GeminiError::Parse(_) => false,
        }
    }
}

/// Failure to turn one `TABLE_START`/`TABLE_END` block into a table.
/// Never leaves the response parser; it only decides between recovery and failure.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Block has no header row")]
    MissingHeader,

    #[error("Unterminated quoted field")]
    UnterminatedQuote,

    #[error("Text outside a quoted field on line {0}")]
    UnquotedField(usize),

    #[error("Parsed table is empty")]
    EmptyTable,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Model call failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        source: GeminiError,
    },

    #[error("Model call failed: {0}")]
    Service(GeminiError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Gemini interaction failed: {0}")]
    Gemini(#[from] GeminiError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_transient_classification() {
        assert!(GeminiError::RateLimited.is_transient());
        assert!(GeminiError::Http(StatusCode::SERVICE_UNAVAILABLE).is_transient());
        assert!(GeminiError::Http(StatusCode::INTERNAL_SERVER_ERROR).is_transient());

        assert!(!GeminiError::Http(StatusCode::BAD_REQUEST).is_transient());
        assert!(!GeminiError::Http(StatusCode::FORBIDDEN).is_transient());
        assert!(!GeminiError::Blocked("SAFETY".to_string()).is_transient());
        assert!(!GeminiError::EmptyResponse.is_transient());
    }
}
