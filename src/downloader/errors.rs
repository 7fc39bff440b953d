// Error types for the fetch engine

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Network timeout while talking to the hosting platform
    #[error("Network timeout: {0}")]
    NetworkTimeout(String),

    /// The platform refused the request (429, bot detection, etc.)
    #[error("Request blocked by the video host: {0}")]
    Blocked(String),

    /// yt-dlp could not be started
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// URL the engine cannot handle
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown error with details
    #[error("{0}")]
    Unknown(String),
}

// Classify raw yt-dlp stderr text; the text itself is always kept.
// ToolNotFound is never guessed from text, only raised when spawning fails.
impl From<String> for FetchError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout(s);
        }

        if lower.contains("429") || lower.contains("too many requests") || lower.contains("not a bot") {
            return Self::Blocked(s);
        }

        if lower.contains("invalid url") || lower.contains("unsupported url") || lower.contains("is not a valid url") {
            return Self::InvalidUrl(s);
        }

        if lower.contains("json") {
            return Self::ParseError(s);
        }

        Self::Unknown(s)
    }
}

impl From<&str> for FetchError {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}
