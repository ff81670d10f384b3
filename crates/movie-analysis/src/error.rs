//! Error types shared by every acquisition component.

/// Errors that can occur while fetching or normalizing movie data.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("Network error requesting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request failed for {url} with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unexpected data shape: {0}")]
    DataShape(String),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// HTTP status code carried by an `HttpStatus` error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience result type.
pub type HarvestResult<T> = Result<T, HarvestError>;
