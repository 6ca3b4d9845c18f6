use thiserror::Error;

/// Result type alias for REPUTE operations
pub type Result<T> = std::result::Result<T, ReputeError>;

/// Coarse status class of a failed operation.
///
/// Callers that only need to know *why* a query produced nothing can
/// branch on this instead of the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network failure or non-200 response
    Query,
    /// Malformed or unexpected document shape
    Parse,
    /// Local resource, allocation or templating failure
    Internal,
}

/// Errors that can occur when talking to a REPUTE service
#[derive(Error, Debug)]
pub enum ReputeError {
    /// HTTP request failed before a status was received, or while the
    /// body was being read
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Server answered with something other than 200
    #[error("unexpected HTTP status {code} from {url}")]
    Status {
        /// HTTP status code
        code: u16,
        /// URL that was requested
        url: String,
    },

    /// Response buffer could not grow to hold the body
    #[error("short write: response buffer could not grow to {requested} bytes")]
    ShortWrite {
        /// Total capacity that was requested
        requested: usize,
    },

    /// Response document is malformed or has the wrong shape
    #[error("parse error: {0}")]
    Parse(String),

    /// URI template could not be parsed or expanded
    #[error("URI template error: {0}")]
    Template(String),

    /// Expanded template is not a usable URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ReputeError {
    /// Status class of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::Status { .. } | Self::ShortWrite { .. } => ErrorKind::Query,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Template(_) | Self::InvalidUrl(_) | Self::Config(_) | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns the HTTP status code if the server answered with one
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}
