use thiserror::Error;

/// Why a credential was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProblem {
    /// No key configured at all
    Missing,
    /// A key is configured but does not look like one
    Malformed,
    /// The service rejected the key
    Rejected,
}

/// Classification used by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    SafetyBlocked,
    Transient,
    MalformedResponse,
    Unknown,
}

impl ErrorKind {
    /// Only transient failures are worth another attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

/// All errors produced by statement extraction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// Credential missing, malformed or rejected.
    #[error("Authentication error: {message}")]
    Auth { problem: AuthProblem, message: String },

    /// The service refused the document on content-policy grounds.
    #[error("The document was blocked by the service's content policy ({0}); try a different statement file")]
    SafetyBlocked(String),

    /// Overload, rate limiting or a transport hiccup.
    #[error("The extraction service is temporarily unavailable: {0}")]
    Transient(String),

    /// The service answered, but not with the expected contract.
    #[error("The extraction service returned an unexpected response: {0}")]
    MalformedResponse(String),

    /// Anything not covered above, message passed through.
    #[error("{0}")]
    Unknown(String),

    /// Every attempt failed with a transient error.
    #[error("Extraction failed after {attempts} attempts; the service is busy, try again in a few minutes (last error: {last})")]
    Exhausted { attempts: u32, last: Box<ExtractError> },
}

impl ExtractError {
    pub fn auth(problem: AuthProblem, message: impl Into<String>) -> Self {
        ExtractError::Auth {
            problem,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Auth { .. } => ErrorKind::Auth,
            ExtractError::SafetyBlocked(_) => ErrorKind::SafetyBlocked,
            ExtractError::Transient(_) | ExtractError::Exhausted { .. } => ErrorKind::Transient,
            ExtractError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            ExtractError::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

/// Convenience alias used throughout the extraction crate.
pub type Result<T> = std::result::Result<T, ExtractError>;
