//! Error types for graph fetching and resolution
//!
//! Two layers, mirroring how failures propagate:
//! - [`FetchError`]: what happened to one node's fetch
//! - [`ResolveError`]: the terminal failures of a whole resolution
//!
//! Only credential failures cross from the first layer into the second;
//! every other fetch failure ends that branch of the graph and nothing more.

/// Failure fetching one node's edges
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Node does not exist (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Credential rejected (401)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Credential lacks access (403)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Timeout, network failure, throttling or 5xx
    #[error("transient failure: {0}")]
    Transient(String),

    /// Any other 4xx the store returned for this node
    #[error("rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status
        status: u16,
        /// Response excerpt
        message: String,
    },

    /// Response body could not be interpreted
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Request URL could not be built from the store configuration
    #[error("invalid store url: {0}")]
    InvalidUrl(String),

    /// Bearer token could not be obtained
    #[error("token unavailable: {0}")]
    Token(#[from] TokenError),
}

impl FetchError {
    /// Classify an HTTP status code
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            408 | 429 | 500..=599 => Self::Transient(format!("status {status}: {message}")),
            _ => Self::Rejected { status, message },
        }
    }

    /// Check if this failure must abort the whole resolution
    ///
    /// Credential failures are fatal: no further fetch will succeed either.
    /// The same holds for a store URL that cannot be built.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized(_) | Self::Forbidden(_) | Self::Token(_) | Self::InvalidUrl(_)
        )
    }

    /// Check if a caller could reasonably retry later
    ///
    /// The engine itself never retries.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Failure obtaining a bearer token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// No credential configured
    #[error("no access token configured")]
    Missing,

    /// Provider-specific failure
    #[error("token provider failed: {0}")]
    Provider(String),
}

/// Terminal failure of a resolution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Credential rejected while fetching a node
    #[error("unauthorized while fetching {node}: {message}")]
    Unauthorized {
        /// Node being fetched
        node: String,
        /// Store message
        message: String,
    },

    /// Credential lacks access to a node
    #[error("forbidden while fetching {node}: {message}")]
    Forbidden {
        /// Node being fetched
        node: String,
        /// Store message
        message: String,
    },

    /// Bearer token could not be obtained
    #[error("token unavailable: {0}")]
    Token(#[from] TokenError),

    /// Caller cancelled the resolution
    #[error("resolution cancelled")]
    Cancelled,

    /// Resolution exceeded its overall deadline
    #[error("resolution timed out after {duration_ms}ms")]
    TimedOut {
        /// Deadline in milliseconds
        duration_ms: u64,
    },

    /// Request could not be resolved as given
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ResolveError {
    /// Lift a fatal fetch failure into a resolution failure
    ///
    /// Returns `None` for non-fatal failures.
    #[must_use]
    pub fn from_fatal(node: impl ToString, err: &FetchError) -> Option<Self> {
        match err {
            FetchError::Unauthorized(message) => Some(Self::Unauthorized {
                node: node.to_string(),
                message: message.clone(),
            }),
            FetchError::Forbidden(message) => Some(Self::Forbidden {
                node: node.to_string(),
                message: message.clone(),
            }),
            FetchError::Token(e) => Some(Self::Token(e.clone())),
            FetchError::InvalidUrl(message) => Some(Self::InvalidRequest(message.clone())),
            _ => None,
        }
    }

    /// Check if the failure is a credential problem
    #[inline]
    #[must_use]
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::Forbidden { .. } | Self::Token(_)
        )
    }
}
