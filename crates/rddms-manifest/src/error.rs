//! Error types for manifest expansion and submission

use rddms_graph::ResolveError;
use rddms_ref::UriError;

/// Failure handing a manifest to the submitter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Submitter refused the request
    #[error("manifest rejected with status {status}: {message}")]
    Rejected {
        /// Status reported by the submitter
        status: u16,
        /// Response excerpt
        message: String,
    },

    /// Request never reached its destination
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Failure expanding or assembling a manifest
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    /// Reference resolution failed
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// A dataspace does not form a valid URI
    #[error("invalid uri: {0}")]
    Uri(#[from] UriError),

    /// Submitter failed
    #[error("submission failed: {0}")]
    Submit(#[from] SubmitError),

    /// Nothing was collected and no dataspace is known for the fallback URI
    #[error("no uris collected and no dataspace to fall back to")]
    NoFallbackDataspace,

    /// Request could not be expanded as given
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ManifestError {
    /// Check if the failure is a credential problem
    #[must_use]
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, Self::Resolve(e) if e.is_credential_failure())
    }

    /// Check if the caller cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Resolve(ResolveError::Cancelled))
    }
}
