//! Manifest submission seam
//!
//! The transport that posts a manifest to the ingestion workflow lives
//! outside this workspace; it plugs in here.

use crate::error::SubmitError;
use crate::request::ManifestRequest;
use async_trait::async_trait;
use serde_json::Value;

/// Accepts an assembled manifest request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManifestSubmitter: Send + Sync {
    /// Submit the request, returning the downstream response as is
    ///
    /// # Errors
    /// Returns a [`SubmitError`] if the request was refused or not delivered.
    async fn submit(&self, request: &ManifestRequest) -> Result<Value, SubmitError>;
}
