//! Manifest assembly
//!
//! Merges a collected URI set with ACL and legal metadata. Every field
//! falls back to the injected [`ManifestDefaults`] when the caller leaves it
//! blank, and an empty URI set falls back to the dataspace URI.

use crate::defaults::ManifestDefaults;
use crate::error::ManifestError;
use crate::request::{Acl, Legal, ManifestOverrides, ManifestRequest};
use rddms_ref::{dataspace_uri, EmlUri, UriCollector};

/// Builds [`ManifestRequest`]s from collected URIs
#[derive(Debug, Clone, Default)]
pub struct ManifestAssembler {
    defaults: ManifestDefaults,
}

impl ManifestAssembler {
    /// Create assembler over fixed defaults
    #[inline]
    #[must_use]
    pub fn new(defaults: ManifestDefaults) -> Self {
        Self { defaults }
    }

    /// Defaults in use
    #[inline]
    #[must_use]
    pub fn defaults(&self) -> &ManifestDefaults {
        &self.defaults
    }

    /// Assemble a manifest request
    ///
    /// `uris` are deduplicated in first-seen order. If none remain, the
    /// request carries the single dataspace URI of `dataspace` (or of the
    /// configured fallback dataspace).
    ///
    /// # Errors
    /// Returns [`ManifestError::NoFallbackDataspace`] if there are no URIs
    /// and no dataspace to fall back to, or [`ManifestError::Uri`] if the
    /// fallback dataspace does not form a valid URI.
    pub fn assemble<S: AsRef<str>>(
        &self,
        uris: &[S],
        overrides: &ManifestOverrides,
        dataspace: Option<&str>,
    ) -> Result<ManifestRequest, ManifestError> {
        let mut collector = UriCollector::new();
        collector.extend_uris(uris);
        self.assemble_collected(collector, overrides, dataspace)
    }

    /// Assemble from an already populated collector
    ///
    /// # Errors
    /// Same as [`ManifestAssembler::assemble`].
    pub fn assemble_collected(
        &self,
        mut collector: UriCollector,
        overrides: &ManifestOverrides,
        dataspace: Option<&str>,
    ) -> Result<ManifestRequest, ManifestError> {
        if collector.is_empty() {
            let fallback = dataspace
                .map(str::trim)
                .filter(|ds| !ds.is_empty())
                .or(self.defaults.fallback_dataspace.as_deref())
                .ok_or(ManifestError::NoFallbackDataspace)?;
            tracing::info!("No URIs collected, falling back to dataspace {}", fallback);
            let uri = dataspace_uri(fallback);
            uri.parse::<EmlUri>()?;
            collector.push_uri(&uri);
        }

        let acl = overrides.acl.clone().unwrap_or_default();
        let legal = overrides.legal.clone().unwrap_or_default();

        let request = ManifestRequest {
            uris: collector.into_uris(),
            acl: Acl {
                owners: or_default(acl.owners, &self.defaults.owners),
                viewers: or_default(acl.viewers, &self.defaults.viewers),
            },
            legal: Legal {
                legal_tags: or_default(legal.legal_tags, std::slice::from_ref(&self.defaults.legal_tag)),
                countries: or_default(legal.countries, &self.defaults.countries),
            },
            create_missing_references: overrides
                .create_missing_references
                .unwrap_or(self.defaults.create_missing_references),
        };
        tracing::debug!("Assembled manifest with {} URI(s)", request.uris.len());
        Ok(request)
    }
}

/// Cleaned override values, or the defaults when none remain
fn or_default(values: Vec<String>, defaults: &[String]) -> Vec<String> {
    let cleaned: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if cleaned.is_empty() {
        defaults.to_vec()
    } else {
        cleaned
    }
}
