//! Expansion service
//!
//! The entry point the presentation layer calls. It owns a traverser and an
//! assembler and answers the two request shapes:
//! - single-object expansion: a flat URI list
//! - multi-selection expansion: a complete [`ManifestRequest`]
//!
//! An optional overall deadline bounds each call on top of the per-fetch
//! timeout.

use crate::assembler::ManifestAssembler;
use crate::defaults::ManifestDefaults;
use crate::error::ManifestError;
use crate::request::{ManifestRequest, SelectionRequest, SingleExpansionRequest};
use crate::submit::ManifestSubmitter;
use rddms_graph::{
    CancelSignal, GraphFetcher, Resolution, ResolveError, StoreConfig, TraversalOptions, Traverser,
};
use rddms_ref::{dataspace_uri, EmlUri, Node, UriCollector};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Resolves selections and assembles manifests
#[derive(Debug, Clone)]
pub struct ExpansionService {
    traverser: Traverser,
    assembler: ManifestAssembler,
    resolve_timeout: Option<Duration>,
}

impl ExpansionService {
    /// Create service over a fetcher with default store settings
    #[must_use]
    pub fn new(fetcher: Arc<dyn GraphFetcher>, defaults: ManifestDefaults) -> Self {
        Self::with_traverser(Traverser::new(fetcher), defaults)
    }

    /// Create service with fetch timeout and fan-out from `config`
    #[must_use]
    pub fn from_config(
        fetcher: Arc<dyn GraphFetcher>,
        config: &StoreConfig,
        defaults: ManifestDefaults,
    ) -> Self {
        Self::with_traverser(Traverser::from_config(fetcher, config), defaults)
    }

    /// Create service over a prepared traverser
    #[must_use]
    pub fn with_traverser(traverser: Traverser, defaults: ManifestDefaults) -> Self {
        Self {
            traverser,
            assembler: ManifestAssembler::new(defaults),
            resolve_timeout: None,
        }
    }

    /// With overall deadline per call
    #[inline]
    #[must_use]
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = Some(timeout);
        self
    }

    /// Assembler in use
    #[inline]
    #[must_use]
    pub fn assembler(&self) -> &ManifestAssembler {
        &self.assembler
    }

    /// Resolve one object into its resolution report
    ///
    /// # Errors
    /// Returns [`ManifestError::InvalidRequest`] for incomplete requests,
    /// or the resolution failure.
    pub async fn resolve_single(
        &self,
        request: &SingleExpansionRequest,
        cancel: CancelSignal,
    ) -> Result<Resolution, ManifestError> {
        if let Some(problem) = request.validate() {
            return Err(ManifestError::InvalidRequest(problem));
        }
        let seed = request.node();
        self.resolve(&seed.dataspace, &[seed.clone()], &request.options(), cancel)
            .await
    }

    /// Expand one object into its ordered URI closure
    ///
    /// # Errors
    /// See [`ExpansionService::resolve_single`].
    pub async fn expand_single(
        &self,
        request: &SingleExpansionRequest,
    ) -> Result<Vec<String>, ManifestError> {
        self.expand_single_with_cancel(request, CancelSignal::never())
            .await
    }

    /// [`ExpansionService::expand_single`] with caller cancellation
    ///
    /// # Errors
    /// See [`ExpansionService::resolve_single`].
    pub async fn expand_single_with_cancel(
        &self,
        request: &SingleExpansionRequest,
        cancel: CancelSignal,
    ) -> Result<Vec<String>, ManifestError> {
        Ok(self.resolve_single(request, cancel).await?.uris())
    }

    /// Expand a selection into a manifest request
    ///
    /// # Errors
    /// Returns a resolution failure or [`ManifestError::NoFallbackDataspace`].
    /// Unparseable raw and dataspace URIs are skipped, not fatal.
    pub async fn expand_selection(
        &self,
        request: &SelectionRequest,
    ) -> Result<ManifestRequest, ManifestError> {
        self.expand_selection_with_cancel(request, CancelSignal::never())
            .await
    }

    /// [`ExpansionService::expand_selection`] with caller cancellation
    ///
    /// All items resolve together in one traversal, so references shared
    /// between items are fetched once. Raw URIs and dataspace URIs follow
    /// the resolved URIs through the same collector, in canonical form.
    ///
    /// # Errors
    /// See [`ExpansionService::expand_selection`].
    pub async fn expand_selection_with_cancel(
        &self,
        request: &SelectionRequest,
        cancel: CancelSignal,
    ) -> Result<ManifestRequest, ManifestError> {
        let seeds = request.seeds();
        let skipped = request.incomplete_items();
        if skipped > 0 {
            tracing::warn!("Ignoring {} selection item(s) without type or id", skipped);
        }
        let dataspace = request
            .dataspace()
            .or_else(|| seeds.first().map(|s| s.dataspace.as_str()).filter(|ds| !ds.is_empty()))
            .map(str::to_string);

        let mut collector = UriCollector::new();
        if !seeds.is_empty() {
            let ds = dataspace.as_deref().unwrap_or_default();
            if seeds.iter().any(|s| s.dataspace.is_empty()) && ds.is_empty() {
                return Err(ManifestError::InvalidRequest(
                    "selection item without dataspace and no request dataspace".to_string(),
                ));
            }
            let resolution = self.resolve(ds, &seeds, &request.options(), cancel).await?;
            collector.extend_refs(&resolution.refs);
        }

        for entry in &request.raw_uris {
            if let Some(uri) = raw_entry(entry, dataspace.as_deref()) {
                collector.push_uri(&uri);
            }
        }
        for entry in &request.dataspace_uris {
            if let Some(uri) = dataspace_entry(entry) {
                collector.push_uri(&uri);
            }
        }

        let manifest = self.assembler.assemble_collected(
            collector,
            &request.overrides(),
            dataspace.as_deref(),
        )?;
        tracing::info!(
            "Assembled manifest for {} item(s): {} URI(s)",
            request.items.len(),
            manifest.uris.len()
        );
        Ok(manifest)
    }

    /// Hand an assembled manifest to a submitter
    ///
    /// # Errors
    /// Returns [`ManifestError::Submit`] if the submitter fails.
    pub async fn submit(
        &self,
        request: &ManifestRequest,
        submitter: &dyn ManifestSubmitter,
    ) -> Result<Value, ManifestError> {
        tracing::info!("Submitting manifest with {} URI(s)", request.uris.len());
        submitter.submit(request).await.map_err(|e| {
            tracing::error!("Manifest submission failed: {}", e);
            ManifestError::from(e)
        })
    }

    async fn resolve(
        &self,
        ds: &str,
        seeds: &[Node],
        opts: &TraversalOptions,
        cancel: CancelSignal,
    ) -> Result<Resolution, ManifestError> {
        let resolution = self.traverser.resolve_with_cancel(ds, seeds, opts, cancel);
        let result = match self.resolve_timeout {
            Some(limit) => tokio::time::timeout(limit, resolution)
                .await
                .unwrap_or_else(|_| {
                    let duration_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                    tracing::warn!("Resolution exceeded {}ms deadline", duration_ms);
                    Err(ResolveError::TimedOut { duration_ms })
                }),
            None => resolution.await,
        };
        Ok(result?)
    }
}

/// Canonical form of one `rawUris` entry
///
/// Dataspace-less object URIs take `dataspace`. Unparseable entries, and
/// dataspace-less ones with no dataspace to inherit, are skipped.
fn raw_entry(entry: &str, dataspace: Option<&str>) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    let uri = match entry.parse::<EmlUri>() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!("Skipping raw uri {:?}: {}", entry, e);
            return None;
        }
    };
    let uri = match dataspace {
        Some(ds) => uri.with_default_dataspace(ds),
        None => uri,
    };
    if matches!(uri, EmlUri::Object { dataspace: None, .. }) {
        tracing::warn!("Skipping raw uri {:?}: no dataspace to inherit", entry);
        return None;
    }
    Some(uri.to_string())
}

/// Canonical dataspace URI of one `dataspaceUris` entry
///
/// Accepts a bare path or a dataspace URI; anything else is skipped.
fn dataspace_entry(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    if !entry.starts_with(rddms_ref::uri::SCHEME_PREFIX) {
        return Some(dataspace_uri(entry));
    }
    match entry.parse::<EmlUri>() {
        Ok(EmlUri::Dataspace { path }) => Some(dataspace_uri(&path)),
        Ok(EmlUri::Object { .. }) => {
            tracing::warn!("Skipping dataspace entry {:?}: object uri", entry);
            None
        }
        Err(e) => {
            tracing::warn!("Skipping dataspace entry {:?}: {}", entry, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubmitError;
    use crate::submit::MockManifestSubmitter;
    use pretty_assertions::assert_eq;
    use rddms_graph::{FetchError, NodeEdges};
    use rddms_ref::RawReference;

    struct OneCrs;

    #[async_trait::async_trait]
    impl GraphFetcher for OneCrs {
        async fn fetch_edges(&self, node: &Node) -> Result<NodeEdges, FetchError> {
            if node.id == "G1" {
                Ok(NodeEdges::new().with_targets(vec![RawReference::explicit(
                    "resqml20.obj_LocalDepth3dCrs",
                    "C1",
                )]))
            } else {
                Ok(NodeEdges::new())
            }
        }
    }

    fn service() -> ExpansionService {
        ExpansionService::new(Arc::new(OneCrs), ManifestDefaults::for_partition("dp1"))
    }

    #[test]
    fn dataspace_entries() {
        assert_eq!(
            dataspace_entry("demo/Volve").as_deref(),
            Some("eml:///dataspace('demo/Volve')")
        );
        assert_eq!(
            dataspace_entry("eml:///dataspace('demo/Volve')").as_deref(),
            Some("eml:///dataspace('demo/Volve')")
        );
        assert_eq!(dataspace_entry("  "), None);
        assert_eq!(dataspace_entry("eml:///dataspace("), None);
        assert_eq!(
            dataspace_entry("eml:///dataspace('demo/Volve')/resqml20.obj_Fault('F1')"),
            None
        );
    }

    #[test]
    fn raw_entries_are_canonicalized() {
        assert_eq!(
            raw_entry("eml:///resqml20.obj_Fault(F1)", Some("demo/Volve")).as_deref(),
            Some("eml:///dataspace('demo/Volve')/resqml20.obj_Fault('F1')")
        );
        assert_eq!(
            raw_entry("eml:///dataspace('demo/Other')/resqml20.obj_Fault(F2)", Some("demo/Volve"))
                .as_deref(),
            Some("eml:///dataspace('demo/Other')/resqml20.obj_Fault('F2')")
        );
        assert_eq!(raw_entry("eml:///resqml20.obj_Fault('F1')", None), None);
        assert_eq!(raw_entry("not a uri at all", Some("demo/Volve")), None);
        assert_eq!(raw_entry(" ", Some("demo/Volve")), None);
    }

    #[tokio::test]
    async fn single_expansion() {
        let uris = service()
            .expand_single(&SingleExpansionRequest::new(
                "demo/Volve",
                "resqml20.obj_Grid2dRepresentation",
                "G1",
            ))
            .await
            .unwrap();
        assert_eq!(uris.len(), 2);
    }

    #[tokio::test]
    async fn incomplete_single_request() {
        let err = service()
            .expand_single(&SingleExpansionRequest::new("demo/Volve", "", "G1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn submit_passes_response_through() {
        let mut submitter = MockManifestSubmitter::new();
        submitter
            .expect_submit()
            .withf(|r: &ManifestRequest| r.uris.len() == 1)
            .times(1)
            .returning(|_| Ok(serde_json::json!({"id": "manifest-1"})));

        let service = service();
        let manifest = service
            .expand_selection(&SelectionRequest::new().with_dataspace("demo/Volve"))
            .await
            .unwrap();
        let response = service.submit(&manifest, &submitter).await.unwrap();
        assert_eq!(response["id"], "manifest-1");
    }

    #[tokio::test]
    async fn submit_failure_is_reported() {
        let mut submitter = MockManifestSubmitter::new();
        submitter
            .expect_submit()
            .returning(|_| Err(SubmitError::Transport("connection reset".into())));

        let service = service();
        let manifest = service
            .expand_selection(&SelectionRequest::new().with_dataspace("demo/Volve"))
            .await
            .unwrap();
        let err = service.submit(&manifest, &submitter).await.unwrap_err();
        assert!(matches!(err, ManifestError::Submit(SubmitError::Transport(_))));
    }
}
