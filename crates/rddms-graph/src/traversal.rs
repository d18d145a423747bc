//! Bounded breadth-first resolution
//!
//! The frontier is expanded one depth level at a time. Within a level,
//! node fetches run concurrently (bounded by the configured fan-out) and
//! are consumed in frontier order by a single loop that owns the visited
//! set and the result list, so output order does not depend on network
//! timing.
//!
//! Failure policy:
//! - credential failures abort the whole resolution
//! - any other fetch failure ends expansion of that node only
//! - a reference that cannot be normalized is skipped

use crate::cancel::CancelSignal;
use crate::config::StoreConfig;
use crate::error::{FetchError, ResolveError};
use crate::fetcher::{GraphFetcher, NodeEdges};
use futures::stream::{self, StreamExt};
use rddms_ref::{collect, normalize, CanonicalRef, Node, RawReference, RecordLink, RefKey, RefRole};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Default expansion depth: the seeds plus their direct references
pub const DEFAULT_MAX_DEPTH: usize = 1;

/// Inclusion policy of one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraversalOptions {
    /// Expand references at all
    pub include_refs: bool,
    /// Hops from the nearest seed beyond which nothing is expanded
    pub max_depth: usize,
}

impl TraversalOptions {
    /// Seeds plus direct references
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds only
    #[inline]
    #[must_use]
    pub fn seeds_only() -> Self {
        Self {
            include_refs: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// With or without reference expansion
    #[inline]
    #[must_use]
    pub fn with_include_refs(mut self, include_refs: bool) -> Self {
        self.include_refs = include_refs;
        self
    }

    /// With depth bound
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Check if nodes at `depth` get their edges fetched
    #[inline]
    #[must_use]
    pub fn expands(&self, depth: usize) -> bool {
        self.include_refs && depth < self.max_depth
    }
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            include_refs: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Counters of one resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalStats {
    /// Nodes whose edges were fetched successfully
    pub nodes_expanded: usize,
    /// Nodes whose fetch failed (non-fatally)
    pub fetch_failures: usize,
    /// Raw references that could not be normalized
    pub skipped_references: usize,
    /// Depth of the deepest included node
    pub max_depth_reached: usize,
}

/// Outcome of one resolution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Included references, seeds first, then in discovery order
    pub refs: Vec<CanonicalRef>,
    /// Record links found in fetched record bodies
    pub record_links: Vec<RecordLink>,
    /// Counters
    pub stats: TraversalStats,
}

impl Resolution {
    /// Canonical URIs in result order
    #[must_use]
    pub fn uris(&self) -> Vec<String> {
        collect(&self.refs)
    }

    /// Number of included references
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Check if nothing was included
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

/// Breadth-first resolver over a [`GraphFetcher`]
#[derive(Clone)]
pub struct Traverser {
    fetcher: Arc<dyn GraphFetcher>,
    fetch_timeout: Duration,
    concurrency: usize,
}

impl std::fmt::Debug for Traverser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traverser")
            .field("fetch_timeout", &self.fetch_timeout)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl Traverser {
    /// Create traverser with default timeout and fan-out
    #[must_use]
    pub fn new(fetcher: Arc<dyn GraphFetcher>) -> Self {
        Self::from_config(fetcher, &StoreConfig::default())
    }

    /// Create traverser with timeout and fan-out from `config`
    #[must_use]
    pub fn from_config(fetcher: Arc<dyn GraphFetcher>, config: &StoreConfig) -> Self {
        Self {
            fetcher,
            fetch_timeout: config.fetch_timeout(),
            concurrency: config.concurrency(),
        }
    }

    /// With per-fetch timeout
    #[inline]
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// With fetch fan-out
    #[inline]
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Resolve the closure of `seeds`
    ///
    /// Seeds without a dataspace are placed in `ds`.
    ///
    /// # Errors
    /// Returns a [`ResolveError`] only for credential failures.
    pub async fn resolve(
        &self,
        ds: &str,
        seeds: &[Node],
        opts: &TraversalOptions,
    ) -> Result<Resolution, ResolveError> {
        self.resolve_with_cancel(ds, seeds, opts, CancelSignal::never())
            .await
    }

    /// Resolve, returning only the references
    ///
    /// # Errors
    /// Same as [`Traverser::resolve`].
    pub async fn resolve_refs(
        &self,
        ds: &str,
        seeds: &[Node],
        opts: &TraversalOptions,
    ) -> Result<Vec<CanonicalRef>, ResolveError> {
        Ok(self.resolve(ds, seeds, opts).await?.refs)
    }

    /// Resolve, stopping early once `cancel` fires
    ///
    /// Partial results are discarded on cancellation.
    ///
    /// # Errors
    /// Returns [`ResolveError::Cancelled`] on cancellation, or a credential
    /// failure.
    pub async fn resolve_with_cancel(
        &self,
        ds: &str,
        seeds: &[Node],
        opts: &TraversalOptions,
        mut cancel: CancelSignal,
    ) -> Result<Resolution, ResolveError> {
        tracing::info!(
            "Resolving {} seed(s) in {} (include_refs={}, max_depth={})",
            seeds.len(),
            ds,
            opts.include_refs,
            opts.max_depth
        );

        let mut run = Run::default();
        let mut frontier = Vec::new();
        for seed in seeds {
            let node = if seed.dataspace.is_empty() {
                Node::new(ds, seed.type_path.clone(), seed.id.clone())
            } else {
                seed.clone()
            };
            if run.admit(node.to_ref(RefRole::Seed)) {
                frontier.push(node);
            }
        }

        let mut depth = 0;
        while !frontier.is_empty() && opts.expands(depth) {
            if cancel.is_cancelled() {
                return Err(Self::cancelled());
            }
            frontier = self.expand_level(frontier, depth, &mut run, &mut cancel).await?;
            depth += 1;
        }

        if cancel.is_cancelled() {
            return Err(Self::cancelled());
        }

        let resolution = run.finish();
        tracing::info!(
            "Resolved {} reference(s): {} expanded, {} failed, {} skipped",
            resolution.refs.len(),
            resolution.stats.nodes_expanded,
            resolution.stats.fetch_failures,
            resolution.stats.skipped_references
        );
        Ok(resolution)
    }

    /// Fetch one level and return the next frontier
    async fn expand_level(
        &self,
        frontier: Vec<Node>,
        depth: usize,
        run: &mut Run,
        cancel: &mut CancelSignal,
    ) -> Result<Vec<Node>, ResolveError> {
        let fetcher = &*self.fetcher;
        let limit = self.fetch_timeout;
        let mut fetches = stream::iter(frontier)
            .map(move |node| async move {
                let result = match tokio::time::timeout(limit, fetcher.fetch_edges(&node)).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Transient(format!(
                        "fetch timed out after {}ms",
                        limit.as_millis()
                    ))),
                };
                (node, result)
            })
            .buffered(self.concurrency);

        let mut next = Vec::new();
        loop {
            let item = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Self::cancelled()),
                item = fetches.next() => item,
            };
            let Some((node, result)) = item else {
                break;
            };

            match result {
                Ok(edges) => {
                    tracing::debug!("Expanding {} at depth {}: {} edge(s)", node, depth, edges.len());
                    run.stats.nodes_expanded += 1;
                    next.extend(run.absorb(&node, edges, depth + 1));
                }
                Err(err) => {
                    if let Some(fatal) = ResolveError::from_fatal(&node, &err) {
                        tracing::error!("Aborting resolution at {}: {}", node, err);
                        return Err(fatal);
                    }
                    tracing::warn!("Skipping expansion of {}: {}", node, err);
                    run.stats.fetch_failures += 1;
                }
            }
        }
        Ok(next)
    }

    fn cancelled() -> ResolveError {
        tracing::info!("Resolution cancelled");
        ResolveError::Cancelled
    }
}

/// Mutable state of one resolution, owned by the consuming loop
#[derive(Default)]
struct Run {
    visited: HashSet<RefKey>,
    refs: Vec<CanonicalRef>,
    links_seen: HashSet<(String, rddms_ref::LinkRole)>,
    record_links: Vec<RecordLink>,
    stats: TraversalStats,
}

impl Run {
    /// Mark visited and include; `false` if already visited
    fn admit(&mut self, r: CanonicalRef) -> bool {
        if self.visited.insert(r.key()) {
            self.refs.push(r);
            true
        } else {
            false
        }
    }

    /// Fold one node's edges in; returns newly admitted nodes
    fn absorb(&mut self, node: &Node, edges: NodeEdges, depth: usize) -> Vec<Node> {
        let NodeEdges {
            sources,
            targets,
            embedded,
            record_links,
        } = edges;

        let labelled = targets
            .iter()
            .map(|raw| (raw, RefRole::Target))
            .chain(sources.iter().map(|raw| (raw, RefRole::Source)))
            .chain(embedded.iter().map(|raw| (raw, RefRole::GenericLink)));

        let mut admitted = Vec::new();
        for (raw, role) in labelled {
            let Some(r) = self.normalize_edge(node, raw) else {
                continue;
            };
            let role = role.for_type(&r.type_path);
            let r = r.with_role(role);
            let next = r.node();
            if self.admit(r) {
                self.stats.max_depth_reached = self.stats.max_depth_reached.max(depth);
                admitted.push(next);
            }
        }

        for link in record_links {
            if self.links_seen.insert((link.id.clone(), link.role)) {
                self.record_links.push(link);
            }
        }
        admitted
    }

    fn normalize_edge(&mut self, node: &Node, raw: &RawReference) -> Option<CanonicalRef> {
        let normalized = normalize(&node.dataspace, raw);
        if normalized.is_none() {
            tracing::warn!("Skipping unresolvable reference on {}: {:?}", node, raw);
            self.stats.skipped_references += 1;
        }
        normalized
    }

    fn finish(self) -> Resolution {
        Resolution {
            refs: self.refs,
            record_links: self.record_links,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenError;
    use crate::fetcher::MockGraphFetcher;
    use mockall::predicate::function;
    use pretty_assertions::assert_eq;

    const DS: &str = "demo/Volve";
    const GRID: &str = "resqml20.obj_Grid2dRepresentation";
    const CRS: &str = "resqml20.obj_LocalDepth3dCrs";

    fn grid() -> Node {
        Node::new(DS, GRID, "G1")
    }

    fn traverser(mock: MockGraphFetcher) -> Traverser {
        Traverser::new(Arc::new(mock))
    }

    fn crs_edges() -> NodeEdges {
        NodeEdges::new().with_targets(vec![RawReference::content_type(
            "application/x-resqml+xml;version=2.0;type=obj_LocalDepth3dCrs",
            "C1",
        )])
    }

    #[test]
    fn options_expand_policy() {
        let opts = TraversalOptions::default();
        assert!(opts.expands(0));
        assert!(!opts.expands(1));
        assert!(!TraversalOptions::seeds_only().expands(0));
        assert!(TraversalOptions::new().with_max_depth(3).expands(2));
    }

    #[tokio::test]
    async fn seed_and_direct_crs() {
        let mut mock = MockGraphFetcher::new();
        mock.expect_fetch_edges()
            .with(function(|n: &Node| n.id == "G1"))
            .times(1)
            .returning(|_| Ok(crs_edges()));

        let resolution = traverser(mock)
            .resolve(DS, &[grid()], &TraversalOptions::default())
            .await
            .unwrap();

        assert_eq!(
            resolution.uris(),
            vec![
                format!("eml:///dataspace('{DS}')/{GRID}('G1')"),
                format!("eml:///dataspace('{DS}')/{CRS}('C1')"),
            ]
        );
        assert_eq!(resolution.refs[0].role, RefRole::Seed);
        assert_eq!(resolution.refs[1].role, RefRole::Crs);
        assert_eq!(resolution.stats.nodes_expanded, 1);
        assert_eq!(resolution.stats.max_depth_reached, 1);
    }

    #[tokio::test]
    async fn seeds_only_never_fetches() {
        let mut mock = MockGraphFetcher::new();
        mock.expect_fetch_edges().never();

        let resolution = traverser(mock)
            .resolve(DS, &[grid()], &TraversalOptions::seeds_only())
            .await
            .unwrap();
        assert_eq!(resolution.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_seeds_collapse() {
        let mut mock = MockGraphFetcher::new();
        mock.expect_fetch_edges().times(1).returning(|_| Ok(NodeEdges::new()));

        let resolution = traverser(mock)
            .resolve(DS, &[grid(), grid()], &TraversalOptions::default())
            .await
            .unwrap();
        assert_eq!(resolution.len(), 1);
    }

    #[tokio::test]
    async fn seed_without_dataspace_inherits() {
        let mut mock = MockGraphFetcher::new();
        mock.expect_fetch_edges()
            .with(function(|n: &Node| n.dataspace == DS))
            .returning(|_| Ok(NodeEdges::new()));

        let resolution = traverser(mock)
            .resolve(DS, &[Node::new("", GRID, "G1")], &TraversalOptions::default())
            .await
            .unwrap();
        assert_eq!(resolution.refs[0].dataspace, DS);
    }

    #[tokio::test]
    async fn unauthorized_aborts() {
        let mut mock = MockGraphFetcher::new();
        mock.expect_fetch_edges()
            .returning(|_| Err(FetchError::Unauthorized("token expired".into())));

        let err = traverser(mock)
            .resolve(DS, &[grid()], &TraversalOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn token_failure_aborts() {
        let mut mock = MockGraphFetcher::new();
        mock.expect_fetch_edges()
            .returning(|_| Err(FetchError::Token(TokenError::Missing)));

        let err = traverser(mock)
            .resolve(DS, &[grid()], &TraversalOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_credential_failure());
    }

    #[tokio::test]
    async fn not_found_degrades() {
        let mut mock = MockGraphFetcher::new();
        mock.expect_fetch_edges()
            .returning(|_| Err(FetchError::NotFound("gone".into())));

        let resolution = traverser(mock)
            .resolve(DS, &[grid()], &TraversalOptions::default())
            .await
            .unwrap();
        assert_eq!(resolution.len(), 1);
        assert_eq!(resolution.stats.fetch_failures, 1);
    }

    #[tokio::test]
    async fn unnormalizable_references_are_counted() {
        let mut mock = MockGraphFetcher::new();
        mock.expect_fetch_edges().returning(|_| {
            Ok(NodeEdges::new().with_targets(vec![
                RawReference::from("not a uri"),
                RawReference::explicit("resqml20.obj_Horizon", "H1"),
            ]))
        });

        let resolution = traverser(mock)
            .resolve(DS, &[grid()], &TraversalOptions::default())
            .await
            .unwrap();
        assert_eq!(resolution.len(), 2);
        assert_eq!(resolution.stats.skipped_references, 1);
        assert_eq!(resolution.refs[1].role, RefRole::Target);
    }

    #[tokio::test]
    async fn sources_and_embedded_are_labelled() {
        let mut mock = MockGraphFetcher::new();
        mock.expect_fetch_edges().returning(|_| {
            let mut edges = NodeEdges::new()
                .with_sources(vec![RawReference::explicit("resqml20.obj_Grid2dPatch", "P1")]);
            edges.embedded = vec![RawReference::explicit("eml20.obj_EpcExternalPartReference", "E1")];
            Ok(edges)
        });

        let resolution = traverser(mock)
            .resolve(DS, &[grid()], &TraversalOptions::default())
            .await
            .unwrap();
        let roles: Vec<RefRole> = resolution.refs.iter().map(|r| r.role).collect();
        assert_eq!(roles, vec![RefRole::Seed, RefRole::Source, RefRole::GenericLink]);
    }

    #[tokio::test]
    async fn slow_fetch_times_out_as_failure() {
        struct Stalled;

        #[async_trait::async_trait]
        impl GraphFetcher for Stalled {
            async fn fetch_edges(&self, _node: &Node) -> Result<NodeEdges, FetchError> {
                std::future::pending().await
            }
        }

        let resolution = Traverser::new(Arc::new(Stalled))
            .with_fetch_timeout(Duration::from_millis(10))
            .resolve(DS, &[grid()], &TraversalOptions::default())
            .await
            .unwrap();
        assert_eq!(resolution.len(), 1);
        assert_eq!(resolution.stats.fetch_failures, 1);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let mut mock = MockGraphFetcher::new();
        mock.expect_fetch_edges().never();

        let (handle, signal) = crate::cancel::cancel_pair();
        handle.cancel();
        let err = traverser(mock)
            .resolve_with_cancel(DS, &[grid()], &TraversalOptions::default(), signal)
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::Cancelled);
    }

    #[tokio::test]
    async fn record_links_are_reported_once() {
        let mut mock = MockGraphFetcher::new();
        mock.expect_fetch_edges().returning(|_| {
            let object = serde_json::json!({
                "data": {"ParentWorkProductID": "dp:work-product--WorkProduct:wp1:1"}
            });
            Ok(crs_edges().with_object(&object))
        });

        let resolution = traverser(mock)
            .resolve(DS, &[grid(), Node::new(DS, GRID, "G2")], &TraversalOptions::default())
            .await
            .unwrap();
        assert_eq!(resolution.record_links.len(), 1);
        // C1 is shared by both grids and included once
        assert_eq!(resolution.len(), 3);
    }
}
