//! Testing utilities for the RDDMS workspace
//!
//! An in-memory object store implementing [`GraphFetcher`], plus fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rddms_graph::{FetchError, GraphFetcher, NodeEdges};
use rddms_ref::{Node, RawReference, RefKey};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const VOLVE_DS: &str = "demo/Volve";
pub const GRID_TYPE: &str = "resqml20.obj_Grid2dRepresentation";
pub const CRS_TYPE: &str = "resqml20.obj_LocalDepth3dCrs";
pub const CRS_CONTENT_TYPE: &str = "application/x-resqml+xml;version=2.0;type=obj_LocalDepth3dCrs";
pub const NODE_TYPE: &str = "resqml20.obj_GenericNode";

/// Graph fetcher over in-memory edges
#[derive(Debug, Default)]
pub struct MemoryStore {
    targets: HashMap<RefKey, Vec<RawReference>>,
    sources: HashMap<RefKey, Vec<RawReference>>,
    objects: HashMap<RefKey, Value>,
    failures: HashMap<RefKey, FetchError>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Node>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit `{typePath, id}` target edge
    pub fn with_target(self, from: (&str, &str), to: (&str, &str)) -> Self {
        self.with_raw_target(from, RawReference::explicit(to.0, to.1))
    }

    pub fn with_raw_target(mut self, from: (&str, &str), raw: RawReference) -> Self {
        self.targets.entry(RefKey::new(from.0, from.1)).or_default().push(raw);
        self
    }

    pub fn with_source(mut self, of: (&str, &str), source: (&str, &str)) -> Self {
        self.sources
            .entry(RefKey::new(of.0, of.1))
            .or_default()
            .push(RawReference::explicit(source.0, source.1));
        self
    }

    /// Object body, scanned for embedded references and record links
    pub fn with_object(mut self, of: (&str, &str), object: Value) -> Self {
        self.objects.insert(RefKey::new(of.0, of.1), object);
        self
    }

    pub fn with_failure(mut self, of: (&str, &str), err: FetchError) -> Self {
        self.failures.insert(RefKey::new(of.0, of.1), err);
        self
    }

    /// Delay every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Nodes fetched so far, in call order
    pub fn calls(&self) -> Vec<Node> {
        self.calls.lock().clone()
    }

    /// Most fetches ever running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn fetched(&self, type_path: &str, id: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|n| n.type_path == type_path && n.id == id)
            .count()
    }
}

#[async_trait]
impl GraphFetcher for MemoryStore {
    async fn fetch_edges(&self, node: &Node) -> Result<NodeEdges, FetchError> {
        self.calls.lock().push(node.clone());
        let _in_flight = InFlight::enter(self);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let key = node.key();
        if let Some(err) = self.failures.get(&key) {
            return Err(err.clone());
        }

        let mut edges = NodeEdges::new()
            .with_targets(self.targets.get(&key).cloned().unwrap_or_default())
            .with_sources(self.sources.get(&key).cloned().unwrap_or_default());
        if let Some(object) = self.objects.get(&key) {
            edges = edges.with_object(object);
        }
        Ok(edges)
    }
}

/// Counts a running fetch until dropped
struct InFlight<'a> {
    store: &'a MemoryStore,
}

impl<'a> InFlight<'a> {
    fn enter(store: &'a MemoryStore) -> Self {
        let now = store.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        store.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Self { store }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.store.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Numbered node of a synthetic graph
pub fn node(i: usize) -> Node {
    Node::new(VOLVE_DS, NODE_TYPE, format!("n{i}"))
}

/// Store whose target edges are `edges` between numbered nodes
pub fn graph(edges: &[(usize, usize)]) -> MemoryStore {
    edges.iter().fold(MemoryStore::new(), |store, (from, to)| {
        store.with_target(
            (NODE_TYPE, format!("n{from}").as_str()),
            (NODE_TYPE, format!("n{to}").as_str()),
        )
    })
}

/// Shortest hop count from node 0 to every reachable numbered node
pub fn hop_distances(edges: &[(usize, usize)]) -> HashMap<usize, usize> {
    let mut dist = HashMap::from([(0, 0)]);
    let mut queue = std::collections::VecDeque::from([0]);
    while let Some(at) = queue.pop_front() {
        let d = dist[&at];
        for (_, to) in edges.iter().filter(|(from, _)| *from == at) {
            if !dist.contains_key(to) {
                dist.insert(*to, d + 1);
                queue.push_back(*to);
            }
        }
    }
    dist
}

pub fn volve_grid() -> Node {
    Node::new(VOLVE_DS, GRID_TYPE, "G1")
}

pub fn grid_uri() -> String {
    volve_grid().uri()
}

pub fn crs_uri() -> String {
    rddms_ref::object_uri(VOLVE_DS, CRS_TYPE, "C1")
}

/// Grid G1 with one CRS target C1, encoded as the store does (content type + UUID)
pub fn volve_store() -> MemoryStore {
    MemoryStore::new().with_raw_target(
        (GRID_TYPE, "G1"),
        RawReference::content_type(CRS_CONTENT_TYPE, "C1"),
    )
}
