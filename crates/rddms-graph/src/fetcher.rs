//! Graph fetcher seam
//!
//! [`GraphFetcher`] is the only network-facing operation the traversal
//! needs. Everything here besides the trait is pure payload handling that
//! every fetcher implementation shares:
//! - picking the requested object out of single-or-list responses
//! - turning edge listings into [`RawReference`]s
//! - finding embedded DataObjectReferences and record links in an object body

use crate::error::FetchError;
use async_trait::async_trait;
use rddms_ref::{links, Node, RawReference, RecordLink};
use serde_json::{Map, Value};

/// Keys the store uses for an object's own identifier
const OBJECT_ID_KEYS: [&str; 5] = ["uuid", "Uuid", "UUID", "id", "$uuid"];

/// Edges of one node as fetched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeEdges {
    /// Objects referencing the node
    pub sources: Vec<RawReference>,
    /// Objects the node references
    pub targets: Vec<RawReference>,
    /// References embedded in the object body
    pub embedded: Vec<RawReference>,
    /// Record links found in the object's `data` block
    pub record_links: Vec<RecordLink>,
}

impl NodeEdges {
    /// Create empty edges
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With sources
    #[inline]
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<RawReference>) -> Self {
        self.sources = sources;
        self
    }

    /// With targets
    #[inline]
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<RawReference>) -> Self {
        self.targets = targets;
        self
    }

    /// Scan an object body for embedded references and record links
    #[must_use]
    pub fn with_object(mut self, object: &Value) -> Self {
        self.embedded = embedded_references(object);
        self.record_links = record_links(object);
        self
    }

    /// Total raw edge count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len() + self.targets.len() + self.embedded.len()
    }

    /// Check if there are no raw edges
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source of a node's reference edges
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphFetcher: Send + Sync {
    /// Fetch the edges of one node
    ///
    /// # Errors
    /// Returns a [`FetchError`] describing why this node could not be fetched.
    async fn fetch_edges(&self, node: &Node) -> Result<NodeEdges, FetchError>;
}

/// Pick the requested object out of a response
///
/// The store answers with either one object or a list of candidates. From a
/// list, the entry whose id matches wins, else the first object-shaped entry.
#[must_use]
pub fn select_object(response: Value, id: &str) -> Option<Value> {
    match response {
        Value::Object(_) => Some(response),
        Value::Array(items) => {
            let position = items
                .iter()
                .position(|item| item.as_object().is_some_and(|map| object_id(map) == Some(id)))
                .or_else(|| items.iter().position(Value::is_object))?;
            items.into_iter().nth(position)
        }
        _ => None,
    }
}

fn object_id(map: &Map<String, Value>) -> Option<&str> {
    OBJECT_ID_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find_map(Value::as_str)
        .map(str::trim)
}

/// Interpret a `sources`/`targets` listing
///
/// A list of descriptors is the normal shape; a single descriptor or an
/// empty body is tolerated.
///
/// # Errors
/// Returns [`FetchError::Malformed`] for scalar bodies.
pub fn edge_list(response: Value) -> Result<Vec<RawReference>, FetchError> {
    match response {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.into_iter().filter_map(RawReference::from_value).collect()),
        Value::Object(map) => Ok(vec![RawReference::Fields(map)]),
        other => Err(FetchError::Malformed(format!(
            "expected a list of resources, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Collect every DataObjectReference-shaped mapping inside an object
///
/// Duplicates (same content type and id) keep their first occurrence.
#[must_use]
pub fn embedded_references(object: &Value) -> Vec<RawReference> {
    let mut found: Vec<Map<String, Value>> = Vec::new();
    walk(object, &mut found);
    found.into_iter().map(RawReference::Fields).collect()
}

fn walk(value: &Value, found: &mut Vec<Map<String, Value>>) {
    match value {
        Value::Object(map) => {
            if RawReference::is_embedded_reference(map) && !found.contains(map) {
                found.push(map.clone());
            }
            for child in map.values() {
                walk(child, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, found);
            }
        }
        _ => {}
    }
}

/// Record links of an OSDU record body (its `data` block)
#[must_use]
pub fn record_links(object: &Value) -> Vec<RecordLink> {
    object
        .get("data")
        .filter(|data| data.is_object())
        .map(links::scan)
        .unwrap_or_default()
}
