//! URI collection
//!
//! [`UriCollector`] accumulates canonical URIs in first-seen order. Object
//! URIs are deduplicated by `(typePath, id)`, dataspace URIs and anything
//! unparseable by exact string.

use crate::node::{CanonicalRef, RefKey};
use crate::uri::EmlUri;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CollectKey {
    Object(RefKey),
    Exact(String),
}

/// Ordered, deduplicating URI accumulator
#[derive(Debug, Clone, Default)]
pub struct UriCollector {
    entries: IndexMap<CollectKey, String>,
}

impl UriCollector {
    /// Create empty collector
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canonical reference; returns `false` if its key was already present
    pub fn push_ref(&mut self, r: &CanonicalRef) -> bool {
        self.insert(CollectKey::Object(r.key()), r.uri.clone())
    }

    /// Add a URI string; returns `false` if its key was already present
    ///
    /// Blank strings are ignored.
    pub fn push_uri(&mut self, uri: &str) -> bool {
        let uri = uri.trim();
        if uri.is_empty() {
            return false;
        }
        let key = match uri.parse::<EmlUri>() {
            Ok(EmlUri::Object { type_path, id, .. }) => CollectKey::Object(RefKey::new(type_path, id)),
            _ => CollectKey::Exact(uri.to_string()),
        };
        self.insert(key, uri.to_string())
    }

    /// Add many references
    pub fn extend_refs<'a>(&mut self, refs: impl IntoIterator<Item = &'a CanonicalRef>) {
        for r in refs {
            self.push_ref(r);
        }
    }

    /// Add many URI strings
    pub fn extend_uris<S: AsRef<str>>(&mut self, uris: impl IntoIterator<Item = S>) {
        for uri in uris {
            self.push_uri(uri.as_ref());
        }
    }

    /// Number of distinct entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was collected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collected URIs in first-seen order
    #[must_use]
    pub fn into_uris(self) -> Vec<String> {
        self.entries.into_values().collect()
    }

    fn insert(&mut self, key: CollectKey, uri: String) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, uri);
        true
    }
}

/// Ordered, deduplicated URIs of a reference list
#[must_use]
pub fn collect(refs: &[CanonicalRef]) -> Vec<String> {
    let mut collector = UriCollector::new();
    collector.extend_refs(refs);
    collector.into_uris()
}

/// Ordered, deduplicated form of a URI list
#[must_use]
pub fn collect_uris<S: AsRef<str>>(uris: &[S]) -> Vec<String> {
    let mut collector = UriCollector::new();
    collector.extend_uris(uris);
    collector.into_uris()
}
