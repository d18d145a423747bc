//! Request shapes
//!
//! Inbound expansion requests ([`SingleExpansionRequest`],
//! [`SelectionRequest`]) and the outbound manifest-build body
//! ([`ManifestRequest`]). Field names follow the JSON the presentation layer
//! and the store exchange.

use rddms_graph::{TraversalOptions, DEFAULT_MAX_DEPTH};
use rddms_ref::Node;
use serde::{Deserialize, Deserializer, Serialize};

/// Access control of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    /// Owner groups
    pub owners: Vec<String>,
    /// Viewer groups
    pub viewers: Vec<String>,
}

/// Legal metadata of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legal {
    /// Legal tags
    #[serde(rename = "legaltags", alias = "legalTags")]
    pub legal_tags: Vec<String>,
    /// Other relevant data countries
    #[serde(rename = "otherRelevantDataCountries", alias = "countries")]
    pub countries: Vec<String>,
}

/// Manifest-build request body
///
/// Immutable once assembled; hand it to a submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRequest {
    /// Canonical URIs, ordered and unique
    pub uris: Vec<String>,
    /// Access control
    pub acl: Acl,
    /// Legal metadata
    pub legal: Legal,
    /// Let the store create placeholders for unresolved references
    pub create_missing_references: bool,
}

impl ManifestRequest {
    /// Number of URIs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.uris.len()
    }

    /// Check if no URIs are present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}

/// Caller override of the ACL; blank parts keep the defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AclOverride {
    /// Owner groups
    pub owners: Vec<String>,
    /// Viewer groups
    pub viewers: Vec<String>,
}

/// Caller override of legal metadata; blank parts keep the defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegalOverride {
    /// Legal tags; a single string is accepted as one tag
    #[serde(
        alias = "legaltags",
        alias = "legalTag",
        alias = "legal_tag",
        deserialize_with = "one_or_many"
    )]
    pub legal_tags: Vec<String>,
    /// Countries; a single string is accepted as one country
    #[serde(alias = "otherRelevantDataCountries", deserialize_with = "one_or_many")]
    pub countries: Vec<String>,
}

/// Accept either a string or a list of strings
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Per-call overrides of the manifest defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestOverrides {
    /// ACL override
    pub acl: Option<AclOverride>,
    /// Legal override
    pub legal: Option<LegalOverride>,
    /// Placeholder creation override
    pub create_missing_references: Option<bool>,
}

impl ManifestOverrides {
    /// No overrides
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// With ACL override
    #[inline]
    #[must_use]
    pub fn with_acl(mut self, acl: AclOverride) -> Self {
        self.acl = Some(acl);
        self
    }

    /// With legal override
    #[inline]
    #[must_use]
    pub fn with_legal(mut self, legal: LegalOverride) -> Self {
        self.legal = Some(legal);
        self
    }

    /// With placeholder creation override
    #[inline]
    #[must_use]
    pub fn with_create_missing_references(mut self, create: bool) -> Self {
        self.create_missing_references = Some(create);
        self
    }
}

/// One selected object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionItem {
    /// Dataspace; blank inherits the request's dataspace
    #[serde(default)]
    pub dataspace: String,
    /// Type path
    #[serde(alias = "type")]
    pub type_path: String,
    /// Object id
    #[serde(alias = "uuid")]
    pub id: String,
}

impl SelectionItem {
    /// Create item
    #[must_use]
    pub fn new(
        dataspace: impl Into<String>,
        type_path: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            dataspace: dataspace.into(),
            type_path: type_path.into(),
            id: id.into(),
        }
    }

    /// Graph node of this item
    #[must_use]
    pub fn node(&self) -> Node {
        Node::new(self.dataspace.trim(), self.type_path.trim(), self.id.trim())
    }

    fn is_complete(&self) -> bool {
        !self.type_path.trim().is_empty() && !self.id.trim().is_empty()
    }
}

fn default_include_refs() -> bool {
    true
}

/// Expand one object into its URI closure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleExpansionRequest {
    /// Dataspace
    pub dataspace: String,
    /// Type path
    #[serde(alias = "type")]
    pub type_path: String,
    /// Object id
    #[serde(alias = "uuid")]
    pub id: String,
    /// Expand references
    #[serde(default = "default_include_refs")]
    pub include_refs: bool,
    /// Depth bound; defaults to direct references only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl SingleExpansionRequest {
    /// Request with references up to the default depth
    #[must_use]
    pub fn new(
        dataspace: impl Into<String>,
        type_path: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            dataspace: dataspace.into(),
            type_path: type_path.into(),
            id: id.into(),
            include_refs: true,
            max_depth: None,
        }
    }

    /// With or without references
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
        self.max_depth = Some(max_depth);
        self
    }

    /// Seed node
    #[must_use]
    pub fn node(&self) -> Node {
        Node::new(self.dataspace.trim(), self.type_path.trim(), self.id.trim())
    }

    /// Traversal options
    #[must_use]
    pub fn options(&self) -> TraversalOptions {
        TraversalOptions::new()
            .with_include_refs(self.include_refs)
            .with_max_depth(self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH))
    }

    /// Describe what is missing, if anything
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if self.dataspace.trim().is_empty() {
            Some("dataspace is required".to_string())
        } else if self.type_path.trim().is_empty() {
            Some("typePath is required".to_string())
        } else if self.id.trim().is_empty() {
            Some("id is required".to_string())
        } else {
            None
        }
    }
}

/// Expand a multi-object selection into a manifest request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    /// Selected objects
    #[serde(default)]
    pub items: Vec<SelectionItem>,
    /// Expand references of the selected objects
    #[serde(default = "default_include_refs")]
    pub include_refs: bool,
    /// Depth bound; defaults to direct references only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// URIs taken as given, after the resolved ones
    #[serde(default)]
    pub raw_uris: Vec<String>,
    /// Dataspace paths or dataspace URIs to include whole
    #[serde(default)]
    pub dataspace_uris: Vec<String>,
    /// ACL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<AclOverride>,
    /// Legal override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal: Option<LegalOverride>,
    /// Placeholder creation override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_missing_references: Option<bool>,
    /// Dataspace for items without one and for the empty-selection fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataspace: Option<String>,
}

impl Default for SelectionRequest {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            include_refs: default_include_refs(),
            max_depth: None,
            raw_uris: Vec::new(),
            dataspace_uris: Vec::new(),
            acl: None,
            legal: None,
            create_missing_references: None,
            dataspace: None,
        }
    }
}

impl SelectionRequest {
    /// Empty selection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With one more item
    #[must_use]
    pub fn with_item(mut self, item: SelectionItem) -> Self {
        self.items.push(item);
        self
    }

    /// With or without references
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
        self.max_depth = Some(max_depth);
        self
    }

    /// With raw URIs
    #[must_use]
    pub fn with_raw_uris(mut self, uris: Vec<String>) -> Self {
        self.raw_uris = uris;
        self
    }

    /// With dataspace URIs
    #[must_use]
    pub fn with_dataspace_uris(mut self, uris: Vec<String>) -> Self {
        self.dataspace_uris = uris;
        self
    }

    /// With request dataspace
    #[must_use]
    pub fn with_dataspace(mut self, dataspace: impl Into<String>) -> Self {
        self.dataspace = Some(dataspace.into());
        self
    }

    /// Request dataspace, if non-blank
    #[must_use]
    pub fn dataspace(&self) -> Option<&str> {
        self.dataspace
            .as_deref()
            .map(str::trim)
            .filter(|ds| !ds.is_empty())
    }

    /// Seed nodes of all complete items
    #[must_use]
    pub fn seeds(&self) -> Vec<Node> {
        self.items
            .iter()
            .filter(|item| item.is_complete())
            .map(SelectionItem::node)
            .collect()
    }

    /// Number of items missing a type path or id
    #[must_use]
    pub fn incomplete_items(&self) -> usize {
        self.items.iter().filter(|item| !item.is_complete()).count()
    }

    /// Traversal options
    #[must_use]
    pub fn options(&self) -> TraversalOptions {
        TraversalOptions::new()
            .with_include_refs(self.include_refs)
            .with_max_depth(self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH))
    }

    /// Overrides carried by this request
    #[must_use]
    pub fn overrides(&self) -> ManifestOverrides {
        ManifestOverrides {
            acl: self.acl.clone(),
            legal: self.legal.clone(),
            create_missing_references: self.create_missing_references,
        }
    }
}
