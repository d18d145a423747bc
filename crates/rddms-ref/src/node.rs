//! Graph nodes and canonical references
//!
//! Defines the identity types shared by every layer:
//! - [`Node`]: one remote object addressed by dataspace, type path and id
//! - [`CanonicalRef`]: a normalized reference with its traversal role
//! - [`RefKey`]: the `(typePath, id)` identity used for dedup and cycle checks

use crate::uri::{EmlUri, UriError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// One remote object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Dataspace path
    pub dataspace: String,
    /// Canonical dotted type name
    pub type_path: String,
    /// Opaque identifier (usually a UUID)
    pub id: String,
}

impl Node {
    /// Create new node
    #[inline]
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

    /// Identity key within one traversal
    #[inline]
    #[must_use]
    pub fn key(&self) -> RefKey {
        RefKey::new(&self.type_path, &self.id)
    }

    /// Canonical URI of this node
    #[inline]
    #[must_use]
    pub fn uri(&self) -> String {
        EmlUri::object(&self.dataspace, &self.type_path, &self.id).to_string()
    }

    /// Canonical reference for this node with the given role
    #[must_use]
    pub fn to_ref(&self, role: RefRole) -> CanonicalRef {
        CanonicalRef {
            dataspace: self.dataspace.clone(),
            type_path: self.type_path.clone(),
            id: self.id.clone(),
            uri: self.uri(),
            role,
            title: None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.type_path, self.id, self.dataspace)
    }
}

/// `(typePath, id)` identity of a referenced object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RefKey {
    /// Type path
    pub type_path: String,
    /// Object id
    pub id: String,
}

impl RefKey {
    /// Create new key
    #[inline]
    #[must_use]
    pub fn new(type_path: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_path: type_path.into(),
            id: id.into(),
        }
    }
}

/// Why a reference was reached during traversal
///
/// Labels only; roles never take part in identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefRole {
    /// Caller-selected starting object
    Seed,
    /// Object that references the expanded node
    Source,
    /// Object the expanded node references
    Target,
    /// Coordinate reference system target
    Crs,
    /// Provenance parent
    AncestryParent,
    /// Provenance child
    AncestryChild,
    /// Reference found by scanning the object body
    GenericLink,
}

impl RefRole {
    /// Relabel a structural edge as `Crs` when it points at a CRS object
    #[must_use]
    pub fn for_type(self, type_path: &str) -> Self {
        match self {
            Self::Target | Self::GenericLink | Self::Source if is_crs_type(type_path) => Self::Crs,
            other => other,
        }
    }
}

impl fmt::Display for RefRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Seed => "seed",
            Self::Source => "source",
            Self::Target => "target",
            Self::Crs => "crs",
            Self::AncestryParent => "ancestry-parent",
            Self::AncestryChild => "ancestry-child",
            Self::GenericLink => "generic-link",
        };
        f.write_str(s)
    }
}

/// CRS objects are named `...Crs` (`obj_LocalDepth3dCrs`, `obj_LocalTime3dCrs`, ...)
#[must_use]
pub fn is_crs_type(type_path: &str) -> bool {
    type_path
        .rsplit('.')
        .next()
        .is_some_and(|name| name.ends_with("Crs"))
}

/// Normalized reference
///
/// Two references are equal iff their `(typePath, id)` match; `role`,
/// `dataspace` and `title` are metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRef {
    /// Dataspace the object lives in
    pub dataspace: String,
    /// Type path
    pub type_path: String,
    /// Object id
    pub id: String,
    /// Canonical URI
    pub uri: String,
    /// Traversal role
    pub role: RefRole,
    /// Display title, when the raw reference carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl CanonicalRef {
    /// Build from parts, synthesizing the URI
    #[must_use]
    pub fn new(
        dataspace: impl Into<String>,
        type_path: impl Into<String>,
        id: impl Into<String>,
        role: RefRole,
    ) -> Self {
        Node::new(dataspace, type_path, id).to_ref(role)
    }

    /// Build from a canonical URI string
    ///
    /// Dataspace-less object URIs inherit `default_ds`.
    ///
    /// # Errors
    /// Returns [`UriError`] if the string is not an object URI.
    pub fn from_uri(uri: &str, default_ds: &str, role: RefRole) -> Result<Self, UriError> {
        match uri.parse::<EmlUri>()?.with_default_dataspace(default_ds) {
            EmlUri::Object {
                dataspace,
                type_path,
                id,
            } => Ok(Self::new(
                dataspace.unwrap_or_else(|| default_ds.to_string()),
                type_path,
                id,
                role,
            )),
            EmlUri::Dataspace { .. } => Err(UriError::MalformedObject(uri.to_string())),
        }
    }

    /// Identity key
    #[inline]
    #[must_use]
    pub fn key(&self) -> RefKey {
        RefKey::new(&self.type_path, &self.id)
    }

    /// Node addressed by this reference
    #[inline]
    #[must_use]
    pub fn node(&self) -> Node {
        Node::new(&self.dataspace, &self.type_path, &self.id)
    }

    /// With display title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// With a different role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: RefRole) -> Self {
        self.role = role;
        self
    }
}

impl PartialEq for CanonicalRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_path == other.type_path && self.id == other.id
    }
}

impl Eq for CanonicalRef {}

impl Hash for CanonicalRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_path.hash(state);
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_ignores_role() {
        let a = CanonicalRef::new("ds", "resqml20.obj_X", "1", RefRole::Source);
        let b = CanonicalRef::new("other", "resqml20.obj_X", "1", RefRole::Target);
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn node_uri() {
        let node = Node::new("demo/Volve", "resqml20.obj_Grid2dRepresentation", "G1");
        assert_eq!(
            node.uri(),
            "eml:///dataspace('demo/Volve')/resqml20.obj_Grid2dRepresentation('G1')"
        );
        assert_eq!(node.to_ref(RefRole::Seed).node(), node);
    }

    #[test]
    fn crs_relabel() {
        assert_eq!(
            RefRole::Target.for_type("resqml20.obj_LocalDepth3dCrs"),
            RefRole::Crs
        );
        assert_eq!(
            RefRole::Target.for_type("resqml20.obj_Grid2dRepresentation"),
            RefRole::Target
        );
        assert_eq!(
            RefRole::Seed.for_type("resqml20.obj_LocalDepth3dCrs"),
            RefRole::Seed
        );
    }

    #[test]
    fn from_uri_inherits_dataspace() {
        let r = CanonicalRef::from_uri(
            "eml:///resqml20.obj_LocalDepth3dCrs('C1')",
            "demo/Volve",
            RefRole::Target,
        )
        .unwrap();
        assert_eq!(r.dataspace, "demo/Volve");
        assert_eq!(
            r.uri,
            "eml:///dataspace('demo/Volve')/resqml20.obj_LocalDepth3dCrs('C1')"
        );
    }

    #[test]
    fn from_uri_rejects_dataspace_uri() {
        assert!(CanonicalRef::from_uri("eml:///dataspace('x')", "x", RefRole::Target).is_err());
    }

    #[test]
    fn role_serializes_kebab_case() {
        let json = serde_json::to_string(&RefRole::AncestryParent).unwrap();
        assert_eq!(json, "\"ancestry-parent\"");
        assert_eq!(RefRole::GenericLink.to_string(), "generic-link");
    }
}
