//! Canonical EML URIs
//!
//! Provides [`EmlUri`], the parenthesized-id addressing scheme used by the
//! reservoir store:
//!
//! - `eml:///dataspace('demo/Volve')` addresses a whole dataspace
//! - `eml:///dataspace('demo/Volve')/resqml20.obj_LocalDepth3dCrs('C1')` addresses one object
//! - `eml:///resqml20.obj_LocalDepth3dCrs('C1')` addresses an object in the default dataspace

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// URI scheme prefix shared by every canonical URI
pub const SCHEME_PREFIX: &str = "eml:///";

const DATASPACE_SEGMENT: &str = "dataspace(";

/// Errors parsing canonical URIs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    /// Missing `eml:///` prefix
    #[error("not an eml uri: '{0}'")]
    MissingScheme(String),

    /// Dataspace segment is not `dataspace('<path>')`
    #[error("malformed dataspace segment in '{0}'")]
    MalformedDataspace(String),

    /// Object segment is not `<typePath>('<id>')`
    #[error("malformed object segment in '{0}'")]
    MalformedObject(String),
}

/// Parsed canonical URI
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EmlUri {
    /// Dataspace-level URI
    Dataspace {
        /// Dataspace path, e.g. `demo/Volve`
        path: String,
    },
    /// Object URI
    Object {
        /// Dataspace path; `None` for the dataspace-less form
        dataspace: Option<String>,
        /// Dotted type path, e.g. `resqml20.obj_Grid2dRepresentation`
        type_path: String,
        /// Object identifier
        id: String,
    },
}

impl EmlUri {
    /// Dataspace-level URI
    #[inline]
    #[must_use]
    pub fn dataspace(path: impl Into<String>) -> Self {
        Self::Dataspace { path: path.into() }
    }

    /// Object URI inside a dataspace
    #[inline]
    #[must_use]
    pub fn object(
        dataspace: impl Into<String>,
        type_path: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self::Object {
            dataspace: Some(dataspace.into()),
            type_path: type_path.into(),
            id: id.into(),
        }
    }

    /// Dataspace path, if the URI carries one
    #[must_use]
    pub fn dataspace_path(&self) -> Option<&str> {
        match self {
            Self::Dataspace { path } => Some(path),
            Self::Object { dataspace, .. } => dataspace.as_deref(),
        }
    }

    /// `(typePath, id)` for object URIs
    #[must_use]
    pub fn object_key(&self) -> Option<(&str, &str)> {
        match self {
            Self::Dataspace { .. } => None,
            Self::Object { type_path, id, .. } => Some((type_path, id)),
        }
    }

    /// Fill in the dataspace of a dataspace-less object URI
    #[must_use]
    pub fn with_default_dataspace(self, ds: &str) -> Self {
        match self {
            Self::Object {
                dataspace: None,
                type_path,
                id,
            } => Self::Object {
                dataspace: Some(ds.to_string()),
                type_path,
                id,
            },
            other => other,
        }
    }
}

impl Display for EmlUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataspace { path } => write!(f, "{SCHEME_PREFIX}dataspace('{path}')"),
            Self::Object {
                dataspace: Some(ds),
                type_path,
                id,
            } => write!(f, "{SCHEME_PREFIX}dataspace('{ds}')/{type_path}('{id}')"),
            Self::Object {
                dataspace: None,
                type_path,
                id,
            } => write!(f, "{SCHEME_PREFIX}{type_path}('{id}')"),
        }
    }
}

impl FromStr for EmlUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let rest = trimmed
            .strip_prefix(SCHEME_PREFIX)
            .ok_or_else(|| UriError::MissingScheme(trimmed.to_string()))?;

        if let Some(after) = rest.strip_prefix(DATASPACE_SEGMENT) {
            // The dataspace path may itself contain '/', so split on the closing "')"
            let (path, tail) = split_dataspace(after)
                .ok_or_else(|| UriError::MalformedDataspace(trimmed.to_string()))?;
            if tail.is_empty() {
                return Ok(Self::Dataspace { path });
            }
            let object = tail
                .strip_prefix('/')
                .ok_or_else(|| UriError::MalformedObject(trimmed.to_string()))?;
            let (type_path, id) = parse_object_segment(object)
                .ok_or_else(|| UriError::MalformedObject(trimmed.to_string()))?;
            return Ok(Self::Object {
                dataspace: Some(path),
                type_path,
                id,
            });
        }

        let (type_path, id) = parse_object_segment(rest)
            .ok_or_else(|| UriError::MalformedObject(trimmed.to_string()))?;
        Ok(Self::Object {
            dataspace: None,
            type_path,
            id,
        })
    }
}

/// Build the dataspace-level URI string for a path
#[inline]
#[must_use]
pub fn dataspace_uri(path: &str) -> String {
    EmlUri::dataspace(path).to_string()
}

/// Build an object URI string
#[inline]
#[must_use]
pub fn object_uri(dataspace: &str, type_path: &str, id: &str) -> String {
    EmlUri::object(dataspace, type_path, id).to_string()
}

/// Extract the id from the last `(...)` group of a URI-shaped string
///
/// Accepts both `('<id>')` and `(<id>)`. Returns `None` when there is no
/// parenthesized group or the group is empty.
#[must_use]
pub fn trailing_id(s: &str) -> Option<String> {
    let s = s.trim();
    let close = s.rfind(')')?;
    let open = s[..close].rfind('(')?;
    let id = unquote(&s[open + 1..close]);
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

fn split_dataspace(after: &str) -> Option<(String, &str)> {
    if let Some(quoted) = after.strip_prefix('\'') {
        let end = quoted.find("')")?;
        Some((quoted[..end].to_string(), &quoted[end + 2..]))
    } else {
        let end = after.find(')')?;
        Some((after[..end].to_string(), &after[end + 1..]))
    }
}

fn parse_object_segment(segment: &str) -> Option<(String, String)> {
    let segment = segment.strip_suffix(')')?;
    let open = segment.find('(')?;
    let type_path = &segment[..open];
    let id = unquote(&segment[open + 1..]);
    if !is_type_path(type_path) || id.is_empty() {
        return None;
    }
    Some((type_path.to_string(), id.to_string()))
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(s)
}

/// Check for the `<namespace>.<Name>` shape of a type path
#[must_use]
pub fn is_type_path(s: &str) -> bool {
    let Some((ns, name)) = s.split_once('.') else {
        return false;
    };
    !ns.is_empty()
        && !name.is_empty()
        && ns.chars().all(|c| c.is_ascii_alphanumeric())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
