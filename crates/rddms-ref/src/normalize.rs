//! Reference normalization
//!
//! The store encodes references three different ways:
//! 1. a canonical URI (`uri` field, or a bare string)
//! 2. an explicit type field (`typePath` / `$type` / `type`) plus an id
//! 3. a MIME-style content type (`...;type=obj_LocalDepth3dCrs`) plus an id
//!
//! [`normalize`] tries those encodings in that order and returns the first
//! one that yields a complete `(typePath, id)`.

use crate::node::{CanonicalRef, RefRole};
use crate::uri::{is_type_path, trailing_id, EmlUri};
use serde_json::{Map, Value};

const URI_KEYS: [&str; 3] = ["uri", "Uri", "URI"];
const TYPE_KEYS: [&str; 3] = ["typePath", "$type", "type"];
const CONTENT_TYPE_KEYS: [&str; 3] = ["ContentType", "contentType", "content_type"];
const ID_KEYS: [&str; 4] = ["id", "uuid", "Uuid", "UUID"];
const TITLE_KEYS: [&str; 3] = ["Title", "title", "name"];

/// Wrapper type of embedded references; never a referenced object type itself
const DOR_TYPE_NAME: &str = "DataObjectReference";

/// Content-type token → namespace, checked in order; first hit wins
const NAMESPACE_TABLE: [(&str, &str); 1] = [("resqml", "resqml20")];

/// Namespace used when no table token appears in the content type
const FALLBACK_NAMESPACE: &str = "eml20";

/// As-fetched reference
#[derive(Debug, Clone, PartialEq)]
pub enum RawReference {
    /// Pre-formed canonical URI string
    Uri(String),
    /// Field set (explicit type, content type, uri, id, title ...)
    Fields(Map<String, Value>),
}

impl RawReference {
    /// Interpret a JSON value as a raw reference
    ///
    /// Strings become [`RawReference::Uri`], mappings become
    /// [`RawReference::Fields`]; anything else is not a reference.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Uri(s)),
            Value::Object(map) => Some(Self::Fields(map)),
            _ => None,
        }
    }

    /// Explicit `{typePath, id}` reference
    #[must_use]
    pub fn explicit(type_path: impl Into<String>, id: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("typePath".into(), Value::String(type_path.into()));
        map.insert("id".into(), Value::String(id.into()));
        Self::Fields(map)
    }

    /// DataObjectReference-style `{ContentType, UUID}` reference
    #[must_use]
    pub fn content_type(content_type: impl Into<String>, id: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("ContentType".into(), Value::String(content_type.into()));
        map.insert("UUID".into(), Value::String(id.into()));
        Self::Fields(map)
    }

    /// Re-encode a canonical reference as an explicit raw reference
    #[must_use]
    pub fn from_canonical(r: &CanonicalRef) -> Self {
        let mut map = Map::new();
        map.insert("typePath".into(), Value::String(r.type_path.clone()));
        map.insert("id".into(), Value::String(r.id.clone()));
        map.insert("uri".into(), Value::String(r.uri.clone()));
        if let Some(title) = &r.title {
            map.insert("title".into(), Value::String(title.clone()));
        }
        Self::Fields(map)
    }

    /// Check whether a mapping looks like an embedded DataObjectReference
    ///
    /// A content type plus an id is enough; everything else is optional.
    #[must_use]
    pub fn is_embedded_reference(map: &Map<String, Value>) -> bool {
        let has = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| map.get(*k))
                .filter_map(Value::as_str)
                .any(|s| !s.trim().is_empty())
        };
        has(&CONTENT_TYPE_KEYS) && has(&ID_KEYS)
    }

    fn field(&self, keys: &[&str]) -> Option<&str> {
        match self {
            Self::Uri(_) => None,
            Self::Fields(map) => keys
                .iter()
                .filter_map(|k| map.get(*k))
                .filter_map(Value::as_str)
                .map(str::trim)
                .find(|s| !s.is_empty()),
        }
    }

    fn uri_str(&self) -> Option<&str> {
        match self {
            Self::Uri(s) => Some(s.trim()).filter(|s| !s.is_empty()),
            Self::Fields(_) => self.field(&URI_KEYS),
        }
    }

    fn title(&self) -> Option<String> {
        self.field(&TITLE_KEYS).map(str::to_string)
    }

    /// Explicit id, falling back to the trailing `('<id>')` of the uri field
    fn id(&self) -> Option<String> {
        self.field(&ID_KEYS)
            .map(str::to_string)
            .or_else(|| self.uri_str().and_then(trailing_id))
    }
}

impl From<&str> for RawReference {
    fn from(s: &str) -> Self {
        Self::Uri(s.to_string())
    }
}

/// Intermediate result of one extraction strategy
#[derive(Debug)]
struct Extracted {
    dataspace: Option<String>,
    type_path: String,
    id: String,
}

type Strategy = fn(&RawReference) -> Option<Extracted>;

/// Extraction strategies in priority order
const STRATEGIES: [Strategy; 3] = [from_uri, from_explicit_type, from_content_type];

/// Normalize one raw reference into a [`CanonicalRef`]
///
/// The result carries role [`RefRole::GenericLink`]; callers relabel it.
/// Returns `None` when no strategy can establish both a type path and an id;
/// callers treat that as "skip this reference".
#[must_use]
pub fn normalize(ds: &str, raw: &RawReference) -> Option<CanonicalRef> {
    let found = STRATEGIES.iter().find_map(|strategy| strategy(raw))?;
    let dataspace = found.dataspace.unwrap_or_else(|| ds.to_string());
    Some(
        CanonicalRef::new(dataspace, found.type_path, found.id, RefRole::GenericLink)
            .with_title(raw.title()),
    )
}

fn from_uri(raw: &RawReference) -> Option<Extracted> {
    match raw.uri_str()?.parse::<EmlUri>().ok()? {
        EmlUri::Object {
            dataspace,
            type_path,
            id,
        } => Some(Extracted {
            dataspace,
            type_path,
            id,
        }),
        EmlUri::Dataspace { .. } => None,
    }
}

fn from_explicit_type(raw: &RawReference) -> Option<Extracted> {
    let type_path = raw.field(&TYPE_KEYS).filter(|t| is_object_type(t))?;
    Some(Extracted {
        dataspace: None,
        type_path: type_path.to_string(),
        id: raw.id()?,
    })
}

fn from_content_type(raw: &RawReference) -> Option<Extracted> {
    let type_path = type_path_from_content_type(raw.field(&CONTENT_TYPE_KEYS)?)?;
    Some(Extracted {
        dataspace: None,
        type_path,
        id: raw.id()?,
    })
}

fn is_object_type(type_path: &str) -> bool {
    is_type_path(type_path) && !type_path.ends_with(DOR_TYPE_NAME)
}

/// Infer a type path from a MIME-style content type
///
/// `application/x-resqml+xml;version=2.0;type=obj_LocalDepth3dCrs` becomes
/// `resqml20.obj_LocalDepth3dCrs`. A `type=` value that is already a dotted
/// type path is returned as is.
#[must_use]
pub fn type_path_from_content_type(content_type: &str) -> Option<String> {
    let name = content_type
        .split(';')
        .map(str::trim)
        .find_map(|segment| segment.strip_prefix("type="))
        .map(str::trim)
        .filter(|name| !name.is_empty())?;

    if is_type_path(name) {
        return Some(name.to_string());
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    let lowered = content_type.to_ascii_lowercase();
    let namespace = NAMESPACE_TABLE
        .iter()
        .find(|(token, _)| lowered.contains(token))
        .map_or(FALLBACK_NAMESPACE, |(_, ns)| ns);
    Some(format!("{namespace}.{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DS: &str = "demo/Volve";
    const CRS_URI: &str = "eml:///dataspace('demo/Volve')/resqml20.obj_LocalDepth3dCrs('C1')";

    fn fields(value: Value) -> RawReference {
        RawReference::from_value(value).unwrap()
    }

    #[test]
    fn embedded_reference_shape() {
        let dor = json!({"ContentType": "application/x-resqml+xml;type=obj_X", "UUID": "u1"});
        let no_id = json!({"ContentType": "application/x-resqml+xml;type=obj_X", "UUID": ""});
        let plain = json!({"Title": "grid", "Uuid": "u1"});
        assert!(RawReference::is_embedded_reference(dor.as_object().unwrap()));
        assert!(!RawReference::is_embedded_reference(no_id.as_object().unwrap()));
        assert!(!RawReference::is_embedded_reference(plain.as_object().unwrap()));
    }

    #[test]
    fn all_three_shapes_agree() {
        let by_uri = normalize(DS, &RawReference::from(CRS_URI)).unwrap();
        let by_type = normalize(
            DS,
            &RawReference::explicit("resqml20.obj_LocalDepth3dCrs", "C1"),
        )
        .unwrap();
        let by_ct = normalize(
            DS,
            &RawReference::content_type(
                "application/x-resqml+xml;version=2.0;type=obj_LocalDepth3dCrs",
                "C1",
            ),
        )
        .unwrap();

        assert_eq!(by_uri.uri, CRS_URI);
        assert_eq!(by_type.uri, CRS_URI);
        assert_eq!(by_ct.uri, CRS_URI);
        assert_eq!(by_uri, by_type);
        assert_eq!(by_type, by_ct);
    }

    #[test]
    fn uri_takes_precedence() {
        let raw = fields(json!({
            "uri": "eml:///dataspace('other')/resqml20.obj_A('from-uri')",
            "typePath": "resqml20.obj_B",
            "id": "from-fields",
        }));
        let r = normalize(DS, &raw).unwrap();
        assert_eq!(r.type_path, "resqml20.obj_A");
        assert_eq!(r.id, "from-uri");
        assert_eq!(r.dataspace, "other");
    }

    #[test]
    fn dollar_type_field() {
        let raw = fields(json!({
            "$type": "resqml20.obj_HorizonInterpretation",
            "Uuid": "H1",
            "Title": "Top Hugin",
        }));
        let r = normalize(DS, &raw).unwrap();
        assert_eq!(r.type_path, "resqml20.obj_HorizonInterpretation");
        assert_eq!(r.id, "H1");
        assert_eq!(r.title.as_deref(), Some("Top Hugin"));
    }

    #[test]
    fn dor_wrapper_type_is_ignored() {
        let raw = fields(json!({
            "$type": "eml20.DataObjectReference",
            "ContentType": "application/x-resqml+xml;version=2.0;type=obj_LocalDepth3dCrs",
            "UUID": "C1",
        }));
        let r = normalize(DS, &raw).unwrap();
        assert_eq!(r.type_path, "resqml20.obj_LocalDepth3dCrs");
    }

    #[test]
    fn id_falls_back_to_uri_tail() {
        let raw = fields(json!({
            "typePath": "resqml20.obj_Grid2dRepresentation",
            "uri": "broken-uri/obj_Grid2dRepresentation('G7')",
        }));
        let r = normalize(DS, &raw).unwrap();
        assert_eq!(r.id, "G7");
        assert_eq!(r.dataspace, DS);
    }

    #[test]
    fn dataspaceless_uri_inherits_caller_dataspace() {
        let r = normalize(
            DS,
            &RawReference::from("eml:///resqml20.obj_LocalDepth3dCrs('C1')"),
        )
        .unwrap();
        assert_eq!(r.uri, CRS_URI);
    }

    #[test]
    fn missing_id_is_none() {
        let raw = fields(json!({ "typePath": "resqml20.obj_Grid2dRepresentation" }));
        assert!(normalize(DS, &raw).is_none());
        assert!(normalize(DS, &RawReference::from("eml:///dataspace('x')")).is_none());
        assert!(normalize(DS, &fields(json!({ "title": "orphan" }))).is_none());
        assert!(RawReference::from_value(json!(42)).is_none());
    }

    #[test]
    fn content_type_namespaces() {
        assert_eq!(
            type_path_from_content_type(
                "application/x-eml+xml;version=2.0;type=obj_EpcExternalPartReference"
            )
            .as_deref(),
            Some("eml20.obj_EpcExternalPartReference")
        );
        assert_eq!(
            type_path_from_content_type("application/x-resqml+xml;version=2.0;type=obj_Grid2dRepresentation")
                .as_deref(),
            Some("resqml20.obj_Grid2dRepresentation")
        );
        assert_eq!(
            type_path_from_content_type("application/x-resqml+xml;type=resqml20.obj_X").as_deref(),
            Some("resqml20.obj_X")
        );
        assert!(type_path_from_content_type("application/json").is_none());
        assert!(type_path_from_content_type("application/x-resqml+xml;type=").is_none());
    }

    #[test]
    fn resqml_token_wins_when_both_appear() {
        assert_eq!(
            type_path_from_content_type("application/x-eml+x-resqml;type=obj_Thing").as_deref(),
            Some("resqml20.obj_Thing")
        );
    }

    #[test]
    fn renormalizing_is_a_fixed_point() {
        let first = normalize(
            DS,
            &RawReference::content_type("application/x-resqml+xml;type=obj_LocalDepth3dCrs", "C1"),
        )
        .unwrap();
        let second = normalize(DS, &RawReference::from_canonical(&first)).unwrap();
        assert_eq!(first.uri, second.uri);
        assert_eq!(first, second);
    }
}
