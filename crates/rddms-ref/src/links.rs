//! Record-link scanning
//!
//! OSDU records embed links to other records as plain id strings such as
//! `dev:work-product-component--ReservoirEstimatedVolumes:5033c9e2:1`.
//! [`scan`] walks a record's `data` block and returns those ids with a role
//! label derived from where they were found. Reference-data ids are never
//! returned.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

static RECORD_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[\w\-.]+:(?:work-product(?:-component)?|master-data)--[\w\-]+:[\w\-.:%]+:[0-9]+$",
    )
    .unwrap_or_else(|e| unreachable!("record id pattern is valid: {e}"))
});

const REFERENCE_DATA_SEGMENT: &str = "reference-data--";

/// Role of a record link, from the path it was found at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkRole {
    /// Risk records (`...RiskIDs`)
    Risk,
    /// Prior activities (`...PriorActivityIDs`)
    PriorActivity,
    /// Parent work product
    ParentWorkProduct,
    /// Parent object
    ParentObject,
    /// Activity parameter object
    ParameterObject,
    /// Provenance parent
    AncestryParent,
    /// Provenance child
    AncestryChild,
    /// Anything else
    GenericLink,
}

impl LinkRole {
    /// Label a link by the dot path it was found at
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let p = path.to_ascii_lowercase();
        if p.contains("riskids") {
            Self::Risk
        } else if p.contains("prioractivityids") {
            Self::PriorActivity
        } else if p.contains("parentworkproductid") {
            Self::ParentWorkProduct
        } else if p.contains("parentobjectid") {
            Self::ParentObject
        } else if p.contains("parameters") && p.contains("objectparameterkey") {
            Self::ParameterObject
        } else if p.contains("ancestry.parents") {
            Self::AncestryParent
        } else if p.contains("ancestry.children") {
            Self::AncestryChild
        } else {
            Self::GenericLink
        }
    }
}

/// One record id found in a data block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordLink {
    /// Record id
    pub id: String,
    /// Role label
    pub role: LinkRole,
    /// Dot path where the id was found
    pub source_path: String,
}

/// Check whether a string is a linkable record id
///
/// Work-product, work-product-component and master-data ids qualify;
/// reference-data ids never do.
#[must_use]
pub fn is_record_id(s: &str) -> bool {
    !s.contains(REFERENCE_DATA_SEGMENT) && RECORD_ID.is_match(s.trim())
}

/// Scan a record `data` block for record links
///
/// Ancestry parents and children are collected first, then the whole block
/// is walked. The result is deduplicated by `(id, role)` keeping the first
/// occurrence.
#[must_use]
pub fn scan(data: &Value) -> Vec<RecordLink> {
    let Value::Object(map) = data else {
        return Vec::new();
    };

    let mut found = ancestry_links(map);
    walk(data, "", &mut found);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter(|link| seen.insert((link.id.clone(), link.role)))
        .collect()
}

fn ancestry_links(map: &Map<String, Value>) -> Vec<RecordLink> {
    let Some(Value::Object(ancestry)) = map.get("ancestry") else {
        return Vec::new();
    };

    [
        ("parents", LinkRole::AncestryParent),
        ("children", LinkRole::AncestryChild),
    ]
    .into_iter()
    .filter_map(|(key, role)| match ancestry.get(key) {
        Some(Value::Array(items)) => Some((key, role, items)),
        _ => None,
    })
    .flat_map(|(key, role, items)| {
        items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| is_record_id(s))
            .map(move |id| RecordLink {
                id: id.to_string(),
                role,
                source_path: format!("ancestry.{key}"),
            })
    })
    .collect()
}

fn walk(value: &Value, base: &str, out: &mut Vec<RecordLink>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if base.is_empty() {
                    key.clone()
                } else {
                    format!("{base}.{key}")
                };
                visit(child, &path, &path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                // list members take their role from the list's own path
                visit(child, base, &format!("{base}[{i}]"), out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

fn visit(child: &Value, role_path: &str, path: &str, out: &mut Vec<RecordLink>) {
    match child {
        Value::String(s) if is_record_id(s) => out.push(RecordLink {
            id: s.clone(),
            role: LinkRole::from_path(role_path),
            source_path: path.to_string(),
        }),
        _ => walk(child, path, out),
    }
}
