//! Process-wide manifest defaults
//!
//! Built once (usually from the environment) and injected into the
//! assembler; nothing mutates them afterwards.

use serde::{Deserialize, Serialize};

/// Legal tag used when no partition is configured
const FALLBACK_LEGAL_TAG: &str = "dp1-RDDMS-Legal-Tag";

/// Entitlement domain used when no partition is configured
const FALLBACK_DOMAIN: &str = "partition.dataservices.energy";

/// Default ACL and legal metadata of manifest requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestDefaults {
    /// Legal tag
    pub legal_tag: String,
    /// Owner groups
    pub owners: Vec<String>,
    /// Viewer groups
    pub viewers: Vec<String>,
    /// Other relevant data countries
    pub countries: Vec<String>,
    /// Let the store create placeholders for unresolved references
    pub create_missing_references: bool,
    /// Dataspace used for the fallback URI when a request names none
    pub fallback_dataspace: Option<String>,
}

impl ManifestDefaults {
    /// Defaults derived from a data partition id
    ///
    /// A blank partition yields the generic placeholders.
    #[must_use]
    pub fn for_partition(partition: &str) -> Self {
        let partition = partition.trim();
        let (legal_tag, domain) = if partition.is_empty() {
            (FALLBACK_LEGAL_TAG.to_string(), FALLBACK_DOMAIN.to_string())
        } else {
            (
                format!("{partition}-RDDMS-Legal-Tag"),
                format!("{partition}.dataservices.energy"),
            )
        };
        Self {
            legal_tag,
            owners: vec![format!("data.default.owners@{domain}")],
            viewers: vec![format!("data.default.viewers@{domain}")],
            countries: vec!["US".to_string()],
            create_missing_references: true,
            fallback_dataspace: None,
        }
    }

    /// Read defaults from the process environment
    ///
    /// `DATA_PARTITION_ID`, `DEFAULT_LEGAL_TAG`, `DEFAULT_OWNERS`,
    /// `DEFAULT_VIEWERS`, `DEFAULT_COUNTRIES`, `DEFAULT_DATASPACE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read defaults through a lookup function
    ///
    /// List values are comma-separated; entries are trimmed and blanks
    /// dropped. A list that ends up empty keeps the derived default.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let list = |key: &str| get(key).map(|v| split_list(&v)).filter(|v| !v.is_empty());

        let mut defaults = Self::for_partition(&get("DATA_PARTITION_ID").unwrap_or_default());
        if let Some(tag) = get("DEFAULT_LEGAL_TAG") {
            defaults.legal_tag = tag;
        }
        if let Some(owners) = list("DEFAULT_OWNERS") {
            defaults.owners = owners;
        }
        if let Some(viewers) = list("DEFAULT_VIEWERS") {
            defaults.viewers = viewers;
        }
        if let Some(countries) = list("DEFAULT_COUNTRIES") {
            defaults.countries = countries;
        }
        defaults.fallback_dataspace = get("DEFAULT_DATASPACE");
        defaults
    }

    /// With legal tag
    #[inline]
    #[must_use]
    pub fn with_legal_tag(mut self, tag: impl Into<String>) -> Self {
        self.legal_tag = tag.into();
        self
    }

    /// With owner groups
    #[inline]
    #[must_use]
    pub fn with_owners(mut self, owners: Vec<String>) -> Self {
        self.owners = owners;
        self
    }

    /// With viewer groups
    #[inline]
    #[must_use]
    pub fn with_viewers(mut self, viewers: Vec<String>) -> Self {
        self.viewers = viewers;
        self
    }

    /// With countries
    #[inline]
    #[must_use]
    pub fn with_countries(mut self, countries: Vec<String>) -> Self {
        self.countries = countries;
        self
    }

    /// With fallback dataspace
    #[inline]
    #[must_use]
    pub fn with_fallback_dataspace(mut self, dataspace: impl Into<String>) -> Self {
        self.fallback_dataspace = Some(dataspace.into());
        self
    }

    /// With placeholder creation on or off
    #[inline]
    #[must_use]
    pub fn with_create_missing_references(mut self, create: bool) -> Self {
        self.create_missing_references = create;
        self
    }
}

impl Default for ManifestDefaults {
    fn default() -> Self {
        Self::for_partition("")
    }
}

/// Split a comma-separated list, trimming entries and dropping blanks
#[must_use]
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
