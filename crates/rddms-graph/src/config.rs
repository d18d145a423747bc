//! Store client and traversal configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Path prefix of the reservoir DDMS v2 API
pub const API_PREFIX: &str = "api/reservoir-ddms/v2";

/// Remote store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store host, with or without scheme (`https://` assumed)
    pub base_url: String,
    /// Value of the `data-partition-id` header
    pub data_partition_id: String,
    /// Per-fetch timeout in seconds
    pub fetch_timeout_secs: u64,
    /// Maximum node fetches in flight at once
    pub max_concurrent_fetches: usize,
    /// Follow incoming (`sources`) edges as well as outgoing ones
    pub follow_sources: bool,
    /// Fetch the object body and scan it for embedded references
    pub scan_embedded: bool,
}

impl StoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the process environment
    ///
    /// `OSDU_BASE_URL`, `DATA_PARTITION_ID`, `RDDMS_FETCH_TIMEOUT_SECS`,
    /// `RDDMS_MAX_CONCURRENT_FETCHES`; unset or unparseable values keep
    /// their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through a lookup function
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("OSDU_BASE_URL") {
            config.base_url = url;
        }
        if let Some(partition) = get("DATA_PARTITION_ID") {
            config.data_partition_id = partition;
        }
        if let Some(secs) = get("RDDMS_FETCH_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.fetch_timeout_secs = secs;
        }
        if let Some(n) = get("RDDMS_MAX_CONCURRENT_FETCHES").and_then(|v| v.parse().ok()) {
            config.max_concurrent_fetches = n;
        }
        config
    }

    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With data partition
    #[inline]
    #[must_use]
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.data_partition_id = partition.into();
        self
    }

    /// With per-fetch timeout
    #[inline]
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// With fetch concurrency
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max;
        self
    }

    /// With or without incoming edges
    #[inline]
    #[must_use]
    pub fn with_follow_sources(mut self, follow: bool) -> Self {
        self.follow_sources = follow;
        self
    }

    /// With or without embedded reference scanning
    #[inline]
    #[must_use]
    pub fn with_scan_embedded(mut self, scan: bool) -> Self {
        self.scan_embedded = scan;
        self
    }

    /// Per-fetch timeout
    #[inline]
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Fetch concurrency, never below one
    #[inline]
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }

    /// Base URL with scheme, without trailing slash
    #[must_use]
    pub fn normalized_base_url(&self) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!("https://{base}")
        }
    }

    /// Root of the v2 API
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/{API_PREFIX}", self.normalized_base_url())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "equinordev.energy.azure.com".to_string(),
            data_partition_id: "data".to_string(),
            fetch_timeout_secs: 30,
            max_concurrent_fetches: 8,
            follow_sources: true,
            scan_embedded: true,
        }
    }
}
