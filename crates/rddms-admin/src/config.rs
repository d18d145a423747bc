//! Admin configuration
//!
//! An optional TOML file with `[store]` and `[manifest]` sections. Any
//! section the file leaves out is read from the environment instead.

use anyhow::{Context, Result};
use rddms_graph::StoreConfig;
use rddms_manifest::ManifestDefaults;
use serde::Deserialize;
use std::path::Path;

/// Resolved CLI configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    /// Store client settings
    pub store: StoreConfig,
    /// Manifest defaults
    pub manifest: ManifestDefaults,
}

/// On-disk layout; absent sections fall back to the environment
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    store: Option<StoreConfig>,
    manifest: Option<ManifestDefaults>,
}

impl AdminConfig {
    /// Load from `path` if given, else from the process environment
    ///
    /// # Errors
    /// Fails if the file cannot be read or is not valid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                tracing::debug!("Loaded config from {}", path.display());
                parse(&text).with_context(|| format!("parsing config {}", path.display()))?
            }
            None => ConfigFile::default(),
        };
        Ok(Self::merge(file, |key| std::env::var(key).ok()))
    }

    fn merge(file: ConfigFile, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            store: file.store.unwrap_or_else(|| StoreConfig::from_lookup(&lookup)),
            manifest: file
                .manifest
                .unwrap_or_else(|| ManifestDefaults::from_lookup(&lookup)),
        }
    }
}

fn parse(text: &str) -> Result<ConfigFile, toml::de::Error> {
    toml::from_str(text)
}
