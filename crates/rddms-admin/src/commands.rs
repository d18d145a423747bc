//! Subcommand handlers
//!
//! Each handler returns the JSON document `main` prints to stdout.

use crate::config::AdminConfig;
use anyhow::{Context, Result};
use clap::Args;
use rddms_graph::{CancelSignal, HttpObjectStore, ResolveError, StaticToken, TokenError};
use rddms_manifest::{ExpansionService, ManifestError, SelectionRequest, SingleExpansionRequest};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// The object a `resolve` or `graph` run starts from
#[derive(Debug, Clone, Args)]
pub struct ObjectArgs {
    /// Dataspace path, e.g. `demo/Volve`
    #[arg(long)]
    pub dataspace: String,

    /// Qualified type, e.g. `resqml20.obj_Grid2dRepresentation`
    #[arg(long = "type")]
    pub type_path: String,

    /// Object uuid
    #[arg(long)]
    pub uuid: String,

    /// Maximum hop distance from the seed
    #[arg(long)]
    pub depth: Option<usize>,
}

impl ObjectArgs {
    /// Single-object request for these arguments
    #[must_use]
    pub fn request(&self, include_refs: bool) -> SingleExpansionRequest {
        let request = SingleExpansionRequest::new(&self.dataspace, &self.type_path, &self.uuid)
            .with_include_refs(include_refs);
        match self.depth {
            Some(depth) => request.with_max_depth(depth),
            None => request,
        }
    }
}

/// Build an expansion service over the HTTP store
///
/// # Errors
/// Fails without a usable token or if the HTTP client cannot be built.
pub fn build_service(config: &AdminConfig, token: Option<String>) -> Result<ExpansionService> {
    let token = token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ManifestError::Resolve(ResolveError::Token(TokenError::Missing)))
        .context("pass --token or set RDDMS_ACCESS_TOKEN")?;

    let store = HttpObjectStore::new(config.store.clone(), Arc::new(StaticToken::new(token)))
        .context("building HTTP client")?;
    tracing::info!(
        "Using store {} (partition {})",
        store.config().normalized_base_url(),
        config.store.data_partition_id
    );
    Ok(ExpansionService::from_config(
        Arc::new(store),
        &config.store,
        config.manifest.clone(),
    ))
}

/// `resolve`: the URI closure of one object
///
/// # Errors
/// Propagates the resolution failure.
pub async fn resolve(
    service: &ExpansionService,
    object: &ObjectArgs,
    no_refs: bool,
    cancel: CancelSignal,
) -> Result<Value> {
    let request = object.request(!no_refs);
    let uris = service
        .expand_single_with_cancel(&request, cancel)
        .await
        .with_context(|| format!("resolving {}", request.node()))?;
    Ok(serde_json::to_value(uris)?)
}

/// `graph`: the full resolution report of one object
///
/// # Errors
/// Propagates the resolution failure.
pub async fn graph(
    service: &ExpansionService,
    object: &ObjectArgs,
    cancel: CancelSignal,
) -> Result<Value> {
    let request = object.request(true);
    let resolution = service
        .resolve_single(&request, cancel)
        .await
        .with_context(|| format!("resolving {}", request.node()))?;
    tracing::info!(
        "Resolved {} reference(s), {} record link(s), {} fetch failure(s)",
        resolution.len(),
        resolution.record_links.len(),
        resolution.stats.fetch_failures
    );
    Ok(serde_json::to_value(resolution)?)
}

/// `manifest`: a manifest request for a selection file
///
/// # Errors
/// Fails on an unreadable selection file or a failed expansion.
pub async fn manifest(
    service: &ExpansionService,
    selection: &Path,
    cancel: CancelSignal,
) -> Result<Value> {
    let request = read_selection(selection)?;
    let manifest = service
        .expand_selection_with_cancel(&request, cancel)
        .await
        .context("expanding selection")?;
    Ok(serde_json::to_value(manifest)?)
}

/// Read a selection request from a JSON file
///
/// # Errors
/// Fails if the file cannot be read or parsed.
pub fn read_selection(path: &Path) -> Result<SelectionRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading selection {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing selection {}", path.display()))
}
