//! Reservoir DDMS v2 HTTP client
//!
//! Implements [`GraphFetcher`] against
//! `{base}/api/reservoir-ddms/v2/dataspaces/{ds}/resources/{type}/{id}`:
//! `/targets` always, `/sources` when `follow_sources` is on, and the object
//! itself (`$format=json`) when `scan_embedded` is on. The three requests of
//! one node run concurrently.

use crate::config::StoreConfig;
use crate::error::FetchError;
use crate::fetcher::{edge_list, select_object, GraphFetcher, NodeEdges};
use crate::token::TokenProvider;
use async_trait::async_trait;
use rddms_ref::Node;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::Arc;

/// Partition header name
pub const PARTITION_HEADER: &str = "data-partition-id";

/// Longest response excerpt carried in an error
const ERROR_EXCERPT_LEN: usize = 200;

/// Remote object store client
#[derive(Clone)]
pub struct HttpObjectStore {
    client: Client,
    config: StoreConfig,
    token: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for HttpObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpObjectStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpObjectStore {
    /// Create client; requests time out after the configured fetch timeout
    ///
    /// # Errors
    /// Returns the underlying error if the HTTP client cannot be built.
    pub fn new(config: StoreConfig, token: Arc<dyn TokenProvider>) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(config.fetch_timeout()).build()?;
        Ok(Self::with_client(client, config, token))
    }

    /// Create with a preconfigured client
    #[must_use]
    pub fn with_client(client: Client, config: StoreConfig, token: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            config,
            token,
        }
    }

    /// Store configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// URL of a node resource, optionally with a trailing segment
    ///
    /// # Errors
    /// Returns [`FetchError::InvalidUrl`] if the base URL is unusable.
    pub fn resource_url(&self, node: &Node, suffix: Option<&str>) -> Result<Url, FetchError> {
        let root = self.config.api_root();
        let mut url = Url::parse(&root).map_err(|e| FetchError::InvalidUrl(format!("{root}: {e}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| FetchError::InvalidUrl(root.clone()))?;
            segments
                .pop_if_empty()
                .push("dataspaces")
                .push(&node.dataspace)
                .extend(["resources", node.type_path.as_str(), node.id.as_str()]);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    fn object_url(&self, node: &Node) -> Result<Url, FetchError> {
        let mut url = self.resource_url(node, None)?;
        url.query_pairs_mut()
            .append_pair("$format", "json")
            .append_pair("arrayMetadata", "false")
            .append_pair("arrayValues", "false");
        Ok(url)
    }

    async fn get_json(&self, url: Url, token: &str) -> Result<Value, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(PARTITION_HEADER, &self.config.data_partition_id)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(status.as_u16(), excerpt(&body)));
        }

        let body = response.text().await.map_err(transport_error)?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }

    async fn get_optional(
        &self,
        enabled: bool,
        url: Result<Url, FetchError>,
        token: &str,
    ) -> Result<Option<Value>, FetchError> {
        if !enabled {
            return Ok(None);
        }
        self.get_json(url?, token).await.map(Some)
    }
}

#[async_trait]
impl GraphFetcher for HttpObjectStore {
    async fn fetch_edges(&self, node: &Node) -> Result<NodeEdges, FetchError> {
        let token = self.token.bearer_token().await?;

        let targets = self.get_json(self.resource_url(node, Some("targets"))?, &token);
        let sources = self.get_optional(
            self.config.follow_sources,
            self.resource_url(node, Some("sources")),
            &token,
        );
        let object = self.get_optional(self.config.scan_embedded, self.object_url(node), &token);

        let (targets, sources, object) = tokio::try_join!(targets, sources, object)?;

        let mut edges = NodeEdges::new().with_targets(edge_list(targets)?);
        if let Some(sources) = sources {
            edges = edges.with_sources(edge_list(sources)?);
        }
        if let Some(object) = object.and_then(|o| select_object(o, &node.id)) {
            edges = edges.with_object(&object);
        }
        Ok(edges)
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Transient(format!("request timed out: {err}"))
    } else {
        FetchError::Transient(err.to_string())
    }
}

fn excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(ERROR_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::StaticToken;

    fn store(base: &str) -> HttpObjectStore {
        HttpObjectStore::new(
            StoreConfig::new().with_base_url(base),
            Arc::new(StaticToken::new("t")),
        )
        .unwrap()
    }

    #[test]
    fn dataspace_is_one_segment() {
        let node = Node::new("demo/Volve", "resqml20.obj_Grid2dRepresentation", "G1");
        let url = store("store.example").resource_url(&node, Some("targets")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://store.example/api/reservoir-ddms/v2/dataspaces/demo%2FVolve/resources/resqml20.obj_Grid2dRepresentation/G1/targets"
        );
    }

    #[test]
    fn object_url_requests_json() {
        let node = Node::new("ds", "eml20.obj_X", "X1");
        let url = store("http://127.0.0.1:9").object_url(&node).unwrap();
        assert!(url.path().ends_with("/resources/eml20.obj_X/X1"));
        assert!(url.query().unwrap().contains("%24format=json"));
    }

    #[test]
    fn unusable_base_url() {
        let node = Node::new("ds", "eml20.obj_X", "X1");
        let err = store("exa mple.com").resource_url(&node, None).unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn long_bodies_are_cut() {
        let cut = excerpt(&"x".repeat(500));
        assert_eq!(cut.len(), ERROR_EXCERPT_LEN + 3);
        assert_eq!(excerpt("  short  "), "short");
    }
}
