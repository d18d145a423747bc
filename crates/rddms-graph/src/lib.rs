//! RDDMS reference graph
//!
//! Network-facing half of reference resolution:
//! - **Fetching**: the [`GraphFetcher`] seam and its reservoir DDMS HTTP implementation
//! - **Traversal**: bounded, cancellable breadth-first resolution over any fetcher
//! - **Errors**: per-node [`FetchError`]s and terminal [`ResolveError`]s
//!
//! # Example
//!
//! ```rust,no_run
//! use rddms_graph::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::from_env();
//! let store = HttpObjectStore::new(config.clone(), Arc::new(StaticToken::new("token")))?;
//! let traverser = Traverser::from_config(Arc::new(store), &config);
//!
//! let seed = Node::new("demo/Volve", "resqml20.obj_Grid2dRepresentation", "G1");
//! let resolution = traverser
//!     .resolve("demo/Volve", &[seed], &TraversalOptions::default())
//!     .await?;
//! println!("{:?}", resolution.uris());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod token;
pub mod traversal;

// Re-exports
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use config::StoreConfig;
pub use error::{FetchError, ResolveError, TokenError};
pub use fetcher::{GraphFetcher, NodeEdges};
pub use http::HttpObjectStore;
pub use token::{StaticToken, TokenProvider};
pub use traversal::{Resolution, TraversalOptions, TraversalStats, Traverser, DEFAULT_MAX_DEPTH};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for graph resolution
    pub use crate::{
        cancel_pair, CancelSignal, FetchError, GraphFetcher, HttpObjectStore, NodeEdges,
        Resolution, ResolveError, StaticToken, StoreConfig, TraversalOptions, Traverser,
    };
    pub use rddms_ref::{CanonicalRef, Node, RawReference, RefRole};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
