//! RDDMS manifest assembly
//!
//! Turns object selections into manifest-build requests:
//! - **Requests**: single-object and multi-selection request shapes
//! - **Defaults**: immutable ACL/legal defaults, usually read from the environment
//! - **Assembly**: deduplicated URIs plus metadata, with the dataspace fallback
//! - **Service**: resolution + assembly behind one entry point, and the submitter seam
//!
//! # Example
//!
//! ```rust,no_run
//! use rddms_graph::{HttpObjectStore, StaticToken, StoreConfig};
//! use rddms_manifest::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::from_env();
//! let store = HttpObjectStore::new(config.clone(), Arc::new(StaticToken::new("token")))?;
//! let service = ExpansionService::from_config(Arc::new(store), &config, ManifestDefaults::from_env());
//!
//! let request = SelectionRequest::new()
//!     .with_dataspace("demo/Volve")
//!     .with_item(SelectionItem::new("demo/Volve", "resqml20.obj_Grid2dRepresentation", "G1"));
//! let manifest = service.expand_selection(&request).await?;
//! println!("{}", serde_json::to_string_pretty(&manifest)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod assembler;
pub mod defaults;
pub mod error;
pub mod request;
pub mod service;
pub mod submit;

// Re-exports
pub use assembler::ManifestAssembler;
pub use defaults::{split_list, ManifestDefaults};
pub use error::{ManifestError, SubmitError};
pub use request::{
    Acl, AclOverride, Legal, LegalOverride, ManifestOverrides, ManifestRequest, SelectionItem,
    SelectionRequest, SingleExpansionRequest,
};
pub use service::ExpansionService;
pub use submit::ManifestSubmitter;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for manifest expansion
    pub use crate::{
        ExpansionService, ManifestAssembler, ManifestDefaults, ManifestError, ManifestOverrides,
        ManifestRequest, ManifestSubmitter, SelectionItem, SelectionRequest,
        SingleExpansionRequest,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
