//! RDDMS reference model
//!
//! Pure, I/O-free building blocks for resolving object references in a
//! reservoir dataspace store:
//! - **Canonical URIs**: the `eml:///dataspace('<path>')/<typePath>('<id>')` grammar
//! - **Normalization**: one [`CanonicalRef`] from any of the store's reference encodings
//! - **Record links**: OSDU record ids embedded in record `data` blocks
//! - **Collection**: ordered, deduplicated URI sets
//!
//! # Example
//!
//! ```rust
//! use rddms_ref::{collect, normalize, RawReference};
//!
//! let raw = RawReference::content_type(
//!     "application/x-resqml+xml;version=2.0;type=obj_LocalDepth3dCrs",
//!     "C1",
//! );
//! let crs = normalize("demo/Volve", &raw).unwrap();
//! assert_eq!(
//!     collect(&[crs]),
//!     vec!["eml:///dataspace('demo/Volve')/resqml20.obj_LocalDepth3dCrs('C1')"]
//! );
//! ```

#![warn(missing_docs)]

pub mod collect;
pub mod links;
pub mod node;
pub mod normalize;
pub mod uri;

// Re-exports
pub use collect::{collect, collect_uris, UriCollector};
pub use links::{is_record_id, scan, LinkRole, RecordLink};
pub use node::{is_crs_type, CanonicalRef, Node, RefKey, RefRole};
pub use normalize::{normalize, type_path_from_content_type, RawReference};
pub use uri::{dataspace_uri, object_uri, trailing_id, EmlUri, UriError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for reference handling
    pub use crate::{
        collect, normalize, CanonicalRef, EmlUri, Node, RawReference, RecordLink, RefKey,
        RefRole, UriCollector,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
