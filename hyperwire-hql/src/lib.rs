//! Result records returned by HQL queries.
//!
//! The descriptors live in a lazily built registry; the typed structs
//! convert to and from generic records and encode through the standard
//! engine.
//!
//! ```
//! use hyperwire_core::RecordType;
//! use hyperwire_hql::HqlResult;
//!
//! let result = HqlResult {
//!     results: Some(vec!["a".to_string(), "b".to_string()]),
//!     cells: Some(Vec::new()),
//!     scanner: Some(42),
//!     mutator: None,
//! };
//! let bytes = result.to_bytes().unwrap();
//! assert_eq!(HqlResult::from_bytes(&bytes).unwrap(), result);
//! ```

#![warn(missing_docs)]

pub mod descriptors;
mod types;

pub use descriptors::{registry, schema, HqlSchema};
pub use types::{Cell, HqlResult, HqlResult2, HqlResultAsArrays, Key, KeyFlag};
