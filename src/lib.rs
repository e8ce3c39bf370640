//! Indexed property storage for a JavaScript object model
//!
//! Array-like objects start out with a sparse slot table keyed by array
//! index and switch to a dense element vector once the table is large and
//! tightly packed. Every object lives behind an identity-stable [`Object`]
//! handle, so a representation swap (sparse-to-dense promotion, or lazy
//! materialization of a deferred object) is invisible to reference holders.
//!
//! # Example
//! ```
//! use indexed_store::{Context, Value};
//!
//! let ctx = Context::new();
//! let arr = ctx.new_sparse_array();
//! arr.put_str("1000000", Value::int(5), true).unwrap();
//! assert_eq!(arr.get_str("length").unwrap(), Value::int(1_000_001));
//! assert_eq!(arr.get_str("1000000").unwrap(), Value::int(5));
//! ```

// Core modules
pub mod config;
pub mod context;
pub mod error;
pub mod value;

// Object model
pub mod runtime;

// Re-export main types
pub use config::{PromotionPolicy, StoreConfig};
pub use context::Context;
pub use error::{JsError, JsResult};
pub use runtime::{Object, PropertyDescriptor, PropertyKey, SlotValue};
pub use value::{ExportType, Exported, Value};
