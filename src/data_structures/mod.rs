//! Engine data structures: attribute storage, object types and their instances.
//!
//! - `attribute` holds the closed set of attribute kinds and per-attribute storage
//! - `instance` holds instance ids, descriptors and mutable views
//! - `object` holds object types and their sparse-set instance storage
//! - `texture` holds the depth texture used by the windowed backend

pub mod attribute;
pub mod instance;
pub mod object;
pub mod texture;
