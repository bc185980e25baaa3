//! Type-object runtime model (spec.md §3): the materialized, post-resolution
//! type, as distinct from the static [`crate::model::TypeInfo`].

pub mod type_object;

pub use type_object::{ResolvedConst, TypeObject};
