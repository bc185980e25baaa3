//! Loading and resolution: the parcel-definition builder, the load
//! manager, and protocol conformance (spec.md §4.3–§4.5).

pub mod builder;
pub mod conformance;
pub mod manager;

pub use builder::{ParcelDefBuilder, TypeHandle};
pub use conformance::conforms;
pub use manager::LoadManager;
