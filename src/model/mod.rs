//! Parcel/module model (spec.md §3): the static, pre-resolution
//! description of a parcel's contents.

pub mod const_table;
pub mod module;
pub mod parcel;
pub mod type_info;

pub use const_table::{ConstEntry, ConstTableInfo};
pub use module::ModuleInfo;
pub use parcel::{Parcel, ParcelId, ParcelMeta};
pub use type_info::{CallSig, ParamInfo, TypeInfo, TypeKind, TypeParamInfo};
