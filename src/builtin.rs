//! The `yama` builtin parcel (spec.md §6): auto-installed before any user
//! parcel can bind, exposing the scalar primitives and the universal
//! `Any` protocol. The original's domain type (`YmDm.h`/`.cpp`) has no
//! analogous bootstrap step of its own; this auto-install is a fresh
//! design decision, expressed here through the same [`ParcelDefBuilder`]
//! user parcels use rather than a separate hand-built [`ModuleInfo`].

use std::sync::Arc;

use crate::errors::Result;
use crate::loader::builder::ParcelDefBuilder;
use crate::model::{ModuleInfo, Parcel, ParcelMeta};
use crate::redirects::Redirects;

pub const BUILTIN_PATH: &str = "yama";

/// Builds the `yama` parcel's module: `None`, `Int`, `UInt`, `Float`,
/// `Bool`, `Rune`, `Type`, and protocol `Any`. `Any` carries no member
/// requirements, so every type trivially conforms to it.
fn builtin_module() -> Result<ModuleInfo> {
    let mut b = ParcelDefBuilder::new();
    b.add_primitive("None")?;
    b.add_primitive("Int")?;
    b.add_primitive("UInt")?;
    b.add_primitive("Float")?;
    b.add_primitive("Bool")?;
    b.add_primitive("Rune")?;
    b.add_primitive("Type")?;
    b.add_protocol("Any")?;
    b.finish()
}

/// Constructs the bound `yama` parcel, ready to be inserted directly into
/// a domain's bindings ahead of any user parcel (spec.md §4.7 `reset`,
/// §6 "auto-installed").
pub fn builtin_parcel() -> Result<Arc<Parcel>> {
    let module = builtin_module()?;
    Ok(Arc::new(Parcel::new(
        BUILTIN_PATH,
        ParcelMeta::default(),
        Arc::new(module),
        Redirects::new().compute(BUILTIN_PATH),
    )))
}
