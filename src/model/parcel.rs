//! Parcel metadata and the runtime [`Parcel`] binding (spec.md §3).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::module::ModuleInfo;
use crate::area::AreaResource;
use crate::redirects::RedirectSet;

pub type ParcelId = u64;

static NEXT_PARCEL_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates the next parcel ID from the process-wide monotonic counter
/// (spec.md §5).
pub fn next_parcel_id() -> ParcelId {
    NEXT_PARCEL_ID.fetch_add(1, Ordering::Relaxed)
}

/// Immutable per-parcel record, independent of any domain binding: the
/// ordered set of declared dep-names (the reserved self-name `"self"` is
/// not itself stored — a specifier's `self` root is resolved relative to
/// the compiling parcel's own path by the term-stack interpreter's
/// environment, not by a table lookup here).
#[derive(Debug, Clone, Default)]
pub struct ParcelMeta {
    pub dep_names: Vec<String>,
}

impl ParcelMeta {
    pub fn new(dep_names: Vec<String>) -> Self {
        Self { dep_names }
    }

    pub fn declares(&self, dep_name: &str) -> bool {
        dep_name == "self" || self.dep_names.iter().any(|d| d == dep_name)
    }
}

/// The runtime binding of a parcel: its path, its process-wide ID, the
/// compiled module, and the [`RedirectSet`] computed for it at bind time
/// (spec.md §3, §5 — parcel-level redirects are immutable for the
/// duration of a load session once bound).
#[derive(Debug, Clone)]
pub struct Parcel {
    pub path: String,
    pub id: ParcelId,
    pub meta: ParcelMeta,
    pub module: Arc<ModuleInfo>,
    pub redirects: RedirectSet,
}

impl Parcel {
    pub fn new(path: impl Into<String>, meta: ParcelMeta, module: Arc<ModuleInfo>, redirects: RedirectSet) -> Self {
        Self {
            path: path.into(),
            id: next_parcel_id(),
            meta,
            module,
            redirects,
        }
    }
}

impl AreaResource for Parcel {
    fn area_name(&self) -> String {
        self.path.clone()
    }
}
