//! The context loader (spec.md §4.7): per-execution-context, unsynchronized.
//! Caches parcels and types fetched through an upstream [`DomainLoader`] in
//! its own local [`Area`]s. `fetch_parcel`/`fetch_type` consult the local
//! cache only; `import`/`load` delegate upstream on a miss and cache the
//! result. Grounded on `examples/original_source/Yama/yama++/Context.h`,
//! whose context keeps a weak pointer to its owning domain rather than a
//! strong one, so a domain can be torn down independently of contexts that
//! outlive it.

use std::sync::{Arc, Weak};

use crate::area::Area;
use crate::domain::DomainLoader;
use crate::model::Parcel;
use crate::runtime::TypeObject;

pub struct ContextLoader {
    upstream: Weak<DomainLoader>,
    parcels: Area<Parcel>,
    types: Area<TypeObject>,
}

impl ContextLoader {
    pub fn new(domain: &Arc<DomainLoader>) -> Self {
        Self {
            upstream: Arc::downgrade(domain),
            parcels: Area::new(),
            types: Area::new(),
        }
    }

    pub fn fetch_parcel(&self, path: &str) -> Option<Arc<Parcel>> {
        self.parcels.fetch(path)
    }

    pub fn fetch_type(&self, fullname: &str) -> Option<Arc<TypeObject>> {
        self.types.fetch(fullname)
    }

    /// Delegates to the upstream domain on a cache miss, caching the
    /// result locally. Returns `None` if the upstream domain has since
    /// been dropped.
    pub fn import(&mut self, path: &str) -> Option<Arc<Parcel>> {
        if let Some(p) = self.parcels.fetch(path) {
            return Some(p);
        }
        let domain = self.upstream.upgrade()?;
        let parcel = domain.import(path)?;
        self.parcels.push(parcel.clone());
        Some(parcel)
    }

    pub fn load(&mut self, fullname: &str) -> Option<Arc<TypeObject>> {
        if let Some(t) = self.types.fetch(fullname) {
            return Some(t);
        }
        let domain = self.upstream.upgrade()?;
        let t = domain.load(fullname)?;
        self.types.push(t.clone());
        Some(t)
    }

    /// Walks the parcels imported through this context so far.
    pub fn parcel_iterator(&self) -> impl Iterator<Item = &Arc<Parcel>> {
        self.parcels.iter()
    }
}
