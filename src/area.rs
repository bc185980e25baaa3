//! Two-level keyed cache with atomic commit/discard (spec.md §4.6).
//!
//! Grounded on `examples/original_source/Yama/internal/Area.h`: `push`
//! fails on an existing name, `commit` asserts no name collision against
//! the target before merging and leaves `self` empty afterwards. The
//! original chains areas via an intrusive upstream pointer; here the
//! domain/context loaders own both halves directly and drive `fetch`
//! fallback themselves (see [`crate::domain::DomainLoader`] and
//! [`crate::context::ContextLoader`]) rather than Area holding a pointer
//! to its own upstream — an ordinary owned/borrowed chain is simpler in
//! Rust and carries the same fetch/commit/discard semantics.

use std::collections::HashMap;
use std::sync::Arc;

/// A resource keyable by a stable name, for storage in an [`Area`].
pub trait AreaResource {
    fn area_name(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct Area<T: AreaResource> {
    by_name: HashMap<String, Arc<T>>,
}

impl<T: AreaResource> Default for Area<T> {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }
}

impl<T: AreaResource> Area<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch(&self, name: &str) -> Option<Arc<T>> {
        self.by_name.get(name).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.by_name.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.by_name.values()
    }

    /// Inserts `resource`, failing if its name is already present.
    pub fn push(&mut self, resource: Arc<T>) -> bool {
        let name = resource.area_name();
        if self.by_name.contains_key(&name) {
            return false;
        }
        self.by_name.insert(name, resource);
        true
    }

    /// Clears all local resources.
    pub fn discard(&mut self) {
        self.by_name.clear();
    }

    /// Merges all local entries into `upstream`. Precondition: no key in
    /// `self` exists in `upstream`. Leaves `self` empty on success.
    pub fn commit(&mut self, upstream: &mut Area<T>) -> Result<(), Vec<String>> {
        let collisions: Vec<String> = self
            .by_name
            .keys()
            .filter(|k| upstream.by_name.contains_key(*k))
            .cloned()
            .collect();
        if !collisions.is_empty() {
            return Err(collisions);
        }
        for (name, resource) in self.by_name.drain() {
            upstream.by_name.insert(name, resource);
        }
        Ok(())
    }
}
