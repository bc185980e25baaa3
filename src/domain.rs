//! The domain loader (spec.md §4.7): globally shared, thread-safe. Holds
//! Redirects, parcel bindings, the commits area, and the load manager.
//! Grounded on `examples/original_source/Yama/yama++/Domain.h` and
//! `bsharp_analysis::framework::session::ArtifactStore`'s `RwLock`-guarded
//! store pattern: `access_lock` (reader-writer) protects `commits`, while
//! `update_lock` (exclusive) serializes load sessions and protects
//! bindings/redirects/the load manager's internal state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::area::Area;
use crate::builtin;
use crate::errors::{Result, YamaError};
use crate::loader::LoadManager;
use crate::model::{ModuleInfo, Parcel, ParcelMeta};
use crate::redirects::Redirects;
use crate::runtime::TypeObject;
use crate::specifier::solve_path;

struct DomainState {
    bindings: HashMap<String, Arc<Parcel>>,
    redirects: Redirects,
    manager: LoadManager,
}

/// The domain-wide loader. Cheap to share: wrap in `Arc` and hand clones
/// to per-context [`crate::context::ContextLoader`]s.
pub struct DomainLoader {
    commits: RwLock<Area<TypeObject>>,
    state: Mutex<DomainState>,
}

impl Default for DomainLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainLoader {
    /// Installs the builtin `yama` parcel (spec.md §6) before any user
    /// parcel can bind, bypassing [`Self::bind_parcel_def`]'s rejection of
    /// `"yama"` — this is the one sanctioned internal bootstrap.
    pub fn new() -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(
            builtin::BUILTIN_PATH.to_string(),
            builtin::builtin_parcel().expect("builtin parcel definition is well-formed"),
        );
        Self {
            commits: RwLock::new(Area::new()),
            state: Mutex::new(DomainState {
                bindings,
                redirects: Redirects::new(),
                manager: LoadManager::new(),
            }),
        }
    }

    /// Binds `module` at `path`. Fails on an illegal path, on `"yama"`
    /// (reserved for the builtin parcel), or if `path` is already bound
    /// (spec.md §6 `bindParcelDef`).
    pub fn bind_parcel_def(&self, path: &str, module: ModuleInfo, meta: ParcelMeta) -> Result<()> {
        solve_path(path)?;
        if path == builtin::BUILTIN_PATH {
            return Err(YamaError::PathBindError(path.to_string(), "`yama` is reserved for the builtin parcel".to_string()));
        }
        let mut state = self.state.lock().expect("domain state lock poisoned");
        if state.bindings.contains_key(path) {
            return Err(YamaError::NameConflict(path.to_string(), "domain".to_string()));
        }
        let redirects = state.redirects.compute(path);
        let parcel = Arc::new(Parcel::new(path, meta, Arc::new(module), redirects));
        log::info!("binding parcel at `{path}`");
        state.bindings.insert(path.to_string(), parcel);
        Ok(())
    }

    /// Adds a redirect rule. Only affects parcels bound after this call —
    /// a parcel's `RedirectSet` is a snapshot taken at bind time (spec.md
    /// §5: "Parcel-level Redirects, once a parcel is bound, are treated
    /// as immutable for the duration of a load session").
    pub fn add_redirect(&self, subject: &str, before: &str, after: &str) -> Result<()> {
        solve_path(subject)?;
        solve_path(before)?;
        solve_path(after)?;
        let mut state = self.state.lock().expect("domain state lock poisoned");
        state.redirects.add(subject, before, after);
        Ok(())
    }

    /// Clears all bindings (re-installing the builtin parcel), all
    /// redirects, and all committed types.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("domain state lock poisoned");
        let mut bindings = HashMap::new();
        bindings.insert(builtin::BUILTIN_PATH.to_string(), builtin::builtin_parcel().expect("builtin parcel definition is well-formed"));
        state.bindings = bindings;
        state.redirects = Redirects::new();
        drop(state);
        self.commits.write().expect("commits lock poisoned").discard();
        log::info!("domain reset");
    }

    pub fn fetch_parcel(&self, path: &str) -> Option<Arc<Parcel>> {
        self.state.lock().expect("domain state lock poisoned").bindings.get(path).cloned()
    }

    pub fn fetch_type(&self, fullname: &str) -> Option<Arc<TypeObject>> {
        self.commits.read().expect("commits lock poisoned").fetch(fullname)
    }

    /// Imports a bound parcel by path. Touches neither staging nor
    /// commits: a path import produces no type data (spec.md §4.3).
    pub fn import(&self, path: &str) -> Option<Arc<Parcel>> {
        let state = self.state.lock().expect("domain state lock poisoned");
        state.manager.import(&state.bindings, path)
    }

    /// Loads a type fullname, running a full load session under
    /// `update_lock`, then publishing newly staged types into `commits`
    /// under `access_lock` (write).
    ///
    /// A staged type already present in `commits` (a type with the same
    /// fullname committed by an earlier `load`) is skipped rather than
    /// treated as a collision: `gen_type_data`'s short-circuit only
    /// dedupes within one session's own staging, so a later, independent
    /// session legitimately re-derives a fresh (but [`PartialEq`]-equal,
    /// since [`TypeObject`] equality is by fullname) `TypeObject` for the
    /// same fullname — this is what makes `load` idempotent across calls.
    pub fn load(&self, fullname: &str) -> Option<Arc<TypeObject>> {
        let result = {
            let state = self.state.lock().expect("domain state lock poisoned");
            state.manager.load(&state.bindings, fullname)
        };
        let (resolved, staging) = result?;
        let mut commits = self.commits.write().expect("commits lock poisoned");
        for t in staging.iter() {
            if !commits.exists(&t.fullname()) {
                commits.push(t.clone());
            }
        }
        log::info!("committed load of `{fullname}`");
        Some(resolved)
    }
}
