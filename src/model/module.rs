//! Module-info: the set of type-info records delivered at one relative
//! path within a parcel (spec.md §3).

use std::collections::HashMap;
use std::sync::Arc;

use super::type_info::TypeInfo;
use crate::errors::{Result, YamaError};

#[derive(Debug, Clone, Default)]
pub struct ModuleInfo {
    by_name: HashMap<String, Arc<TypeInfo>>,
    by_lid: Vec<Arc<TypeInfo>>,
}

impl ModuleInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type, assigning it the next local ID. Fails on a
    /// duplicate local name.
    pub fn insert(&mut self, mut info: TypeInfo) -> Result<u32> {
        if self.by_name.contains_key(&info.local_name) {
            return Err(YamaError::NameConflict(
                info.local_name.clone(),
                "module".to_string(),
            ));
        }
        let lid = self.by_lid.len() as u32;
        info.lid = lid;
        let arc = Arc::new(info);
        self.by_name.insert(arc.local_name.clone(), arc.clone());
        self.by_lid.push(arc);
        Ok(lid)
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<TypeInfo>> {
        self.by_name.get(name)
    }

    pub fn by_lid(&self, lid: u32) -> Option<&Arc<TypeInfo>> {
        self.by_lid.get(lid as usize)
    }

    pub fn len(&self) -> usize {
        self.by_lid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lid.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeInfo>> {
        self.by_lid.iter()
    }
}
