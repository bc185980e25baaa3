//! The runtime, post-resolution Type object (spec.md §3).

use std::sync::{Arc, OnceLock, RwLock};

use crate::area::AreaResource;
use crate::model::{Parcel, TypeInfo, TypeKind};

/// A resolved constant-table slot: either a scalar value, a resolved
/// pointer to another Type object, or still-unresolved (only transiently,
/// between type-data generation and the late-resolve queue draining it).
#[derive(Debug, Clone)]
pub enum ResolvedConst {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    /// Raw codepoint value; see [`crate::model::ConstEntry::Rune`].
    Rune(u32),
    Type(Arc<TypeObject>),
    Unresolved,
}

impl ResolvedConst {
    pub fn as_type(&self) -> Option<&Arc<TypeObject>> {
        match self {
            ResolvedConst::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, ResolvedConst::Unresolved)
    }
}

/// The materialized runtime type. Shared via `Arc` so that a Type can be
/// reached by fullname lookup (in staging) before its own constant table
/// has finished resolving — this is what makes member/owner cycles safe
/// (spec.md §9).
#[derive(Debug)]
pub struct TypeObject {
    pub parcel: Arc<Parcel>,
    pub info: Arc<TypeInfo>,
    /// Non-empty only for a concrete generic instantiation's owner Type;
    /// always empty on a member Type (a member's "arguments" are those of
    /// its owner, reached via [`Self::owner`]).
    pub type_args: Vec<Arc<TypeObject>>,
    /// Exactly `info.consts.len()` slots, each [`ResolvedConst::Unresolved`]
    /// until early/late resolution fills it in (spec.md §3 invariant).
    resolved_consts: RwLock<Vec<ResolvedConst>>,
    fullname_cache: OnceLock<String>,
}

impl TypeObject {
    pub fn new(parcel: Arc<Parcel>, info: Arc<TypeInfo>, type_args: Vec<Arc<TypeObject>>) -> Arc<Self> {
        debug_assert!(info.is_owner() || type_args.is_empty());
        let len = info.consts.len();
        Arc::new(Self {
            parcel,
            info,
            type_args,
            resolved_consts: RwLock::new(vec![ResolvedConst::Unresolved; len]),
            fullname_cache: OnceLock::new(),
        })
    }

    pub fn const_slot(&self, index: usize) -> ResolvedConst {
        self.resolved_consts
            .read()
            .expect("resolved-const table poisoned")
            .get(index)
            .cloned()
            .unwrap_or(ResolvedConst::Unresolved)
    }

    pub fn set_const_slot(&self, index: usize, value: ResolvedConst) {
        let mut guard = self.resolved_consts.write().expect("resolved-const table poisoned");
        guard[index] = value;
    }

    pub fn resolved_len(&self) -> usize {
        self.resolved_consts.read().expect("resolved-const table poisoned").len()
    }

    pub fn unresolved_ref_indices(&self) -> Vec<usize> {
        self.resolved_consts
            .read()
            .expect("resolved-const table poisoned")
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_unresolved())
            .map(|(i, _)| i)
            .collect()
    }

    /// The owner Type, read from `info.owner_const`'s resolved slot. `None`
    /// for an owner (non-member) Type.
    pub fn owner(&self) -> Option<Arc<TypeObject>> {
        let idx = self.info.owner_const?;
        self.const_slot(idx).as_type().cloned()
    }

    pub fn is_member(&self) -> bool {
        self.info.is_member()
    }

    pub fn kind(&self) -> TypeKind {
        self.info.kind
    }

    /// Member Type objects reached through `info.members`, resolved via
    /// their constant-index.
    pub fn members(&self) -> Vec<Arc<TypeObject>> {
        self.info
            .members
            .iter()
            .filter_map(|&idx| self.const_slot(idx).as_type().cloned())
            .collect()
    }

    pub fn member(&self, local_name: &str) -> Option<Arc<TypeObject>> {
        self.members()
            .into_iter()
            .find(|m| m.info.member_local_name() == local_name)
    }

    pub fn type_param_arg(&self, name: &str) -> Option<Arc<TypeObject>> {
        let type_params = self.info.type_params.as_ref()?;
        let idx = type_params.iter().position(|p| p.name == name)?;
        self.type_args.get(idx).cloned()
    }

    pub fn fullname(&self) -> String {
        self.fullname_cache
            .get_or_init(|| {
                if let Some(owner) = self.owner() {
                    format!("{}::{}", owner.fullname(), self.info.member_local_name())
                } else {
                    let mut s = format!("{}:{}", self.parcel.path, self.info.local_name);
                    if !self.type_args.is_empty() {
                        s.push('[');
                        for (i, a) in self.type_args.iter().enumerate() {
                            if i > 0 {
                                s.push(',');
                            }
                            s.push_str(&a.fullname());
                        }
                        s.push(']');
                    }
                    s
                }
            })
            .clone()
    }
}

impl PartialEq for TypeObject {
    fn eq(&self, other: &Self) -> bool {
        self.fullname() == other.fullname()
    }
}
impl Eq for TypeObject {}

impl std::fmt::Display for TypeObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fullname())
    }
}

impl AreaResource for TypeObject {
    fn area_name(&self) -> String {
        self.fullname()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstTableInfo, ParcelMeta, TypeInfo};
    use crate::redirects::Redirects;

    fn parcel() -> Arc<Parcel> {
        Arc::new(Parcel::new(
            "p",
            ParcelMeta::default(),
            Arc::new(crate::model::ModuleInfo::new()),
            Redirects::new().compute("p"),
        ))
    }

    fn owner_info(name: &str) -> Arc<TypeInfo> {
        Arc::new(TypeInfo {
            local_name: name.to_string(),
            lid: 0,
            kind: TypeKind::Struct,
            call_sig: None,
            params: vec![],
            type_params: None,
            owner_const: None,
            members: vec![],
            consts: ConstTableInfo::new(),
        })
    }

    #[test]
    fn equality_is_by_fullname() {
        let p = parcel();
        let a = TypeObject::new(p.clone(), owner_info("S"), vec![]);
        let b = TypeObject::new(p.clone(), owner_info("S"), vec![]);
        assert_eq!(a, b);
        assert_eq!(a.fullname(), "p:S");
    }

    #[test]
    fn member_fullname_includes_owner_and_args() {
        let p = parcel();
        let int_ty = TypeObject::new(p.clone(), owner_info("Int"), vec![]);
        let mut box_info = (*owner_info("Box")).clone();
        box_info.type_params = Some(vec![]);
        let boxed = TypeObject::new(p.clone(), Arc::new(box_info), vec![int_ty]);
        assert_eq!(boxed.fullname(), "p:Box[p:Int]");

        let mut member_info = (*owner_info("Box::get")).clone();
        member_info.owner_const = Some(0);
        let member = TypeObject::new(p.clone(), Arc::new(member_info), vec![]);
        member.set_const_slot(0, ResolvedConst::Type(boxed.clone()));
        assert_eq!(member.fullname(), "p:Box[p:Int]::get");
        assert_eq!(member.owner().unwrap(), boxed);
    }
}
