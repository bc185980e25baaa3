//! Type-info: the static, pre-resolution description of a type (spec.md §3).

use super::const_table::ConstTableInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive,
    Function,
    Method,
    Struct,
    Protocol,
}

/// One entry of a type's call signature: parameter constant-indices plus
/// a return constant-index, each indexing into the owning [`TypeInfo`]'s
/// constant table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSig {
    pub params: Vec<usize>,
    pub ret: usize,
}

/// A declared value parameter (spec.md §4.4 `addParam`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: String,
    pub type_const: usize,
}

/// A declared type parameter (spec.md §4.4 `addTypeParam`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParamInfo {
    pub name: String,
    pub constraint_const: usize,
}

pub const MAX_PARAMS: usize = 24;
pub const MAX_TYPE_PARAMS: usize = 24;

#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// Unqualified local name; for members this is `"Owner::Member"` — a
    /// type-info is an owner iff this contains no `::` (spec.md §3).
    pub local_name: String,
    /// Per-module integer local ID.
    pub lid: u32,
    pub kind: TypeKind,
    pub call_sig: Option<CallSig>,
    pub params: Vec<ParamInfo>,
    pub type_params: Option<Vec<TypeParamInfo>>,
    /// Owner constant-index, present only for members.
    pub owner_const: Option<usize>,
    /// Ordered member constant-indices, present only for owners.
    pub members: Vec<usize>,
    pub consts: ConstTableInfo,
}

impl TypeInfo {
    pub fn is_owner(&self) -> bool {
        !self.local_name.contains("::")
    }

    pub fn is_member(&self) -> bool {
        !self.is_owner()
    }

    pub fn is_parameterized(&self) -> bool {
        self.type_params.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn type_param_count(&self) -> usize {
        self.type_params.as_ref().map_or(0, |p| p.len())
    }

    /// The member-local part of `local_name` (e.g. `"m"` for `"S::m"`).
    /// Panics if called on an owner — callers should check [`Self::is_member`].
    pub fn member_local_name(&self) -> &str {
        debug_assert!(self.is_member());
        self.local_name.rsplit("::").next().unwrap_or(&self.local_name)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, TypeKind::Function | TypeKind::Method) && self.call_sig.is_some()
    }

    pub fn can_have_members(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Protocol)
    }
}
