//! Parcel-definition builder (spec.md §4.4). Grounded on
//! `examples/original_source/Yama/internal/ParcelInfo.cpp` and
//! `YmParcelDef.cpp`: `addStruct`/`addProtocol`/`addFn` create owner types,
//! `addMethod`/`addMethodReq` attach members (wiring the owner/member
//! `$Self`-ref pair exactly as `TypeInfo::attemptSetupAsMember` does),
//! `addTypeParam`/`addParam`/`addRef` intern reference symbols into a
//! type's own constant table via the no-env specifier solver, preserving
//! `%here`/`$Self`/`$Param` unsubstituted for later resolution.

use std::collections::HashMap;

use crate::errors::{Result, YamaError};
use crate::model::{CallSig, ConstEntry, ModuleInfo, ParamInfo, TypeInfo, TypeKind, TypeParamInfo, MAX_PARAMS, MAX_TYPE_PARAMS};
use crate::specifier::{solve_type, SpecifierKind};

/// An opaque handle to a type under construction, valid only against the
/// [`ParcelDefBuilder`] that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeHandle(u32);

#[derive(Debug, Default)]
pub struct ParcelDefBuilder {
    types: Vec<TypeInfo>,
    name_index: HashMap<String, usize>,
}

fn intern_ref(info: &mut TypeInfo, symbol: &str) -> Result<usize> {
    let spec = solve_type(symbol)?;
    debug_assert_eq!(spec.kind(), SpecifierKind::Type);
    Ok(info.consts.push(ConstEntry::RefSym(spec.as_str().to_string())))
}

impl ParcelDefBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_owner(&mut self, name: &str, kind: TypeKind, return_type_symbol: Option<&str>) -> Result<TypeHandle> {
        if self.name_index.contains_key(name) {
            return Err(YamaError::NameConflict(name.to_string(), "parcel".to_string()));
        }
        let mut info = TypeInfo {
            local_name: name.to_string(),
            lid: 0,
            kind,
            call_sig: None,
            params: vec![],
            type_params: None,
            owner_const: None,
            members: vec![],
            consts: crate::model::ConstTableInfo::new(),
        };
        if let Some(ret_sym) = return_type_symbol {
            let ret = intern_ref(&mut info, ret_sym)?;
            info.call_sig = Some(CallSig { params: vec![], ret });
        }
        let idx = self.types.len();
        self.name_index.insert(name.to_string(), idx);
        self.types.push(info);
        Ok(TypeHandle(idx as u32))
    }

    pub fn add_struct(&mut self, name: &str) -> Result<TypeHandle> {
        self.add_owner(name, TypeKind::Struct, None)
    }

    /// A scalar builtin (`Int`, `Bool`, …): an owner type with no members
    /// and no call signature of its own (spec.md §6 builtin parcel).
    pub fn add_primitive(&mut self, name: &str) -> Result<TypeHandle> {
        self.add_owner(name, TypeKind::Primitive, None)
    }

    pub fn add_protocol(&mut self, name: &str) -> Result<TypeHandle> {
        self.add_owner(name, TypeKind::Protocol, None)
    }

    pub fn add_fn(&mut self, name: &str, return_type_symbol: &str) -> Result<TypeHandle> {
        self.add_owner(name, TypeKind::Function, Some(return_type_symbol))
    }

    /// Adds a member to `owner`, wiring `$Self`/`$Self::name` ref constants
    /// on both sides the way `TypeInfo::attemptSetupAsMember` does, so the
    /// owner/member relationship survives generic instantiation uniformly.
    fn add_member(&mut self, owner: TypeHandle, name: &str, kind: TypeKind, return_type_symbol: Option<&str>) -> Result<TypeHandle> {
        let owner_idx = owner.0 as usize;
        let owner_name = self.types[owner_idx].local_name.clone();
        if self.types[owner_idx].is_member() {
            return Err(YamaError::MemberType(owner_name));
        }
        let full_name = format!("{owner_name}::{name}");
        if self.name_index.contains_key(&full_name) {
            return Err(YamaError::NameConflict(full_name, owner_name));
        }

        let mut member = TypeInfo {
            local_name: full_name.clone(),
            lid: 0,
            kind,
            call_sig: None,
            params: vec![],
            type_params: None,
            owner_const: None,
            members: vec![],
            consts: crate::model::ConstTableInfo::new(),
        };
        let owner_const = intern_ref(&mut member, "$Self")?;
        member.owner_const = Some(owner_const);
        if let Some(ret_sym) = return_type_symbol {
            let ret = intern_ref(&mut member, ret_sym)?;
            member.call_sig = Some(CallSig { params: vec![], ret });
        }

        let member_idx = self.types.len();
        self.name_index.insert(full_name, member_idx);
        self.types.push(member);

        let member_ref = intern_ref(&mut self.types[owner_idx], &format!("$Self::{name}"))?;
        self.types[owner_idx].members.push(member_ref);

        Ok(TypeHandle(member_idx as u32))
    }

    pub fn add_method(&mut self, owner: TypeHandle, name: &str, return_type_symbol: &str) -> Result<TypeHandle> {
        self.add_member(owner, name, TypeKind::Method, Some(return_type_symbol))
    }

    /// A protocol method requirement: structurally a method with no
    /// materialized call behavior of its own, since this crate does not
    /// execute call bodies (out of scope — see `spec.md` §1).
    pub fn add_method_req(&mut self, owner: TypeHandle, name: &str, return_type_symbol: &str) -> Result<TypeHandle> {
        self.add_member(owner, name, TypeKind::Method, Some(return_type_symbol))
    }

    pub fn add_type_param(&mut self, type_h: TypeHandle, name: &str, constraint_type_symbol: &str) -> Result<usize> {
        let idx = type_h.0 as usize;
        if self.types[idx].is_member() {
            return Err(YamaError::MemberType(self.types[idx].local_name.clone()));
        }
        let owner_name = self.types[idx].local_name.clone();
        let member_full_name = format!("{owner_name}::{name}");
        if self.name_index.contains_key(&member_full_name) {
            return Err(YamaError::NameConflict(name.to_string(), owner_name));
        }
        let existing = self.types[idx].type_params.get_or_insert_with(Vec::new);
        if existing.iter().any(|p| p.name == name) {
            return Err(YamaError::NameConflict(name.to_string(), self.types[idx].local_name.clone()));
        }
        if existing.len() >= MAX_TYPE_PARAMS {
            return Err(YamaError::LimitReached(format!("type parameter count would exceed {MAX_TYPE_PARAMS}")));
        }
        let constraint_const = intern_ref(&mut self.types[idx], constraint_type_symbol)?;
        let type_params = self.types[idx].type_params.get_or_insert_with(Vec::new);
        type_params.push(TypeParamInfo {
            name: name.to_string(),
            constraint_const,
        });
        Ok(type_params.len() - 1)
    }

    pub fn add_param(&mut self, type_h: TypeHandle, name: &str, param_type_symbol: &str) -> Result<usize> {
        let idx = type_h.0 as usize;
        if !self.types[idx].is_callable() {
            return Err(YamaError::NonCallableType(self.types[idx].local_name.clone()));
        }
        if self.types[idx].params.iter().any(|p| p.name == name) {
            return Err(YamaError::NameConflict(name.to_string(), self.types[idx].local_name.clone()));
        }
        if self.types[idx].params.len() >= MAX_PARAMS {
            return Err(YamaError::LimitReached(format!("parameter count would exceed {MAX_PARAMS}")));
        }
        let type_const = intern_ref(&mut self.types[idx], param_type_symbol)?;
        self.types[idx].params.push(ParamInfo {
            name: name.to_string(),
            type_const,
        });
        if let Some(sig) = &mut self.types[idx].call_sig {
            sig.params.push(type_const);
        }
        Ok(self.types[idx].params.len() - 1)
    }

    pub fn add_ref(&mut self, type_h: TypeHandle, symbol: &str) -> Result<usize> {
        intern_ref(&mut self.types[type_h.0 as usize], symbol)
    }

    pub fn finish(self) -> Result<ModuleInfo> {
        let mut module = ModuleInfo::new();
        for info in self.types {
            module.insert(info)?;
        }
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_struct_with_method_and_params() {
        let mut b = ParcelDefBuilder::new();
        let s = b.add_struct("S").unwrap();
        let m = b.add_method(s, "get", "$Self").unwrap();
        b.add_param(m, "x", "yama:Int").unwrap();

        let module = b.finish().unwrap();
        assert_eq!(module.len(), 2);
        let s_info = module.by_name("S").unwrap();
        assert_eq!(s_info.members.len(), 1);
        let m_info = module.by_name("S::get").unwrap();
        assert!(m_info.is_member());
        assert_eq!(m_info.params.len(), 1);
        assert_eq!(m_info.params[0].name, "x");
    }

    #[test]
    fn builds_generic_struct_with_type_param() {
        let mut b = ParcelDefBuilder::new();
        let s = b.add_struct("Box").unwrap();
        b.add_type_param(s, "T", "yama:Any").unwrap();
        let module = b.finish().unwrap();
        assert!(module.by_name("Box").unwrap().is_parameterized());
    }

    #[test]
    fn rejects_duplicate_type_name() {
        let mut b = ParcelDefBuilder::new();
        b.add_struct("S").unwrap();
        assert!(matches!(b.add_struct("S"), Err(YamaError::NameConflict(_, _))));
    }

    #[test]
    fn rejects_param_on_non_callable() {
        let mut b = ParcelDefBuilder::new();
        let s = b.add_struct("S").unwrap();
        assert!(matches!(b.add_param(s, "x", "yama:Int"), Err(YamaError::NonCallableType(_))));
    }

    #[test]
    fn rejects_type_param_on_member() {
        let mut b = ParcelDefBuilder::new();
        let s = b.add_struct("S").unwrap();
        let m = b.add_method(s, "get", "yama:Int").unwrap();
        assert!(matches!(b.add_type_param(m, "T", "yama:Any"), Err(YamaError::MemberType(_))));
    }

    #[test]
    fn rejects_type_param_colliding_with_existing_member_name() {
        let mut b = ParcelDefBuilder::new();
        let s = b.add_struct("S").unwrap();
        b.add_method(s, "T", "yama:Int").unwrap();
        assert!(matches!(b.add_type_param(s, "T", "yama:Any"), Err(YamaError::NameConflict(_, _))));
    }
}
