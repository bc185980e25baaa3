//! Protocol conformance, `$Self`-aware (spec.md §4.5). Grounded on
//! `examples/original_source/Yama/internal/YmType.cpp`'s `YmType::conforms`:
//! for each member requirement on the protocol, a same-named member must
//! exist on the candidate with a matching param count, and each
//! return/param type must either be byte-for-byte the same [`TypeObject`]
//! (when the requirement's ref-sym carries no `$Self`) or, when it does,
//! match after substituting `$Self` with the candidate's own fullname.

use std::sync::Arc;

use crate::model::{ConstEntry, TypeKind};
use crate::runtime::TypeObject;
use crate::specifier::solver::{Solver, SolverEnv};
use crate::specifier::SpecifierKind;

struct ConformEnv {
    here: String,
    self_fullname: String,
}

impl SolverEnv for ConformEnv {
    fn here(&self) -> Option<String> {
        Some(self.here.clone())
    }
    fn self_type(&self) -> Option<String> {
        Some(self.self_fullname.clone())
    }
}

/// Compares the type referenced by `p_memb`'s constant-table slot
/// `const_idx` against `type_in_match`, substituting `$Self` with
/// `candidate`'s fullname if the ref-sym mentions it.
fn compare(p_memb: &Arc<TypeObject>, const_idx: usize, candidate: &Arc<TypeObject>, type_in_match: &Arc<TypeObject>) -> bool {
    let Some(ConstEntry::RefSym(sym)) = p_memb.info.consts.get(const_idx) else {
        return false;
    };
    if !sym.contains("$Self") {
        let Some(resolved) = p_memb.const_slot(const_idx).as_type().cloned() else {
            return false;
        };
        return resolved == *type_in_match;
    }
    let env = ConformEnv {
        here: p_memb.parcel.path.clone(),
        self_fullname: candidate.fullname(),
    };
    match Solver::new(&env).solve(sym, Some(SpecifierKind::Type)) {
        Ok(spec) => spec.as_str() == type_in_match.fullname(),
        Err(_) => false,
    }
}

/// Does `candidate` conform to `protocol`? `protocol` must be a protocol
/// type; every member requirement must find a matching candidate member
/// with the same param count and substitution-equal return/param types.
pub fn conforms(candidate: &Arc<TypeObject>, protocol: &Arc<TypeObject>) -> bool {
    debug_assert_eq!(protocol.kind(), TypeKind::Protocol);

    for p_memb in protocol.members() {
        let member_local = p_memb.info.member_local_name();
        let Some(match_memb) = candidate.member(member_local) else {
            return false;
        };

        let (Some(p_ret_idx), Some(m_ret_idx)) = (
            p_memb.info.call_sig.as_ref().map(|c| c.ret),
            match_memb.info.call_sig.as_ref().map(|c| c.ret),
        ) else {
            return false;
        };
        let Some(type_in_match_ret) = match_memb.const_slot(m_ret_idx).as_type().cloned() else {
            return false;
        };
        if !compare(&p_memb, p_ret_idx, candidate, &type_in_match_ret) {
            return false;
        }

        let p_params = &p_memb.info.params;
        let m_params = &match_memb.info.params;
        if p_params.len() != m_params.len() {
            return false;
        }
        for j in 0..p_params.len() {
            let Some(type_in_match_param) = match_memb.const_slot(m_params[j].type_const).as_type().cloned() else {
                return false;
            };
            if !compare(&p_memb, p_params[j].type_const, candidate, &type_in_match_param) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstTableInfo, ModuleInfo, Parcel, ParcelMeta, TypeInfo};
    use crate::redirects::Redirects;
    use crate::runtime::ResolvedConst;

    fn parcel() -> Arc<Parcel> {
        Arc::new(Parcel::new("p", ParcelMeta::default(), Arc::new(ModuleInfo::new()), Redirects::new().compute("p")))
    }

    fn int_type(parcel: &Arc<Parcel>) -> Arc<TypeObject> {
        let info = Arc::new(TypeInfo {
            local_name: "Int".to_string(),
            lid: 0,
            kind: TypeKind::Primitive,
            call_sig: None,
            params: vec![],
            type_params: None,
            owner_const: None,
            members: vec![],
            consts: ConstTableInfo::new(),
        });
        TypeObject::new(parcel.clone(), info, vec![])
    }

    /// Builds an owner type (`owner_kind`, usually [`TypeKind::Struct`] or
    /// [`TypeKind::Protocol`]) with one no-arg method `method_name` whose
    /// declared return-type ref-sym is `ret_sym` (e.g. `"yama:Int"` or
    /// `"$Self"`). Both owner/member const slots are wired against the
    /// returned owner instance directly, and the return slot is resolved
    /// to `ret_value` (ignored when `ret_sym` is `"$Self"`, since `compare`
    /// then consults the candidate's own fullname instead).
    fn owner_with_method(
        parcel: &Arc<Parcel>,
        owner_kind: TypeKind,
        owner_name: &str,
        method_name: &str,
        ret_sym: &str,
        ret_value: &Arc<TypeObject>,
    ) -> Arc<TypeObject> {
        let mut member_consts = ConstTableInfo::new();
        let owner_const = member_consts.push(ConstEntry::RefSym("$Self".to_string()));
        let ret_const = member_consts.push(ConstEntry::RefSym(ret_sym.to_string()));
        let member_info = Arc::new(TypeInfo {
            local_name: format!("{owner_name}::{method_name}"),
            lid: 1,
            kind: TypeKind::Method,
            call_sig: Some(crate::model::CallSig { params: vec![], ret: ret_const }),
            params: vec![],
            type_params: None,
            owner_const: Some(owner_const),
            members: vec![],
            consts: member_consts,
        });

        let mut owner_consts = ConstTableInfo::new();
        let member_ref = owner_consts.push(ConstEntry::RefSym(format!("$Self::{method_name}")));
        let owner_info = Arc::new(TypeInfo {
            local_name: owner_name.to_string(),
            lid: 0,
            kind: owner_kind,
            call_sig: None,
            params: vec![],
            type_params: None,
            owner_const: None,
            members: vec![member_ref],
            consts: owner_consts,
        });

        let owner = TypeObject::new(parcel.clone(), owner_info, vec![]);
        let member = TypeObject::new(parcel.clone(), member_info, vec![]);
        member.set_const_slot(owner_const, ResolvedConst::Type(owner.clone()));
        if ret_sym != "$Self" {
            member.set_const_slot(ret_const, ResolvedConst::Type(ret_value.clone()));
        }
        owner.set_const_slot(member_ref, ResolvedConst::Type(member));
        owner
    }

    #[test]
    fn matching_return_type_conforms() {
        let p = parcel();
        let int_ty = int_type(&p);
        let protocol = owner_with_method(&p, TypeKind::Protocol, "Counter", "next", "yama:Int", &int_ty);
        let candidate = owner_with_method(&p, TypeKind::Struct, "S", "next", "yama:Int", &int_ty);
        assert!(conforms(&candidate, &protocol));
    }

    #[test]
    fn mismatched_return_type_does_not_conform() {
        let p = parcel();
        let int_ty = int_type(&p);
        let protocol = owner_with_method(&p, TypeKind::Protocol, "Counter", "next", "yama:Int", &int_ty);

        let bool_ty = {
            let info = Arc::new(TypeInfo {
                local_name: "Bool".to_string(),
                lid: 2,
                kind: TypeKind::Primitive,
                call_sig: None,
                params: vec![],
                type_params: None,
                owner_const: None,
                members: vec![],
                consts: ConstTableInfo::new(),
            });
            TypeObject::new(p.clone(), info, vec![])
        };
        let candidate = owner_with_method(&p, TypeKind::Struct, "S", "next", "yama:Bool", &bool_ty);
        assert!(!conforms(&candidate, &protocol));
    }

    #[test]
    fn missing_member_does_not_conform() {
        let p = parcel();
        let int_ty = int_type(&p);
        let protocol = owner_with_method(&p, TypeKind::Protocol, "Counter", "next", "yama:Int", &int_ty);

        let empty_info = Arc::new(TypeInfo {
            local_name: "Empty".to_string(),
            lid: 0,
            kind: TypeKind::Struct,
            call_sig: None,
            params: vec![],
            type_params: None,
            owner_const: None,
            members: vec![],
            consts: ConstTableInfo::new(),
        });
        let empty = TypeObject::new(p.clone(), empty_info, vec![]);
        assert!(!conforms(&empty, &protocol));
    }

    #[test]
    fn self_referencing_return_type_substitutes_candidate() {
        let p = parcel();
        let int_ty = int_type(&p);
        let protocol = owner_with_method(&p, TypeKind::Protocol, "Chainable", "next", "$Self", &int_ty);

        // Candidate's "next" returns its own type ($Self-substituted), so
        // the member's return slot must resolve to `candidate` itself.
        let candidate = owner_with_method(&p, TypeKind::Struct, "S", "next", "$Self", &int_ty);
        let candidate_member = candidate.member("next").unwrap();
        let ret_const = candidate_member.info.call_sig.as_ref().unwrap().ret;
        candidate_member.set_const_slot(ret_const, ResolvedConst::Type(candidate.clone()));

        assert!(conforms(&candidate, &protocol));
    }
}
