//! The load manager (spec.md §4.3). Grounded on
//! `examples/original_source/Yama/internal/LoadManager.cpp`: orchestrates
//! one `import`/`load` request end-to-end — type-data generation with
//! early resolution, the late-resolve queue, and the three post-resolution
//! checks, in the original's exact order.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use regex::Regex;

use crate::area::Area;
use crate::diagnostics;
use crate::errors::{Result, YamaError};
use crate::model::{ConstEntry, Parcel, TypeKind};
use crate::redirects::RedirectSet;
use crate::runtime::{ResolvedConst, TypeObject};
use crate::specifier::solver::{Solver, SolverEnv};
use crate::term::{InterpEnv, LoaderHost, Term, TermStack};

use super::conformance::conforms;

/// `$Self` or `$Self::Member` and nothing past it — the early-resolvable
/// ref-constant shapes (spec.md §4.3.1).
fn early_resolve_pattern() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\$Self(::[^\[\]:/]+)?$").expect("static pattern"))
}

/// A bare identifier that isn't `$Self` — an illegal type-parameter
/// constraint, since the constraining protocol's interface would be
/// indeterminate (spec.md §4.3.3).
fn bare_type_param_ref_pattern() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?!\$Self$)[^\[:/]+$").expect("static pattern"))
}

fn is_early_resolve_const(entry: &ConstEntry) -> bool {
    match entry {
        ConstEntry::RefSym(sym) => early_resolve_pattern().is_match(sym),
        _ => true,
    }
}

/// The type a member's own `$Self`/`$Param` substitutions resolve
/// against: a member's is its owner; an owner's is itself.
fn self_scope(t: &Arc<TypeObject>) -> Arc<TypeObject> {
    t.owner().unwrap_or_else(|| t.clone())
}

/// The substitution environment for solving a symbol in `t`'s own scope
/// (late resolution, constraint checks): `%here`/`$Self` resolve against
/// `t`'s owner-or-self, `$id` against that scope's type-argument map.
struct TypeScopeEnv {
    here: String,
    self_fullname: String,
    type_params: HashMap<String, String>,
    redirects: RedirectSet,
}

impl TypeScopeEnv {
    fn new(t: &Arc<TypeObject>) -> Self {
        let scope = self_scope(t);
        let mut type_params = HashMap::new();
        if let Some(infos) = &scope.info.type_params {
            for (i, p) in infos.iter().enumerate() {
                if let Some(arg) = scope.type_args.get(i) {
                    type_params.insert(p.name.clone(), arg.fullname());
                }
            }
        }
        Self {
            here: t.parcel.path.clone(),
            self_fullname: scope.fullname(),
            type_params,
            redirects: t.parcel.redirects.clone(),
        }
    }
}

impl SolverEnv for TypeScopeEnv {
    fn here(&self) -> Option<String> {
        Some(self.here.clone())
    }
    fn self_type(&self) -> Option<String> {
        Some(self.self_fullname.clone())
    }
    fn type_param(&self, id: &str) -> Option<String> {
        self.type_params.get(id).cloned()
    }
    fn redirects(&self) -> Option<&RedirectSet> {
        Some(&self.redirects)
    }
}

/// Renders `t`'s own call signature in the solver's canonical
/// `"(P1, P2) -> R"` form, for comparison against a ref-constant's
/// declared call suffix (spec.md §4.3.3).
fn render_call_sig(t: &Arc<TypeObject>) -> Option<String> {
    let sig = t.info.call_sig.as_ref()?;
    let params: Vec<String> = sig
        .params
        .iter()
        .map(|&idx| t.const_slot(idx).as_type().map(|ty| ty.fullname()).unwrap_or_default())
        .collect();
    let ret = t.const_slot(sig.ret).as_type().map(|ty| ty.fullname()).unwrap_or_default();
    Some(format!("({}) -> {}", params.join(", "), ret))
}

/// Orchestrates one `import`/`load` request. Stateless between calls —
/// all session state (staging, late-resolve queue) lives on the
/// short-lived [`LoadSession`] built for the duration of one request.
#[derive(Debug, Default)]
pub struct LoadManager;

impl LoadManager {
    pub fn new() -> Self {
        Self
    }

    /// Resolves `path` to a bound parcel. Publishes nothing; a parcel's
    /// binding is an atomic act of `bindParcelDef`, not a staged one.
    pub fn import(&self, bindings: &HashMap<String, Arc<Parcel>>, path: &str) -> Option<Arc<Parcel>> {
        diagnostics::clear();
        log::info!("importing `{path}`");
        let mut session = LoadSession::new(bindings);
        let mut stack = TermStack::new();
        let term = stack.eval(path, &InterpEnv::none(), &mut session);
        session.flush_late_resolve_queue();
        let result = match term {
            Ok(Term::Path(p)) => session.bindings.get(&p).cloned(),
            Ok(other) => {
                diagnostics::report(YamaError::PathBindError(path.to_string(), format!("`{other}` is not a path")));
                None
            }
            Err(e) => {
                diagnostics::report(e);
                None
            }
        };
        if diagnostics::failed() {
            log::warn!("import of `{path}` failed");
            None
        } else {
            result
        }
    }

    /// Loads `fullname`, running the full staging → late-resolve →
    /// post-resolution-checks → commit-or-discard pipeline. On success,
    /// returns the resolved type and the staged types the caller must
    /// merge into the commits area; on failure returns `None` and the
    /// caller discards whatever was staged.
    pub fn load(&self, bindings: &HashMap<String, Arc<Parcel>>, fullname: &str) -> Option<(Arc<TypeObject>, Area<TypeObject>)> {
        diagnostics::clear();
        log::info!("loading `{fullname}`");
        let mut session = LoadSession::new(bindings);
        let mut stack = TermStack::new();
        let term = stack.eval(fullname, &InterpEnv::none(), &mut session);
        session.process_late_resolve_queue();
        session.check_constraint_type_legality();
        session.enforce_constraints();
        session.check_ref_const_call_sig_conformance();
        session.flush_late_resolve_queue();

        let result = match term {
            Ok(Term::Concrete(t)) => Some(t),
            Ok(other) => {
                diagnostics::report(YamaError::ConcreteType(other.to_string()));
                None
            }
            Err(e) => {
                diagnostics::report(e);
                None
            }
        };

        if diagnostics::failed() {
            log::warn!("load of `{fullname}` failed");
            None
        } else {
            result.map(|t| (t, session.staging))
        }
    }
}

/// One `import`/`load` request's working state: the staging area for
/// newly discovered types and the FIFO late-resolve queue.
struct LoadSession<'a> {
    bindings: &'a HashMap<String, Arc<Parcel>>,
    staging: Area<TypeObject>,
    late_resolve_queue: VecDeque<Arc<TypeObject>>,
}

impl<'a> LoadSession<'a> {
    fn new(bindings: &'a HashMap<String, Arc<Parcel>>) -> Self {
        Self {
            bindings,
            staging: Area::new(),
            late_resolve_queue: VecDeque::new(),
        }
    }

    /// Type-data generation (spec.md §4.3.1, step 1): construct the
    /// candidate, short-circuiting to an existing staged type with the
    /// same fullname. Returns `(type, is_newly_created)`.
    fn gen_type_data(
        &mut self,
        parcel: &Arc<Parcel>,
        info: Arc<crate::model::TypeInfo>,
        owner: Option<&Arc<TypeObject>>,
        type_args: Vec<Arc<TypeObject>>,
    ) -> (Arc<TypeObject>, bool) {
        let candidate = TypeObject::new(parcel.clone(), info.clone(), type_args);
        if let (Some(owner_const), Some(owner)) = (candidate.info.owner_const, owner) {
            candidate.set_const_slot(owner_const, ResolvedConst::Type(owner.clone()));
        }
        let fullname = candidate.fullname();
        if let Some(existing) = self.staging.fetch(&fullname) {
            return (existing, false);
        }
        log::debug!("generating type data for `{fullname}`");
        self.staging.push(candidate.clone());
        (candidate, true)
    }

    /// Generates a non-member (owner) type's data, its members, and runs
    /// early resolution on both (spec.md §4.3.1, steps 2-5).
    fn gen_non_member_type_data(&mut self, parcel: &Arc<Parcel>, info: Arc<crate::model::TypeInfo>, type_args: Vec<Arc<TypeObject>>) -> Arc<TypeObject> {
        let (t, original) = self.gen_type_data(parcel, info.clone(), None, type_args);
        if original {
            self.late_resolve_queue.push_back(t.clone());
            self.gen_member_type_data(parcel, &info, &t);
            self.early_resolve_type(&t, &t);
        }
        t
    }

    fn gen_member_type_data(&mut self, parcel: &Arc<Parcel>, owner_info: &crate::model::TypeInfo, owner: &Arc<TypeObject>) {
        for &const_idx in &owner_info.members {
            let Some(ConstEntry::RefSym(sym)) = owner_info.consts.get(const_idx) else {
                continue;
            };
            let Some(member_local) = sym.strip_prefix("$Self::") else {
                continue;
            };
            let full_member_name = format!("{}::{member_local}", owner_info.local_name);
            let Some(member_info) = parcel.module.by_name(&full_member_name).cloned() else {
                diagnostics::report(YamaError::internal(format!("no type-info for member `{full_member_name}`")));
                continue;
            };
            let (member, original) = self.gen_type_data(parcel, member_info, Some(owner), vec![]);
            if original {
                self.late_resolve_queue.push_back(member.clone());
                self.early_resolve_type(&member, owner);
            }
        }
    }

    /// Early resolution (spec.md §4.3.1 step 5): value constants are
    /// filled immediately; `$Self`/`$Self::Member` ref constants resolve
    /// against `self_`, which is `x` itself for an owner or `x`'s owner
    /// for a member.
    fn early_resolve_type(&mut self, x: &Arc<TypeObject>, self_: &Arc<TypeObject>) {
        for (i, entry) in x.info.consts.iter() {
            match entry {
                ConstEntry::Int(v) => x.set_const_slot(i, ResolvedConst::Int(*v)),
                ConstEntry::UInt(v) => x.set_const_slot(i, ResolvedConst::UInt(*v)),
                ConstEntry::Float(v) => x.set_const_slot(i, ResolvedConst::Float(*v)),
                ConstEntry::Bool(v) => x.set_const_slot(i, ResolvedConst::Bool(*v)),
                ConstEntry::Rune(v) => x.set_const_slot(i, ResolvedConst::Rune(*v)),
                ConstEntry::RefSym(sym) => {
                    if !early_resolve_pattern().is_match(sym) {
                        continue;
                    }
                    if sym == "$Self" {
                        x.set_const_slot(i, ResolvedConst::Type(self_.clone()));
                    } else {
                        let member_local = sym.strip_prefix("$Self::").expect("matched pattern");
                        let member_fullname = format!("{}::{member_local}", self_.fullname());
                        match self.staging.fetch(&member_fullname) {
                            Some(m) => x.set_const_slot(i, ResolvedConst::Type(m)),
                            None => diagnostics::report(YamaError::internal(format!("no staged member `{member_fullname}`"))),
                        }
                    }
                }
            }
        }
    }

    /// Late resolution (spec.md §4.3.2): drains the FIFO queue until
    /// empty or the session has already failed.
    fn process_late_resolve_queue(&mut self) {
        if diagnostics::failed() {
            return;
        }
        log::debug!("processing late-resolve queue");
        while let Some(t) = self.late_resolve_queue.pop_front() {
            if diagnostics::failed() {
                break;
            }
            self.late_resolve_consts(&t);
        }
    }

    fn late_resolve_consts(&mut self, t: &Arc<TypeObject>) {
        let indices: Vec<usize> = t
            .info
            .consts
            .iter()
            .filter(|(_, e)| !is_early_resolve_const(e))
            .map(|(i, _)| i)
            .collect();
        for i in indices {
            self.late_resolve_ref_const(t, i);
        }
    }

    fn late_resolve_ref_const(&mut self, t: &Arc<TypeObject>, index: usize) {
        let Some(ConstEntry::RefSym(sym)) = t.info.consts.get(index) else {
            return;
        };
        let env = InterpEnv {
            here_path: Some(t.parcel.path.clone()),
            here_parcel: Some(t.parcel.clone()),
            self_type: Some(self_scope(t)),
            type_params: self_scope(t)
                .info
                .type_params
                .as_ref()
                .map(|infos| {
                    infos
                        .iter()
                        .enumerate()
                        .filter_map(|(i, p)| self_scope(t).type_args.get(i).map(|a| (p.name.clone(), a.clone())))
                        .collect()
                })
                .unwrap_or_default(),
            redirects: Some(t.parcel.redirects.clone()),
        };
        let mut stack = TermStack::new();
        match stack.eval(sym, &env, self) {
            Ok(Term::Concrete(ty)) => t.set_const_slot(index, ResolvedConst::Type(ty)),
            Ok(other) => diagnostics::report(YamaError::ConcreteType(other.to_string())),
            Err(e) => diagnostics::report(e),
        }
    }

    fn flush_late_resolve_queue(&mut self) {
        self.late_resolve_queue.clear();
    }

    /// Constraint-type legality (spec.md §4.3.3): a type parameter's
    /// constraint must resolve to a protocol, and its original symbol
    /// must not be a bare reference to another type parameter.
    fn check_constraint_type_legality(&mut self) {
        if diagnostics::failed() {
            return;
        }
        log::debug!("checking constraint-type legality");
        for t in self.staging.iter().cloned().collect::<Vec<_>>() {
            let Some(infos) = &t.info.type_params else { continue };
            for (i, p) in infos.iter().enumerate() {
                let Some(constraint) = t.const_slot(p.constraint_const).as_type().cloned() else {
                    continue;
                };
                if constraint.kind() != TypeKind::Protocol {
                    diagnostics::report(YamaError::NonProtocolType(format!(
                        "{} type parameter #{} ({}) constraint {} is not a protocol",
                        t.fullname(),
                        i + 1,
                        p.name,
                        constraint.fullname()
                    )));
                }
                if let Some(ConstEntry::RefSym(sym)) = t.info.consts.get(p.constraint_const) {
                    if bare_type_param_ref_pattern().is_match(sym) {
                        diagnostics::report(YamaError::IllegalConstraint(
                            sym.clone(),
                            format!("{} type parameter #{} ({}) cannot use a type parameter as its own constraint", t.fullname(), i + 1, p.name),
                        ));
                    }
                }
            }
        }
    }

    /// Constraint enforcement (spec.md §4.3.3): every type argument must
    /// conform to its parameter's constraint.
    fn enforce_constraints(&mut self) {
        if diagnostics::failed() {
            return;
        }
        log::debug!("enforcing constraints");
        for t in self.staging.iter().cloned().collect::<Vec<_>>() {
            let Some(infos) = &t.info.type_params else { continue };
            for (i, p) in infos.iter().enumerate() {
                let (Some(arg), Some(constraint)) = (t.type_args.get(i), t.const_slot(p.constraint_const).as_type()) else {
                    continue;
                };
                if !conforms(arg, constraint) {
                    diagnostics::report(YamaError::TypeArgsError(
                        t.fullname(),
                        format!("type argument #{} ({}={}) does not conform to constraint {}", i + 1, p.name, arg.fullname(), constraint.fullname()),
                    ));
                }
            }
        }
    }

    /// Ref-constant call-suffix conformance (spec.md §4.3.3): for any
    /// ref-constant whose symbol carried a call suffix, the resolved
    /// type's own call signature must match it textually.
    fn check_ref_const_call_sig_conformance(&mut self) {
        if diagnostics::failed() {
            return;
        }
        log::debug!("checking ref-constant call-suffix conformance");
        for t in self.staging.iter().cloned().collect::<Vec<_>>() {
            for (i, entry) in t.info.consts.iter() {
                let ConstEntry::RefSym(sym) = entry else { continue };
                let env = TypeScopeEnv::new(&t);
                let solved = match Solver::new(&env).solve(sym, None) {
                    Ok(s) => s,
                    Err(_) => continue,
                };
                let Some(expected) = solved.call_suffix() else { continue };
                let Some(resolved) = t.const_slot(i).as_type().cloned() else { continue };
                let Some(actual) = render_call_sig(&resolved) else {
                    diagnostics::report(YamaError::TypeNotFound(format!("{} does not conform to call suffix {}", resolved.fullname(), expected)));
                    continue;
                };
                if actual != expected {
                    diagnostics::report(YamaError::TypeNotFound(format!("{} does not conform to call suffix {}", resolved.fullname(), expected)));
                }
            }
        }
    }
}

impl<'a> LoaderHost for LoadSession<'a> {
    fn resolve_parcel(&mut self, path: &str) -> Result<Arc<Parcel>> {
        self.bindings.get(path).cloned().ok_or_else(|| YamaError::ParcelNotFound(path.to_string()))
    }

    fn type_in_parcel(&mut self, parcel: &Arc<Parcel>, local_name: &str) -> Result<Term> {
        let info = parcel
            .module
            .by_name(local_name)
            .cloned()
            .ok_or_else(|| YamaError::TypeNotFound(format!("{}:{local_name}", parcel.path)))?;
        if info.is_parameterized() {
            Ok(Term::Generic {
                path: format!("{}:{local_name}", parcel.path),
                info,
            })
        } else {
            Ok(Term::Concrete(self.gen_non_member_type_data(parcel, info, vec![])))
        }
    }

    fn instantiate(&mut self, owner: &Term, args: Vec<Arc<TypeObject>>) -> Result<Arc<TypeObject>> {
        let Term::Generic { path, info } = owner else {
            return Err(YamaError::internal("instantiate called on a non-generic term"));
        };
        let parcel_path = path.rsplit_once(':').map(|(p, _)| p).unwrap_or(path);
        let parcel = self.resolve_parcel(parcel_path)?;
        Ok(self.gen_non_member_type_data(&parcel, info.clone(), args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::builder::ParcelDefBuilder;
    use crate::model::{ModuleInfo, ParcelMeta};
    use crate::redirects::Redirects;

    /// A parcel that declares itself (`"p"`) as one of its own dep-names, so
    /// that late-resolved ref-constants can spell same-parcel references as
    /// `p:Name` — the same literal text their resolved fullname renders as —
    /// rather than needing `self:Name`, whose canonical form the solver
    /// never rewrites to the owning parcel's path.
    fn bindings_for(module: ModuleInfo) -> HashMap<String, Arc<Parcel>> {
        let parcel = Arc::new(Parcel::new(
            "p",
            ParcelMeta::new(vec!["p".to_string()]),
            Arc::new(module),
            Redirects::new().compute("p"),
        ));
        let mut bindings = HashMap::new();
        bindings.insert("p".to_string(), parcel);
        bindings
    }

    #[test]
    fn early_resolve_pattern_classifies_self_refs() {
        assert!(early_resolve_pattern().is_match("$Self"));
        assert!(early_resolve_pattern().is_match("$Self::m"));
        assert!(!early_resolve_pattern().is_match("$Self::a::b"));
        assert!(!early_resolve_pattern().is_match("p:Int"));
        assert!(!early_resolve_pattern().is_match("T"));
    }

    #[test]
    fn bare_type_param_ref_pattern_classifies_plain_identifiers() {
        assert!(bare_type_param_ref_pattern().is_match("$T"));
        assert!(bare_type_param_ref_pattern().is_match("T"));
        assert!(!bare_type_param_ref_pattern().is_match("$Self"));
        assert!(!bare_type_param_ref_pattern().is_match("p:Int"));
        assert!(!bare_type_param_ref_pattern().is_match("p:Box[p:Int]"));
    }

    #[test]
    fn is_early_resolve_const_classifies_entries() {
        assert!(is_early_resolve_const(&ConstEntry::Int(1)));
        assert!(is_early_resolve_const(&ConstEntry::RefSym("$Self".to_string())));
        assert!(!is_early_resolve_const(&ConstEntry::RefSym("p:Int".to_string())));
    }

    #[test]
    fn import_resolves_bound_parcel_by_path() {
        let bindings = bindings_for(ModuleInfo::new());
        let mgr = LoadManager::new();
        let got = mgr.import(&bindings, "p").unwrap();
        assert_eq!(got.path, "p");
    }

    #[test]
    fn import_of_unbound_path_fails() {
        let bindings = bindings_for(ModuleInfo::new());
        let mgr = LoadManager::new();
        assert!(mgr.import(&bindings, "q").is_none());
    }

    #[test]
    fn load_minimal_struct_is_idempotent() {
        let mut b = ParcelDefBuilder::new();
        b.add_struct("S").unwrap();
        let bindings = bindings_for(b.finish().unwrap());
        let mgr = LoadManager::new();

        let (first, staging) = mgr.load(&bindings, "p:S").unwrap();
        assert_eq!(first.fullname(), "p:S");
        assert_eq!(first.kind(), TypeKind::Struct);
        assert!(first.members().is_empty());
        assert!(staging.exists("p:S"));

        let (second, _) = mgr.load(&bindings, "p:S").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn load_resolves_member_cycle() {
        let mut b = ParcelDefBuilder::new();
        let s = b.add_struct("S").unwrap();
        b.add_method(s, "m", "$Self").unwrap();
        let bindings = bindings_for(b.finish().unwrap());

        let (t, _) = LoadManager::new().load(&bindings, "p:S").unwrap();
        let m = t.member("m").expect("S has member m");
        let ret_idx = m.info.call_sig.as_ref().unwrap().ret;
        let ret = m.const_slot(ret_idx).as_type().cloned().expect("m's return resolved");
        assert_eq!(ret.fullname(), "p:S");
        assert_eq!(m.owner().unwrap(), t);
    }

    #[test]
    fn load_generic_instantiation_with_satisfied_constraint() {
        let mut b = ParcelDefBuilder::new();
        b.add_protocol("Any").unwrap();
        let bx = b.add_struct("Box").unwrap();
        b.add_type_param(bx, "T", "p:Any").unwrap();
        b.add_struct("Int").unwrap();
        let bindings = bindings_for(b.finish().unwrap());

        let (t, _) = LoadManager::new().load(&bindings, "p:Box[p:Int]").unwrap();
        assert_eq!(t.fullname(), "p:Box[p:Int]");
        assert_eq!(t.type_param_arg("T").unwrap().fullname(), "p:Int");
    }

    #[test]
    fn load_rejects_non_protocol_constraint() {
        let mut b = ParcelDefBuilder::new();
        b.add_struct("Int").unwrap();
        let bx = b.add_struct("Box").unwrap();
        b.add_type_param(bx, "T", "p:Int").unwrap();
        let bindings = bindings_for(b.finish().unwrap());

        assert!(LoadManager::new().load(&bindings, "p:Box[p:Int]").is_none());
    }

    #[test]
    fn load_rejects_type_argument_not_conforming_to_protocol() {
        let mut b = ParcelDefBuilder::new();
        b.add_struct("Int").unwrap();
        let countable = b.add_protocol("Countable").unwrap();
        b.add_method_req(countable, "count", "p:Int").unwrap();
        b.add_struct("Plain").unwrap();
        let bag = b.add_struct("Bag").unwrap();
        b.add_type_param(bag, "T", "p:Countable").unwrap();
        let bindings = bindings_for(b.finish().unwrap());

        assert!(LoadManager::new().load(&bindings, "p:Bag[p:Plain]").is_none());
    }

    #[test]
    fn load_accepts_matching_ref_const_call_sig() {
        let mut b = ParcelDefBuilder::new();
        b.add_struct("Int").unwrap();
        let f = b.add_fn("F", "p:Int").unwrap();
        b.add_param(f, "x", "p:Int").unwrap();
        let s = b.add_struct("S").unwrap();
        b.add_ref(s, "p:F(p:Int) -> p:Int").unwrap();
        let bindings = bindings_for(b.finish().unwrap());

        assert!(LoadManager::new().load(&bindings, "p:S").is_some());
    }

    #[test]
    fn load_rejects_ref_const_call_sig_mismatch() {
        let mut b = ParcelDefBuilder::new();
        b.add_struct("Int").unwrap();
        let f = b.add_fn("F", "p:Int").unwrap();
        b.add_param(f, "x", "p:Int").unwrap();
        let s = b.add_struct("S").unwrap();
        b.add_ref(s, "p:F(p:Bool) -> p:Int").unwrap();
        let bindings = bindings_for(b.finish().unwrap());

        assert!(LoadManager::new().load(&bindings, "p:S").is_none());
    }
}
