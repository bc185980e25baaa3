//! The term-stack interpreter (spec.md §4.2): evaluates a parsed specifier
//! against the live type graph, substituting `%here`/`$Self`/`$Param`
//! through an [`InterpEnv`] and importing/instantiating through a
//! [`LoaderHost`].
//!
//! This is the semantic counterpart to [`crate::specifier::Solver`]'s
//! string-level normalization: the solver tells you what a specifier
//! *means* as text, the interpreter drives the actual import and produces
//! a live [`Term`].

use std::collections::HashMap;
use std::sync::Arc;

use super::term::{StackEntry, Term};
use crate::errors::{Result, YamaError};
use crate::model::Parcel;
use crate::redirects::RedirectSet;
use crate::runtime::TypeObject;
use crate::specifier::ast::{ParsedSpecifier, Root, Segment};
use crate::specifier::parser;

/// The live substitution environment for one interpreter session: the
/// compiling module's `%here` path and parcel, its `$Self` type (if any),
/// its type-parameter bindings, and its redirect set.
#[derive(Debug, Clone, Default)]
pub struct InterpEnv {
    pub here_path: Option<String>,
    pub here_parcel: Option<Arc<Parcel>>,
    pub self_type: Option<Arc<TypeObject>>,
    pub type_params: HashMap<String, Arc<TypeObject>>,
    pub redirects: Option<RedirectSet>,
}

impl InterpEnv {
    /// The environment for resolving a path with no compiling-module
    /// context: every reserved root fails, dep-name declaration is not
    /// checked. Used for top-level `import`/`load` calls given a bare
    /// domain path.
    pub fn none() -> Self {
        Self::default()
    }
}

/// The load manager's side of the interpreter/loader seam: resolving a
/// root path to its bound [`Parcel`], looking up a local name within it,
/// and completing a generic instantiation.
pub trait LoaderHost {
    /// Resolves (importing as needed) the parcel bound at `path`.
    fn resolve_parcel(&mut self, path: &str) -> Result<Arc<Parcel>>;

    /// Looks up `local_name` in `parcel`'s module. Returns
    /// [`Term::Concrete`] for a non-parameterized type, [`Term::Generic`]
    /// for one awaiting type arguments.
    fn type_in_parcel(&mut self, parcel: &Arc<Parcel>, local_name: &str) -> Result<Term>;

    /// Completes a generic instantiation (`owner` is always a
    /// [`Term::Generic`]) with a fully-evaluated argument list.
    fn instantiate(&mut self, owner: &Term, args: Vec<Arc<TypeObject>>) -> Result<Arc<TypeObject>>;
}

/// The interpreter's stack. One instance is driven per specifier
/// evaluation; [`Self::eval`] is the entry point used by the loader.
#[derive(Debug, Default)]
pub struct TermStack {
    stack: Vec<StackEntry>,
    frame_starts: Vec<usize>,
}

impl TermStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(&self) -> Option<&Term> {
        self.stack.last().map(|e| &e.term)
    }

    fn push(&mut self, term: Term) {
        self.stack.push(term.into());
    }

    fn pop(&mut self) -> Result<Term> {
        self.stack
            .pop()
            .map(|e| e.term)
            .ok_or_else(|| YamaError::internal("term stack underflow"))
    }

    /// Parses and evaluates `text` in full, returning the resulting
    /// [`Term`]. Leaves the stack empty on both success and failure.
    pub fn eval(&mut self, text: &str, env: &InterpEnv, host: &mut dyn LoaderHost) -> Result<Term> {
        let parsed = parser::parse(text).map_err(|e| YamaError::IllegalSpecifier(text.to_string(), e))?;
        self.eval_tree(&parsed, env, host)?;
        self.pop()
    }

    fn eval_tree(&mut self, parsed: &ParsedSpecifier, env: &InterpEnv, host: &mut dyn LoaderHost) -> Result<()> {
        self.eval_root(&parsed.root, env)?;
        for seg in &parsed.segments {
            match seg {
                Segment::Subdir(id) => self.subdir(id)?,
                Segment::EnterParcel(id) => self.enter_parcel(id, env, host)?,
                Segment::Member(id) => self.member(id)?,
                Segment::Args(args) => {
                    self.begin_args()?;
                    for arg in args {
                        self.eval_tree(arg, env, host)?;
                    }
                    self.end_args(host)?;
                }
            }
        }
        // A call suffix is never evaluated here: the loader strips it
        // before driving the interpreter and checks it separately against
        // a ref-constant's recorded call signature (spec.md §4.3).
        Ok(())
    }

    fn eval_root(&mut self, root: &Root, env: &InterpEnv) -> Result<()> {
        match root {
            Root::Here => match &env.here_path {
                Some(path) => {
                    self.push(Term::Path(path.clone()));
                    Ok(())
                }
                None => Err(YamaError::IllegalSpecifier(
                    "%here".to_string(),
                    "no compiling-module environment".to_string(),
                )),
            },
            Root::SelfType => self.self_type(env),
            Root::Param(id) => self.type_param(id, env),
            Root::Ident(id) => self.root_ident(id, env),
        }
    }

    fn root_ident(&mut self, id: &str, env: &InterpEnv) -> Result<()> {
        if parser::is_reserved_root(id) && id != "yama" {
            return Err(YamaError::IllegalSpecifier(
                id.to_string(),
                format!("`{id}` is a reserved root"),
            ));
        }
        let path = if id == "self" {
            match &env.here_parcel {
                Some(p) => p.path.clone(),
                None => {
                    return Err(YamaError::IllegalSpecifier(
                        "self".to_string(),
                        "no compiling-module environment".to_string(),
                    ))
                }
            }
        } else {
            if id != "yama" {
                if let Some(parcel) = &env.here_parcel {
                    if !parcel.meta.declares(id) {
                        return Err(YamaError::ParcelNotFound(format!(
                            "dep-name `{id}` not declared by `{}`",
                            parcel.path
                        )));
                    }
                }
            }
            id.to_string()
        };
        self.push(Term::Path(path));
        Ok(())
    }

    fn subdir(&mut self, id: &str) -> Result<()> {
        match self.pop()? {
            Term::Path(p) => {
                self.push(Term::Path(format!("{p}/{id}")));
                Ok(())
            }
            other => {
                self.push(Term::Error);
                Err(YamaError::IllegalSpecifier(other.to_string(), "'/' requires a path".to_string()))
            }
        }
    }

    fn enter_parcel(&mut self, id: &str, env: &InterpEnv, host: &mut dyn LoaderHost) -> Result<()> {
        let path = match self.pop()? {
            Term::Path(p) => p,
            other => {
                self.push(Term::Error);
                return Err(YamaError::IllegalSpecifier(other.to_string(), "':' requires a path".to_string()));
            }
        };
        let rewritten = env.redirects.as_ref().map(|rs| rs.resolve(&path)).unwrap_or(path);
        let parcel = match host.resolve_parcel(&rewritten) {
            Ok(p) => p,
            Err(e) => {
                self.push(Term::Error);
                return Err(e);
            }
        };
        match host.type_in_parcel(&parcel, id) {
            Ok(term) => {
                let awaiting = term.is_generic();
                self.stack.push(StackEntry { term, awaiting_args: awaiting });
                Ok(())
            }
            Err(e) => {
                self.push(Term::Error);
                Err(e)
            }
        }
    }

    fn member(&mut self, id: &str) -> Result<()> {
        let top = self.pop()?;
        match &top {
            Term::Concrete(t) => {
                if !t.info.can_have_members() {
                    self.push(Term::Error);
                    return Err(YamaError::TypeCannotHaveMembers(t.fullname()));
                }
                match t.member(id) {
                    Some(m) => {
                        self.push(Term::Concrete(m));
                        Ok(())
                    }
                    None => {
                        self.push(Term::Error);
                        Err(YamaError::TypeNotFound(format!("{}::{}", t.fullname(), id)))
                    }
                }
            }
            Term::Generic { .. } => {
                self.push(Term::Error);
                Err(YamaError::ConcreteType(top.to_string()))
            }
            _ => {
                self.push(Term::Error);
                Err(YamaError::internal("'::' requires a type on the stack"))
            }
        }
    }

    fn self_type(&mut self, env: &InterpEnv) -> Result<()> {
        match &env.self_type {
            Some(t) => {
                self.push(Term::Concrete(t.clone()));
                Ok(())
            }
            None => Err(YamaError::IllegalSpecifier(
                "$Self".to_string(),
                "no compiling-module environment".to_string(),
            )),
        }
    }

    fn type_param(&mut self, id: &str, env: &InterpEnv) -> Result<()> {
        match env.type_params.get(id) {
            Some(t) => {
                self.push(Term::Concrete(t.clone()));
                Ok(())
            }
            None => Err(YamaError::IllegalSpecifier(
                format!("${id}"),
                "no compiling-module environment, or no such type parameter".to_string(),
            )),
        }
    }

    fn begin_args(&mut self) -> Result<()> {
        let awaiting = self.stack.last().is_some_and(|e| e.awaiting_args);
        if !awaiting {
            let label = self.stack.last().map(|e| e.term.to_string()).unwrap_or_default();
            return Err(YamaError::TypeArgsError(
                label,
                "type does not accept generic arguments here".to_string(),
            ));
        }
        self.stack.last_mut().expect("checked above").awaiting_args = false;
        self.frame_starts.push(self.stack.len());
        Ok(())
    }

    fn end_args(&mut self, host: &mut dyn LoaderHost) -> Result<()> {
        let start = self
            .frame_starts
            .pop()
            .ok_or_else(|| YamaError::internal("']' with no matching '['"))?;
        let arg_entries = self.stack.split_off(start);
        let owner = self.pop()?;

        let mut args = Vec::with_capacity(arg_entries.len());
        for entry in &arg_entries {
            match &entry.term {
                Term::Concrete(t) => args.push(t.clone()),
                _ => {
                    self.push(Term::Error);
                    return Err(YamaError::TypeArgsError(
                        owner.to_string(),
                        "generic arguments must be concrete types".to_string(),
                    ));
                }
            }
        }

        let expected = owner.type_param_count();
        if args.len() != expected {
            self.push(Term::Error);
            return Err(YamaError::TypeArgsError(
                owner.to_string(),
                format!("expected {expected} type argument(s), found {}", args.len()),
            ));
        }

        match host.instantiate(&owner, args) {
            Ok(concrete) => {
                self.push(Term::Concrete(concrete));
                Ok(())
            }
            Err(e) => {
                self.push(Term::Error);
                Err(e)
            }
        }
    }
}
