//! Term: the tagged union the term-stack interpreter operates on (spec.md
//! §4.2).

use std::sync::Arc;

use crate::model::{TypeInfo, TypeKind};
use crate::runtime::TypeObject;

#[derive(Debug, Clone)]
pub enum Term {
    /// Replaces the inputs of a failed operation, rather than corrupting
    /// the stack (spec.md §4.2).
    Error,
    Path(String),
    Concrete(Arc<TypeObject>),
    Generic { path: String, info: Arc<TypeInfo> },
}

impl Term {
    pub fn is_err(&self) -> bool {
        matches!(self, Term::Error)
    }

    pub fn is_path(&self) -> bool {
        matches!(self, Term::Path(_))
    }

    pub fn is_type(&self) -> bool {
        self.is_concrete() || self.is_generic()
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Term::Concrete(_))
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Term::Generic { .. })
    }

    pub fn kind(&self) -> Option<TypeKind> {
        match self {
            Term::Concrete(t) => Some(t.info.kind),
            Term::Generic { info, .. } => Some(info.kind),
            _ => None,
        }
    }

    pub fn has_members(&self) -> bool {
        self.kind().is_some_and(|k| matches!(k, TypeKind::Struct | TypeKind::Protocol))
    }

    pub fn has_member(&self, name: &str) -> bool {
        match self {
            Term::Concrete(t) => t.member(name).is_some(),
            _ => false,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Term::Path(p) => Some(p),
            Term::Generic { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn concrete(&self) -> Option<&Arc<TypeObject>> {
        match self {
            Term::Concrete(t) => Some(t),
            _ => None,
        }
    }

    pub fn generic_info(&self) -> Option<&Arc<TypeInfo>> {
        match self {
            Term::Generic { info, .. } => Some(info),
            _ => None,
        }
    }

    pub fn type_param_count(&self) -> usize {
        match self {
            Term::Concrete(t) => t.info.type_param_count(),
            Term::Generic { info, .. } => info.type_param_count(),
            _ => 0,
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Error => write!(f, "<error>"),
            Term::Path(p) => write!(f, "{p}"),
            Term::Concrete(t) => write!(f, "{}", t.fullname()),
            Term::Generic { path, info } => write!(f, "{path}:{}", info.local_name),
        }
    }
}

/// A stack slot: a [`Term`] plus whether [`super::interpreter::TermStack::begin_args`]
/// has marked it as awaiting its generic argument list.
#[derive(Debug, Clone)]
pub struct StackEntry {
    pub term: Term,
    pub awaiting_args: bool,
}

impl From<Term> for StackEntry {
    fn from(term: Term) -> Self {
        StackEntry {
            term,
            awaiting_args: false,
        }
    }
}
