//! Specifier parser & solver (spec.md §4.1).
//!
//! A specifier is a normalized textual reference: either a *path* or a
//! *type fullname*, with an optional trailing call suffix. Construction
//! always goes through [`Solver`], which both validates and normalizes —
//! there is no way to build a [`Specifier`] from an un-normalized string.

pub mod ast;
pub mod parser;
pub mod solver;

pub use solver::{Solver, SolverEnv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecifierKind {
    Path,
    Type,
}

/// A normalized specifier. String equality implies specifier equality
/// (spec.md §3): `normalized` is always in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specifier {
    normalized: String,
    kind: SpecifierKind,
}

impl Specifier {
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn kind(&self) -> SpecifierKind {
        self.kind
    }

    pub fn is_path(&self) -> bool {
        self.kind == SpecifierKind::Path
    }

    pub fn is_type(&self) -> bool {
        self.kind == SpecifierKind::Type
    }

    /// A pure syntactic check on the normalized form: does this specifier
    /// carry a trailing `(T, …) -> R` call suffix?
    pub fn has_call_suffix(&self) -> bool {
        // The normalized render always places the call suffix's opening
        // paren immediately after the base specifier, and a type fullname
        // never otherwise contains a bare, unbracketed '('.
        self.normalized.contains(") -> ")
    }

    /// The specifier with any call suffix stripped.
    pub fn base(&self) -> &str {
        match self.normalized.find('(') {
            Some(idx) if self.has_call_suffix() => self.normalized[..idx].trim_end(),
            _ => &self.normalized,
        }
    }

    pub fn call_suffix(&self) -> Option<&str> {
        if !self.has_call_suffix() {
            return None;
        }
        self.normalized.find('(').map(|idx| self.normalized[idx..].trim())
    }
}

impl std::fmt::Display for Specifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

/// Convenience: solve `text` with no environment, requiring it to be a
/// path. Used by the parcel-definition builder and tests.
pub fn solve_path(text: &str) -> crate::errors::Result<Specifier> {
    Solver::with_no_env().solve(text, Some(SpecifierKind::Path))
}

/// Convenience: solve `text` with no environment, requiring it to be a
/// type fullname.
pub fn solve_type(text: &str) -> crate::errors::Result<Specifier> {
    Solver::with_no_env().solve(text, Some(SpecifierKind::Type))
}
