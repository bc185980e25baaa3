//! Normalization (spec.md §4.1): walks a [`ParsedSpecifier`], checks the
//! path/type transition rules, applies `%here` / `$Self` / `$Param`
//! substitution and redirect rewriting, and renders the canonical string.

use super::ast::{ParsedSpecifier, Root, Segment};
use super::{Specifier, SpecifierKind};
use crate::errors::{Result, YamaError};
use crate::redirects::RedirectSet;

/// The substitution environment a [`Solver`] consults. Each piece is
/// independently optional: when an inquiry returns `None`, the solver
/// preserves the raw reserved lexeme in the normalized output instead of
/// failing (spec.md §4.1: "when absent, substitution is skipped and the
/// raw identifier is preserved"). Hard failure on a genuinely-required
/// substitution is the term-stack interpreter's concern (spec.md §4.2's
/// `here()`/`self()` "fails if no env"), not the solver's.
pub trait SolverEnv {
    fn here(&self) -> Option<String> {
        None
    }
    fn self_type(&self) -> Option<String> {
        None
    }
    /// Resolves `$id` against the type-argument map of the solving
    /// session's `$Self` type.
    fn type_param(&self, _id: &str) -> Option<String> {
        None
    }
    fn redirects(&self) -> Option<&RedirectSet> {
        None
    }
}

/// The trivial environment: every substitution is skipped. Used by the
/// parcel-definition builder (spec.md §4.4), which solves symbols for pure
/// syntactic validation with no live type graph to consult.
pub struct NoEnv;
impl SolverEnv for NoEnv {}

pub struct Solver<'a> {
    env: &'a dyn SolverEnv,
}

impl<'a> Solver<'a> {
    pub fn new(env: &'a dyn SolverEnv) -> Self {
        Self { env }
    }

    pub fn with_no_env() -> Solver<'static> {
        Solver { env: &NoEnv }
    }

    /// Parses and normalizes `text`. `must_be` optionally constrains the
    /// resulting kind.
    pub fn solve(&self, text: &str, must_be: Option<SpecifierKind>) -> Result<Specifier> {
        let parsed = super::parser::parse(text)
            .map_err(|e| YamaError::IllegalSpecifier(text.to_string(), e))?;
        let (normalized, kind) = self.solve_tree(&parsed, text)?;
        if let Some(required) = must_be {
            if required != kind {
                return Err(YamaError::IllegalSpecifier(
                    text.to_string(),
                    format!("expected {required:?}, got {kind:?}"),
                ));
            }
        }
        Ok(Specifier { normalized, kind })
    }

    fn solve_tree(&self, parsed: &ParsedSpecifier, original: &str) -> Result<(String, SpecifierKind)> {
        let (mut rendered, mut kind) = self.solve_root(&parsed.root, original)?;

        for seg in &parsed.segments {
            match seg {
                Segment::Subdir(id) => {
                    if kind != SpecifierKind::Path {
                        return Err(YamaError::IllegalSpecifier(
                            original.to_string(),
                            "'/' may only follow a path".to_string(),
                        ));
                    }
                    rendered.push('/');
                    rendered.push_str(id);
                }
                Segment::EnterParcel(id) => {
                    if kind != SpecifierKind::Path {
                        return Err(YamaError::IllegalSpecifier(
                            original.to_string(),
                            "':' may only follow a path".to_string(),
                        ));
                    }
                    if let Some(rs) = self.env.redirects() {
                        rendered = rs.resolve(&rendered);
                    }
                    rendered.push(':');
                    rendered.push_str(id);
                    kind = SpecifierKind::Type;
                }
                Segment::Member(id) => {
                    if kind != SpecifierKind::Type {
                        return Err(YamaError::IllegalSpecifier(
                            original.to_string(),
                            "'::' may only follow a type".to_string(),
                        ));
                    }
                    rendered.push_str("::");
                    rendered.push_str(id);
                }
                Segment::Args(args) => {
                    if kind != SpecifierKind::Type {
                        return Err(YamaError::IllegalSpecifier(
                            original.to_string(),
                            "'[' may only follow a type".to_string(),
                        ));
                    }
                    rendered.push('[');
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            rendered.push(',');
                        }
                        let (arg_rendered, arg_kind) = self.solve_tree(arg, original)?;
                        if arg_kind != SpecifierKind::Type {
                            return Err(YamaError::TypeArgsError(
                                original.to_string(),
                                "generic arguments must be types".to_string(),
                            ));
                        }
                        rendered.push_str(&arg_rendered);
                    }
                    rendered.push(']');
                }
            }
        }

        if let Some(suffix) = &parsed.call_suffix {
            rendered.push('(');
            for (i, p) in suffix.params.iter().enumerate() {
                if i > 0 {
                    rendered.push_str(", ");
                }
                let (r, k) = self.solve_tree(p, original)?;
                if k != SpecifierKind::Type {
                    return Err(YamaError::IllegalSpecifier(
                        original.to_string(),
                        "call-suffix parameters must be types".to_string(),
                    ));
                }
                rendered.push_str(&r);
            }
            rendered.push_str(") -> ");
            let (r, k) = self.solve_tree(&suffix.ret, original)?;
            if k != SpecifierKind::Type {
                return Err(YamaError::IllegalSpecifier(
                    original.to_string(),
                    "call-suffix return must be a type".to_string(),
                ));
            }
            rendered.push_str(&r);
        }

        Ok((rendered, kind))
    }

    fn solve_root(&self, root: &Root, original: &str) -> Result<(String, SpecifierKind)> {
        Ok(match root {
            Root::Here => (
                self.env.here().unwrap_or_else(|| "%here".to_string()),
                SpecifierKind::Path,
            ),
            Root::SelfType => (
                self.env.self_type().unwrap_or_else(|| "$Self".to_string()),
                SpecifierKind::Type,
            ),
            Root::Param(id) => (
                self.env
                    .type_param(id)
                    .unwrap_or_else(|| format!("${id}")),
                SpecifierKind::Type,
            ),
            Root::Ident(id) => {
                if super::parser::is_reserved_root(id) && id != "yama" {
                    return Err(YamaError::IllegalSpecifier(
                        original.to_string(),
                        format!("`{id}` is a reserved root"),
                    ));
                }
                (id.clone(), SpecifierKind::Path)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirects::Redirects;

    struct FixedEnv {
        here: Option<String>,
        self_ty: Option<String>,
        redirects: RedirectSet,
    }
    impl SolverEnv for FixedEnv {
        fn here(&self) -> Option<String> {
            self.here.clone()
        }
        fn self_type(&self) -> Option<String> {
            self.self_ty.clone()
        }
        fn redirects(&self) -> Option<&RedirectSet> {
            Some(&self.redirects)
        }
    }

    #[test]
    fn normalizes_plain_path() {
        let s = Solver::with_no_env().solve("self/sub", None).unwrap();
        assert_eq!(s.normalized, "self/sub");
        assert_eq!(s.kind, SpecifierKind::Path);
    }

    #[test]
    fn normalizes_type_with_generic_args() {
        let s = Solver::with_no_env()
            .solve("p:Box[p:Int]::get", None)
            .unwrap();
        assert_eq!(s.normalized, "p:Box[p:Int]::get");
        assert_eq!(s.kind, SpecifierKind::Type);
    }

    #[test]
    fn rejects_member_after_path() {
        let e = Solver::with_no_env().solve("p::m", None).unwrap_err();
        assert!(matches!(e, YamaError::IllegalSpecifier(_, _)));
    }

    #[test]
    fn collapses_call_suffix_whitespace() {
        let s = Solver::with_no_env()
            .solve("p:F(  p:Int,p:Int  )->p:Int", None)
            .unwrap();
        assert_eq!(s.normalized, "p:F(p:Int, p:Int) -> p:Int");
    }

    #[test]
    fn substitutes_here_and_self_when_env_present() {
        let env = FixedEnv {
            here: Some("a/b".to_string()),
            self_ty: Some("a:S".to_string()),
            redirects: Redirects::new().compute("a/b"),
        };
        let s = Solver::new(&env).solve("%here/c", None).unwrap();
        assert_eq!(s.normalized, "a/b/c");
        let t = Solver::new(&env).solve("$Self::m", None).unwrap();
        assert_eq!(t.normalized, "a:S::m");
    }

    #[test]
    fn preserves_literal_when_env_absent() {
        let s = Solver::with_no_env().solve("%here/c", None).unwrap();
        assert_eq!(s.normalized, "%here/c");
    }

    #[test]
    fn idempotent_normalization() {
        let once = Solver::with_no_env().solve("p:Box[p:Int]", None).unwrap();
        let twice = Solver::with_no_env()
            .solve(&once.normalized, None)
            .unwrap();
        assert_eq!(once.normalized, twice.normalized);
    }
}
