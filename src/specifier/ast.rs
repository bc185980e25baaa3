//! Syntax tree produced by [`super::parser`], consumed by [`super::solver`].
//!
//! This is purely syntactic: it carries no notion of whether a segment is
//! legal at its position (e.g. `::` following a path) — that is the
//! solver's job.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Root {
    /// `%here`
    Here,
    /// `$Self`
    SelfType,
    /// `$Ident` — a type-parameter reference.
    Param(String),
    /// A plain identifier: `self`, a dep-name, or a parcel self-name.
    Ident(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `/ident`
    Subdir(String),
    /// `:ident`
    EnterParcel(String),
    /// `::ident`
    Member(String),
    /// `[arg, arg, ...]`
    Args(Vec<ParsedSpecifier>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSuffix {
    pub params: Vec<ParsedSpecifier>,
    pub ret: Box<ParsedSpecifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSpecifier {
    pub root: Root,
    pub segments: Vec<Segment>,
    pub call_suffix: Option<CallSuffix>,
}
