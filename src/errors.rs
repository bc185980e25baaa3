//! Error taxonomy for the loading/resolution core.
//!
//! Mirrors the kinds enumerated in the specification rather than modelling
//! failure per-component: every fallible operation across the specifier
//! parser, term-stack interpreter, load manager and area ultimately reports
//! one of these kinds.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum YamaError {
    #[error("illegal specifier `{0}`: {1}")]
    IllegalSpecifier(String, String),

    #[error("illegal constraint on type parameter `{0}`: {1}")]
    IllegalConstraint(String, String),

    #[error("cannot bind parcel at path `{0}`: {1}")]
    PathBindError(String, String),

    #[error("type argument error for `{0}`: {1}")]
    TypeArgsError(String, String),

    #[error("parcel not found: `{0}`")]
    ParcelNotFound(String),

    #[error("type not found: `{0}`")]
    TypeNotFound(String),

    #[error("parameter not found: `{0}` has no parameter #{1}")]
    ParamNotFound(String, usize),

    #[error("name conflict: `{0}` already declared on `{1}`")]
    NameConflict(String, String),

    #[error("limit reached: {0}")]
    LimitReached(String),

    #[error("expected a concrete type, found `{0}`")]
    ConcreteType(String),

    #[error("expected a generic type, found `{0}`")]
    GenericType(String),

    #[error("operation not valid on member type `{0}`")]
    MemberType(String),

    #[error("type `{0}` is not callable")]
    NonCallableType(String),

    #[error("type `{0}` cannot have members")]
    TypeCannotHaveMembers(String),

    #[error("type `{0}` is not a protocol")]
    ProtocolType(String),

    #[error("type `{0}` is a protocol, which is not valid here")]
    NonProtocolType(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, YamaError>;

impl YamaError {
    pub fn internal(msg: impl Into<String>) -> Self {
        YamaError::InternalError(msg.into())
    }
}
