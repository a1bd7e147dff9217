//! Generator errors.

use thiserror::Error;

/// Errors raised while lowering a package to C. Generation stops at the
/// first one; no partial output is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("expression nesting exceeds {max}")]
    ExprTooDeep { max: u32 },

    #[error("statement nesting exceeds {max}")]
    BodyTooDeep { max: u32 },

    #[error("too many jump targets (limit {max})")]
    TooManyJumpTargets { max: u32 },

    #[error("too many temporaries (limit {max})")]
    TooManyTemps { max: u32 },

    #[error("no such built-in method {method} on {capability}")]
    NoSuchBuiltin { capability: String, method: String },

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("unknown struct: {0}")]
    UnknownStruct(String),

    #[error("suspendible function {0} needs a suspendible receiver struct")]
    SuspendibleWithoutReceiver(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GenError>;
