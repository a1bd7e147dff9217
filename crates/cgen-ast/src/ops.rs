//! Operators.

use serde::{Deserialize, Serialize};

/// Unary operations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    Complement,
}

/// Binary operations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    And,
    /// `&^`, bit clear.
    AndNot,
    Or,
    Xor,
    Ne,
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    LogicalAnd,
    LogicalOr,
}

impl BinaryOp {
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Ne | Self::Lt | Self::Le | Self::Eq | Self::Ge | Self::Gt
        )
    }

    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::LogicalAnd | Self::LogicalOr)
    }

    /// Produces an integer of the operand type (not a boolean).
    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        !self.is_comparison() && !self.is_logical()
    }
}

/// Associative n-ary operations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssocOp {
    Add,
    Mul,
    And,
    Or,
    Xor,
    LogicalAnd,
    LogicalOr,
}

impl AssocOp {
    /// The equivalent binary operator.
    #[must_use]
    pub const fn binary(self) -> BinaryOp {
        match self {
            Self::Add => BinaryOp::Add,
            Self::Mul => BinaryOp::Mul,
            Self::And => BinaryOp::And,
            Self::Or => BinaryOp::Or,
            Self::Xor => BinaryOp::Xor,
            Self::LogicalAnd => BinaryOp::LogicalAnd,
            Self::LogicalOr => BinaryOp::LogicalOr,
        }
    }
}

/// Assignment operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    Eq,
    AddEq,
    SubEq,
    MulEq,
    DivEq,
    ModEq,
    ShlEq,
    ShrEq,
    AndEq,
    AndNotEq,
    OrEq,
    XorEq,
}
