//! Expression tree.
//!
//! Every node carries its resolved type and, when the type checker could fold
//! it, its constant value. The backend never mutates nodes.

use serde::{Deserialize, Serialize};

use crate::method::Method;
use crate::ops::{AssocOp, BinaryOp, UnaryOp};
use crate::types::TypeExpr;

/// Named call argument.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Arg {
    pub name: String,
    pub value: Expr,
}

impl Arg {
    #[must_use]
    pub fn new(name: &str, value: Expr) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// Expression shape.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    Ident(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Explicit conversion to `mtype`.
    As {
        operand: Box<Expr>,
    },
    Associative {
        op: AssocOp,
        operands: Vec<Expr>,
    },
    Call {
        recv: Box<Expr>,
        method: Method,
        args: Vec<Arg>,
        /// Set when an enclosing availability check proves that a reader or
        /// writer access cannot block.
        #[serde(default)]
        in_bounds: bool,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        base: Box<Expr>,
        lo: Option<Box<Expr>>,
        hi: Option<Box<Expr>>,
    },
    Selector {
        base: Box<Expr>,
        field: String,
    },
}

/// Typed expression node.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub mtype: TypeExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<i128>,
}

impl Expr {
    #[must_use]
    pub const fn new(kind: ExprKind, mtype: TypeExpr) -> Self {
        Self {
            kind,
            mtype,
            const_value: None,
        }
    }

    /// Identifier of the given type.
    #[must_use]
    pub fn ident(name: &str, mtype: TypeExpr) -> Self {
        Self::new(ExprKind::Ident(name.to_string()), mtype)
    }

    /// The receiver, `this`, a pointer to struct `name`.
    #[must_use]
    pub fn this(name: &str) -> Self {
        Self::ident("this", TypeExpr::ptr(TypeExpr::strukt(name)))
    }

    /// `args.name`.
    #[must_use]
    pub fn arg(name: &str, mtype: TypeExpr) -> Self {
        Self::field(Self::ident("args", TypeExpr::empty()), name, mtype)
    }

    /// Integer literal.
    #[must_use]
    pub fn lit(value: i128, mtype: TypeExpr) -> Self {
        Self::ident(&value.to_string(), mtype).with_const(value)
    }

    #[must_use]
    pub fn bool_lit(value: bool) -> Self {
        let name = if value { "true" } else { "false" };
        Self::ident(name, TypeExpr::bool()).with_const(i128::from(value))
    }

    /// Attach a folded constant.
    #[must_use]
    pub fn with_const(mut self, value: i128) -> Self {
        self.const_value = Some(value);
        self
    }

    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        let mtype = if op == UnaryOp::Not {
            TypeExpr::bool()
        } else {
            operand.mtype.clone()
        };
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            mtype,
        )
    }

    /// Binary operation; comparisons and logical operators produce a bool,
    /// everything else the type of `lhs`.
    #[must_use]
    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        let mtype = if op.is_arithmetic() {
            lhs.mtype.clone()
        } else {
            TypeExpr::bool()
        };
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            mtype,
        )
    }

    #[must_use]
    pub fn add(lhs: Self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Add, lhs, rhs)
    }

    #[must_use]
    pub fn cast(operand: Self, target: TypeExpr) -> Self {
        Self::new(
            ExprKind::As {
                operand: Box::new(operand),
            },
            target,
        )
    }

    /// N-ary operation. The type is taken from the first operand.
    #[must_use]
    pub fn assoc(op: AssocOp, operands: Vec<Self>) -> Self {
        let mtype = match op {
            AssocOp::LogicalAnd | AssocOp::LogicalOr => TypeExpr::bool(),
            _ => operands
                .first()
                .map_or_else(TypeExpr::empty, |e| e.mtype.clone()),
        };
        Self::new(ExprKind::Associative { op, operands }, mtype)
    }

    /// Method call producing a value of type `mtype`.
    #[must_use]
    pub fn call(recv: Self, method: impl Into<Method>, args: Vec<Arg>, mtype: TypeExpr) -> Self {
        Self::new(
            ExprKind::Call {
                recv: Box::new(recv),
                method: method.into(),
                args,
                in_bounds: false,
            },
            mtype,
        )
    }

    /// Mark a call as proven not to block.
    #[must_use]
    pub fn in_bounds(mut self) -> Self {
        if let ExprKind::Call { in_bounds, .. } = &mut self.kind {
            *in_bounds = true;
        }
        self
    }

    /// `base[index]`; the element type comes from `base`.
    #[must_use]
    pub fn index(base: Self, index: Self) -> Self {
        let mtype = base.mtype.element().cloned().unwrap_or_else(TypeExpr::u8);
        Self::new(
            ExprKind::Index {
                base: Box::new(base),
                index: Box::new(index),
            },
            mtype,
        )
    }

    /// `base[lo:hi]`; slicing an array or slice yields a slice.
    #[must_use]
    pub fn slice(base: Self, lo: Option<Self>, hi: Option<Self>) -> Self {
        let elem = base.mtype.element().cloned().unwrap_or_else(TypeExpr::u8);
        Self::new(
            ExprKind::Slice {
                base: Box::new(base),
                lo: lo.map(Box::new),
                hi: hi.map(Box::new),
            },
            TypeExpr::slice(elem),
        )
    }

    /// `base.name`.
    #[must_use]
    pub fn field(base: Self, name: &str, mtype: TypeExpr) -> Self {
        Self::new(
            ExprKind::Selector {
                base: Box::new(base),
                field: name.to_string(),
            },
            mtype,
        )
    }

    /// Name of an identifier node.
    #[must_use]
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// For `args.name`, the parameter name.
    #[must_use]
    pub fn as_arg(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Selector { base, field } if base.as_ident() == Some("args") => Some(field),
            _ => None,
        }
    }

    /// Direct children, left to right.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match &self.kind {
            ExprKind::Ident(_) => Vec::new(),
            ExprKind::Unary { operand, .. } | ExprKind::As { operand } => vec![operand.as_ref()],
            ExprKind::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            ExprKind::Associative { operands, .. } => operands.iter().collect(),
            ExprKind::Call { recv, args, .. } => {
                let mut out = vec![recv.as_ref()];
                out.extend(args.iter().map(|a| &a.value));
                out
            }
            ExprKind::Index { base, index } => vec![base.as_ref(), index.as_ref()],
            ExprKind::Slice { base, lo, hi } => {
                let mut out = vec![base.as_ref()];
                out.extend(lo.as_deref());
                out.extend(hi.as_deref());
                out
            }
            ExprKind::Selector { base, .. } => vec![base.as_ref()],
        }
    }
}
