//! Statements.

use serde::{Deserialize, Serialize};

use crate::expr::{Expr, ExprKind};
use crate::ops::AssignOp;
use crate::types::TypeExpr;

/// Loop identity, dense per function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoopId(pub u32);

impl LoopId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of a `break`/`continue` jump.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpKind {
    Break,
    Continue,
}

/// Statement.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// Checked upstream; emits nothing.
    Assert(Expr),
    Assign {
        op: AssignOp,
        lhs: Expr,
        rhs: Expr,
    },
    Var {
        name: String,
        typ: TypeExpr,
        #[serde(default)]
        value: Option<Expr>,
    },
    If {
        cond: Expr,
        then_body: Vec<Self>,
        #[serde(default)]
        else_body: Vec<Self>,
    },
    While {
        id: LoopId,
        cond: Expr,
        body: Vec<Self>,
        #[serde(default)]
        has_break: bool,
        #[serde(default)]
        has_continue: bool,
    },
    Jump {
        kind: JumpKind,
        target: LoopId,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    /// A call evaluated for its effect.
    Expr(Expr),
}

impl Stmt {
    #[must_use]
    pub const fn assign(op: AssignOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Assign { op, lhs, rhs }
    }

    #[must_use]
    pub fn var(name: &str, typ: TypeExpr, value: Option<Expr>) -> Self {
        Self::Var {
            name: name.to_string(),
            typ,
            value,
        }
    }

    #[must_use]
    pub const fn if_else(cond: Expr, then_body: Vec<Self>, else_body: Vec<Self>) -> Self {
        Self::If {
            cond,
            then_body,
            else_body,
        }
    }

    /// Loop with jump flags computed from the body.
    #[must_use]
    pub fn while_loop(id: LoopId, cond: Expr, body: Vec<Self>) -> Self {
        let has_break = targets(&body, id, JumpKind::Break);
        let has_continue = targets(&body, id, JumpKind::Continue);
        Self::While {
            id,
            cond,
            body,
            has_break,
            has_continue,
        }
    }

    #[must_use]
    pub const fn jump(kind: JumpKind, target: LoopId) -> Self {
        Self::Jump { kind, target }
    }

    #[must_use]
    pub const fn ret(value: Option<Expr>) -> Self {
        Self::Return { value }
    }

    #[must_use]
    pub const fn expr(e: Expr) -> Self {
        Self::Expr(e)
    }

    /// Expressions evaluated directly by this statement (not nested bodies).
    #[must_use]
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            Self::Assert(e) | Self::Expr(e) | Self::If { cond: e, .. } => vec![e],
            Self::While { cond, .. } => vec![cond],
            Self::Assign { lhs, rhs, .. } => vec![lhs, rhs],
            Self::Var { value, .. } | Self::Return { value } => value.iter().collect(),
            Self::Jump { .. } => Vec::new(),
        }
    }

    /// Nested statement lists.
    #[must_use]
    pub fn bodies(&self) -> Vec<&[Self]> {
        match self {
            Self::If {
                then_body,
                else_body,
                ..
            } => vec![then_body.as_slice(), else_body.as_slice()],
            Self::While { body, .. } => vec![body.as_slice()],
            _ => Vec::new(),
        }
    }

    /// Whether this statement is a call evaluated for its effect.
    #[must_use]
    pub const fn is_call(&self) -> bool {
        matches!(
            self,
            Self::Expr(Expr {
                kind: ExprKind::Call { .. },
                ..
            })
        )
    }
}

fn targets(body: &[Stmt], id: LoopId, kind: JumpKind) -> bool {
    body.iter().any(|s| match s {
        Stmt::Jump { kind: k, target } => *k == kind && *target == id,
        other => other.bodies().into_iter().any(|b| targets(b, id, kind)),
    })
}
