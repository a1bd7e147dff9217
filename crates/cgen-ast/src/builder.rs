//! Function builder fluent API.

use crate::decl::{Field, Func};
use crate::expr::Expr;
use crate::stmt::{JumpKind, LoopId, Stmt};
use crate::types::TypeExpr;

/// Builder for a function body.
///
/// Loop ids handed out by [`FuncBuilder::new_loop`] are dense, starting at 0.
pub struct FuncBuilder {
    func: Func,
    next_loop: u32,
}

impl FuncBuilder {
    /// Free function.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            func: Func {
                receiver: None,
                name: name.to_string(),
                public: false,
                suspendible: false,
                params: Vec::new(),
                out: None,
                body: Vec::new(),
            },
            next_loop: 0,
        }
    }

    /// Method of struct `receiver`.
    #[must_use]
    pub fn method(receiver: &str, name: &str) -> Self {
        let mut b = Self::new(name);
        b.func.receiver = Some(receiver.to_string());
        b
    }

    #[must_use]
    pub const fn public(mut self) -> Self {
        self.func.public = true;
        self
    }

    #[must_use]
    pub const fn suspendible(mut self) -> Self {
        self.func.suspendible = true;
        self
    }

    #[must_use]
    pub fn param(mut self, name: &str, typ: TypeExpr) -> Self {
        self.func.params.push(Field::new(name, typ));
        self
    }

    #[must_use]
    pub fn returns(mut self, typ: TypeExpr) -> Self {
        self.func.out = Some(typ);
        self
    }

    /// Allocate the next loop id.
    pub const fn new_loop(&mut self) -> LoopId {
        let id = LoopId(self.next_loop);
        self.next_loop += 1;
        id
    }

    /// Append a statement.
    pub fn push(&mut self, stmt: Stmt) {
        self.func.body.push(stmt);
    }

    /// Append a statement, fluent form.
    #[must_use]
    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.push(stmt);
        self
    }

    /// Append `while cond { body }` under a fresh loop id. `body` receives
    /// the id so it can emit jumps to it.
    #[must_use]
    pub fn while_loop(mut self, cond: Expr, body: impl FnOnce(LoopId, &mut Self) -> Vec<Stmt>) -> Self {
        let id = self.new_loop();
        let stmts = body(id, &mut self);
        self.push(Stmt::while_loop(id, cond, stmts));
        self
    }

    /// `break` out of loop `id`.
    #[must_use]
    pub const fn brk(id: LoopId) -> Stmt {
        Stmt::jump(JumpKind::Break, id)
    }

    /// `continue` loop `id`.
    #[must_use]
    pub const fn cont(id: LoopId) -> Stmt {
        Stmt::jump(JumpKind::Continue, id)
    }

    #[must_use]
    pub fn build(self) -> Func {
        self.func
    }
}
