//! Statement rendering for the C emitter.

use cgen_ast::{Expr, JumpKind, Stmt};

use crate::error::{GenError, Result};
use crate::tables::{c_assign_op, is_scalar};

use super::{CEmitter, FrameKind, FrameVar, FuncCtx};

impl CEmitter<'_> {
    /// Render a statement list at `depth` levels of nesting.
    pub(super) fn render_block(
        &mut self,
        ctx: &mut FuncCtx<'_>,
        stmts: &[Stmt],
        indent: usize,
        depth: u32,
    ) -> Result<()> {
        if depth > self.config.max_body_depth {
            return Err(GenError::BodyTooDeep {
                max: self.config.max_body_depth,
            });
        }
        for stmt in stmts {
            self.render_stmt(ctx, stmt, indent, depth)?;
        }
        Ok(())
    }

    fn render_stmt(
        &mut self,
        ctx: &mut FuncCtx<'_>,
        stmt: &Stmt,
        indent: usize,
        depth: u32,
    ) -> Result<()> {
        match stmt {
            Stmt::Assert(_) => {}
            Stmt::Expr(e) => {
                let mut subst = self.hoist(ctx, &[e], indent)?;
                // A call hoisted as a whole has already been emitted.
                if !subst.contains(e) {
                    let s = self.render_expr(e, &mut subst, 0)?;
                    self.writeln(indent, &format!("{s};"));
                }
            }
            Stmt::Assign { op, lhs, rhs } => {
                let mut subst = self.hoist(ctx, &[lhs, rhs], indent)?;
                let l = self.render_expr(lhs, &mut subst, 0)?;
                let r = self.render_expr(rhs, &mut subst, 0)?;
                match c_assign_op(*op) {
                    Some(o) => self.writeln(indent, &format!("{l} {o} {r};")),
                    None => self.writeln(indent, &format!("{l} &= ~{r};")),
                }
            }
            Stmt::Var { name, typ, value } => {
                let var = format!("v_{name}");
                match value {
                    Some(v) => {
                        if matches!(typ, cgen_ast::TypeExpr::Array { .. }) {
                            return Err(GenError::Unsupported(format!(
                                "array variable {name} with an initializer"
                            )));
                        }
                        let mut subst = self.hoist(ctx, &[v], indent)?;
                        let r = self.render_expr(v, &mut subst, 0)?;
                        self.writeln(indent, &format!("{var} = {r};"));
                    }
                    None if is_scalar(typ) => self.writeln(indent, &format!("{var} = 0;")),
                    None => self.writeln(indent, &format!("memset(&{var}, 0, sizeof({var}));")),
                }
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                let mut subst = self.hoist(ctx, &[cond], indent)?;
                let c = self.render_expr(cond, &mut subst, 0)?;
                self.writeln(indent, &format!("if ({c}) {{"));
                self.render_block(ctx, then_body, indent + 1, depth + 1)?;
                if !else_body.is_empty() {
                    self.writeln(indent, "} else {");
                    self.render_block(ctx, else_body, indent + 1, depth + 1)?;
                }
                self.writeln(indent, "}");
            }
            Stmt::While {
                id,
                cond,
                body,
                has_break,
                has_continue,
            } => {
                if self.contains_hoisted(cond) {
                    return Err(GenError::Unsupported(
                        "suspendible or I/O call in a while condition".to_string(),
                    ));
                }
                let c = self.render_expr(cond, &mut super::Substitutions::new(), 0)?;
                let label = if *has_break || *has_continue {
                    Some(ctx.jumps.label_for(*id)?)
                } else {
                    None
                };
                if let (Some(n), true) = (label, *has_continue) {
                    self.writeln(indent.saturating_sub(1), &format!("label_{n}_continue:;"));
                }
                self.writeln(indent, &format!("while ({c}) {{"));
                self.render_block(ctx, body, indent + 1, depth + 1)?;
                self.writeln(indent, "}");
                if let (Some(n), true) = (label, *has_break) {
                    self.writeln(indent.saturating_sub(1), &format!("label_{n}_break:;"));
                }
            }
            Stmt::Jump { kind, target } => {
                let n = ctx.jumps.label_for(*target)?;
                let which = match kind {
                    JumpKind::Break => "break",
                    JumpKind::Continue => "continue",
                };
                self.writeln(indent, &format!("goto label_{n}_{which};"));
            }
            Stmt::Return { value } => self.render_return(ctx, value.as_ref(), indent)?,
        }
        Ok(())
    }

    fn render_return(
        &mut self,
        ctx: &mut FuncCtx<'_>,
        value: Option<&Expr>,
        indent: usize,
    ) -> Result<()> {
        let value = match value {
            Some(v) => {
                let mut subst = self.hoist(ctx, &[v], indent)?;
                Some(self.render_expr(v, &mut subst, 0)?)
            }
            None => None,
        };
        match (ctx.kind, value) {
            (FrameKind::Suspendible, None) => self.writeln(indent, "goto ok;"),
            (FrameKind::Suspendible, Some(_)) => {
                return Err(GenError::Unsupported(format!(
                    "suspendible function {} cannot return a value",
                    ctx.func.qualified_name()
                )));
            }
            (FrameKind::PlainWithIo, Some(v)) => {
                self.writeln(indent, &format!("ret = {v};"));
                self.writeln(indent, "goto exit;");
            }
            (FrameKind::PlainWithIo, None) => self.writeln(indent, "goto exit;"),
            (FrameKind::Plain, Some(v)) => self.writeln(indent, &format!("return {v};")),
            (FrameKind::Plain, None) => self.writeln(indent, "return;"),
        }
        Ok(())
    }
}

/// Local variables declared anywhere in `body`, in pre-order.
pub(super) fn collect_locals(
    body: &[Stmt],
    depth: u32,
    max_depth: u32,
    out: &mut Vec<FrameVar>,
) -> Result<()> {
    if depth > max_depth {
        return Err(GenError::BodyTooDeep { max: max_depth });
    }
    for stmt in body {
        if let Stmt::Var { name, typ, .. } = stmt {
            out.push(FrameVar {
                name: format!("v_{name}"),
                typ: typ.clone(),
            });
        }
        for nested in stmt.bodies() {
            collect_locals(nested, depth + 1, max_depth, out)?;
        }
    }
    Ok(())
}
