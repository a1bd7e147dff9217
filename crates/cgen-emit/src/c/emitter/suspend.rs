//! Suspension flattening.
//!
//! A statement that contains calls which may suspend is lowered in two
//! passes. First every such call is collected (post-order, left to right) and
//! expanded into a resumable fragment whose result lands in a temporary `t_N`.
//! Then the statement itself is rendered with each call replaced by its
//! temporary.
//!
//! Every fragment starts with a resume point:
//!
//! ```c
//! coro_susp_point = K;
//! resume_K:;
//! ```
//!
//! so re-entering the function jumps straight back to the check that failed,
//! without repeating side effects that precede it.
//!
//! Plain package methods that take a reader or writer are hoisted the same
//! way, without a resume point: the caller's cursors are written back before
//! the call and reloaded after it, so both sides agree on the position.

use cgen_ast::{Endian, Expr, ExprKind, Func, Method};

use crate::error::{GenError, Result};
use crate::tables::Status;

use super::builtin::{io_param, load_fn, read_c_type, store_fn};
use super::{CEmitter, FrameKind, FuncCtx, IoKind, IoParam};

/// A suspendible call already expanded into a fragment.
#[derive(Debug)]
pub struct Hoisted<'e> {
    pub call: &'e Expr,
    /// Temporary holding the result; `None` for calls without a value.
    pub temp: Option<String>,
    used: bool,
}

/// Hoisted calls available to the expression emitter.
#[derive(Debug, Default)]
pub struct Substitutions<'e> {
    entries: Vec<Hoisted<'e>>,
}

impl<'e> Substitutions<'e> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, call: &'e Expr, temp: Option<String>) {
        self.entries.push(Hoisted {
            call,
            temp,
            used: false,
        });
    }

    /// Consume the first unused entry structurally equal to `call`.
    pub fn take(&mut self, call: &Expr) -> Option<&Hoisted<'e>> {
        let entry = self
            .entries
            .iter_mut()
            .find(|h| !h.used && *h.call == *call)?;
        entry.used = true;
        Some(entry)
    }

    /// Whether `call` itself was hoisted.
    #[must_use]
    pub fn contains(&self, call: &Expr) -> bool {
        self.entries.iter().any(|h| std::ptr::eq(h.call, call))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CEmitter<'_> {
    /// Whether evaluating this call may suspend.
    pub(crate) fn is_suspendible_call(&self, expr: &Expr) -> bool {
        let ExprKind::Call {
            recv,
            method,
            in_bounds,
            ..
        } = &expr.kind
        else {
            return false;
        };
        match method {
            Method::Read { .. } | Method::Write { .. } | Method::Skip => {
                !in_bounds && recv.mtype.is_io()
            }
            Method::User(name) => recv
                .mtype
                .struct_name()
                .and_then(|s| self.pkg.find_method(s, name))
                .is_some_and(|f| f.suspendible),
            _ => false,
        }
    }

    /// Package method called by `expr`, if it is a non-suspendible call
    /// that takes a reader or writer.
    fn io_callee(&self, expr: &Expr) -> Option<&Func> {
        let ExprKind::Call {
            recv,
            method: Method::User(name),
            ..
        } = &expr.kind
        else {
            return None;
        };
        let func = self.pkg.find_method(recv.mtype.struct_name()?, name)?;
        (!func.suspendible && func.params.iter().any(|p| p.typ.is_io())).then_some(func)
    }

    /// Whether `expr` is a call that must be lifted out of its expression:
    /// it may suspend, or it moves the caller's cursors.
    pub(crate) fn is_hoisted_call(&self, expr: &Expr) -> bool {
        self.is_suspendible_call(expr) || self.io_callee(expr).is_some()
    }

    /// Whether any node under `expr` may suspend.
    pub(crate) fn contains_suspendible(&self, expr: &Expr) -> bool {
        self.is_suspendible_call(expr)
            || expr
                .children()
                .into_iter()
                .any(|c| self.contains_suspendible(c))
    }

    /// Whether any node under `expr` must be hoisted.
    pub(crate) fn contains_hoisted(&self, expr: &Expr) -> bool {
        self.is_hoisted_call(expr)
            || expr
                .children()
                .into_iter()
                .any(|c| self.contains_hoisted(c))
    }

    /// Calls under `expr` that must be hoisted, children before parents,
    /// left to right.
    pub(crate) fn collect_hoisted<'e>(
        &self,
        expr: &'e Expr,
        depth: u32,
        out: &mut Vec<&'e Expr>,
    ) -> Result<()> {
        if depth > self.config.max_expr_depth {
            return Err(GenError::ExprTooDeep {
                max: self.config.max_expr_depth,
            });
        }
        for child in expr.children() {
            self.collect_hoisted(child, depth + 1, out)?;
        }
        if self.is_hoisted_call(expr) {
            out.push(expr);
        }
        Ok(())
    }

    /// Expand every hoisted call under `exprs` into a fragment and return
    /// the substitutions for rendering the enclosing statement.
    pub(super) fn hoist<'e>(
        &mut self,
        ctx: &mut FuncCtx<'_>,
        exprs: &[&'e Expr],
        indent: usize,
    ) -> Result<Substitutions<'e>> {
        let mut calls = Vec::new();
        for &e in exprs {
            self.collect_hoisted(e, 0, &mut calls)?;
        }
        let mut subst = Substitutions::new();
        if calls.is_empty() {
            return Ok(subst);
        }
        if ctx.kind != FrameKind::Suspendible && calls.iter().any(|c| self.is_suspendible_call(c)) {
            return Err(GenError::Unsupported(format!(
                "{} calls suspendible code but is not suspendible",
                ctx.func.qualified_name()
            )));
        }
        for call in calls {
            let temp = if call.mtype.is_empty() {
                None
            } else {
                Some(ctx.new_temp(&call.mtype)?)
            };
            if self.is_suspendible_call(call) {
                self.emit_suspendible(ctx, call, temp.as_deref(), &mut subst, indent)?;
            } else {
                self.emit_io_call(ctx, call, temp.as_deref(), &mut subst, indent)?;
            }
            subst.push(call, temp);
        }
        Ok(subst)
    }

    /// Call a plain package method that takes a reader or writer, with the
    /// caller's cursors written back around it.
    fn emit_io_call(
        &mut self,
        ctx: &FuncCtx<'_>,
        call: &Expr,
        temp: Option<&str>,
        subst: &mut Substitutions<'_>,
        indent: usize,
    ) -> Result<()> {
        let ExprKind::Call {
            recv,
            method: Method::User(name),
            args,
            ..
        } = &call.kind
        else {
            return Err(GenError::Internal("hoisted a non-call".to_string()));
        };
        let c = self.render_user_call(recv, name, args, subst, 1)?;
        for io in &ctx.io_params {
            self.writeln(indent, &io.sync());
        }
        match temp {
            Some(t) => self.writeln(indent, &format!("{t} = {c};")),
            None => self.writeln(indent, &format!("{c};")),
        }
        for io in &ctx.io_params {
            self.writeln(indent, &io.reload());
        }
        Ok(())
    }

    fn emit_suspendible(
        &mut self,
        ctx: &mut FuncCtx<'_>,
        call: &Expr,
        temp: Option<&str>,
        subst: &mut Substitutions<'_>,
        indent: usize,
    ) -> Result<()> {
        let ExprKind::Call {
            recv, method, args, ..
        } = &call.kind
        else {
            return Err(GenError::Internal("hoisted a non-call".to_string()));
        };
        match method {
            Method::Read { bits, endian } => {
                let io = io_param(recv, IoKind::Reader)?;
                let temp = temp.ok_or_else(|| GenError::Internal(format!("{method} without a result")))?;
                self.emit_read(ctx, &io, *bits, *endian, temp, indent)
            }
            Method::Write { bits, endian } => {
                let io = io_param(recv, IoKind::Writer)?;
                let value = args
                    .first()
                    .ok_or_else(|| GenError::Unsupported(format!("{method} expects a value")))?;
                let value = self.render_expr(&value.value, subst, 1)?;
                self.emit_write(ctx, &io, *bits, *endian, &value, indent)
            }
            Method::Skip => {
                let io = io_param(recv, IoKind::Reader)?;
                let n = args
                    .first()
                    .ok_or_else(|| GenError::Unsupported("skip expects a count".to_string()))?;
                let n = self.render_expr(&n.value, subst, 1)?;
                self.emit_skip(ctx, &io, &n, indent)
            }
            Method::User(name) => {
                if temp.is_some() {
                    return Err(GenError::Unsupported(format!(
                        "suspendible method {name} cannot produce a value"
                    )));
                }
                let c = self.render_user_call(recv, name, args, subst, 1)?;
                self.emit_coroutine_call(ctx, &c, indent)
            }
            _ => Err(GenError::Internal(format!("{method} is not suspendible"))),
        }
    }

    /// `coro_susp_point = K;` and the `resume_K` label.
    fn emit_resume_point(&mut self, ctx: &mut FuncCtx<'_>, indent: usize) -> Result<u32> {
        let k = ctx.jumps.next_resume_point()?;
        self.writeln(indent, &format!("coro_susp_point = {k};"));
        self.writeln(indent.saturating_sub(1), &format!("resume_{k}:;"));
        Ok(k)
    }

    /// Set `status` and jump to the suspend label.
    fn emit_suspend(&mut self, status: Status, indent: usize) {
        let s = self.status(status);
        self.writeln(indent, &format!("status = {s};"));
        self.writeln(indent, "goto suspend;");
    }

    fn emit_read(
        &mut self,
        ctx: &mut FuncCtx<'_>,
        io: &IoParam,
        bits: u32,
        endian: Endian,
        temp: &str,
        indent: usize,
    ) -> Result<()> {
        let (iop, io1) = (io.iop(), io.io1());
        self.emit_resume_point(ctx, indent)?;
        if bits == 8 {
            self.writeln(indent, &format!("if (CGEN_BASE__UNLIKELY({iop} == {io1})) {{"));
            self.emit_suspend(Status::SuspensionShortRead, indent + 1);
            self.writeln(indent, "}");
            self.writeln(indent, &format!("{temp} = *{iop}++;"));
            return Ok(());
        }

        let k = bits / 8;
        let scratch = ctx.scratch();
        let ty = read_c_type(bits);
        self.writeln(indent, &format!("if (CGEN_BASE__LIKELY({io1} - {iop} >= {k})) {{"));
        self.writeln(indent + 1, &format!("{temp} = {}({iop});", load_fn(bits, endian)));
        self.writeln(indent + 1, &format!("{iop} += {k};"));
        self.writeln(indent, "} else {");
        let i = indent + 1;
        self.writeln(i, &format!("{scratch} = 0;"));
        self.emit_resume_point(ctx, i)?;
        self.writeln(i, "while (true) {");
        let j = i + 1;
        self.writeln(j, &format!("if (CGEN_BASE__UNLIKELY({iop} == {io1})) {{"));
        self.emit_suspend(Status::SuspensionShortRead, j + 1);
        self.writeln(j, "}");
        self.writeln(j, &format!("uint64_t* scratch = &{scratch};"));
        let last = bits - 8;
        match endian {
            // Count of bits read so far lives in the top byte.
            Endian::Little => {
                self.writeln(j, "uint32_t num_bits = ((uint32_t)(*scratch >> 56));");
                self.writeln(j, "*scratch <<= 8;");
                self.writeln(j, "*scratch >>= 8;");
                self.writeln(j, &format!("*scratch |= ((uint64_t)(*{iop}++)) << num_bits;"));
                self.writeln(j, &format!("if (num_bits == {last}) {{"));
                self.writeln(j + 1, &format!("{temp} = (({ty})(*scratch));"));
                self.writeln(j + 1, "break;");
                self.writeln(j, "}");
                self.writeln(j, "num_bits += 8;");
                self.writeln(j, "*scratch |= ((uint64_t)(num_bits)) << 56;");
            }
            // Count of bits read so far lives in the bottom byte.
            Endian::Big => {
                self.writeln(j, "uint32_t num_bits = ((uint32_t)(*scratch & 0xFF));");
                self.writeln(j, "*scratch >>= 8;");
                self.writeln(j, "*scratch <<= 8;");
                self.writeln(
                    j,
                    &format!("*scratch |= ((uint64_t)(*{iop}++)) << (56 - num_bits);"),
                );
                self.writeln(j, &format!("if (num_bits == {last}) {{"));
                self.writeln(j + 1, &format!("{temp} = (({ty})(*scratch >> {}));", 64 - bits));
                self.writeln(j + 1, "break;");
                self.writeln(j, "}");
                self.writeln(j, "num_bits += 8;");
                self.writeln(j, "*scratch |= ((uint64_t)(num_bits));");
            }
        }
        self.writeln(i, "}");
        self.writeln(indent, "}");
        Ok(())
    }

    fn emit_write(
        &mut self,
        ctx: &mut FuncCtx<'_>,
        io: &IoParam,
        bits: u32,
        endian: Endian,
        value: &str,
        indent: usize,
    ) -> Result<()> {
        let (iop, io1) = (io.iop(), io.io1());
        let k = bits / 8;
        self.emit_resume_point(ctx, indent)?;
        self.writeln(indent, &format!("if (CGEN_BASE__UNLIKELY({io1} - {iop} < {k})) {{"));
        self.emit_suspend(Status::SuspensionShortWrite, indent + 1);
        self.writeln(indent, "}");
        if bits == 8 {
            self.writeln(indent, &format!("*{iop}++ = {value};"));
        } else {
            self.writeln(indent, &format!("{}({iop}, {value});", store_fn(bits, endian)));
            self.writeln(indent, &format!("{iop} += {k};"));
        }
        Ok(())
    }

    fn emit_skip(
        &mut self,
        ctx: &mut FuncCtx<'_>,
        io: &IoParam,
        n: &str,
        indent: usize,
    ) -> Result<()> {
        let (iop, io1) = (io.iop(), io.io1());
        let scratch = ctx.scratch();
        self.writeln(indent, &format!("{scratch} = {n};"));
        self.emit_resume_point(ctx, indent)?;
        let avail = format!("((uint64_t)({io1} - {iop}))");
        self.writeln(indent, &format!("if ({scratch} > {avail}) {{"));
        self.writeln(indent + 1, &format!("{scratch} -= {avail};"));
        self.writeln(indent + 1, &format!("{iop} = {io1};"));
        self.emit_suspend(Status::SuspensionShortRead, indent + 1);
        self.writeln(indent, "}");
        self.writeln(indent, &format!("{iop} += {scratch};"));
        Ok(())
    }

    /// Call a suspendible package function and propagate its status.
    fn emit_coroutine_call(
        &mut self,
        ctx: &mut FuncCtx<'_>,
        call: &str,
        indent: usize,
    ) -> Result<()> {
        self.emit_resume_point(ctx, indent)?;
        for io in &ctx.io_params {
            self.writeln(indent, &io.sync());
        }
        self.writeln(indent, &format!("status = {call};"));
        for io in &ctx.io_params {
            self.writeln(indent, &io.reload());
        }
        self.writeln(indent, "if (status) {");
        self.writeln(indent + 1, "if (status & 1) {");
        self.writeln(indent + 2, "goto exit;");
        self.writeln(indent + 1, "}");
        self.writeln(indent + 1, "goto suspend;");
        self.writeln(indent, "}");
        Ok(())
    }
}
