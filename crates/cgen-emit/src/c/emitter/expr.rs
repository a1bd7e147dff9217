//! Expression rendering for the C emitter.

use cgen_ast::{Arg, Expr, ExprKind, Method, TypeExpr, UnaryOp};

use crate::error::{GenError, Result};
use crate::tables::{c_binary_op, c_num_type, c_unary_op};

use super::CEmitter;
use super::suspend::Substitutions;

/// Literal text for a folded constant.
pub(crate) fn render_const(value: i128, typ: &TypeExpr) -> Result<String> {
    if typ.is_bool() {
        return Ok(if value == 0 { "false" } else { "true" }.to_string());
    }
    let s = if (0..=i128::from(i32::MAX)).contains(&value) {
        value.to_string()
    } else if (i128::from(i32::MIN)..0).contains(&value) {
        format!("({value})")
    } else if (0..=i128::from(u32::MAX)).contains(&value) {
        format!("{value}u")
    } else if (0..=i128::from(u64::MAX)).contains(&value) {
        format!("{value}ull")
    } else if value == i128::from(i64::MIN) {
        // The literal 9223372036854775808 does not fit in long long.
        "(-9223372036854775807ll - 1)".to_string()
    } else if (i128::from(i64::MIN)..0).contains(&value) {
        format!("({value}ll)")
    } else {
        return Err(GenError::Unsupported(format!(
            "constant {value} does not fit in 64 bits"
        )));
    };
    Ok(s)
}

/// Wrap an arithmetic result of a sub-`int` type in a cast to that type so
/// C's integer promotion does not leak into the enclosing expression.
fn narrow(s: String, typ: &TypeExpr) -> String {
    match typ.num_type() {
        Some(n) if n.bits() < 32 => format!("(({}){s})", c_num_type(n)),
        _ => s,
    }
}

impl CEmitter<'_> {
    /// Render `expr` as one C expression.
    ///
    /// Suspendible calls are never rendered directly: they must have been
    /// hoisted, and are replaced by the matching entry of `subst`.
    pub(crate) fn render_expr(
        &self,
        expr: &Expr,
        subst: &mut Substitutions<'_>,
        depth: u32,
    ) -> Result<String> {
        if depth > self.config.max_expr_depth {
            return Err(GenError::ExprTooDeep {
                max: self.config.max_expr_depth,
            });
        }
        if let Some(value) = expr.const_value {
            return render_const(value, &expr.mtype);
        }
        let d = depth + 1;
        match &expr.kind {
            ExprKind::Ident(name) => match name.as_str() {
                "this" => Ok("self".to_string()),
                "args" => Err(GenError::Unsupported(
                    "args used outside a selector".to_string(),
                )),
                _ => Ok(format!("v_{name}")),
            },
            ExprKind::Unary { op, operand } => {
                let x = self.render_expr(operand, subst, d)?;
                let s = format!("({}{x})", c_unary_op(*op));
                Ok(match op {
                    UnaryOp::Minus | UnaryOp::Complement => narrow(s, &expr.mtype),
                    UnaryOp::Plus | UnaryOp::Not => s,
                })
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.render_expr(lhs, subst, d)?;
                let r = self.render_expr(rhs, subst, d)?;
                let s = c_binary_op(*op)
                    .map_or_else(|| format!("({l} & ~{r})"), |o| format!("({l} {o} {r})"));
                Ok(if op.is_arithmetic() {
                    narrow(s, &expr.mtype)
                } else {
                    s
                })
            }
            ExprKind::As { operand } => {
                let x = self.render_expr(operand, subst, d)?;
                Ok(format!("(({})({x}))", self.c_type(&expr.mtype)?))
            }
            ExprKind::Associative { op, operands } => {
                let bin = op.binary();
                let o = c_binary_op(bin)
                    .ok_or_else(|| GenError::Internal(format!("no C operator for {bin:?}")))?;
                let mut iter = operands.iter();
                let first = iter
                    .next()
                    .ok_or_else(|| GenError::Internal("empty associative expression".to_string()))?;
                let mut s = self.render_expr(first, subst, d)?;
                for operand in iter {
                    let r = self.render_expr(operand, subst, d)?;
                    s = format!("({s} {o} {r})");
                }
                Ok(if bin.is_arithmetic() && operands.len() > 1 {
                    narrow(s, &expr.mtype)
                } else {
                    s
                })
            }
            ExprKind::Call {
                recv,
                method,
                args,
                in_bounds,
            } => {
                if self.is_hoisted_call(expr) {
                    return match subst.take(expr) {
                        Some(hoisted) => hoisted.temp.clone().ok_or_else(|| {
                            GenError::Unsupported(format!(
                                "{method} has no value and must stand as its own statement"
                            ))
                        }),
                        None => Err(GenError::Internal(format!(
                            "call {method} was not hoisted"
                        ))),
                    };
                }
                if let Some(s) = self.render_builtin(recv, method, args, *in_bounds, subst, d)? {
                    return Ok(s);
                }
                match method {
                    Method::User(name) => self.render_user_call(recv, name, args, subst, d),
                    _ => Err(GenError::NoSuchBuiltin {
                        capability: recv.mtype.capability().to_string(),
                        method: method.to_string(),
                    }),
                }
            }
            ExprKind::Index { base, index } => {
                let b = self.render_expr(base, subst, d)?;
                let i = self.render_expr(index, subst, d)?;
                match &base.mtype {
                    TypeExpr::Array { .. } => Ok(format!("{b}[{i}]")),
                    TypeExpr::Slice(_) => Ok(format!("{b}.ptr[{i}]")),
                    other => Err(GenError::UnsupportedType(format!("cannot index {other}"))),
                }
            }
            ExprKind::Slice { base, lo, hi } => {
                let b = self.render_expr(base, subst, d)?;
                let b = match &base.mtype {
                    TypeExpr::Array { len, .. } => format!("cgen_base__make_slice_u8({b}, {len})"),
                    TypeExpr::Slice(_) => b,
                    other => return Err(GenError::UnsupportedType(format!("cannot slice {other}"))),
                };
                let lo = lo.as_deref().map(|e| self.render_expr(e, subst, d)).transpose()?;
                let hi = hi.as_deref().map(|e| self.render_expr(e, subst, d)).transpose()?;
                Ok(match (lo, hi) {
                    (None, None) => b,
                    (Some(i), None) => format!("cgen_base__slice_u8__subslice_i({b}, {i})"),
                    (None, Some(j)) => format!("cgen_base__slice_u8__subslice_j({b}, {j})"),
                    (Some(i), Some(j)) => {
                        format!("cgen_base__slice_u8__subslice_ij({b}, {i}, {j})")
                    }
                })
            }
            ExprKind::Selector { base, field } => {
                if base.as_ident() == Some("args") {
                    return Ok(format!("a_{field}"));
                }
                let b = self.render_expr(base, subst, d)?;
                if base.mtype.is_pointer() {
                    Ok(format!("{b}->f_{field}"))
                } else {
                    Ok(format!("{b}.f_{field}"))
                }
            }
        }
    }

    /// Call of a method declared in the package.
    pub(super) fn render_user_call(
        &self,
        recv: &Expr,
        name: &str,
        args: &[Arg],
        subst: &mut Substitutions<'_>,
        depth: u32,
    ) -> Result<String> {
        let owner = recv
            .mtype
            .struct_name()
            .ok_or_else(|| GenError::UnknownFunction(format!("{}.{name}", recv.mtype)))?;
        let func = self
            .pkg
            .find_method(owner, name)
            .ok_or_else(|| GenError::UnknownFunction(format!("{owner}.{name}")))?;
        let r = self.render_expr(recv, subst, depth)?;
        let mut parts = vec![if recv.mtype.is_pointer() {
            r
        } else {
            format!("&{r}")
        }];
        if let Some(extra) = args.iter().find(|a| func.param(&a.name).is_none()) {
            return Err(GenError::Unsupported(format!(
                "{} has no parameter {}",
                func.qualified_name(),
                extra.name
            )));
        }
        for param in &func.params {
            let arg = args.iter().find(|a| a.name == param.name).ok_or_else(|| {
                GenError::Unsupported(format!(
                    "missing argument {} to {}",
                    param.name,
                    func.qualified_name()
                ))
            })?;
            parts.push(self.render_expr(&arg.value, subst, depth)?);
        }
        Ok(format!("{}({})", self.fn_name(func), parts.join(", ")))
    }
}
