//! Fixed 8-byte slice copy.
//!
//! `dst[i:i + 8].copy_from_slice(s: src[j:j + 8])` becomes a `memcpy` with a
//! constant length, which C compilers lower to a single 64-bit move.

use cgen_ast::{AssocOp, BinaryOp, Expr, ExprKind, TypeExpr};

use crate::error::Result;

use super::CEmitter;
use super::suspend::Substitutions;

/// One side of the copy: `base[index : index + 8]`, or `base[:8]` when
/// `index` is `None`.
struct Window<'e> {
    base: &'e Expr,
    index: Option<&'e Expr>,
}

fn is_byte_buffer(typ: &TypeExpr) -> bool {
    match typ {
        TypeExpr::Slice(inner) | TypeExpr::Array { inner, .. } => {
            matches!(inner.num_type(), Some(cgen_ast::NumType::U8))
        }
        _ => false,
    }
}

/// `hi` is written as `lo + 8`, a binary or two-operand associative sum.
/// Equal values are not enough: `a[2:10]` does not match.
fn is_plus_8(lo: &Expr, hi: &Expr) -> bool {
    match &hi.kind {
        ExprKind::Binary {
            op: BinaryOp::Add,
            lhs,
            rhs,
        } => **lhs == *lo && rhs.const_value == Some(8),
        ExprKind::Associative {
            op: AssocOp::Add,
            operands,
        } => operands.len() == 2 && operands[0] == *lo && operands[1].const_value == Some(8),
        _ => false,
    }
}

fn match_window(e: &Expr) -> Option<Window<'_>> {
    let ExprKind::Slice {
        base,
        lo,
        hi: Some(hi),
    } = &e.kind
    else {
        return None;
    };
    if !is_byte_buffer(&base.mtype) {
        return None;
    }
    match lo.as_deref() {
        None if hi.const_value == Some(8) => Some(Window {
            base: base.as_ref(),
            index: None,
        }),
        Some(lo) if is_plus_8(lo, hi) => Some(Window {
            base: base.as_ref(),
            index: Some(lo),
        }),
        _ => None,
    }
}

impl CEmitter<'_> {
    /// Try the 8-byte copy form for `dst.copy_from_slice(s: src)`.
    pub(super) fn match_index_plus_8(
        &self,
        dst: &Expr,
        src: &Expr,
        subst: &mut Substitutions<'_>,
        depth: u32,
    ) -> Result<Option<String>> {
        if self.contains_suspendible(dst) || self.contains_suspendible(src) {
            return Ok(None);
        }
        let (Some(d), Some(s)) = (match_window(dst), match_window(src)) else {
            return Ok(None);
        };
        let d = self.render_window(&d, subst, depth)?;
        let s = self.render_window(&s, subst, depth)?;
        Ok(Some(format!("memcpy({d},{s}, 8)")))
    }

    fn render_window(
        &self,
        w: &Window<'_>,
        subst: &mut Substitutions<'_>,
        depth: u32,
    ) -> Result<String> {
        let b = self.render_expr(w.base, subst, depth + 1)?;
        let ptr = match w.base.mtype {
            TypeExpr::Array { .. } => b,
            _ => format!("{b}.ptr"),
        };
        match w.index {
            Some(i) => {
                let i = self.render_expr(i, subst, depth + 1)?;
                Ok(format!("({ptr})+({i})"))
            }
            None => Ok(format!("({ptr})")),
        }
    }
}
