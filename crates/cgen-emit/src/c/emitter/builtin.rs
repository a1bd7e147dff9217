//! Built-in method translation.
//!
//! Dispatch is on the receiver's capability first, then on the method. A
//! method the capability does not have yields `Ok(None)`.

use cgen_ast::{Arg, Capability, Endian, Expr, Method};

use crate::error::{GenError, Result};
use crate::tables::c_num_type;

use super::suspend::Substitutions;
use super::{CEmitter, IoKind, IoParam};

/// `cgen_base__load_u32le`, ...
pub(super) fn load_fn(bits: u32, endian: Endian) -> String {
    format!("cgen_base__load_u{bits}{}", endian.suffix())
}

/// `cgen_base__store_u32le`, ...
pub(super) fn store_fn(bits: u32, endian: Endian) -> String {
    format!("cgen_base__store_u{bits}{}", endian.suffix())
}

/// Positional argument `i` of a built-in call.
fn arg<'e>(args: &'e [Arg], i: usize, method: &Method) -> Result<&'e Expr> {
    args.get(i).map(|a| &a.value).ok_or_else(|| {
        GenError::Unsupported(format!("{method} expects at least {} argument(s)", i + 1))
    })
}

/// Cursor locals of an `args.<name>` reader or writer.
pub(super) fn io_param(recv: &Expr, kind: IoKind) -> Result<IoParam> {
    recv.as_arg()
        .map(|name| IoParam::new(name, kind))
        .ok_or_else(|| {
            GenError::Unsupported(format!(
                "{} receivers must be function arguments",
                kind.helper()
            ))
        })
}

impl CEmitter<'_> {
    pub(super) fn render_builtin(
        &self,
        recv: &Expr,
        method: &Method,
        args: &[Arg],
        in_bounds: bool,
        subst: &mut Substitutions<'_>,
        depth: u32,
    ) -> Result<Option<String>> {
        if method.is_user() {
            return Ok(None);
        }
        let a = |i: usize, subst: &mut Substitutions<'_>| -> Result<String> {
            self.render_expr(arg(args, i, method)?, subst, depth)
        };
        let s = match recv.mtype.capability() {
            Capability::Numeric(n) => {
                let r = self.render_expr(recv, subst, depth)?;
                match method {
                    Method::LowBits => {
                        let one = if n.bits() >= 32 { "((uint64_t)1)" } else { "1" };
                        format!("(({r}) & (({one} << ({})) - 1))", a(0, subst)?)
                    }
                    Method::HighBits => format!("(({r}) >> ({} - ({})))", n.bits(), a(0, subst)?),
                    Method::Max => format!("cgen_base__{n}__max({r}, {})", a(0, subst)?),
                    Method::Min => format!("cgen_base__{n}__min({r}, {})", a(0, subst)?),
                    _ => return Ok(None),
                }
            }
            Capability::Slice => {
                let r = self.render_expr(recv, subst, depth)?;
                match method {
                    Method::Length => format!("((uint64_t)({r}.len))"),
                    Method::CopyFromSlice => {
                        let src = arg(args, 0, method)?;
                        if let Some(s) = self.match_index_plus_8(recv, src, subst, depth)? {
                            return Ok(Some(s));
                        }
                        format!("cgen_base__slice_u8__copy_from_slice({r}, {})", a(0, subst)?)
                    }
                    Method::Suffix => format!("cgen_base__slice_u8__suffix({r}, {})", a(0, subst)?),
                    Method::Prefix => format!("cgen_base__slice_u8__prefix({r}, {})", a(0, subst)?),
                    _ => return Ok(None),
                }
            }
            Capability::Table => {
                let r = self.render_expr(recv, subst, depth)?;
                match method {
                    Method::Height => format!("((uint64_t)({r}.height))"),
                    Method::Width => format!("((uint64_t)({r}.width))"),
                    Method::Stride => format!("((uint64_t)({r}.stride))"),
                    Method::Row => format!("cgen_base__table_u8__row({r}, {})", a(0, subst)?),
                    _ => return Ok(None),
                }
            }
            Capability::Reader => {
                let io = io_param(recv, IoKind::Reader)?;
                let (iop, io0) = (io.iop(), io.io0());
                match method {
                    Method::Read { bits, endian } if in_bounds => {
                        let k = bits / 8;
                        format!("({iop} += {k}, {}({iop} - {k}))", load_fn(*bits, *endian))
                    }
                    Method::Read { .. } | Method::Skip if !in_bounds => {
                        return Err(GenError::Internal(format!(
                            "{method} must go through the suspension engine"
                        )));
                    }
                    Method::Peek { bits, endian } => format!("{}({iop})", load_fn(*bits, *endian)),
                    Method::Skip | Method::SkipFast => {
                        format!("({iop} += {}, cgen_base__return_empty_struct())", a(0, subst)?)
                    }
                    Method::UndoByte => format!("({iop}--, cgen_base__return_empty_struct())"),
                    Method::CanUndoByte => format!("({iop} > {io0})"),
                    _ => match self.render_io_common(&io, method, args, subst, depth)? {
                        Some(s) => s,
                        None => return Ok(None),
                    },
                }
            }
            Capability::Writer => {
                let io = io_param(recv, IoKind::Writer)?;
                let (iop, io0, io1) = (io.iop(), io.io0(), io.io1());
                match method {
                    Method::Write { bits, endian } | Method::WriteFast { bits, endian }
                        if in_bounds || matches!(method, Method::WriteFast { .. }) =>
                    {
                        format!(
                            "({}({iop}, {}), {iop} += {}, cgen_base__return_empty_struct())",
                            store_fn(*bits, *endian),
                            a(0, subst)?,
                            bits / 8
                        )
                    }
                    Method::Write { .. } => {
                        return Err(GenError::Internal(format!(
                            "{method} must go through the suspension engine"
                        )));
                    }
                    Method::CopyNFromHistory => format!(
                        "cgen_base__io_writer__copy_n_from_history(&{iop}, {io0}, {io1}, {}, {})",
                        a(0, subst)?,
                        a(1, subst)?
                    ),
                    Method::CopyNFromHistoryFast => format!(
                        "cgen_base__io_writer__copy_n_from_history_fast(&{iop}, {io0}, {io1}, {}, {})",
                        a(0, subst)?,
                        a(1, subst)?
                    ),
                    Method::CopyNFromReader => {
                        let src = io_param(arg(args, 1, method)?, IoKind::Reader)?;
                        format!(
                            "cgen_base__io_writer__copy_n_from_reader(&{iop}, {io1}, {}, &{}, {})",
                            a(0, subst)?,
                            src.iop(),
                            src.io1()
                        )
                    }
                    Method::CopyFromSlice => format!(
                        "cgen_base__io_writer__copy_from_slice(&{iop}, {io1}, {})",
                        a(0, subst)?
                    ),
                    Method::CopyNFromSlice => format!(
                        "cgen_base__io_writer__copy_n_from_slice(&{iop}, {io1}, {}, {})",
                        a(0, subst)?,
                        a(1, subst)?
                    ),
                    _ => match self.render_io_common(&io, method, args, subst, depth)? {
                        Some(s) => s,
                        None => return Ok(None),
                    },
                }
            }
            Capability::ImageConfigPtr => match method {
                Method::Initialize => {
                    let mut parts = vec![self.render_expr(recv, subst, depth)?];
                    for i in 0..args.len() {
                        parts.push(a(i, subst)?);
                    }
                    format!("cgen_base__image_config__initialize({})", parts.join(", "))
                }
                _ => return Ok(None),
            },
            Capability::Other => return Ok(None),
        };
        Ok(Some(s))
    }

    /// Methods shared by readers and writers.
    fn render_io_common(
        &self,
        io: &IoParam,
        method: &Method,
        args: &[Arg],
        subst: &mut Substitutions<'_>,
        depth: u32,
    ) -> Result<Option<String>> {
        let (iop, io1, var, helper) = (io.iop(), io.io1(), &io.var, io.kind.helper());
        Ok(Some(match method {
            Method::SetMark => format!("{helper}__set_mark(&{var}, {iop})"),
            Method::SinceMark => format!("{helper}__since_mark(&{var}, {iop})"),
            Method::Position => format!("{helper}__position(&{var}, {iop})"),
            Method::Available => format!("((uint64_t)({io1} - {iop}))"),
            Method::SetLimit => format!(
                "({io1} = {helper}__set_limit(&{var}, {iop}, {io1}, {}), cgen_base__return_empty_struct())",
                self.render_expr(arg(args, 0, method)?, subst, depth)?
            ),
            _ => return Ok(None),
        }))
    }
}

/// C type of the value a multi-byte read produces.
pub(super) const fn read_c_type(bits: u32) -> &'static str {
    c_num_type(cgen_ast::NumType::unsigned_for_bits(bits))
}
