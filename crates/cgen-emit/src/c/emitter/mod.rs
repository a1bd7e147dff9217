//! C code emitter for suspendible functions.
//!
//! Lowers one function at a time:
//! - Expressions render to a single fully parenthesized C expression
//! - Built-in methods on numbers, slices, tables and I/O cursors inline
//! - Calls that may suspend are hoisted into temporaries and expanded into
//!   checked, resumable fragments
//! - The frame (status prologue, resume dispatch, save/restore) wraps the body

use cgen_ast::{Func, Package, TypeExpr};

use crate::config::EmitConfig;
use crate::error::{GenError, Result};
use crate::jump::JumpTargets;
use crate::tables::{Status, c_decl, c_type_name};

/// C code emitter.
pub struct CEmitter<'a> {
    pub config: &'a EmitConfig,
    pub pkg: &'a Package,
    /// Output buffer.
    pub out: String,
    /// `cgen_<pkg>_`.
    prefix: String,
}

/// Which side of a byte stream an I/O parameter is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoKind {
    Reader,
    Writer,
}

impl IoKind {
    /// Helper-function namespace in the base prelude.
    #[must_use]
    pub const fn helper(self) -> &'static str {
        match self {
            Self::Reader => "cgen_base__io_reader",
            Self::Writer => "cgen_base__io_writer",
        }
    }

    /// Buffer index the cursor mirrors.
    const fn index_field(self) -> &'static str {
        match self {
            Self::Reader => "ri",
            Self::Writer => "wi",
        }
    }
}

/// Reader or writer parameter and its cursor locals.
#[derive(Clone, Debug)]
pub struct IoParam {
    /// Parameter name, `a_<name>`.
    pub var: String,
    pub kind: IoKind,
}

impl IoParam {
    #[must_use]
    pub fn new(name: &str, kind: IoKind) -> Self {
        Self {
            var: format!("a_{name}"),
            kind,
        }
    }

    /// Current position.
    #[must_use]
    pub fn iop(&self) -> String {
        format!("iop_{}", self.var)
    }

    /// Start of the buffer (history for writers).
    #[must_use]
    pub fn io0(&self) -> String {
        format!("io0_{}", self.var)
    }

    /// End of the readable or writable range.
    #[must_use]
    pub fn io1(&self) -> String {
        format!("io1_{}", self.var)
    }

    fn buf(&self) -> String {
        format!("{}.private_impl.buf", self.var)
    }

    /// Store the cursor back into the buffer.
    #[must_use]
    pub fn sync(&self) -> String {
        let buf = self.buf();
        format!(
            "if ({buf}) {{ {buf}->meta.{} = ((size_t)({} - {buf}->data.ptr)); }}",
            self.kind.index_field(),
            self.iop()
        )
    }

    /// Reload the cursor from the buffer.
    #[must_use]
    pub fn reload(&self) -> String {
        let buf = self.buf();
        format!(
            "if ({buf}) {{ {} = {buf}->data.ptr + {buf}->meta.{}; }}",
            self.iop(),
            self.kind.index_field()
        )
    }
}

/// Frame variable: a local or a hoisted temporary.
#[derive(Clone, Debug)]
pub struct FrameVar {
    /// C name (`v_x`, `t_0`).
    pub name: String,
    pub typ: TypeExpr,
}

/// How a function leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// Status-returning coroutine with `ok`/`suspend`/`exit` labels.
    Suspendible,
    /// Plain function whose cursors are written back at `exit`.
    PlainWithIo,
    Plain,
}

/// Per-function generation state, created fresh for every function.
pub struct FuncCtx<'a> {
    pub func: &'a Func,
    pub kind: FrameKind,
    pub jumps: JumpTargets,
    pub locals: Vec<FrameVar>,
    pub temps: Vec<FrameVar>,
    pub io_params: Vec<IoParam>,
    max_temps: u32,
}

impl<'a> FuncCtx<'a> {
    #[must_use]
    pub fn new(func: &'a Func, config: &EmitConfig) -> Self {
        let io_params: Vec<IoParam> = func
            .params
            .iter()
            .filter_map(|p| match p.typ {
                TypeExpr::Base(cgen_ast::BaseType::Reader) => {
                    Some(IoParam::new(&p.name, IoKind::Reader))
                }
                TypeExpr::Base(cgen_ast::BaseType::Writer) => {
                    Some(IoParam::new(&p.name, IoKind::Writer))
                }
                _ => None,
            })
            .collect();
        let kind = if func.suspendible {
            FrameKind::Suspendible
        } else if io_params.is_empty() {
            FrameKind::Plain
        } else {
            FrameKind::PlainWithIo
        };
        let mut jumps = JumpTargets::new(config.max_jump_targets);
        jumps.reset();
        Self {
            func,
            kind,
            jumps,
            locals: Vec::new(),
            temps: Vec::new(),
            io_params,
            max_temps: config.max_temps,
        }
    }

    /// Allocate the next temporary, `t_N`.
    pub fn new_temp(&mut self, typ: &TypeExpr) -> Result<String> {
        if self.temps.len() >= self.max_temps as usize {
            return Err(GenError::TooManyTemps {
                max: self.max_temps,
            });
        }
        let name = format!("t_{}", self.temps.len());
        self.temps.push(FrameVar {
            name: name.clone(),
            typ: typ.clone(),
        });
        Ok(name)
    }

    /// The I/O parameter `a_<name>`.
    #[must_use]
    pub fn io_param(&self, name: &str) -> Option<&IoParam> {
        let var = format!("a_{name}");
        self.io_params.iter().find(|p| p.var == var)
    }

    /// Scratch word in the receiver's saved frame.
    #[must_use]
    pub fn scratch(&self) -> String {
        format!("self->private_impl.s_{}[0].scratch", self.func.name)
    }

    /// Saved frame slot for a local or temporary.
    #[must_use]
    pub fn saved(&self, var: &str) -> String {
        format!("self->private_impl.s_{}[0].{var}", self.func.name)
    }

    /// Resume point slot.
    #[must_use]
    pub fn resume_slot(&self) -> String {
        format!("self->private_impl.p_{}", self.func.name)
    }
}

impl<'a> CEmitter<'a> {
    /// Create a new emitter for `pkg`.
    #[must_use]
    pub fn new(config: &'a EmitConfig, pkg: &'a Package) -> Self {
        Self {
            config,
            pkg,
            out: String::with_capacity(4096),
            prefix: format!("cgen_{}_", pkg.name),
        }
    }

    /// Reset output buffer.
    pub fn reset(&mut self) {
        self.out.clear();
    }

    /// Get output string.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.out
    }

    /// Take output string, consuming the emitter.
    #[must_use]
    pub fn take_output(self) -> String {
        self.out
    }

    /// `cgen_<pkg>_`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// C constant for a status code of this package.
    #[must_use]
    pub fn status(&self, status: Status) -> String {
        status.c_name(&self.pkg.name)
    }

    /// `cgen_<pkg>_status`.
    #[must_use]
    pub fn status_type(&self) -> String {
        format!("{}status", self.prefix)
    }

    pub(crate) fn c_type(&self, typ: &TypeExpr) -> Result<String> {
        c_type_name(&self.prefix, typ)
    }

    pub(crate) fn c_decl(&self, typ: &TypeExpr, name: &str) -> Result<String> {
        c_decl(&self.prefix, typ, name)
    }

    /// C name of a function: `cgen_<pkg>_<struct>_<name>` or
    /// `cgen_<pkg>_<name>`.
    #[must_use]
    pub fn fn_name(&self, func: &Func) -> String {
        match &func.receiver {
            Some(recv) => format!("{}{recv}_{}", self.prefix, func.name),
            None => format!("{}{}", self.prefix, func.name),
        }
    }

    /// Write indented line.
    pub(super) fn writeln(&mut self, indent: usize, s: &str) {
        for _ in 0..indent {
            self.out.push_str("    ");
        }
        self.out.push_str(s);
        self.out.push('\n');
    }

    /// Write without indent.
    pub(super) fn write(&mut self, s: &str) {
        self.out.push_str(s);
    }
}

mod builtin;
mod expr;
mod func;
mod peephole;
mod stmt;
mod suspend;

pub use func::FuncOutput;
pub use suspend::{Hoisted, Substitutions};

pub(crate) use expr::render_const;

#[cfg(test)]
mod tests;
