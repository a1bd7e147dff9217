//! Function frames.
//!
//! The body is rendered first, into a scratch buffer, so that the prologue
//! knows every resume point, local and temporary the body needs.

use cgen_ast::{Func, TypeExpr};
use tracing::trace;

use crate::error::{GenError, Result};
use crate::tables::{Status, is_scalar};

use super::stmt::collect_locals;
use super::{CEmitter, FrameKind, FrameVar, FuncCtx, IoKind, IoParam};

/// A rendered function.
#[derive(Clone, Debug)]
pub struct FuncOutput {
    /// Source-level name.
    pub name: String,
    pub receiver: Option<String>,
    pub public: bool,
    pub suspendible: bool,
    /// Declaration, without the trailing `;`.
    pub signature: String,
    /// Full definition.
    pub code: String,
    /// Declarations saved in the receiver across suspensions: the scratch
    /// word, then locals, then temporaries. Empty for plain functions.
    pub frame: Vec<String>,
}

impl CEmitter<'_> {
    /// Render `func` into a standalone definition.
    pub fn render_func(&mut self, func: &Func) -> Result<FuncOutput> {
        self.check_func(func)?;
        let mut ctx = FuncCtx::new(func, self.config);
        collect_locals(&func.body, 0, self.config.max_body_depth, &mut ctx.locals)?;

        let outer = std::mem::take(&mut self.out);
        let rendered = self.render_block(&mut ctx, &func.body, 1, 0);
        let body = std::mem::replace(&mut self.out, outer);
        rendered?;
        trace!(
            func = %func.qualified_name(),
            resume_points = ctx.jumps.resume_points(),
            locals = ctx.locals.len(),
            temps = ctx.temps.len(),
            "rendered body"
        );

        let signature = self.signature(func)?;
        let outer = std::mem::take(&mut self.out);
        self.write(&signature);
        self.write(" {\n");
        let framed = match ctx.kind {
            FrameKind::Suspendible => self.emit_coroutine_frame(&ctx, &body),
            FrameKind::PlainWithIo | FrameKind::Plain => {
                self.emit_plain_frame(&ctx, &body).map(|()| Vec::new())
            }
        };
        self.writeln(0, "}");
        let code = std::mem::replace(&mut self.out, outer);

        Ok(FuncOutput {
            name: func.name.clone(),
            receiver: func.receiver.clone(),
            public: func.public,
            suspendible: func.suspendible,
            signature,
            code,
            frame: framed?,
        })
    }

    fn check_func(&self, func: &Func) -> Result<()> {
        let owner = match &func.receiver {
            Some(name) => Some(
                self.pkg
                    .find_struct(name)
                    .ok_or_else(|| GenError::UnknownStruct(name.clone()))?,
            ),
            None => None,
        };
        if func.suspendible {
            if !owner.is_some_and(|s| s.suspendible) {
                return Err(GenError::SuspendibleWithoutReceiver(func.qualified_name()));
            }
            if func.out.is_some() {
                return Err(GenError::Unsupported(format!(
                    "suspendible function {} cannot return a value",
                    func.qualified_name()
                )));
            }
        }
        Ok(())
    }

    /// C declaration of `func`, `static` unless public.
    pub(crate) fn signature(&self, func: &Func) -> Result<String> {
        let mut params = Vec::new();
        if let Some(recv) = &func.receiver {
            params.push(format!("{}{recv}* self", self.prefix()));
        }
        for p in &func.params {
            if matches!(p.typ, TypeExpr::Array { .. }) {
                return Err(GenError::UnsupportedType(format!(
                    "array parameter {} of {}",
                    p.name,
                    func.qualified_name()
                )));
            }
            params.push(self.c_decl(&p.typ, &format!("a_{}", p.name))?);
        }
        let params = if params.is_empty() {
            "void".to_string()
        } else {
            params.join(", ")
        };
        let ret = if func.suspendible {
            self.status_type()
        } else {
            match &func.out {
                Some(t) => self.c_type(t)?,
                None => "void".to_string(),
            }
        };
        let storage = if func.public { "" } else { "static " };
        Ok(format!("{storage}{ret} {}({params})", self.fn_name(func)))
    }

    fn emit_coroutine_frame(&mut self, ctx: &FuncCtx<'_>, body: &str) -> Result<Vec<String>> {
        let status_type = self.status_type();
        let ok = self.status(Status::Ok);
        if ctx.func.public {
            let null = self.status(Status::ErrorNullReceiver);
            let not_constructed = self.status(Status::ErrorConstructorNotCalled);
            self.writeln(1, "if (!self) {");
            self.writeln(2, &format!("return {null};"));
            self.writeln(1, "}");
            self.writeln(1, &format!("{status_type} status = self->status;"));
            self.writeln(1, "if (status & 1) {");
            self.writeln(2, "return status;");
            self.writeln(1, "}");
            self.writeln(1, "if (self->magic != CGEN_BASE__MAGIC) {");
            self.writeln(2, &format!("status = {not_constructed};"));
            self.writeln(2, "self->status = status;");
            self.writeln(2, "return status;");
            self.writeln(1, "}");
            self.writeln(1, &format!("status = {ok};"));
        } else {
            self.writeln(1, &format!("{status_type} status = {ok};"));
        }
        self.write("\n");

        let slot = ctx.resume_slot();
        self.writeln(1, &format!("uint32_t coro_susp_point = {slot};"));
        let vars: Vec<&FrameVar> = ctx.locals.iter().chain(&ctx.temps).collect();
        let mut frame = vec!["uint64_t scratch".to_string()];
        for v in &vars {
            let decl = self.c_decl(&v.typ, &v.name)?;
            self.emit_zeroed_decl(&decl, &v.typ);
            frame.push(decl);
        }
        for io in &ctx.io_params {
            self.emit_io_open(io);
        }
        if !vars.is_empty() {
            self.writeln(1, "if (coro_susp_point) {");
            for v in &vars {
                let saved = ctx.saved(&v.name);
                self.emit_copy(2, &v.name, &saved, &v.typ);
            }
            self.writeln(1, "}");
        }
        for k in 1..=ctx.jumps.resume_points() {
            self.writeln(1, &format!("if (coro_susp_point == {k}) {{"));
            self.writeln(2, &format!("goto resume_{k};"));
            self.writeln(1, "}");
        }
        self.write("\n");

        self.write(body);
        self.write("\n");
        self.writeln(1, "goto ok;");
        self.writeln(0, "ok:");
        self.writeln(1, &format!("{slot} = 0;"));
        self.writeln(1, "goto exit;");
        self.write("\n");
        self.writeln(1, "goto suspend;");
        self.writeln(0, "suspend:");
        self.writeln(1, &format!("{slot} = coro_susp_point;"));
        for v in &vars {
            let saved = ctx.saved(&v.name);
            self.emit_copy(1, &saved, &v.name, &v.typ);
        }
        self.write("\n");
        self.writeln(0, "exit:");
        for io in &ctx.io_params {
            self.writeln(1, &io.sync());
        }
        if ctx.func.public {
            self.writeln(
                1,
                &format!("if (status == {}) {{", self.status(Status::SuspensionShortRead)),
            );
            self.writeln(2, &format!("status = {};", self.status(Status::StatusShortSrc)));
            self.writeln(
                1,
                &format!("}} else if (status == {}) {{", self.status(Status::SuspensionShortWrite)),
            );
            self.writeln(2, &format!("status = {};", self.status(Status::StatusShortDst)));
            self.writeln(1, "}");
            self.writeln(1, "self->status = status;");
        }
        self.writeln(1, "return status;");
        Ok(frame)
    }

    fn emit_plain_frame(&mut self, ctx: &FuncCtx<'_>, body: &str) -> Result<()> {
        let zero = match &ctx.func.out {
            Some(t) => Some(format!("(({}){{0}})", self.c_type(t)?)),
            None => None,
        };
        if ctx.func.public && ctx.func.receiver.is_some() {
            self.writeln(1, "if (!self) {");
            match &zero {
                Some(z) => self.writeln(2, &format!("return {z};")),
                None => self.writeln(2, "return;"),
            }
            self.writeln(1, "}");
        }
        for v in ctx.locals.iter().chain(&ctx.temps) {
            let decl = self.c_decl(&v.typ, &v.name)?;
            self.emit_zeroed_decl(&decl, &v.typ);
        }
        let with_io = ctx.kind == FrameKind::PlainWithIo;
        if with_io {
            if let Some(t) = &ctx.func.out {
                let decl = self.c_decl(t, "ret")?;
                self.emit_zeroed_decl(&decl, t);
            }
            for io in &ctx.io_params {
                self.emit_io_open(io);
            }
        }
        self.write(body);
        if with_io {
            self.writeln(1, "goto exit;");
            self.writeln(0, "exit:");
            for io in &ctx.io_params {
                self.writeln(1, &io.sync());
            }
            if ctx.func.out.is_some() {
                self.writeln(1, "return ret;");
            } else {
                self.writeln(1, "return;");
            }
        }
        Ok(())
    }

    fn emit_zeroed_decl(&mut self, decl: &str, typ: &TypeExpr) {
        if is_scalar(typ) {
            self.writeln(1, &format!("{decl} = 0;"));
        } else {
            self.writeln(1, &format!("{decl} = {{0}};"));
        }
    }

    /// `dst = src;`, or a `memcpy` for arrays.
    fn emit_copy(&mut self, indent: usize, dst: &str, src: &str, typ: &TypeExpr) {
        if matches!(typ, TypeExpr::Array { .. }) {
            self.writeln(indent, &format!("memcpy({dst}, {src}, sizeof({dst}));"));
        } else {
            self.writeln(indent, &format!("{dst} = {src};"));
        }
    }

    /// Declare and load the cursor locals of an I/O parameter.
    fn emit_io_open(&mut self, io: &IoParam) {
        let (iop, io0, io1) = (io.iop(), io.io0(), io.io1());
        let var = &io.var;
        let buf = format!("{var}.private_impl.buf");
        self.writeln(1, &format!("uint8_t* {iop} = NULL;"));
        self.writeln(1, &format!("uint8_t* {io0} = NULL;"));
        self.writeln(1, &format!("uint8_t* {io1} = NULL;"));
        self.writeln(1, &format!("if ({buf}) {{"));
        match io.kind {
            IoKind::Reader => {
                self.writeln(2, &format!("{iop} = {buf}->data.ptr + {buf}->meta.ri;"));
                self.writeln(2, &format!("{io0} = {buf}->data.ptr;"));
                self.writeln(2, &format!("{io1} = {buf}->data.ptr + {buf}->meta.wi;"));
            }
            IoKind::Writer => {
                self.writeln(2, &format!("{iop} = {buf}->data.ptr + {buf}->meta.wi;"));
                self.writeln(2, &format!("{io0} = {buf}->data.ptr;"));
                self.writeln(2, &format!("{io1} = {buf}->data.ptr + {buf}->data.len;"));
            }
        }
        let limit = format!("{var}.private_impl.limit");
        self.writeln(2, &format!("if ({limit} && {limit} < {io1}) {{"));
        self.writeln(3, &format!("{io1} = {limit};"));
        self.writeln(2, "}");
        self.writeln(1, "}");
    }
}
