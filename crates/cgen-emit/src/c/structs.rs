//! Struct layouts, constructors and destructors.
//!
//! A suspendible struct starts with its status code and initialization
//! guard, then the declared fields (`f_` prefix), then a `private_impl`
//! block holding, for every suspendible method `m`, the resume point `p_m`
//! and the saved frame `s_m[1]`.

use cgen_ast::{StructDecl, TypeExpr};

use super::emitter::{CEmitter, FuncOutput, render_const};
use crate::error::Result;
use crate::tables::Status;

impl CEmitter<'_> {
    /// `cgen_<pkg>_<name>`.
    #[must_use]
    pub fn struct_name(&self, name: &str) -> String {
        format!("{}{name}", self.prefix())
    }

    /// Emit the `typedef struct` for `decl`. `methods` are the rendered
    /// methods of this struct; their frames size `private_impl`.
    pub fn render_struct(&mut self, decl: &StructDecl, methods: &[&FuncOutput]) -> Result<()> {
        let name = self.struct_name(&decl.name);
        self.writeln(0, "typedef struct {");
        let mut members = 0;
        if decl.suspendible {
            let status_type = self.status_type();
            self.writeln(1, &format!("{status_type} status;"));
            self.writeln(1, "uint32_t magic;");
            members += 2;
        }
        for field in &decl.fields {
            let d = self.c_decl(&field.typ, &format!("f_{}", field.name))?;
            self.writeln(1, &format!("{d};"));
            members += 1;
        }
        let coroutines: Vec<&&FuncOutput> = methods.iter().filter(|m| m.suspendible).collect();
        if !coroutines.is_empty() {
            if self.config.emit_comments {
                self.writeln(1, "// Private state; use the generated functions instead.");
            }
            self.writeln(1, "struct {");
            for m in &coroutines {
                self.writeln(2, &format!("uint32_t p_{};", m.name));
            }
            for m in &coroutines {
                self.writeln(2, "struct {");
                for d in &m.frame {
                    self.writeln(3, &format!("{d};"));
                }
                self.writeln(2, &format!("}} s_{}[1];", m.name));
            }
            self.writeln(1, "} private_impl;");
            members += 1;
        }
        if members == 0 {
            self.writeln(1, "uint8_t private_unused;");
        }
        self.writeln(0, &format!("}} {name};"));
        self.write("\n");
        Ok(())
    }

    /// Constructor declaration, without the trailing `;`.
    #[must_use]
    pub fn ctor_signature(&self, decl: &StructDecl) -> String {
        let storage = if decl.public { "" } else { "static " };
        let name = self.struct_name(&decl.name);
        format!(
            "{storage}{} {name}_constructor({name}* self, uint32_t cgen_version, uint32_t for_internal_use_only)",
            self.status_type()
        )
    }

    /// Destructor declaration, without the trailing `;`.
    #[must_use]
    pub fn dtor_signature(&self, decl: &StructDecl) -> String {
        let storage = if decl.public { "" } else { "static " };
        let name = self.struct_name(&decl.name);
        format!("{storage}void {name}_destructor({name}* self)")
    }

    /// Emit constructor and destructor definitions.
    pub fn render_ctor(&mut self, decl: &StructDecl) -> Result<()> {
        let null = self.status(Status::ErrorNullReceiver);
        let bad_version = self.status(Status::ErrorBadVersion);
        let ok = self.status(Status::Ok);

        let sig = self.ctor_signature(decl);
        self.writeln(0, &format!("{sig} {{"));
        self.writeln(1, "if (!self) {");
        self.writeln(2, &format!("return {null};"));
        self.writeln(1, "}");
        self.writeln(1, "if (cgen_version != CGEN_VERSION) {");
        if decl.suspendible {
            self.writeln(2, &format!("self->status = {bad_version};"));
        }
        self.writeln(2, &format!("return {bad_version};"));
        self.writeln(1, "}");
        self.writeln(1, "if (for_internal_use_only != CGEN_BASE__ALREADY_ZEROED) {");
        self.writeln(2, "memset(self, 0, sizeof(*self));");
        self.writeln(1, "}");
        if decl.suspendible {
            self.writeln(1, "self->magic = CGEN_BASE__MAGIC;");
        }
        for field in &decl.fields {
            if let Some(value) = field.default {
                let v = render_const(value, &field.typ)?;
                self.writeln(1, &format!("self->f_{} = {v};", field.name));
            }
            if let TypeExpr::Base(cgen_ast::BaseType::Struct(inner)) = &field.typ {
                if self.pkg.find_struct(inner).is_some() {
                    let status_type = self.status_type();
                    let inner = self.struct_name(inner);
                    self.writeln(1, "{");
                    self.writeln(
                        2,
                        &format!(
                            "{status_type} z = {inner}_constructor(&self->f_{}, CGEN_VERSION, CGEN_BASE__ALREADY_ZEROED);",
                            field.name
                        ),
                    );
                    self.writeln(2, "if (z) {");
                    self.writeln(3, "return z;");
                    self.writeln(2, "}");
                    self.writeln(1, "}");
                }
            }
        }
        self.writeln(1, &format!("return {ok};"));
        self.writeln(0, "}");
        self.write("\n");

        let sig = self.dtor_signature(decl);
        self.writeln(0, &format!("{sig} {{"));
        self.writeln(1, "if (!self) {");
        self.writeln(2, "return;");
        self.writeln(1, "}");
        self.writeln(0, "}");
        self.write("\n");
        Ok(())
    }
}
