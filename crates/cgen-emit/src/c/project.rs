//! CPackage - whole-package C generation.
//!
//! Lays out one self-contained `.c` file:
//! - Header half: prelude, status codes, public structs and prototypes
//! - `// C HEADER ENDS HERE.` marker
//! - Implementation half: private structs and prototypes, constructors,
//!   function bodies
//!
//! Every function is rendered before any struct, since a struct's
//! `private_impl` block holds the saved frames of its suspendible methods.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, trace};

use cgen_ast::{Package, StructDecl, TypeExpr};

use super::emitter::{CEmitter, FuncOutput};
use super::header::{gen_prelude, gen_status_codes};
use crate::config::EmitConfig;
use crate::error::{GenError, Result};

/// Marker separating the header half of the output from the
/// implementation half.
pub const HEADER_ENDS_MARKER: &str = "// C HEADER ENDS HERE.";

/// C generation for one package.
pub struct CPackage<'a> {
    pub pkg: &'a Package,
    pub config: &'a EmitConfig,
}

impl<'a> CPackage<'a> {
    #[must_use]
    pub const fn new(pkg: &'a Package, config: &'a EmitConfig) -> Self {
        Self { pkg, config }
    }

    /// Generate the complete C source.
    pub fn generate(&self) -> Result<String> {
        info!(
            package = %self.pkg.name,
            structs = self.pkg.structs.len(),
            funcs = self.pkg.funcs.len(),
            "generating C package"
        );
        self.check_names()?;
        let structs = order_structs(&self.pkg.structs)?;
        for s in &structs {
            if s.public {
                if let Some(dep) = s
                    .fields
                    .iter()
                    .filter_map(|f| referenced_struct(&f.typ))
                    .find(|dep| self.pkg.find_struct(dep).is_some_and(|d| !d.public))
                {
                    return Err(GenError::Unsupported(format!(
                        "public struct {} uses private struct {dep}",
                        s.name
                    )));
                }
            }
        }

        let mut emitter = CEmitter::new(self.config, self.pkg);
        let mut funcs = Vec::with_capacity(self.pkg.funcs.len());
        for func in &self.pkg.funcs {
            let out = emitter.render_func(func)?;
            debug!(
                func = %func.qualified_name(),
                bytes = out.code.len(),
                frame = out.frame.len(),
                "rendered function"
            );
            funcs.push(out);
        }
        let mut methods: FxHashMap<&str, Vec<&FuncOutput>> = FxHashMap::default();
        for f in &funcs {
            if let Some(recv) = &f.receiver {
                methods.entry(recv.as_str()).or_default().push(f);
            }
        }

        let comments = self.config.emit_comments;
        let guard = format!("CGEN_{}_H", self.pkg.name.to_ascii_uppercase());
        if comments {
            emitter.write("// Code generated by cgen. DO NOT EDIT.\n\n");
        }
        emitter.write(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        emitter.write(&gen_prelude(self.config));
        emitter.write(&gen_status_codes(&self.pkg.name));

        banner(&mut emitter, comments, "Public structs");
        for s in structs.iter().filter(|s| s.public) {
            emitter.render_struct(s, methods.get(s.name.as_str()).map_or(&[][..], Vec::as_slice))?;
        }
        banner(&mut emitter, comments, "Public functions");
        for s in structs.iter().filter(|s| s.public) {
            let (ctor, dtor) = (emitter.ctor_signature(s), emitter.dtor_signature(s));
            prototype(&mut emitter, &ctor);
            prototype(&mut emitter, &dtor);
        }
        for f in funcs.iter().filter(|f| f.public) {
            prototype(&mut emitter, &f.signature);
        }
        emitter.write(&format!("\n#endif  // {guard}\n\n{HEADER_ENDS_MARKER}\n\n"));

        banner(&mut emitter, comments, "Private structs");
        for s in structs.iter().filter(|s| !s.public) {
            emitter.render_struct(s, methods.get(s.name.as_str()).map_or(&[][..], Vec::as_slice))?;
        }
        banner(&mut emitter, comments, "Private functions");
        for s in structs.iter().filter(|s| !s.public) {
            let (ctor, dtor) = (emitter.ctor_signature(s), emitter.dtor_signature(s));
            prototype(&mut emitter, &ctor);
            prototype(&mut emitter, &dtor);
        }
        for f in funcs.iter().filter(|f| !f.public) {
            prototype(&mut emitter, &f.signature);
        }
        emitter.write("\n");

        banner(&mut emitter, comments, "Constructors");
        for s in &structs {
            emitter.render_ctor(s)?;
        }
        banner(&mut emitter, comments, "Function implementations");
        for f in &funcs {
            trace!(func = %f.name, "writing function");
            emitter.write(&f.code);
            emitter.write("\n");
        }

        let out = emitter.take_output();
        info!(package = %self.pkg.name, bytes = out.len(), "generated C package");
        Ok(out)
    }

    /// Struct names and method names must be unique.
    fn check_names(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for s in &self.pkg.structs {
            if !seen.insert(s.name.as_str()) {
                return Err(GenError::Unsupported(format!("duplicate struct {}", s.name)));
            }
        }
        let mut seen = FxHashSet::default();
        for f in &self.pkg.funcs {
            if !seen.insert((f.receiver.as_deref(), f.name.as_str())) {
                return Err(GenError::Unsupported(format!(
                    "duplicate function {}",
                    f.qualified_name()
                )));
            }
        }
        Ok(())
    }
}

fn banner(emitter: &mut CEmitter<'_>, enabled: bool, title: &str) {
    if enabled {
        emitter.write(&format!("/* ---------------- {title} */\n\n"));
    }
}

fn prototype(emitter: &mut CEmitter<'_>, signature: &str) {
    emitter.write(&format!("{signature};\n"));
}

/// Struct named by a field type, looking through pointers and arrays.
fn referenced_struct(typ: &TypeExpr) -> Option<&str> {
    match typ {
        TypeExpr::Ptr(inner) | TypeExpr::Nptr(inner) | TypeExpr::Array { inner, .. } => {
            referenced_struct(inner)
        }
        _ => typ.struct_name(),
    }
}

/// Structs ordered so that every struct comes after the structs its fields
/// name. Declaration order is kept otherwise.
fn order_structs(structs: &[StructDecl]) -> Result<Vec<&StructDecl>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        Visiting,
        Done,
    }

    fn visit<'s>(
        i: usize,
        structs: &'s [StructDecl],
        index: &FxHashMap<&str, usize>,
        marks: &mut [Mark],
        out: &mut Vec<&'s StructDecl>,
    ) -> Result<()> {
        match marks[i] {
            Mark::Done => return Ok(()),
            Mark::Visiting => {
                return Err(GenError::Unsupported(format!(
                    "struct {} contains itself",
                    structs[i].name
                )));
            }
            Mark::Unvisited => {}
        }
        marks[i] = Mark::Visiting;
        for field in &structs[i].fields {
            if let Some(&dep) = referenced_struct(&field.typ).and_then(|n| index.get(n)) {
                visit(dep, structs, index, marks, out)?;
            }
        }
        marks[i] = Mark::Done;
        out.push(&structs[i]);
        Ok(())
    }

    let index: FxHashMap<&str, usize> = structs
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), i))
        .collect();
    let mut marks = vec![Mark::Unvisited; structs.len()];
    let mut out = Vec::with_capacity(structs.len());
    for i in 0..structs.len() {
        visit(i, structs, &index, &mut marks, &mut out)?;
    }
    Ok(out)
}
