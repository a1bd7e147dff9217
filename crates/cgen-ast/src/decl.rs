//! Top-level declarations: structs, functions, packages.

use serde::{Deserialize, Serialize};

use crate::stmt::Stmt;
use crate::types::TypeExpr;

/// Struct field or function parameter.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub typ: TypeExpr,
    /// Initial value set by the constructor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<i128>,
}

impl Field {
    #[must_use]
    pub fn new(name: &str, typ: TypeExpr) -> Self {
        Self {
            name: name.to_string(),
            typ,
            default: None,
        }
    }

    #[must_use]
    pub const fn with_default(mut self, value: i128) -> Self {
        self.default = Some(value);
        self
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    #[serde(default)]
    pub public: bool,
    /// Whether any method may suspend. Such structs carry a status code and
    /// an initialization guard.
    #[serde(default)]
    pub suspendible: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl StructDecl {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            public: false,
            suspendible: false,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub const fn public(mut self) -> Self {
        self.public = true;
        self
    }

    #[must_use]
    pub const fn suspendible(mut self) -> Self {
        self.suspendible = true;
        self
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

/// Function or method.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Func {
    /// Receiver struct name, for methods.
    #[serde(default)]
    pub receiver: Option<String>,
    pub name: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub suspendible: bool,
    #[serde(default)]
    pub params: Vec<Field>,
    #[serde(default)]
    pub out: Option<TypeExpr>,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

impl Func {
    /// `receiver.name` or just `name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        self.receiver
            .as_ref()
            .map_or_else(|| self.name.clone(), |r| format!("{r}.{}", self.name))
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Field> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// A type-checked package, the unit of generation.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub structs: Vec<StructDecl>,
    #[serde(default)]
    pub funcs: Vec<Func>,
}

impl Package {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn find_struct(&self, name: &str) -> Option<&StructDecl> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Method `name` of struct `receiver`.
    #[must_use]
    pub fn find_method(&self, receiver: &str, name: &str) -> Option<&Func> {
        self.funcs
            .iter()
            .find(|f| f.receiver.as_deref() == Some(receiver) && f.name == name)
    }

    /// Methods of struct `receiver`, in declaration order.
    pub fn methods_of<'a>(&'a self, receiver: &'a str) -> impl Iterator<Item = &'a Func> + 'a {
        self.funcs
            .iter()
            .filter(move |f| f.receiver.as_deref() == Some(receiver))
    }
}
