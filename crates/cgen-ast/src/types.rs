//! Type descriptors.
//!
//! A type is a chain of zero or more decorators (pointer, slice, array,
//! table) wrapping a base type. The backend uses the chain both to spell the
//! C type and to pick the built-in method set legal on a value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed-width integer types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl NumType {
    /// Width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::U8 | Self::I8 => 8,
            Self::U16 | Self::I16 => 16,
            Self::U32 | Self::I32 => 32,
            Self::U64 | Self::I64 => 64,
        }
    }

    /// Width in bytes.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        self.bits() / 8
    }

    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Smallest unsigned type holding `bits` bits (8..=64).
    #[must_use]
    pub const fn unsigned_for_bits(bits: u32) -> Self {
        match bits {
            0..=8 => Self::U8,
            9..=16 => Self::U16,
            17..=32 => Self::U32,
            _ => Self::U64,
        }
    }

    /// Source-level spelling ("u8", "i32", ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
        }
    }
}

impl fmt::Display for NumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a numeric type name is not recognized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown numeric type: {0}")]
pub struct UnknownNumType(pub String);

impl FromStr for NumType {
    type Err = UnknownNumType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            _ => return Err(UnknownNumType(s.to_string())),
        })
    }
}

/// Undecorated types.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseType {
    Num(NumType),
    Bool,
    /// Byte-stream reader capability.
    Reader,
    /// Byte-stream writer capability.
    Writer,
    ImageConfig,
    /// The value of calls made only for their effect.
    Empty,
    /// A struct declared in the package being generated.
    Struct(String),
}

/// Type descriptor: decorators wrapping a base type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    Base(BaseType),
    /// Non-null pointer.
    Ptr(Box<Self>),
    /// Nullable pointer.
    Nptr(Box<Self>),
    Slice(Box<Self>),
    Array { len: u64, inner: Box<Self> },
    Table(Box<Self>),
}

/// Which family of built-in methods a value supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Numeric(NumType),
    Slice,
    Table,
    Reader,
    Writer,
    /// Pointer to an image configuration (only `initialize`).
    ImageConfigPtr,
    Other,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Slice => f.write_str("slice"),
            Self::Table => f.write_str("table"),
            Self::Reader => f.write_str("io_reader"),
            Self::Writer => f.write_str("io_writer"),
            Self::ImageConfigPtr => f.write_str("ptr image_config"),
            Self::Other => f.write_str("other"),
        }
    }
}

impl TypeExpr {
    #[must_use]
    pub const fn num(n: NumType) -> Self {
        Self::Base(BaseType::Num(n))
    }

    #[must_use]
    pub const fn u8() -> Self {
        Self::num(NumType::U8)
    }

    #[must_use]
    pub const fn u16() -> Self {
        Self::num(NumType::U16)
    }

    #[must_use]
    pub const fn u32() -> Self {
        Self::num(NumType::U32)
    }

    #[must_use]
    pub const fn u64() -> Self {
        Self::num(NumType::U64)
    }

    #[must_use]
    pub const fn bool() -> Self {
        Self::Base(BaseType::Bool)
    }

    #[must_use]
    pub const fn reader() -> Self {
        Self::Base(BaseType::Reader)
    }

    #[must_use]
    pub const fn writer() -> Self {
        Self::Base(BaseType::Writer)
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::Base(BaseType::Empty)
    }

    #[must_use]
    pub fn strukt(name: &str) -> Self {
        Self::Base(BaseType::Struct(name.to_string()))
    }

    #[must_use]
    pub fn ptr(inner: Self) -> Self {
        Self::Ptr(Box::new(inner))
    }

    #[must_use]
    pub fn nptr(inner: Self) -> Self {
        Self::Nptr(Box::new(inner))
    }

    #[must_use]
    pub fn slice(inner: Self) -> Self {
        Self::Slice(Box::new(inner))
    }

    #[must_use]
    pub fn array(len: u64, inner: Self) -> Self {
        Self::Array {
            len,
            inner: Box::new(inner),
        }
    }

    #[must_use]
    pub fn table(inner: Self) -> Self {
        Self::Table(Box::new(inner))
    }

    /// `slice base.u8`, the common case.
    #[must_use]
    pub fn slice_u8() -> Self {
        Self::slice(Self::u8())
    }

    /// `table base.u8`.
    #[must_use]
    pub fn table_u8() -> Self {
        Self::table(Self::u8())
    }

    /// Classify the value for built-in method dispatch.
    #[must_use]
    pub fn capability(&self) -> Capability {
        match self {
            Self::Base(BaseType::Num(n)) => Capability::Numeric(*n),
            Self::Base(BaseType::Reader) => Capability::Reader,
            Self::Base(BaseType::Writer) => Capability::Writer,
            Self::Slice(_) => Capability::Slice,
            Self::Table(_) => Capability::Table,
            Self::Ptr(inner) | Self::Nptr(inner)
                if matches!(**inner, Self::Base(BaseType::ImageConfig)) =>
            {
                Capability::ImageConfigPtr
            }
            Self::Base(_) | Self::Ptr(_) | Self::Nptr(_) | Self::Array { .. } => {
                Capability::Other
            }
        }
    }

    /// The numeric type, if this is an undecorated integer.
    #[must_use]
    pub const fn num_type(&self) -> Option<NumType> {
        match self {
            Self::Base(BaseType::Num(n)) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Base(BaseType::Bool))
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Base(BaseType::Empty))
    }

    #[must_use]
    pub const fn is_pointer(&self) -> bool {
        matches!(self, Self::Ptr(_) | Self::Nptr(_))
    }

    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Base(BaseType::Reader | BaseType::Writer))
    }

    /// Element type of a slice, array or table.
    #[must_use]
    pub fn element(&self) -> Option<&Self> {
        match self {
            Self::Slice(inner) | Self::Table(inner) | Self::Array { inner, .. } => Some(inner),
            _ => None,
        }
    }

    /// Struct name behind a (possibly pointer-decorated) struct type.
    #[must_use]
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Self::Base(BaseType::Struct(name)) => Some(name),
            Self::Ptr(inner) | Self::Nptr(inner) => inner.struct_name(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base(BaseType::Num(n)) => write!(f, "base.{n}"),
            Self::Base(BaseType::Bool) => f.write_str("base.bool"),
            Self::Base(BaseType::Reader) => f.write_str("base.io_reader"),
            Self::Base(BaseType::Writer) => f.write_str("base.io_writer"),
            Self::Base(BaseType::ImageConfig) => f.write_str("base.image_config"),
            Self::Base(BaseType::Empty) => f.write_str("base.empty_struct"),
            Self::Base(BaseType::Struct(name)) => f.write_str(name),
            Self::Ptr(inner) => write!(f, "ptr {inner}"),
            Self::Nptr(inner) => write!(f, "nptr {inner}"),
            Self::Slice(inner) => write!(f, "slice {inner}"),
            Self::Array { len, inner } => write!(f, "array[{len}] {inner}"),
            Self::Table(inner) => write!(f, "table {inner}"),
        }
    }
}
