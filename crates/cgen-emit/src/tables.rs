//! Type, operator and status tables.

use cgen_ast::{AssignOp, BaseType, BinaryOp, NumType, TypeExpr, UnaryOp};

use crate::error::{GenError, Result};

/// Pointer decorators allowed on one type.
const MAX_POINTER_DEPTH: usize = 16;

/// C spelling of a numeric type.
#[must_use]
pub const fn c_num_type(n: NumType) -> &'static str {
    match n {
        NumType::U8 => "uint8_t",
        NumType::U16 => "uint16_t",
        NumType::U32 => "uint32_t",
        NumType::U64 => "uint64_t",
        NumType::I8 => "int8_t",
        NumType::I16 => "int16_t",
        NumType::I32 => "int32_t",
        NumType::I64 => "int64_t",
    }
}

/// C spelling of a unary operator.
#[must_use]
pub const fn c_unary_op(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => "+",
        UnaryOp::Minus => "-",
        UnaryOp::Not => "!",
        UnaryOp::Complement => "~",
    }
}

/// C spelling of a binary operator. `&^` has none; it is lowered to
/// `& ~` by the expression emitter.
#[must_use]
pub const fn c_binary_op(op: BinaryOp) -> Option<&'static str> {
    Some(match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
        BinaryOp::And => "&",
        BinaryOp::Or => "|",
        BinaryOp::Xor => "^",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Eq => "==",
        BinaryOp::Ge => ">=",
        BinaryOp::Gt => ">",
        BinaryOp::LogicalAnd => "&&",
        BinaryOp::LogicalOr => "||",
        BinaryOp::AndNot => return None,
    })
}

/// C spelling of an assignment operator. `&^=` has none.
#[must_use]
pub const fn c_assign_op(op: AssignOp) -> Option<&'static str> {
    Some(match op {
        AssignOp::Eq => "=",
        AssignOp::AddEq => "+=",
        AssignOp::SubEq => "-=",
        AssignOp::MulEq => "*=",
        AssignOp::DivEq => "/=",
        AssignOp::ModEq => "%=",
        AssignOp::ShlEq => "<<=",
        AssignOp::ShrEq => ">>=",
        AssignOp::AndEq => "&=",
        AssignOp::OrEq => "|=",
        AssignOp::XorEq => "^=",
        AssignOp::AndNotEq => return None,
    })
}

/// Status codes returned by generated functions. Odd values are hard errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    ErrorBadVersion,
    ErrorNullReceiver,
    ErrorConstructorNotCalled,
    StatusShortDst,
    StatusShortSrc,
    SuspensionShortRead,
    SuspensionShortWrite,
}

impl Status {
    pub const ALL: [Self; 8] = [
        Self::Ok,
        Self::ErrorBadVersion,
        Self::ErrorNullReceiver,
        Self::ErrorConstructorNotCalled,
        Self::StatusShortDst,
        Self::StatusShortSrc,
        Self::SuspensionShortRead,
        Self::SuspensionShortWrite,
    ];

    #[must_use]
    pub const fn value(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::ErrorBadVersion => -1,
            Self::ErrorNullReceiver => -3,
            Self::ErrorConstructorNotCalled => -5,
            Self::StatusShortDst => -8,
            Self::StatusShortSrc => -10,
            Self::SuspensionShortRead => -12,
            Self::SuspensionShortWrite => -14,
        }
    }

    /// Upper-case suffix of the C constant.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Ok => "STATUS_OK",
            Self::ErrorBadVersion => "ERROR_BAD_VERSION",
            Self::ErrorNullReceiver => "ERROR_NULL_RECEIVER",
            Self::ErrorConstructorNotCalled => "ERROR_CONSTRUCTOR_NOT_CALLED",
            Self::StatusShortDst => "STATUS_SHORT_DST",
            Self::StatusShortSrc => "STATUS_SHORT_SRC",
            Self::SuspensionShortRead => "SUSPENSION_SHORT_READ",
            Self::SuspensionShortWrite => "SUSPENSION_SHORT_WRITE",
        }
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        self.value() & 1 != 0
    }

    /// `CGEN_<PKG>_<SUFFIX>`.
    #[must_use]
    pub fn c_name(self, pkg: &str) -> String {
        format!("CGEN_{}_{}", pkg.to_ascii_uppercase(), self.suffix())
    }
}

/// C type name (no declarator) of a non-array type.
///
/// `prefix` is the package prefix, `cgen_<pkg>_`, used for struct names.
pub fn c_type_name(prefix: &str, typ: &TypeExpr) -> Result<String> {
    let mut stars = 0;
    let mut t = typ;
    while let TypeExpr::Ptr(inner) | TypeExpr::Nptr(inner) = t {
        stars += 1;
        if stars > MAX_POINTER_DEPTH {
            return Err(GenError::UnsupportedType(format!("{typ}: too many pointers")));
        }
        t = inner;
    }
    let base = match t {
        TypeExpr::Base(BaseType::Num(n)) => c_num_type(*n).to_string(),
        TypeExpr::Base(BaseType::Bool) => "bool".to_string(),
        TypeExpr::Base(BaseType::Reader) => "cgen_base__io_reader".to_string(),
        TypeExpr::Base(BaseType::Writer) => "cgen_base__io_writer".to_string(),
        TypeExpr::Base(BaseType::ImageConfig) => "cgen_base__image_config".to_string(),
        TypeExpr::Base(BaseType::Empty) => "cgen_base__empty_struct".to_string(),
        TypeExpr::Base(BaseType::Struct(name)) => format!("{prefix}{name}"),
        TypeExpr::Slice(inner) if **inner == TypeExpr::u8() => "cgen_base__slice_u8".to_string(),
        TypeExpr::Table(inner) if **inner == TypeExpr::u8() => "cgen_base__table_u8".to_string(),
        TypeExpr::Array { .. } if stars > 0 => {
            return Err(GenError::UnsupportedType(format!("{typ}: pointer to array")));
        }
        _ => return Err(GenError::UnsupportedType(typ.to_string())),
    };
    Ok(format!("{base}{}", "*".repeat(stars)))
}

/// C declaration of `name` with type `typ`, e.g. `uint8_t v_buf[16]`.
pub fn c_decl(prefix: &str, typ: &TypeExpr, name: &str) -> Result<String> {
    let mut dims = String::new();
    let mut t = typ;
    while let TypeExpr::Array { len, inner } = t {
        dims.push_str(&format!("[{len}]"));
        t = inner;
    }
    Ok(format!("{} {name}{dims}", c_type_name(prefix, t)?))
}

/// Whether a value of this type is a plain C scalar (zeroed with `= 0`).
#[must_use]
pub const fn is_scalar(typ: &TypeExpr) -> bool {
    matches!(
        typ,
        TypeExpr::Base(BaseType::Num(_) | BaseType::Bool) | TypeExpr::Ptr(_) | TypeExpr::Nptr(_)
    )
}
