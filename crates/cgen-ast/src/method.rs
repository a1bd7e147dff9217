//! Method names.
//!
//! Built-in methods are recognized by name when the AST is built or loaded.
//! Anything else is a user method, resolved against the package later.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte order of a multi-byte reader/writer access.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    /// Suffix used in method and helper names.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Big => "be",
            Self::Little => "le",
        }
    }
}

/// Method of a call expression.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    // Numeric receivers.
    LowBits,
    HighBits,
    Max,
    Min,
    // Slices.
    Length,
    CopyFromSlice,
    Suffix,
    Prefix,
    // Tables.
    Height,
    Width,
    Stride,
    Row,
    // Readers.
    Read { bits: u32, endian: Endian },
    Peek { bits: u32, endian: Endian },
    Skip,
    SkipFast,
    SetMark,
    SinceMark,
    Position,
    UndoByte,
    CanUndoByte,
    // Writers.
    Write { bits: u32, endian: Endian },
    WriteFast { bits: u32, endian: Endian },
    CopyNFromHistory,
    CopyNFromHistoryFast,
    CopyNFromReader,
    CopyNFromSlice,
    // Readers and writers.
    SetLimit,
    Available,
    // Image configurations.
    Initialize,
    /// A method declared in the package.
    User(String),
}

/// Parse `u16le`, `u32be`, `u8`, ... into a width and byte order.
fn parse_width(s: &str) -> Option<(u32, Endian)> {
    let digits = s.strip_prefix('u')?;
    let (num, endian) = if let Some(n) = digits.strip_suffix("le") {
        (n, Endian::Little)
    } else if let Some(n) = digits.strip_suffix("be") {
        (n, Endian::Big)
    } else {
        (digits, Endian::Big)
    };
    let bits: u32 = num.parse().ok()?;
    if !(8..=64).contains(&bits) || bits % 8 != 0 {
        return None;
    }
    // Only single bytes may omit the byte order.
    if (bits == 8) != (num.len() == digits.len()) {
        return None;
    }
    Some((bits, endian))
}

impl Method {
    /// Parse a method name. Unknown names become [`Method::User`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let width = |prefix: &str| name.strip_prefix(prefix).and_then(parse_width);
        if let Some((bits, endian)) = width("read_") {
            return Self::Read { bits, endian };
        }
        if let Some((bits, endian)) = width("peek_") {
            return Self::Peek { bits, endian };
        }
        if let Some((bits, endian)) = width("write_fast_") {
            return Self::WriteFast { bits, endian };
        }
        if let Some((bits, endian)) = width("write_") {
            return Self::Write { bits, endian };
        }
        match name {
            "low_bits" => Self::LowBits,
            "high_bits" => Self::HighBits,
            "max" => Self::Max,
            "min" => Self::Min,
            "length" => Self::Length,
            "copy_from_slice" => Self::CopyFromSlice,
            "suffix" => Self::Suffix,
            "prefix" => Self::Prefix,
            "height" => Self::Height,
            "width" => Self::Width,
            "stride" => Self::Stride,
            "row" => Self::Row,
            "skip" => Self::Skip,
            "skip_fast" => Self::SkipFast,
            "mark" | "set_mark" => Self::SetMark,
            "since_mark" => Self::SinceMark,
            "position" => Self::Position,
            "undo_byte" => Self::UndoByte,
            "can_undo_byte" => Self::CanUndoByte,
            "copy_n_from_history" => Self::CopyNFromHistory,
            "copy_n_from_history_fast" => Self::CopyNFromHistoryFast,
            "copy_n_from_reader" => Self::CopyNFromReader,
            "copy_n_from_slice" => Self::CopyNFromSlice,
            "set_limit" => Self::SetLimit,
            "available" => Self::Available,
            "initialize" => Self::Initialize,
            other => Self::User(other.to_string()),
        }
    }

    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl From<String> for Method {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<Method> for String {
    fn from(m: Method) -> Self {
        m.to_string()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = |f: &mut fmt::Formatter<'_>, prefix: &str, bits: u32, endian: Endian| {
            if bits == 8 {
                write!(f, "{prefix}_u8")
            } else {
                write!(f, "{prefix}_u{bits}{}", endian.suffix())
            }
        };
        match self {
            Self::Read { bits, endian } => width(f, "read", *bits, *endian),
            Self::Peek { bits, endian } => width(f, "peek", *bits, *endian),
            Self::Write { bits, endian } => width(f, "write", *bits, *endian),
            Self::WriteFast { bits, endian } => width(f, "write_fast", *bits, *endian),
            Self::LowBits => f.write_str("low_bits"),
            Self::HighBits => f.write_str("high_bits"),
            Self::Max => f.write_str("max"),
            Self::Min => f.write_str("min"),
            Self::Length => f.write_str("length"),
            Self::CopyFromSlice => f.write_str("copy_from_slice"),
            Self::Suffix => f.write_str("suffix"),
            Self::Prefix => f.write_str("prefix"),
            Self::Height => f.write_str("height"),
            Self::Width => f.write_str("width"),
            Self::Stride => f.write_str("stride"),
            Self::Row => f.write_str("row"),
            Self::Skip => f.write_str("skip"),
            Self::SkipFast => f.write_str("skip_fast"),
            Self::SetMark => f.write_str("set_mark"),
            Self::SinceMark => f.write_str("since_mark"),
            Self::Position => f.write_str("position"),
            Self::UndoByte => f.write_str("undo_byte"),
            Self::CanUndoByte => f.write_str("can_undo_byte"),
            Self::CopyNFromHistory => f.write_str("copy_n_from_history"),
            Self::CopyNFromHistoryFast => f.write_str("copy_n_from_history_fast"),
            Self::CopyNFromReader => f.write_str("copy_n_from_reader"),
            Self::CopyNFromSlice => f.write_str("copy_n_from_slice"),
            Self::SetLimit => f.write_str("set_limit"),
            Self::Available => f.write_str("available"),
            Self::Initialize => f.write_str("initialize"),
            Self::User(name) => f.write_str(name),
        }
    }
}
