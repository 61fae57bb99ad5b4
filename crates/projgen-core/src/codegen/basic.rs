//! Primitive kinds the generated code can read directly out of a buffer.

use std::fmt;

use serde::Serialize;

use crate::types::NativeBaseType;

/// Primitive kind of a `Basic` type tree.
///
/// The canonical name is what generated code spells the type as; read
/// primitives are named `Read` + the canonical name with its first letter
/// upper-cased (`int` -> `ReadInt`, `ushort` -> `ReadUshort`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BasicKind
{
    Bool,
    /// Character of the given byte width (1, 2 or 4)
    Char
    {
        width: u8,
    },
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    /// Pointer to a NUL-terminated character string
    String
    {
        char_width: u8,
    },
    /// Pointer to anything that is not a user type or character data
    NakedPointer,
    /// Primitive with a width no read primitive exists for (`__int128`,
    /// 80-bit `long double`)
    Opaque
    {
        size: u64,
    },
}

impl BasicKind
{
    /// Map a backend primitive of `size` bytes to a kind.
    ///
    /// `Void` has no kind; it only appears behind pointers.
    pub fn from_native(base: NativeBaseType, size: u64) -> Option<Self>
    {
        let kind = match (base, size) {
            (NativeBaseType::Void, _) => return None,
            (NativeBaseType::Bool, _) => BasicKind::Bool,
            (NativeBaseType::Char | NativeBaseType::WChar | NativeBaseType::Char16 | NativeBaseType::Char32, 1) => {
                BasicKind::Char { width: 1 }
            }
            (NativeBaseType::Char | NativeBaseType::WChar | NativeBaseType::Char16 | NativeBaseType::Char32, 2) => {
                BasicKind::Char { width: 2 }
            }
            (NativeBaseType::Char | NativeBaseType::WChar | NativeBaseType::Char16 | NativeBaseType::Char32, 4) => {
                BasicKind::Char { width: 4 }
            }
            (NativeBaseType::Int, 1) => BasicKind::SByte,
            (NativeBaseType::Int, 2) => BasicKind::Short,
            (NativeBaseType::Int, 4) => BasicKind::Int,
            (NativeBaseType::Int, 8) => BasicKind::Long,
            (NativeBaseType::UInt, 1) => BasicKind::Byte,
            (NativeBaseType::UInt, 2) => BasicKind::UShort,
            (NativeBaseType::UInt, 4) => BasicKind::UInt,
            (NativeBaseType::UInt, 8) => BasicKind::ULong,
            (NativeBaseType::Float, 4) => BasicKind::Float,
            (NativeBaseType::Float, 8) => BasicKind::Double,
            (_, size) => BasicKind::Opaque { size },
        };
        Some(kind)
    }

    /// Type name used in generated code.
    pub fn name(self) -> &'static str
    {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Char { .. } => "char",
            BasicKind::SByte => "sbyte",
            BasicKind::Byte => "byte",
            BasicKind::Short => "short",
            BasicKind::UShort => "ushort",
            BasicKind::Int => "int",
            BasicKind::UInt => "uint",
            BasicKind::Long => "long",
            BasicKind::ULong => "ulong",
            BasicKind::Float => "float",
            BasicKind::Double => "double",
            BasicKind::String { .. } => "string",
            BasicKind::NakedPointer => "NakedPointer",
            BasicKind::Opaque { .. } => "opaque",
        }
    }

    /// Name of the read primitive for this kind (`ReadInt`).
    pub fn read_name(self) -> String
    {
        format!("Read{}", uppercase_first(self.name()))
    }

    /// Bytes occupied in a buffer, for kinds with a fixed width.
    pub fn byte_width(self) -> Option<usize>
    {
        match self {
            BasicKind::Bool | BasicKind::SByte | BasicKind::Byte => Some(1),
            BasicKind::Char { width } => Some(usize::from(width)),
            BasicKind::Short | BasicKind::UShort => Some(2),
            BasicKind::Int | BasicKind::UInt | BasicKind::Float => Some(4),
            BasicKind::Long | BasicKind::ULong | BasicKind::Double => Some(8),
            BasicKind::String { .. } | BasicKind::NakedPointer | BasicKind::Opaque { .. } => None,
        }
    }

    pub fn is_signed(self) -> bool
    {
        matches!(self, BasicKind::SByte | BasicKind::Short | BasicKind::Int | BasicKind::Long)
    }

    /// Kinds that have a buffer read primitive at all.
    pub fn is_readable(self) -> bool
    {
        !matches!(self, BasicKind::NakedPointer | BasicKind::Opaque { .. })
    }
}

impl fmt::Display for BasicKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// Upper-case the first character of `s`.
pub fn uppercase_first(s: &str) -> String
{
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_read_names()
    {
        assert_eq!(BasicKind::Int.read_name(), "ReadInt");
        assert_eq!(BasicKind::UShort.read_name(), "ReadUshort");
        assert_eq!(BasicKind::Char { width: 2 }.read_name(), "ReadChar");
        assert_eq!(uppercase_first(""), "");
    }

    #[test]
    fn test_native_mapping_uses_size()
    {
        assert_eq!(BasicKind::from_native(NativeBaseType::Int, 4), Some(BasicKind::Int));
        assert_eq!(BasicKind::from_native(NativeBaseType::UInt, 1), Some(BasicKind::Byte));
        assert_eq!(BasicKind::from_native(NativeBaseType::WChar, 2), Some(BasicKind::Char { width: 2 }));
        assert_eq!(BasicKind::from_native(NativeBaseType::Float, 10), Some(BasicKind::Opaque { size: 10 }));
        assert_eq!(BasicKind::from_native(NativeBaseType::Void, 0), None);
    }
}
