//! Native type metadata as supplied by a symbol backend.
//!
//! PDB and DWARF readers are external; they enumerate types, fields, base
//! classes and offsets and hand them over in this shape. Descriptors are
//! immutable once they are in a [`TypeTable`](crate::symbols::TypeTable).

use std::fmt;

use smallvec::SmallVec;

use super::TypeId;

/// Primitive type classes reported by symbol backends.
///
/// The width of the primitive comes from the owning descriptor's size, the
/// same way PDB `btInt` + length or DWARF `DW_ATE_signed` + byte size do it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeBaseType
{
    Void,
    Bool,
    /// Plain `char`
    Char,
    /// `wchar_t`
    WChar,
    Char16,
    Char32,
    /// Signed integer of any width (`signed char` is a 1-byte `Int`)
    Int,
    /// Unsigned integer of any width (`unsigned char` is a 1-byte `UInt`)
    UInt,
    Float,
}

/// Structural tag of a native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag
{
    Class,
    Struct,
    Union,
    Enum,
    Pointer,
    Array,
    Basic(NativeBaseType),
    Function,
}

impl TypeTag
{
    /// Composite types that can be projected into a generated user type.
    pub const fn is_user_type(self) -> bool
    {
        matches!(self, TypeTag::Class | TypeTag::Struct | TypeTag::Union)
    }
}

impl fmt::Display for TypeTag
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            TypeTag::Class => "class",
            TypeTag::Struct => "struct",
            TypeTag::Union => "union",
            TypeTag::Enum => "enum",
            TypeTag::Pointer => "pointer",
            TypeTag::Array => "array",
            TypeTag::Basic(_) => "basic",
            TypeTag::Function => "function",
        };
        write!(f, "{label}")
    }
}

/// How the surrounding tool projects a native type into generated code.
///
/// Only `Physical` types decode straight out of a memory buffer; the other
/// strategies matter here because they change how nested physical types
/// resolve their metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Projection
{
    /// Buffer-backed projection generated by this crate
    #[default]
    Physical,
    /// Generic class generated for a template instantiation
    Template,
    /// Generated enum
    Enum,
    /// Projection that reads every field through the dynamic variable API
    Dynamic,
}

/// Where a field's bits live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldLocation
{
    /// Whole bytes at `offset`
    Normal,
    /// `bit_width` bits starting `bit_position` bits into the storage unit at `offset`
    BitField
    {
        bit_position: u32,
        bit_width: u32,
    },
    /// Class-level storage outside the instance
    Static,
}

/// A data member of a native type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor
{
    pub name: String,
    /// Byte offset from the start of the owning type
    pub offset: u64,
    /// Byte size of the declared type
    pub size: u64,
    pub ty: TypeId,
    pub location: FieldLocation,
}

impl FieldDescriptor
{
    pub fn new(name: impl Into<String>, ty: TypeId, offset: u64, size: u64) -> Self
    {
        Self {
            name: name.into(),
            offset,
            size,
            ty,
            location: FieldLocation::Normal,
        }
    }

    /// A bit-field member stored in the unit at `offset`.
    pub fn bitfield(name: impl Into<String>, ty: TypeId, offset: u64, bit_position: u32, bit_width: u32) -> Self
    {
        Self {
            name: name.into(),
            offset,
            size: u64::from(bit_width),
            ty,
            location: FieldLocation::BitField { bit_position, bit_width },
        }
    }

    /// A static data member.
    pub fn static_member(name: impl Into<String>, ty: TypeId, size: u64) -> Self
    {
        Self {
            name: name.into(),
            offset: 0,
            size,
            ty,
            location: FieldLocation::Static,
        }
    }

    pub const fn is_static(&self) -> bool
    {
        matches!(self.location, FieldLocation::Static)
    }
}

/// A direct base class and where it sits inside the derived type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseClass
{
    pub ty: TypeId,
    /// Byte offset of the base sub-object, `None` when the backend could not
    /// compute it (virtual bases)
    pub offset: Option<i64>,
    pub is_virtual: bool,
}

impl BaseClass
{
    pub const fn at(ty: TypeId, offset: i64) -> Self
    {
        Self {
            ty,
            offset: Some(offset),
            is_virtual: false,
        }
    }

    pub const fn virtual_base(ty: TypeId) -> Self
    {
        Self {
            ty,
            offset: None,
            is_virtual: true,
        }
    }
}

/// Everything the generator knows about one native type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor
{
    /// Fully qualified native name (`ns::Outer::Inner<int>`)
    pub name: String,
    pub size: u64,
    pub tag: TypeTag,
    pub fields: Vec<FieldDescriptor>,
    /// Direct bases in declaration order; the first one is the primary base
    pub bases: SmallVec<[BaseClass; 2]>,
    pub has_vtable: bool,
    /// Pointee of a pointer, element of an array
    pub element: Option<TypeId>,
    /// Lexically enclosing type, if this type is nested
    pub declared_in: Option<TypeId>,
    pub projection: Projection,
    /// Known derived types; filled in by [`TypeTableBuilder`](crate::symbols::TypeTableBuilder)
    pub derived: Vec<TypeId>,
}

impl TypeDescriptor
{
    fn with_tag(name: impl Into<String>, tag: TypeTag, size: u64) -> Self
    {
        let projection = if tag == TypeTag::Enum {
            Projection::Enum
        } else {
            Projection::Physical
        };
        Self {
            name: name.into(),
            size,
            tag,
            fields: Vec::new(),
            bases: SmallVec::new(),
            has_vtable: false,
            element: None,
            declared_in: None,
            projection,
            derived: Vec::new(),
        }
    }

    pub fn class(name: impl Into<String>, size: u64) -> Self
    {
        Self::with_tag(name, TypeTag::Class, size)
    }

    pub fn structure(name: impl Into<String>, size: u64) -> Self
    {
        Self::with_tag(name, TypeTag::Struct, size)
    }

    pub fn union(name: impl Into<String>, size: u64) -> Self
    {
        Self::with_tag(name, TypeTag::Union, size)
    }

    pub fn enumeration(name: impl Into<String>, size: u64) -> Self
    {
        Self::with_tag(name, TypeTag::Enum, size)
    }

    pub fn basic(name: impl Into<String>, base: NativeBaseType, size: u64) -> Self
    {
        Self::with_tag(name, TypeTag::Basic(base), size)
    }

    pub fn pointer(name: impl Into<String>, pointee: TypeId, size: u64) -> Self
    {
        let mut descriptor = Self::with_tag(name, TypeTag::Pointer, size);
        descriptor.element = Some(pointee);
        descriptor
    }

    /// Fixed-size array; `size` is the size of the whole array in bytes.
    pub fn array(name: impl Into<String>, element: TypeId, size: u64) -> Self
    {
        let mut descriptor = Self::with_tag(name, TypeTag::Array, size);
        descriptor.element = Some(element);
        descriptor
    }

    pub fn function(name: impl Into<String>) -> Self
    {
        Self::with_tag(name, TypeTag::Function, 0)
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self
    {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_base(mut self, base: BaseClass) -> Self
    {
        self.bases.push(base);
        self
    }

    #[must_use]
    pub fn with_vtable(mut self) -> Self
    {
        self.has_vtable = true;
        self
    }

    #[must_use]
    pub fn nested_in(mut self, outer: TypeId) -> Self
    {
        self.declared_in = Some(outer);
        self
    }

    #[must_use]
    pub fn with_projection(mut self, projection: Projection) -> Self
    {
        self.projection = projection;
        self
    }

    pub const fn is_pointer(&self) -> bool
    {
        matches!(self.tag, TypeTag::Pointer)
    }

    /// The primary (first) base class, if any.
    pub fn primary_base(&self) -> Option<&BaseClass>
    {
        self.bases.first()
    }
}
