//! # Generated Type Descriptors
//!
//! The output of one generation pass: everything an emission backend needs
//! to render a generated class, and nothing it would have to recompute.
//!
//! Decoding expressions are kept structured ([`Decode`]) so callers can
//! inspect them or evaluate them against a captured image
//! ([`runtime::decode`](crate::runtime::decode)); their `Display` impl renders
//! the expression text generated code uses. All offsets in an expression are
//! relative to `memoryBufferOffset`.

use std::fmt;

use serde::Serialize;

use super::basic::BasicKind;
use super::classify::TypeTree;
use crate::types::TypeId;

/// Visibility of a generated member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Access
{
    #[default]
    Public,
    Protected,
    Private,
}

impl fmt::Display for Access
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        };
        f.write_str(label)
    }
}

/// Where an expression obtains a type's `CodeType` metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CodeTypeRef
{
    /// The generated type's own shared `ClassCodeType`
    Shared,
    /// Resolved through the instance's `thisClass` variable
    Instance,
    /// Another generated type's shared `ClassCodeType`
    SharedOf(String),
    /// A cached static alias field of the generated type
    Alias(String),
    /// Field metadata looked up on a holder
    FieldOf
    {
        holder: Box<CodeTypeRef>,
        field: String,
    },
}

impl CodeTypeRef
{
    /// The holder used for this type's own metadata.
    pub fn own(shared: bool) -> Self
    {
        if shared {
            CodeTypeRef::Shared
        } else {
            CodeTypeRef::Instance
        }
    }

    pub fn field_of(holder: CodeTypeRef, field: impl Into<String>) -> Self
    {
        CodeTypeRef::FieldOf {
            holder: Box::new(holder),
            field: field.into(),
        }
    }
}

impl fmt::Display for CodeTypeRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            CodeTypeRef::Shared => f.write_str("ClassCodeType"),
            CodeTypeRef::Instance => f.write_str("thisClass.Value.GetCodeType()"),
            CodeTypeRef::SharedOf(class_name) => write!(f, "{class_name}.ClassCodeType"),
            CodeTypeRef::Alias(alias) => f.write_str(alias),
            CodeTypeRef::FieldOf { holder, field } => write!(f, "{holder}.GetClassFieldType(\"{field}\")"),
        }
    }
}

/// A decoding expression for one generated member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Decode
{
    /// Whole primitive at `offset`
    Primitive
    {
        kind: BasicKind,
        offset: u64,
    },
    /// `bit_width` bits starting at `bit_position` of the unit at `offset`
    BitField
    {
        kind: BasicKind,
        offset: u64,
        bit_position: u32,
        bit_width: u32,
    },
    /// Pointer at `offset` to a NUL-terminated string read from the process
    String
    {
        offset: u64,
        pointer_size: u64,
        char_width: u8,
    },
    PrimitiveArray
    {
        kind: BasicKind,
        offset: u64,
        count: u64,
    },
    /// Pointer at `offset` to a projection of `target`
    Pointer
    {
        target: String,
        field_name: String,
        offset: u64,
        pointer_size: u64,
        /// Metadata holder is the shared `ClassCodeType` rather than `thisClass`
        shared_metadata: bool,
        /// Re-resolve the runtime type of the pointee
        downcast: bool,
    },
    /// Projection of `target` over this object's own buffer
    Embedded
    {
        target: String,
        offset: u64,
        field_name: String,
        code_type: CodeTypeRef,
    },
    /// Hand-written decoder constructed over a variable at the field address
    Transformation
    {
        target: String,
        field_name: String,
        offset: u64,
        holder: CodeTypeRef,
        /// Pass the buffer triple as well
        physical: bool,
    },
    /// Independently addressed secondary base sub-object
    BaseClass
    {
        target: String,
        native_name: String,
    },
    /// Expression supplied by a fallback producer
    Dynamic
    {
        expression: String,
    },
}

impl Decode
{
    /// Variable text handed to a transformation's decoder, when this is one.
    pub fn field_variable(&self) -> Option<String>
    {
        match self {
            Decode::Transformation {
                field_name,
                offset,
                holder,
                physical,
                ..
            } => {
                let mut variable = format!(
                    "Variable.CreateNoCast({holder}.GetClassFieldType(\"{field_name}\"), {}, \"{field_name}\")",
                    field_address(*offset)
                );
                if *physical {
                    variable.push_str(&format!(
                        ", memoryBuffer, memoryBufferOffset + {offset}, memoryBufferAddress"
                    ));
                }
                Some(variable)
            }
            _ => None,
        }
    }
}

fn field_address(offset: u64) -> String
{
    format!("memoryBufferAddress + (ulong)(memoryBufferOffset + {offset})")
}

impl fmt::Display for Decode
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Decode::Primitive { kind, offset } => {
                write!(f, "{}(memoryBuffer, memoryBufferOffset + {offset})", kind.read_name())
            }
            Decode::BitField {
                kind,
                offset,
                bit_position,
                bit_width,
            } => write!(
                f,
                "{}(memoryBuffer, memoryBufferOffset + {offset}, {bit_width}, {bit_position})",
                kind.read_name()
            ),
            Decode::String {
                offset,
                pointer_size,
                char_width,
            } => write!(
                f,
                "ReadString(GetCodeType().Module.Process, ReadPointer(memoryBuffer, memoryBufferOffset + {offset}, {pointer_size}), {char_width})"
            ),
            Decode::PrimitiveArray { kind, offset, count } => {
                write!(f, "{}Array(memoryBuffer, memoryBufferOffset + {offset}, {count}", kind.read_name())?;
                if let BasicKind::Char { width } = kind {
                    write!(f, ", {width}")?;
                }
                f.write_str(")")
            }
            Decode::Pointer {
                target,
                field_name,
                offset,
                pointer_size,
                shared_metadata,
                downcast,
            } => {
                let holder = if *shared_metadata { "ClassCodeType" } else { "thisClass" };
                write!(
                    f,
                    "ReadPointer<{target}>({holder}, \"{field_name}\", memoryBuffer, memoryBufferOffset + {offset}, {pointer_size})"
                )?;
                if *downcast {
                    f.write_str(".DowncastObject()")?;
                }
                Ok(())
            }
            Decode::Embedded {
                target,
                offset,
                field_name,
                code_type,
            } => write!(
                f,
                "new {target}(memoryBuffer, memoryBufferOffset + {offset}, memoryBufferAddress, {code_type}, {}, \"{field_name}\")",
                field_address(*offset)
            ),
            Decode::Transformation { target, .. } => {
                let variable = self.field_variable().unwrap_or_default();
                write!(f, "new {target}({variable})")
            }
            Decode::BaseClass { target, native_name } => {
                write!(f, "thisClass.Value.GetBaseClass(\"{native_name}\").CastAs<{target}>()")
            }
            Decode::Dynamic { expression } => f.write_str(expression),
        }
    }
}

/// One generated field accessor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AccessorDescriptor
{
    /// Backing storage member (`_` + native field name)
    pub storage_name: String,
    /// Public property the value is exposed through
    pub property_name: String,
    /// Declared result type text
    pub type_text: String,
    pub decode: Decode,
    /// Echo of the native declaration (`// int count;`)
    pub comment: String,
    pub access: Access,
    pub is_static: bool,
    /// Keep the value after the first computation
    pub cache_result: bool,
    /// Defer the first computation until first access
    pub lazy: bool,
    /// Plain field value a transformation was built from, if any
    pub simple_field_value: Option<String>,
}

impl AccessorDescriptor
{
    /// Rendered decoding expression.
    pub fn expression(&self) -> String
    {
        self.decode.to_string()
    }
}

/// Role of an auto-generated support member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SupportKind
{
    ThisClass,
    ClassCodeType,
    BaseClassString,
    PartialInitialize,
    MemoryBuffer,
    MemoryBufferOffset,
    MemoryBufferAddress,
    FieldCodeTypeAlias,
}

/// An auto-generated member that is not a native field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SupportField
{
    pub kind: SupportKind,
    pub name: String,
    pub type_text: String,
    /// Initializer text; `None` for the partial hook
    pub initializer: Option<String>,
    pub access: Access,
    pub is_static: bool,
    pub lazy: bool,
    pub cache_result: bool,
    /// Hides a member of the same name inherited from the base
    pub hides_inherited: bool,
}

impl SupportField
{
    pub fn is_buffer_triple(&self) -> bool
    {
        matches!(
            self.kind,
            SupportKind::MemoryBuffer | SupportKind::MemoryBufferOffset | SupportKind::MemoryBufferAddress
        )
    }
}

/// The four generated constructors, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConstructorKind
{
    /// One-time shared metadata setup
    Static,
    /// From an abstract variable handle
    FromVariable,
    /// From a variable plus an explicit buffer triple
    FromVariableBuffer,
    /// From a buffer triple with known metadata, address, name and path
    FromBuffer,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Parameter
{
    pub name: String,
    pub type_text: String,
    pub default: Option<String>,
}

impl Parameter
{
    pub fn new(name: &str, type_text: &str) -> Self
    {
        Self {
            name: name.to_string(),
            type_text: type_text.to_string(),
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: &str) -> Self
    {
        self.default = Some(default.to_string());
        self
    }
}

/// Constructor chaining target and argument texts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Delegation
{
    This(Vec<String>),
    Base(Vec<String>),
}

impl fmt::Display for Delegation
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let (target, args) = match self {
            Delegation::This(args) => ("this", args),
            Delegation::Base(args) => ("base", args),
        };
        write!(f, "{target}({})", args.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConstructorDescriptor
{
    pub kind: ConstructorKind,
    pub is_static: bool,
    pub parameters: Vec<Parameter>,
    pub delegation: Option<Delegation>,
    /// Field initializers run in this constructor's body
    pub initializes_fields: bool,
}

/// Why a field produced no accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ShapeGap
{
    /// Raw pointer that is neither a string nor a user type
    NakedPointer,
    EnumField,
    /// Transformation applied to an inline (non-pointer) field
    EmbeddedTransformation,
    /// Array whose element is not a readable primitive
    NonBasicArray,
    /// Inline array of string pointers
    StringArray,
    /// Array of zero-sized elements
    ZeroSizedElement,
    /// Static members have no buffer representation
    StaticField,
    EnumBase,
    /// Primitive without a read primitive of its width
    UnsupportedPrimitive,
}

impl fmt::Display for ShapeGap
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let reason = match self {
            ShapeGap::NakedPointer => "raw pointer without a decodable target",
            ShapeGap::EnumField => "enum-typed field",
            ShapeGap::EmbeddedTransformation => "transformation of an inline field",
            ShapeGap::NonBasicArray => "array of non-primitive elements",
            ShapeGap::StringArray => "array of string pointers",
            ShapeGap::ZeroSizedElement => "array of zero-sized elements",
            ShapeGap::StaticField => "static member",
            ShapeGap::EnumBase => "enum-typed base class",
            ShapeGap::UnsupportedPrimitive => "primitive without a read primitive",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldIssue
{
    UnsupportedShape(ShapeGap),
}

impl fmt::Display for FieldIssue
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            FieldIssue::UnsupportedShape(gap) => write!(f, "unsupported shape: {gap}"),
        }
    }
}

/// A member left out of the generated type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SkippedField
{
    pub name: String,
    pub reason: FieldIssue,
}

/// Everything generated for one native type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedType
{
    pub id: TypeId,
    pub native_name: String,
    pub class_name: String,
    pub size: u64,
    pub base_offset: u64,
    pub shares_class_code_type: bool,
    pub base: Option<TypeTree>,
    /// Field and base-member accessors in declaration order
    pub fields: Vec<AccessorDescriptor>,
    pub support_fields: Vec<SupportField>,
    pub constructors: Vec<ConstructorDescriptor>,
    pub skipped: Vec<SkippedField>,
}

impl GeneratedType
{
    /// The buffer triple support fields; empty when the base's is reused.
    pub fn buffer_triple(&self) -> impl Iterator<Item = &SupportField>
    {
        self.support_fields.iter().filter(|field| field.is_buffer_triple())
    }

    pub fn owns_buffer(&self) -> bool
    {
        self.base_offset > 0
    }

    /// Accessor for the native field `name`.
    pub fn field(&self, name: &str) -> Option<&AccessorDescriptor>
    {
        let storage = format!("_{name}");
        self.fields.iter().find(|field| field.storage_name == storage)
    }

    pub fn support_field(&self, kind: SupportKind) -> Option<&SupportField>
    {
        self.support_fields.iter().find(|field| field.kind == kind)
    }

    pub fn constructor(&self, kind: ConstructorKind) -> Option<&ConstructorDescriptor>
    {
        self.constructors.iter().find(|ctor| ctor.kind == kind)
    }
}
