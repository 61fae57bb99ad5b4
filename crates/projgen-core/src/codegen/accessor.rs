//! # Field Accessor Synthesizer
//!
//! Turns one classified field into an [`AccessorDescriptor`], or reports
//! the [`ShapeGap`] that kept it from having one.
//!
//! Dispatch is on the type tree and on whether the field is embedded:
//!
//! | Shape                    | Decode                                   |
//! |--------------------------|------------------------------------------|
//! | primitive                | [`Decode::Primitive`]                    |
//! | primitive bit-field      | [`Decode::BitField`]                     |
//! | string pointer           | [`Decode::String`]                       |
//! | array of primitives      | [`Decode::PrimitiveArray`], type `K[]`   |
//! | user type via pointer    | [`Decode::Pointer`] (+ downcast)         |
//! | embedded user type       | [`Decode::Embedded`]                     |
//! | transformation (pointer) | [`Decode::Transformation`]               |
//!
//! Static members, enums, embedded transformations, raw pointers and
//! arrays of anything but readable primitives produce no accessor.

use super::basic::BasicKind;
use super::classify::{is_embedded, Classifier, TypeTree};
use super::context::GenerationContext;
use super::descriptor::{Access, AccessorDescriptor, CodeTypeRef, Decode, ShapeGap};
use super::options::GenerationOptions;
use super::sharing::uses_shared_class_code_type;
use crate::error::{GenError, Result};
use crate::symbols::{names, TypeTable};
use crate::types::{FieldDescriptor, FieldLocation, TypeDescriptor};

/// Outcome of synthesizing one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis
{
    Accessor(AccessorDescriptor),
    Unsupported(ShapeGap),
}

/// Synthesizes accessors for the fields of one generated type.
#[derive(Debug)]
pub struct FieldSynthesizer<'a>
{
    table: &'a TypeTable,
    classifier: Classifier<'a>,
    options: GenerationOptions,
    /// The owning type uses a shared `ClassCodeType`
    shares: bool,
    class_simple_name: String,
}

impl<'a> FieldSynthesizer<'a>
{
    pub fn new(
        table: &'a TypeTable,
        classifier: Classifier<'a>,
        options: GenerationOptions,
        owner: &TypeDescriptor,
        shares: bool,
    ) -> Self
    {
        Self {
            table,
            classifier,
            options,
            shares,
            class_simple_name: names::simple_name(&owner.name),
        }
    }

    /// Synthesize the accessor for `field`.
    ///
    /// ## Errors
    ///
    /// Only symbol errors (dangling handles, malformed pointers) are
    /// returned; unsupported shapes come back as [`Synthesis::Unsupported`].
    pub fn synthesize(&self, field: &FieldDescriptor, context: &mut GenerationContext) -> Result<Synthesis>
    {
        if field.is_static() {
            return Ok(Synthesis::Unsupported(ShapeGap::StaticField));
        }

        let field_type = self
            .table
            .resolve(field.ty, || format!("field `{}`", field.name))?;
        let tree = self.classifier.classify(field.ty)?;

        let (decode, type_text) = match &tree {
            TypeTree::Basic(kind) => match Self::basic(field, field_type, *kind) {
                Ok(decode) => (decode, kind.name().to_string()),
                Err(gap) => return Ok(Synthesis::Unsupported(gap)),
            },
            TypeTree::Array { element, count } => match self.array(field, field_type, element, *count)? {
                Ok((decode, type_text)) => (decode, type_text),
                Err(gap) => return Ok(Synthesis::Unsupported(gap)),
            },
            TypeTree::UserType { id, class_name } => {
                if !self.shares {
                    context.mark_this_class();
                }
                let target = self
                    .table
                    .resolve(*id, || format!("target of field `{}`", field.name))?;
                let decode = if is_embedded(field_type) {
                    let code_type = if uses_shared_class_code_type(self.table, *id)? {
                        CodeTypeRef::SharedOf(class_name.clone())
                    } else if self.shares {
                        context.field_code_type_alias(&field.name)
                    } else {
                        CodeTypeRef::field_of(CodeTypeRef::Instance, field.name.as_str())
                    };
                    Decode::Embedded {
                        target: class_name.clone(),
                        offset: field.offset,
                        field_name: field.name.clone(),
                        code_type,
                    }
                } else {
                    Decode::Pointer {
                        target: class_name.clone(),
                        field_name: field.name.clone(),
                        offset: field.offset,
                        pointer_size: field_type.size,
                        shared_metadata: self.shares,
                        downcast: target.has_vtable && !target.derived.is_empty(),
                    }
                };
                (decode, class_name.clone())
            }
            TypeTree::Transformation { transformation, .. } => {
                if is_embedded(field_type) {
                    return Ok(Synthesis::Unsupported(ShapeGap::EmbeddedTransformation));
                }
                if !self.shares {
                    context.mark_this_class();
                }
                let decode = Decode::Transformation {
                    target: transformation.target.clone(),
                    field_name: field.name.clone(),
                    offset: field.offset,
                    holder: CodeTypeRef::own(self.shares),
                    physical: transformation.physical_constructor,
                };
                (decode, transformation.target.clone())
            }
            TypeTree::Enum { .. } => return Ok(Synthesis::Unsupported(ShapeGap::EnumField)),
            TypeTree::MultiInheritance { .. } => {
                return Err(GenError::InvalidSymbol(format!(
                    "field `{}` classified as a base-class tree",
                    field.name
                )))
            }
        };

        let simple_field_value = decode.field_variable();
        Ok(Synthesis::Accessor(AccessorDescriptor {
            storage_name: format!("_{}", field.name),
            property_name: names::property_name(&field.name, &self.class_simple_name),
            type_text,
            comment: format!("// {} {};", field_type.name, field.name),
            decode,
            access: Access::Public,
            is_static: false,
            cache_result: self.options.caches(false),
            lazy: self.options.lazy(),
            simple_field_value,
        }))
    }

    /// Synthesize the accessor exposing a secondary base sub-object.
    ///
    /// ## Errors
    ///
    /// Returns [`GenError::MissingType`] for a dangling base handle.
    pub fn synthesize_base(&self, base: &TypeTree, context: &mut GenerationContext) -> Result<Synthesis>
    {
        match base {
            TypeTree::UserType { id, class_name } => {
                let native = self.table.resolve(*id, || "secondary base class".to_string())?;
                let simple = names::simple_name(&native.name);
                context.mark_this_class();
                Ok(Synthesis::Accessor(AccessorDescriptor {
                    storage_name: format!("_BaseClass_{simple}"),
                    property_name: format!("BaseClass_{simple}"),
                    type_text: class_name.clone(),
                    comment: format!("// base class {}", native.name),
                    decode: Decode::BaseClass {
                        target: class_name.clone(),
                        native_name: native.name.clone(),
                    },
                    access: Access::Public,
                    is_static: false,
                    cache_result: self.options.caches(false),
                    lazy: self.options.lazy(),
                    simple_field_value: None,
                }))
            }
            TypeTree::Enum { .. } => Ok(Synthesis::Unsupported(ShapeGap::EnumBase)),
            other => Err(GenError::InvalidSymbol(format!(
                "`{}` cannot be a base class",
                other.type_string()
            ))),
        }
    }

    fn basic(
        field: &FieldDescriptor,
        field_type: &TypeDescriptor,
        kind: BasicKind,
    ) -> std::result::Result<Decode, ShapeGap>
    {
        match kind {
            BasicKind::String { char_width } => Ok(Decode::String {
                offset: field.offset,
                pointer_size: field_type.size,
                char_width,
            }),
            BasicKind::NakedPointer => Err(ShapeGap::NakedPointer),
            BasicKind::Opaque { .. } => Err(ShapeGap::UnsupportedPrimitive),
            kind => Ok(match field.location {
                FieldLocation::BitField { bit_position, bit_width } => Decode::BitField {
                    kind,
                    offset: field.offset,
                    bit_position,
                    bit_width,
                },
                FieldLocation::Normal | FieldLocation::Static => Decode::Primitive {
                    kind,
                    offset: field.offset,
                },
            }),
        }
    }

    fn array(
        &self,
        field: &FieldDescriptor,
        field_type: &TypeDescriptor,
        element: &TypeTree,
        count: u64,
    ) -> Result<std::result::Result<(Decode, String), ShapeGap>>
    {
        let kind = match element {
            TypeTree::Basic(BasicKind::String { .. }) => return Ok(Err(ShapeGap::StringArray)),
            TypeTree::Basic(kind) if kind.is_readable() => *kind,
            _ => return Ok(Err(ShapeGap::NonBasicArray)),
        };

        if let Some(element_id) = field_type.element {
            let element_type = self
                .table
                .resolve(element_id, || format!("element type of field `{}`", field.name))?;
            if element_type.size == 0 {
                return Ok(Err(ShapeGap::ZeroSizedElement));
            }
        }

        Ok(Ok((
            Decode::PrimitiveArray {
                kind,
                offset: field.offset,
                count,
            },
            format!("{}[]", kind.name()),
        )))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::codegen::options::NamingOptions;
    use crate::codegen::transform::TransformationRegistry;
    use crate::symbols::TypeTableBuilder;
    use crate::types::{BaseClass, NativeBaseType, Projection, TypeId};

    struct Fixture
    {
        table: TypeTable,
        owner: TypeId,
        int: TypeId,
        bool_: TypeId,
        name_ptr: TypeId,
        ints: TypeId,
        void_ptr: TypeId,
        shape_ptr: TypeId,
        point: TypeId,
        color: TypeId,
    }

    fn fixture(owner_projection: Projection) -> Fixture
    {
        let mut builder = TypeTableBuilder::new();
        let int = builder.add(TypeDescriptor::basic("int", NativeBaseType::Int, 4));
        let bool_ = builder.add(TypeDescriptor::basic("bool", NativeBaseType::Bool, 1));
        let ch = builder.add(TypeDescriptor::basic("char", NativeBaseType::Char, 1));
        let void = builder.add(TypeDescriptor::basic("void", NativeBaseType::Void, 0));
        let name_ptr = builder.add(TypeDescriptor::pointer("const char*", ch, 8));
        let ints = builder.add(TypeDescriptor::array("int[3]", int, 12));
        let void_ptr = builder.add(TypeDescriptor::pointer("void*", void, 8));
        let shape = builder.add(TypeDescriptor::class("Shape", 16).with_vtable());
        builder.add(
            TypeDescriptor::class("Circle", 24)
                .with_vtable()
                .with_base(BaseClass::at(shape, 0)),
        );
        let shape_ptr = builder.add(TypeDescriptor::pointer("Shape*", shape, 8));
        let point = builder.add(TypeDescriptor::structure("Point", 8));
        let color = builder.add(TypeDescriptor::enumeration("Color", 4));
        let owner = builder.add(TypeDescriptor::class("Owner", 64).with_projection(owner_projection));
        Fixture {
            table: builder.build().unwrap(),
            owner,
            int,
            bool_,
            name_ptr,
            ints,
            void_ptr,
            shape_ptr,
            point,
            color,
        }
    }

    fn run(f: &Fixture, field: &FieldDescriptor, shares: bool, context: &mut GenerationContext) -> Synthesis
    {
        let registry = TransformationRegistry::new();
        let naming = NamingOptions::default();
        let classifier = Classifier::new(&f.table, &registry, &naming);
        let owner = f.table.get(f.owner).unwrap();
        let synthesizer = FieldSynthesizer::new(&f.table, classifier, GenerationOptions::CACHE_FIELDS, owner, shares);
        synthesizer.synthesize(field, context).unwrap()
    }

    fn accessor(synthesis: Synthesis) -> AccessorDescriptor
    {
        match synthesis {
            Synthesis::Accessor(accessor) => accessor,
            Synthesis::Unsupported(gap) => panic!("expected accessor, got {gap:?}"),
        }
    }

    #[test]
    fn test_primitive_field_metadata()
    {
        let f = fixture(Projection::Physical);
        let mut context = GenerationContext::new();
        let field = FieldDescriptor::new("count", f.int, 12, 4);
        let accessor = accessor(run(&f, &field, true, &mut context));

        assert_eq!(accessor.storage_name, "_count");
        assert_eq!(accessor.property_name, "count");
        assert_eq!(accessor.type_text, "int");
        assert_eq!(accessor.comment, "// int count;");
        assert_eq!(accessor.expression(), "ReadInt(memoryBuffer, memoryBufferOffset + 12)");
        assert!(accessor.cache_result);
        assert!(!accessor.lazy);
    }

    #[test]
    fn test_bitfield_includes_position_and_width()
    {
        let f = fixture(Projection::Physical);
        let mut context = GenerationContext::new();
        let field = FieldDescriptor::bitfield("flag", f.bool_, 4, 7, 1);
        let accessor = accessor(run(&f, &field, true, &mut context));
        assert_eq!(accessor.expression(), "ReadBool(memoryBuffer, memoryBufferOffset + 4, 1, 7)");
    }

    #[test]
    fn test_string_and_array_fields()
    {
        let f = fixture(Projection::Physical);
        let mut context = GenerationContext::new();

        let name = accessor(run(&f, &FieldDescriptor::new("name", f.name_ptr, 16, 8), true, &mut context));
        assert_eq!(
            name.expression(),
            "ReadString(GetCodeType().Module.Process, ReadPointer(memoryBuffer, memoryBufferOffset + 16, 8), 1)"
        );
        assert_eq!(name.type_text, "string");

        let values = accessor(run(&f, &FieldDescriptor::new("values", f.ints, 24, 12), true, &mut context));
        assert_eq!(values.expression(), "ReadIntArray(memoryBuffer, memoryBufferOffset + 24, 3)");
        assert_eq!(values.type_text, "int[]");
    }

    #[test]
    fn test_unsupported_shapes()
    {
        let f = fixture(Projection::Physical);
        let mut context = GenerationContext::new();

        let raw = FieldDescriptor::new("raw", f.void_ptr, 0, 8);
        assert_eq!(run(&f, &raw, true, &mut context), Synthesis::Unsupported(ShapeGap::NakedPointer));
        let color = FieldDescriptor::new("color", f.color, 8, 4);
        assert_eq!(run(&f, &color, true, &mut context), Synthesis::Unsupported(ShapeGap::EnumField));
        let instances = FieldDescriptor::static_member("instances", f.int, 4);
        assert_eq!(run(&f, &instances, true, &mut context), Synthesis::Unsupported(ShapeGap::StaticField));
    }

    #[test]
    fn test_pointer_downcasts_polymorphic_targets()
    {
        let f = fixture(Projection::Physical);
        let mut context = GenerationContext::new();
        let field = FieldDescriptor::new("shape", f.shape_ptr, 32, 8);

        let shared = accessor(run(&f, &field, true, &mut context));
        assert_eq!(
            shared.expression(),
            "ReadPointer<Shape>(ClassCodeType, \"shape\", memoryBuffer, memoryBufferOffset + 32, 8).DowncastObject()"
        );
        assert!(!context.used_this_class());

        let instance = accessor(run(&f, &field, false, &mut context));
        assert!(instance.expression().starts_with("ReadPointer<Shape>(thisClass, "));
        assert!(context.used_this_class());
    }

    #[test]
    fn test_embedded_user_type_metadata_sources()
    {
        let f = fixture(Projection::Physical);
        let field = FieldDescriptor::new("origin", f.point, 40, 8);

        let mut context = GenerationContext::new();
        let embedded = accessor(run(&f, &field, true, &mut context));
        assert_eq!(
            embedded.expression(),
            "new Point(memoryBuffer, memoryBufferOffset + 40, memoryBufferAddress, Point.ClassCodeType, \
             memoryBufferAddress + (ulong)(memoryBufferOffset + 40), \"origin\")"
        );
        assert!(context.aliases().is_empty());
    }
}
