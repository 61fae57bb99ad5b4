//! Tests for type generation

use std::sync::Once;

use projgen_core::codegen::{
    ConstructorKind, Decode, DynamicFieldFallback, FieldIssue, GenerationOptions, Generator, NamingOptions, ShapeGap,
    SupportKind, TransformationRegistry, TypeTree,
};
use projgen_core::error::GenError;
use projgen_core::symbols::{TypeTable, TypeTableBuilder};
use projgen_core::types::{BaseClass, FieldDescriptor, NativeBaseType, Projection, TypeDescriptor, TypeId};
use projgen_utils::{init_logging_with_level, LogFormat, LogLevel};

static LOGGING: Once = Once::new();

fn init_logging()
{
    LOGGING.call_once(|| {
        // Another test binary may already own the global subscriber
        let _ = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty);
    });
}

struct Program
{
    table: TypeTable,
    base: TypeId,
    derived: TypeId,
    shifted: TypeId,
    flags: TypeId,
    scene: TypeId,
    inner: TypeId,
    holder: TypeId,
    broken: TypeId,
    odd: TypeId,
}

fn program() -> Program
{
    let mut builder = TypeTableBuilder::new();
    let int = builder.add(TypeDescriptor::basic("int", NativeBaseType::Int, 4));
    let uint = builder.add(TypeDescriptor::basic("unsigned int", NativeBaseType::UInt, 4));
    let void = builder.add(TypeDescriptor::basic("void", NativeBaseType::Void, 0));
    let void_ptr = builder.add(TypeDescriptor::pointer("void*", void, 8));
    let color = builder.add(TypeDescriptor::enumeration("Color", 4));

    let base = builder.add(TypeDescriptor::class("Base", 8).with_field(FieldDescriptor::new("x", int, 0, 4)));
    let derived = builder.add(
        TypeDescriptor::class("Derived", 16)
            .with_base(BaseClass::at(base, 0))
            .with_field(FieldDescriptor::new("y", int, 8, 4)),
    );
    let shifted = builder.add(
        TypeDescriptor::class("Shifted", 24)
            .with_base(BaseClass::at(base, 8))
            .with_field(FieldDescriptor::new("z", int, 12, 4)),
    );
    let flags = builder.add(
        TypeDescriptor::structure("Flags", 8)
            .with_field(FieldDescriptor::bitfield("mode", uint, 4, 3, 2))
            .with_field(FieldDescriptor::new("handle", void_ptr, 0, 8))
            .with_field(FieldDescriptor::new("tint", color, 0, 4)),
    );

    let shape = builder.add(TypeDescriptor::class("Shape", 16).with_vtable());
    let shape_ptr = builder.add(TypeDescriptor::pointer("Shape*", shape, 8));
    builder.add(TypeDescriptor::class("Circle", 24).with_vtable().with_base(BaseClass::at(shape, 0)));
    let lonely = builder.add(TypeDescriptor::class("Lonely", 16).with_vtable());
    let lonely_ptr = builder.add(TypeDescriptor::pointer("Lonely*", lonely, 8));
    let scene = builder.add(
        TypeDescriptor::structure("Scene", 16)
            .with_field(FieldDescriptor::new("shape", shape_ptr, 0, 8))
            .with_field(FieldDescriptor::new("lonely", lonely_ptr, 8, 8)),
    );

    let base_ptr = builder.add(TypeDescriptor::pointer("Base*", base, 8));
    let outer = builder.add(TypeDescriptor::class("Outer<int>", 8).with_projection(Projection::Template));
    let leaf = builder.add(
        TypeDescriptor::structure("Outer<int>::Leaf", 4)
            .nested_in(outer)
            .with_field(FieldDescriptor::new("w", int, 0, 4)),
    );
    let inner = builder.add(
        TypeDescriptor::structure("Outer<int>::Inner", 24)
            .nested_in(outer)
            .with_field(FieldDescriptor::new("v", int, 0, 4))
            .with_field(FieldDescriptor::new("next", base_ptr, 8, 8))
            .with_field(FieldDescriptor::new("leaf", leaf, 16, 4)),
    );
    let holder =
        builder.add(TypeDescriptor::structure("Holder", 24).with_field(FieldDescriptor::new("inner", inner, 0, 24)));

    let broken = builder.add(TypeDescriptor::class("Broken", 16).with_base(BaseClass::virtual_base(base)));
    let odd = builder.add(
        TypeDescriptor::class("Odd", 16)
            .with_base(BaseClass::at(base, 0))
            .with_base(BaseClass::at(shape, 8)),
    );

    Program {
        table: builder.build().unwrap(),
        base,
        derived,
        shifted,
        flags,
        scene,
        inner,
        holder,
        broken,
        odd,
    }
}

#[test]
fn test_base_at_zero_reuses_buffer()
{
    init_logging();
    let p = program();
    let generated = Generator::new(&p.table).generate(p.derived).unwrap();

    assert_eq!(generated.base_offset, 0);
    assert!(!generated.owns_buffer());
    assert_eq!(generated.buffer_triple().count(), 0);
    assert_eq!(generated.fields.len(), 1);
    assert_eq!(
        generated.field("y").unwrap().expression(),
        "ReadInt(memoryBuffer, memoryBufferOffset + 8)"
    );
    assert!(matches!(generated.base, Some(TypeTree::UserType { id, .. }) if id == p.base));

    let base = Generator::new(&p.table).generate(p.base).unwrap();
    assert_eq!(base.fields.len(), 1);
    assert!(base.base.is_none());
}

#[test]
fn test_shifted_base_owns_buffer_triple()
{
    init_logging();
    let p = program();
    let generated = Generator::new(&p.table).generate(p.shifted).unwrap();

    assert_eq!(generated.base_offset, 8);
    let triple: Vec<&str> = generated.buffer_triple().map(|field| field.name.as_str()).collect();
    assert_eq!(triple, vec!["memoryBuffer", "memoryBufferOffset", "memoryBufferAddress"]);
    assert_eq!(
        generated.field("z").unwrap().expression(),
        "ReadInt(memoryBuffer, memoryBufferOffset + 12)"
    );

    let ctor = generated.constructor(ConstructorKind::FromVariableBuffer).unwrap();
    assert!(ctor.delegation.as_ref().unwrap().to_string().contains("offset + 8"));
    let ctor = generated.constructor(ConstructorKind::FromVariable).unwrap();
    assert!(ctor.delegation.as_ref().unwrap().to_string().contains(", 24)"));
}

#[test]
fn test_support_field_order()
{
    let p = program();
    let generated = Generator::new(&p.table).generate(p.derived).unwrap();
    let kinds: Vec<SupportKind> = generated.support_fields.iter().map(|field| field.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SupportKind::ClassCodeType,
            SupportKind::BaseClassString,
            SupportKind::PartialInitialize
        ]
    );
    assert_eq!(
        generated.support_field(SupportKind::ClassCodeType).unwrap().initializer.as_deref(),
        Some("CodeType.Create(\"Derived\")")
    );
    assert_eq!(generated.constructors.len(), 4);
}

#[test]
fn test_bitfield_and_unsupported_fields()
{
    init_logging();
    let p = program();
    let generated = Generator::new(&p.table).generate(p.flags).unwrap();

    assert_eq!(
        generated.field("mode").unwrap().expression(),
        "ReadUint(memoryBuffer, memoryBufferOffset + 4, 2, 3)"
    );
    assert!(generated.field("handle").is_none());
    assert!(generated.field("tint").is_none());

    let reasons: Vec<(&str, &FieldIssue)> = generated
        .skipped
        .iter()
        .map(|skip| (skip.name.as_str(), &skip.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("handle", &FieldIssue::UnsupportedShape(ShapeGap::NakedPointer)),
            ("tint", &FieldIssue::UnsupportedShape(ShapeGap::EnumField)),
        ]
    );
}

#[test]
fn test_dynamic_fallback_reads_through_this_class()
{
    let p = program();
    let generator = Generator::new(&p.table)
        .with_options(GenerationOptions::CACHE_FIELDS)
        .with_fallback(DynamicFieldFallback::default());
    let generated = generator.generate(p.flags).unwrap();

    let tint = generated.field("tint").unwrap();
    assert_eq!(tint.expression(), "thisClass.Value.GetField(\"tint\")");
    assert_eq!(tint.type_text, "Variable");
    assert!(tint.cache_result);
    assert!(generated.field("handle").is_none());
    assert!(generated.support_field(SupportKind::ThisClass).is_some());
}

#[test]
fn test_pointer_downcast_follows_derived_types()
{
    let p = program();
    let generated = Generator::new(&p.table).generate(p.scene).unwrap();

    let shape = generated.field("shape").unwrap();
    assert!(shape.expression().ends_with(".DowncastObject()"));
    assert!(matches!(shape.decode, Decode::Pointer { downcast: true, .. }));

    let lonely = generated.field("lonely").unwrap();
    assert!(!lonely.expression().contains("DowncastObject"));
    assert!(lonely.expression().starts_with("ReadPointer<Lonely>(ClassCodeType, \"lonely\""));
}

#[test]
fn test_template_nested_type_does_not_share()
{
    let p = program();
    let generated = Generator::new(&p.table).generate(p.inner).unwrap();

    assert!(!generated.shares_class_code_type);
    assert!(generated.support_field(SupportKind::ClassCodeType).is_none());
    assert!(generated.support_field(SupportKind::ThisClass).is_some());
    assert!(generated.support_field(SupportKind::FieldCodeTypeAlias).is_none());

    let next = generated.field("next").unwrap();
    assert_eq!(
        next.expression(),
        "ReadPointer<Base>(thisClass, \"next\", memoryBuffer, memoryBufferOffset + 8, 8)"
    );
    assert!(matches!(next.decode, Decode::Pointer { shared_metadata: false, .. }));

    let leaf = generated.field("leaf").unwrap();
    assert_eq!(
        leaf.expression(),
        "new Outer<int>.Leaf(memoryBuffer, memoryBufferOffset + 16, memoryBufferAddress, \
         thisClass.Value.GetCodeType().GetClassFieldType(\"leaf\"), \
         memoryBufferAddress + (ulong)(memoryBufferOffset + 16), \"leaf\")"
    );
}

#[test]
fn test_shared_owner_aliases_instance_metadata()
{
    let p = program();
    let generated = Generator::new(&p.table).generate(p.holder).unwrap();

    assert!(generated.shares_class_code_type);
    let inner = generated.field("inner").unwrap();
    assert!(inner.expression().contains(", inner_CodeType, "));

    let alias = generated.support_field(SupportKind::FieldCodeTypeAlias).unwrap();
    assert_eq!(alias.name, "inner_CodeType");
    assert!(alias.is_static);
    assert_eq!(
        alias.initializer.as_deref(),
        Some("ClassCodeType.GetClassFieldType(\"inner\")")
    );
}

#[test]
fn test_secondary_base_gets_member_accessor()
{
    let p = program();
    let generated = Generator::new(&p.table).generate(p.odd).unwrap();

    let base = generated.field("BaseClass_Shape").unwrap();
    assert_eq!(base.property_name, "BaseClass_Shape");
    assert_eq!(base.expression(), "thisClass.Value.GetBaseClass(\"Shape\").CastAs<Shape>()");
    assert!(generated.support_field(SupportKind::ThisClass).is_some());
    assert!(matches!(generated.base, Some(TypeTree::MultiInheritance { .. })));
}

#[test]
fn test_virtual_primary_base_is_unresolved()
{
    let p = program();
    let result = Generator::new(&p.table).generate(p.broken);
    assert!(matches!(result, Err(GenError::LayoutUnresolved { ref type_name, .. }) if type_name == "Broken"));
}

#[test]
fn test_non_user_type_is_rejected()
{
    let p = program();
    let int = p.table.id_of("int").unwrap();
    assert!(matches!(
        Generator::new(&p.table).generate(int),
        Err(GenError::NotAUserType { .. })
    ));
    assert!(matches!(
        Generator::new(&p.table).generate_named("Nope"),
        Err(GenError::UnknownTypeName(_))
    ));
}

#[test]
fn test_generation_is_idempotent()
{
    let p = program();
    let generator = Generator::new(&p.table).with_options(GenerationOptions::LAZY_CACHE_FIELDS);
    assert_eq!(generator.generate(p.holder).unwrap(), generator.generate(p.holder).unwrap());
    assert_eq!(generator.generate(p.scene).unwrap(), generator.generate(p.scene).unwrap());
}

#[test]
fn test_batch_isolates_failures()
{
    init_logging();
    let p = program();
    let ids = [p.derived, p.broken, p.shifted, p.scene];
    let generator = Generator::new(&p.table);

    let report = generator.generate_all(&ids);
    assert!(!report.is_complete());
    assert_eq!(report.generated.len(), 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].type_name, "Broken");
    assert!(report.find("Broken").is_none());
    assert!(report.find("Shifted").is_some());

    let parallel = generator.generate_all_parallel(&ids, 3);
    let names = |report: &projgen_core::codegen::BatchReport| {
        report
            .generated
            .iter()
            .map(|generated| generated.native_name.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(&parallel), vec!["Derived", "Shifted", "Scene"]);
    assert_eq!(names(&parallel), names(&report));
    assert_eq!(parallel.generated, report.generated);
}

#[test]
fn test_namespace_prefixes_class_names()
{
    let p = program();
    let generator = Generator::new(&p.table).with_naming(NamingOptions {
        namespace: "Gen".to_string(),
    });
    let generated = generator.generate(p.scene).unwrap();
    assert_eq!(generated.class_name, "Gen.Scene");
    assert!(generated.field("lonely").unwrap().expression().starts_with("ReadPointer<Gen.Lonely>"));
}

#[test]
fn test_generated_type_serializes()
{
    let p = program();
    let generated = Generator::new(&p.table).generate(p.shifted).unwrap();
    let json = serde_json::to_value(&generated).unwrap();

    assert_eq!(json["native_name"], "Shifted");
    assert_eq!(json["base_offset"], 8);
    assert_eq!(json["fields"].as_array().unwrap().len(), 1);
}

struct Gaps
{
    table: TypeTable,
    gaps: TypeId,
    tagged: TypeId,
    mixed: TypeId,
}

fn gaps() -> Gaps
{
    let mut builder = TypeTableBuilder::new();
    let int = builder.add(TypeDescriptor::basic("int", NativeBaseType::Int, 4));
    let wide = builder.add(TypeDescriptor::basic("__int128", NativeBaseType::Int, 16));
    let ch = builder.add(TypeDescriptor::basic("char", NativeBaseType::Char, 1));
    let text = builder.add(TypeDescriptor::pointer("const char*", ch, 8));
    let texts = builder.add(TypeDescriptor::array("const char*[2]", text, 16));
    let empty = builder.add(TypeDescriptor::basic("bool", NativeBaseType::Bool, 0));
    let empties = builder.add(TypeDescriptor::array("bool[0]", empty, 0));
    let point = builder.add(TypeDescriptor::structure("Point", 8).with_field(FieldDescriptor::new("x", int, 0, 4)));
    let points = builder.add(TypeDescriptor::array("Point[2]", point, 16));

    let size = builder.add(TypeDescriptor::structure("Größe", 4).with_field(FieldDescriptor::new("n", int, 0, 4)));
    let boxed =
        builder.add(TypeDescriptor::class("Box<Größe>", 8).with_field(FieldDescriptor::new("value", size, 0, 4)));
    let boxed_ptr = builder.add(TypeDescriptor::pointer("Box<Größe>*", boxed, 8));
    let handle = builder.add(TypeDescriptor::structure("Handle", 8));
    let handle_ptr = builder.add(TypeDescriptor::pointer("Handle*", handle, 8));

    let gaps = builder.add(
        TypeDescriptor::structure("Gaps", 96)
            .with_field(FieldDescriptor::new("boxed", boxed_ptr, 0, 8))
            .with_field(FieldDescriptor::new("handle", handle_ptr, 8, 8))
            .with_field(FieldDescriptor::new("inline_box", boxed, 16, 8))
            .with_field(FieldDescriptor::new("points", points, 24, 16))
            .with_field(FieldDescriptor::new("names", texts, 40, 16))
            .with_field(FieldDescriptor::new("none", empties, 56, 0))
            .with_field(FieldDescriptor::new("wide", wide, 64, 16)),
    );

    let color = builder.add(TypeDescriptor::enumeration("Color", 4));
    let tagged = builder.add(
        TypeDescriptor::class("Tagged", 8)
            .with_base(BaseClass::at(color, 0))
            .with_field(FieldDescriptor::new("x", int, 4, 4)),
    );
    let mixed = builder.add(
        TypeDescriptor::class("Mixed", 16)
            .with_base(BaseClass::at(point, 0))
            .with_base(BaseClass::at(color, 8)),
    );

    Gaps {
        table: builder.build().unwrap(),
        gaps,
        tagged,
        mixed,
    }
}

fn registry() -> TransformationRegistry
{
    let mut registry = TransformationRegistry::new();
    registry.register("Box<${T}>", "GenericBox<${T}>", false).unwrap();
    registry.register("Handle", "HandleView", true).unwrap();
    registry
}

fn skipped(generated: &projgen_core::codegen::GeneratedType) -> Vec<(&str, &FieldIssue)>
{
    generated
        .skipped
        .iter()
        .map(|skip| (skip.name.as_str(), &skip.reason))
        .collect()
}

#[test]
fn test_unsupported_shapes_are_skipped_with_reason()
{
    init_logging();
    let g = gaps();
    let generated = Generator::new(&g.table)
        .with_transformations(registry())
        .generate(g.gaps)
        .unwrap();

    assert_eq!(
        skipped(&generated),
        vec![
            ("inline_box", &FieldIssue::UnsupportedShape(ShapeGap::EmbeddedTransformation)),
            ("points", &FieldIssue::UnsupportedShape(ShapeGap::NonBasicArray)),
            ("names", &FieldIssue::UnsupportedShape(ShapeGap::StringArray)),
            ("none", &FieldIssue::UnsupportedShape(ShapeGap::ZeroSizedElement)),
            ("wide", &FieldIssue::UnsupportedShape(ShapeGap::UnsupportedPrimitive)),
        ]
    );
    let names: Vec<&str> = generated.fields.iter().map(|field| field.storage_name.as_str()).collect();
    assert_eq!(names, vec!["_boxed", "_handle"]);
}

#[test]
fn test_pattern_transformation_with_non_ascii_argument()
{
    let g = gaps();
    let generated = Generator::new(&g.table)
        .with_transformations(registry())
        .generate(g.gaps)
        .unwrap();

    let boxed = generated.field("boxed").unwrap();
    assert!(boxed.type_text.starts_with("GenericBox<"));
    assert!(boxed.expression().starts_with(&format!("new {}(", boxed.type_text)));
}

#[test]
fn test_transformation_without_physical_constructor_gets_variable_only()
{
    let g = gaps();
    let generated = Generator::new(&g.table)
        .with_transformations(registry())
        .generate(g.gaps)
        .unwrap();

    let boxed = generated.field("boxed").unwrap();
    let variable = "Variable.CreateNoCast(ClassCodeType.GetClassFieldType(\"boxed\"), \
                    memoryBufferAddress + (ulong)(memoryBufferOffset + 0), \"boxed\")";
    assert!(matches!(boxed.decode, Decode::Transformation { physical: false, .. }));
    assert_eq!(boxed.simple_field_value.as_deref(), Some(variable));
    assert_eq!(boxed.expression(), format!("new {}({variable})", boxed.type_text));

    let handle = generated.field("handle").unwrap();
    assert_eq!(
        handle.expression(),
        "new HandleView(Variable.CreateNoCast(ClassCodeType.GetClassFieldType(\"handle\"), \
         memoryBufferAddress + (ulong)(memoryBufferOffset + 8), \"handle\"), \
         memoryBuffer, memoryBufferOffset + 8, memoryBufferAddress)"
    );
    assert!(generated.support_field(SupportKind::ThisClass).is_none());
}

#[test]
fn test_enum_bases_are_skipped()
{
    init_logging();
    let g = gaps();
    let generator = Generator::new(&g.table);

    let tagged = generator.generate(g.tagged).unwrap();
    assert!(matches!(tagged.base, Some(TypeTree::Enum { .. })));
    assert_eq!(tagged.field("x").unwrap().expression(), "ReadInt(memoryBuffer, memoryBufferOffset + 4)");
    assert_eq!(
        skipped(&tagged),
        vec![("Color", &FieldIssue::UnsupportedShape(ShapeGap::EnumBase))]
    );

    let mixed = generator.generate(g.mixed).unwrap();
    assert!(mixed.fields.is_empty());
    assert_eq!(
        skipped(&mixed),
        vec![("Color", &FieldIssue::UnsupportedShape(ShapeGap::EnumBase))]
    );
}
