//! # Generator
//!
//! Orchestrates one generation pass per native type:
//!
//! 1. resolve the base layout (fatal for the type on failure)
//! 2. decide whether the type shares its `ClassCodeType`
//! 3. classify and synthesize every field, asking the fallback producer for
//!    fields without a physical decoding
//! 4. synthesize accessors for secondary bases
//! 5. list the support fields and constructors
//!
//! A pass either returns a complete [`GeneratedType`] or an error; nothing
//! is emitted for a type that fails. Batches run every requested type
//! independently, optionally across threads sharing the read-only
//! [`TypeTable`].
//!
//! ## Example
//!
//! ```rust
//! use projgen_core::codegen::{GenerationOptions, Generator};
//! use projgen_core::symbols::TypeTableBuilder;
//! use projgen_core::types::{BaseClass, FieldDescriptor, NativeBaseType, TypeDescriptor};
//!
//! let mut builder = TypeTableBuilder::new();
//! let int = builder.add(TypeDescriptor::basic("int", NativeBaseType::Int, 4));
//! let base = builder.add(TypeDescriptor::class("Base", 8).with_field(FieldDescriptor::new("x", int, 0, 4)));
//! let derived = builder.add(
//!     TypeDescriptor::class("Derived", 24)
//!         .with_base(BaseClass::at(base, 8))
//!         .with_field(FieldDescriptor::new("y", int, 0, 4)),
//! );
//! let table = builder.build()?;
//!
//! let generator = Generator::new(&table).with_options(GenerationOptions::CACHE_FIELDS);
//! let generated = generator.generate(derived)?;
//! assert_eq!(generated.base_offset, 8);
//! assert_eq!(generated.buffer_triple().count(), 3);
//! assert_eq!(generated.field("y").unwrap().expression(), "ReadInt(memoryBuffer, memoryBufferOffset + 0)");
//! # Ok::<(), projgen_core::error::GenError>(())
//! ```

use std::thread;

use tracing::{debug, info, span, warn, Level};

use super::accessor::{FieldSynthesizer, Synthesis};
use super::classify::{Classifier, TypeTree};
use super::constructors::build_constructors;
use super::context::GenerationContext;
use super::descriptor::{Access, FieldIssue, GeneratedType, ShapeGap, SkippedField, SupportField, SupportKind};
use super::fallback::{FallbackFieldProducer, FallbackRequest, OmitFields};
use super::layout::{resolve_layout, LayoutFacts};
use super::options::{GenerationOptions, NamingOptions};
use super::sharing::uses_shared_class_code_type;
use super::transform::TransformationRegistry;
use crate::error::{GenError, Result};
use crate::symbols::{names, TypeTable};
use crate::types::{TypeDescriptor, TypeId};

/// Generates accessor descriptors for types of one symbol table.
#[derive(Debug)]
pub struct Generator<'a>
{
    table: &'a TypeTable,
    options: GenerationOptions,
    naming: NamingOptions,
    transformations: TransformationRegistry,
    fallback: Box<dyn FallbackFieldProducer>,
}

impl<'a> Generator<'a>
{
    /// Generator with no caching flags, no namespace, no transformations and
    /// the [`OmitFields`] fallback.
    pub fn new(table: &'a TypeTable) -> Self
    {
        Self {
            table,
            options: GenerationOptions::empty(),
            naming: NamingOptions::default(),
            transformations: TransformationRegistry::new(),
            fallback: Box::new(OmitFields),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self
    {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_naming(mut self, naming: NamingOptions) -> Self
    {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn with_transformations(mut self, transformations: TransformationRegistry) -> Self
    {
        self.transformations = transformations;
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: impl FallbackFieldProducer + 'static) -> Self
    {
        self.fallback = Box::new(fallback);
        self
    }

    pub fn options(&self) -> GenerationOptions
    {
        self.options
    }

    pub fn table(&self) -> &'a TypeTable
    {
        self.table
    }

    /// Generate the descriptor of one user type.
    ///
    /// ## Errors
    ///
    /// - [`GenError::NotAUserType`] if `id` is not a class, struct or union
    /// - [`GenError::LayoutUnresolved`] if the primary base offset is unknown
    /// - [`GenError::MissingType`] / [`GenError::InvalidSymbol`] for broken
    ///   symbol references reached from the type
    pub fn generate(&self, id: TypeId) -> Result<GeneratedType>
    {
        let descriptor = self.table.resolve(id, || format!("generation request {id}"))?;
        if !descriptor.tag.is_user_type() {
            return Err(GenError::NotAUserType {
                type_name: descriptor.name.clone(),
                tag: descriptor.tag.to_string(),
            });
        }

        let span = span!(Level::DEBUG, "generate", type_name = %descriptor.name);
        let _guard = span.enter();

        let classifier = Classifier::new(self.table, &self.transformations, &self.naming);
        let layout = resolve_layout(self.table, &classifier, descriptor)?;
        let shares = uses_shared_class_code_type(self.table, id)?;
        debug!(base_offset = layout.base_offset, shares, "Resolved layout");

        let class_name = classifier.class_name(descriptor);
        let class_simple_name = names::simple_name(&descriptor.name);
        let synthesizer = FieldSynthesizer::new(self.table, classifier, self.options, descriptor, shares);
        let mut context = GenerationContext::new();
        let mut fields = Vec::new();
        let mut skipped = Vec::new();

        for field in &descriptor.fields {
            let gap = match synthesizer.synthesize(field, &mut context)? {
                Synthesis::Accessor(accessor) => {
                    fields.push(accessor);
                    continue;
                }
                Synthesis::Unsupported(gap) => gap,
            };

            let field_type = self.table.resolve(field.ty, || format!("field `{}`", field.name))?;
            let request = FallbackRequest {
                field,
                field_type,
                gap,
                shares,
                options: self.options,
                class_simple_name: &class_simple_name,
            };
            if let Some(accessor) = self.fallback.produce(&request, &mut context) {
                debug!(field = %field.name, reason = %gap, "Using fallback accessor");
                fields.push(accessor);
            } else {
                warn!(field = %field.name, reason = %gap, "Skipping field");
                skipped.push(SkippedField {
                    name: field.name.clone(),
                    reason: FieldIssue::UnsupportedShape(gap),
                });
            }
        }

        if let Some(base) = &layout.base {
            if let TypeTree::Enum { class_name, .. } = base.primary() {
                warn!(base = %class_name, "Enum base classes are not projected");
                skipped.push(SkippedField {
                    name: class_name.clone(),
                    reason: FieldIssue::UnsupportedShape(ShapeGap::EnumBase),
                });
            }
            for secondary in base.secondary() {
                match synthesizer.synthesize_base(secondary, &mut context)? {
                    Synthesis::Accessor(accessor) => fields.push(accessor),
                    Synthesis::Unsupported(gap) => {
                        warn!(base = %secondary.type_string(), reason = %gap, "Skipping base class");
                        skipped.push(SkippedField {
                            name: secondary.type_string(),
                            reason: FieldIssue::UnsupportedShape(gap),
                        });
                    }
                }
            }
        }

        let support_fields = support_fields(descriptor, &class_name, &layout, shares, &context);
        let constructors = build_constructors(descriptor.size, layout.base_offset);
        debug!(
            fields = fields.len(),
            skipped = skipped.len(),
            support = support_fields.len(),
            "Generated type"
        );

        Ok(GeneratedType {
            id,
            native_name: descriptor.name.clone(),
            class_name,
            size: descriptor.size,
            base_offset: layout.base_offset,
            shares_class_code_type: shares,
            base: layout.base,
            fields,
            support_fields,
            constructors,
            skipped,
        })
    }

    /// Generate a type looked up by its native name.
    ///
    /// ## Errors
    ///
    /// [`GenError::UnknownTypeName`] if no such type exists, otherwise as
    /// [`generate`](Self::generate).
    pub fn generate_named(&self, name: &str) -> Result<GeneratedType>
    {
        self.generate(self.table.id_of(name)?)
    }

    /// Generate every type in `ids`, collecting failures instead of stopping.
    pub fn generate_all(&self, ids: &[TypeId]) -> BatchReport
    {
        let outcomes = ids.iter().map(|&id| (id, self.generate(id))).collect();
        self.report(outcomes)
    }

    /// Like [`generate_all`](Self::generate_all), spread over up to
    /// `workers` threads. Output order matches `ids`.
    pub fn generate_all_parallel(&self, ids: &[TypeId], workers: usize) -> BatchReport
    {
        let workers = workers.clamp(1, ids.len().max(1));
        if workers == 1 {
            return self.generate_all(ids);
        }
        let chunk_size = ids.len().div_ceil(workers);

        let outcomes = thread::scope(|scope| {
            let handles: Vec<_> = ids
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || chunk.iter().map(|&id| (id, self.generate(id))).collect::<Vec<_>>())
                })
                .collect();

            let mut outcomes = Vec::with_capacity(ids.len());
            for handle in handles {
                match handle.join() {
                    Ok(chunk) => outcomes.extend(chunk),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            outcomes
        });
        self.report(outcomes)
    }

    fn report(&self, outcomes: Vec<(TypeId, Result<GeneratedType>)>) -> BatchReport
    {
        let mut report = BatchReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(generated) => report.generated.push(generated),
                Err(error) => {
                    let type_name = self
                        .table
                        .get(id)
                        .map_or_else(|| id.to_string(), |descriptor| descriptor.name.clone());
                    warn!(type_name = %type_name, %error, "Type generation failed");
                    report.failures.push(BatchFailure { id, type_name, error });
                }
            }
        }
        info!(
            generated = report.generated.len(),
            failed = report.failures.len(),
            "Batch generation finished"
        );
        report
    }
}

/// A type whose generation failed inside a batch.
#[derive(Debug)]
pub struct BatchFailure
{
    pub id: TypeId,
    pub type_name: String,
    pub error: GenError,
}

/// Result of a batch: the types that generated and those that did not.
#[derive(Debug, Default)]
pub struct BatchReport
{
    pub generated: Vec<GeneratedType>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport
{
    pub fn is_complete(&self) -> bool
    {
        self.failures.is_empty()
    }

    pub fn find(&self, native_name: &str) -> Option<&GeneratedType>
    {
        self.generated.iter().find(|generated| generated.native_name == native_name)
    }
}

fn support_fields(
    descriptor: &TypeDescriptor,
    class_name: &str,
    layout: &LayoutFacts,
    shares: bool,
    context: &GenerationContext,
) -> Vec<SupportField>
{
    let field = |kind, name: &str, type_text: &str, initializer: Option<String>| SupportField {
        kind,
        name: name.to_string(),
        type_text: type_text.to_string(),
        initializer,
        access: Access::Private,
        is_static: false,
        lazy: false,
        cache_result: true,
        hides_inherited: false,
    };
    let mut out = Vec::new();

    if context.used_this_class() {
        out.push(SupportField {
            lazy: true,
            ..field(
                SupportKind::ThisClass,
                "thisClass",
                "Variable",
                Some("GetBaseClass(baseClassString)".to_string()),
            )
        });
    }
    if shares {
        out.push(SupportField {
            access: Access::Public,
            is_static: true,
            ..field(
                SupportKind::ClassCodeType,
                "ClassCodeType",
                "CodeType",
                Some(format!("CodeType.Create(\"{}\")", descriptor.name)),
            )
        });
    }
    out.push(SupportField {
        is_static: true,
        ..field(
            SupportKind::BaseClassString,
            "baseClassString",
            "string",
            Some(format!("GetBaseClassString(typeof({class_name}))")),
        )
    });
    out.push(field(SupportKind::PartialInitialize, "PartialInitialize", "partial void", None));

    if layout.owns_buffer() {
        let triple = [
            (SupportKind::MemoryBuffer, "memoryBuffer", "MemoryBuffer", "buffer"),
            (SupportKind::MemoryBufferOffset, "memoryBufferOffset", "int", "offset"),
            (SupportKind::MemoryBufferAddress, "memoryBufferAddress", "ulong", "bufferAddress"),
        ];
        for (kind, name, type_text, initializer) in triple {
            out.push(SupportField {
                access: Access::Protected,
                hides_inherited: true,
                ..field(kind, name, type_text, Some(initializer.to_string()))
            });
        }
    }

    for alias in context.aliases() {
        out.push(SupportField {
            is_static: true,
            ..field(
                SupportKind::FieldCodeTypeAlias,
                &alias.alias,
                "CodeType",
                Some(format!("ClassCodeType.GetClassFieldType(\"{}\")", alias.field)),
            )
        });
    }
    out
}
