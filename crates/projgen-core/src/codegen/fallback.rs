//! # Fallback Field Producers
//!
//! When the synthesizer has no buffer-level accessor for a field, the
//! generator asks a [`FallbackFieldProducer`] instead of failing the type.
//! [`OmitFields`] is the default and leaves the field out; the generator
//! then records it as skipped. [`DynamicFieldFallback`] reads the field
//! through the dynamic variable API.

use std::fmt;

use super::context::GenerationContext;
use super::descriptor::{Access, AccessorDescriptor, CodeTypeRef, Decode, ShapeGap};
use super::options::GenerationOptions;
use crate::symbols::names;
use crate::types::{FieldDescriptor, TypeDescriptor};

/// A field the synthesizer could not express.
#[derive(Debug, Clone, Copy)]
pub struct FallbackRequest<'r>
{
    pub field: &'r FieldDescriptor,
    pub field_type: &'r TypeDescriptor,
    pub gap: ShapeGap,
    /// The owning type uses a shared `ClassCodeType`
    pub shares: bool,
    pub options: GenerationOptions,
    /// Simple name of the owning generated class
    pub class_simple_name: &'r str,
}

/// Produces accessors for fields without a physical decoding.
pub trait FallbackFieldProducer: fmt::Debug + Send + Sync
{
    /// Accessor for the field, or `None` to leave it out.
    fn produce(&self, request: &FallbackRequest<'_>, context: &mut GenerationContext) -> Option<AccessorDescriptor>;
}

/// Leaves unsupported fields out of the generated type.
#[derive(Debug, Clone, Copy, Default)]
pub struct OmitFields;

impl FallbackFieldProducer for OmitFields
{
    fn produce(&self, _request: &FallbackRequest<'_>, _context: &mut GenerationContext) -> Option<AccessorDescriptor>
    {
        None
    }
}

/// Reads unsupported fields through `GetField` / `GetStaticField`.
///
/// Raw pointers stay omitted unless `include_naked_pointers` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicFieldFallback
{
    pub include_naked_pointers: bool,
}

impl FallbackFieldProducer for DynamicFieldFallback
{
    fn produce(&self, request: &FallbackRequest<'_>, context: &mut GenerationContext) -> Option<AccessorDescriptor>
    {
        let field = request.field;
        if request.gap == ShapeGap::NakedPointer && !self.include_naked_pointers {
            return None;
        }

        let is_static = field.is_static();
        let expression = if is_static {
            if !request.shares {
                context.mark_this_class();
            }
            format!("{}.GetStaticField(\"{}\")", CodeTypeRef::own(request.shares), field.name)
        } else {
            context.mark_this_class();
            format!("thisClass.Value.GetField(\"{}\")", field.name)
        };

        Some(AccessorDescriptor {
            storage_name: format!("_{}", field.name),
            property_name: names::property_name(&field.name, request.class_simple_name),
            type_text: "Variable".to_string(),
            decode: Decode::Dynamic { expression },
            comment: format!("// {} {};", request.field_type.name, field.name),
            access: Access::Public,
            is_static,
            cache_result: request.options.caches(is_static),
            lazy: request.options.lazy(),
            simple_field_value: None,
        })
    }
}
