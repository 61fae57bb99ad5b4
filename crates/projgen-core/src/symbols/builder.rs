//! # Type Table Builder
//!
//! Collects descriptors from a symbol backend and freezes them into a
//! [`TypeTable`].
//!
//! This is the only place the shared cache is mutated. Everything the
//! generator relies on being precomputed (derived-type lists, reference
//! validation) happens in [`build`](TypeTableBuilder::build), before any
//! generation fans out.
//!
//! ## Example
//!
//! ```rust
//! use projgen_core::symbols::TypeTableBuilder;
//! use projgen_core::types::{BaseClass, FieldDescriptor, NativeBaseType, TypeDescriptor};
//!
//! let mut builder = TypeTableBuilder::new();
//! let int = builder.add(TypeDescriptor::basic("int", NativeBaseType::Int, 4));
//! let base = builder.add(TypeDescriptor::class("Base", 8).with_field(FieldDescriptor::new("x", int, 0, 4)));
//! let derived = builder.add(TypeDescriptor::class("Derived", 16).with_base(BaseClass::at(base, 0)));
//!
//! let table = builder.build()?;
//! assert_eq!(table.get(base).unwrap().derived, vec![derived]);
//! # Ok::<(), projgen_core::error::GenError>(())
//! ```

use tracing::debug;

use super::TypeTable;
use crate::error::{GenError, Result};
use crate::types::{TypeDescriptor, TypeId, TypeTag};

/// Builder for a [`TypeTable`].
#[derive(Debug, Default)]
pub struct TypeTableBuilder
{
    types: Vec<TypeDescriptor>,
}

impl TypeTableBuilder
{
    #[must_use]
    pub fn new() -> Self
    {
        Self { types: Vec::new() }
    }

    /// Register a descriptor and return its handle.
    pub fn add(&mut self, descriptor: TypeDescriptor) -> TypeId
    {
        let id = TypeId::from_index(self.types.len());
        self.types.push(descriptor);
        id
    }

    /// Handle the next [`add`](Self::add) will return.
    pub fn next_id(&self) -> TypeId
    {
        TypeId::from_index(self.types.len())
    }

    /// Patch an already registered descriptor.
    ///
    /// Self-referential types need this: `struct Node { Node* next; }` is
    /// added first, then `Node*`, then the field pointing at it.
    pub fn descriptor_mut(&mut self, id: TypeId) -> Option<&mut TypeDescriptor>
    {
        self.types.get_mut(id.index())
    }

    /// Validate references, link derived types, and freeze the table.
    ///
    /// ## Errors
    ///
    /// - [`GenError::MissingType`] if any field, base, element or enclosing
    ///   scope handle points outside the table
    /// - [`GenError::InvalidSymbol`] if a pointer or array has no element type
    pub fn build(mut self) -> Result<TypeTable>
    {
        let count = self.types.len();
        for descriptor in &self.types {
            validate_references(descriptor, count)?;
        }

        let mut links = 0usize;
        for index in 0..count {
            let derived = TypeId::from_index(index);
            let bases: Vec<TypeId> = self.types[index].bases.iter().map(|base| base.ty).collect();
            for base in bases {
                self.types[base.index()].derived.push(derived);
                links += 1;
            }
        }
        for descriptor in &mut self.types {
            descriptor.derived.sort_unstable();
            descriptor.derived.dedup();
        }

        debug!("Built type table with {count} types and {links} inheritance links");
        Ok(TypeTable::from_descriptors(self.types))
    }
}

fn validate_references(descriptor: &TypeDescriptor, count: usize) -> Result<()>
{
    let check = |id: TypeId, context: &dyn Fn() -> String| {
        if id.index() < count {
            Ok(())
        } else {
            Err(GenError::MissingType { id, context: context() })
        }
    };

    for field in &descriptor.fields {
        check(field.ty, &|| format!("field `{}` of `{}`", field.name, descriptor.name))?;
    }
    for base in &descriptor.bases {
        check(base.ty, &|| format!("base class of `{}`", descriptor.name))?;
    }
    for derived in &descriptor.derived {
        check(*derived, &|| format!("derived list of `{}`", descriptor.name))?;
    }
    if let Some(outer) = descriptor.declared_in {
        check(outer, &|| format!("enclosing scope of `{}`", descriptor.name))?;
    }

    match (descriptor.tag, descriptor.element) {
        (TypeTag::Pointer | TypeTag::Array, None) => Err(GenError::InvalidSymbol(format!(
            "{} type `{}` has no element type",
            descriptor.tag, descriptor.name
        ))),
        (_, Some(element)) => check(element, &|| format!("element type of `{}`", descriptor.name)),
        _ => Ok(()),
    }
}
