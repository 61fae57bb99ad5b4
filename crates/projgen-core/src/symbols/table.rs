//! # Type Table
//!
//! The shared symbol-resolution cache the generator reads from.
//!
//! A table is produced once by [`TypeTableBuilder`](super::TypeTableBuilder)
//! and is immutable afterwards. All links between descriptors are
//! [`TypeId`] handles into it.
//!
//! ## Thread Safety
//!
//! `TypeTable` is `Send + Sync`. Generators running on several threads share
//! one table by reference; the only interior mutability is the name index,
//! which is built at most once behind a `OnceCell`.

use std::collections::HashMap;

use once_cell::sync::OnceCell;

use crate::error::{GenError, Result};
use crate::types::{TypeDescriptor, TypeId};

/// Immutable collection of native type descriptors.
#[derive(Debug, Default)]
pub struct TypeTable
{
    types: Vec<TypeDescriptor>,
    name_index: OnceCell<HashMap<String, TypeId>>,
}

impl TypeTable
{
    pub(crate) fn from_descriptors(types: Vec<TypeDescriptor>) -> Self
    {
        Self {
            types,
            name_index: OnceCell::new(),
        }
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeDescriptor>
    {
        self.types.get(id.index())
    }

    /// Like [`get`](Self::get), but a dangling handle is an error naming
    /// `context` (the type, field or base that held it).
    ///
    /// ## Errors
    ///
    /// Returns [`GenError::MissingType`] if `id` is not in the table.
    pub fn resolve(&self, id: TypeId, context: impl FnOnce() -> String) -> Result<&TypeDescriptor>
    {
        self.get(id).ok_or_else(|| GenError::MissingType { id, context: context() })
    }

    /// Find a type by its native name.
    ///
    /// When a backend reports the same name twice (e.g. from two compilation
    /// units) the first registration wins.
    pub fn lookup(&self, name: &str) -> Option<TypeId>
    {
        self.name_index().get(name).copied()
    }

    /// ## Errors
    ///
    /// Returns [`GenError::UnknownTypeName`] if no type has that name.
    pub fn id_of(&self, name: &str) -> Result<TypeId>
    {
        self.lookup(name).ok_or_else(|| GenError::UnknownTypeName(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeDescriptor)>
    {
        self.types
            .iter()
            .enumerate()
            .map(|(index, descriptor)| (TypeId::from_index(index), descriptor))
    }

    /// Handles of every class, struct and union in the table.
    pub fn user_types(&self) -> impl Iterator<Item = TypeId> + '_
    {
        self.iter()
            .filter(|(_, descriptor)| descriptor.tag.is_user_type())
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize
    {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.types.is_empty()
    }

    fn name_index(&self) -> &HashMap<String, TypeId>
    {
        self.name_index.get_or_init(|| {
            let mut index = HashMap::with_capacity(self.types.len());
            for (id, descriptor) in self.iter() {
                index.entry(descriptor.name.clone()).or_insert(id);
            }
            index
        })
    }
}
