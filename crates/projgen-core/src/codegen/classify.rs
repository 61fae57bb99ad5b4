//! # Type Tree Classifier
//!
//! Maps a field's declared native type to the single decoding shape the
//! synthesizer dispatches on. Rules are tried in order and the first match
//! wins:
//!
//! 1. primitives, strings (pointers to character data) and other raw
//!    pointers -> [`TypeTree::Basic`]
//! 2. fixed-size arrays -> [`TypeTree::Array`]
//! 3. types with a registered transformation -> [`TypeTree::Transformation`]
//! 4. enums -> [`TypeTree::Enum`]
//! 5. everything else -> [`TypeTree::UserType`]
//!
//! Pointers to user types and enums are classified by their pointee; whether
//! the field is embedded or reached through a pointer is a separate question
//! answered by [`is_embedded`].

use serde::Serialize;

use super::basic::BasicKind;
use super::options::NamingOptions;
use super::transform::{Transformation, TransformationRegistry};
use crate::error::{GenError, Result};
use crate::symbols::{names, TypeTable};
use crate::types::{TypeDescriptor, TypeId, TypeTag};

/// Decoding shape of a field or base class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeTree
{
    Basic(BasicKind),
    Array
    {
        element: Box<TypeTree>,
        count: u64,
    },
    /// Generated projection of a class, struct or union
    UserType
    {
        id: TypeId,
        class_name: String,
    },
    /// Hand-written decoder registered for the native type
    Transformation
    {
        transformation: Transformation,
        native: TypeId,
    },
    Enum
    {
        id: TypeId,
        class_name: String,
    },
    /// Base-class shape of a type with more than one direct base
    MultiInheritance
    {
        primary: Box<TypeTree>,
        secondary: Vec<TypeTree>,
    },
}

impl TypeTree
{
    /// Type text used for the generated member.
    pub fn type_string(&self) -> String
    {
        match self {
            TypeTree::Basic(kind) => kind.name().to_string(),
            TypeTree::Array { element, .. } => format!("{}[]", element.type_string()),
            TypeTree::UserType { class_name, .. } | TypeTree::Enum { class_name, .. } => class_name.clone(),
            TypeTree::Transformation { transformation, .. } => transformation.target.clone(),
            TypeTree::MultiInheritance { primary, .. } => primary.type_string(),
        }
    }

    /// The primary base of a base-class tree.
    pub fn primary(&self) -> &TypeTree
    {
        match self {
            TypeTree::MultiInheritance { primary, .. } => primary,
            other => other,
        }
    }

    /// Secondary bases of a base-class tree; empty for single inheritance.
    pub fn secondary(&self) -> &[TypeTree]
    {
        match self {
            TypeTree::MultiInheritance { secondary, .. } => secondary,
            _ => &[],
        }
    }
}

/// Whether a field's storage lives inline in its parent.
pub fn is_embedded(field_type: &TypeDescriptor) -> bool
{
    !field_type.is_pointer()
}

/// Classifies native types against one symbol table and transformation set.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a>
{
    table: &'a TypeTable,
    transformations: &'a TransformationRegistry,
    naming: &'a NamingOptions,
}

impl<'a> Classifier<'a>
{
    pub fn new(table: &'a TypeTable, transformations: &'a TransformationRegistry, naming: &'a NamingOptions) -> Self
    {
        Self {
            table,
            transformations,
            naming,
        }
    }

    /// Generated class name of a native type.
    pub fn class_name(&self, descriptor: &TypeDescriptor) -> String
    {
        names::class_name(&descriptor.name, &self.naming.namespace)
    }

    /// Classify the type behind `id`.
    ///
    /// ## Errors
    ///
    /// - [`GenError::MissingType`] if `id` or an element/pointee handle is dangling
    /// - [`GenError::InvalidSymbol`] for `void` used as a value type
    pub fn classify(&self, id: TypeId) -> Result<TypeTree>
    {
        let descriptor = self.table.resolve(id, || format!("classified type {id}"))?;

        match descriptor.tag {
            TypeTag::Basic(base) => BasicKind::from_native(base, descriptor.size)
                .map(TypeTree::Basic)
                .ok_or_else(|| GenError::InvalidSymbol(format!("`{}` has no value representation", descriptor.name))),
            TypeTag::Function => Ok(TypeTree::Basic(BasicKind::NakedPointer)),
            TypeTag::Pointer => self.classify_pointer(descriptor),
            TypeTag::Array => self.classify_array(descriptor),
            TypeTag::Class | TypeTag::Struct | TypeTag::Union | TypeTag::Enum => {
                if let Some(transformation) = self.transformations.lookup(&descriptor.name) {
                    return Ok(TypeTree::Transformation {
                        transformation,
                        native: id,
                    });
                }
                Ok(self.named(id, descriptor))
            }
        }
    }

    /// Classify a base class. Transformations never apply to bases.
    ///
    /// ## Errors
    ///
    /// [`GenError::InvalidSymbol`] if the base is not a class, struct, union
    /// or enum.
    pub fn classify_base(&self, id: TypeId) -> Result<TypeTree>
    {
        let descriptor = self.table.resolve(id, || format!("base class {id}"))?;
        match descriptor.tag {
            TypeTag::Class | TypeTag::Struct | TypeTag::Union | TypeTag::Enum => Ok(self.named(id, descriptor)),
            tag => Err(GenError::InvalidSymbol(format!(
                "`{}` is a {tag} type and cannot be a base class",
                descriptor.name
            ))),
        }
    }

    fn named(&self, id: TypeId, descriptor: &TypeDescriptor) -> TypeTree
    {
        let class_name = self.class_name(descriptor);
        if descriptor.tag == TypeTag::Enum {
            TypeTree::Enum { id, class_name }
        } else {
            TypeTree::UserType { id, class_name }
        }
    }

    fn classify_pointer(&self, pointer: &TypeDescriptor) -> Result<TypeTree>
    {
        let pointee_id = element_of(pointer)?;
        let pointee = self
            .table
            .resolve(pointee_id, || format!("pointee of `{}`", pointer.name))?;

        match pointee.tag {
            TypeTag::Basic(base) => match BasicKind::from_native(base, pointee.size) {
                Some(BasicKind::Char { width }) => Ok(TypeTree::Basic(BasicKind::String { char_width: width })),
                _ => Ok(TypeTree::Basic(BasicKind::NakedPointer)),
            },
            TypeTag::Class | TypeTag::Struct | TypeTag::Union | TypeTag::Enum => {
                let transformation = self
                    .transformations
                    .lookup(&pointer.name)
                    .or_else(|| self.transformations.lookup(&pointee.name));
                if let Some(transformation) = transformation {
                    return Ok(TypeTree::Transformation {
                        transformation,
                        native: pointee_id,
                    });
                }
                Ok(self.named(pointee_id, pointee))
            }
            TypeTag::Pointer | TypeTag::Array | TypeTag::Function => Ok(TypeTree::Basic(BasicKind::NakedPointer)),
        }
    }

    fn classify_array(&self, array: &TypeDescriptor) -> Result<TypeTree>
    {
        let element_id = element_of(array)?;
        let element = self
            .table
            .resolve(element_id, || format!("element type of `{}`", array.name))?;
        let count = array.size.checked_div(element.size).unwrap_or(0);

        Ok(TypeTree::Array {
            element: Box::new(self.classify(element_id)?),
            count,
        })
    }
}

fn element_of(descriptor: &TypeDescriptor) -> Result<TypeId>
{
    descriptor.element.ok_or_else(|| {
        GenError::InvalidSymbol(format!(
            "{} type `{}` has no element type",
            descriptor.tag, descriptor.name
        ))
    })
}
