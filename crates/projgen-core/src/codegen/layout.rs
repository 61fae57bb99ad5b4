//! # Layout Resolver
//!
//! Fixes where the primary base class sits inside a type, which decides
//! whether the generated type reuses its base's buffer triple or declares
//! its own.
//!
//! Every accessor offset is emitted relative to `memoryBufferOffset`, so the
//! base offset is never folded into field offsets. It is applied once, when a
//! constructor hands the buffer to the base.

use super::classify::{Classifier, TypeTree};
use crate::error::{GenError, Result};
use crate::symbols::TypeTable;
use crate::types::{BaseClass, TypeDescriptor};

/// Base-class facts of one generated type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutFacts
{
    /// Byte offset of the primary base inside this type (0 without a base)
    pub base_offset: u64,
    /// Shape of the base classes: `None` for a root type, `UserType`/`Enum`
    /// for one base, `MultiInheritance` for several
    pub base: Option<TypeTree>,
}

impl LayoutFacts
{
    /// A type whose primary base is shifted declares its own buffer triple.
    pub fn owns_buffer(&self) -> bool
    {
        self.base_offset > 0
    }
}

/// Resolve the base layout of `descriptor`.
///
/// ## Errors
///
/// [`GenError::LayoutUnresolved`] when the primary base is virtual, has no
/// recorded offset, has a negative offset, or does not fit inside the type.
/// Errors classifying a base propagate unchanged.
pub fn resolve_layout(table: &TypeTable, classifier: &Classifier<'_>, descriptor: &TypeDescriptor) -> Result<LayoutFacts>
{
    let Some(primary) = descriptor.primary_base() else {
        return Ok(LayoutFacts {
            base_offset: 0,
            base: None,
        });
    };

    let base_offset = primary_offset(table, descriptor, primary)?;
    let primary_tree = classifier.classify_base(primary.ty)?;

    let base = if descriptor.bases.len() > 1 {
        let secondary = descriptor.bases[1..]
            .iter()
            .map(|base| classifier.classify_base(base.ty))
            .collect::<Result<Vec<_>>>()?;
        TypeTree::MultiInheritance {
            primary: Box::new(primary_tree),
            secondary,
        }
    } else {
        primary_tree
    };

    Ok(LayoutFacts {
        base_offset,
        base: Some(base),
    })
}

fn primary_offset(table: &TypeTable, descriptor: &TypeDescriptor, primary: &BaseClass) -> Result<u64>
{
    let unresolved = |reason: String| GenError::LayoutUnresolved {
        type_name: descriptor.name.clone(),
        reason,
    };
    let base = table.resolve(primary.ty, || format!("primary base of `{}`", descriptor.name))?;

    if primary.is_virtual {
        return Err(unresolved(format!("primary base `{}` is virtual", base.name)));
    }
    let offset = primary
        .offset
        .ok_or_else(|| unresolved(format!("offset of primary base `{}` is unknown", base.name)))?;
    let offset = u64::try_from(offset)
        .map_err(|_| unresolved(format!("primary base `{}` has negative offset {offset}", base.name)))?;

    match offset.checked_add(base.size) {
        Some(end) if end <= descriptor.size => Ok(offset),
        _ => Err(unresolved(format!(
            "primary base `{}` ({} bytes at offset {offset}) does not fit in {} bytes",
            base.name, base.size, descriptor.size
        ))),
    }
}
