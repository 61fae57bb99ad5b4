//! # Static-Metadata Sharing Resolver
//!
//! Decides whether a generated type owns one class-level `ClassCodeType`
//! descriptor or must resolve its metadata through an instance.
//!
//! Only physical projections own one, and only when no type in their
//! lexical enclosing-scope chain is a template instantiation: a class nested
//! in `Outer<T>` exists once per instantiation, so a single static could not
//! describe all of them. Base classes play no part in this decision.

use crate::error::{GenError, Result};
use crate::symbols::TypeTable;
use crate::types::{Projection, TypeId};

/// Whether the type behind `id` uses a shared `ClassCodeType`.
///
/// ## Errors
///
/// - [`GenError::MissingType`] if a handle in the enclosing-scope chain is dangling
/// - [`GenError::InvalidSymbol`] if the chain loops back on itself
pub fn uses_shared_class_code_type(table: &TypeTable, id: TypeId) -> Result<bool>
{
    let descriptor = table.resolve(id, || format!("sharing query {id}"))?;
    if descriptor.projection != Projection::Physical {
        return Ok(false);
    }

    let mut current = Some(id);
    let mut steps = 0usize;
    while let Some(scope) = current {
        if steps > table.len() {
            return Err(GenError::InvalidSymbol(format!(
                "enclosing-scope chain of `{}` is cyclic",
                descriptor.name
            )));
        }
        let enclosing = table.resolve(scope, || format!("enclosing scope of `{}`", descriptor.name))?;
        if enclosing.projection == Projection::Template {
            return Ok(false);
        }
        current = enclosing.declared_in;
        steps += 1;
    }
    Ok(true)
}
