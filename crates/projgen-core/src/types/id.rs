//! Handles into the shared type table.

use std::fmt;

use serde::Serialize;

/// Non-owning handle to a [`TypeDescriptor`](super::TypeDescriptor) in a
/// [`TypeTable`](crate::symbols::TypeTable).
///
/// Base, derived, element and enclosing-scope links are all expressed as
/// handles so descriptors never own each other and base/derived cycles are
/// impossible to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TypeId(u32);

impl TypeId
{
    pub(crate) fn from_index(index: usize) -> Self
    {
        // u32::MAX never resolves, so an oversized table fails lookups instead of aliasing.
        TypeId(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Position of the descriptor in its table.
    pub const fn index(self) -> usize
    {
        self.0 as usize
    }
}

impl fmt::Display for TypeId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "#{}", self.0)
    }
}
