//! Generation options.

use bitflags::bitflags;

bitflags! {
    /// Caching policy for generated accessors.
    ///
    /// Flags compose freely; no combination is rejected. A field can be both
    /// lazy and cached, and a static field is cached when either
    /// `CACHE_FIELDS` or `CACHE_STATIC_FIELDS` is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GenerationOptions: u32
    {
        /// Defer the first read until the property is accessed, then memoize
        const LAZY_CACHE_FIELDS = 1;
        /// Memoize instance fields after the first read
        const CACHE_FIELDS = 1 << 1;
        /// Memoize static fields after the first read
        const CACHE_STATIC_FIELDS = 1 << 2;
    }
}

impl GenerationOptions
{
    pub fn lazy(self) -> bool
    {
        self.contains(Self::LAZY_CACHE_FIELDS)
    }

    /// Whether a field's value is kept after its first computation.
    pub fn caches(self, is_static: bool) -> bool
    {
        self.contains(Self::CACHE_FIELDS) || (is_static && self.contains(Self::CACHE_STATIC_FIELDS))
    }
}

/// Naming of generated classes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingOptions
{
    /// Namespace prefix for every generated class (empty for none)
    pub namespace: String,
}
