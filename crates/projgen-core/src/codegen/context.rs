//! Per-pass generation state.

use super::descriptor::CodeTypeRef;

/// Facts accumulated while synthesizing the fields of one type.
///
/// A context belongs to exactly one generation pass and is dropped with it,
/// so passes over different types never observe each other's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationContext
{
    used_this_class: bool,
    aliases: Vec<FieldCodeTypeAlias>,
}

/// A static field caching the metadata of one embedded field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCodeTypeAlias
{
    /// Native field whose metadata is cached
    pub field: String,
    /// Name of the generated static member
    pub alias: String,
}

impl GenerationContext
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Record that some accessor resolves metadata through `thisClass`.
    pub fn mark_this_class(&mut self)
    {
        self.used_this_class = true;
    }

    pub fn used_this_class(&self) -> bool
    {
        self.used_this_class
    }

    /// Alias field for the metadata of `field`, added on first request.
    pub fn field_code_type_alias(&mut self, field: &str) -> CodeTypeRef
    {
        if let Some(existing) = self.aliases.iter().find(|alias| alias.field == field) {
            return CodeTypeRef::Alias(existing.alias.clone());
        }
        let alias = format!("{field}_CodeType");
        self.aliases.push(FieldCodeTypeAlias {
            field: field.to_string(),
            alias: alias.clone(),
        });
        CodeTypeRef::Alias(alias)
    }

    pub fn aliases(&self) -> &[FieldCodeTypeAlias]
    {
        &self.aliases
    }
}
