//! # Configuration
//!
//! TOML configuration for a generation run.
//!
//! ```toml
//! namespace = "Generated"
//!
//! [options]
//! lazy_cache_fields = true
//! cache_fields = true
//!
//! [[transformation]]
//! native = "std::basic_string<${char},${traits},${alloc}>"
//! target = "StdString"
//! physical_constructor = true
//! ```
//!
//! Every key is optional. A missing `[options]` table means no caching, and
//! an empty namespace leaves generated class names unprefixed.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::codegen::{GenerationOptions, NamingOptions, TransformationRegistry};
use crate::error::{ConfigError, Result};

/// Parsed generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig
{
    /// Namespace prefix of generated classes
    pub namespace: String,
    pub options: OptionsSection,
    #[serde(rename = "transformation")]
    pub transformations: Vec<TransformationEntry>,
}

/// The `[options]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OptionsSection
{
    pub lazy_cache_fields: bool,
    pub cache_fields: bool,
    pub cache_static_fields: bool,
}

/// One `[[transformation]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransformationEntry
{
    /// Native type name or `${placeholder}` pattern
    pub native: String,
    /// Generated decoder type text
    pub target: String,
    #[serde(default)]
    pub physical_constructor: bool,
}

impl GeneratorConfig
{
    /// Parse a configuration document.
    ///
    /// ## Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML or mistyped keys.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigError>
    {
        let config: Self = toml::from_str(content)?;
        debug!(
            "Loaded configuration with {} transformations",
            config.transformations.len()
        );
        Ok(config)
    }

    /// Read and parse a configuration file.
    ///
    /// ## Errors
    ///
    /// - [`GenError::Io`](crate::error::GenError::Io) if the file cannot be read
    /// - [`GenError::Config`](crate::error::GenError::Config) if it does not parse
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self>
    {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_toml_str(&content)?)
    }

    pub fn generation_options(&self) -> GenerationOptions
    {
        let mut options = GenerationOptions::empty();
        options.set(GenerationOptions::LAZY_CACHE_FIELDS, self.options.lazy_cache_fields);
        options.set(GenerationOptions::CACHE_FIELDS, self.options.cache_fields);
        options.set(GenerationOptions::CACHE_STATIC_FIELDS, self.options.cache_static_fields);
        options
    }

    pub fn naming(&self) -> NamingOptions
    {
        NamingOptions {
            namespace: self.namespace.clone(),
        }
    }

    /// Build the registry from the `[[transformation]]` entries, in file order.
    ///
    /// ## Errors
    ///
    /// [`ConfigError::InvalidPattern`] or
    /// [`ConfigError::DuplicateTransformation`] for a bad entry.
    pub fn transformation_registry(&self) -> std::result::Result<TransformationRegistry, ConfigError>
    {
        let mut registry = TransformationRegistry::new();
        for entry in &self.transformations {
            registry.register(&entry.native, &entry.target, entry.physical_constructor)?;
        }
        Ok(registry)
    }

    /// Everything a [`Generator`](crate::codegen::Generator) is configured with.
    ///
    /// ## Errors
    ///
    /// As [`transformation_registry`](Self::transformation_registry).
    pub fn into_parts(self) -> Result<(GenerationOptions, TransformationRegistry, NamingOptions)>
    {
        let registry = self.transformation_registry()?;
        Ok((self.generation_options(), registry, self.naming()))
    }
}
