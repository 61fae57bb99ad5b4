//! # Error Types
//!
//! Error handling for type projection.
//!
//! Only type-level failures are errors. Problems with individual fields are
//! not: the generator records them on the generated type as
//! [`SkippedField`](crate::codegen::SkippedField) entries and keeps going.
//!
//! We use `thiserror` to derive `Error` and the display messages.

use thiserror::Error;

use crate::types::{Address, TypeId};

/// Main error type for projection operations
///
/// ## Error Categories
///
/// 1. **Layout errors**: LayoutUnresolved
/// 2. **Symbol errors**: MissingType, UnknownTypeName, NotAUserType, InvalidSymbol
/// 3. **Runtime decode errors**: MemoryRead, Decode
/// 4. **Configuration errors**: Config, Io
#[derive(Error, Debug)]
pub enum GenError
{
    /// The base-class offset of a type could not be determined from its
    /// symbol data.
    ///
    /// Every field read of the type is relative to its buffer offset, so the
    /// type is not generated at all. Other types in the same batch are not
    /// affected.
    #[error("Layout of `{type_name}` could not be resolved: {reason}")]
    LayoutUnresolved
    {
        /// Native name of the type being generated
        type_name: String,
        /// What was missing or inconsistent
        reason: String,
    },

    /// A type handle points outside of the symbol table.
    #[error("Type {id} referenced by {context} is not in the symbol table")]
    MissingType
    {
        id: TypeId,
        /// Who referenced the handle (a type, field or base)
        context: String,
    },

    /// No type with the given native name is known.
    #[error("Unknown type name: {0}")]
    UnknownTypeName(String),

    /// Generation was requested for a type that has no user-type projection
    /// (a pointer, array, basic or enum type).
    #[error("`{type_name}` is a {tag} type and cannot be projected as a user type")]
    NotAUserType
    {
        type_name: String,
        tag: String,
    },

    /// Symbol input violates a structural rule (e.g. an array without an
    /// element type).
    #[error("Invalid symbol data: {0}")]
    InvalidSymbol(String),

    /// The memory-read collaborator could not supply the requested bytes.
    #[error("Failed to read {length} bytes at {address}: {reason}")]
    MemoryRead
    {
        address: Address,
        length: usize,
        reason: String,
    },

    /// A decoding expression could not be evaluated against a captured image.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error (reading configuration files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading a [`GeneratorConfig`](crate::config::GeneratorConfig).
#[derive(Error, Debug)]
pub enum ConfigError
{
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A transformation pattern is malformed (unterminated `${`, empty
    /// placeholder name, ...).
    #[error("Invalid transformation pattern `{pattern}`: {reason}")]
    InvalidPattern
    {
        pattern: String,
        reason: String,
    },

    /// The same native pattern was registered twice.
    #[error("Transformation for `{0}` registered more than once")]
    DuplicateTransformation(String),
}

/// Convenience type alias for `Result<T, GenError>`
///
/// ```rust
/// use projgen_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, GenError>;
