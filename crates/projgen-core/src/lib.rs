//! # projgen-core
//!
//! Projects native types, as described by debug metadata, into descriptors
//! of generated accessor classes that decode their fields straight out of a
//! captured memory buffer.
//!
//! The crate provides:
//! - The symbol data model and a shared, read-only type table
//! - Field classification, layout resolution and accessor synthesis
//! - Static-metadata sharing and the constructor set of each generated type
//! - Runtime read primitives to evaluate decodes against captured memory
//! - Padding analysis over the same symbol data
//!
//! ## Symbol Backends
//!
//! Reading PDB or DWARF files is not part of this crate. A backend fills a
//! [`TypeTableBuilder`](symbols::TypeTableBuilder) and everything else works
//! off the frozen [`TypeTable`](symbols::TypeTable).

pub mod analysis;
pub mod codegen;
pub mod config;
pub mod error;
pub mod prelude;
pub mod runtime;
pub mod symbols;
pub mod types;

// Re-export commonly used types
pub use codegen::{GeneratedType, Generator};
pub use config::GeneratorConfig;
pub use error::{ConfigError, GenError, Result};
pub use symbols::{TypeTable, TypeTableBuilder};
