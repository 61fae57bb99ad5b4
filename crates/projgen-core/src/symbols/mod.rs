//! # Symbols
//!
//! The read-mostly symbol-resolution cache shared by every generation pass,
//! the builder that fills it, and helpers for native type names.
//!
//! Symbol backends (PDB, DWARF) are outside this crate. They translate their
//! records into [`TypeDescriptor`](crate::types::TypeDescriptor)s and feed them
//! to a [`TypeTableBuilder`].

pub mod builder;
pub mod names;
pub mod table;

pub use builder::TypeTableBuilder;
pub use table::TypeTable;
