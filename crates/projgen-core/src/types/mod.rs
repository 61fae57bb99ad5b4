//! # Types
//!
//! The symbol data model the generator consumes, plus the address and
//! process handles used by runtime reads.
//!
//! Symbol backends produce [`TypeDescriptor`]s; everything else in the crate
//! only reads them through a [`TypeTable`](crate::symbols::TypeTable).

pub mod address;
pub mod id;
pub mod process;
pub mod symbol;

// Re-export all public types
pub use address::Address;
pub use id::TypeId;
pub use process::ProcessId;
pub use symbol::{BaseClass, FieldDescriptor, FieldLocation, NativeBaseType, Projection, TypeDescriptor, TypeTag};
