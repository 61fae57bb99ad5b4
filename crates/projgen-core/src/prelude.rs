//! Common module for library exports

pub use crate::codegen::{
    AccessorDescriptor, DynamicFieldFallback, GeneratedType, GenerationOptions, Generator, NamingOptions, OmitFields,
    TransformationRegistry,
};
pub use crate::config::GeneratorConfig;
pub use crate::error::{GenError, Result};
pub use crate::runtime::{MemoryBuffer, MemoryReadService, Value};
pub use crate::symbols::{TypeTable, TypeTableBuilder};
pub use crate::types::{Address, BaseClass, FieldDescriptor, NativeBaseType, ProcessId, TypeDescriptor, TypeId};
