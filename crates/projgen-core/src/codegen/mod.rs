//! # Code Generation
//!
//! Projection of native user types into accessor descriptors.
//!
//! Components, leaves first:
//!
//! - [`classify`]: field type -> [`TypeTree`] shape
//! - [`layout`]: primary base offset and buffer ownership
//! - [`accessor`]: classified field -> [`AccessorDescriptor`]
//! - [`sharing`]: shared vs. instance-resolved `ClassCodeType`
//! - [`constructors`]: the fixed constructor set
//!
//! [`Generator`] runs them in order for each requested type.

pub mod accessor;
pub mod basic;
pub mod classify;
pub mod constructors;
pub mod context;
pub mod descriptor;
pub mod fallback;
pub mod generator;
pub mod layout;
pub mod options;
pub mod sharing;
pub mod transform;

pub use accessor::{FieldSynthesizer, Synthesis};
pub use basic::BasicKind;
pub use classify::{is_embedded, Classifier, TypeTree};
pub use constructors::build_constructors;
pub use context::{FieldCodeTypeAlias, GenerationContext};
pub use descriptor::{
    Access, AccessorDescriptor, CodeTypeRef, ConstructorDescriptor, ConstructorKind, Decode, Delegation, FieldIssue,
    GeneratedType, Parameter, ShapeGap, SkippedField, SupportField, SupportKind,
};
pub use fallback::{DynamicFieldFallback, FallbackFieldProducer, FallbackRequest, OmitFields};
pub use generator::{BatchFailure, BatchReport, Generator};
pub use layout::{resolve_layout, LayoutFacts};
pub use options::{GenerationOptions, NamingOptions};
pub use sharing::uses_shared_class_code_type;
pub use transform::{Transformation, TransformationRegistry};
