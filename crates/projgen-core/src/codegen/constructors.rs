//! # Constructor Set Builder
//!
//! Every generated type gets the same four constructors, in this order:
//!
//! 1. the static constructor, which sets up shared metadata once
//! 2. `(Variable variable)`, which reads `size` bytes at the primary-base
//!    address and chains to the variable-plus-buffer constructor
//! 3. `(Variable variable, MemoryBuffer buffer, int offset, ulong bufferAddress)`
//! 4. `(MemoryBuffer buffer, int offset, ulong bufferAddress, CodeType codeType,
//!    ulong address, string name, string path)`, the physical constructor every
//!    embedded construction reaches
//!
//! Constructors 3 and 4 hand the buffer to the base with the offset shifted
//! by the base offset when it is non-zero.

use super::descriptor::{ConstructorDescriptor, ConstructorKind, Delegation, Parameter};

const BASE_CLASS: &str = "variable.GetBaseClass(baseClassString)";

/// Build the constructor list for a type of `size` bytes.
pub fn build_constructors(size: u64, base_offset: u64) -> Vec<ConstructorDescriptor>
{
    let offset = shifted_offset(base_offset);

    vec![
        ConstructorDescriptor {
            kind: ConstructorKind::Static,
            is_static: true,
            parameters: Vec::new(),
            delegation: None,
            initializes_fields: true,
        },
        ConstructorDescriptor {
            kind: ConstructorKind::FromVariable,
            is_static: false,
            parameters: vec![Parameter::new("variable", "Variable")],
            delegation: Some(Delegation::This(vec![
                BASE_CLASS.to_string(),
                format!(
                    "Debugger.ReadMemory(variable.GetCodeType().Module.Process, {BASE_CLASS}.GetPointerAddress(), {size})"
                ),
                "0".to_string(),
                format!("{BASE_CLASS}.GetPointerAddress()"),
            ])),
            initializes_fields: false,
        },
        ConstructorDescriptor {
            kind: ConstructorKind::FromVariableBuffer,
            is_static: false,
            parameters: vec![
                Parameter::new("variable", "Variable"),
                Parameter::new("buffer", "MemoryBuffer"),
                Parameter::new("offset", "int"),
                Parameter::new("bufferAddress", "ulong"),
            ],
            delegation: Some(Delegation::Base(vec![
                "variable".to_string(),
                "buffer".to_string(),
                offset.clone(),
                "bufferAddress".to_string(),
            ])),
            initializes_fields: true,
        },
        ConstructorDescriptor {
            kind: ConstructorKind::FromBuffer,
            is_static: false,
            parameters: vec![
                Parameter::new("buffer", "MemoryBuffer"),
                Parameter::new("offset", "int"),
                Parameter::new("bufferAddress", "ulong"),
                Parameter::new("codeType", "CodeType"),
                Parameter::new("address", "ulong"),
                Parameter::new("name", "string").with_default("Variable.ComputedName"),
                Parameter::new("path", "string").with_default("Variable.UnknownPath"),
            ],
            delegation: Some(Delegation::Base(vec![
                "buffer".to_string(),
                offset,
                "bufferAddress".to_string(),
                "codeType".to_string(),
                "address".to_string(),
                "name".to_string(),
                "path".to_string(),
            ])),
            initializes_fields: true,
        },
    ]
}

fn shifted_offset(base_offset: u64) -> String
{
    if base_offset > 0 {
        format!("offset + {base_offset}")
    } else {
        "offset".to_string()
    }
}
