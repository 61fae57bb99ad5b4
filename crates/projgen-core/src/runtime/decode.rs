//! Evaluation of decoding expressions against a captured image.
//!
//! This is what a generated accessor does at run time, for the decodes that
//! need nothing but the buffer and the memory-read service. Projections of
//! user types, transformations and dynamic fields need the generated class
//! itself and are rejected.

use super::buffer::{MemoryBuffer, Value};
use super::memory::{read_string, MemoryReadService};
use crate::codegen::Decode;
use crate::error::{GenError, Result};
use crate::types::ProcessId;

/// Longest string [`decode`] reads behind a string pointer.
pub const MAX_STRING_CHARS: usize = 4096;

/// Where a value lives: its buffer, its offset inside it, and the process
/// string pointers are dereferenced in.
#[derive(Clone, Copy)]
pub struct DecodeTarget<'a>
{
    pub buffer: &'a MemoryBuffer,
    /// The instance's `memoryBufferOffset`
    pub buffer_offset: u64,
    pub process: ProcessId,
    pub service: &'a dyn MemoryReadService,
}

/// Evaluate `decode` for the instance at `target`.
///
/// Pointer decodes yield the pointer value itself.
///
/// ## Errors
///
/// - [`GenError::Decode`] for out-of-range reads and for decodes that need a
///   generated class (embedded projections, transformations, base classes,
///   dynamic fields)
/// - [`GenError::MemoryRead`] if a string pointer cannot be followed
pub fn decode(decode: &Decode, target: &DecodeTarget<'_>) -> Result<Value>
{
    let at = |offset: u64| {
        target
            .buffer_offset
            .checked_add(offset)
            .ok_or_else(|| GenError::Decode(format!("offset {offset} overflows the buffer offset")))
    };

    match decode {
        Decode::Primitive { kind, offset } => target.buffer.read_primitive(*kind, at(*offset)?),
        Decode::BitField {
            kind,
            offset,
            bit_position,
            bit_width,
        } => target
            .buffer
            .read_bits(*kind, at(*offset)?, *bit_position, *bit_width),
        Decode::PrimitiveArray { kind, offset, count } => {
            target.buffer.read_array(*kind, at(*offset)?, *count).map(Value::Array)
        }
        Decode::String {
            offset,
            pointer_size,
            char_width,
        } => {
            let pointer = target.buffer.read_pointer(at(*offset)?, *pointer_size)?;
            if pointer.is_null() {
                return Err(GenError::Decode(format!("string pointer at offset {offset} is null")));
            }
            read_string(
                target.service,
                target.process,
                pointer,
                *char_width,
                target.buffer.endian(),
                MAX_STRING_CHARS,
            )
            .map(Value::String)
        }
        Decode::Pointer {
            offset, pointer_size, ..
        } => target.buffer.read_pointer(at(*offset)?, *pointer_size).map(Value::Pointer),
        Decode::Embedded { target: class, .. }
        | Decode::Transformation { target: class, .. }
        | Decode::BaseClass { target: class, .. } => Err(GenError::Decode(format!(
            "decoding `{class}` requires its generated class"
        ))),
        Decode::Dynamic { expression } => Err(GenError::Decode(format!(
            "dynamic expression `{expression}` cannot be evaluated against a buffer"
        ))),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::codegen::BasicKind;
    use crate::runtime::memory::InMemoryProcess;
    use crate::types::Address;

    #[test]
    fn test_offsets_are_relative_to_buffer_offset()
    {
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&77i32.to_le_bytes());
        let buffer = MemoryBuffer::new(bytes);
        let memory = InMemoryProcess::new();
        let target = DecodeTarget {
            buffer: &buffer,
            buffer_offset: 8,
            process: ProcessId(1),
            service: &memory,
        };

        let value = decode(
            &Decode::Primitive {
                kind: BasicKind::Int,
                offset: 0,
            },
            &target,
        )
        .unwrap();
        assert_eq!(value, Value::Signed(77));
    }

    #[test]
    fn test_null_string_pointer_is_an_error()
    {
        let buffer = MemoryBuffer::new(vec![0u8; 8]);
        let memory = InMemoryProcess::new();
        let target = DecodeTarget {
            buffer: &buffer,
            buffer_offset: 0,
            process: ProcessId(1),
            service: &memory,
        };
        let string = Decode::String {
            offset: 0,
            pointer_size: 8,
            char_width: 1,
        };
        assert!(matches!(decode(&string, &target), Err(GenError::Decode(_))));
    }

    #[test]
    fn test_projections_need_generated_classes()
    {
        let buffer = MemoryBuffer::new(vec![0u8; 8]);
        let memory = InMemoryProcess::new();
        let target = DecodeTarget {
            buffer: &buffer,
            buffer_offset: 0,
            process: ProcessId(1),
            service: &memory,
        };
        let base = Decode::BaseClass {
            target: "Gen.B".to_string(),
            native_name: "B".to_string(),
        };
        assert!(decode(&base, &target).is_err());

        let pointer = Decode::Pointer {
            target: "Gen.Node".to_string(),
            field_name: "next".to_string(),
            offset: 0,
            pointer_size: 8,
            shared_metadata: true,
            downcast: false,
        };
        assert_eq!(decode(&pointer, &target).unwrap(), Value::Pointer(Address::ZERO));
    }
}
