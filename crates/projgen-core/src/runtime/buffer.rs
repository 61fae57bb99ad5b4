//! # Memory Buffer
//!
//! A captured byte image of a value plus the read primitives generated
//! accessors call (`ReadInt`, `ReadUint` with bit extraction,
//! `ReadIntArray`, `ReadPointer`).
//!
//! Buffers are cheap to clone: the bytes sit behind an `Arc`, so embedded
//! projections share their parent's image the same way generated code
//! passes `memoryBuffer` down.

use std::fmt;
use std::sync::Arc;

use crate::codegen::BasicKind;
use crate::error::{GenError, Result};
use crate::types::Address;

/// Byte order of the captured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endian
{
    #[default]
    Little,
    Big,
}

/// A decoded primitive, string or array value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value
{
    Bool(bool),
    Char(char),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
    Pointer(Address),
    Array(Vec<Value>),
}

impl fmt::Display for Value
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Value::Bool(value) => write!(f, "{value}"),
            Value::Char(value) => write!(f, "'{value}'"),
            Value::Signed(value) => write!(f, "{value}"),
            Value::Unsigned(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value:?}"),
            Value::Pointer(address) => write!(f, "{address}"),
            Value::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Captured bytes of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBuffer
{
    bytes: Arc<[u8]>,
    endian: Endian,
}

impl MemoryBuffer
{
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self
    {
        Self {
            bytes: bytes.into(),
            endian: Endian::Little,
        }
    }

    #[must_use]
    pub fn with_endian(mut self, endian: Endian) -> Self
    {
        self.endian = endian;
        self
    }

    pub fn endian(&self) -> Endian
    {
        self.endian
    }

    pub fn bytes(&self) -> &[u8]
    {
        &self.bytes
    }

    pub fn len(&self) -> usize
    {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.bytes.is_empty()
    }

    /// `len` bytes starting at `offset`.
    ///
    /// ## Errors
    ///
    /// [`GenError::Decode`] if the range is outside the buffer.
    pub fn slice(&self, offset: u64, len: usize) -> Result<&[u8]>
    {
        let out_of_range = || {
            GenError::Decode(format!(
                "read of {len} bytes at offset {offset} exceeds buffer of {} bytes",
                self.bytes.len()
            ))
        };
        let start = usize::try_from(offset).map_err(|_| out_of_range())?;
        let end = start.checked_add(len).ok_or_else(out_of_range)?;
        self.bytes.get(start..end).ok_or_else(out_of_range)
    }

    /// Unsigned integer of `width` bytes (1 to 8).
    ///
    /// ## Errors
    ///
    /// [`GenError::Decode`] for an out-of-range read or unsupported width.
    pub fn read_unsigned(&self, offset: u64, width: usize) -> Result<u64>
    {
        if !(1..=8).contains(&width) {
            return Err(GenError::Decode(format!("unsupported integer width {width}")));
        }
        let bytes = self.slice(offset, width)?;
        let mut raw = [0u8; 8];
        let value = match self.endian {
            Endian::Little => {
                raw[..width].copy_from_slice(bytes);
                u64::from_le_bytes(raw)
            }
            Endian::Big => {
                raw[8 - width..].copy_from_slice(bytes);
                u64::from_be_bytes(raw)
            }
        };
        Ok(value)
    }

    /// Read one primitive of `kind` at `offset`.
    ///
    /// ## Errors
    ///
    /// [`GenError::Decode`] for an out-of-range read or a kind without a
    /// fixed width (strings, raw pointers, opaque primitives).
    pub fn read_primitive(&self, kind: BasicKind, offset: u64) -> Result<Value>
    {
        let width = fixed_width(kind)?;
        let raw = self.read_unsigned(offset, width)?;
        Ok(interpret(kind, raw, width * 8))
    }

    /// Read `bit_width` bits starting at `bit_position` of the storage unit
    /// of `kind` at `offset`. Signed kinds are sign-extended.
    ///
    /// ## Errors
    ///
    /// [`GenError::Decode`] if the bit range does not fit the storage unit.
    pub fn read_bits(&self, kind: BasicKind, offset: u64, bit_position: u32, bit_width: u32) -> Result<Value>
    {
        let width = fixed_width(kind)?;
        let unit_bits = u32::try_from(width * 8).unwrap_or(u32::MAX);
        let fits = bit_width > 0 && bit_position.checked_add(bit_width).is_some_and(|end| end <= unit_bits);
        if !fits {
            return Err(GenError::Decode(format!(
                "bits {bit_position}..+{bit_width} do not fit a {unit_bits}-bit {kind}"
            )));
        }

        let raw = self.read_unsigned(offset, width)?;
        let mask = if bit_width == 64 { u64::MAX } else { (1u64 << bit_width) - 1 };
        let bits = (raw >> bit_position) & mask;
        Ok(interpret(kind, bits, bit_width as usize))
    }

    /// Read `count` consecutive primitives of `kind`.
    ///
    /// ## Errors
    ///
    /// As [`read_primitive`](Self::read_primitive) for any element.
    pub fn read_array(&self, kind: BasicKind, offset: u64, count: u64) -> Result<Vec<Value>>
    {
        let width = fixed_width(kind)? as u64;
        (0..count)
            .map(|index| {
                let element = index
                    .checked_mul(width)
                    .and_then(|delta| offset.checked_add(delta))
                    .ok_or_else(|| GenError::Decode(format!("array element {index} offset overflows")))?;
                self.read_primitive(kind, element)
            })
            .collect()
    }

    /// Read a pointer of `pointer_size` bytes.
    ///
    /// ## Errors
    ///
    /// [`GenError::Decode`] for an out-of-range read or a size other than 4 or 8.
    pub fn read_pointer(&self, offset: u64, pointer_size: u64) -> Result<Address>
    {
        match pointer_size {
            4 | 8 => Ok(Address::new(self.read_unsigned(offset, pointer_size as usize)?)),
            other => Err(GenError::Decode(format!("unsupported pointer size {other}"))),
        }
    }
}

impl From<Vec<u8>> for MemoryBuffer
{
    fn from(bytes: Vec<u8>) -> Self
    {
        Self::new(bytes)
    }
}

fn fixed_width(kind: BasicKind) -> Result<usize>
{
    kind.byte_width()
        .ok_or_else(|| GenError::Decode(format!("`{kind}` has no fixed-width read primitive")))
}

/// Interpret the low `bits` bits of `raw` as a value of `kind`.
fn interpret(kind: BasicKind, raw: u64, bits: usize) -> Value
{
    match kind {
        BasicKind::Bool => Value::Bool(raw != 0),
        BasicKind::Char { .. } => Value::Char(u32::try_from(raw).ok().and_then(char::from_u32).unwrap_or('\u{fffd}')),
        BasicKind::Float if bits == 32 => Value::Float(f64::from(f32::from_bits(raw as u32))),
        BasicKind::Double if bits == 64 => Value::Float(f64::from_bits(raw)),
        kind if kind.is_signed() => Value::Signed(sign_extend(raw, bits)),
        _ => Value::Unsigned(raw),
    }
}

fn sign_extend(raw: u64, bits: usize) -> i64
{
    if bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}
