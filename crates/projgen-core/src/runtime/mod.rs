//! # Runtime
//!
//! The read primitives generated accessors are written against, and a way
//! to evaluate a [`Decode`](crate::codegen::Decode) against captured memory
//! without compiling any generated code.

pub mod buffer;
pub mod decode;
pub mod memory;

pub use buffer::{Endian, MemoryBuffer, Value};
pub use decode::{decode, DecodeTarget, MAX_STRING_CHARS};
pub use memory::{read_string, InMemoryProcess, MemoryReadService, PageCache};
