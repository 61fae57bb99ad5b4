//! Process identity as seen by the memory-read collaborator.

use std::fmt;

use serde::Serialize;

/// Process identifier
///
/// Generated string accessors read through the process that owns the
/// module of the value's code type; this is the handle they pass to
/// [`MemoryReadService`](crate::runtime::MemoryReadService).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ProcessId(pub u32);

impl From<u32> for ProcessId
{
    fn from(pid: u32) -> Self
    {
        ProcessId(pid)
    }
}

impl From<ProcessId> for u32
{
    fn from(pid: ProcessId) -> Self
    {
        pid.0
    }
}

impl fmt::Display for ProcessId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "pid {}", self.0)
    }
}
