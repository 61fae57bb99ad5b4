//! # Memory Read Service
//!
//! The collaborator generated accessors use to fetch bytes that are not in
//! their buffer: whole instances for the `(Variable)` constructor and the
//! characters behind string pointers.
//!
//! Debugger sessions implement [`MemoryReadService`] over their process
//! handles. [`InMemoryProcess`] serves captured regions (dumps, tests) and
//! [`PageCache`] puts a read-through page cache in front of any service.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use super::buffer::Endian;
use crate::error::{GenError, Result};
use crate::types::{Address, ProcessId};

/// Reads raw bytes out of a process.
pub trait MemoryReadService: Send + Sync
{
    /// Read `len` bytes at `address` in `process`.
    ///
    /// Implementations may return fewer bytes than requested when the range
    /// runs off the end of readable memory, but never more.
    ///
    /// ## Errors
    ///
    /// [`GenError::MemoryRead`] if nothing can be read at `address`.
    fn read_memory(&self, process: ProcessId, address: Address, len: usize) -> Result<Vec<u8>>;
}

/// Captured memory regions of one or more processes.
///
/// ## Example
///
/// ```rust
/// use projgen_core::runtime::{InMemoryProcess, MemoryReadService};
/// use projgen_core::types::{Address, ProcessId};
///
/// let mut memory = InMemoryProcess::new();
/// memory.map(ProcessId(7), Address::new(0x1000), b"hello\0".to_vec());
///
/// let bytes = memory.read_memory(ProcessId(7), Address::new(0x1001), 3)?;
/// assert_eq!(bytes, b"ell");
/// # Ok::<(), projgen_core::error::GenError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryProcess
{
    regions: HashMap<ProcessId, BTreeMap<Address, Arc<[u8]>>>,
}

impl InMemoryProcess
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Map `bytes` at `base`. A region at the same base is replaced.
    pub fn map(&mut self, process: ProcessId, base: Address, bytes: impl Into<Arc<[u8]>>)
    {
        self.regions.entry(process).or_default().insert(base, bytes.into());
    }

    /// Number of mapped regions across all processes.
    pub fn region_count(&self) -> usize
    {
        self.regions.values().map(BTreeMap::len).sum()
    }
}

impl MemoryReadService for InMemoryProcess
{
    fn read_memory(&self, process: ProcessId, address: Address, len: usize) -> Result<Vec<u8>>
    {
        if len == 0 {
            return Ok(Vec::new());
        }
        let unmapped = || GenError::MemoryRead {
            address,
            length: len,
            reason: format!("address is not mapped in {process}"),
        };

        let (base, bytes) = self
            .regions
            .get(&process)
            .and_then(|regions| regions.range(..=address).next_back())
            .ok_or_else(unmapped)?;
        let start = address
            .offset_from(*base)
            .and_then(|offset| usize::try_from(offset).ok())
            .filter(|&start| start < bytes.len())
            .ok_or_else(unmapped)?;
        let end = start.saturating_add(len).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }
}

/// Read-through page cache over another service.
///
/// Pages are fetched whole on first use and kept until
/// [`invalidate_range`](Self::invalidate_range) or [`clear`](Self::clear).
/// Reads from pages that are only partly mapped go to the inner service
/// directly and are not cached.
#[derive(Debug)]
pub struct PageCache<S>
{
    inner: S,
    page_size: usize,
    pages: RwLock<HashMap<(ProcessId, u64), Arc<Vec<u8>>>>,
}

impl<S: MemoryReadService> PageCache<S>
{
    pub const DEFAULT_PAGE_SIZE: usize = 4096;

    pub fn new(inner: S) -> Self
    {
        Self::with_page_size(inner, Self::DEFAULT_PAGE_SIZE)
    }

    /// Create a cache with a custom page size (rounded up to a power of two,
    /// at least 64 bytes).
    pub fn with_page_size(inner: S, page_size: usize) -> Self
    {
        Self {
            inner,
            page_size: page_size.max(64).next_power_of_two(),
            pages: RwLock::new(HashMap::new()),
        }
    }

    pub fn page_size(&self) -> usize
    {
        self.page_size
    }

    pub fn inner(&self) -> &S
    {
        &self.inner
    }

    /// Drop every cached page.
    pub fn clear(&self)
    {
        self.pages.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Drop cached pages of `process` overlapping `len` bytes at `address`.
    pub fn invalidate_range(&self, process: ProcessId, address: Address, len: usize)
    {
        if len == 0 {
            return;
        }
        let start = address.value();
        let end = start.saturating_add(len as u64);
        let mut pages = self.pages.write().unwrap_or_else(PoisonError::into_inner);
        let mut base = self.page_base(start);
        while base < end {
            pages.remove(&(process, base));
            base = base.saturating_add(self.page_size as u64);
            if base == u64::MAX {
                break;
            }
        }
    }

    /// Number of pages currently cached.
    pub fn cached_pages(&self) -> usize
    {
        self.pages.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn page_base(&self, value: u64) -> u64
    {
        value & !(self.page_size as u64 - 1)
    }

    /// Cached page at `base`, fetching it on a miss. Only whole pages are
    /// cached; a short page is returned but fetched again next time.
    fn fetch_page(&self, process: ProcessId, base: u64) -> Result<Arc<Vec<u8>>>
    {
        let key = (process, base);
        if let Some(existing) = self.pages.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            return Ok(Arc::clone(existing));
        }

        let mut pages = self.pages.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = pages.get(&key) {
            return Ok(Arc::clone(existing));
        }
        let page = Arc::new(self.inner.read_memory(process, Address::new(base), self.page_size)?);
        if page.len() == self.page_size {
            pages.insert(key, Arc::clone(&page));
        }
        Ok(page)
    }
}

impl<S: MemoryReadService> MemoryReadService for PageCache<S>
{
    fn read_memory(&self, process: ProcessId, address: Address, len: usize) -> Result<Vec<u8>>
    {
        let mut output = Vec::with_capacity(len);
        while output.len() < len {
            let absolute = address.value().saturating_add(output.len() as u64);
            let page_base = self.page_base(absolute);
            let page_offset = (absolute - page_base) as usize;
            let wanted = (len - output.len()).min(self.page_size - page_offset);

            let cached = self
                .fetch_page(process, page_base)
                .ok()
                .filter(|page| page.len() >= page_offset + wanted);
            let read = if let Some(page) = cached {
                output.extend_from_slice(&page[page_offset..page_offset + wanted]);
                wanted
            } else {
                // A region can start or end inside the page; ask for the exact range.
                match self.inner.read_memory(process, Address::new(absolute), wanted) {
                    Ok(bytes) => {
                        let take = wanted.min(bytes.len());
                        output.extend_from_slice(&bytes[..take]);
                        take
                    }
                    Err(error) if output.is_empty() => return Err(error),
                    Err(_) => break,
                }
            };
            if read < wanted {
                break;
            }
        }

        if output.is_empty() && len > 0 {
            return Err(GenError::MemoryRead {
                address,
                length: len,
                reason: "no readable bytes".to_string(),
            });
        }
        Ok(output)
    }
}

/// Read a NUL-terminated string of `char_width`-byte characters at
/// `address`, stopping after `max_chars` characters.
///
/// One-byte strings are decoded as UTF-8 (lossy), two-byte strings as UTF-16
/// and four-byte strings as UTF-32, with units in `endian` byte order;
/// invalid units become U+FFFD.
///
/// ## Errors
///
/// - [`GenError::Decode`] for a character width other than 1, 2 or 4
/// - errors of the underlying service if the first character is unreadable
pub fn read_string(
    service: &dyn MemoryReadService,
    process: ProcessId,
    address: Address,
    char_width: u8,
    endian: Endian,
    max_chars: usize,
) -> Result<String>
{
    const CHUNK_CHARS: usize = 64;

    let width = usize::from(char_width);
    if !matches!(width, 1 | 2 | 4) {
        return Err(GenError::Decode(format!("unsupported character width {char_width}")));
    }

    let mut units: Vec<u32> = Vec::new();
    let mut cursor = address;
    'read: while units.len() < max_chars {
        let chars = CHUNK_CHARS.min(max_chars - units.len());
        let bytes = match service.read_memory(process, cursor, chars * width) {
            Ok(bytes) => bytes,
            Err(error) if units.is_empty() => return Err(error),
            Err(_) => break,
        };
        let whole = bytes.len() / width;
        for unit in bytes.chunks_exact(width) {
            let value = match (width, endian) {
                (1, _) => u32::from(unit[0]),
                (2, Endian::Little) => u32::from(u16::from_le_bytes([unit[0], unit[1]])),
                (2, Endian::Big) => u32::from(u16::from_be_bytes([unit[0], unit[1]])),
                (_, Endian::Little) => u32::from_le_bytes([unit[0], unit[1], unit[2], unit[3]]),
                (_, Endian::Big) => u32::from_be_bytes([unit[0], unit[1], unit[2], unit[3]]),
            };
            if value == 0 {
                break 'read;
            }
            units.push(value);
        }
        if whole < chars {
            break;
        }
        match cursor.checked_add((whole * width) as u64) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    Ok(match width {
        1 => {
            let bytes: Vec<u8> = units.iter().map(|&unit| unit as u8).collect();
            String::from_utf8_lossy(&bytes).into_owned()
        }
        2 => {
            let wide: Vec<u16> = units.iter().map(|&unit| unit as u16).collect();
            String::from_utf16_lossy(&wide)
        }
        _ => units
            .iter()
            .map(|&unit| char::from_u32(unit).unwrap_or('\u{fffd}'))
            .collect(),
    })
}
