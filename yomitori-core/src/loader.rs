use crate::error::{ElfError, Result};
use std::path::Path;

/// Supplies raw bytes from the underlying storage on demand.
///
/// The returned slice must stay valid and unchanged for as long as the
/// loader itself is alive; later calls must not invalidate earlier ones.
/// Implementations own the storage, whether an in-memory buffer, a
/// memory-mapped file, or something fetched over the network.
pub trait Loader {
    /// Returns at least `length` readable bytes starting at `offset`, or
    /// [`ElfError::Range`] if the window falls outside the source.
    fn load(&self, offset: u64, length: u64) -> Result<&[u8]>;
}

/// [`Loader`] over an owned in-memory buffer.
#[derive(Debug)]
pub struct MemLoader {
    buf: Vec<u8>,
}

impl MemLoader {
    pub fn new(buf: Vec<u8>) -> MemLoader {
        MemLoader { buf }
    }

    /// Reads an entire file into memory and serves loads from the copy.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<MemLoader> {
        Ok(MemLoader {
            buf: std::fs::read(path)?,
        })
    }
}

impl Loader for MemLoader {
    fn load(&self, offset: u64, length: u64) -> Result<&[u8]> {
        let end = offset.checked_add(length).ok_or(ElfError::Range {
            offset,
            size: self.buf.len() as u64,
        })?;
        if end > self.buf.len() as u64 {
            return Err(ElfError::Range {
                offset,
                size: self.buf.len() as u64,
            });
        }
        Ok(&self.buf[offset as usize..end as usize])
    }
}
