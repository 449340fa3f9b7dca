//! Thin wrapper over the OS memory-mapping primitive
//!
//! [`MappedRegion`] exposes a byte window of a file as a page-backed slice.
//! The mapping is released on drop; the store guarantees a region is
//! dropped before any operation that changes the file's length, because a
//! mapping outliving a truncate/extend has undefined behavior on the stale
//! range.

use crate::error::{MemArrayError, Result};
use memmap2::{Mmap, MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::debug;

/// Access mode for an open store or mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    ReadOnly,
    ReadWrite,
}

enum MmapKind {
    /// Zero-length window; no OS mapping is established
    Empty,
    Ro(Mmap),
    Rw(MmapMut),
}

/// A page-backed view over `[offset, offset + len)` of a file
///
/// Mapping offsets are not required to be page-aligned: the region is
/// mapped from the start of the file (offset 0 is always page-aligned)
/// and the requested window is exposed as a sub-slice.
pub struct MappedRegion {
    mmap: MmapKind,
    mode: MapMode,
    offset: usize,
    len: usize,
}

impl MappedRegion {
    /// Map `[offset, offset + len)` of `file` in the given mode
    ///
    /// Fails with [`MemArrayError::Map`] if the range exceeds the file's
    /// current length or the OS mapping call fails.
    pub fn map(file: &File, offset: u64, len: usize, mode: MapMode) -> Result<Self> {
        let file_len = file.metadata()?.len();
        let end = offset
            .checked_add(len as u64)
            .ok_or_else(|| map_input_error("mapping range overflows u64"))?;
        if end > file_len {
            return Err(map_input_error(format!(
                "mapping range {offset}..{end} exceeds file length {file_len}"
            )));
        }

        let offset = usize::try_from(offset)
            .map_err(|_| map_input_error("mapping offset exceeds address space"))?;

        if len == 0 {
            return Ok(Self {
                mmap: MmapKind::Empty,
                mode,
                offset,
                len,
            });
        }

        let total = offset + len;
        let mmap = match mode {
            MapMode::ReadOnly => {
                let mmap = unsafe { MmapOptions::new().len(total).map(file) }
                    .map_err(MemArrayError::Map)?;
                MmapKind::Ro(mmap)
            }
            MapMode::ReadWrite => {
                let mmap = unsafe { MmapOptions::new().len(total).map_mut(file) }
                    .map_err(MemArrayError::Map)?;
                MmapKind::Rw(mmap)
            }
        };

        Ok(Self {
            mmap,
            mode,
            offset,
            len,
        })
    }

    /// Byte length of the window
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the window is zero-length
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Access mode the region was mapped with
    pub fn mode(&self) -> MapMode {
        self.mode
    }

    /// The mapped window as a byte slice
    pub fn as_slice(&self) -> &[u8] {
        match &self.mmap {
            MmapKind::Empty => &[],
            MmapKind::Ro(mmap) => &mmap[self.offset..self.offset + self.len],
            MmapKind::Rw(mmap) => &mmap[self.offset..self.offset + self.len],
        }
    }

    /// The mapped window as a mutable byte slice
    ///
    /// Fails with [`MemArrayError::ReadOnly`] on a read-only mapping.
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        match &mut self.mmap {
            MmapKind::Empty if self.mode == MapMode::ReadWrite => Ok(&mut []),
            MmapKind::Rw(mmap) => Ok(&mut mmap[self.offset..self.offset + self.len]),
            _ => Err(MemArrayError::ReadOnly),
        }
    }

    /// Force written pages back to the backing file without unmapping
    pub fn flush(&self) -> Result<()> {
        if let MmapKind::Rw(mmap) = &self.mmap {
            mmap.flush()?;
        }
        Ok(())
    }

    /// Hint to the OS that the given byte range will be needed soon
    pub fn advise_will_need(&self, start: usize, len: usize) {
        #[cfg(unix)]
        {
            use memmap2::Advice;
            let start = self.offset + start.min(self.len);
            let end = start.saturating_add(len).min(self.offset + self.len);
            match &self.mmap {
                MmapKind::Ro(mmap) => {
                    let _ = mmap.advise_range(Advice::WillNeed, start, end - start);
                }
                MmapKind::Rw(mmap) => {
                    let _ = mmap.advise_range(Advice::WillNeed, start, end - start);
                }
                MmapKind::Empty => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = (start, len);
        }
    }
}

fn map_input_error(msg: impl Into<String>) -> MemArrayError {
    MemArrayError::Map(io::Error::new(io::ErrorKind::InvalidInput, msg.into()))
}

/// Create (or truncate) a file with exactly `total_len` zero-filled bytes
///
/// Missing parent directories are created. `File::set_len` guarantees the
/// extended range reads as zeros on every supported platform.
pub fn create_sized(path: &Path, total_len: u64) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.set_len(total_len)?;

    debug!("Created {:?} ({} bytes)", path, total_len);

    Ok(file)
}
