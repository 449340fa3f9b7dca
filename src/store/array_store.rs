//! Typed array file handle with memory-mapped access

use crate::error::{MemArrayError, Result};
use crate::header::{HEADER_SIZE, Header};
use crate::mapping::{self, MapMode, MappedRegion};
use crate::store::resize;
use crate::types::{ByteOrder, DType, Layout};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// An open typed array file
///
/// Owns the file handle, the decoded header, and the current mapping of
/// the data region. The mapping is replaced whenever [`append`] resizes
/// the file and released by [`close`] (or drop).
///
/// All operations are synchronous on the calling thread; mutating
/// operations take `&mut self`, so a single instance is strictly
/// sequential. Cross-process coordination is the caller's concern: an
/// append by a writer invalidates mappings other processes established
/// over the same file, and they must re-open rather than trust a
/// long-lived view.
///
/// [`append`]: ArrayStore::append
/// [`close`]: ArrayStore::close
pub struct ArrayStore {
    path: PathBuf,
    file: File,
    header: Header,
    mode: MapMode,
    region: Option<MappedRegion>,
}

impl ArrayStore {
    /// Create a new array file with the given element type, layout, and shape
    ///
    /// The file is sized to exactly header + data region, zero-filled, and
    /// mapped read-write. A dimension may be zero only on the append axis,
    /// which is how an initially-empty growable array is made.
    pub fn create<P: AsRef<Path>>(
        path: P,
        dtype: DType,
        byte_order: ByteOrder,
        layout: Layout,
        shape: &[u64],
    ) -> Result<Self> {
        let path = path.as_ref();
        let header = Header::new(dtype, byte_order, layout, shape)?;
        let data_len = checked_region_len(&header)?;

        let mut file = mapping::create_sized(path, HEADER_SIZE as u64 + data_len as u64)?;
        file.write_all(&header.encode()?)?;

        let region = MappedRegion::map(&file, HEADER_SIZE as u64, data_len, MapMode::ReadWrite)?;

        debug!(
            "Created array {:?}: {} {} {:?}",
            path,
            header.dtype(),
            header.layout(),
            header.shape()
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            mode: MapMode::ReadWrite,
            region: Some(region),
        })
    }

    /// Open an existing array file
    ///
    /// Decodes and validates the header, then verifies the file's total
    /// length against the header-declared shape before mapping the data
    /// region. A mismatch means external truncation or a crashed resize
    /// and fails with [`MemArrayError::IntegrityMismatch`]; no data access
    /// is possible on such a file.
    pub fn open<P: AsRef<Path>>(path: P, mode: MapMode) -> Result<Self> {
        let path = path.as_ref();
        let mut file = match mode {
            MapMode::ReadOnly => File::open(path)?,
            MapMode::ReadWrite => OpenOptions::new().read(true).write(true).open(path)?,
        };

        let header = read_and_check_header(&mut file)?;
        let data_len = checked_region_len(&header)?;

        let region = MappedRegion::map(&file, HEADER_SIZE as u64, data_len, mode)?;

        debug!(
            "Opened array {:?} ({:?}): {} {} {:?}, {} data bytes",
            path,
            mode,
            header.dtype(),
            header.layout(),
            header.shape(),
            data_len
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            mode,
            region: Some(region),
        })
    }

    /// Read an array file's header without mapping its data region
    ///
    /// Runs the same integrity check as [`open`], so a truncated or
    /// corrupt file is reported rather than described.
    ///
    /// [`open`]: ArrayStore::open
    pub fn describe<P: AsRef<Path>>(path: P) -> Result<Header> {
        let mut file = File::open(path.as_ref())?;
        read_and_check_header(&mut file)
    }

    /// Decoded header of the array
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.header.dtype()
    }

    /// Byte order of the stored elements
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order()
    }

    /// Storage layout
    pub fn layout(&self) -> Layout {
        self.header.layout()
    }

    /// Dimension lengths, outermost first
    pub fn shape(&self) -> &[u64] {
        self.header.shape()
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.header.ndim()
    }

    /// Number of records along the append axis
    pub fn record_count(&self) -> u64 {
        self.header.record_count()
    }

    /// Byte length of one record
    pub fn record_len(&self) -> u64 {
        self.header.record_len()
    }

    /// Byte length of the data region
    pub fn data_len(&self) -> u64 {
        self.header.data_len()
    }

    /// Access mode the store was opened with
    pub fn mode(&self) -> MapMode {
        self.mode
    }

    /// Whether [`close`] has released the mapping
    ///
    /// [`close`]: ArrayStore::close
    pub fn is_closed(&self) -> bool {
        self.region.is_none()
    }

    /// Path the store was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole data region as a flat byte buffer
    ///
    /// This is the view handed to numeric-array libraries together with
    /// [`shape`], [`dtype`], and [`layout`]; this crate does not interpret
    /// element values itself.
    ///
    /// [`shape`]: ArrayStore::shape
    /// [`dtype`]: ArrayStore::dtype
    /// [`layout`]: ArrayStore::layout
    pub fn as_bytes(&self) -> Result<&[u8]> {
        Ok(self.region()?.as_slice())
    }

    /// The whole data region as a mutable flat byte buffer
    pub fn as_bytes_mut(&mut self) -> Result<&mut [u8]> {
        if self.mode == MapMode::ReadOnly {
            return Err(MemArrayError::ReadOnly);
        }
        self.region
            .as_mut()
            .ok_or(MemArrayError::Closed)?
            .as_mut_slice()
    }

    /// Read a range of whole records
    ///
    /// Records are slabs along the append axis, contiguous in both
    /// layouts, so the returned slice is a direct window into the mapping.
    pub fn read(&self, records: Range<u64>) -> Result<&[u8]> {
        let region = self.region()?;
        let bytes = self.byte_range(&records)?;
        trace!("Read records {:?} of {:?}", records, self.path);
        Ok(&region.as_slice()[bytes])
    }

    /// Overwrite a range of whole records in place
    ///
    /// `values` must be exactly `(end - start) * record_len` bytes. All
    /// validation happens before any byte is copied, so a failed write
    /// leaves the data region untouched.
    pub fn write(&mut self, records: Range<u64>, values: &[u8]) -> Result<()> {
        if self.region.is_none() {
            return Err(MemArrayError::Closed);
        }
        if self.mode == MapMode::ReadOnly {
            return Err(MemArrayError::ReadOnly);
        }
        let bytes = self.byte_range(&records)?;
        if values.len() != bytes.len() {
            return Err(MemArrayError::ShapeMismatch(format!(
                "{} bytes for record range {}..{}, expected {}",
                values.len(),
                records.start,
                records.end,
                bytes.len()
            )));
        }

        let region = self.region.as_mut().ok_or(MemArrayError::Closed)?;
        region.as_mut_slice()?[bytes].copy_from_slice(values);
        trace!("Wrote records {:?} of {:?}", records, self.path);
        Ok(())
    }

    /// Grow the array along its append axis
    ///
    /// `values` must be a whole number of records; their shape on all
    /// non-append axes is thereby exactly the existing shape. The file is
    /// extended in place, the header is rewritten with the new shape, and
    /// the data region is remapped; existing data never moves. Appending
    /// zero records is a no-op.
    pub fn append(&mut self, values: &[u8]) -> Result<()> {
        if self.mode == MapMode::ReadOnly {
            return Err(MemArrayError::ReadOnly);
        }
        if self.region.is_none() {
            return Err(MemArrayError::Closed);
        }

        let record_len = self.header.record_len();
        if values.len() as u64 % record_len != 0 {
            return Err(MemArrayError::ShapeMismatch(format!(
                "{} bytes is not a whole number of {record_len}-byte records",
                values.len()
            )));
        }
        let added = values.len() as u64 / record_len;
        if added == 0 {
            return Ok(());
        }

        resize::grow(
            &mut self.file,
            &mut self.header,
            &mut self.region,
            added,
            values,
        )?;

        debug!(
            "Appended {} records to {:?}, shape now {:?}",
            added,
            self.path,
            self.header.shape()
        );
        Ok(())
    }

    /// Force written pages back to the backing file
    pub fn flush(&self) -> Result<()> {
        self.region()?.flush()
    }

    /// Hint to the OS that a record range will be read soon
    pub fn prefetch(&self, records: Range<u64>) -> Result<()> {
        let region = self.region()?;
        let bytes = self.byte_range(&records)?;
        region.advise_will_need(bytes.start, bytes.end - bytes.start);
        Ok(())
    }

    /// Flush and release the mapping and file handle
    ///
    /// Idempotent: closing an already-closed store is a no-op. Any later
    /// data operation fails with [`MemArrayError::Closed`].
    pub fn close(&mut self) -> Result<()> {
        if let Some(region) = self.region.take() {
            region.flush()?;
            drop(region);
            debug!("Closed array {:?}", self.path);
        }
        Ok(())
    }

    fn region(&self) -> Result<&MappedRegion> {
        self.region.as_ref().ok_or(MemArrayError::Closed)
    }

    /// Validate a record range and convert it to a byte range
    fn byte_range(&self, records: &Range<u64>) -> Result<Range<usize>> {
        let len = self.header.record_count();
        if records.start > records.end || records.end > len {
            return Err(MemArrayError::OutOfRange {
                start: records.start,
                end: records.end,
                len,
            });
        }

        let record_len = self.header.record_len();
        let start = usize::try_from(records.start * record_len)
            .map_err(|_| too_large_for_platform())?;
        let end =
            usize::try_from(records.end * record_len).map_err(|_| too_large_for_platform())?;
        Ok(start..end)
    }
}

impl Drop for ArrayStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!("Close on drop failed for {:?}: {}", self.path, e);
        }
    }
}

fn read_and_check_header(file: &mut File) -> Result<Header> {
    let mut buf = [0u8; HEADER_SIZE];
    file.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            MemArrayError::MalformedHeader(format!(
                "file is shorter than the {HEADER_SIZE}-byte preamble"
            ))
        } else {
            MemArrayError::Io(e)
        }
    })?;
    let header = Header::decode(&buf)?;

    let expected = HEADER_SIZE as u64 + header.data_len();
    let actual = file.metadata()?.len();
    if actual != expected {
        return Err(MemArrayError::IntegrityMismatch { expected, actual });
    }

    Ok(header)
}

fn checked_region_len(header: &Header) -> Result<usize> {
    usize::try_from(header.data_len()).map_err(|_| too_large_for_platform())
}

fn too_large_for_platform() -> MemArrayError {
    MemArrayError::InvalidShape("data region exceeds the platform address space".into())
}
