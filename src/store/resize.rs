//! Grow-in-place protocol backing [`ArrayStore::append`]
//!
//! The file is extended before the header is rewritten. A crash between
//! the two leaves the file longer than the header declares, which the
//! integrity check catches on the next open; at no point can a reader see
//! a header describing data that is not on disk.
//!
//! [`ArrayStore::append`]: crate::store::ArrayStore::append

use crate::error::{MemArrayError, Result};
use crate::header::{HEADER_SIZE, Header};
use crate::mapping::{MapMode, MappedRegion};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use tracing::trace;

/// Extend the file along the append axis and land `values` in the tail
///
/// The caller has already validated that `values` is `added` whole
/// records. On error the mapping is left released (the store reads as
/// closed) while the file on disk stays consistent.
pub(crate) fn grow(
    file: &mut File,
    header: &mut Header,
    region: &mut Option<MappedRegion>,
    added: u64,
    values: &[u8],
) -> Result<()> {
    let axis = header.append_axis();
    let old_data_len = usize::try_from(header.data_len())
        .map_err(|_| too_large())?;

    let mut new_shape = header.shape().to_vec();
    new_shape[axis] = new_shape[axis]
        .checked_add(added)
        .ok_or_else(|| MemArrayError::InvalidShape("append axis length overflows u64".into()))?;
    let new_header = Header::new(
        header.dtype(),
        header.byte_order(),
        header.layout(),
        &new_shape,
    )?;

    let new_data_len = usize::try_from(new_header.data_len()).map_err(|_| too_large())?;
    let new_total = HEADER_SIZE as u64 + new_data_len as u64;

    trace!(
        "Growing axis {} by {} records: {} -> {} data bytes",
        axis, added, old_data_len, new_data_len
    );

    // An outstanding mapping over a resized file has undefined behavior on
    // the stale range, so the view must go before the length changes.
    if let Some(active) = region.take() {
        active.flush()?;
    }

    // set_len zero-fills the extension on every supported platform.
    file.set_len(new_total)?;

    file.seek(SeekFrom::Start(0))?;
    file.write_all(&new_header.encode()?)?;

    let mut mapped = MappedRegion::map(file, HEADER_SIZE as u64, new_data_len, MapMode::ReadWrite)?;
    mapped.as_mut_slice()?[old_data_len..old_data_len + values.len()].copy_from_slice(values);

    *region = Some(mapped);
    *header = new_header;
    Ok(())
}

fn too_large() -> MemArrayError {
    MemArrayError::InvalidShape("data region exceeds the platform address space".into())
}
