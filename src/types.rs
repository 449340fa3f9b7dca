//! Element type, byte order, and storage layout descriptors

use std::fmt;

/// Element type of a stored array
///
/// The discriminant values are the on-disk dtype codes and are part of the
/// file format; they must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DType {
    I8 = 0x01,
    I16 = 0x02,
    I32 = 0x03,
    I64 = 0x04,
    U8 = 0x05,
    U16 = 0x06,
    U32 = 0x07,
    U64 = 0x08,
    F32 = 0x09,
    F64 = 0x0A,
    /// One byte per element, 0 or 1
    Bool = 0x0B,
}

impl DType {
    /// On-disk dtype code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decode a dtype code, `None` if outside the enumeration
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(DType::I8),
            0x02 => Some(DType::I16),
            0x03 => Some(DType::I32),
            0x04 => Some(DType::I64),
            0x05 => Some(DType::U8),
            0x06 => Some(DType::U16),
            0x07 => Some(DType::U32),
            0x08 => Some(DType::U64),
            0x09 => Some(DType::F32),
            0x0A => Some(DType::F64),
            0x0B => Some(DType::Bool),
            _ => None,
        }
    }

    /// Size in bytes of a single element
    pub fn width(self) -> usize {
        match self {
            DType::I8 | DType::U8 | DType::Bool => 1,
            DType::I16 | DType::U16 => 2,
            DType::I32 | DType::U32 | DType::F32 => 4,
            DType::I64 | DType::U64 | DType::F64 => 8,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::I8 => "int8",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::U8 => "uint8",
            DType::U16 => "uint16",
            DType::U32 => "uint32",
            DType::U64 => "uint64",
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Byte order of the stored elements
///
/// Describes the data region only; header fields are always little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ByteOrder {
    Little = 0,
    Big = 1,
}

impl ByteOrder {
    /// On-disk tag byte
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Decode a tag byte, `None` if unknown
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ByteOrder::Little),
            1 => Some(ByteOrder::Big),
            _ => None,
        }
    }

    /// Byte order of the host
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Little => f.write_str("little-endian"),
            ByteOrder::Big => f.write_str("big-endian"),
        }
    }
}

/// Memory layout of a multi-dimensional array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Layout {
    RowMajor = 0,
    ColumnMajor = 1,
}

impl Layout {
    /// On-disk tag byte
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Decode a tag byte, `None` if unknown
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Layout::RowMajor),
            1 => Some(Layout::ColumnMajor),
            _ => None,
        }
    }

    /// The axis an array of this layout grows along: the slowest-varying
    /// one, so that growth is always a contiguous tail of the data region.
    pub fn append_axis(self, ndim: usize) -> usize {
        match self {
            Layout::RowMajor => 0,
            Layout::ColumnMajor => ndim - 1,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::RowMajor => f.write_str("row-major"),
            Layout::ColumnMajor => f.write_str("column-major"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_codes_round_trip() {
        let all = [
            DType::I8,
            DType::I16,
            DType::I32,
            DType::I64,
            DType::U8,
            DType::U16,
            DType::U32,
            DType::U64,
            DType::F32,
            DType::F64,
            DType::Bool,
        ];
        for dtype in all {
            assert_eq!(DType::from_code(dtype.code()), Some(dtype));
        }
        assert_eq!(DType::from_code(0x00), None);
        assert_eq!(DType::from_code(0x0C), None);
        assert_eq!(DType::from_code(0xFF), None);
    }

    #[test]
    fn test_dtype_widths() {
        assert_eq!(DType::I8.width(), 1);
        assert_eq!(DType::U8.width(), 1);
        assert_eq!(DType::Bool.width(), 1);
        assert_eq!(DType::I16.width(), 2);
        assert_eq!(DType::U16.width(), 2);
        assert_eq!(DType::I32.width(), 4);
        assert_eq!(DType::U32.width(), 4);
        assert_eq!(DType::F32.width(), 4);
        assert_eq!(DType::I64.width(), 8);
        assert_eq!(DType::U64.width(), 8);
        assert_eq!(DType::F64.width(), 8);
    }

    #[test]
    fn test_byte_order_tags() {
        assert_eq!(ByteOrder::from_tag(0), Some(ByteOrder::Little));
        assert_eq!(ByteOrder::from_tag(1), Some(ByteOrder::Big));
        assert_eq!(ByteOrder::from_tag(2), None);
    }

    #[test]
    fn test_append_axis_by_layout() {
        assert_eq!(Layout::RowMajor.append_axis(3), 0);
        assert_eq!(Layout::ColumnMajor.append_axis(3), 2);
        assert_eq!(Layout::RowMajor.append_axis(1), 0);
        assert_eq!(Layout::ColumnMajor.append_axis(1), 0);
    }
}
