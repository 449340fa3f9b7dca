//! Round-trip fidelity across element types, byte orders, and layouts

use memarray::{ArrayStore, ByteOrder, DType, Layout, MapMode};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const ALL_DTYPES: [DType; 11] = [
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

/// Deterministic non-trivial fill pattern
fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn test_every_dtype_round_trips() {
    let dir = tempdir().unwrap();

    for (i, dtype) in ALL_DTYPES.into_iter().enumerate() {
        for (j, layout) in [Layout::RowMajor, Layout::ColumnMajor].into_iter().enumerate() {
            let path = dir.path().join(format!("rt_{i}_{j}.marr"));
            let shape = [3u64, 4];

            let mut store =
                ArrayStore::create(&path, dtype, ByteOrder::Little, layout, &shape).unwrap();
            let data = pattern(store.data_len() as usize);
            store.as_bytes_mut().unwrap().copy_from_slice(&data);
            store.close().unwrap();

            let store = ArrayStore::open(&path, MapMode::ReadOnly).unwrap();
            assert_eq!(store.dtype(), dtype, "dtype for {dtype}/{layout}");
            assert_eq!(store.layout(), layout, "layout for {dtype}/{layout}");
            assert_eq!(store.shape(), &shape, "shape for {dtype}/{layout}");
            assert_eq!(
                store.as_bytes().unwrap(),
                &data[..],
                "data for {dtype}/{layout}"
            );
        }
    }
}

#[test]
fn test_big_endian_elements_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bigend.marr");

    let values: Vec<u8> = [1i32, -2, 300, -40000]
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect();

    let mut store =
        ArrayStore::create(&path, DType::I32, ByteOrder::Big, Layout::RowMajor, &[4]).unwrap();
    store.write(0..4, &values).unwrap();
    store.close().unwrap();

    let store = ArrayStore::open(&path, MapMode::ReadOnly).unwrap();
    assert_eq!(store.byte_order(), ByteOrder::Big);
    let bytes = store.read(0..4).unwrap();
    assert_eq!(bytes, &values[..]);
    assert_eq!(i32::from_be_bytes(bytes[8..12].try_into().unwrap()), 300);
}

#[test]
fn test_max_ndim_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("deep.marr");
    let shape = [2u64, 1, 2, 1, 2, 1, 2, 1];

    let mut store =
        ArrayStore::create(&path, DType::U16, ByteOrder::Little, Layout::RowMajor, &shape)
            .unwrap();
    let data = pattern(store.data_len() as usize);
    store.as_bytes_mut().unwrap().copy_from_slice(&data);
    store.close().unwrap();

    let store = ArrayStore::open(&path, MapMode::ReadWrite).unwrap();
    assert_eq!(store.ndim(), 8);
    assert_eq!(store.shape(), &shape);
    assert_eq!(store.as_bytes().unwrap(), &data[..]);
}

#[test]
fn test_two_readers_share_one_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shared.marr");

    let mut store =
        ArrayStore::create(&path, DType::U8, ByteOrder::Little, Layout::RowMajor, &[8]).unwrap();
    store.write(0..8, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    store.close().unwrap();

    let a = ArrayStore::open(&path, MapMode::ReadOnly).unwrap();
    let b = ArrayStore::open(&path, MapMode::ReadOnly).unwrap();
    assert_eq!(a.read(0..8).unwrap(), b.read(0..8).unwrap());
}
