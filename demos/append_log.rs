//! Append-only numeric log backed by a growable mapped array
//!
//! Creates an empty (0, 4) f64 array, appends a few records, then reopens
//! the file read-only and prints what the header describes.

use memarray::{ArrayStore, ByteOrder, DType, Layout, MapMode};

fn main() -> memarray::Result<()> {
    tracing_subscriber::fmt::init();

    let dir = std::env::temp_dir().join("memarray-demo");
    let path = dir.join("samples.marr");

    let mut store = ArrayStore::create(
        &path,
        DType::F64,
        ByteOrder::Little,
        Layout::RowMajor,
        &[0, 4],
    )?;

    for batch in 0..3 {
        let record: Vec<u8> = (0..4)
            .map(|i| (batch * 4 + i) as f64 * 0.5)
            .flat_map(f64::to_le_bytes)
            .collect();
        store.append(&record)?;
    }
    store.close()?;

    let store = ArrayStore::open(&path, MapMode::ReadOnly)?;
    println!(
        "{}: {} {} array, shape {:?}, {} bytes of data",
        path.display(),
        store.dtype(),
        store.layout(),
        store.shape(),
        store.data_len()
    );

    for (i, record) in store.read(0..store.record_count())?.chunks(32).enumerate() {
        let values: Vec<f64> = record
            .chunks(8)
            .map(|c| f64::from_le_bytes(c.try_into().expect("8-byte chunk")))
            .collect();
        println!("record {i}: {values:?}");
    }

    Ok(())
}
