//! End-to-end scenarios against real files on disk.

use tempfile::TempDir;
use tensor_file::{
    DType, ErrorKind, Field, RawArray, Tensor, TensorFileError, WriteOptions, decode_string,
    read_directory, read_tensor, write_tensor, write_tensor_with,
};

fn tmp() -> TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn single_u32_field_round_trips() {
    let dir = tmp();
    let path = dir.path().join("t.bin");
    write_tensor(&path, 8, [("a", Tensor::from_vec(vec![1u32, 2, 3]))]).unwrap();

    let tensors = read_tensor(&path).unwrap();
    assert_eq!(tensors.len(), 1);
    let a = &tensors["a"];
    assert_eq!(a.dtype(), DType::UInt32);
    assert_eq!(a.shape(), &[3]);
    assert_eq!(a.as_slice::<u32>(), Some(&[1u32, 2, 3][..]));
}

#[test]
fn matrix_and_text_round_trip() {
    let dir = tmp();
    let path = dir.path().join("two.bin");
    let a = Tensor::new(vec![2, 2], vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
    write_tensor(&path, 8, [("a", Field::from(a.clone())), ("b", Field::from("hi"))]).unwrap();

    let tensors = read_tensor(&path).unwrap();
    assert_eq!(tensors.names().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(tensors["a"], a);
    assert_eq!(tensors["a"].get::<f32>(&[0, 1]), Some(2.0));
    assert_eq!(decode_string(&tensors["b"]).unwrap(), "hi");
}

#[test]
fn truncated_before_last_payload_fails() {
    let dir = tmp();
    let path = dir.path().join("cut.bin");
    write_tensor(
        &path,
        8,
        [
            ("first", Field::from(Tensor::from_vec(vec![7i64; 4]))),
            ("last", Field::from(Tensor::from_vec(vec![0.5f64; 16]))),
        ],
    )
    .unwrap();

    let directory = read_directory(&path).unwrap();
    let last = directory.get("last").unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..last.offset as usize + 3]).unwrap();

    let err = read_tensor(&path).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Format | ErrorKind::Io), "{err}");
    assert!(matches!(err, TensorFileError::Truncated { .. }), "{err}");
}

#[test]
fn unsupported_dtype_writes_no_file() {
    let dir = tmp();
    let path = dir.path().join("never.bin");
    let bf16 = RawArray::new("bfloat16", vec![2], vec![0u8; 4]);
    let err = write_tensor(
        &path,
        8,
        [("ok", Field::from(Tensor::from_vec(vec![1u8]))), ("bad", Field::from(bf16))],
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedDType);
    assert!(matches!(err, TensorFileError::UnsupportedDType { ref field, ref kind }
        if field == "bad" && kind == "bfloat16"));
    assert!(!path.exists());
}

#[test]
fn duplicate_names_write_no_file() {
    let dir = tmp();
    let path = dir.path().join("dup.bin");
    let err = write_tensor(&path, 8, [("x", "one"), ("x", "two")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(!path.exists());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tmp();
    let err = read_tensor(dir.path().join("absent.bin")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().starts_with("cannot open "), "{err}");
}

#[test]
fn empty_file_is_format_error() {
    let dir = tmp();
    let path = dir.path().join("empty.bin");
    std::fs::write(&path, b"").unwrap();
    let err = read_tensor(&path).unwrap_err();
    assert!(err.is_format(), "{err}");
}

#[test]
fn bad_magic_on_disk_is_format_error() {
    let dir = tmp();
    let path = dir.path().join("magic.bin");
    write_tensor(&path, 8, [("a", "x")]).unwrap();
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[0] ^= 0xFF;
    std::fs::write(&path, &bytes).unwrap();
    assert!(matches!(read_tensor(&path), Err(TensorFileError::BadMagic { .. })));
}

#[test]
fn write_with_options_reports_length() {
    let dir = tmp();
    let path = dir.path().join("len.bin");
    let written = write_tensor_with(
        &path,
        [("h", Tensor::from_vec(vec![half::f16::from_f32(1.5); 3]))],
        &WriteOptions::with_alignment(64),
    )
    .unwrap();
    assert_eq!(written, std::fs::metadata(&path).unwrap().len());

    let directory = read_directory(&path).unwrap();
    assert_eq!(directory.get("h").unwrap().offset, 64);
    assert_eq!(written, 64 + 6);
}

#[test]
fn overwriting_an_existing_file_replaces_it() {
    let dir = tmp();
    let path = dir.path().join("over.bin");
    write_tensor(&path, 8, [("old", Tensor::from_vec(vec![0u64; 100]))]).unwrap();
    write_tensor(&path, 8, [("new", "short")]).unwrap();
    let tensors = read_tensor(&path).unwrap();
    assert!(!tensors.contains("old"));
    assert_eq!(decode_string(&tensors["new"]).unwrap(), "short");
}
