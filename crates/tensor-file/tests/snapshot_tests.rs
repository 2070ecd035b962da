//! Snapshot tests for the `tensor-file` public surface.
//!
//! Pins the dtype code table, the directory of a known file and the error
//! messages produced for malformed input.

use tensor_file::{
    DType, FORMAT_VERSION, Field, ReadOptions, TENSOR_FILE_MAGIC, Tensor, TensorReader,
    WriteOptions, decode_tensor, encode_tensor,
};

fn sample() -> Vec<u8> {
    let fields = [
        ("a", Field::from(Tensor::from_vec(vec![1u32, 2, 3]))),
        ("description", Field::from("hi")),
    ];
    encode_tensor(fields, &WriteOptions::default()).unwrap()
}

#[test]
fn magic_and_version_snapshot() {
    let magic = std::str::from_utf8(&TENSOR_FILE_MAGIC).unwrap();
    let summary = format!("magic={magic:?} version={}.{}", FORMAT_VERSION.0, FORMAT_VERSION.1);
    insta::assert_snapshot!("magic_and_version", summary);
}

#[test]
fn dtype_code_table_snapshot() {
    let table = DType::ALL
        .iter()
        .map(|d| format!("{} {} {}", d.code(), d.name(), d.element_size()))
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!("dtype_code_table", table);
}

#[test]
fn directory_json_snapshot() {
    let data = sample();
    let reader = TensorReader::new(&data, &ReadOptions::default()).unwrap();
    let json = serde_json::to_string_pretty(reader.directory()).unwrap();
    insta::assert_snapshot!("directory_json", json);
}

#[test]
fn unsupported_version_error_snapshot() {
    let mut data = sample();
    data[12] = 2;
    let msg = decode_tensor(&data, &ReadOptions::default()).unwrap_err().to_string();
    insta::assert_snapshot!("unsupported_version_error", msg);
}

#[test]
fn short_header_error_snapshot() {
    let msg = decode_tensor(b"tensor", &ReadOptions::default()).unwrap_err().to_string();
    insta::assert_snapshot!("short_header_error", msg);
}

#[test]
fn truncated_payload_error_snapshot() {
    let data = sample();
    let msg = decode_tensor(&data[..80], &ReadOptions::default()).unwrap_err().to_string();
    insta::assert_snapshot!("truncated_payload_error", msg);
}

#[test]
fn unknown_dtype_code_error_snapshot() {
    let mut data = sample();
    // header (18) + name_len (2) + "a" (1) + ndim (2)
    data[23] = 0;
    let msg = decode_tensor(&data, &ReadOptions::default()).unwrap_err().to_string();
    insta::assert_snapshot!("unknown_dtype_code_error", msg);
}
