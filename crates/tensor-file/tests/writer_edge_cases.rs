//! Edge-case tests for the two-pass writer.

use std::io::{Cursor, Seek, SeekFrom, Write};
use tensor_file::{
    ErrorKind, Field, RawArray, ReadOptions, Tensor, TensorFileError, TensorWriter, WriteOptions,
    decode_string, decode_tensor, encode_tensor, read_tensor,
};

#[test]
fn text_and_byte_array_encode_identically() {
    let as_text = encode_tensor([("s", "héllo")], &WriteOptions::default()).unwrap();
    let as_bytes =
        encode_tensor([("s", Tensor::text("héllo"))], &WriteOptions::default()).unwrap();
    assert_eq!(as_text, as_bytes);
}

#[test]
fn non_power_of_two_alignment_is_honoured() {
    let data = encode_tensor(
        [("a", Tensor::from_vec(vec![1u8])), ("b", Tensor::from_vec(vec![2u8, 3]))],
        &WriteOptions::with_alignment(3),
    )
    .unwrap();
    let tensors = decode_tensor(&data, &ReadOptions::default()).unwrap();
    assert_eq!(tensors["b"].as_slice::<u8>(), Some(&[2u8, 3][..]));
}

#[test]
fn alignment_one_packs_payloads_back_to_back() {
    let data = encode_tensor(
        [("a", Tensor::from_vec(vec![1u8, 2, 3])), ("b", Tensor::from_vec(vec![0x0405u16]))],
        &WriteOptions::with_alignment(1),
    )
    .unwrap();
    // header 18 + two 22-byte entries = 62; payloads follow without padding.
    assert_eq!(data.len(), 62 + 3 + 2);
    assert_eq!(&data[62..], &[1, 2, 3, 0x05, 0x04]);
}

#[test]
fn borrowed_tensors_can_be_written() {
    let t = Tensor::new(vec![3], vec![1i32, -1, 0]).unwrap();
    let data = encode_tensor([("t", &t)], &WriteOptions::default()).unwrap();
    let tensors = decode_tensor(&data, &ReadOptions::default()).unwrap();
    assert_eq!(tensors["t"], t);
}

#[test]
fn tensor_shape_must_match_data() {
    let err = Tensor::new(vec![2, 2], vec![1.0f32; 3]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(matches!(err, TensorFileError::ShapeMismatch { expected: 4, actual: 3, .. }));
}

#[test]
fn overlong_name_is_rejected_before_writing() {
    let name = "n".repeat(u16::MAX as usize + 1);
    let mut sink = Cursor::new(Vec::new());
    let mut writer = TensorWriter::new(&mut sink, WriteOptions::default()).unwrap();
    let err = writer.write([(name, "x")]).unwrap_err();
    assert!(matches!(err, TensorFileError::NameTooLong { len: 65536, .. }), "{err}");
    assert!(sink.get_ref().is_empty());
}

#[test]
fn longest_name_is_accepted() {
    let name = "n".repeat(u16::MAX as usize);
    let data = encode_tensor([(name.clone(), "x")], &WriteOptions::default()).unwrap();
    let tensors = decode_tensor(&data, &ReadOptions::default()).unwrap();
    assert!(tensors.contains(&name));
}

#[test]
fn raw_array_with_wrong_length_is_rejected() {
    let raw = RawArray::new("float64", vec![2, 2], vec![0u8; 31]);
    let err = encode_tensor([("r", raw)], &WriteOptions::default()).unwrap_err();
    assert!(matches!(err, TensorFileError::RawLengthMismatch { expected: 32, actual: 31, .. }));
}

#[test]
fn writes_straight_into_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("direct.bin");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = TensorWriter::new(file, WriteOptions::with_alignment(16)).unwrap();
    let len = writer
        .write([
            ("w", Field::from(Tensor::from_vec(vec![0.25f32; 5]))),
            ("description", Field::from("direct")),
        ])
        .unwrap();
    drop(writer);

    assert_eq!(std::fs::metadata(&path).unwrap().len(), len);
    let tensors = read_tensor(&path).unwrap();
    assert_eq!(decode_string(&tensors["description"]).unwrap(), "direct");
}

#[test]
fn offsets_are_relative_to_the_start_position() {
    let mut sink = Cursor::new(Vec::new());
    sink.write_all(b"prefix!").unwrap();
    let mut writer = TensorWriter::new(&mut sink, WriteOptions::default()).unwrap();
    let len = writer.write([("v", Tensor::from_vec(vec![9u64]))]).unwrap();

    sink.seek(SeekFrom::Start(0)).unwrap();
    let bytes = sink.into_inner();
    assert_eq!(bytes.len() as u64, 7 + len);
    let tensors = decode_tensor(&bytes[7..], &ReadOptions::default()).unwrap();
    assert_eq!(tensors["v"].as_slice::<u64>(), Some(&[9u64][..]));
}
