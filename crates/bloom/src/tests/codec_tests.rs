use std::io::Write;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::{BloomFilter, FilterError, HashSeeds};

/// Wraps raw bytes the way `serialize` does: zlib, then base64.
fn envelope_of(raw: &[u8]) -> String {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).unwrap();
    BASE64.encode(encoder.finish().unwrap())
}

/// Builds a binary header plus bit bytes for tamper tests.
fn raw_filter(m: u64, k: u64, s0: u64, s1: u64, body: &[u8]) -> Vec<u8> {
    let mut raw = Vec::new();
    raw.write_u64::<LittleEndian>(m).unwrap();
    raw.write_u64::<LittleEndian>(k).unwrap();
    raw.write_u64::<LittleEndian>(s0).unwrap();
    raw.write_u64::<LittleEndian>(s1).unwrap();
    raw.extend_from_slice(body);
    raw
}

// -------------------- Round trip --------------------

#[test]
fn roundtrip_preserves_filter() {
    let mut bf = BloomFilter::new(100.0, 0.1).unwrap();
    bf.add_by_hash("abcdef");

    let envelope = bf.serialize().unwrap();
    let restored = BloomFilter::deserialize(&envelope).unwrap();

    assert_eq!(restored.raw_data(), bf.raw_data());
    assert_eq!(restored.bit_count(), bf.bit_count());
    assert_eq!(restored.hash_count(), bf.hash_count());
    assert_eq!(restored.seeds(), bf.seeds());
    assert!(restored.test_by_hash("abcdef"));
}

#[test]
fn roundtrip_empty_filter() {
    let bf = BloomFilter::new(5.0, 0.5).unwrap();
    let restored = BloomFilter::deserialize(&bf.serialize().unwrap()).unwrap();
    assert_eq!(restored.raw_data(), bf.raw_data());
}

#[test]
fn roundtrip_after_many_inserts() {
    let mut bf = BloomFilter::new(500.0, 0.01).unwrap();
    for i in 0..500u64 {
        bf.add_by_hash(&i);
    }

    let restored = BloomFilter::deserialize(&bf.serialize().unwrap()).unwrap();
    assert_eq!(restored.raw_data(), bf.raw_data());
    for i in 0..500u64 {
        assert!(restored.test_by_hash(&i), "key {} missing after roundtrip", i);
    }
}

#[test]
fn envelope_has_no_line_breaks() {
    let mut bf = BloomFilter::new(10_000.0, 1e-3).unwrap();
    for i in 0..10_000u64 {
        bf.add_by_hash(&i);
    }
    let envelope = bf.serialize().unwrap();
    assert!(!envelope.contains('\n'));
    assert!(!envelope.contains('\r'));
}

#[test]
fn identical_seeds_serialize_identically() {
    let seeds = HashSeeds::new(42, 43).unwrap();
    let mut a = BloomFilter::with_seeds(100.0, 0.1, seeds).unwrap();
    let mut b = BloomFilter::with_seeds(100.0, 0.1, seeds).unwrap();

    a.add_by_hash("abcdef");
    b.add_by_hash("abcdef");

    assert_eq!(a.serialize().unwrap(), b.serialize().unwrap());
}

// -------------------- Error taxonomy --------------------

#[test]
fn rejects_input_that_is_not_base64() {
    let err = BloomFilter::deserialize("abc").unwrap_err();
    assert!(matches!(err, FilterError::Envelope(_)));
}

#[test]
fn rejects_base64_that_is_not_zlib() {
    let err = BloomFilter::deserialize(&BASE64.encode(b"abc")).unwrap_err();
    assert!(matches!(err, FilterError::Decompression(_)));
}

#[test]
fn rejects_truncated_header() {
    let err = BloomFilter::deserialize(&envelope_of(b"abc")).unwrap_err();
    assert!(matches!(err, FilterError::CorruptHeader(_)));
}

#[test]
fn rejects_even_bit_count() {
    let raw = raw_filter(8, 3, 1, 2, &[0]);
    let err = BloomFilter::deserialize(&envelope_of(&raw)).unwrap_err();
    assert!(matches!(err, FilterError::CorruptHeader(_)));
}

#[test]
fn rejects_zero_bit_count() {
    let raw = raw_filter(0, 3, 1, 2, &[]);
    let err = BloomFilter::deserialize(&envelope_of(&raw)).unwrap_err();
    assert!(matches!(err, FilterError::CorruptHeader(_)));
}

#[test]
fn rejects_zero_hash_count() {
    let raw = raw_filter(9, 0, 1, 2, &[0, 0]);
    let err = BloomFilter::deserialize(&envelope_of(&raw)).unwrap_err();
    assert!(matches!(err, FilterError::CorruptHeader(_)));
}

#[test]
fn rejects_body_length_mismatch() {
    // m = 9 needs exactly 2 bytes of bits.
    let raw = raw_filter(9, 1, 1, 2, &[0, 0, 0, 0, 0]);
    let err = BloomFilter::deserialize(&envelope_of(&raw)).unwrap_err();
    assert!(matches!(err, FilterError::CorruptHeader(_)));
}

#[test]
fn accepts_handcrafted_minimal_filter() {
    // m = 9, k = 1, one set bit; decodes into a working filter.
    let raw = raw_filter(9, 1, 1, 2, &[0b0000_0001, 0]);
    let bf = BloomFilter::deserialize(&envelope_of(&raw)).unwrap();
    assert_eq!(bf.bit_count(), 9);
    assert_eq!(bf.hash_count(), 1);
    assert_eq!(bf.byte_size(), 2);
    assert_eq!(bf.raw_data(), &[1, 0]);
}
