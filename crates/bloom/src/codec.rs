//! The serialized filter envelope.
//!
//! Binary layer (all integers little-endian):
//!
//! ```text
//! [m: u64][k: u64][s0: u64][s1: u64][bit bytes: ceil(m/8)]
//! ```
//!
//! The binary layer is zlib-compressed, and the compressed bytes are wrapped
//! in standard base64 with no line breaks. There is no version byte;
//! compatibility is by exact header layout.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::hashing::HashSeeds;
use crate::sizing::FilterParams;
use crate::{BloomFilter, FilterError};

/// `m`, `k`, `s0`, `s1`, eight bytes each.
const HEADER_BYTES: usize = 32;

pub(crate) fn encode(filter: &BloomFilter) -> Result<String, FilterError> {
    let mut raw = Vec::with_capacity(HEADER_BYTES + filter.raw_data().len());
    raw.write_u64::<LittleEndian>(filter.bit_count())?;
    raw.write_u64::<LittleEndian>(filter.hash_count())?;
    raw.write_u64::<LittleEndian>(filter.seeds().s0())?;
    raw.write_u64::<LittleEndian>(filter.seeds().s1())?;
    raw.extend_from_slice(filter.raw_data());

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    let compressed = encoder.finish()?;

    Ok(BASE64.encode(compressed))
}

pub(crate) fn decode(envelope: &str) -> Result<BloomFilter, FilterError> {
    let compressed = BASE64.decode(envelope)?;

    let mut raw = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut raw)
        .map_err(FilterError::Decompression)?;

    if raw.len() < HEADER_BYTES {
        return Err(FilterError::CorruptHeader("truncated header"));
    }
    let mut header = &raw[..HEADER_BYTES];
    let m = header.read_u64::<LittleEndian>()?;
    let k = header.read_u64::<LittleEndian>()?;
    let s0 = header.read_u64::<LittleEndian>()?;
    let s1 = header.read_u64::<LittleEndian>()?;

    if m == 0 || m % 2 == 0 {
        return Err(FilterError::CorruptHeader("bit count must be odd"));
    }
    if k == 0 {
        return Err(FilterError::CorruptHeader("hash count must be nonzero"));
    }
    let body = &raw[HEADER_BYTES..];
    if body.len() as u64 != m.div_ceil(8) {
        return Err(FilterError::CorruptHeader(
            "bit bytes do not match bit count",
        ));
    }

    Ok(BloomFilter::from_wire(
        FilterParams::from_wire(m, k),
        HashSeeds::from_wire(s0, s1),
        body.to_vec(),
    ))
}
