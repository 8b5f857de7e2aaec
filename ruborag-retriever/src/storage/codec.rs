//! Binary encoding of embedding vectors.
//!
//! A vector is stored as its elements in order, each a 4-byte little-endian
//! IEEE-754 float, with no header. The blob length is always `4 * dimension`.

use crate::error::{Result, RetrieverError};

const F32_WIDTH: usize = std::mem::size_of::<f32>();

/// Encodes a vector as a little-endian `f32` blob.
#[cfg(target_endian = "little")]
pub fn encode(vector: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice::<f32, u8>(vector).to_vec()
}

/// Encodes a vector as a little-endian `f32` blob.
#[cfg(not(target_endian = "little"))]
pub fn encode(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decodes a blob produced by [`encode`].
///
/// Fails with [`RetrieverError::CorruptBlob`] when the length is not a
/// multiple of four.
pub fn decode(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % F32_WIDTH != 0 {
        return Err(RetrieverError::corrupt_blob(format!(
            "length {} is not a multiple of {F32_WIDTH}",
            blob.len()
        )));
    }
    Ok(decode_aligned(blob))
}

/// Number of elements a well-formed blob of `len` bytes holds.
pub fn dimension_of(len: usize) -> Option<usize> {
    (len % F32_WIDTH == 0).then_some(len / F32_WIDTH)
}

#[cfg(target_endian = "little")]
fn decode_aligned(blob: &[u8]) -> Vec<f32> {
    // Blobs read from SQLite carry no alignment guarantee, so copy rather than cast in place.
    bytemuck::pod_collect_to_vec(blob)
}

#[cfg(not(target_endian = "little"))]
fn decode_aligned(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(F32_WIDTH)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
