//! The sponge primitive and the big-endian boundary codecs.
//!
//! The engine consumes `H(bytes) -> 32 bytes` as an abstract primitive. The
//! concrete sponge below is a deployment parameter: miners and verifiers
//! must agree on it, and swapping it is a one-line change at this seam.

use crate::{H256, U512};
use sha3::{Digest, Sha3_256};

/// `H(bytes) -> 32 bytes`.
pub fn sha3(bytes: &[u8]) -> H256 {
    H256(Sha3_256::digest(bytes).into())
}

/// The per-seed root value: `decode_be(H(seed))^2`.
///
/// The square is exact, not reduced: a 256-bit value squared fits in 512
/// bits. This value is entry `0` of the seed's DAG.
pub fn seed_hash(seed: &[u8]) -> U512 {
    let h = U512::from_big_endian(sha3(seed).as_bytes());
    h.full_mul(h).to_u512()
}

/// The starting mix for a `(header, nonce)` pair:
/// `decode_be(H(header || encode_be64(nonce)))^2`.
pub fn seal_hash(header: &[u8], nonce: u64) -> U512 {
    let mut input = Vec::with_capacity(header.len() + 64);
    input.extend_from_slice(header);
    input.extend_from_slice(&encode_be64(nonce));
    let h = U512::from_big_endian(sha3(&input).as_bytes());
    h.full_mul(h).to_u512()
}

/// Encodes a nonce as exactly 64 big-endian bytes, zero-padded on the left.
pub fn encode_be64(nonce: u64) -> [u8; 64] {
    let mut buf = [0u8; 64];
    buf[56..].copy_from_slice(&nonce.to_be_bytes());
    buf
}

/// Interprets an arbitrary-length byte string as a big-endian integer and
/// reduces it modulo `m`, without materializing the full value.
pub fn decode_be_mod(bytes: &[u8], m: usize) -> usize {
    debug_assert!(m != 0);
    let m = m as u128;
    bytes
        .iter()
        .fold(0u128, |acc, &byte| ((acc << 8) | u128::from(byte)) % m) as usize
}
