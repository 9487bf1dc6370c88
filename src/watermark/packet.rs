// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload bitstream construction and majority-vote recovery.
//!
//! One copy of the payload is laid out as:
//!
//! ```text
//! [32 bits] message length in bytes (big-endian u32)
//! [32 bits] CRC-32 (IEEE) of the message bytes (big-endian u32)
//! [8·N bits] message bytes, MSB first
//! ```
//!
//! The copy is repeated `r ∈ {3, 2, 1}` times, `r` being the largest factor
//! that fits the capacity. On recovery the `r` copies are combined bit by bit
//! with a majority vote (ties resolve to 0), the header is re-parsed from the
//! voted bits and the CRC is recomputed. A CRC mismatch does not discard the
//! message.

use super::capacity::{select_replication, HEADER_BITS};
use super::error::WatermarkError;

/// Packed bitstream ready for scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// `replication` copies of header + payload, concatenated.
    pub bits: Vec<u8>,
    /// Bits in one copy (`64 + 8 × message length`).
    pub copy_bits: usize,
    /// Number of copies in `bits`.
    pub replication: usize,
}

/// Result of [`unpack`].
#[derive(Debug, Clone, PartialEq)]
pub struct Unpacked {
    /// Recovered message bytes (possibly corrupted when `crc_ok` is false).
    pub message: Vec<u8>,
    /// Whether the recomputed CRC matches the one in the header.
    pub crc_ok: bool,
    /// Fraction of bit positions on which every copy agreed.
    pub agreement: f64,
}

/// Bits needed for one header + payload copy of a `message_len`-byte message.
pub fn copy_bits_for(message_len: usize) -> Option<usize> {
    message_len.checked_mul(8)?.checked_add(HEADER_BITS)
}

/// Build the bitstream for `message`, replicated to fit `capacity_bits`.
///
/// # Errors
/// [`WatermarkError::CapacityExceeded`] if one copy does not fit, or the
/// message length does not fit the 32-bit length field.
pub fn pack(message: &[u8], capacity_bits: usize) -> Result<Packet, WatermarkError> {
    let copy_bits = copy_bits_for(message.len())
        .filter(|_| u32::try_from(message.len()).is_ok())
        .ok_or(WatermarkError::CapacityExceeded { required_bits: usize::MAX, capacity_bits })?;

    let replication = select_replication(copy_bits, capacity_bits)
        .ok_or(WatermarkError::CapacityExceeded { required_bits: copy_bits, capacity_bits })?;

    let copy = encode_copy(message);
    debug_assert_eq!(copy.len(), copy_bits);

    let mut bits = Vec::with_capacity(copy_bits * replication);
    for _ in 0..replication {
        bits.extend_from_slice(&copy);
    }

    Ok(Packet { bits, copy_bits, replication })
}

/// One unreplicated copy: header followed by message bits.
fn encode_copy(message: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + message.len());
    bytes.extend_from_slice(&(message.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&crc32fast::hash(message).to_be_bytes());
    bytes.extend_from_slice(message);
    bytes_to_bits(&bytes)
}

/// Parse `(length, crc)` from the first [`HEADER_BITS`] bits.
///
/// Returns `None` if fewer than 64 bits are given.
pub fn parse_header(bits: &[u8]) -> Option<(u32, u32)> {
    if bits.len() < HEADER_BITS {
        return None;
    }
    let header = bits_to_bytes(&bits[..HEADER_BITS]);
    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    let crc = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
    Some((len, crc))
}

/// Recover the message from `replication` equal-length copies.
///
/// Trailing bits that do not fill a whole copy are ignored. If the voted
/// length field points past the end of a copy, the message is cut at the end
/// of the copy and `crc_ok` is false.
pub fn unpack(raw_bits: &[u8], replication: usize) -> Unpacked {
    let r = replication.max(1);
    let copy_bits = raw_bits.len() / r;
    let (voted, agreement) = majority_vote(&raw_bits[..copy_bits * r], copy_bits);

    let Some((len, crc)) = parse_header(&voted) else {
        return Unpacked { message: Vec::new(), crc_ok: false, agreement };
    };

    let available = (copy_bits - HEADER_BITS) / 8;
    let take = (len as usize).min(available);
    let message = bits_to_bytes(&voted[HEADER_BITS..HEADER_BITS + take * 8]);
    let crc_ok = take as u64 == len as u64 && crc32fast::hash(&message) == crc;

    Unpacked { message, crc_ok, agreement }
}

/// Bit-wise majority across sequential copies.
///
/// Copy `j` of bit `i` is at `j * copy_bits + i`. A bit is 1 only if strictly
/// more than half the copies read 1. Also returns the fraction of positions
/// where all copies agree (0 for an empty copy).
pub fn majority_vote(raw_bits: &[u8], copy_bits: usize) -> (Vec<u8>, f64) {
    if copy_bits == 0 {
        return (Vec::new(), 0.0);
    }
    let r = raw_bits.len() / copy_bits;
    let mut voted = Vec::with_capacity(copy_bits);
    let mut unanimous = 0usize;

    for i in 0..copy_bits {
        let ones: usize = (0..r).map(|copy| (raw_bits[copy * copy_bits + i] & 1) as usize).sum();
        voted.push(u8::from(ones * 2 > r));
        if ones == 0 || ones == r {
            unanimous += 1;
        }
    }

    (voted, unanimous as f64 / copy_bits as f64)
}

/// Convert bytes to a bit vector (MSB first within each byte).
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (MSB first) back to bytes.
/// Pads the last byte with zero bits if `bits.len()` is not a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((bits.len() + 7) / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        bytes.push(byte);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let packet = pack(b"hi", 1000).unwrap();
        assert_eq!(packet.copy_bits, 64 + 16);
        assert_eq!(packet.replication, 3);
        let first = bits_to_bytes(&packet.bits[..packet.copy_bits]);
        assert_eq!(&first[..4], &[0, 0, 0, 2]);
        assert_eq!(&first[4..8], &crc32fast::hash(b"hi").to_be_bytes());
        assert_eq!(&first[8..], b"hi");
    }

    #[test]
    fn replication_picks_largest_fit() {
        // copy = 64 + 32 = 96 bits
        assert_eq!(pack(b"abcd", 288).unwrap().replication, 3);
        assert_eq!(pack(b"abcd", 287).unwrap().replication, 2);
        assert_eq!(pack(b"abcd", 191).unwrap().replication, 1);
        assert_eq!(pack(b"abcd", 96).unwrap().bits.len(), 96);
    }

    #[test]
    fn capacity_exceeded_reports_bits() {
        match pack(b"abcd", 95) {
            Err(WatermarkError::CapacityExceeded { required_bits, capacity_bits }) => {
                assert_eq!(required_bits, 96);
                assert_eq!(capacity_bits, 95);
            }
            other => panic!("expected CapacityExceeded, got {other:?}"),
        }
    }

    #[test]
    fn empty_message_is_header_only() {
        let packet = pack(b"", 64).unwrap();
        assert_eq!(packet.bits.len(), 64);
        let out = unpack(&packet.bits, 1);
        assert!(out.crc_ok);
        assert!(out.message.is_empty());
    }

    #[test]
    fn unpack_recovers_message() {
        let packet = pack(b"Hello, watermark", 10_000).unwrap();
        let out = unpack(&packet.bits, packet.replication);
        assert!(out.crc_ok);
        assert_eq!(out.message, b"Hello, watermark");
        assert_eq!(out.agreement, 1.0);
    }

    #[test]
    fn vote_corrects_single_corrupted_copy() {
        let packet = pack(b"vote", 1000).unwrap();
        assert_eq!(packet.replication, 3);
        let mut bits = packet.bits.clone();
        // Flip every bit of the middle copy.
        for b in &mut bits[packet.copy_bits..2 * packet.copy_bits] {
            *b ^= 1;
        }
        let out = unpack(&bits, 3);
        assert!(out.crc_ok);
        assert_eq!(out.message, b"vote");
        assert_eq!(out.agreement, 0.0);
    }

    #[test]
    fn ties_break_toward_zero() {
        let (voted, agreement) = majority_vote(&[1, 0, 1, 1, 0, 1], 3);
        // copy 0 = [1,0,1], copy 1 = [1,0,1]
        assert_eq!(voted, vec![1, 0, 1]);
        assert_eq!(agreement, 1.0);

        let (voted, agreement) = majority_vote(&[1, 1, 0, 1], 2);
        // position 0: 1,0 → tie → 0; position 1: 1,1 → 1
        assert_eq!(voted, vec![0, 1]);
        assert_eq!(agreement, 0.5);
    }

    #[test]
    fn corrupted_payload_returned_with_failing_crc() {
        let packet = pack(b"payload", 200).unwrap();
        assert_eq!(packet.replication, 1);
        let mut bits = packet.bits.clone();
        bits[70] ^= 1;
        let out = unpack(&bits, 1);
        assert!(!out.crc_ok);
        assert_eq!(out.message.len(), 7);
        assert_ne!(out.message, b"payload");
    }

    #[test]
    fn oversized_length_field_is_clamped() {
        let mut bits = pack(b"abc", 200).unwrap().bits;
        bits.truncate(88);
        // Declare 0x7F000000 bytes.
        bits[1..8].iter_mut().for_each(|b| *b = 1);
        let out = unpack(&bits, 1);
        assert!(!out.crc_ok);
        assert_eq!(out.message.len(), 3);
        assert_eq!(&out.message, b"abc");
    }

    #[test]
    fn too_short_for_header() {
        let out = unpack(&[1, 0, 1], 1);
        assert!(!out.crc_ok);
        assert!(out.message.is_empty());
    }

    #[test]
    fn bytes_bits_roundtrip() {
        let original = vec![0xDE, 0xAD, 0xBE, 0xEF];
        let bits = bytes_to_bits(&original);
        assert_eq!(bits.len(), 32);
        assert_eq!(bits_to_bytes(&bits), original);
    }

    #[test]
    fn bits_to_bytes_partial_byte() {
        // 10110_000 = 0xB0
        assert_eq!(bits_to_bytes(&[1, 0, 1, 1, 0]), vec![0xB0]);
    }
}
