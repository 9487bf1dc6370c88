// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Single-frame embed/extract pipeline.
//!
//! Embed:
//! 1. Luminance → Haar → LL subband → block grid
//! 2. Capacity plan + bit packing (fails before any pixel is touched)
//! 3. Seeded schedule: replica `j` of the copy occupies slots
//!    `[j·S, j·S + n)` with `S = floor(capacity / r)`
//! 4. Per slot: DCT, force the coefficient-pair relation for
//!    `bit ⊕ whitening`, inverse DCT
//! 5. Inverse Haar, apply the luminance change to the color channels
//! 6. Settle: clipping to `[0, 255]` can flip pairs in saturated blocks, so
//!    the written frame is re-read and unsettled pairs are pushed back, for
//!    at most [`MAX_SETTLE_PASSES`] rounds
//!
//! Extract reads every slot, then tries `r = 3, 2, 1`: the replica headers
//! are voted, and a candidate is only accepted when its length field is
//! consistent with the replication the embedder would have chosen.

use log::{debug, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::capacity::{self, select_replication, slot_len, CapacityReport, HEADER_BITS, MAX_REPLICATION};
use super::embedding::{bit_gap, embed_bit, margin_for_strength, push_toward, read_bit, CoefficientPair};
use super::error::WatermarkError;
use super::packet::{self, copy_bits_for, majority_vote, parse_header, Unpacked};
use super::params::EmbedParams;
use super::schedule::Schedule;
use crate::frame::Frame;
use crate::metrics;
use crate::transform::{haar, BlockGrid, DctBasis};

/// Confidence scale for a consistent candidate whose CRC failed.
const UNVERIFIED_CONFIDENCE: f64 = 0.9;

/// Re-read and correct rounds after the first write.
const MAX_SETTLE_PASSES: usize = 12;

/// A written pair is settled once its gap reaches this share of the margin.
const SETTLED_SHARE: f64 = 0.75;

/// Cap on the per-block relaxation, which doubles each round a block fails.
const MAX_RELAX: f64 = 64.0;

/// Result of [`embed`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedOutcome {
    /// The watermarked frame, same geometry as the input.
    pub frame: Frame,
    /// PSNR of the watermarked frame against the input, in dB.
    pub psnr: f64,
    /// Number of payload copies written.
    pub replication_factor: usize,
    pub capacity_bits: usize,
    /// Embedded bitstream (all copies, before whitening).
    pub bitstream: Vec<u8>,
}

/// Result of [`extract`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    /// Best-effort message. May be corrupted when `crc_ok` is false.
    pub message: Vec<u8>,
    /// 1.0 for a verified message, lower for unverified guesses.
    pub confidence: f64,
    pub crc_ok: bool,
    /// Replication the message was decoded with.
    pub replication_factor: usize,
    /// Index of the page within a multi-page call, 0 otherwise.
    pub page_index: usize,
    /// Raw bits read for the chosen candidate (all copies, de-whitened).
    pub bitstream: Vec<u8>,
}

impl ExtractionOutcome {
    fn empty() -> Self {
        Self {
            message: Vec::new(),
            confidence: 0.0,
            crc_ok: false,
            replication_factor: 1,
            page_index: 0,
            bitstream: Vec::new(),
        }
    }

    fn from_unpacked(u: Unpacked, replication: usize, confidence: f64, bitstream: Vec<u8>) -> Self {
        Self {
            message: u.message,
            confidence,
            crc_ok: u.crc_ok,
            replication_factor: replication,
            page_index: 0,
            bitstream,
        }
    }
}

/// Capacity of `frame` for `block_size`.
///
/// # Errors
/// [`WatermarkError::InvalidParameters`] for an unsupported block size.
pub fn plan_capacity(frame: &Frame, block_size: usize) -> Result<CapacityReport, WatermarkError> {
    capacity::plan(frame.width(), frame.height(), block_size)
}

/// Embed `message` into `frame`.
///
/// # Errors
/// - [`WatermarkError::InvalidParameters`] if `params` fail validation.
/// - [`WatermarkError::CapacityExceeded`] if one copy of the message does
///   not fit. No pixel is modified in that case.
pub fn embed(frame: &Frame, message: &[u8], params: &EmbedParams) -> Result<EmbedOutcome, WatermarkError> {
    params.validate()?;
    let report = plan_capacity(frame, params.block_size)?;
    let packet = packet::pack(message, report.capacity_bits)?;

    let capacity_bits = report.capacity_bits;
    let slot = slot_len(capacity_bits, packet.replication);
    debug!(
        "embed: {}x{} bs={} grid={}x{} capacity={} message={}B r={} margin={:.2}",
        frame.width(),
        frame.height(),
        params.block_size,
        report.grid_rows,
        report.grid_cols,
        capacity_bits,
        message.len(),
        packet.replication,
        margin_for_strength(params.strength),
    );

    let luma = frame.luma();
    let mut bands = haar::decompose(&luma);
    let grid = BlockGrid::new(frame.width(), frame.height(), params.block_size);
    let schedule = Schedule::new(params.seed, grid.rows, grid.cols);
    let basis = DctBasis::new(params.block_size);
    let pair = CoefficientPair::for_block_size(params.block_size);
    let margin = margin_for_strength(params.strength);

    // (block, raw pair bit) for every written bit, whitening applied.
    let targets: Vec<(usize, u8)> = packet
        .bits
        .iter()
        .enumerate()
        .map(|(k, &bit)| {
            let slot_index = (k / packet.copy_bits) * slot + k % packet.copy_bits;
            (schedule.block(slot_index), bit ^ schedule.whitening(slot_index))
        })
        .collect();

    for &(block_index, bit) in &targets {
        let block = grid.load(&bands.ll, block_index);
        let mut coeffs = basis.forward(&block);
        embed_bit(&mut coeffs, pair, bit, margin);
        grid.store(&mut bands.ll, block_index, &basis.inverse(&coeffs));
    }

    let written = frame.with_luma(&luma, &bands.recompose());
    let watermarked = settle(written, &targets, &grid, &basis, pair, margin);
    let psnr = metrics::psnr(frame, &watermarked)?;
    debug!("embed: {} bits written, PSNR {:.2} dB", packet.bits.len(), psnr);

    Ok(EmbedOutcome {
        frame: watermarked,
        psnr,
        replication_factor: packet.replication,
        capacity_bits,
        bitstream: packet.bits,
    })
}

/// Re-read the written blocks of `frame` and push back every pair that
/// clipping left below [`SETTLED_SHARE`] of `margin`.
///
/// Each round re-derives luminance from the clipped 8-bit frame, exactly as
/// extraction will. A block that fails again gets twice the previous
/// relaxation, so pairs whose pixels sit at 0 or 255 are moved by the
/// pixels that still have room.
fn settle(
    mut frame: Frame,
    targets: &[(usize, u8)],
    grid: &BlockGrid,
    basis: &DctBasis,
    pair: CoefficientPair,
    margin: f64,
) -> Frame {
    let threshold = SETTLED_SHARE * margin;
    let mut relax = vec![1.0f64; targets.len()];

    for pass in 0..MAX_SETTLE_PASSES {
        let luma = frame.luma();
        let mut bands = haar::decompose(&luma);
        let mut unsettled = 0usize;

        for (&(block_index, bit), step) in targets.iter().zip(relax.iter_mut()) {
            let mut coeffs = basis.forward(&grid.load(&bands.ll, block_index));
            if bit_gap(&coeffs, pair, bit) >= threshold {
                continue;
            }
            push_toward(&mut coeffs, pair, bit, margin, *step);
            grid.store(&mut bands.ll, block_index, &basis.inverse(&coeffs));
            *step = (*step * 2.0).min(MAX_RELAX);
            unsettled += 1;
        }

        if unsettled == 0 {
            if pass > 0 {
                debug!("embed: settled after {pass} correction passes");
            }
            return frame;
        }
        trace!("embed: pass {pass}: {unsettled} of {} blocks unsettled", targets.len());
        frame = frame.with_luma(&luma, &bands.recompose());
    }

    warn!("embed: blocks still unsettled after {MAX_SETTLE_PASSES} passes");
    frame
}

/// Extract a message from `frame`.
///
/// Never fails for a valid frame and valid parameters: an unmarked frame, a
/// wrong seed or a frame too small for a header all yield an outcome with
/// `crc_ok == false` and low confidence.
///
/// # Errors
/// [`WatermarkError::InvalidParameters`] if `params` fail validation.
pub fn extract(frame: &Frame, params: &EmbedParams) -> Result<ExtractionOutcome, WatermarkError> {
    params.validate()?;
    let report = plan_capacity(frame, params.block_size)?;
    let capacity_bits = report.capacity_bits;

    if capacity_bits < HEADER_BITS {
        warn!("extract: capacity {capacity_bits} bits cannot hold a header");
        return Ok(ExtractionOutcome::empty());
    }

    let bits = read_slots(frame, params);
    Ok(decode_slots(&bits))
}

/// De-whitened bit of every schedule slot, in slot order.
fn read_slots(frame: &Frame, params: &EmbedParams) -> Vec<u8> {
    let luma = frame.luma();
    let bands = haar::decompose(&luma);
    let grid = BlockGrid::new(frame.width(), frame.height(), params.block_size);
    let schedule = Schedule::new(params.seed, grid.rows, grid.cols);
    let basis = DctBasis::new(params.block_size);
    let pair = CoefficientPair::for_block_size(params.block_size);

    let read = |slot: usize| -> u8 {
        let coeffs = basis.forward(&grid.load(&bands.ll, schedule.block(slot)));
        read_bit(&coeffs, pair) ^ schedule.whitening(slot)
    };

    #[cfg(feature = "parallel")]
    let bits: Vec<u8> = (0..schedule.len()).into_par_iter().map(read).collect();
    #[cfg(not(feature = "parallel"))]
    let bits: Vec<u8> = (0..schedule.len()).map(read).collect();

    bits
}

/// Bits of replicas `0..r`, each `len` bits taken from the start of its slot.
fn gather(bits: &[u8], replication: usize, slot: usize, len: usize) -> Vec<u8> {
    let mut raw = Vec::with_capacity(replication * len);
    for j in 0..replication {
        raw.extend_from_slice(&bits[j * slot..j * slot + len]);
    }
    raw
}

/// Pick the best decoding of the slot bits.
fn decode_slots(bits: &[u8]) -> ExtractionOutcome {
    let capacity_bits = bits.len();
    let mut fallback: Option<ExtractionOutcome> = None;

    for r in (1..=MAX_REPLICATION).rev() {
        let slot = slot_len(capacity_bits, r);
        if slot < HEADER_BITS {
            continue;
        }

        let (voted, _) = majority_vote(&gather(bits, r, slot, HEADER_BITS), HEADER_BITS);
        let Some((len, _)) = parse_header(&voted) else {
            continue;
        };
        let copy_bits = match copy_bits_for(len as usize) {
            Some(n) if n <= slot && select_replication(n, capacity_bits) == Some(r) => n,
            _ => {
                trace!("extract: r={r} rejected, declared length {len} inconsistent");
                continue;
            }
        };

        let raw = gather(bits, r, slot, copy_bits);
        let unpacked = packet::unpack(&raw, r);
        trace!("extract: r={r} len={len} crc_ok={} agreement={:.3}", unpacked.crc_ok, unpacked.agreement);

        if unpacked.crc_ok {
            debug!("extract: verified {}B message at r={r}", unpacked.message.len());
            return ExtractionOutcome::from_unpacked(unpacked, r, 1.0, raw);
        }
        if fallback.is_none() {
            let confidence = if r == 1 { 0.0 } else { UNVERIFIED_CONFIDENCE * unpacked.agreement };
            fallback = Some(ExtractionOutcome::from_unpacked(unpacked, r, confidence, raw));
        }
    }

    if let Some(outcome) = fallback {
        warn!(
            "extract: no candidate passed CRC, returning r={} guess (confidence {:.2})",
            outcome.replication_factor, outcome.confidence
        );
        return outcome;
    }

    warn!("extract: no consistent header, returning single-copy decode");
    let unpacked = packet::unpack(bits, 1);
    let confidence = if unpacked.crc_ok { 1.0 } else { 0.0 };
    ExtractionOutcome::from_unpacked(unpacked, 1, confidence, bits.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Slot bits exactly as [`embed`] lays them out, before whitening.
    fn layout(message: &[u8], capacity_bits: usize) -> Vec<u8> {
        let p = packet::pack(message, capacity_bits).unwrap();
        let slot = slot_len(capacity_bits, p.replication);
        let mut bits = vec![0u8; capacity_bits];
        for (k, &b) in p.bits.iter().enumerate() {
            bits[(k / p.copy_bits) * slot + k % p.copy_bits] = b;
        }
        bits
    }

    #[test]
    fn decodes_each_replication() {
        for (capacity, expected_r) in [(1000, 3), (250, 2), (150, 1)] {
            let bits = layout(b"hello", capacity);
            let out = decode_slots(&bits);
            assert!(out.crc_ok, "capacity {capacity}");
            assert_eq!(out.message, b"hello");
            assert_eq!(out.replication_factor, expected_r);
            assert_eq!(out.confidence, 1.0);
        }
    }

    #[test]
    fn vote_repairs_one_bad_replica() {
        let capacity = 900;
        let mut bits = layout(b"robust", capacity);
        // Corrupt the whole second replica slot, header included.
        for b in &mut bits[300..300 + 112] {
            *b ^= 1;
        }
        let out = decode_slots(&bits);
        assert!(out.crc_ok);
        assert_eq!(out.message, b"robust");
    }

    #[test]
    fn failed_crc_scales_confidence_by_agreement() {
        let capacity = 900;
        let mut bits = layout(b"abcd", capacity);
        // Same payload bit flipped in two replicas: vote keeps the flip.
        bits[70] ^= 1;
        bits[300 + 70] ^= 1;
        let out = decode_slots(&bits);
        assert!(!out.crc_ok);
        assert_eq!(out.replication_factor, 3);
        assert_eq!(out.message.len(), 4);
        let copy_bits = 64 + 32;
        let expected = UNVERIFIED_CONFIDENCE * (copy_bits - 1) as f64 / copy_bits as f64;
        assert!((out.confidence - expected).abs() < 1e-12);
    }

    #[test]
    fn garbage_falls_back_to_zero_confidence() {
        // All ones: length field 0xFFFFFFFF is never consistent.
        let out = decode_slots(&vec![1u8; 500]);
        assert!(!out.crc_ok);
        assert_eq!(out.confidence, 0.0);
        assert_eq!(out.replication_factor, 1);
        assert_eq!(out.message.len(), (500 - 64) / 8);
    }

    /// Black bars on white: nearly every sample sits at 0 or 255.
    fn bars(width: usize, height: usize) -> Frame {
        let data = (0..width * height)
            .map(|i| if (i % width) % 11 < 4 || (i / width) % 17 < 3 { 0 } else { 255 })
            .collect();
        Frame::new(width, height, 1, data).unwrap()
    }

    #[test]
    fn saturated_frame_settles_every_written_bit() {
        let frame = bars(256, 256);
        for strength in [0.1, 0.5] {
            let params = EmbedParams::new(7, strength, 8).unwrap();
            let marked = embed(&frame, b"text", &params).unwrap();
            let expected = layout(b"text", marked.capacity_bits);
            let read = read_slots(&marked.frame, &params);
            let copy_bits = HEADER_BITS + 32;
            let slot = slot_len(marked.capacity_bits, marked.replication_factor);
            for j in 0..marked.replication_factor {
                let range = j * slot..j * slot + copy_bits;
                assert_eq!(read[range.clone()], expected[range], "strength {strength} replica {j}");
            }
        }
    }

    #[test]
    fn settle_leaves_settled_frame_alone() {
        let frame = bars(128, 128);
        let grid = BlockGrid::new(128, 128, 8);
        let basis = DctBasis::new(8);
        let pair = CoefficientPair::for_block_size(8);
        let bands = haar::decompose(&frame.luma());
        // Ask each block for the bit it already carries, with a tiny margin.
        let targets: Vec<(usize, u8)> = (0..grid.total_blocks())
            .filter_map(|b| {
                let coeffs = basis.forward(&grid.load(&bands.ll, b));
                let gap = coeffs[pair.p1] - coeffs[pair.p2];
                (gap.abs() > 1.0).then(|| (b, u8::from(gap > 0.0)))
            })
            .collect();
        let settled = settle(frame.clone(), &targets, &grid, &basis, pair, 1.0);
        assert_eq!(settled, frame);
    }

    #[test]
    fn empty_message_roundtrip_in_slots() {
        let bits = layout(b"", 200);
        let out = decode_slots(&bits);
        assert!(out.crc_ok);
        assert!(out.message.is_empty());
        assert_eq!(out.replication_factor, 3);
    }
}
