// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Two-coefficient relational embedding.
//!
//! Each scheduled block carries one bit in the ordering of two mid-frequency
//! DCT coefficients `p1` and `p2`:
//!
//! - bit 1: `c[p1] > c[p2]`
//! - bit 0: `c[p1] < c[p2]`
//!
//! When the relation is wrong the pair is reflected about its mean (a swap),
//! then both values are pushed apart until the gap reaches the margin. The
//! pair mean is preserved, and recompression noise that moves both values
//! alike leaves the ordering intact.
//!
//! Clipping to the 8-bit sample range can undo part of a write. The
//! pipeline then re-reads the pair and calls [`push_toward`], which moves
//! the pair the shortest way back toward the wanted relation, scaled by a
//! growing relaxation factor so saturated blocks still settle.

/// Coefficient distance per unit of strength.
pub const QUANT_STEP: f64 = 16.0;

/// Smallest gap ever written, whatever the strength.
pub const MIN_MARGIN: f64 = 3.0;

/// The coefficient pair used in every block of one block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoefficientPair {
    /// Flat index (`row * block_size + col`) of the first coefficient.
    pub p1: usize,
    /// Flat index of the second coefficient.
    pub p2: usize,
}

impl CoefficientPair {
    /// Mirror-image positions `(q, q+1)` and `(q+1, q)` with `q = block_size / 4`.
    ///
    /// For 8, 12 and 16 this gives (2,3)/(3,2), (3,4)/(4,3) and (4,5)/(5,4):
    /// clear of the DC neighbours and far from the highest-frequency corner.
    pub fn for_block_size(block_size: usize) -> Self {
        let q = block_size / 4;
        Self {
            p1: q * block_size + q + 1,
            p2: (q + 1) * block_size + q,
        }
    }
}

/// Gap between the two coefficients after embedding.
pub fn margin_for_strength(strength: f64) -> f64 {
    (strength * QUANT_STEP).max(MIN_MARGIN)
}

/// Force the pair relation encoding `bit` with at least `margin` separation.
///
/// Blocks that already encode `bit` with enough separation are untouched.
pub fn embed_bit(coeffs: &mut [f64], pair: CoefficientPair, bit: u8, margin: f64) {
    debug_assert!(bit <= 1);
    let a = coeffs[pair.p1];
    let b = coeffs[pair.p2];

    let mean = (a + b) / 2.0;
    let gap = (a - b).abs().max(margin);
    let sign = if bit == 1 { 1.0 } else { -1.0 };

    coeffs[pair.p1] = mean + sign * gap / 2.0;
    coeffs[pair.p2] = mean - sign * gap / 2.0;
}

/// Signed gap of the pair with respect to `bit`: positive when the relation
/// encodes `bit`, negative when it encodes the other bit.
pub fn bit_gap(coeffs: &[f64], pair: CoefficientPair, bit: u8) -> f64 {
    let d = coeffs[pair.p1] - coeffs[pair.p2];
    if bit == 1 {
        d
    } else {
        -d
    }
}

/// Move the pair toward encoding `bit` with gap `margin`, mean preserved.
///
/// The step is `relax` times the shortest move that reaches `margin`.
/// Pairs already at or beyond `margin` are untouched.
pub fn push_toward(coeffs: &mut [f64], pair: CoefficientPair, bit: u8, margin: f64, relax: f64) {
    let gap = bit_gap(coeffs, pair, bit);
    if gap >= margin {
        return;
    }
    let sign = if bit == 1 { 1.0 } else { -1.0 };
    let shift = relax * (margin - gap) / 2.0;
    coeffs[pair.p1] += sign * shift;
    coeffs[pair.p2] -= sign * shift;
}

/// Read the bit encoded by the pair relation. Equal values read as 0.
pub fn read_bit(coeffs: &[f64], pair: CoefficientPair) -> u8 {
    u8::from(coeffs[pair.p1] > coeffs[pair.p2])
}
