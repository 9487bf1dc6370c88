// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Quality and fidelity metrics.
//!
//! - [`psnr`]: peak signal-to-noise ratio over every sample of two frames
//!   (peak 255). Identical frames give `f64::INFINITY`.
//! - [`bit_accuracy`]: fraction of expected bits reproduced.
//! - [`byte_bit_accuracy`]: the same over byte strings, bit by bit.

use crate::frame::Frame;
use crate::watermark::packet::bytes_to_bits;
use crate::watermark::WatermarkError;

/// Combined report returned by [`compute_metrics`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// PSNR in dB, `+∞` when the frames are identical.
    pub psnr: f64,
    /// Fraction of embedded bits read back correctly.
    pub bit_accuracy: f64,
}

/// PSNR between two frames of identical geometry.
///
/// # Errors
/// [`WatermarkError::GeometryMismatch`] if width, height or channel count
/// differ.
pub fn psnr(original: &Frame, compared: &Frame) -> Result<f64, WatermarkError> {
    if !original.same_geometry(compared) {
        return Err(WatermarkError::GeometryMismatch("frames must share the same shape for PSNR"));
    }

    let sse: f64 = original
        .data()
        .iter()
        .zip(compared.data())
        .map(|(&a, &b)| {
            let d = a as f64 - b as f64;
            d * d
        })
        .sum();
    if sse == 0.0 {
        return Ok(f64::INFINITY);
    }
    let mse = sse / original.data().len() as f64;
    Ok(10.0 * (255.0 * 255.0 / mse).log10())
}

/// Fraction of `expected` bits matched by `actual` at the same position.
///
/// Positions missing from a shorter `actual` count as errors; extra bits in
/// `actual` are ignored. An empty `expected` scores 1.0 only against an
/// empty `actual`.
pub fn bit_accuracy(expected: &[u8], actual: &[u8]) -> f64 {
    if expected.is_empty() {
        return if actual.is_empty() { 1.0 } else { 0.0 };
    }
    let matches = expected
        .iter()
        .zip(actual)
        .filter(|(e, a)| (*e & 1) == (*a & 1))
        .count();
    matches as f64 / expected.len() as f64
}

/// Bit accuracy between two byte strings (MSB first). A shorter `actual` is
/// padded with zero bytes.
pub fn byte_bit_accuracy(expected: &[u8], actual: &[u8]) -> f64 {
    if expected.is_empty() {
        return if actual.is_empty() { 1.0 } else { 0.0 };
    }
    let mut padded = actual.to_vec();
    if padded.len() < expected.len() {
        padded.resize(expected.len(), 0);
    }
    bit_accuracy(&bytes_to_bits(expected), &bytes_to_bits(&padded))
}

/// PSNR and bit accuracy in one call.
pub fn compute_metrics(
    original: &Frame,
    watermarked: &Frame,
    embedded_bits: &[u8],
    extracted_bits: &[u8],
) -> Result<Metrics, WatermarkError> {
    Ok(Metrics {
        psnr: psnr(original, watermarked)?,
        bit_accuracy: bit_accuracy(embedded_bits, extracted_bits),
    })
}
