// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Request-scoped embedding parameters.
//!
//! Seed, strength and block size travel together as one [`EmbedParams`]
//! value passed explicitly into every call. Embed and extract must agree on
//! `seed` and `block_size`; `strength` only scales the embed-time margin.

use super::error::WatermarkError;

/// Block sizes accepted for the LL-subband DCT grid.
pub const SUPPORTED_BLOCK_SIZES: [usize; 3] = [8, 12, 16];

/// Default block size.
pub const DEFAULT_BLOCK_SIZE: usize = 8;

/// Lowest accepted strength.
pub const MIN_STRENGTH: f64 = 0.1;

/// Highest accepted strength.
pub const MAX_STRENGTH: f64 = 2.0;

/// Default strength.
pub const DEFAULT_STRENGTH: f64 = 0.5;

/// Parameters that fully determine where and how bits are written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbedParams {
    /// Schedule seed.
    pub seed: u64,
    /// Margin scale in `[MIN_STRENGTH, MAX_STRENGTH]`.
    pub strength: f64,
    /// Edge length of the square LL-subband blocks.
    pub block_size: usize,
}

impl EmbedParams {
    /// Build and validate parameters from caller-supplied values.
    ///
    /// The seed is taken as a signed integer so that negative input from an
    /// outer layer is rejected here instead of silently wrapping.
    ///
    /// # Errors
    /// [`WatermarkError::InvalidParameters`] for a negative seed, a strength
    /// outside `[0.1, 2.0]` (or NaN), or a block size other than 8, 12 or 16.
    pub fn new(seed: i64, strength: f64, block_size: usize) -> Result<Self, WatermarkError> {
        if seed < 0 {
            return Err(WatermarkError::InvalidParameters("seed must be non-negative"));
        }
        let params = Self { seed: seed as u64, strength, block_size };
        params.validate()?;
        Ok(params)
    }

    /// Parameters with the default strength and block size.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, strength: DEFAULT_STRENGTH, block_size: DEFAULT_BLOCK_SIZE }
    }

    /// Check strength and block size.
    ///
    /// Every public entry point calls this, so hand-built values are covered
    /// too.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if !(MIN_STRENGTH..=MAX_STRENGTH).contains(&self.strength) {
            return Err(WatermarkError::InvalidParameters("strength must be within [0.1, 2.0]"));
        }
        validate_block_size(self.block_size)
    }
}

/// Reject block sizes outside [`SUPPORTED_BLOCK_SIZES`].
pub fn validate_block_size(block_size: usize) -> Result<(), WatermarkError> {
    if SUPPORTED_BLOCK_SIZES.contains(&block_size) {
        Ok(())
    } else {
        Err(WatermarkError::InvalidParameters("block_size must be 8, 12 or 16"))
    }
}
