// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Capacity planning.
//!
//! Capacity depends on frame geometry and block size only, never on message
//! content. One LL-subband block carries one bit, so the capacity in bits is
//! the number of whole blocks that fit the half-resolution subband:
//!
//! ```text
//! grid_rows = floor(height / 2 / block_size)
//! grid_cols = floor(width  / 2 / block_size)
//! capacity_bits = grid_rows * grid_cols
//! ```
//!
//! Replica `j` of an `r`-times replicated copy starts at schedule slot
//! `j * floor(capacity_bits / r)`, so each replica owns a slot of
//! `floor(capacity_bits / r)` bits of which [`HEADER_BITS`] are header.
//!
//! The advertised maximum spreads the space left after one header over the
//! default replication, `floor((capacity_bits - 64) / r / 8)`. A message of
//! that size always embeds, though [`select_replication`] may store it with
//! fewer copies than `r` when the three slot headers do not leave room.

use super::error::WatermarkError;
use super::params::validate_block_size;
use crate::transform::grid::grid_dims;

/// Length (32) + CRC-32 (32) header bits in front of every copy.
pub const HEADER_BITS: usize = 64;

/// Replication factor used whenever capacity allows it.
pub const MAX_REPLICATION: usize = 3;

/// Capacity of one frame for one block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    /// Total bits the block grid can carry.
    pub capacity_bits: usize,
    /// `floor((capacity_bits - 64) / replication_factor / 8)`.
    pub max_message_bytes: usize,
    /// 3, or 1 when three header copies do not fit.
    pub replication_factor: usize,
    /// Frame width in pixels.
    pub width: usize,
    /// Frame height in pixels.
    pub height: usize,
    pub block_size: usize,
    pub grid_rows: usize,
    pub grid_cols: usize,
    /// Largest message for replication 1, 2 and 3 (index 0, 1, 2).
    pub max_message_bytes_by_replication: [usize; MAX_REPLICATION],
}

/// Bits owned by each replica slot.
pub fn slot_len(capacity_bits: usize, replication: usize) -> usize {
    capacity_bits / replication.max(1)
}

/// Largest message that fits `replication` copies into `capacity_bits`.
pub fn max_message_bytes_for(capacity_bits: usize, replication: usize) -> usize {
    slot_len(capacity_bits, replication).saturating_sub(HEADER_BITS) / 8
}

/// Advertised maximum message size for `capacity_bits`.
pub fn planned_max_message_bytes(capacity_bits: usize) -> usize {
    capacity_bits.saturating_sub(HEADER_BITS) / default_replication(capacity_bits) / 8
}

/// Replication reported by the planner: 3, unless the capacity cannot hold
/// three header copies.
pub fn default_replication(capacity_bits: usize) -> usize {
    if slot_len(capacity_bits, MAX_REPLICATION) >= HEADER_BITS {
        MAX_REPLICATION
    } else {
        1
    }
}

/// Largest replication in {3, 2, 1} whose replicated copies fit.
///
/// Returns `None` when a single copy does not fit.
pub fn select_replication(copy_bits: usize, capacity_bits: usize) -> Option<usize> {
    (1..=MAX_REPLICATION)
        .rev()
        .find(|&r| copy_bits.checked_mul(r).map_or(false, |total| total <= capacity_bits))
}

/// Plan capacity for a `width × height` frame.
///
/// A frame too small for even the header yields `capacity_bits < 64` and
/// `max_message_bytes == 0`; that is a valid report, not an error.
///
/// # Errors
/// [`WatermarkError::InvalidParameters`] for an unsupported block size.
pub fn plan(width: usize, height: usize, block_size: usize) -> Result<CapacityReport, WatermarkError> {
    validate_block_size(block_size)?;

    let (grid_rows, grid_cols) = grid_dims(width, height, block_size);
    let capacity_bits = grid_rows * grid_cols;
    let replication_factor = default_replication(capacity_bits);

    let mut by_replication = [0usize; MAX_REPLICATION];
    for (i, slot) in by_replication.iter_mut().enumerate() {
        *slot = max_message_bytes_for(capacity_bits, i + 1);
    }

    Ok(CapacityReport {
        capacity_bits,
        max_message_bytes: planned_max_message_bytes(capacity_bits),
        replication_factor,
        width,
        height,
        block_size,
        grid_rows,
        grid_cols,
        max_message_bytes_by_replication: by_replication,
    })
}
