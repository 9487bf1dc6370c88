// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Seeded block traversal order and whitening keystream.
//!
//! Embedder and extractor must visit blocks in the same order without any
//! side channel, so the schedule is a pure function of
//! `(seed, grid_rows, grid_cols)`. The algorithm is fixed and part of the
//! on-image format:
//!
//! 1. `key = SHA-256("dwtmark/schedule/v1" ‖ seed as u64 LE ‖ rows as u32 LE ‖ cols as u32 LE)`
//! 2. `rng = ChaCha20Rng::from_seed(key)`
//! 3. Fisher-Yates over `0..rows*cols`, from the last index down to 1,
//!    swapping `i` with `rng.gen_range(0..=i as u32)`
//! 4. Whitening: one `rng.next_u32()` per 32 slots, bits taken LSB first
//!
//! # Cross-platform portability
//!
//! The shuffle uses `u32` for `gen_range` (not `usize`) so that the PRNG
//! consumes the same entropy per step on 32- and 64-bit targets.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

/// Domain separation tag for the schedule key.
const SCHEDULE_TAG: &[u8] = b"dwtmark/schedule/v1";

/// Block visiting order plus per-slot whitening bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    order: Vec<u32>,
    whitening: Vec<u8>,
}

impl Schedule {
    /// Build the schedule for a `grid_rows × grid_cols` block grid.
    pub fn new(seed: u64, grid_rows: usize, grid_cols: usize) -> Self {
        let total = grid_rows * grid_cols;
        let mut rng = ChaCha20Rng::from_seed(derive_key(seed, grid_rows, grid_cols));

        let mut order: Vec<u32> = (0..total as u32).collect();
        for i in (1..total).rev() {
            let j = rng.gen_range(0..=(i as u32)) as usize;
            order.swap(i, j);
        }

        let mut whitening = Vec::with_capacity(total);
        while whitening.len() < total {
            let word = rng.next_u32();
            for bit in 0..32 {
                if whitening.len() == total {
                    break;
                }
                whitening.push(((word >> bit) & 1) as u8);
            }
        }

        Self { order, whitening }
    }

    /// Number of schedule slots (= blocks in the grid).
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Raster index of the block visited at `slot`.
    pub fn block(&self, slot: usize) -> usize {
        self.order[slot] as usize
    }

    /// Whitening bit XORed onto the payload bit at `slot`.
    pub fn whitening(&self, slot: usize) -> u8 {
        self.whitening[slot]
    }
}

fn derive_key(seed: u64, grid_rows: usize, grid_cols: usize) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SCHEDULE_TAG);
    hasher.update(seed.to_le_bytes());
    hasher.update((grid_rows as u32).to_le_bytes());
    hasher.update((grid_cols as u32).to_le_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    key
}
