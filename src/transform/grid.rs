// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Block grid over the LL subband.
//!
//! The grid covers `floor(width/2) × floor(height/2)` of the subband, i.e.
//! only samples derived from real pixels. Any padding row or column added for
//! odd frame dimensions lies outside every block.

use super::Plane;

/// Grid dimensions `(rows, cols)` for a frame of `width × height` pixels.
pub fn grid_dims(width: usize, height: usize, block_size: usize) -> (usize, usize) {
    if block_size == 0 {
        return (0, 0);
    }
    (height / 2 / block_size, width / 2 / block_size)
}

/// Raster-ordered grid of `block_size × block_size` LL blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    pub block_size: usize,
    pub rows: usize,
    pub cols: usize,
}

impl BlockGrid {
    /// Grid for a frame of `width × height` pixels.
    pub fn new(width: usize, height: usize, block_size: usize) -> Self {
        let (rows, cols) = grid_dims(width, height, block_size);
        Self { block_size, rows, cols }
    }

    pub fn total_blocks(&self) -> usize {
        self.rows * self.cols
    }

    /// Top-left subband coordinate of block `index` (raster order).
    fn origin(&self, index: usize) -> (usize, usize) {
        let row = index / self.cols;
        let col = index % self.cols;
        (col * self.block_size, row * self.block_size)
    }

    /// Copy block `index` out of `ll` (row-major).
    pub fn load(&self, ll: &Plane, index: usize) -> Vec<f64> {
        let bs = self.block_size;
        let (x0, y0) = self.origin(index);
        let mut block = Vec::with_capacity(bs * bs);
        for y in 0..bs {
            let start = (y0 + y) * ll.width + x0;
            block.extend_from_slice(&ll.data[start..start + bs]);
        }
        block
    }

    /// Write `block` back into `ll` at block `index`.
    pub fn store(&self, ll: &mut Plane, index: usize, block: &[f64]) {
        let bs = self.block_size;
        let (x0, y0) = self.origin(index);
        for y in 0..bs {
            let start = (y0 + y) * ll.width + x0;
            ll.data[start..start + bs].copy_from_slice(&block[y * bs..(y + 1) * bs]);
        }
    }
}
