// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Signal transforms used by the watermark codec.
//!
//! - [`haar`]: single-level 2D Haar wavelet split into LL/H/V/D subbands
//! - [`dct`]: orthonormal N×N DCT-II and its inverse
//! - [`grid`]: the non-overlapping block grid laid over the LL subband
//!
//! All transforms operate on [`Plane`], a row-major `f64` sample buffer.

pub mod dct;
pub mod grid;
pub mod haar;

pub use dct::DctBasis;
pub use grid::BlockGrid;
pub use haar::Subbands;

/// Row-major single-channel `f64` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

impl Plane {
    /// Zero-filled plane.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, data: vec![0.0; width * height] }
    }

    /// Wrap an existing buffer. `data.len()` must equal `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self { width, height, data }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        self.data[y * self.width + x] = value;
    }
}
