// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Orthonormal N×N DCT-II (forward) and DCT-III (inverse).
//!
//! `X[u][v] = c(u) c(v) Σ_y Σ_x x[y][x] cos((2x+1)vπ / 2N) cos((2y+1)uπ / 2N)`
//! with `c(0) = sqrt(1/N)` and `c(k>0) = sqrt(2/N)`. Blocks are row-major,
//! coefficient `(u, v)` sits at index `u * N + v` (`u` = vertical frequency).

/// Cosine and normalization tables for one block size.
#[derive(Debug, Clone)]
pub struct DctBasis {
    n: usize,
    /// `cos[k * n + x] = cos((2x + 1) k π / 2n)`
    cos: Vec<f64>,
    norm: Vec<f64>,
}

impl DctBasis {
    pub fn new(n: usize) -> Self {
        let mut cos = vec![0.0; n * n];
        for k in 0..n {
            for x in 0..n {
                cos[k * n + x] =
                    ((2 * x + 1) as f64 * k as f64 * std::f64::consts::PI / (2 * n) as f64).cos();
            }
        }
        let mut norm = vec![(2.0 / n as f64).sqrt(); n];
        if n > 0 {
            norm[0] = (1.0 / n as f64).sqrt();
        }
        Self { n, cos, norm }
    }

    /// Block edge length.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Forward 2D DCT of an `n × n` block.
    pub fn forward(&self, block: &[f64]) -> Vec<f64> {
        let n = self.n;
        debug_assert_eq!(block.len(), n * n);

        // Rows.
        let mut temp = vec![0.0; n * n];
        for row in 0..n {
            for v in 0..n {
                let mut sum = 0.0;
                for x in 0..n {
                    sum += block[row * n + x] * self.cos[v * n + x];
                }
                temp[row * n + v] = self.norm[v] * sum;
            }
        }

        // Columns.
        let mut coeffs = vec![0.0; n * n];
        for col in 0..n {
            for u in 0..n {
                let mut sum = 0.0;
                for y in 0..n {
                    sum += temp[y * n + col] * self.cos[u * n + y];
                }
                coeffs[u * n + col] = self.norm[u] * sum;
            }
        }
        coeffs
    }

    /// Inverse 2D DCT of an `n × n` coefficient block.
    pub fn inverse(&self, coeffs: &[f64]) -> Vec<f64> {
        let n = self.n;
        debug_assert_eq!(coeffs.len(), n * n);

        // Columns.
        let mut temp = vec![0.0; n * n];
        for col in 0..n {
            for y in 0..n {
                let mut sum = 0.0;
                for u in 0..n {
                    sum += self.norm[u] * coeffs[u * n + col] * self.cos[u * n + y];
                }
                temp[y * n + col] = sum;
            }
        }

        // Rows.
        let mut block = vec![0.0; n * n];
        for row in 0..n {
            for x in 0..n {
                let mut sum = 0.0;
                for v in 0..n {
                    sum += self.norm[v] * temp[row * n + v] * self.cos[v * n + x];
                }
                block[row * n + x] = sum;
            }
        }
        block
    }
}
