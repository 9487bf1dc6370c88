// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Single-level orthonormal 2D Haar transform.
//!
//! Each 2×2 pixel quad `[a b; c d]` maps to one sample of each subband:
//!
//! ```text
//! LL = (a + b + c + d) / 2     H = (a + b - c - d) / 2
//! V  = (a - b + c - d) / 2     D = (a - b - c + d) / 2
//! ```
//!
//! The transform is its own inverse up to the same 1/2 scale, so energy is
//! preserved and a change of `δ` in LL spreads `δ/2` over the four pixels.
//! Odd dimensions are padded by repeating the last row/column; the padding
//! is cropped again by [`Subbands::recompose`].

use super::Plane;

/// The four half-resolution subbands of one decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Subbands {
    /// Approximation subband. The only one the codec modifies.
    pub ll: Plane,
    pub h: Plane,
    pub v: Plane,
    pub d: Plane,
    /// Width of the plane before padding.
    pub width: usize,
    /// Height of the plane before padding.
    pub height: usize,
}

/// Split `plane` into LL/H/V/D subbands of size `ceil(w/2) × ceil(h/2)`.
pub fn decompose(plane: &Plane) -> Subbands {
    let (w, h) = (plane.width, plane.height);
    let hw = (w + 1) / 2;
    let hh = (h + 1) / 2;

    let mut ll = Plane::new(hw, hh);
    let mut hb = Plane::new(hw, hh);
    let mut vb = Plane::new(hw, hh);
    let mut db = Plane::new(hw, hh);

    // Edge-replicated sample lookup.
    let px = |x: usize, y: usize| plane.get(x.min(w - 1), y.min(h - 1));

    for y in 0..hh {
        for x in 0..hw {
            let a = px(2 * x, 2 * y);
            let b = px(2 * x + 1, 2 * y);
            let c = px(2 * x, 2 * y + 1);
            let d = px(2 * x + 1, 2 * y + 1);
            ll.set(x, y, (a + b + c + d) * 0.5);
            hb.set(x, y, (a + b - c - d) * 0.5);
            vb.set(x, y, (a - b + c - d) * 0.5);
            db.set(x, y, (a - b - c + d) * 0.5);
        }
    }

    Subbands { ll, h: hb, v: vb, d: db, width: w, height: h }
}

impl Subbands {
    /// Inverse transform, cropped to the original plane size.
    pub fn recompose(&self) -> Plane {
        let (w, h) = (self.width, self.height);
        let mut out = Plane::new(w, h);

        for y in 0..self.ll.height {
            for x in 0..self.ll.width {
                let ll = self.ll.get(x, y);
                let hb = self.h.get(x, y);
                let vb = self.v.get(x, y);
                let db = self.d.get(x, y);
                let quad = [
                    (2 * x, 2 * y, (ll + hb + vb + db) * 0.5),
                    (2 * x + 1, 2 * y, (ll + hb - vb - db) * 0.5),
                    (2 * x, 2 * y + 1, (ll - hb + vb - db) * 0.5),
                    (2 * x + 1, 2 * y + 1, (ll - hb - vb + db) * 0.5),
                ];
                for (px, py, value) in quad {
                    if px < w && py < h {
                        out.set(px, py, value);
                    }
                }
            }
        }

        out
    }
}
