// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! 8-bit raster frames.
//!
//! A [`Frame`] is an interleaved 8-bit image with 1 (gray), 3 (RGB) or
//! 4 (RGBA) channels. The codec works on luminance only:
//!
//! - [`Frame::luma`] derives `Y = 0.299 R + 0.587 G + 0.114 B` (gray: the
//!   sample itself),
//! - [`Frame::with_luma`] writes a modified luminance back by adding the
//!   per-pixel luminance change to every color channel, which leaves the
//!   chroma differences untouched. Alpha is never modified.
//!
//! Frames can be converted to and from [`image`] buffers for file I/O.

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::transform::Plane;
use crate::watermark::WatermarkError;

/// Maximum width or height accepted.
pub const MAX_DIMENSION: usize = 8192;

/// Maximum total pixel count accepted (40 megapixels).
pub const MAX_PIXELS: usize = 40_000_000;

const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// Reject empty frames and frames beyond [`MAX_DIMENSION`] / [`MAX_PIXELS`].
pub fn validate_dimensions(width: usize, height: usize) -> Result<(), WatermarkError> {
    if width == 0 || height == 0 {
        return Err(WatermarkError::GeometryMismatch("frame dimensions must be non-zero"));
    }
    if width > MAX_DIMENSION
        || height > MAX_DIMENSION
        || width.checked_mul(height).map_or(true, |p| p > MAX_PIXELS)
    {
        return Err(WatermarkError::GeometryMismatch("frame exceeds 8192px / 40MP"));
    }
    Ok(())
}

/// Interleaved 8-bit image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap `data` as a `width × height` frame with `channels` interleaved
    /// samples per pixel.
    ///
    /// # Errors
    /// [`WatermarkError::GeometryMismatch`] if `channels` is not 1, 3 or 4,
    /// the dimensions are out of range, or `data` has the wrong length.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Result<Self, WatermarkError> {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(WatermarkError::GeometryMismatch("frame must have 1, 3 or 4 channels"));
        }
        validate_dimensions(width, height)?;
        if data.len() != width * height * channels {
            return Err(WatermarkError::GeometryMismatch("sample buffer length does not match geometry"));
        }
        Ok(Self { width, height, channels, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Interleaved samples, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether `other` has the same width, height and channel count.
    pub fn same_geometry(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }

    /// Luminance plane of the frame.
    pub fn luma(&self) -> Plane {
        let data = self
            .data
            .chunks_exact(self.channels)
            .map(|px| match self.channels {
                1 => px[0] as f64,
                _ => LUMA_R * px[0] as f64 + LUMA_G * px[1] as f64 + LUMA_B * px[2] as f64,
            })
            .collect();
        Plane::from_vec(self.width, self.height, data)
    }

    /// New frame whose luminance moved from `original` to `modified`.
    ///
    /// Every color channel receives the same per-pixel delta, rounded and
    /// clamped to `[0, 255]`. Alpha is copied unchanged.
    pub fn with_luma(&self, original: &Plane, modified: &Plane) -> Frame {
        debug_assert_eq!(original.data.len(), self.width * self.height);
        debug_assert_eq!(modified.data.len(), original.data.len());

        let color = self.channels.min(3);
        let mut data = self.data.clone();
        for (i, px) in data.chunks_exact_mut(self.channels).enumerate() {
            let delta = modified.data[i] - original.data[i];
            for sample in &mut px[..color] {
                *sample = (*sample as f64 + delta).round().clamp(0.0, 255.0) as u8;
            }
        }

        Frame { width: self.width, height: self.height, channels: self.channels, data }
    }

    /// Convert into an [`image::DynamicImage`] (Luma8, Rgb8 or Rgba8).
    pub fn into_dynamic_image(self) -> Result<DynamicImage, WatermarkError> {
        let (w, h) = (self.width as u32, self.height as u32);
        let err = WatermarkError::GeometryMismatch("sample buffer length does not match geometry");
        Ok(match self.channels {
            1 => DynamicImage::ImageLuma8(GrayImage::from_raw(w, h, self.data).ok_or(err)?),
            3 => DynamicImage::ImageRgb8(RgbImage::from_raw(w, h, self.data).ok_or(err)?),
            _ => DynamicImage::ImageRgba8(RgbaImage::from_raw(w, h, self.data).ok_or(err)?),
        })
    }
}

impl TryFrom<RgbImage> for Frame {
    type Error = WatermarkError;

    fn try_from(img: RgbImage) -> Result<Self, Self::Error> {
        let (w, h) = img.dimensions();
        Frame::new(w as usize, h as usize, 3, img.into_raw())
    }
}

impl TryFrom<&DynamicImage> for Frame {
    type Error = WatermarkError;

    /// 8-bit gray, RGB and RGBA are taken as-is; anything else is converted
    /// to RGB8 (or RGBA8 when it has alpha).
    fn try_from(img: &DynamicImage) -> Result<Self, Self::Error> {
        let (w, h) = (img.width() as usize, img.height() as usize);
        match img {
            DynamicImage::ImageLuma8(buf) => Frame::new(w, h, 1, buf.as_raw().clone()),
            DynamicImage::ImageRgb8(buf) => Frame::new(w, h, 3, buf.as_raw().clone()),
            DynamicImage::ImageRgba8(buf) => Frame::new(w, h, 4, buf.as_raw().clone()),
            other if other.color().has_alpha() => Frame::new(w, h, 4, other.to_rgba8().into_raw()),
            other => Frame::new(w, h, 3, other.to_rgb8().into_raw()),
        }
    }
}
