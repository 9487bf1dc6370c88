// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the watermark codec.
//!
//! [`WatermarkError`] covers parameter validation, frame geometry and
//! capacity failures. A failing checksum on extraction is not an error: it is
//! reported through [`ExtractionOutcome::crc_ok`](super::ExtractionOutcome).

use core::fmt;

/// Errors that can occur during planning, embedding or extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkError {
    /// The message does not fit the frame, even as a single copy.
    ///
    /// The caller can shrink the message, pick a smaller block size or use a
    /// larger frame. No pixel has been modified when this is returned.
    CapacityExceeded {
        /// Bits needed for one header + payload copy.
        required_bits: usize,
        /// Bits the frame can carry with the requested block size.
        capacity_bits: usize,
    },
    /// Seed, strength, block size or page list rejected.
    InvalidParameters(&'static str),
    /// Frame dimensions or buffers are inconsistent.
    GeometryMismatch(&'static str),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { required_bits, capacity_bits } => write!(
                f,
                "message too large for this frame ({required_bits} bits needed, {capacity_bits} available)"
            ),
            Self::InvalidParameters(reason) => write!(f, "invalid parameters: {reason}"),
            Self::GeometryMismatch(reason) => write!(f, "geometry mismatch: {reason}"),
        }
    }
}

impl std::error::Error for WatermarkError {}
