// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! DWT-DCT watermark codec.
//!
//! A message is hidden in the approximation (LL) subband of a single-level
//! Haar decomposition of the frame's luminance. The LL subband is tiled into
//! `block_size × block_size` blocks; each block scheduled by the seed carries
//! one bit in the ordering of two mid-frequency DCT coefficients.
//!
//! The bitstream is `[length:32][crc32:32][message]`, replicated up to three
//! times and majority-voted on extraction. Extraction always yields an
//! outcome; whether the message is trustworthy is reported through
//! `crc_ok` and `confidence` rather than an error.

pub mod capacity;
pub mod embedding;
pub mod error;
pub mod packet;
pub mod pages;
pub mod params;
mod pipeline;
pub mod schedule;

pub use capacity::CapacityReport;
pub use error::WatermarkError;
pub use pages::{best_page, embed_pages, extract_pages, plan_pages_capacity};
pub use params::{EmbedParams, DEFAULT_BLOCK_SIZE, DEFAULT_STRENGTH, MAX_STRENGTH, MIN_STRENGTH, SUPPORTED_BLOCK_SIZES};
pub use pipeline::{embed, extract, plan_capacity, EmbedOutcome, ExtractionOutcome};
