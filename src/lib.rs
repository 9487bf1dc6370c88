// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # dwtmark-core
//!
//! Pure-Rust invisible watermarking for raster images. A short byte message
//! is hidden in the low-frequency wavelet band of a frame so that it
//! survives moderate lossy recompression, and can be read back with the
//! same seed and block size.
//!
//! - `transform`: Haar wavelet, N×N DCT and block grid
//! - `watermark`: capacity planning, bit packing, seeded scheduling,
//!   embedding and extraction
//! - `metrics`: PSNR and bit accuracy
//!
//! The library never installs a logger; diagnostics go through the `log`
//! facade.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use dwtmark_core::{embed, extract, EmbedParams, Frame};
//!
//! let img = image::open("photo.png").unwrap();
//! let frame = Frame::try_from(&img).unwrap();
//! let params = EmbedParams::new(42, 0.5, 8).unwrap();
//!
//! let marked = embed(&frame, b"owner:1234", &params).unwrap();
//! let found = extract(&marked.frame, &params).unwrap();
//! assert!(found.crc_ok);
//! assert_eq!(found.message, b"owner:1234");
//! ```

pub mod frame;
pub mod metrics;
pub mod transform;
pub mod watermark;

pub use frame::{validate_dimensions, Frame, MAX_DIMENSION, MAX_PIXELS};
pub use metrics::{bit_accuracy, byte_bit_accuracy, compute_metrics, psnr, Metrics};
pub use watermark::{best_page, embed_pages, extract_pages, plan_pages_capacity};
pub use watermark::{embed, extract, plan_capacity, EmbedOutcome, ExtractionOutcome};
pub use watermark::{CapacityReport, EmbedParams, WatermarkError};
pub use watermark::{DEFAULT_BLOCK_SIZE, DEFAULT_STRENGTH, MAX_STRENGTH, MIN_STRENGTH, SUPPORTED_BLOCK_SIZES};
