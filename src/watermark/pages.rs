// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Multi-page documents.
//!
//! Every page is an independent frame carrying its own full copy of the
//! message. Pages are processed independently (on the rayon pool with the
//! `parallel` feature) and results always come back in page order.

use log::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::capacity::{default_replication, CapacityReport};
use super::error::WatermarkError;
use super::params::EmbedParams;
use super::pipeline::{embed, extract, plan_capacity, EmbedOutcome, ExtractionOutcome};
use crate::frame::Frame;

/// Capacity usable on every page: the element-wise minimum over all pages.
///
/// Geometry fields describe the page with the smallest capacity.
///
/// # Errors
/// - [`WatermarkError::InvalidParameters`] for no pages or a bad block size.
pub fn plan_pages_capacity(pages: &[Frame], block_size: usize) -> Result<CapacityReport, WatermarkError> {
    let reports = pages
        .iter()
        .map(|page| plan_capacity(page, block_size))
        .collect::<Result<Vec<_>, _>>()?;

    let mut combined = *reports
        .iter()
        .min_by_key(|r| r.capacity_bits)
        .ok_or(WatermarkError::InvalidParameters("document has no pages"))?;

    combined.replication_factor = default_replication(combined.capacity_bits);
    for report in &reports {
        combined.max_message_bytes = combined.max_message_bytes.min(report.max_message_bytes);
        for (slot, &other) in combined
            .max_message_bytes_by_replication
            .iter_mut()
            .zip(&report.max_message_bytes_by_replication)
        {
            *slot = (*slot).min(other);
        }
    }
    Ok(combined)
}

/// Embed `message` into every page.
///
/// # Errors
/// The first error in page order, e.g. [`WatermarkError::CapacityExceeded`]
/// when the message does not fit the smallest page.
pub fn embed_pages(
    pages: &[Frame],
    message: &[u8],
    params: &EmbedParams,
) -> Result<Vec<EmbedOutcome>, WatermarkError> {
    if pages.is_empty() {
        return Err(WatermarkError::InvalidParameters("document has no pages"));
    }
    debug!("embed_pages: {} pages, message {}B", pages.len(), message.len());

    #[cfg(feature = "parallel")]
    let outcomes = pages.par_iter().map(|page| embed(page, message, params)).collect();
    #[cfg(not(feature = "parallel"))]
    let outcomes = pages.iter().map(|page| embed(page, message, params)).collect();

    outcomes
}

/// Extract from every page. `page_index` of each outcome is its position.
///
/// # Errors
/// [`WatermarkError::InvalidParameters`] if `params` fail validation.
pub fn extract_pages(pages: &[Frame], params: &EmbedParams) -> Result<Vec<ExtractionOutcome>, WatermarkError> {
    params.validate()?;

    let run = |(index, page): (usize, &Frame)| {
        extract(page, params).map(|mut outcome| {
            outcome.page_index = index;
            outcome
        })
    };

    #[cfg(feature = "parallel")]
    let outcomes = pages.par_iter().enumerate().map(run).collect();
    #[cfg(not(feature = "parallel"))]
    let outcomes = pages.iter().enumerate().map(run).collect();

    outcomes
}

/// The first page whose checksum verified, otherwise the most confident
/// page (earliest on ties). `None` for an empty slice.
pub fn best_page(outcomes: &[ExtractionOutcome]) -> Option<&ExtractionOutcome> {
    outcomes.iter().find(|o| o.crc_ok).or_else(|| {
        outcomes.iter().fold(None, |best: Option<&ExtractionOutcome>, o| match best {
            Some(b) if b.confidence >= o.confidence => Some(b),
            _ => Some(o),
        })
    })
}
