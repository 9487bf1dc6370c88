// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Survival of lossy re-encoding and rejection of wrong keys.

use dwtmark_core::{compute_metrics, embed, extract, EmbedParams, Frame};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageFormat};

/// Deterministic textured frame with samples inside [52, 204].
fn textured_frame(width: usize, height: usize, channels: usize, salt: u32) -> Frame {
    let mut data = Vec::with_capacity(width * height * channels);
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let smooth = 50.0 * (x as f64 / 97.0 + c as f64 + salt as f64).sin() * (y as f64 / 131.0).cos()
                    + 20.0 * ((x + 2 * y) as f64 / 23.0).sin();
                let h = (x as u32)
                    .wrapping_mul(73_856_093)
                    ^ (y as u32).wrapping_mul(19_349_663)
                    ^ (c as u32 + salt).wrapping_mul(83_492_791);
                let noise = (h.wrapping_mul(2_654_435_761) >> 28) as f64 - 7.5;
                data.push((128.0 + smooth + noise * 0.8).round() as u8);
            }
        }
    }
    Frame::new(width, height, channels, data).unwrap()
}

/// Deterministic document page: text strokes on a white page, every sample
/// at 0 or 255. Color pages add a pure red banner and print alternate lines
/// in pure blue.
fn text_page(width: usize, height: usize, channels: usize, salt: u32) -> Frame {
    const WHITE: [u8; 3] = [255, 255, 255];
    const BLACK: [u8; 3] = [0, 0, 0];
    const RED: [u8; 3] = [255, 0, 0];
    const BLUE: [u8; 3] = [0, 0, 255];

    let mut data = Vec::with_capacity(width * height * channels);
    for y in 0..height {
        for x in 0..width {
            let line = y / 28;
            let (row, col) = (y % 28, x % 7);
            let glyph = (x / 7) as u32;
            let h = glyph.wrapping_mul(2_654_435_761) ^ (line as u32 + salt).wrapping_mul(40_503);
            let word_gap = (glyph + line as u32 * 3 + salt) % 9 == 0;
            let left_stem = (h >> 3) & 1 == 1 && col < 2;
            let right_stem = (h >> 5) & 1 == 1 && col >= 4;
            let bar = matches!(row, 8 | 9 | 13 | 18 | 19) && (h >> 7) & 3 != 0;
            let inked = (40..width.saturating_sub(40)).contains(&x)
                && (60..height.saturating_sub(60)).contains(&y)
                && (8..20).contains(&row)
                && !word_gap
                && col < 6
                && (left_stem || right_stem || bar);

            let px = if channels == 1 {
                if inked { BLACK } else { WHITE }
            } else if y < 40 {
                RED
            } else if inked {
                if line % 2 == 0 { BLACK } else { BLUE }
            } else {
                WHITE
            };
            match channels {
                1 => data.push(px[0]),
                3 => data.extend_from_slice(&px),
                _ => {
                    data.extend_from_slice(&px);
                    data.push(255);
                }
            }
        }
    }
    Frame::new(width, height, channels, data).unwrap()
}

/// Encode as JPEG at `quality` and decode again. Gray stays gray.
fn jpeg_recompress(frame: &Frame, quality: u8) -> Frame {
    let color = match frame.channels() {
        1 => ColorType::L8,
        3 => ColorType::Rgb8,
        other => panic!("no JPEG encoding for {other} channels"),
    };
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode(frame.data(), frame.width() as u32, frame.height() as u32, color)
        .unwrap();
    let decoded = image::load_from_memory_with_format(&buf, ImageFormat::Jpeg).unwrap();
    Frame::try_from(&decoded).unwrap()
}

#[test]
fn survives_jpeg_quality_85() {
    let frame = textured_frame(512, 512, 3, 1);
    let params = EmbedParams::new(4242, 0.5, 8).unwrap();
    let marked = embed(&frame, b"jpeg survivor", &params).unwrap();

    let recompressed = jpeg_recompress(&marked.frame, 85);
    assert!(recompressed.same_geometry(&marked.frame));

    let out = extract(&recompressed, &params).unwrap();
    let metrics = compute_metrics(&marked.frame, &recompressed, &marked.bitstream, &out.bitstream).unwrap();
    assert!(
        metrics.bit_accuracy >= 0.9,
        "bit accuracy after q85: {:.3}",
        metrics.bit_accuracy
    );
}

#[test]
fn survives_jpeg_with_larger_blocks() {
    let frame = textured_frame(768, 512, 3, 2);
    let params = EmbedParams::new(17, 1.0, 16).unwrap();
    let marked = embed(&frame, b"bs16", &params).unwrap();

    let out = extract(&jpeg_recompress(&marked.frame, 85), &params).unwrap();
    let accuracy = dwtmark_core::bit_accuracy(&marked.bitstream, &out.bitstream);
    assert!(accuracy >= 0.9, "bit accuracy after q85 at bs16: {accuracy:.3}");
}

#[test]
fn wrong_seeds_never_validate() {
    let frame = textured_frame(256, 256, 3, 3);
    let params = EmbedParams::new(1000, 0.5, 8).unwrap();
    let marked = embed(&frame, b"secret", &params).unwrap();

    for seed in 0..100i64 {
        let wrong = EmbedParams::new(seed, 0.5, 8).unwrap();
        let out = extract(&marked.frame, &wrong).unwrap();
        assert!(!out.crc_ok, "seed {seed} validated");
        assert!(out.confidence < 1.0);
    }
}

#[test]
fn wrong_block_size_does_not_validate() {
    let frame = textured_frame(512, 512, 3, 4);
    let params = EmbedParams::new(55, 0.5, 8).unwrap();
    let marked = embed(&frame, b"block", &params).unwrap();

    let other = EmbedParams::new(55, 0.5, 12).unwrap();
    assert!(!extract(&marked.frame, &other).unwrap().crc_ok);
}

#[test]
fn unmarked_frames_do_not_validate() {
    for salt in 0..5 {
        let frame = textured_frame(256, 256, 3, 40 + salt);
        let out = extract(&frame, &EmbedParams::new(1, 0.5, 8).unwrap()).unwrap();
        assert!(!out.crc_ok);
        assert!(out.confidence < 1.0);
    }

    // A flat frame reads all-equal coefficient pairs.
    let flat = Frame::new(256, 256, 3, vec![128; 256 * 256 * 3]).unwrap();
    let out = extract(&flat, &EmbedParams::new(1, 0.5, 8).unwrap()).unwrap();
    assert!(!out.crc_ok);
}

#[test]
fn text_page_survives_jpeg_quality_85() {
    let page = text_page(800, 1000, 1, 0);
    let params = EmbedParams::new(7, 0.5, 8).unwrap();
    let marked = embed(&page, b"invoice-2026-001", &params).unwrap();

    let recompressed = jpeg_recompress(&marked.frame, 85);
    assert_eq!(recompressed.channels(), 1);

    let out = extract(&recompressed, &params).unwrap();
    let accuracy = dwtmark_core::bit_accuracy(&marked.bitstream, &out.bitstream);
    assert!(accuracy >= 0.9, "bit accuracy after q85 on a text page: {accuracy:.3}");
}
