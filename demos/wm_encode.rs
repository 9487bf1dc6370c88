// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Example: embed and extract a watermark in a PNG/JPEG image.
use std::path::Path;

use dwtmark_core::{embed, extract, plan_capacity, EmbedParams, Frame};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: wm_encode <input.png> <message> <seed> [strength] [block_size]");
        eprintln!("       wm_encode --extract <marked.png> <seed> [block_size]");
        std::process::exit(1);
    }

    if args[1] == "--extract" {
        let img = image::open(&args[2]).expect("Could not read image");
        let frame = Frame::try_from(&img).expect("Unsupported image");
        let seed: i64 = args[3].parse().expect("Seed must be an integer");
        let block_size = args.get(4).map_or(8, |s| s.parse().expect("Block size must be an integer"));
        let params = EmbedParams::new(seed, 0.5, block_size).expect("Invalid parameters");

        let out = extract(&frame, &params).expect("Extract failed");
        println!("Message: {}", String::from_utf8_lossy(&out.message));
        println!("CRC ok: {}, confidence: {:.2}, replication: {}", out.crc_ok, out.confidence, out.replication_factor);
    } else {
        let img = image::open(&args[1]).expect("Could not read image");
        let frame = Frame::try_from(&img).expect("Unsupported image");
        let seed: i64 = args[3].parse().expect("Seed must be an integer");
        let strength = args.get(4).map_or(0.5, |s| s.parse().expect("Strength must be a number"));
        let block_size = args.get(5).map_or(8, |s| s.parse().expect("Block size must be an integer"));
        let params = EmbedParams::new(seed, strength, block_size).expect("Invalid parameters");

        let report = plan_capacity(&frame, block_size).expect("Capacity planning failed");
        println!(
            "Capacity: {} bits, up to {} bytes at replication {}",
            report.capacity_bits, report.max_message_bytes, report.replication_factor
        );

        let marked = embed(&frame, args[2].as_bytes(), &params).expect("Embed failed");
        let out_path = format!("{}_marked.png", Path::new(&args[1]).with_extension("").display());
        marked
            .frame
            .into_dynamic_image()
            .expect("Frame conversion failed")
            .save(&out_path)
            .expect("Could not write output");
        println!("Watermarked image written to: {}", out_path);
        println!("PSNR: {:.2} dB, replication: {}", marked.psnr, marked.replication_factor);
    }
}
