//! Terrain survey binary - samples a square region and reports height, slope
//! and biome statistics as JSON.
//!
//! Usage: cargo run --release --bin survey -- [OPTIONS]
//!
//! Options:
//!   --seed <SEED>       Random seed (default: 12345)
//!   --size <UNITS>      Side length of the surveyed square (default: 256)
//!   --center <X,Z>      Center of the square (default: 0,0)
//!   --step <UNITS>      Sample spacing (default: 1.0)
//!   --block <SIZE>      Block size (default: 1.0)
//!   --discrete          Disable bilinear smoothing
//!   --output <PATH>     Write the report to a file instead of stdout

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;
use serde_json::json;

use terrawalk::core::logging;
use terrawalk::terrain::{Biome, HeightField, TerrainParams};

/// Slope histogram bucket width in degrees
const SLOPE_BUCKET: f32 = 15.0;

#[derive(Default)]
struct RowStats {
    samples: usize,
    min: f32,
    max: f32,
    sum: f64,
    walkable: usize,
    slope_buckets: [usize; 6],
    biomes: BTreeMap<&'static str, usize>,
}

impl RowStats {
    fn merge(mut self, other: RowStats) -> RowStats {
        if other.samples == 0 {
            return self;
        }
        if self.samples == 0 {
            return other;
        }
        self.samples += other.samples;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.walkable += other.walkable;
        for (a, b) in self.slope_buckets.iter_mut().zip(other.slope_buckets) {
            *a += b;
        }
        for (name, count) in other.biomes {
            *self.biomes.entry(name).or_default() += count;
        }
        self
    }
}

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let seed = parse_u32_arg(&args, "--seed").unwrap_or(12345);
    let size = parse_f32_arg(&args, "--size").unwrap_or(256.0).max(1.0);
    let step = parse_f32_arg(&args, "--step").unwrap_or(1.0).max(0.01);
    let requested_block = parse_f32_arg(&args, "--block").unwrap_or(1.0);
    let (cx, cz) = parse_str_arg(&args, "--center")
        .and_then(|s| parse_pair(&s))
        .unwrap_or((0.0, 0.0));
    let smooth = !args.iter().any(|a| a == "--discrete");
    let output = parse_str_arg(&args, "--output").map(PathBuf::from);

    let mut params = TerrainParams {
        seed,
        block_size: requested_block,
        smooth,
        ..Default::default()
    };
    // Report the block size the height fields actually use
    let block_size = params.effective_block_size();
    if block_size != requested_block {
        log::warn!("Block size {} is invalid, surveying with {}", requested_block, block_size);
    }
    params.block_size = block_size;
    let max_climb = terrawalk::core::PlayerParams::default().max_climb_angle;

    let per_side = (size / step).ceil() as usize + 1;
    let x0 = cx - size * 0.5;
    let z0 = cz - size * 0.5;
    log::info!(
        "Surveying {}x{} samples around ({}, {}), seed {}, block {}, smooth {}",
        per_side, per_side, cx, cz, seed, block_size, smooth
    );

    let start = Instant::now();

    // One height field per row: each owns its cache, so rows run independently
    let stats = (0..per_side)
        .into_par_iter()
        .map(|row| {
            let mut field = HeightField::new(params.clone());
            let z = z0 + row as f32 * step;
            let mut stats = RowStats {
                min: f32::INFINITY,
                max: f32::NEG_INFINITY,
                ..Default::default()
            };
            for col in 0..per_side {
                let x = x0 + col as f32 * step;
                let h = field.sample(x, z);
                let slope = field.slope(x, z);
                let biome: Biome = field.classify(x, z);

                stats.samples += 1;
                stats.min = stats.min.min(h);
                stats.max = stats.max.max(h);
                stats.sum += h as f64;
                if slope <= max_climb {
                    stats.walkable += 1;
                }
                let bucket = ((slope / SLOPE_BUCKET) as usize).min(stats.slope_buckets.len() - 1);
                stats.slope_buckets[bucket] += 1;
                *stats.biomes.entry(biome.name()).or_default() += 1;
            }
            stats
        })
        .reduce(RowStats::default, RowStats::merge);

    let elapsed = start.elapsed().as_secs_f32();
    log::info!(
        "{} samples in {:.2}s ({:.0} samples/sec)",
        stats.samples,
        elapsed,
        stats.samples as f32 / elapsed.max(1e-6)
    );

    let samples = stats.samples.max(1) as f64;
    let slope_histogram: Vec<_> = stats
        .slope_buckets
        .iter()
        .enumerate()
        .map(|(i, count)| {
            json!({
                "from_degrees": i as f32 * SLOPE_BUCKET,
                "to_degrees": (i + 1) as f32 * SLOPE_BUCKET,
                "count": count,
            })
        })
        .collect();

    let report = json!({
        "seed": seed,
        "center": [cx, cz],
        "size": size,
        "step": step,
        "block_size": block_size,
        "smooth": smooth,
        "samples": stats.samples,
        "height": {
            "min": stats.min,
            "max": stats.max,
            "mean": stats.sum / samples,
        },
        "walkable_fraction": stats.walkable as f64 / samples,
        "slope_histogram": slope_histogram,
        "biomes": stats.biomes,
    });

    let text = match serde_json::to_string_pretty(&report) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Failed to serialize report: {}", e);
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, text) {
                log::error!("Failed to write {}: {}", path.display(), e);
                std::process::exit(1);
            }
            log::info!("Report written to {}", path.display());
        }
        None => println!("{}", text),
    }
}

fn parse_pair(s: &str) -> Option<(f32, f32)> {
    let (a, b) = s.split_once(',')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
