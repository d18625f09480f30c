//! Terrain-type classification from layered noise
//!
//! Three noise layers (continental, regional, local) are blended with fixed
//! weights, normalized to [0, 1] and bucketed into seven contiguous bands.
//! Classification is cosmetic and diagnostic only; it never feeds back into
//! heights or movement.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use super::height_field::TerrainParams;

/// Terrain types, ordered by the score band they occupy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Basin,
    Plains,
    Hills,
    Valley,
    Plateau,
    Mountains,
    Canyon,
}

/// Upper bound (exclusive) of each band; the last band also includes 1.0.
const BIOME_BANDS: [(f32, Biome); 7] = [
    (0.15, Biome::Basin),
    (0.30, Biome::Plains),
    (0.45, Biome::Hills),
    (0.60, Biome::Valley),
    (0.75, Biome::Plateau),
    (0.90, Biome::Mountains),
    (1.00, Biome::Canyon),
];

/// (frequency factor, octaves, seed multiplier, weight) per layer
const LAYERS: [(f32, usize, u32, f32); 3] = [
    (0.1, 1, 2, 0.6),
    (0.5, 2, 3, 0.3),
    (2.0, 3, 4, 0.1),
];

impl Biome {
    /// All biomes in band order
    pub const ALL: [Biome; 7] = [
        Biome::Basin,
        Biome::Plains,
        Biome::Hills,
        Biome::Valley,
        Biome::Plateau,
        Biome::Mountains,
        Biome::Canyon,
    ];

    /// Map a normalized score to a biome.
    ///
    /// Scores outside [0, 1] are clamped; NaN maps to the lowest band.
    pub fn from_score(score: f32) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        BIOME_BANDS
            .iter()
            .find(|(upper, _)| score < *upper)
            .map(|&(_, biome)| biome)
            .unwrap_or(Biome::Canyon)
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Biome::Basin => "Basin",
            Biome::Plains => "Plains",
            Biome::Hills => "Hills",
            Biome::Valley => "Valley",
            Biome::Plateau => "Plateau",
            Biome::Mountains => "Mountains",
            Biome::Canyon => "Canyon",
        }
    }
}

impl std::fmt::Display for Biome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

struct ScoreLayer {
    noise: Fbm<Perlin>,
    frequency: f64,
    offset: f64,
    weight: f64,
}

/// Biome map generator
pub struct BiomeMap {
    layers: Vec<ScoreLayer>,
}

impl BiomeMap {
    /// Create a biome map for the terrain parameters' seed and base frequency
    pub fn new(params: &TerrainParams) -> Self {
        let layers = LAYERS
            .iter()
            .map(|&(freq_factor, octaves, seed_mul, weight)| ScoreLayer {
                noise: Fbm::<Perlin>::new(params.seed.wrapping_mul(seed_mul))
                    .set_octaves(octaves)
                    .set_persistence(0.5)
                    .set_lacunarity(2.0),
                frequency: (params.terrain_scale * freq_factor) as f64,
                offset: params.seed as f64 * seed_mul as f64,
                weight: weight as f64,
            })
            .collect();

        Self { layers }
    }

    /// Blended score in [0, 1] at lattice-space coordinates
    pub fn score_at(&self, lx: f32, lz: f32) -> f32 {
        let sum: f64 = self
            .layers
            .iter()
            .map(|layer| {
                let v = layer.noise.get([
                    lx as f64 * layer.frequency + layer.offset,
                    lz as f64 * layer.frequency + layer.offset,
                ]);
                v * layer.weight
            })
            .sum();

        (((sum + 1.0) / 2.0) as f32).clamp(0.0, 1.0)
    }

    /// Biome at lattice-space coordinates (world coordinates / block size)
    pub fn biome_at(&self, lx: f32, lz: f32) -> Biome {
        Biome::from_score(self.score_at(lx, lz))
    }
}
