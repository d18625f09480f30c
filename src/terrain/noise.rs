//! Coherent noise sources for height generation

use ::noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::height_field::TerrainParams;

/// Upper octave bound accepted by `Fbm`
const MAX_OCTAVES: usize = 32;

/// A pure 2D scalar field.
///
/// Coordinates are world-space positions of lattice points. Implementations
/// must return the same value for the same input every time.
pub trait NoiseSource: Send + Sync {
    fn sample(&self, x: f64, z: f64) -> f64;
}

impl<F> NoiseSource for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn sample(&self, x: f64, z: f64) -> f64 {
        self(x, z)
    }
}

/// Fractal Brownian motion over Perlin noise, offset by the seed.
///
/// Output is roughly in [-1, 1].
pub struct FractalNoise {
    fbm: Fbm<Perlin>,
    frequency: f64,
    offset: f64,
}

impl FractalNoise {
    /// Create a source sampling `fbm(x * frequency + offset, z * frequency + offset)`.
    pub fn new(
        seed: u32,
        frequency: f64,
        octaves: usize,
        persistence: f64,
        lacunarity: f64,
        offset: f64,
    ) -> Self {
        let fbm = Fbm::<Perlin>::new(seed)
            .set_octaves(octaves.clamp(1, MAX_OCTAVES))
            .set_persistence(persistence)
            .set_lacunarity(lacunarity);

        Self { fbm, frequency, offset }
    }

    /// Height noise for the given terrain parameters
    pub fn from_params(params: &TerrainParams) -> Self {
        Self::new(
            params.seed,
            params.terrain_scale as f64,
            params.octaves as usize,
            params.persistence as f64,
            params.lacunarity as f64,
            params.seed as f64,
        )
    }
}

impl NoiseSource for FractalNoise {
    fn sample(&self, x: f64, z: f64) -> f64 {
        self.fbm.get([
            x * self.frequency + self.offset,
            z * self.frequency + self.offset,
        ])
    }
}
