//! Procedural terrain: noise, lattice cache, biomes and the height field

pub mod noise;
pub use self::noise::{FractalNoise, NoiseSource};

pub mod cache;
pub use cache::LatticeCache;

pub mod biome;
pub use biome::{Biome, BiomeMap};

pub mod height_field;
pub use height_field::{HeightField, TerrainParams, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE, SLOPE_EPSILON};
