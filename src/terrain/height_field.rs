//! Memoized height field over a noise lattice
//!
//! Heights are defined on an integer lattice spaced `block_size` apart. In
//! discrete mode a query returns the height of the enclosing lattice point; in
//! smooth mode the four corners of the enclosing cell are blended
//! bilinearly. Corner values are shared between neighbouring cells, so the
//! smooth surface is continuous.

use std::collections::HashSet;

use glam::IVec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::biome::{Biome, BiomeMap};
use super::cache::LatticeCache;
use super::noise::{FractalNoise, NoiseSource};

/// Smallest block size accepted at runtime
pub const MIN_BLOCK_SIZE: f32 = 0.1;
/// Largest block size accepted at runtime
pub const MAX_BLOCK_SIZE: f32 = 2.0;
/// Half-width of the central difference used for slopes
pub const SLOPE_EPSILON: f32 = 0.01;

/// Parameters controlling terrain generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub seed: u32,
    pub block_size: f32,          // World units between lattice points
    pub smooth: bool,             // Bilinear blending between lattice points
    pub terrain_scale: f32,       // Noise frequency per world unit
    pub height_scale: f32,        // Amplitude applied to raw noise
    pub octaves: u32,             // FBM octaves (detail levels)
    pub persistence: f32,         // FBM persistence
    pub lacunarity: f32,          // FBM lacunarity
    pub load_radius: f32,         // Active area radius in world units
    pub max_cache_entries: usize, // Soft cap before spatial eviction
    pub cache_retain_factor: f32, // Eviction keeps this many load radii
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            block_size: 1.0,
            smooth: true,
            terrain_scale: 0.05,
            height_scale: 25.0,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 1.8,
            load_radius: 30.0,
            max_cache_entries: 65_536,
            cache_retain_factor: 3.0,
        }
    }
}

impl TerrainParams {
    /// Block size a height field built from these params will use
    pub fn effective_block_size(&self) -> f32 {
        if self.block_size.is_finite() && self.block_size > 0.0 {
            self.block_size
        } else {
            MIN_BLOCK_SIZE
        }
    }

    /// Load radius in lattice cells, rounded to the nearest cell
    pub fn load_radius_cells(&self) -> i32 {
        (self.load_radius / self.effective_block_size()).round() as i32
    }
}

/// Procedural height field with a lattice cache and an active area
pub struct HeightField<N: NoiseSource = FractalNoise> {
    params: TerrainParams,
    noise: N,
    biomes: BiomeMap,
    cache: LatticeCache,
    active_area: HashSet<IVec2>,
    epoch: u64,
}

impl HeightField<FractalNoise> {
    /// Create a height field driven by fractal Perlin noise
    pub fn new(params: TerrainParams) -> Self {
        let noise = FractalNoise::from_params(&params);
        Self::with_noise(params, noise)
    }
}

impl<N: NoiseSource> HeightField<N> {
    /// Create a height field over a custom noise source
    pub fn with_noise(mut params: TerrainParams, noise: N) -> Self {
        let block_size = params.effective_block_size();
        if block_size != params.block_size {
            log::warn!("Invalid block size {}, using {}", params.block_size, block_size);
            params.block_size = block_size;
        }

        let biomes = BiomeMap::new(&params);
        let cache = LatticeCache::new(params.max_cache_entries);

        Self {
            params,
            noise,
            biomes,
            cache,
            active_area: HashSet::new(),
            epoch: 0,
        }
    }

    /// Get terrain parameters
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    pub fn seed(&self) -> u32 {
        self.params.seed
    }

    pub fn block_size(&self) -> f32 {
        self.params.block_size
    }

    pub fn is_smooth(&self) -> bool {
        self.params.smooth
    }

    /// Number of parameter changes that invalidated the cache
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of memoized lattice heights
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Lattice coordinates loaded by the last `generate_area` call
    pub fn active_area(&self) -> &HashSet<IVec2> {
        &self.active_area
    }

    /// Lattice coordinate of the cell containing world position (x, z)
    pub fn lattice_coord(&self, x: f32, z: f32) -> IVec2 {
        IVec2::new(
            (x / self.params.block_size).floor() as i32,
            (z / self.params.block_size).floor() as i32,
        )
    }

    /// Raw lattice height, not memoized
    fn compute_lattice_height(&self, coord: IVec2) -> f32 {
        let bs = self.params.block_size as f64;
        let raw = self.noise.sample(coord.x as f64 * bs, coord.y as f64 * bs);
        (raw * self.params.height_scale as f64) as f32
    }

    /// Height of a lattice point, computing and memoizing it on a miss
    pub fn lattice_height(&mut self, coord: IVec2) -> f32 {
        if let Some(h) = self.cache.get(coord) {
            return h;
        }
        let h = self.compute_lattice_height(coord);
        self.cache.insert(coord, h);
        h
    }

    /// Terrain height at world position (x, z)
    pub fn sample(&mut self, x: f32, z: f32) -> f32 {
        let lx = x / self.params.block_size;
        let lz = z / self.params.block_size;
        let x0 = lx.floor();
        let z0 = lz.floor();
        // Float-to-int casts saturate; corner offsets must saturate as well
        let base = IVec2::new(x0 as i32, z0 as i32);

        if !self.params.smooth {
            return self.lattice_height(base);
        }

        let dx = lx - x0;
        let dz = lz - z0;

        let h00 = self.lattice_height(base);
        let h10 = self.lattice_height(base.saturating_add(IVec2::X));
        let h01 = self.lattice_height(base.saturating_add(IVec2::Y));
        let h11 = self.lattice_height(base.saturating_add(IVec2::ONE));

        // h00(1-dx)(1-dz) + h10·dx(1-dz) + h01(1-dx)dz + h11·dx·dz, evaluated as
        // nested lerps so equal corners reproduce the corner value exactly.
        let near = h00 + (h10 - h00) * dx;
        let far = h01 + (h11 - h01) * dx;
        near + (far - near) * dz
    }

    /// Slope angle in degrees at world position (x, z)
    pub fn slope(&mut self, x: f32, z: f32) -> f32 {
        let e = SLOPE_EPSILON;
        let dh_dx = self.sample(x + e, z) - self.sample(x - e, z);
        let dh_dz = self.sample(x, z + e) - self.sample(x, z - e);
        (dh_dx * dh_dx + dh_dz * dh_dz).sqrt().atan2(2.0 * e).to_degrees()
    }

    /// Terrain type at world position (x, z)
    pub fn classify(&self, x: f32, z: f32) -> Biome {
        let bs = self.params.block_size;
        self.biomes.biome_at(x / bs, z / bs)
    }

    /// Load the square window of lattice points around (center_x, center_z).
    ///
    /// Every missing height in the window is memoized and the active area is
    /// replaced by exactly this window.
    ///
    /// # Returns
    /// Number of lattice points in the active area
    pub fn generate_area(&mut self, center_x: f32, center_z: f32, radius: i32) -> usize {
        let radius = radius.max(0);
        let center = self.lattice_coord(center_x, center_z);

        let window: Vec<IVec2> = (-radius..=radius)
            .flat_map(|dx| (-radius..=radius).map(move |dz| center.saturating_add(IVec2::new(dx, dz))))
            .collect();

        let missing: Vec<IVec2> = window
            .iter()
            .copied()
            .filter(|c| !self.cache.contains(*c))
            .collect();

        if !missing.is_empty() {
            let field = &*self;
            let computed: Vec<(IVec2, f32)> = missing
                .par_iter()
                .map(|&c| (c, field.compute_lattice_height(c)))
                .collect();
            for (coord, h) in computed {
                self.cache.insert(coord, h);
            }
        }

        self.active_area = window.into_iter().collect();

        if self.cache.is_over_capacity() {
            let keep = (radius.saturating_add(1) as f32 * self.params.cache_retain_factor.max(1.0)).ceil() as i32;
            let evicted = self.cache.retain_within(center, keep);
            log::debug!(
                "Evicted {} lattice heights outside {} cells of {:?} ({} remain)",
                evicted, keep, center, self.cache.len()
            );
        }

        self.active_area.len()
    }

    /// Drop all memoized heights and start a new epoch
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.epoch += 1;
        log::debug!(
            "Height cache cleared (epoch {}, block_size {}, smooth {})",
            self.epoch, self.params.block_size, self.params.smooth
        );
    }

    /// Switch between discrete and bilinear sampling
    pub fn set_smooth(&mut self, smooth: bool) {
        if self.params.smooth != smooth {
            self.params.smooth = smooth;
            self.clear_cache();
        }
    }

    /// Change the lattice spacing, clamped to [MIN_BLOCK_SIZE, MAX_BLOCK_SIZE].
    ///
    /// # Returns
    /// The block size in effect after clamping
    pub fn set_block_size(&mut self, block_size: f32) -> f32 {
        let clamped = if block_size.is_nan() {
            self.params.block_size
        } else {
            block_size.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE)
        };
        if clamped != self.params.block_size {
            self.params.block_size = clamped;
            self.clear_cache();
        }
        clamped
    }

    /// Adjust the lattice spacing by `delta` (terrain detail control)
    pub fn adjust_block_size(&mut self, delta: f32) -> f32 {
        self.set_block_size(self.params.block_size + delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(height: f64) -> impl Fn(f64, f64) -> f64 + Send + Sync {
        move |_x, _z| height
    }

    fn params(smooth: bool) -> TerrainParams {
        TerrainParams { smooth, ..Default::default() }
    }

    #[test]
    fn test_terrain_params_default() {
        let params = TerrainParams::default();
        assert_eq!(params.seed, 12345);
        assert_eq!(params.block_size, 1.0);
        assert!(params.smooth);
        assert_eq!(params.terrain_scale, 0.05);
        assert_eq!(params.height_scale, 25.0);
        assert_eq!(params.octaves, 6);
        assert_eq!(params.persistence, 0.5);
        assert_eq!(params.lacunarity, 1.8);
        assert_eq!(params.load_radius_cells(), 30);
    }

    #[test]
    fn test_sample_deterministic_seed_42_discrete() {
        let mut field = HeightField::new(TerrainParams { seed: 42, smooth: false, ..Default::default() });
        let a = field.sample(3.0, 3.0);
        let b = field.sample(3.0, 3.0);
        assert_eq!(a.to_bits(), b.to_bits());

        let mut other = HeightField::new(TerrainParams { seed: 42, smooth: false, ..Default::default() });
        assert_eq!(other.sample(3.0, 3.0).to_bits(), a.to_bits());
    }

    #[test]
    fn test_sample_deterministic_smooth() {
        let mut field = HeightField::new(params(true));
        for (x, z) in [(0.3, 0.7), (10.25, -4.5), (-100.1, 55.9)] {
            let h1 = field.sample(x, z);
            let h2 = field.sample(x, z);
            assert_eq!(h1.to_bits(), h2.to_bits(), "height differs at ({}, {})", x, z);
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut a = HeightField::new(TerrainParams { seed: 1, ..Default::default() });
        let mut b = HeightField::new(TerrainParams { seed: 2, ..Default::default() });
        let differs = (0..20).any(|i| {
            let x = i as f32 * 2.3 + 0.5;
            a.sample(x, x) != b.sample(x, x)
        });
        assert!(differs);
    }

    #[test]
    fn test_discrete_returns_enclosing_lattice_point() {
        let mut field = HeightField::with_noise(
            TerrainParams { smooth: false, height_scale: 1.0, ..Default::default() },
            |x: f64, z: f64| x * 10.0 + z,
        );
        assert_eq!(field.sample(3.9, 2.2), 32.0);
        assert_eq!(field.sample(3.0, 2.0), 32.0);
        // Floor, not truncation toward zero
        assert_eq!(field.sample(-0.5, 0.0), -10.0);
    }

    #[test]
    fn test_smooth_corner_equals_lattice_value() {
        let mut field = HeightField::new(params(true));
        for (ix, iz) in [(0, 0), (3, 5), (-7, 2), (12, -9)] {
            let corner = field.lattice_height(IVec2::new(ix, iz));
            let sampled = field.sample(ix as f32, iz as f32);
            assert_eq!(sampled.to_bits(), corner.to_bits());
        }
    }

    #[test]
    fn test_smooth_bilinear_blend() {
        let mut field = HeightField::with_noise(
            TerrainParams { smooth: true, height_scale: 1.0, ..Default::default() },
            |x: f64, z: f64| x * 2.0 + z * 4.0,
        );
        // Bilinear interpolation of a plane reproduces the plane
        let h = field.sample(1.25, 2.5);
        assert!((h - (1.25 * 2.0 + 2.5 * 4.0)).abs() < 1e-5);
    }

    #[test]
    fn test_smooth_continuous_across_cell_boundary() {
        let mut field = HeightField::new(params(true));
        let left = field.sample(4.0 - 1e-4, 2.5);
        let right = field.sample(4.0 + 1e-4, 2.5);
        assert!((left - right).abs() < 0.05);
    }

    #[test]
    fn test_flat_slope_is_zero() {
        let mut field = HeightField::with_noise(params(true), flat(0.4));
        for (x, z) in [(0.0, 0.0), (3.3, -2.1), (100.0, 100.0)] {
            assert_eq!(field.slope(x, z), 0.0);
        }

        let mut discrete = HeightField::with_noise(params(false), flat(-0.2));
        assert_eq!(discrete.slope(7.5, 7.5), 0.0);
    }

    #[test]
    fn test_slope_on_ramp() {
        // h = x, so the slope is 45 degrees everywhere
        let mut field = HeightField::with_noise(
            TerrainParams { smooth: true, height_scale: 1.0, ..Default::default() },
            |x: f64, _z: f64| x,
        );
        let s = field.slope(2.5, 1.5);
        assert!((s - 45.0).abs() < 0.1, "slope was {}", s);
    }

    #[test]
    fn test_classify_total() {
        let field = HeightField::new(TerrainParams::default());
        for i in -50..50 {
            let biome = field.classify(i as f32 * 37.0, i as f32 * -23.0);
            assert!(Biome::ALL.contains(&biome));
        }
    }

    #[test]
    fn test_generate_area_window() {
        let mut field = HeightField::new(params(false));
        let count = field.generate_area(10.5, -3.2, 2);
        assert_eq!(count, 25);
        assert_eq!(field.active_area().len(), 25);
        assert!(field.active_area().contains(&IVec2::new(10, -4)));
        assert!(field.active_area().contains(&IVec2::new(8, -6)));
        assert!(field.active_area().contains(&IVec2::new(12, -2)));
        assert_eq!(field.cache_len(), 25);
    }

    #[test]
    fn test_generate_area_replaces_active_set() {
        let mut field = HeightField::new(params(false));
        field.generate_area(0.0, 0.0, 1);
        field.generate_area(100.0, 100.0, 1);
        assert_eq!(field.active_area().len(), 9);
        assert!(!field.active_area().contains(&IVec2::ZERO));
        // Cache entries from the old window persist
        assert_eq!(field.cache_len(), 18);
    }

    #[test]
    fn test_generate_area_matches_on_demand_sampling() {
        let mut generated = HeightField::new(params(false));
        let mut on_demand = HeightField::new(params(false));
        generated.generate_area(0.0, 0.0, 4);
        for x in -4..=4 {
            for z in -4..=4 {
                let (x, z) = (x as f32 + 0.5, z as f32 + 0.5);
                assert_eq!(generated.sample(x, z).to_bits(), on_demand.sample(x, z).to_bits());
            }
        }
    }

    #[test]
    fn test_generate_area_zero_and_negative_radius() {
        let mut field = HeightField::new(params(false));
        assert_eq!(field.generate_area(0.0, 0.0, 0), 1);
        assert_eq!(field.generate_area(0.0, 0.0, -3), 1);
    }

    #[test]
    fn test_set_smooth_is_epoch_boundary() {
        let mut field = HeightField::new(params(false));
        field.generate_area(0.0, 0.0, 2);
        assert!(field.cache_len() > 0);

        field.set_smooth(false);
        assert_eq!(field.epoch(), 0);
        assert!(field.cache_len() > 0);

        field.set_smooth(true);
        assert_eq!(field.epoch(), 1);
        assert_eq!(field.cache_len(), 0);
        // Active area is left for the next generate_area
        assert_eq!(field.active_area().len(), 25);
    }

    #[test]
    fn test_set_block_size_clamps_and_clears() {
        let mut field = HeightField::new(params(true));
        field.sample(1.5, 1.5);
        assert!(field.cache_len() > 0);

        assert_eq!(field.set_block_size(5.0), MAX_BLOCK_SIZE);
        assert_eq!(field.cache_len(), 0);
        assert_eq!(field.epoch(), 1);

        assert_eq!(field.set_block_size(0.0), MIN_BLOCK_SIZE);
        assert_eq!(field.epoch(), 2);

        // Unchanged value is not an epoch boundary
        field.set_block_size(MIN_BLOCK_SIZE);
        assert_eq!(field.epoch(), 2);
    }

    #[test]
    fn test_adjust_block_size() {
        let mut field = HeightField::new(params(true));
        let bs = field.adjust_block_size(0.5);
        assert!((bs - 1.5).abs() < 1e-6);
        assert!((field.block_size() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_block_size_scales_lattice() {
        let mut field = HeightField::with_noise(
            TerrainParams { smooth: false, block_size: 0.5, height_scale: 1.0, ..Default::default() },
            |x: f64, _z: f64| x,
        );
        // Lattice point 5 sits at world x = 2.5
        assert_eq!(field.lattice_coord(2.7, 0.0), IVec2::new(5, 0));
        assert_eq!(field.sample(2.7, 0.0), 2.5);
    }

    #[test]
    fn test_eviction_keeps_results_identical() {
        let mut field = HeightField::new(TerrainParams {
            smooth: false,
            max_cache_entries: 50,
            cache_retain_factor: 1.0,
            ..Default::default()
        });
        let before = field.sample(0.5, 0.5);

        field.generate_area(0.0, 0.0, 3);
        field.generate_area(500.0, 500.0, 3);
        assert!(field.cache_len() <= 50);
        assert!(field.cache_len() >= 49);

        let after = field.sample(0.5, 0.5);
        assert_eq!(before.to_bits(), after.to_bits());
    }

    #[test]
    fn test_load_radius_cells_rounds() {
        let params = TerrainParams { block_size: 0.7, ..Default::default() };
        assert_eq!(params.load_radius_cells(), 43);

        let params = TerrainParams { block_size: 0.0, load_radius: 3.0, ..Default::default() };
        assert_eq!(params.effective_block_size(), MIN_BLOCK_SIZE);
        assert_eq!(params.load_radius_cells(), 30);
    }

    #[test]
    fn test_far_coordinates_do_not_overflow() {
        let mut field = HeightField::new(params(true));
        for (x, z) in [(3.0e9, 0.0), (-3.0e9, 3.0e9), (f32::MAX, f32::MIN)] {
            assert!(field.sample(x, z).is_finite());
            assert!(field.slope(x, z).is_finite());
        }

        let mut discrete = HeightField::new(params(false));
        assert!(discrete.sample(3.0e9, -3.0e9).is_finite());

        // The window saturates at the lattice edge instead of wrapping around
        let loaded = field.generate_area(3.0e9, 0.0, 2);
        assert!(loaded > 0 && loaded <= 25);
        assert!(field.active_area().iter().all(|c| c.x > 0));
    }

    #[test]
    fn test_invalid_block_size_replaced() {
        let field = HeightField::with_noise(
            TerrainParams { block_size: -1.0, ..Default::default() },
            flat(0.0),
        );
        assert_eq!(field.block_size(), MIN_BLOCK_SIZE);
    }
}
