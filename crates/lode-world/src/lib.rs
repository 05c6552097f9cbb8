//! Procedural terrain: a deterministic world-position to block-id function.
#![forbid(unsafe_code)]

use fastnoise_lite::{FastNoiseLite, NoiseType};
use lode_blocks::{AIR, BlockId};
use lode_chunk::{CHUNK_SX, CHUNK_SY, CHUNK_SZ, ChunkCoord, VoxelGrid};
use serde::Deserialize;

/// Pure generation function. Implementations must be deterministic for a
/// given world position so an unmodified chunk can be regenerated instead of
/// persisted.
pub trait WorldGen: Send + Sync {
    fn block_at(&self, wx: i32, wy: i32, wz: i32) -> BlockId;
}

/// Tunables for [`NoiseWorldGen`], loadable from the runtime config file.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorldGenConfig {
    pub seed: i32,
    /// Terrain midline in blocks.
    pub base_height: f32,
    /// Half the peak-to-valley span in blocks.
    pub amplitude: f32,
    /// Base noise frequency; the plain and blend layers scale off it.
    pub frequency: f32,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            base_height: 30.0,
            amplitude: 30.0,
            frequency: 0.005,
        }
    }
}

/// Layered-noise terrain. Two height fields, a jagged mountain profile and a
/// gentle plain, are blended by a third low-frequency field, then the result
/// is squared toward the midline to widen the flats. Blocks stack as stone
/// below dirt below one grass cap.
pub struct NoiseWorldGen {
    mountain: FastNoiseLite,
    plain: FastNoiseLite,
    blend: FastNoiseLite,
    cfg: WorldGenConfig,
}

fn sampler(seed: i32) -> FastNoiseLite {
    let mut n = FastNoiseLite::with_seed(seed);
    n.set_noise_type(Some(NoiseType::OpenSimplex2));
    n.set_frequency(Some(1.0));
    n
}

/// Normalized 2D fractional Brownian motion, persistence 0.5, lacunarity 2.
fn fbm2(n: &FastNoiseLite, octaves: u32, x: f32, y: f32, base_freq: f32) -> f32 {
    let mut amp = 1.0_f32;
    let mut freq = base_freq;
    let mut sum = 0.0_f32;
    let mut max_amp = 0.0_f32;
    for _ in 0..octaves.max(1) {
        sum += n.get_noise_2d(x * freq, y * freq) * amp;
        max_amp += amp;
        amp *= 0.5;
        freq *= 2.0;
    }
    if max_amp > 0.0 { sum / max_amp } else { sum }
}

impl NoiseWorldGen {
    pub fn new(cfg: WorldGenConfig) -> Self {
        Self {
            mountain: sampler(cfg.seed),
            plain: sampler(cfg.seed ^ 99_173),
            blend: sampler(cfg.seed ^ 41_337),
            cfg,
        }
    }

    /// Terrain column height at a world (x, z).
    pub fn height_at(&self, wx: i32, wz: i32) -> i32 {
        let (x, z) = (wx as f32, wz as f32);
        let f = self.cfg.frequency;
        let mountain = fbm2(&self.mountain, 8, x, z, f).abs() * 2.0 - 1.0;
        let plain = fbm2(&self.plain, 4, x * 0.4, z * 0.4, f);
        let lerp = fbm2(&self.blend, 8, x * 0.3, z * 0.3, f) * 0.5 + 0.5;

        let mut val = mountain * lerp + plain * (1.0 - lerp);
        val = (val * 0.5 + 0.5).powi(2) * 2.0 - 1.0;
        (self.cfg.base_height + val * self.cfg.amplitude) as i32
    }
}

impl WorldGen for NoiseWorldGen {
    fn block_at(&self, wx: i32, wy: i32, wz: i32) -> BlockId {
        let height = self.height_at(wx, wz);
        if wy < height - 5 {
            return 1;
        }
        if wy < height - 1 {
            return 2;
        }
        if wy < height {
            return 3;
        }
        AIR
    }
}

/// Uniform slab up to a fixed height; fixture generator for tests and
/// benchmarks where noise would obscure the behavior under test.
pub struct FlatWorldGen {
    pub thickness: i32,
    pub block: BlockId,
}

impl WorldGen for FlatWorldGen {
    fn block_at(&self, _wx: i32, wy: i32, _wz: i32) -> BlockId {
        if wy < self.thickness { self.block } else { AIR }
    }
}

/// Fills a chunk's voxel array from the generator, one call per cell.
pub fn populate_chunk(generator: &dyn WorldGen, coord: ChunkCoord, grid: &mut VoxelGrid) {
    let (bx, bz) = coord.base();
    for x in 0..CHUNK_SX as i32 {
        for y in 0..CHUNK_SY as i32 {
            for z in 0..CHUNK_SZ as i32 {
                grid.set_block(x, y, z, generator.block_at(bx + x, y, bz + z));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = NoiseWorldGen::new(WorldGenConfig::default());
        let b = NoiseWorldGen::new(WorldGenConfig::default());
        for wx in [-1000, -7, 0, 3, 999] {
            for wz in [-500, 0, 12] {
                assert_eq!(a.height_at(wx, wz), b.height_at(wx, wz));
                for wy in 0..CHUNK_SY as i32 {
                    assert_eq!(a.block_at(wx, wy, wz), b.block_at(wx, wy, wz));
                }
            }
        }
    }

    #[test]
    fn columns_stack_stone_dirt_grass_air() {
        let generator = NoiseWorldGen::new(WorldGenConfig::default());
        // Pick any column tall enough to show the full strata.
        let (wx, wz, h) = (0..512)
            .map(|i| (i * 13, i * 7, generator.height_at(i * 13, i * 7)))
            .find(|&(_, _, h)| h >= 7 && h < CHUNK_SY as i32)
            .unwrap();
        assert_eq!(generator.block_at(wx, h - 6, wz), 1);
        assert_eq!(generator.block_at(wx, h - 2, wz), 2);
        assert_eq!(generator.block_at(wx, h - 1, wz), 3);
        assert_eq!(generator.block_at(wx, h, wz), AIR);
    }

    #[test]
    fn different_seeds_disagree_somewhere() {
        let a = NoiseWorldGen::new(WorldGenConfig::default());
        let b = NoiseWorldGen::new(WorldGenConfig {
            seed: 4242,
            ..Default::default()
        });
        let differs = (0..256).any(|i| a.height_at(i * 17, i * 31) != b.height_at(i * 17, i * 31));
        assert!(differs);
    }

    #[test]
    fn populate_matches_pointwise_generation() {
        let generator = FlatWorldGen {
            thickness: 12,
            block: 1,
        };
        let coord = ChunkCoord::new(-3, 5);
        let mut grid = VoxelGrid::new();
        populate_chunk(&generator, coord, &mut grid);
        assert_eq!(grid.block(0, 0, 0), 1);
        assert_eq!(grid.block(5, 11, 9), 1);
        assert_eq!(grid.block(5, 12, 9), AIR);
    }
}
