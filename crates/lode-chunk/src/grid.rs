use lode_blocks::{AIR, BlockId};

use crate::{CHUNK_SX, CHUNK_SY, CHUNK_SZ, CHUNK_VOLUME, LIGHT_UNKNOWN};

/// Flat voxel storage for one chunk: a block-id byte and a packed light byte
/// per cell, allocated together and recycled together by the chunk pool.
///
/// Light packing: low nibble block light, high nibble sky light. No block in
/// this model emits light, so the low nibble stays 0 after a relight pass;
/// fresh arrays are filled with [`LIGHT_UNKNOWN`].
#[derive(Clone, Debug)]
pub struct VoxelGrid {
    blocks: Vec<BlockId>,
    light: Vec<u8>,
}

impl VoxelGrid {
    pub fn new() -> Self {
        Self {
            blocks: vec![AIR; CHUNK_VOLUME],
            light: vec![LIGHT_UNKNOWN; CHUNK_VOLUME],
        }
    }

    /// Fixed linear index for an in-bounds local position.
    #[inline]
    pub fn idx(x: usize, y: usize, z: usize) -> usize {
        (y * CHUNK_SZ + z) * CHUNK_SX + x
    }

    #[inline]
    pub fn in_bounds(x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && x < CHUNK_SX as i32
            && y < CHUNK_SY as i32
            && z < CHUNK_SZ as i32
    }

    /// Block at a local position; air for anything outside the chunk volume.
    /// Boundary queries that must see neighbor chunks go through the manager
    /// layer, never through the grid.
    #[inline]
    pub fn block(&self, x: i32, y: i32, z: i32) -> BlockId {
        if !Self::in_bounds(x, y, z) {
            return AIR;
        }
        self.blocks[Self::idx(x as usize, y as usize, z as usize)]
    }

    /// Writes one block. Returns false (and does nothing) when the position
    /// is out of range; the caller owns dirty-marking and state demotion.
    #[inline]
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        if !Self::in_bounds(x, y, z) {
            return false;
        }
        self.blocks[Self::idx(x as usize, y as usize, z as usize)] = id;
        true
    }

    /// Packed light byte at a local position; [`LIGHT_UNKNOWN`] outside the
    /// chunk volume.
    #[inline]
    pub fn light(&self, x: i32, y: i32, z: i32) -> u8 {
        if !Self::in_bounds(x, y, z) {
            return LIGHT_UNKNOWN;
        }
        self.light[Self::idx(x as usize, y as usize, z as usize)]
    }

    #[inline]
    pub fn sky_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.light(x, y, z) >> 4
    }

    #[inline]
    pub fn block_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.light(x, y, z) & 0x0F
    }

    #[inline]
    pub fn set_sky_light(&mut self, x: i32, y: i32, z: i32, value: u8) {
        if !Self::in_bounds(x, y, z) {
            return;
        }
        let i = Self::idx(x as usize, y as usize, z as usize);
        self.light[i] = (value << 4) | (self.light[i] & 0x0F);
    }

    #[inline]
    pub fn set_block_light(&mut self, x: i32, y: i32, z: i32, value: u8) {
        if !Self::in_bounds(x, y, z) {
            return;
        }
        let i = Self::idx(x as usize, y as usize, z as usize);
        self.light[i] = (self.light[i] & 0xF0) | (value & 0x0F);
    }

    /// Resets every light byte before a relight pass.
    pub fn clear_light(&mut self) {
        self.light.fill(0);
    }

    pub fn fill_blocks(&mut self, id: BlockId) {
        self.blocks.fill(id);
    }

    /// Raw voxel bytes in storage order; this is exactly what gets persisted.
    #[inline]
    pub fn block_bytes(&self) -> &[u8] {
        &self.blocks
    }

    /// Overwrites the voxel array from a persisted dump. Rejects any slice
    /// that is not exactly one chunk volume.
    pub fn load_block_bytes(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() != CHUNK_VOLUME {
            return false;
        }
        self.blocks.copy_from_slice(bytes);
        true
    }
}

impl Default for VoxelGrid {
    fn default() -> Self {
        Self::new()
    }
}
