use lode_blocks::{AIR, BlockId};
use lode_chunk::{CHUNK_SX, CHUNK_SY, CHUNK_SZ, LIGHT_UNKNOWN, VoxelGrid};

/// One boundary plane of a horizontally adjacent chunk: the column of cells
/// the neighbor exposes toward us, blocks and packed light together.
///
/// For an east/west neighbor the plane is indexed by `(y, z)`, for a
/// north/south neighbor by `(y, x)`.
#[derive(Clone)]
pub struct BoundaryPlane {
    blocks: Vec<BlockId>,
    light: Vec<u8>,
    width: usize,
}

impl BoundaryPlane {
    /// Copies the `x = local_x` plane out of a neighbor grid.
    pub fn from_x_plane(grid: &VoxelGrid, local_x: i32) -> Self {
        let width = CHUNK_SZ;
        let mut blocks = Vec::with_capacity(width * CHUNK_SY);
        let mut light = Vec::with_capacity(width * CHUNK_SY);
        for y in 0..CHUNK_SY as i32 {
            for z in 0..CHUNK_SZ as i32 {
                blocks.push(grid.block(local_x, y, z));
                light.push(grid.light(local_x, y, z));
            }
        }
        Self {
            blocks,
            light,
            width,
        }
    }

    /// Copies the `z = local_z` plane out of a neighbor grid.
    pub fn from_z_plane(grid: &VoxelGrid, local_z: i32) -> Self {
        let width = CHUNK_SX;
        let mut blocks = Vec::with_capacity(width * CHUNK_SY);
        let mut light = Vec::with_capacity(width * CHUNK_SY);
        for y in 0..CHUNK_SY as i32 {
            for x in 0..CHUNK_SX as i32 {
                blocks.push(grid.block(x, y, local_z));
                light.push(grid.light(x, y, local_z));
            }
        }
        Self {
            blocks,
            light,
            width,
        }
    }

    #[inline]
    fn slot(&self, y: i32, across: i32) -> Option<usize> {
        if y < 0 || y >= CHUNK_SY as i32 || across < 0 || across >= self.width as i32 {
            return None;
        }
        Some(y as usize * self.width + across as usize)
    }

    #[inline]
    pub fn block(&self, y: i32, across: i32) -> BlockId {
        self.slot(y, across).map_or(AIR, |i| self.blocks[i])
    }

    #[inline]
    pub fn light(&self, y: i32, across: i32) -> u8 {
        self.slot(y, across).map_or(LIGHT_UNKNOWN, |i| self.light[i])
    }
}

/// Read-only captures of the four horizontal neighbors' facing planes, taken
/// before a mesh build so the mesher never reaches back into the live chunk
/// map. A missing plane means the neighbor was not loaded (or was busy when
/// the snapshot was taken); its cells read as empty and fully lit, which
/// keeps edge-of-terrain faces visible.
#[derive(Clone, Default)]
pub struct NeighborSnapshot {
    pub neg_x: Option<BoundaryPlane>,
    pub pos_x: Option<BoundaryPlane>,
    pub neg_z: Option<BoundaryPlane>,
    pub pos_z: Option<BoundaryPlane>,
}

impl NeighborSnapshot {
    /// Block at a local position exactly one step outside the chunk bounds.
    /// Vertical overshoot reads as air; horizontal overshoot consults the
    /// captured plane for that side.
    #[inline]
    pub fn block_beyond(&self, x: i32, y: i32, z: i32) -> BlockId {
        if y < 0 || y >= CHUNK_SY as i32 {
            return AIR;
        }
        if x < 0 {
            return self.neg_x.as_ref().map_or(AIR, |p| p.block(y, z));
        }
        if x >= CHUNK_SX as i32 {
            return self.pos_x.as_ref().map_or(AIR, |p| p.block(y, z));
        }
        if z < 0 {
            return self.neg_z.as_ref().map_or(AIR, |p| p.block(y, x));
        }
        if z >= CHUNK_SZ as i32 {
            return self.pos_z.as_ref().map_or(AIR, |p| p.block(y, x));
        }
        AIR
    }

    /// Packed light byte one step outside the chunk bounds. Unknown cells
    /// return [`LIGHT_UNKNOWN`] so unlit seams do not appear at load edges.
    #[inline]
    pub fn light_beyond(&self, x: i32, y: i32, z: i32) -> u8 {
        if y < 0 || y >= CHUNK_SY as i32 {
            return LIGHT_UNKNOWN;
        }
        if x < 0 {
            return self.neg_x.as_ref().map_or(LIGHT_UNKNOWN, |p| p.light(y, z));
        }
        if x >= CHUNK_SX as i32 {
            return self.pos_x.as_ref().map_or(LIGHT_UNKNOWN, |p| p.light(y, z));
        }
        if z < 0 {
            return self.neg_z.as_ref().map_or(LIGHT_UNKNOWN, |p| p.light(y, x));
        }
        if z >= CHUNK_SZ as i32 {
            return self.pos_z.as_ref().map_or(LIGHT_UNKNOWN, |p| p.light(y, x));
        }
        LIGHT_UNKNOWN
    }
}
