use lode_geom::Vec2;

use crate::{CHUNK_SX, CHUNK_SY, CHUNK_SZ};

/// 2D coordinate of one chunk column. The world is a grid of fixed-size
/// columns; vertical position is always local (the world has one chunk of
/// height).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// Chunk containing the given world block coordinate. Floor division, so
    /// negative coordinates map correctly (block -1 lives in chunk -1).
    #[inline]
    pub fn of_world(wx: i32, wz: i32) -> Self {
        Self {
            cx: wx.div_euclid(CHUNK_SX as i32),
            cz: wz.div_euclid(CHUNK_SZ as i32),
        }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cz: self.cz + dz,
        }
    }

    /// World coordinate of this chunk's minimum corner.
    #[inline]
    pub fn base(self) -> (i32, i32) {
        (self.cx * CHUNK_SX as i32, self.cz * CHUNK_SZ as i32)
    }

    /// Center of the chunk footprint in world units, used for distance
    /// ordering and culling.
    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new(
            (self.cx as f32 + 0.5) * CHUNK_SX as f32,
            (self.cz as f32 + 0.5) * CHUNK_SZ as f32,
        )
    }

    #[inline]
    pub fn distance_to(self, p: Vec2) -> f32 {
        self.center().distance(p)
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// Splits a world block position into its owning chunk and the local
/// coordinate inside that chunk. The local part is always in range on the
/// horizontal axes; `y` is passed through and may be out of range.
#[inline]
pub fn split_world(wx: i32, wy: i32, wz: i32) -> (ChunkCoord, (i32, i32, i32)) {
    let coord = ChunkCoord::of_world(wx, wz);
    let lx = wx.rem_euclid(CHUNK_SX as i32);
    let lz = wz.rem_euclid(CHUNK_SZ as i32);
    (coord, (lx, wy, lz))
}

/// Reconstructs the world position from a chunk coordinate and a local one.
#[inline]
pub fn join_world(coord: ChunkCoord, local: (i32, i32, i32)) -> (i32, i32, i32) {
    let (bx, bz) = coord.base();
    (bx + local.0, local.1, bz + local.2)
}

/// True when the vertical coordinate is inside the world column.
#[inline]
pub fn y_in_world(wy: i32) -> bool {
    wy >= 0 && wy < CHUNK_SY as i32
}
