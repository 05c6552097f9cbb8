use lode_blocks::{AIR, BlockRegistry, Face};
use lode_chunk::{CHUNK_SX, CHUNK_SY, CHUNK_SZ, ChunkState, MAX_LIGHT, VoxelGrid};

use crate::build::MeshBuild;
use crate::snapshot::NeighborSnapshot;

/// Fixed texture-atlas grid. A tile index maps to `(index % cols, index / cols)`
/// and each cell spans `1/cols x 1/rows` in normalized UV space.
#[derive(Clone, Copy, Debug)]
pub struct AtlasLayout {
    pub cols: u16,
    pub rows: u16,
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self { cols: 8, rows: 2 }
    }
}

impl AtlasLayout {
    /// Normalized origin and extent of one tile.
    #[inline]
    pub fn tile_rect(&self, tile: u16) -> (f32, f32, f32, f32) {
        let du = 1.0 / self.cols as f32;
        let dv = 1.0 / self.rows as f32;
        let u0 = (tile % self.cols) as f32 * du;
        let v0 = (tile / self.cols) as f32 * dv;
        (u0, v0, du, dv)
    }
}

/// Corner offsets and tile-relative UVs for the six vertices of each face,
/// two counter-clockwise triangles. The winding and UV orientation are load
/// bearing for the renderer's backface culling and must not be reordered.
const FACE_VERTS: [[((i32, i32, i32), (f32, f32)); 6]; 6] = [
    // +Y
    [
        ((1, 1, 0), (1.0, 0.0)),
        ((0, 1, 0), (0.0, 0.0)),
        ((1, 1, 1), (1.0, 1.0)),
        ((1, 1, 1), (1.0, 1.0)),
        ((0, 1, 0), (0.0, 0.0)),
        ((0, 1, 1), (0.0, 1.0)),
    ],
    // -Y
    [
        ((0, 0, 0), (0.0, 0.0)),
        ((1, 0, 0), (1.0, 0.0)),
        ((1, 0, 1), (1.0, 1.0)),
        ((0, 0, 0), (0.0, 0.0)),
        ((1, 0, 1), (1.0, 1.0)),
        ((0, 0, 1), (0.0, 1.0)),
    ],
    // +X
    [
        ((1, 0, 0), (0.0, 1.0)),
        ((1, 1, 0), (0.0, 0.0)),
        ((1, 1, 1), (1.0, 0.0)),
        ((1, 0, 0), (0.0, 1.0)),
        ((1, 1, 1), (1.0, 0.0)),
        ((1, 0, 1), (1.0, 1.0)),
    ],
    // -X
    [
        ((0, 1, 0), (0.0, 0.0)),
        ((0, 0, 0), (0.0, 1.0)),
        ((0, 1, 1), (1.0, 0.0)),
        ((0, 1, 1), (1.0, 0.0)),
        ((0, 0, 0), (0.0, 1.0)),
        ((0, 0, 1), (1.0, 1.0)),
    ],
    // +Z
    [
        ((0, 0, 1), (0.0, 1.0)),
        ((1, 0, 1), (1.0, 1.0)),
        ((1, 1, 1), (1.0, 0.0)),
        ((0, 0, 1), (0.0, 1.0)),
        ((1, 1, 1), (1.0, 0.0)),
        ((0, 1, 1), (0.0, 0.0)),
    ],
    // -Z
    [
        ((1, 0, 0), (1.0, 1.0)),
        ((0, 0, 0), (0.0, 1.0)),
        ((1, 1, 0), (1.0, 0.0)),
        ((1, 1, 0), (1.0, 0.0)),
        ((0, 0, 0), (0.0, 1.0)),
        ((0, 1, 0), (0.0, 0.0)),
    ],
];

#[inline]
fn cell_block(
    grid: &VoxelGrid,
    neighbors: &NeighborSnapshot,
    x: i32,
    y: i32,
    z: i32,
) -> lode_blocks::BlockId {
    if VoxelGrid::in_bounds(x, y, z) {
        grid.block(x, y, z)
    } else {
        neighbors.block_beyond(x, y, z)
    }
}

#[inline]
fn cell_light(grid: &VoxelGrid, neighbors: &NeighborSnapshot, x: i32, y: i32, z: i32) -> u8 {
    if VoxelGrid::in_bounds(x, y, z) {
        grid.light(x, y, z)
    } else {
        neighbors.light_beyond(x, y, z)
    }
}

/// Builds the vertex streams for one chunk into `out`.
///
/// A quad is emitted for every solid-block face whose adjacent cell is empty.
/// Adjacency crosses chunk boundaries through the neighbor snapshot; an
/// unloaded neighbor counts as empty, so faces at the edge of loaded terrain
/// stay visible. Face intensity is the direction weight times
/// `max(block_light, sky_light) / 15` sampled from the cell just beyond the
/// face.
///
/// Refuses to run before the chunk's light pass has completed, leaving `out`
/// cleared; the caller retries after the chunk advances.
pub fn build_chunk_mesh(
    grid: &VoxelGrid,
    registry: &BlockRegistry,
    neighbors: &NeighborSnapshot,
    atlas: AtlasLayout,
    state: ChunkState,
    out: &mut MeshBuild,
) -> bool {
    out.clear_keep_capacity();
    if state < ChunkState::LightReady {
        log::error!("mesh build requested before lighting completed (state {state:?})");
        return false;
    }

    for x in 0..CHUNK_SX as i32 {
        for y in 0..CHUNK_SY as i32 {
            for z in 0..CHUNK_SZ as i32 {
                let id = grid.block(x, y, z);
                if id == AIR {
                    continue;
                }
                let def = registry.get(id);
                for face in Face::ALL {
                    let (dx, dy, dz) = face.delta();
                    let (nx, ny, nz) = (x + dx, y + dy, z + dz);
                    if cell_block(grid, neighbors, nx, ny, nz) != AIR {
                        continue;
                    }
                    let packed = cell_light(grid, neighbors, nx, ny, nz);
                    let nibble = (packed & 0x0F).max(packed >> 4);
                    let intensity = face.shade() * nibble as f32 / MAX_LIGHT as f32;

                    let (u0, v0, du, dv) = atlas.tile_rect(def.tile(face));
                    for &((cx, cy, cz), (fu, fv)) in &FACE_VERTS[face.index()] {
                        out.push_vertex(
                            x + cx,
                            y + cy,
                            z + cz,
                            intensity,
                            u0 + fu * du,
                            v0 + fv * dv,
                        );
                    }
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::BoundaryPlane;
    use lode_lighting::relight;

    fn registry() -> BlockRegistry {
        BlockRegistry::default_palette()
    }

    fn build(grid: &VoxelGrid, neighbors: &NeighborSnapshot) -> MeshBuild {
        let mut out = MeshBuild::default();
        assert!(build_chunk_mesh(
            grid,
            &registry(),
            neighbors,
            AtlasLayout::default(),
            ChunkState::LightReady,
            &mut out,
        ));
        out
    }

    #[test]
    fn isolated_block_emits_six_faces() {
        let mut grid = VoxelGrid::new();
        grid.set_block(8, 30, 8, 1);
        let mesh = build(&grid, &NeighborSnapshot::default());
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.vertex_count(), 36);
    }

    #[test]
    fn adjacent_pair_culls_the_shared_face() {
        let mut grid = VoxelGrid::new();
        grid.set_block(8, 30, 8, 1);
        grid.set_block(9, 30, 8, 1);
        let mesh = build(&grid, &NeighborSnapshot::default());
        assert_eq!(mesh.face_count(), 10);
        assert_eq!(mesh.vertex_count(), 60);
    }

    #[test]
    fn refuses_to_build_before_lighting() {
        let mut grid = VoxelGrid::new();
        grid.set_block(0, 0, 0, 1);
        let mut out = MeshBuild::default();
        let ok = build_chunk_mesh(
            &grid,
            &registry(),
            &NeighborSnapshot::default(),
            AtlasLayout::default(),
            ChunkState::BlockDataReady,
            &mut out,
        );
        assert!(!ok);
        assert!(out.is_empty());
    }

    #[test]
    fn face_order_and_shades_match_the_direction_weights() {
        let mut grid = VoxelGrid::new();
        grid.set_block(8, 30, 8, 1);
        // Untouched light reads as the fully-lit sentinel everywhere, so each
        // face carries its bare direction weight.
        let mesh = build(&grid, &NeighborSnapshot::default());
        let expected = [1.0f32, 0.5, 0.7, 0.8, 0.9, 0.6];
        for (face, want) in expected.iter().enumerate() {
            for v in 0..6 {
                assert_eq!(mesh.light[face * 6 + v], *want);
            }
        }
    }

    #[test]
    fn top_face_shade_follows_the_sampled_sky_light() {
        let mut grid = VoxelGrid::new();
        // Seal the block under a ceiling: the shadowed cell above it only
        // receives lateral light, sky level 13 next door spreading in as 12.
        grid.set_block(8, 62, 8, 1);
        grid.set_block(8, 60, 8, 1);
        relight(&mut grid);
        assert_eq!(grid.sky_light(8, 61, 8), 12);
        let mesh = build(&grid, &NeighborSnapshot::default());
        // The lower block meshes first in scan order and its first face
        // is +Y, sampling the shadowed cell.
        let top_light = mesh.light[0];
        assert!((top_light - 12.0 / 15.0).abs() < 1e-6);
    }

    #[test]
    fn first_face_uv_and_packed_corner_are_exact() {
        let mut grid = VoxelGrid::new();
        grid.set_block(0, 0, 0, 3);
        let mesh = build(&grid, &NeighborSnapshot::default());
        // Grass maps its +Y face to tile 0: first vertex is corner (1,1,0)
        // with tile-relative UV (1,0) in an 8x2 atlas.
        assert_eq!(mesh.positions[0], MeshBuild::pack_position(1, 1, 0));
        assert!((mesh.uv[0] - 0.125).abs() < 1e-6);
        assert_eq!(mesh.uv[1], 0.0);
    }

    #[test]
    fn snapshot_plane_culls_boundary_faces() {
        let mut grid = VoxelGrid::new();
        let edge = CHUNK_SX as i32 - 1;
        grid.set_block(edge, 30, 8, 1);

        let open = build(&grid, &NeighborSnapshot::default());
        assert_eq!(open.face_count(), 6);

        let mut neighbor = VoxelGrid::new();
        neighbor.set_block(0, 30, 8, 1);
        let snap = NeighborSnapshot {
            pos_x: Some(BoundaryPlane::from_x_plane(&neighbor, 0)),
            ..Default::default()
        };
        let sealed = build(&grid, &snap);
        assert_eq!(sealed.face_count(), 5);
    }
}
