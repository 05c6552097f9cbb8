//! In-chunk sky-light seeding and flood-fill propagation.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use lode_blocks::{AIR, Face};
use lode_chunk::{CHUNK_SX, CHUNK_SY, CHUNK_SZ, MAX_LIGHT, VoxelGrid};


/// Recomputes the whole light volume of one chunk.
///
/// Sky light is seeded per column: scanning down from the top of the chunk,
/// the run of empty cells above the first solid block receives decreasing
/// levels, 15 at the very top cell down to 1, stopping at the solid block or
/// when the level would reach 0. Every seeded cell then spreads outward
/// through the six face neighbors, losing one level per step.
///
/// The spread is a multi-source BFS over an explicit worklist rather than a
/// recursive fill, so iteration order is deterministic and stack depth does
/// not track the light radius. A neighbor cell is only overwritten when the
/// propagated value is strictly greater than what it already stores and the
/// cell is empty; propagation dies at level 1, at the chunk bounds, and at
/// solid blocks.
///
/// Block light (the low nibble) is byte-reserved but never populated: no
/// block type emits light in this model. It reads back as 0 everywhere.
pub fn relight(grid: &mut VoxelGrid) {
    grid.clear_light();

    let mut worklist: VecDeque<(i32, i32, i32, u8)> = VecDeque::new();
    for z in 0..CHUNK_SZ as i32 {
        for x in 0..CHUNK_SX as i32 {
            let mut level = MAX_LIGHT;
            for y in (0..CHUNK_SY as i32).rev() {
                if grid.block(x, y, z) != AIR {
                    break;
                }
                grid.set_sky_light(x, y, z, level);
                worklist.push_back((x, y, z, level));
                if level == 1 {
                    break;
                }
                level -= 1;
            }
        }
    }

    while let Some((x, y, z, level)) = worklist.pop_front() {
        if level <= 1 {
            continue;
        }
        let spread = level - 1;
        for face in Face::ALL {
            let (dx, dy, dz) = face.delta();
            let (nx, ny, nz) = (x + dx, y + dy, z + dz);
            if !VoxelGrid::in_bounds(nx, ny, nz) {
                continue;
            }
            if grid.block(nx, ny, nz) != AIR {
                continue;
            }
            if grid.sky_light(nx, ny, nz) >= spread {
                continue;
            }
            grid.set_sky_light(nx, ny, nz, spread);
            worklist.push_back((nx, ny, nz, spread));
        }
    }
}
