//! Chunk storage: voxel/light arrays, coordinates, and the lifecycle state.
#![forbid(unsafe_code)]

mod coord;
mod grid;
mod state;

pub use coord::{ChunkCoord, join_world, split_world, y_in_world};
pub use grid::VoxelGrid;
pub use state::{ChunkState, StateCell};

/// Chunk extents in blocks. Compile-time constants: the flat array layout,
/// the persistence format, and the packed vertex encoding all assume them.
pub const CHUNK_SX: usize = 16;
pub const CHUNK_SY: usize = 64;
pub const CHUNK_SZ: usize = 16;

/// Number of voxels in one chunk volume.
pub const CHUNK_VOLUME: usize = CHUNK_SX * CHUNK_SY * CHUNK_SZ;

/// Sentinel light byte: both nibbles maxed, "unknown, assume fully lit".
/// Returned for any query that leaves loaded storage.
pub const LIGHT_UNKNOWN: u8 = 0xFF;

/// Maximum light level held by one nibble.
pub const MAX_LIGHT: u8 = 15;
