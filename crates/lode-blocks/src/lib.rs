//! Block identity table and cube-face constants.
#![forbid(unsafe_code)]

mod face;
mod registry;

pub use face::Face;
pub use registry::{BlockDef, BlockRegistry, BlocksConfig};

/// Block type identifier stored per voxel. `0` is always air.
pub type BlockId = u8;

/// The empty block.
pub const AIR: BlockId = 0;
