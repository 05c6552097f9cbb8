//! CPU-side chunk meshing: face culling, light sampling, vertex packing.
#![forbid(unsafe_code)]

mod build;
mod mesher;
mod snapshot;

pub use build::MeshBuild;
pub use mesher::{AtlasLayout, build_chunk_mesh};
pub use snapshot::{BoundaryPlane, NeighborSnapshot};
