use lode_geom::{Vec2, Vec3};
use lode_mesh::MeshBuild;

/// Opaque identifier for a mesh the renderer has accepted. The manager never
/// interprets it, only hands it back for drawing and disposal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// The rendering surface the manager drives. Upload and draw are only ever
/// called from the thread that owns the manager; workers prepare CPU streams
/// and publish `MeshBuilt`, and the manager finishes the hand-off here.
pub trait ChunkRenderer {
    /// Takes ownership of the vertex streams, returns a handle for drawing.
    fn upload(&mut self, mesh: &MeshBuild) -> MeshHandle;
    /// Draws a previously uploaded mesh at a world-space chunk origin.
    fn draw(&mut self, handle: MeshHandle, origin: Vec3);
    /// Releases GPU resources for a handle that will not be drawn again.
    fn discard(&mut self, handle: MeshHandle);
}

/// Viewer state consumed by the streaming and culling passes.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Horizontal field of view in radians.
    pub fov: f32,
}

impl Camera {
    /// Facing direction projected onto the ground plane.
    pub fn facing_xz(&self) -> Vec2 {
        Vec2 {
            x: self.target.x - self.position.x,
            y: self.target.z - self.position.z,
        }
        .normalized()
    }
}
