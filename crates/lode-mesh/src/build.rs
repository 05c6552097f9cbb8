use lode_chunk::{CHUNK_SX, CHUNK_SZ};

/// CPU-side vertex streams for one chunk mesh.
///
/// Positions are packed: each vertex sits on an integer block corner inside
/// the chunk, so a corner `(x, y, z)` collapses into a single index into the
/// `(SX+1) x (SY+1) x (SZ+1)` corner lattice. The vertex shader unpacks it.
/// Light is one scalar per vertex, UVs are two floats per vertex. Faces are
/// non-indexed, two triangles each.
#[derive(Default, Clone)]
pub struct MeshBuild {
    pub positions: Vec<u32>,
    pub light: Vec<f32>,
    pub uv: Vec<f32>,
}

impl MeshBuild {
    /// Packs a corner-lattice position into its stream index.
    #[inline]
    pub fn pack_position(x: i32, y: i32, z: i32) -> u32 {
        let sx = CHUNK_SX as i32 + 1;
        let sz = CHUNK_SZ as i32 + 1;
        (x + z * sx + y * sx * sz) as u32
    }

    #[inline]
    pub fn push_vertex(&mut self, x: i32, y: i32, z: i32, light: f32, u: f32, v: f32) {
        self.positions.push(Self::pack_position(x, y, z));
        self.light.push(light);
        self.uv.push(u);
        self.uv.push(v);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Six vertices per face.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.positions.len() / 6
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Clears all streams but retains capacity for reuse across rebuilds.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.positions.clear();
        self.light.clear();
        self.uv.clear();
    }
}
