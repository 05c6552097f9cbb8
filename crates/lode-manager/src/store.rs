use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lode_chunk::{CHUNK_VOLUME, ChunkCoord, VoxelGrid};

/// On-disk chunk persistence: one file per coordinate holding the raw voxel
/// bytes, nothing else. No header, no light data, no version tag; a change
/// to the chunk dimensions invalidates existing saves silently. Known
/// limitation, kept for save-file compatibility.
pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<cx>.<cz>.txt`
    pub fn path_for(&self, coord: ChunkCoord) -> PathBuf {
        self.dir.join(format!("{}.{}.txt", coord.cx, coord.cz))
    }

    pub fn save(&self, coord: ChunkCoord, grid: &VoxelGrid) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(coord), grid.block_bytes())?;
        log::debug!("wrote chunk ({}, {})", coord.cx, coord.cz);
        Ok(())
    }

    /// Loads the voxel array for `coord` into `grid`. `Ok(false)` means the
    /// chunk was never saved (or its file is unusable) and should be
    /// generated procedurally instead.
    pub fn load(&self, coord: ChunkCoord, grid: &mut VoxelGrid) -> io::Result<bool> {
        let path = self.path_for(coord);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if !grid.load_block_bytes(&bytes) {
            log::warn!(
                "chunk file {} holds {} bytes, expected {}; regenerating",
                path.display(),
                bytes.len(),
                CHUNK_VOLUME
            );
            return Ok(false);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn scratch_dir() -> PathBuf {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        std::env::temp_dir().join(format!(
            "lode-store-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ))
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = scratch_dir();
        let store = ChunkStore::new(&dir);
        let coord = ChunkCoord::new(-4, 9);

        let mut grid = VoxelGrid::new();
        grid.set_block(3, 17, 8, 2);
        grid.set_block(15, 63, 15, 1);
        store.save(coord, &grid).unwrap();

        let mut loaded = VoxelGrid::new();
        assert!(store.load(coord, &mut loaded).unwrap());
        assert_eq!(loaded.block_bytes(), grid.block_bytes());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_falls_back_to_generation() {
        let store = ChunkStore::new(scratch_dir());
        let mut grid = VoxelGrid::new();
        assert!(!store.load(ChunkCoord::new(0, 0), &mut grid).unwrap());
    }

    #[test]
    fn truncated_file_falls_back_to_generation() {
        let dir = scratch_dir();
        let store = ChunkStore::new(&dir);
        let coord = ChunkCoord::new(2, 2);
        fs::create_dir_all(&dir).unwrap();
        fs::write(store.path_for(coord), [1u8, 2, 3]).unwrap();

        let mut grid = VoxelGrid::new();
        assert!(!store.load(coord, &mut grid).unwrap());

        fs::remove_dir_all(&dir).unwrap();
    }
}
