use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::TryLockError;
use std::sync::atomic::{AtomicU64, Ordering};

use lode_chunk::{ChunkCoord, ChunkState, StateCell, VoxelGrid};
use lode_mesh::MeshBuild;

use crate::render::MeshHandle;

/// Everything behind the chunk's own lock: voxel storage, CPU mesh streams,
/// the GPU handle, and the dirty flag for persistence.
pub struct ChunkInner {
    pub coord: ChunkCoord,
    pub grid: VoxelGrid,
    pub mesh: MeshBuild,
    pub gpu: Option<MeshHandle>,
    pub dirty: bool,
}

/// One streamed chunk. The lifecycle state and the recycling epoch live
/// outside the lock so the render thread and the unload path can inspect a
/// chunk without stalling behind a worker that is populating it.
///
/// The epoch counts recycles: it is bumped every time the chunk returns to
/// the pool, so a queue entry that still references the previous tenancy can
/// be recognized and dropped instead of operating on the wrong coordinate.
pub struct Chunk {
    state: StateCell,
    epoch: AtomicU64,
    inner: Mutex<ChunkInner>,
}

impl Chunk {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            state: StateCell::new(ChunkState::Allocated),
            epoch: AtomicU64::new(0),
            inner: Mutex::new(ChunkInner {
                coord,
                grid: VoxelGrid::new(),
                mesh: MeshBuild::default(),
                gpu: None,
                dirty: false,
            }),
        }
    }

    #[inline]
    pub fn state(&self) -> &StateCell {
        &self.state
    }

    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    #[inline]
    pub fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Blocking lock; used by workers and by short main-thread accesses.
    pub fn lock(&self) -> MutexGuard<'_, ChunkInner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Non-blocking lock; the eviction and render paths skip a chunk a
    /// worker currently holds rather than wait for it.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, ChunkInner>> {
        match self.inner.try_lock() {
            Ok(g) => Some(g),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}
