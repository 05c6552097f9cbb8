use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use lode_chunk::{ChunkCoord, ChunkState};

use crate::chunk::Chunk;

/// Recycler for chunk storage. The voxel and light arrays are the most
/// frequent large allocation in the system, paid once per load/unload cycle,
/// so released chunks keep their arrays and are handed back out instead of
/// reallocated.
pub struct ChunkPool {
    tx: Sender<Arc<Chunk>>,
    rx: Receiver<Arc<Chunk>>,
}

impl ChunkPool {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Returns a recycled chunk rebound to `coord`, or a fresh one when the
    /// pool is empty. A recycled chunk comes back in `Allocated` state with
    /// stale array contents; the population stage overwrites them.
    pub fn acquire(&self, coord: ChunkCoord) -> Arc<Chunk> {
        match self.rx.try_recv() {
            Ok(chunk) => {
                {
                    let mut inner = chunk.lock();
                    inner.coord = coord;
                    inner.dirty = false;
                    inner.gpu = None;
                    inner.mesh.clear_keep_capacity();
                }
                chunk.state().store(ChunkState::Allocated);
                chunk
            }
            Err(_) => Arc::new(Chunk::new(coord)),
        }
    }

    /// Resets the chunk's lifecycle and bumps its epoch so stale queue
    /// entries from the previous tenancy are dropped, then shelves it.
    pub fn release(&self, chunk: Arc<Chunk>) {
        chunk.bump_epoch();
        chunk.state().store(ChunkState::Allocated);
        {
            let mut inner = chunk.lock();
            inner.dirty = false;
        }
        let _ = self.tx.send(chunk);
    }
}

impl Default for ChunkPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_chunks_are_reused() {
        let pool = ChunkPool::new();
        let a = pool.acquire(ChunkCoord::new(0, 0));
        let epoch = a.epoch();
        pool.release(Arc::clone(&a));
        let b = pool.acquire(ChunkCoord::new(7, -3));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.lock().coord, ChunkCoord::new(7, -3));
        assert_eq!(b.epoch(), epoch + 1);
        assert_eq!(b.state().load(), ChunkState::Allocated);
    }

    #[test]
    fn empty_pool_allocates() {
        let pool = ChunkPool::new();
        let a = pool.acquire(ChunkCoord::new(1, 1));
        let b = pool.acquire(ChunkCoord::new(2, 2));
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
