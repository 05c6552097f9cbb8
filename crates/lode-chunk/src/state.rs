use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of one chunk. Progression is strictly forward except for the
/// explicit demotion to `BlockDataReady` after a block edit (light and mesh
/// become stale but storage stays allocated) and the reset to `Allocated`
/// when a chunk returns to the pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ChunkState {
    Empty = 0,
    Allocated = 1,
    BlockDataReady = 2,
    LightReady = 3,
    MeshBuilt = 4,
    GpuReady = 5,
}

impl ChunkState {
    #[inline]
    pub fn from_u8(v: u8) -> ChunkState {
        match v {
            0 => ChunkState::Empty,
            1 => ChunkState::Allocated,
            2 => ChunkState::BlockDataReady,
            3 => ChunkState::LightReady,
            4 => ChunkState::MeshBuilt,
            _ => ChunkState::GpuReady,
        }
    }
}

/// Atomic holder for a [`ChunkState`], shared between the worker threads and
/// the render thread. Stage completion published through `store` is the
/// hand-off point the render thread observes; `demote_to` never lifts a
/// chunk forward, so concurrent demotions and resets stay monotone.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new(state: ChunkState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub fn load(&self) -> ChunkState {
        ChunkState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn store(&self, state: ChunkState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Publishes a completed stage: moves `from` to `to` only when the state
    /// is still `from`. Fails when a demotion landed while the stage ran, in
    /// which case the state is left alone and the stage re-runs later.
    pub fn advance(&self, from: ChunkState, to: ChunkState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Lowers the state to `target` if it is currently higher; no-op
    /// otherwise. Equivalent to an atomic `min`.
    pub fn demote_to(&self, target: ChunkState) -> bool {
        let mut cur = self.0.load(Ordering::Acquire);
        while cur > target as u8 {
            match self.0.compare_exchange_weak(
                cur,
                target as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => cur = observed,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demote_never_lifts() {
        let cell = StateCell::new(ChunkState::Allocated);
        assert!(!cell.demote_to(ChunkState::BlockDataReady));
        assert_eq!(cell.load(), ChunkState::Allocated);

        cell.store(ChunkState::GpuReady);
        assert!(cell.demote_to(ChunkState::BlockDataReady));
        assert_eq!(cell.load(), ChunkState::BlockDataReady);
        assert!(!cell.demote_to(ChunkState::BlockDataReady));
    }

    #[test]
    fn advance_respects_a_concurrent_demotion() {
        let cell = StateCell::new(ChunkState::LightReady);
        // Demotion lands while the mesh stage is running.
        cell.demote_to(ChunkState::BlockDataReady);
        assert!(!cell.advance(ChunkState::LightReady, ChunkState::MeshBuilt));
        assert_eq!(cell.load(), ChunkState::BlockDataReady);

        assert!(cell.advance(ChunkState::BlockDataReady, ChunkState::LightReady));
        assert_eq!(cell.load(), ChunkState::LightReady);
    }

    #[test]
    fn states_are_ordered() {
        assert!(ChunkState::Empty < ChunkState::Allocated);
        assert!(ChunkState::Allocated < ChunkState::BlockDataReady);
        assert!(ChunkState::BlockDataReady < ChunkState::LightReady);
        assert!(ChunkState::LightReady < ChunkState::MeshBuilt);
        assert!(ChunkState::MeshBuilt < ChunkState::GpuReady);
    }
}
