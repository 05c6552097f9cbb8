//! Chunk streaming: the loaded-chunk map, background load workers, eviction,
//! persistence, and the per-frame render pass.
#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use hashbrown::HashMap;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Deserialize;

use lode_blocks::{AIR, BlockId, BlockRegistry};
use lode_chunk::{CHUNK_SX, CHUNK_SY, CHUNK_SZ, ChunkCoord, ChunkState, LIGHT_UNKNOWN, split_world};
use lode_geom::{Vec2, Vec3};
use lode_lighting::relight;
use lode_mesh::{AtlasLayout, BoundaryPlane, NeighborSnapshot, build_chunk_mesh};
use lode_world::{WorldGen, populate_chunk};

mod chunk;
mod pool;
mod raycast;
mod render;
mod store;

pub use chunk::{Chunk, ChunkInner};
pub use pool::ChunkPool;
pub use raycast::RayHit;
pub use render::{Camera, ChunkRenderer, MeshHandle};
pub use store::ChunkStore;

/// Streaming distances are in chunks; comparisons happen in world units
/// against the distance from the viewer to each chunk's center.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    pub view_distance: i32,
    pub load_distance: i32,
    pub unload_distance: i32,
    pub workers: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            view_distance: 18,
            load_distance: 20,
            unload_distance: 23,
            workers: 1,
        }
    }
}

/// A claim on one chunk at one tenancy. If the chunk is recycled before a
/// worker gets to the entry, the epoch no longer matches and the entry is
/// dropped instead of touching the new tenant.
struct QueueEntry {
    coord: ChunkCoord,
    chunk: Arc<Chunk>,
    epoch: u64,
}

struct QueueInner {
    entries: VecDeque<QueueEntry>,
    paused: bool,
    terminate: bool,
}

struct WorkQueue {
    inner: Mutex<QueueInner>,
    cond: Condvar,
}

impl WorkQueue {
    fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                entries: VecDeque::new(),
                paused: false,
                terminate: false,
            }),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

struct Shared {
    chunks: Mutex<HashMap<ChunkCoord, Arc<Chunk>>>,
    queue: WorkQueue,
    pool: ChunkPool,
    store: ChunkStore,
    registry: Arc<BlockRegistry>,
    generator: Arc<dyn WorldGen>,
    atlas: AtlasLayout,
    cfg: StreamingConfig,
    /// Last viewer position seen by `update_queue`; workers drop queued
    /// entries that have drifted beyond unload range of it.
    viewer: Mutex<Vec2>,
    inflight: AtomicUsize,
    workers_live: AtomicUsize,
}

impl Shared {
    fn lock_map(&self) -> MutexGuard<'_, HashMap<ChunkCoord, Arc<Chunk>>> {
        match self.chunks.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lookup(&self, coord: ChunkCoord) -> Option<Arc<Chunk>> {
        self.lock_map().get(&coord).cloned()
    }

    fn viewer_xz(&self) -> Vec2 {
        match self.viewer.lock() {
            Ok(g) => *g,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_viewer_xz(&self, pos: Vec2) {
        match self.viewer.lock() {
            Ok(mut g) => *g = pos,
            Err(poisoned) => *poisoned.into_inner() = pos,
        }
    }
}

/// Owns the loaded-chunk map and the background workers that populate, light
/// and mesh chunks as the viewer moves. One instance per world; the render
/// pass and the streaming updates are driven from the thread that owns it,
/// workers only ever touch CPU-side chunk data.
pub struct ChunkManager {
    shared: Arc<Shared>,
    _workers: Option<Arc<ThreadPool>>,
    shut_down: bool,
}

impl ChunkManager {
    pub fn new(
        registry: Arc<BlockRegistry>,
        generator: Arc<dyn WorldGen>,
        store: ChunkStore,
        cfg: StreamingConfig,
    ) -> Self {
        let worker_count = cfg.workers.max(1);
        let shared = Arc::new(Shared {
            chunks: Mutex::new(HashMap::new()),
            queue: WorkQueue::new(),
            pool: ChunkPool::new(),
            store,
            registry,
            generator,
            atlas: AtlasLayout::default(),
            cfg,
            viewer: Mutex::new(Vec2::ZERO),
            inflight: AtomicUsize::new(0),
            workers_live: AtomicUsize::new(worker_count),
        });

        let workers = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(worker_count)
                .thread_name(|i| format!("lode-worker-{i}"))
                .build()
                .expect("worker pool"),
        );
        for _ in 0..worker_count {
            let shared = Arc::clone(&shared);
            workers.spawn(move || worker_loop(shared));
        }

        Self {
            shared,
            _workers: Some(workers),
            shut_down: false,
        }
    }

    /// Ensures every chunk within `load_distance` of the viewer is loaded or
    /// queued, then re-sorts the queue so the nearest pending chunks are
    /// processed first. Call from the owning thread as the viewer moves.
    pub fn update_queue(&self, viewer_pos: Vec3) {
        let center = ChunkCoord::of_world(viewer_pos.x.floor() as i32, viewer_pos.z.floor() as i32);
        let viewer_xz = viewer_pos.xz();
        self.shared.set_viewer_xz(viewer_xz);
        let load = self.shared.cfg.load_distance;
        let limit = (load * CHUNK_SX as i32) as f32;

        for i in -load..=load {
            for j in -load..=load {
                let coord = center.offset(i, j);
                if coord.distance_to(viewer_xz) >= limit {
                    continue;
                }
                if self.shared.lock_map().contains_key(&coord) {
                    continue;
                }
                let chunk = self.shared.pool.acquire(coord);
                let epoch = chunk.epoch();
                self.shared
                    .lock_map()
                    .insert(coord, Arc::clone(&chunk));
                {
                    let mut q = self.shared.queue.lock();
                    q.entries.push_front(QueueEntry {
                        coord,
                        chunk,
                        epoch,
                    });
                }
                self.shared.queue.cond.notify_one();
            }
        }

        let mut q = self.shared.queue.lock();
        q.entries
            .make_contiguous()
            .sort_by(|a, b| {
                a.coord
                    .distance_to(viewer_xz)
                    .total_cmp(&b.coord.distance_to(viewer_xz))
            });
        drop(q);
        self.shared.queue.cond.notify_all();
    }

    /// Evicts chunks beyond `unload_distance`, saving dirty ones first. A
    /// chunk a worker is busy with fails its try-lock and is retried on a
    /// later pass; eviction never blocks on in-flight generation.
    pub fn unload_useless_chunks(&self, viewer_pos: Vec3, renderer: &mut dyn ChunkRenderer) {
        let viewer_xz = viewer_pos.xz();
        let limit = (self.shared.cfg.unload_distance * CHUNK_SX as i32) as f32;

        let far: Vec<(ChunkCoord, Arc<Chunk>)> = self
            .shared
            .lock_map()
            .iter()
            .filter(|(coord, _)| coord.distance_to(viewer_xz) >= limit)
            .map(|(c, chunk)| (*c, Arc::clone(chunk)))
            .collect();

        for (coord, chunk) in far {
            let Some(mut inner) = chunk.try_lock() else {
                continue;
            };
            if inner.coord != coord {
                continue;
            }
            if inner.dirty {
                match self.shared.store.save(coord, &inner.grid) {
                    Ok(()) => inner.dirty = false,
                    Err(e) => {
                        log::error!("failed to save chunk ({}, {}): {e}", coord.cx, coord.cz);
                    }
                }
            }
            if let Some(handle) = inner.gpu.take() {
                renderer.discard(handle);
            }
            drop(inner);
            self.shared.lock_map().remove(&coord);
            self.shared.pool.release(chunk);
        }
    }

    /// Drops everything: pending queue entries and every loaded chunk whose
    /// lock can be taken. Dirty chunks are saved on the way out. Chunks mid
    /// generation survive until the next unload pass.
    pub fn reload_chunks(&self, renderer: &mut dyn ChunkRenderer) {
        {
            let mut q = self.shared.queue.lock();
            q.paused = true;
            q.entries.clear();
        }

        let all: Vec<(ChunkCoord, Arc<Chunk>)> = self
            .shared
            .lock_map()
            .iter()
            .map(|(c, chunk)| (*c, Arc::clone(chunk)))
            .collect();
        for (coord, chunk) in all {
            let Some(mut inner) = chunk.try_lock() else {
                continue;
            };
            if inner.dirty {
                if let Err(e) = self.shared.store.save(coord, &inner.grid) {
                    log::error!("failed to save chunk ({}, {}): {e}", coord.cx, coord.cz);
                }
            }
            if let Some(handle) = inner.gpu.take() {
                renderer.discard(handle);
            }
            drop(inner);
            self.shared.lock_map().remove(&coord);
            self.shared.pool.release(chunk);
        }

        {
            let mut q = self.shared.queue.lock();
            q.paused = false;
        }
        self.shared.queue.cond.notify_all();
        log::info!("cleared all chunks");
    }

    /// Block at a world position; air when the position is outside loaded
    /// storage in any direction.
    pub fn get_block(&self, wx: i32, wy: i32, wz: i32) -> BlockId {
        let (coord, (lx, ly, lz)) = split_world(wx, wy, wz);
        let Some(chunk) = self.shared.lookup(coord) else {
            return AIR;
        };
        if chunk.state().load() < ChunkState::BlockDataReady {
            return AIR;
        }
        let inner = chunk.lock();
        if inner.coord != coord {
            return AIR;
        }
        inner.grid.block(lx, ly, lz)
    }

    /// Packed light byte at a world position. Anything unloaded or out of
    /// range reads as the fully-lit sentinel so meshing against missing
    /// neighbors never darkens a seam.
    pub fn get_light_value(&self, wx: i32, wy: i32, wz: i32) -> u8 {
        if wy >= CHUNK_SY as i32 {
            return LIGHT_UNKNOWN;
        }
        let (coord, (lx, ly, lz)) = split_world(wx, wy, wz);
        let Some(chunk) = self.shared.lookup(coord) else {
            return LIGHT_UNKNOWN;
        };
        if chunk.state().load() < ChunkState::BlockDataReady {
            return LIGHT_UNKNOWN;
        }
        let inner = chunk.lock();
        if inner.coord != coord {
            return LIGHT_UNKNOWN;
        }
        inner.grid.light(lx, ly, lz)
    }

    /// Writes one block and demotes the owning chunk for relight/remesh.
    /// With `rebuild`, a write on a chunk boundary also demotes the facing
    /// neighbor so its culled faces are rebuilt.
    pub fn set_block(&self, wx: i32, wy: i32, wz: i32, id: BlockId, rebuild: bool) {
        let (coord, (lx, ly, lz)) = split_world(wx, wy, wz);
        let Some(chunk) = self.shared.lookup(coord) else {
            return;
        };
        {
            let mut inner = chunk.lock();
            if inner.coord != coord || !inner.grid.set_block(lx, ly, lz, id) {
                return;
            }
            inner.dirty = true;
        }
        chunk.state().demote_to(ChunkState::BlockDataReady);

        if rebuild {
            if lx == 0 {
                self.regenerate_chunk_mesh(coord.offset(-1, 0));
            }
            if lx == CHUNK_SX as i32 - 1 {
                self.regenerate_chunk_mesh(coord.offset(1, 0));
            }
            if lz == 0 {
                self.regenerate_chunk_mesh(coord.offset(0, -1));
            }
            if lz == CHUNK_SZ as i32 - 1 {
                self.regenerate_chunk_mesh(coord.offset(0, 1));
            }
        }
    }

    /// Forces a loaded chunk back through lighting and meshing.
    pub fn regenerate_chunk_mesh(&self, coord: ChunkCoord) {
        if let Some(chunk) = self.shared.lookup(coord) {
            chunk.state().demote_to(ChunkState::BlockDataReady);
        }
    }

    /// Walks the voxel grid from `origin` along `direction` until a solid
    /// block or the step budget. See [`raycast::raycast`] for the stepping
    /// rule.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_steps: u32) -> Option<RayHit> {
        raycast::raycast(
            |x, y, z| self.get_block(x, y, z),
            origin,
            direction,
            max_steps,
        )
    }

    /// Per-frame pass on the owning thread: finishes demoted chunks, uploads
    /// freshly built meshes, then draws every GPU-ready chunk that passes
    /// the distance and field-of-view test.
    pub fn render_all(&self, renderer: &mut dyn ChunkRenderer, camera: &Camera) {
        let cam_dir = camera.facing_xz();
        let snapshot: Vec<(ChunkCoord, Arc<Chunk>)> = self
            .shared
            .lock_map()
            .iter()
            .map(|(c, chunk)| (*c, Arc::clone(chunk)))
            .collect();

        for (coord, chunk) in snapshot {
            let state = chunk.state().load();
            if state >= ChunkState::BlockDataReady && state < ChunkState::GpuReady {
                if let Some(mut inner) = chunk.try_lock() {
                    if inner.coord == coord {
                        run_light_stage(&chunk, &mut inner);
                        run_mesh_stage(&self.shared, &chunk, &mut inner);
                        if chunk.state().load() == ChunkState::MeshBuilt {
                            if let Some(old) = inner.gpu.take() {
                                renderer.discard(old);
                            }
                            let handle = renderer.upload(&inner.mesh);
                            inner.mesh.clear_keep_capacity();
                            inner.gpu = Some(handle);
                            // A demotion during the upload wins; the handle
                            // stays usable and is replaced on the rebuild.
                            chunk
                                .state()
                                .advance(ChunkState::MeshBuilt, ChunkState::GpuReady);
                        }
                    }
                }
            }

            if chunk.state().load() != ChunkState::GpuReady {
                continue;
            }
            if !self.in_frustum(coord, camera, cam_dir) {
                continue;
            }
            if let Some(inner) = chunk.try_lock()
                && inner.coord == coord
                && let Some(handle) = inner.gpu
            {
                let (bx, bz) = coord.base();
                renderer.draw(handle, Vec3::new(bx as f32, 0.0, bz as f32));
            }
        }
    }

    /// Saves every dirty chunk whose lock is free.
    pub fn save_chunks(&self) {
        let all: Vec<(ChunkCoord, Arc<Chunk>)> = self
            .shared
            .lock_map()
            .iter()
            .map(|(c, chunk)| (*c, Arc::clone(chunk)))
            .collect();
        for (coord, chunk) in all {
            let Some(mut inner) = chunk.try_lock() else {
                continue;
            };
            if inner.coord != coord || !inner.dirty {
                continue;
            }
            match self.shared.store.save(coord, &inner.grid) {
                Ok(()) => inner.dirty = false,
                Err(e) => log::error!("failed to save chunk ({}, {}): {e}", coord.cx, coord.cz),
            }
        }
    }

    /// Stops the workers, waits for in-flight work to finish, then performs
    /// a final synchronous save of every dirty chunk and hands every live
    /// mesh handle back to the renderer. Idempotent.
    pub fn shutdown(&mut self, renderer: &mut dyn ChunkRenderer) {
        self.shutdown_impl(Some(renderer));
    }

    fn shutdown_impl(&mut self, mut renderer: Option<&mut dyn ChunkRenderer>) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        {
            let mut q = self.shared.queue.lock();
            q.terminate = true;
            q.entries.clear();
        }
        self.shared.queue.cond.notify_all();
        while self.shared.workers_live.load(Ordering::Acquire) > 0 {
            thread::sleep(Duration::from_millis(1));
        }

        // Workers are gone; every lock is free now.
        let all: Vec<(ChunkCoord, Arc<Chunk>)> = self
            .shared
            .lock_map()
            .drain()
            .collect();
        for (coord, chunk) in all {
            let mut inner = chunk.lock();
            if inner.dirty {
                if let Err(e) = self.shared.store.save(coord, &inner.grid) {
                    log::error!("failed to save chunk ({}, {}): {e}", coord.cx, coord.cz);
                }
            }
            if let Some(handle) = inner.gpu.take()
                && let Some(r) = renderer.as_deref_mut()
            {
                r.discard(handle);
            }
            drop(inner);
            self.shared.pool.release(chunk);
        }
        self._workers = None;
    }

    pub fn loaded_chunk_count(&self) -> usize {
        self.shared.lock_map().len()
    }

    pub fn queued_count(&self) -> usize {
        self.shared.queue.lock().entries.len()
    }

    pub fn inflight_count(&self) -> usize {
        self.shared.inflight.load(Ordering::Acquire)
    }

    fn in_frustum(&self, coord: ChunkCoord, camera: &Camera, cam_dir: Vec2) -> bool {
        let viewer_xz = camera.position.xz();
        if coord.distance_to(viewer_xz)
            >= (self.shared.cfg.view_distance * CHUNK_SX as i32) as f32
        {
            return false;
        }
        // Push the reference point one chunk diagonal ahead so chunks the
        // viewer stands in or right next to never fail the angle test.
        let front = coord.center() + cam_dir * (CHUNK_SX as f32 * std::f32::consts::SQRT_2);
        let to_chunk = front - viewer_xz;
        cam_dir.signed_angle(to_chunk).abs() < camera.fov / 2.0
    }
}

impl Drop for ChunkManager {
    fn drop(&mut self) {
        // No renderer here; an explicit shutdown call is the path that
        // returns GPU handles.
        self.shutdown_impl(None);
    }
}

fn worker_loop(shared: Arc<Shared>) {
    let drop_limit = (shared.cfg.unload_distance * CHUNK_SX as i32) as f32;
    loop {
        let entry = {
            let mut q = shared.queue.lock();
            'pop: loop {
                if q.terminate {
                    drop(q);
                    shared.workers_live.fetch_sub(1, Ordering::AcqRel);
                    return;
                }
                if !q.paused {
                    // Entries the viewer has moved away from are discarded
                    // unprocessed; the eviction pass removes their chunks.
                    let viewer = shared.viewer_xz();
                    while let Some(entry) = q.entries.pop_front() {
                        if entry.coord.distance_to(viewer) < drop_limit {
                            break 'pop entry;
                        }
                    }
                }
                q = match shared.queue.cond.wait(q) {
                    Ok(g) => g,
                    Err(poisoned) => poisoned.into_inner(),
                };
            }
        };

        shared.inflight.fetch_add(1, Ordering::AcqRel);
        process_entry(&shared, entry);
        shared.inflight.fetch_sub(1, Ordering::AcqRel);
    }
}

fn process_entry(shared: &Shared, entry: QueueEntry) {
    // The chunk may have been evicted and recycled since it was queued.
    if entry.epoch != entry.chunk.epoch() {
        return;
    }
    let still_wanted = shared
        .lock_map()
        .get(&entry.coord)
        .is_some_and(|c| Arc::ptr_eq(c, &entry.chunk));
    if !still_wanted {
        return;
    }

    let chunk = entry.chunk;
    let mut inner = chunk.lock();
    if entry.epoch != chunk.epoch() || inner.coord != entry.coord {
        return;
    }

    if chunk.state().load() < ChunkState::BlockDataReady {
        let loaded = match shared.store.load(entry.coord, &mut inner.grid) {
            Ok(found) => found,
            Err(e) => {
                log::warn!(
                    "failed to read chunk ({}, {}): {e}; regenerating",
                    entry.coord.cx,
                    entry.coord.cz
                );
                false
            }
        };
        if !loaded {
            populate_chunk(shared.generator.as_ref(), entry.coord, &mut inner.grid);
        }
        chunk.state().store(ChunkState::BlockDataReady);

        // Freshly populated terrain can seal faces the neighbors drew
        // against open air; send them back through meshing.
        for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            if let Some(neighbor) = shared.lookup(entry.coord.offset(dx, dz)) {
                neighbor.state().demote_to(ChunkState::BlockDataReady);
            }
        }
    }

    run_light_stage(&chunk, &mut inner);
    run_mesh_stage(shared, &chunk, &mut inner);
}

fn run_light_stage(chunk: &Chunk, inner: &mut ChunkInner) {
    if chunk.state().load() == ChunkState::BlockDataReady {
        relight(&mut inner.grid);
        // Demotions arrive without the chunk lock, so completion must not
        // blindly overwrite one; a failed advance leaves the chunk demoted
        // and the stage re-runs on a later pass.
        chunk
            .state()
            .advance(ChunkState::BlockDataReady, ChunkState::LightReady);
    }
}

fn run_mesh_stage(shared: &Shared, chunk: &Chunk, inner: &mut ChunkInner) {
    if chunk.state().load() != ChunkState::LightReady {
        return;
    }
    let neighbors = capture_neighbors(shared, inner.coord);
    if build_chunk_mesh(
        &inner.grid,
        &shared.registry,
        &neighbors,
        shared.atlas,
        chunk.state().load(),
        &mut inner.mesh,
    ) {
        // A neighbor populated mid-build demotes this chunk to force a
        // remesh against its terrain; the stale mesh must not revive the
        // state past that demotion.
        chunk
            .state()
            .advance(ChunkState::LightReady, ChunkState::MeshBuilt);
    }
}

/// Captures the facing boundary planes of the four horizontal neighbors.
/// Only try-locks are used; a busy or unpopulated neighbor is simply left
/// out of the snapshot and treated as open air.
fn capture_neighbors(shared: &Shared, coord: ChunkCoord) -> NeighborSnapshot {
    let mut snap = NeighborSnapshot::default();
    let plane = |dx: i32, dz: i32| -> Option<BoundaryPlane> {
        let neighbor = shared.lookup(coord.offset(dx, dz))?;
        if neighbor.state().load() < ChunkState::BlockDataReady {
            return None;
        }
        let inner = neighbor.try_lock()?;
        if inner.coord != coord.offset(dx, dz) {
            return None;
        }
        Some(match (dx, dz) {
            (1, 0) => BoundaryPlane::from_x_plane(&inner.grid, 0),
            (-1, 0) => BoundaryPlane::from_x_plane(&inner.grid, CHUNK_SX as i32 - 1),
            (0, 1) => BoundaryPlane::from_z_plane(&inner.grid, 0),
            _ => BoundaryPlane::from_z_plane(&inner.grid, CHUNK_SZ as i32 - 1),
        })
    };
    snap.pos_x = plane(1, 0);
    snap.neg_x = plane(-1, 0);
    snap.pos_z = plane(0, 1);
    snap.neg_z = plane(0, -1);
    snap
}
