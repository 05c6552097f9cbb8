use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lode_blocks::BlockRegistry;
use lode_geom::Vec3;
use lode_manager::{Camera, ChunkManager, ChunkRenderer, ChunkStore, MeshHandle};
use lode_mesh::MeshBuild;
use lode_world::NoiseWorldGen;

use crate::config::RuntimeConfig;

/// Stand-in renderer for running the engine without a GPU: accounts for
/// uploads, draws and discards so the streaming behavior stays observable.
#[derive(Default)]
pub struct HeadlessRenderer {
    next_handle: u64,
    pub uploads: u64,
    pub draws: u64,
    pub discards: u64,
    pub live_meshes: i64,
}

impl ChunkRenderer for HeadlessRenderer {
    fn upload(&mut self, mesh: &MeshBuild) -> MeshHandle {
        self.next_handle += 1;
        self.uploads += 1;
        self.live_meshes += 1;
        log::trace!(
            "upload #{}: {} vertices",
            self.next_handle,
            mesh.vertex_count()
        );
        MeshHandle(self.next_handle)
    }

    fn draw(&mut self, _handle: MeshHandle, _origin: Vec3) {
        self.draws += 1;
    }

    fn discard(&mut self, _handle: MeshHandle) {
        self.discards += 1;
        self.live_meshes -= 1;
    }
}

/// Drives the engine for a fixed number of ticks: a viewer walks a straight
/// line, chunks stream in and out around it, and a couple of scripted edits
/// exercise the modify/save path.
pub fn run(cfg: RuntimeConfig, ticks: u64) -> Result<(), Box<dyn Error>> {
    let registry = match &cfg.blocks {
        Some(path) => Arc::new(BlockRegistry::load_from_path(path)?),
        None => Arc::new(BlockRegistry::default_palette()),
    };
    let generator = Arc::new(NoiseWorldGen::new(cfg.world));
    let mut manager = ChunkManager::new(
        registry,
        generator,
        ChunkStore::new(&cfg.save_dir),
        cfg.streaming,
    );
    let mut renderer = HeadlessRenderer::default();

    log::info!(
        "streaming world seed {} into {} for {ticks} ticks",
        cfg.world.seed,
        cfg.save_dir.display()
    );

    for tick in 0..ticks {
        // Steady walk along +X, drifting slightly in z.
        let pos = Vec3::new(tick as f32 * 0.9, 40.0, (tick as f32 * 0.13).sin() * 24.0);
        let camera = Camera {
            position: pos,
            target: pos + Vec3::new(1.0, -0.3, 0.0),
            fov: std::f32::consts::FRAC_PI_2,
        };

        manager.update_queue(pos);
        manager.unload_useless_chunks(pos, &mut renderer);
        manager.render_all(&mut renderer, &camera);

        // Dig out whatever the viewer is looking at, now and then.
        if tick % 97 == 96
            && let Some(hit) = manager.raycast(pos, Vec3::new(0.6, -1.0, 0.0).normalized(), 128)
        {
            let (bx, by, bz) = hit.block;
            manager.set_block(bx, by, bz, 0, true);
            log::debug!("dug block at ({bx}, {by}, {bz})");
        }

        if tick % 120 == 0 {
            log::info!(
                "tick {tick}: {} chunks loaded, {} queued, {} in flight, {} live meshes",
                manager.loaded_chunk_count(),
                manager.queued_count(),
                manager.inflight_count(),
                renderer.live_meshes
            );
        }

        thread::sleep(Duration::from_millis(5));
    }

    manager.shutdown(&mut renderer);
    log::info!(
        "done: {} uploads, {} draws, {} discards",
        renderer.uploads,
        renderer.draws,
        renderer.discards
    );
    Ok(())
}
