use std::path::PathBuf;

use clap::Parser;

mod config;
mod sim;

use config::RuntimeConfig;

#[derive(Parser, Debug)]
#[command(name = "lode", about = "Streaming voxel terrain engine")]
struct Args {
    /// Runtime configuration file (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the world seed.
    #[arg(long)]
    seed: Option<i32>,

    /// Override the chunk save directory.
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Override the background worker count.
    #[arg(long)]
    workers: Option<usize>,

    /// How many simulation ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => match RuntimeConfig::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::error!("failed to load config {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => RuntimeConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.world.seed = seed;
    }
    if let Some(dir) = args.save_dir {
        cfg.save_dir = dir;
    }
    if let Some(workers) = args.workers {
        cfg.streaming.workers = workers;
    }

    if let Err(e) = sim::run(cfg, args.ticks) {
        log::error!("engine run failed: {e}");
        std::process::exit(1);
    }
}
