use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use lode_manager::StreamingConfig;
use lode_world::WorldGenConfig;

/// Top-level runtime configuration, loadable from a TOML file. Every field
/// has a default so an empty (or absent) file runs the stock world.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub world: WorldGenConfig,
    pub streaming: StreamingConfig,
    /// Directory the chunk save files live in.
    pub save_dir: PathBuf,
    /// Optional block palette TOML; the built-in palette is used otherwise.
    pub blocks: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            world: WorldGenConfig::default(),
            streaming: StreamingConfig::default(),
            save_dir: PathBuf::from("map_data"),
            blocks: None,
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
