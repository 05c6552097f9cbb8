use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{AIR, BlockId, Face};

/// The description of a single block type: one atlas tile index per cube face.
/// Immutable once the registry is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockDef {
    pub name: String,
    pub tiles: [u16; 6],
}

impl BlockDef {
    #[inline]
    pub fn tile(&self, face: Face) -> u16 {
        self.tiles[face.index()]
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlocksConfig {
    #[serde(default)]
    pub blocks: Vec<BlockDefCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockDefCfg {
    pub name: String,
    /// Single tile used for every face unless overridden below.
    #[serde(default)]
    pub tile: Option<u16>,
    #[serde(default)]
    pub up: Option<u16>,
    #[serde(default)]
    pub down: Option<u16>,
    #[serde(default)]
    pub east: Option<u16>,
    #[serde(default)]
    pub west: Option<u16>,
    #[serde(default)]
    pub south: Option<u16>,
    #[serde(default)]
    pub north: Option<u16>,
}

/// Table mapping a block id to its per-face atlas tiles. Id `0` is always the
/// air entry, and any id past the end of the table resolves to air as well so
/// that corrupt voxel data can never index out of range.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    blocks: Vec<BlockDef>,
    by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            blocks: Vec::new(),
            by_name: HashMap::new(),
        };
        reg.push(BlockDef {
            name: "air".to_string(),
            tiles: [0; 6],
        });
        reg
    }

    fn push(&mut self, def: BlockDef) -> BlockId {
        let id = self.blocks.len() as BlockId;
        self.by_name.insert(def.name.clone(), id);
        self.blocks.push(def);
        id
    }

    /// Looks up a block description, falling back to air for unknown ids.
    #[inline]
    pub fn get(&self, id: BlockId) -> &BlockDef {
        self.blocks.get(id as usize).unwrap_or(&self.blocks[0])
    }

    #[inline]
    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        // Never true: the air entry is always present.
        self.blocks.is_empty()
    }

    #[inline]
    pub fn is_solid(&self, id: BlockId) -> bool {
        id != AIR && (id as usize) < self.blocks.len()
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        let cfg: BlocksConfig = toml::from_str(&text)?;
        Ok(Self::from_config(cfg))
    }

    pub fn from_config(cfg: BlocksConfig) -> Self {
        let mut reg = Self::new();
        for def in cfg.blocks {
            let base = def.tile.unwrap_or(0);
            let mut tiles = [base; 6];
            for (face, tile) in [
                (Face::PosY, def.up),
                (Face::NegY, def.down),
                (Face::PosX, def.east),
                (Face::NegX, def.west),
                (Face::PosZ, def.south),
                (Face::NegZ, def.north),
            ] {
                if let Some(t) = tile {
                    tiles[face.index()] = t;
                }
            }
            reg.push(BlockDef {
                name: def.name,
                tiles,
            });
        }
        reg
    }

    /// Built-in palette matching the default terrain generator layers.
    pub fn default_palette() -> Self {
        let mut reg = Self::new();
        reg.push(BlockDef {
            name: "stone".to_string(),
            tiles: [1; 6],
        });
        reg.push(BlockDef {
            name: "dirt".to_string(),
            tiles: [2; 6],
        });
        reg.push(BlockDef {
            name: "grass".to_string(),
            // Grass top, dirt bottom, grass-side skirt.
            tiles: [0, 2, 3, 3, 3, 3],
        });
        reg
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
