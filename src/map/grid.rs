//! Sparse tile grid
//!
//! Stores which texture and cell is painted at each integer tile
//! coordinate. Only painted coordinates take up space.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Integer tile coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// What is painted on one tile. Serialized as `[textureIndex, cell]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, u32)", into = "(usize, u32)")]
pub struct TileEntry {
    pub texture_index: usize,
    /// Sub-region of the texture, always >= 1
    pub cell: u32,
}

impl TileEntry {
    pub fn new(texture_index: usize, cell: u32) -> Self {
        Self {
            texture_index,
            cell: cell.max(1),
        }
    }
}

impl From<(usize, u32)> for TileEntry {
    fn from((texture_index, cell): (usize, u32)) -> Self {
        Self::new(texture_index, cell)
    }
}

impl From<TileEntry> for (usize, u32) {
    fn from(entry: TileEntry) -> Self {
        (entry.texture_index, entry.cell)
    }
}

/// Read/write access to tile data as the renderer needs it
pub trait TileSource {
    fn tile(&self, x: i32, y: i32) -> Option<TileEntry>;

    fn set_tile(&mut self, x: i32, y: i32, entry: TileEntry);

    /// Remove a tile, returning what was there
    fn clear_tile(&mut self, x: i32, y: i32) -> Option<TileEntry>;

    /// Every painted tile, in no particular order
    fn tiles(&self) -> Box<dyn Iterator<Item = (TileCoord, TileEntry)> + '_>;
}

/// Hash-backed sparse grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileGrid {
    tiles: HashMap<TileCoord, TileEntry>,
}

impl TileGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.tiles.contains_key(&TileCoord::new(x, y))
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut TileEntry> {
        self.tiles.get_mut(&TileCoord::new(x, y))
    }

    /// Remove every coordinate that is also painted in `other`.
    /// Returns how many tiles were removed.
    pub fn remove_overlap(&mut self, other: &TileGrid) -> usize {
        let before = self.tiles.len();
        self.tiles.retain(|coord, _| !other.tiles.contains_key(coord));
        before - self.tiles.len()
    }

    /// Smallest and largest painted coordinates, or `None` when empty
    pub fn bounds(&self) -> Option<(TileCoord, TileCoord)> {
        let mut coords = self.tiles.keys();
        let first = *coords.next()?;
        let (min, max) = coords.fold((first, first), |(min, max), c| {
            (
                TileCoord::new(min.x.min(c.x), min.y.min(c.y)),
                TileCoord::new(max.x.max(c.x), max.y.max(c.y)),
            )
        });
        Some((min, max))
    }
}

impl TileSource for TileGrid {
    fn tile(&self, x: i32, y: i32) -> Option<TileEntry> {
        self.tiles.get(&TileCoord::new(x, y)).copied()
    }

    fn set_tile(&mut self, x: i32, y: i32, entry: TileEntry) {
        self.tiles.insert(TileCoord::new(x, y), entry);
    }

    fn clear_tile(&mut self, x: i32, y: i32) -> Option<TileEntry> {
        self.tiles.remove(&TileCoord::new(x, y))
    }

    fn tiles(&self) -> Box<dyn Iterator<Item = (TileCoord, TileEntry)> + '_> {
        Box::new(self.tiles.iter().map(|(coord, entry)| (*coord, *entry)))
    }
}
