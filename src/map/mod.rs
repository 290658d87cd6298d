//! Map data and orchestration
//!
//! The sparse tile grid, its save format, and the texture map that ties
//! tiles, textures and the section cache together.

pub mod grid;
pub mod persist;
pub mod texture_map;

pub use grid::{TileCoord, TileEntry, TileGrid, TileSource};
pub use persist::{convert_legacy_data, decode_grid, encode_grid, MapFile};
pub use texture_map::TextureMap;
