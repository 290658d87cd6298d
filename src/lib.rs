//! Texmap - sectioned texture map rendering
//!
//! Paints sparse grids of textured tiles in orthogonal or isometric
//! projection, caching static geometry in pre-rendered sections that are
//! culled and blitted onto the frame each tick.

pub mod config;
pub mod error;
pub mod map;
pub mod render;

// Re-export commonly used types
pub use config::MapConfig;
pub use error::{MapError, Result};
pub use map::{TextureMap, TileCoord, TileEntry, TileGrid, TileSource};
pub use render::{Camera, FrameStats, MountMode, Point, RenderContext, Surface, Texture, TextureDescriptor};
