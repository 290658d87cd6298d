//! Rendering layer
//!
//! Turns a sparse tile grid into pixels:
//! - Projection: orthogonal or isometric tile placement
//! - Section cache: pre-rendered blocks of tiles, rebuilt when stale
//! - Compositor: culled blit of cached sections, or direct tile drawing

pub mod compositor;
pub mod projection;
pub mod registry;
pub mod section;
pub mod surface;
pub mod texture;
pub mod tile;

pub use compositor::{section_visible, Camera, Compositor, FrameStats, RenderContext};
pub use projection::{
    section_of, section_origin, MountMode, MountProjector, NeighborOffset, Point, SectionKey, TileEntity, TileSize,
};
pub use registry::TextureRegistry;
pub use section::{RebuildOutcome, RebuildStats, SectionCache};
pub use surface::{Surface, SECTION_BOUNDS_COLOR};
pub use texture::{SheetTexture, SolidShape, SolidTexture, Texture, TextureDescriptor, TextureFactory};
pub use tile::{ClipRect, TileRenderer};
