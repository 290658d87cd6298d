//! Frame composition
//!
//! Each tick the compositor rebuilds the section cache if it went stale,
//! then blits every on-screen section onto the frame. With sectioning
//! turned off it draws each visible tile straight onto the frame instead.

use super::projection::{MountProjector, Point, SectionKey};
use super::registry::TextureRegistry;
use super::section::{RebuildOutcome, SectionCache};
use super::surface::{Surface, SECTION_BOUNDS_COLOR};
use super::tile::{ClipRect, TileRenderer};
use crate::map::TileSource;

/// Viewpoint into the world
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera {
    /// World position the viewport is centred on
    pub translate: Point,
}

impl Camera {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            translate: Point::new(x, y),
        }
    }
}

/// Everything the renderer needs to know about the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub camera: Camera,
    /// Half the viewport width and height
    pub half_extents: Point,
    /// Smoothing preference for newly allocated sections
    pub smoothing: bool,
    /// Seconds since the previous tick
    pub delta: f32,
}

impl RenderContext {
    pub fn new(camera: Camera, half_width: f32, half_height: f32) -> Self {
        Self {
            camera,
            half_extents: Point::new(half_width, half_height),
            smoothing: false,
            delta: 0.0,
        }
    }

    /// Context for a viewport the size of `frame`
    pub fn for_frame(frame: &Surface, camera: Camera) -> Self {
        Self {
            smoothing: frame.smoothing(),
            ..Self::new(camera, frame.width() as f32 / 2.0, frame.height() as f32 / 2.0)
        }
    }

    pub fn with_delta(self, delta: f32) -> Self {
        Self { delta, ..self }
    }

    /// Frame pixel where map-local (0, 0) lands for a map translated by `origin`
    pub fn frame_origin(&self, origin: Point) -> Point {
        self.half_extents + origin - self.camera.translate
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// A full section rebuild happened this tick
    pub rebuilt: bool,
    pub sections_drawn: usize,
    pub sections_culled: usize,
    /// Individual tile draws, into sections or straight onto the frame
    pub tiles_drawn: usize,
}

/// True when a section at `key` overlaps the viewport
pub fn section_visible(
    key: SectionKey,
    section_size: (u32, u32),
    projector: &dyn MountProjector,
    origin: Point,
    ctx: &RenderContext,
) -> bool {
    let tile = projector.tile_size();
    let (sw, sh) = (section_size.0 as f32, section_size.1 as f32);
    let render = Point::new(key.x as f32 * sw, key.y as f32 * sh);
    let abs = origin + render - ctx.camera.translate + projector.composite_correction();
    let Point { x: hx, y: hy } = ctx.half_extents;

    abs.x + sw + tile.height / 2.0 >= -hx
        && abs.x - tile.width / 2.0 <= hx
        && abs.y + sh + tile.height / 2.0 >= -hy
        && abs.y <= hy
}

/// Draws the map onto the frame
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    /// Outline every drawn section
    pub draw_section_bounds: bool,
}

impl Compositor {
    pub fn new(draw_section_bounds: bool) -> Self {
        Self { draw_section_bounds }
    }

    /// Rebuild the cache when `dirty` is set. The flag is only cleared by a
    /// completed rebuild, so a deferred one is retried next tick.
    pub fn rebuild_if_dirty<S: TileSource + ?Sized>(
        &self,
        dirty: &mut bool,
        cache: &mut SectionCache,
        tiles: &S,
        textures: &mut TextureRegistry,
        renderer: &TileRenderer,
        ctx: &RenderContext,
    ) -> Option<RebuildOutcome> {
        if !*dirty {
            return None;
        }

        let outcome = cache.rebuild_all(tiles, textures, renderer, ctx);
        if outcome.is_rebuilt() {
            *dirty = false;
        }
        Some(outcome)
    }

    /// Blit every visible section. Returns `(drawn, culled)`.
    pub fn draw_sections(
        &self,
        frame: &mut Surface,
        cache: &SectionCache,
        projector: &dyn MountProjector,
        origin: Point,
        ctx: &RenderContext,
    ) -> (usize, usize) {
        let (sw, sh) = cache.section_size();
        let base = ctx.frame_origin(origin) + projector.composite_correction();
        let mut drawn = 0;
        let mut culled = 0;

        for (key, section) in cache.iter() {
            if !section_visible(key, (sw, sh), projector, origin, ctx) {
                culled += 1;
                continue;
            }

            let x = key.x as f32 * sw as f32;
            let y = key.y as f32 * sh as f32;
            frame.with_translation(base.x, base.y, |f| {
                f.draw_image(section.image(), x, y, sw as f32, sh as f32);
                if self.draw_section_bounds {
                    f.stroke_rect(x, y, sw as f32, sh as f32, SECTION_BOUNDS_COLOR);
                }
            });
            drawn += 1;
        }

        log::trace!("Composited {} sections, culled {}", drawn, culled);
        (drawn, culled)
    }

    /// Draw tiles straight onto the frame, skipping those whose anchor lies
    /// more than a tile outside the viewport. Returns tiles drawn.
    pub fn draw_direct<S: TileSource + ?Sized>(
        &self,
        frame: &mut Surface,
        tiles: &S,
        textures: &TextureRegistry,
        renderer: &TileRenderer,
        origin: Point,
        ctx: &RenderContext,
    ) -> usize {
        let projector = renderer.projector();
        let tile = projector.tile_size();
        let Point { x: hx, y: hy } = ctx.half_extents;

        // Visible area in map-local pixels, grown by a tile on every side
        let view = ctx.camera.translate - origin;
        let clip = ClipRect::new(
            view.x - hx - tile.width,
            view.y - hy - tile.height,
            2.0 * (hx + tile.width),
            2.0 * (hy + tile.height),
        );

        // Same placement as a tile drawn into a half-tile translated section
        let base = ctx.frame_origin(origin)
            + Point::new(tile.width / 2.0, tile.height / 2.0)
            + projector.composite_correction();

        frame.with_translation(base.x, base.y, |f| {
            let mut drawn = 0;
            for (coord, entry) in tiles.tiles() {
                if textures.get(entry.texture_index).is_none() {
                    continue;
                }
                if !clip.contains(projector.project(coord.x, coord.y)) {
                    continue;
                }
                // Clipped above
                renderer.render_tile(f, coord.x, coord.y, entry, textures, ctx.delta, None, None);
                drawn += 1;
            }
            drawn
        })
    }
}
