//! Single tile drawing
//!
//! Draws one tile's texture at its projected position and reports which
//! neighbouring sections the tile spills into.

use super::projection::{section_origin, MountProjector, NeighborOffset, Point, SectionKey, TileSize};
use super::registry::TextureRegistry;
use super::surface::Surface;
use crate::map::TileEntry;

/// Axis-aligned rectangle in map-local pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ClipRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Inclusive on every edge
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x <= self.x + self.width
            && point.y <= self.y + self.height
    }
}

/// Projects and draws individual tiles
pub struct TileRenderer {
    projector: Box<dyn MountProjector>,
    /// Tiles per section edge, when sectioning is enabled
    auto_section: Option<u32>,
}

impl TileRenderer {
    pub fn new(projector: Box<dyn MountProjector>, auto_section: Option<u32>) -> Self {
        Self { projector, auto_section }
    }

    pub fn projector(&self) -> &dyn MountProjector {
        self.projector.as_ref()
    }

    pub fn tile_size(&self) -> TileSize {
        self.projector.tile_size()
    }

    pub fn auto_section(&self) -> Option<u32> {
        self.auto_section
    }

    pub fn set_auto_section(&mut self, auto_section: Option<u32>) {
        self.auto_section = auto_section;
    }

    /// Draw the tile at `(x, y)` onto `surface`.
    ///
    /// With `section` set, the position is made local to that section and
    /// the returned offsets name every neighbouring section the tile's
    /// footprint crosses into. Returns `None` when nothing crosses, when the
    /// point lies outside `clip`, or when the texture index is unknown.
    #[allow(clippy::too_many_arguments)]
    pub fn render_tile(
        &self,
        surface: &mut Surface,
        x: i32,
        y: i32,
        entry: TileEntry,
        textures: &TextureRegistry,
        delta: f32,
        clip: Option<&ClipRect>,
        section: Option<SectionKey>,
    ) -> Option<Vec<NeighborOffset>> {
        let Some(texture) = textures.get(entry.texture_index) else {
            log::debug!(
                "Skipping tile {},{}: no texture at index {}",
                x,
                y,
                entry.texture_index
            );
            return None;
        };

        let tile = self.projector.tile_size();
        let mut pos = self.projector.project(x, y);
        if let (Some(key), Some(n)) = (section, self.auto_section) {
            pos = pos - section_origin(key, n, tile);
        }

        if let Some(rect) = clip {
            if !rect.contains(pos) {
                return None;
            }
        }

        let regions = self.crossed_edges(pos, surface.width() as f32, surface.height() as f32);

        let entity = self.projector.tile_entity(entry.cell);
        surface.with_translation(pos.x, pos.y, |s| texture.render(s, &entity, delta));

        if regions.is_empty() {
            None
        } else {
            Some(regions)
        }
    }

    /// Which edges of a `width` x `height` surface a tile anchored at `pos`
    /// spills over
    fn crossed_edges(&self, pos: Point, width: f32, height: f32) -> Vec<NeighborOffset> {
        let tile = self.projector.tile_size();
        let adjust = self.projector.horizontal_adjust();

        let dx = if pos.x - adjust < 0.0 {
            -1
        } else if pos.x + adjust > width - tile.width {
            1
        } else {
            0
        };

        let dy = if pos.y < 0.0 {
            -1
        } else if pos.y > height - tile.height {
            1
        } else {
            0
        };

        let mut regions = Vec::new();
        if dx != 0 {
            regions.push(NeighborOffset::new(dx, 0));
        }
        if dy != 0 {
            regions.push(NeighborOffset::new(0, dy));
        }
        if dx != 0 && dy != 0 {
            regions.push(NeighborOffset::new(dx, dy));
        }
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::projection::MountMode;
    use crate::render::registry::tests::ProbeTexture;
    use image::Rgba;

    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

    fn registry_with_probe() -> (TextureRegistry, std::rc::Rc<std::cell::Cell<usize>>) {
        let mut registry = TextureRegistry::new();
        let (texture, _, draws) = ProbeTexture::new(true, GREEN);
        registry.add(Box::new(texture));
        (registry, draws)
    }

    fn renderer(mode: MountMode, n: u32) -> TileRenderer {
        TileRenderer::new(mode.projector(TileSize::new(64, 32)), Some(n))
    }

    fn section_surface(n: u32) -> Surface {
        let mut surface = Surface::new(64 * n, 32 * n, false);
        surface.translate(32.0, 16.0);
        surface
    }

    #[test]
    fn test_orthogonal_tile_fits_its_section() {
        let (registry, draws) = registry_with_probe();
        let r = renderer(MountMode::Orthogonal, 10);
        let mut surface = section_surface(10);

        for (x, y) in [(0, 0), (9, 0), (0, 9), (9, 9)] {
            let regions = r.render_tile(&mut surface, x, y, TileEntry::new(0, 1), &registry, 0.0, None, Some(SectionKey::new(0, 0)));
            assert!(regions.is_none(), "tile {},{} reported {:?}", x, y, regions);
        }
        assert_eq!(draws.get(), 4);
        assert_eq!(surface.pixel(0, 0), Some(GREEN));
        assert_eq!(surface.pixel(639, 319), Some(GREEN));
    }

    #[test]
    fn test_isometric_right_column_crosses_right() {
        let (registry, _) = registry_with_probe();
        let r = renderer(MountMode::Isometric, 10);
        let mut surface = section_surface(10);

        // grid x = 9 -> local x = 9 * 64, the rightmost column
        let regions = r
            .render_tile(&mut surface, 9, 0, TileEntry::new(0, 1), &registry, 0.0, None, Some(SectionKey::new(0, 0)))
            .unwrap();
        assert!(regions.contains(&NeighborOffset::new(1, 0)));
        assert!(!regions.contains(&NeighborOffset::new(-1, 0)));
    }

    #[test]
    fn test_diagonal_descriptor_added_when_both_axes_cross() {
        let (registry, _) = registry_with_probe();
        let r = renderer(MountMode::Isometric, 10);
        let mut surface = section_surface(10);

        // Projects to (-640, 320): local (0, 320) in section (-1, 0), past
        // both its left edge and its last row
        let regions = r
            .render_tile(&mut surface, 0, 20, TileEntry::new(0, 1), &registry, 0.0, None, Some(SectionKey::new(-1, 0)))
            .unwrap();
        assert_eq!(
            regions,
            vec![NeighborOffset::new(-1, 0), NeighborOffset::new(0, 1), NeighborOffset::new(-1, 1)]
        );
    }

    #[test]
    fn test_unknown_texture_is_skipped() {
        let (registry, draws) = registry_with_probe();
        let r = renderer(MountMode::Orthogonal, 10);
        let mut surface = section_surface(10);

        let regions = r.render_tile(&mut surface, 0, 0, TileEntry::new(7, 1), &registry, 0.0, None, None);
        assert!(regions.is_none());
        assert_eq!(draws.get(), 0);
    }

    #[test]
    fn test_clip_rect_rejects_outside_points() {
        let (registry, draws) = registry_with_probe();
        let r = TileRenderer::new(MountMode::Orthogonal.projector(TileSize::new(64, 32)), None);
        let mut surface = Surface::new(256, 256, false);
        let clip = ClipRect::new(0.0, 0.0, 128.0, 64.0);

        r.render_tile(&mut surface, 1, 1, TileEntry::new(0, 1), &registry, 0.0, Some(&clip), None);
        r.render_tile(&mut surface, 3, 0, TileEntry::new(0, 1), &registry, 0.0, Some(&clip), None);
        assert_eq!(draws.get(), 1);
    }
}
