//! Section cache
//!
//! Static map geometry is drawn once into a sparse grid of off-screen
//! surfaces, each covering an N x N block of tiles, and blitted whole every
//! frame. The grid is rebuilt from scratch whenever it goes stale: sections
//! are never patched in place and never garbage collected between rebuilds.

use std::collections::{HashMap, HashSet};

use super::compositor::RenderContext;
use super::projection::{section_of, SectionKey, TileSize};
use super::registry::TextureRegistry;
use super::surface::Surface;
use super::tile::TileRenderer;
use crate::map::{TileCoord, TileSource};

/// Result of a rebuild attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// Textures were not all loaded; nothing was touched
    Deferred,
    /// The whole grid was redrawn
    Rebuilt(RebuildStats),
}

impl RebuildOutcome {
    pub fn is_rebuilt(&self) -> bool {
        matches!(self, RebuildOutcome::Rebuilt(_))
    }
}

/// Counters from one full rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Tiles drawn into their owning section
    pub tiles: usize,
    /// Sections allocated
    pub sections: usize,
    /// Extra draws into neighbouring sections
    pub overlap_draws: usize,
    /// Tiles skipped for referencing a missing texture
    pub skipped: usize,
}

/// Sparse grid of cached section surfaces
pub struct SectionCache {
    /// Tiles per section edge
    auto_section: u32,
    tile: TileSize,
    sections: HashMap<SectionKey, Surface>,
}

impl SectionCache {
    pub fn new(auto_section: u32, tile: TileSize) -> Self {
        Self {
            auto_section: auto_section.max(1),
            tile,
            sections: HashMap::new(),
        }
    }

    pub fn auto_section(&self) -> u32 {
        self.auto_section
    }

    /// Pixel size of every section surface
    pub fn section_size(&self) -> (u32, u32) {
        (
            (self.tile.width * self.auto_section as f32) as u32,
            (self.tile.height * self.auto_section as f32) as u32,
        )
    }

    /// Get the section at `key`, allocating it if needed. New sections have
    /// their origin moved by half a tile so tiles drawn around their anchor
    /// land inside the surface.
    pub fn ensure_section(&mut self, key: SectionKey, smoothing: bool) -> &mut Surface {
        let (width, height) = self.section_size();
        let tile = self.tile;
        self.sections.entry(key).or_insert_with(|| {
            let mut surface = Surface::new(width, height, smoothing);
            surface.translate(tile.width / 2.0, tile.height / 2.0);
            surface
        })
    }

    /// Throw away every section and redraw every tile.
    ///
    /// Does nothing and returns [`RebuildOutcome::Deferred`] unless all
    /// textures are loaded. Tiles whose footprint crosses a section edge
    /// are drawn into each neighbour too, at most once per neighbour.
    pub fn rebuild_all<S: TileSource + ?Sized>(
        &mut self,
        tiles: &S,
        textures: &mut TextureRegistry,
        renderer: &TileRenderer,
        ctx: &RenderContext,
    ) -> RebuildOutcome {
        if !textures.all_loaded() {
            log::debug!("Section rebuild deferred: textures still loading");
            return RebuildOutcome::Deferred;
        }
        let textures: &TextureRegistry = textures;

        self.sections = HashMap::new();

        let mut stats = RebuildStats::default();
        // Neighbour draws already made this rebuild
        let mut overlap_drawn: HashSet<(SectionKey, TileCoord)> = HashSet::new();

        for (coord, entry) in tiles.tiles() {
            if textures.get(entry.texture_index).is_none() {
                log::debug!(
                    "Tile {},{} references missing texture {}",
                    coord.x,
                    coord.y,
                    entry.texture_index
                );
                stats.skipped += 1;
                continue;
            }

            let key = section_of(renderer.projector(), coord.x, coord.y, self.auto_section);
            let surface = self.ensure_section(key, ctx.smoothing);
            let regions = renderer.render_tile(
                surface,
                coord.x,
                coord.y,
                entry,
                textures,
                ctx.delta,
                None,
                Some(key),
            );
            stats.tiles += 1;

            for offset in regions.into_iter().flatten() {
                let neighbor = key.offset(offset);
                if !overlap_drawn.insert((neighbor, coord)) {
                    continue;
                }

                let surface = self.ensure_section(neighbor, ctx.smoothing);
                renderer.render_tile(
                    surface,
                    coord.x,
                    coord.y,
                    entry,
                    textures,
                    ctx.delta,
                    None,
                    Some(neighbor),
                );
                stats.overlap_draws += 1;
            }
        }

        stats.sections = self.sections.len();
        log::debug!(
            "Rebuilt {} sections from {} tiles ({} overlap draws, {} skipped)",
            stats.sections,
            stats.tiles,
            stats.overlap_draws,
            stats.skipped
        );

        RebuildOutcome::Rebuilt(stats)
    }

    pub fn get(&self, key: SectionKey) -> Option<&Surface> {
        self.sections.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionKey, &Surface)> {
        self.sections.iter().map(|(key, surface)| (*key, surface))
    }

    pub fn keys(&self) -> Vec<SectionKey> {
        let mut keys: Vec<SectionKey> = self.sections.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Drop every section
    pub fn clear(&mut self) {
        self.sections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{TileEntry, TileGrid};
    use crate::render::compositor::Camera;
    use crate::render::projection::MountMode;
    use crate::render::registry::tests::ProbeTexture;
    use image::Rgba;

    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn ctx() -> RenderContext {
        RenderContext::new(Camera::default(), 400.0, 300.0)
    }

    #[test]
    fn test_ensure_section_is_idempotent() {
        let mut cache = SectionCache::new(4, TileSize::new(16, 8));
        assert_eq!(cache.section_size(), (64, 32));

        cache.ensure_section(SectionKey::new(1, -1), true).fill_rect(0.0, 0.0, 1.0, 1.0, BLUE);
        let surface = cache.ensure_section(SectionKey::new(1, -1), false);
        assert!(surface.smoothing());
        assert_eq!(surface.origin().x, 8.0);
        assert_eq!(surface.origin().y, 4.0);
        assert_eq!(surface.pixel(8, 4), Some(BLUE));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_rebuild_deferred_until_textures_load() {
        let mut textures = TextureRegistry::new();
        let (texture, loaded, draws) = ProbeTexture::new(false, BLUE);
        textures.add(Box::new(texture));

        let mut grid = TileGrid::new();
        grid.set_tile(0, 0, TileEntry::new(0, 1));

        let renderer = TileRenderer::new(MountMode::Orthogonal.projector(TileSize::new(16, 16)), Some(2));
        let mut cache = SectionCache::new(2, TileSize::new(16, 16));

        assert_eq!(cache.rebuild_all(&grid, &mut textures, &renderer, &ctx()), RebuildOutcome::Deferred);
        assert!(cache.is_empty());
        assert_eq!(draws.get(), 0);

        loaded.set(true);
        assert!(cache.rebuild_all(&grid, &mut textures, &renderer, &ctx()).is_rebuilt());
        assert_eq!(cache.len(), 1);
        assert_eq!(draws.get(), 1);
    }

    #[test]
    fn test_two_by_two_scenario_uses_one_section() {
        let mut textures = TextureRegistry::new();
        let (texture, _, _) = ProbeTexture::new(true, BLUE);
        textures.add(Box::new(texture));

        let mut grid = TileGrid::new();
        grid.set_tile(0, 0, TileEntry::new(0, 1));
        grid.set_tile(1, 1, TileEntry::new(0, 1));

        let tile = TileSize::new(32, 32);
        let renderer = TileRenderer::new(MountMode::Orthogonal.projector(tile), Some(2));
        let mut cache = SectionCache::new(2, tile);

        let RebuildOutcome::Rebuilt(stats) = cache.rebuild_all(&grid, &mut textures, &renderer, &ctx()) else {
            panic!("rebuild should not defer");
        };
        assert_eq!(stats.tiles, 2);
        assert_eq!(stats.overlap_draws, 0);
        assert_eq!(cache.keys(), vec![SectionKey::new(0, 0)]);
    }

    #[test]
    fn test_boundary_tile_drawn_once_into_each_section() {
        let mut textures = TextureRegistry::new();
        let (texture, _, draws) = ProbeTexture::new(true, BLUE);
        textures.add(Box::new(texture));

        // Isometric (9, 0) sits in the rightmost column of section (0, 0)
        let mut grid = TileGrid::new();
        grid.set_tile(9, 0, TileEntry::new(0, 1));

        let tile = TileSize::new(64, 32);
        let renderer = TileRenderer::new(MountMode::Isometric.projector(tile), Some(10));
        let mut cache = SectionCache::new(10, tile);

        let RebuildOutcome::Rebuilt(stats) = cache.rebuild_all(&grid, &mut textures, &renderer, &ctx()) else {
            panic!("rebuild should not defer");
        };
        assert_eq!(stats.overlap_draws, 1);
        assert_eq!(draws.get(), 2);
        assert_eq!(cache.keys(), vec![SectionKey::new(0, 0), SectionKey::new(1, 0)]);

        // The tile spans local x 576 - 32 .. 576 + 96 in its own section,
        // which is x -96 .. 32 in the neighbour
        let own = cache.get(SectionKey::new(0, 0)).unwrap();
        assert_eq!(own.pixel(639, 300), Some(BLUE));
        let neighbor = cache.get(SectionKey::new(1, 0)).unwrap();
        assert_eq!(neighbor.pixel(0, 300), Some(BLUE));
        assert_eq!(neighbor.pixel(40, 300).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_rebuild_discards_previous_sections() {
        let mut textures = TextureRegistry::new();
        let (texture, _, _) = ProbeTexture::new(true, BLUE);
        textures.add(Box::new(texture));

        let tile = TileSize::new(16, 16);
        let renderer = TileRenderer::new(MountMode::Orthogonal.projector(tile), Some(4));
        let mut cache = SectionCache::new(4, tile);

        let mut grid = TileGrid::new();
        grid.set_tile(20, 20, TileEntry::new(0, 1));
        cache.rebuild_all(&grid, &mut textures, &renderer, &ctx());
        assert_eq!(cache.keys(), vec![SectionKey::new(5, 5)]);

        grid.clear_tile(20, 20);
        grid.set_tile(0, 0, TileEntry::new(0, 1));
        cache.rebuild_all(&grid, &mut textures, &renderer, &ctx());
        assert_eq!(cache.keys(), vec![SectionKey::new(0, 0)]);
    }

    #[test]
    fn test_missing_texture_creates_no_section() {
        let mut textures = TextureRegistry::new();
        let mut grid = TileGrid::new();
        grid.set_tile(3, 3, TileEntry::new(4, 1));

        let tile = TileSize::new(16, 16);
        let renderer = TileRenderer::new(MountMode::Orthogonal.projector(tile), Some(4));
        let mut cache = SectionCache::new(4, tile);

        let RebuildOutcome::Rebuilt(stats) = cache.rebuild_all(&grid, &mut textures, &renderer, &ctx()) else {
            panic!("empty registry counts as loaded");
        };
        assert_eq!(stats.skipped, 1);
        assert!(cache.is_empty());
    }
}
