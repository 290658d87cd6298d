//! Texture map
//!
//! Owns the tile grid, its textures and the section cache, and draws the
//! whole lot onto a frame once per tick. Any change to the tiles or the
//! texture list marks the cache dirty; the next tick with every texture
//! loaded rebuilds it.

use std::fs;
use std::path::Path;

use super::grid::{TileEntry, TileGrid, TileSource};
use super::persist::{encode_grid, MapFile};
use crate::config::MapConfig;
use crate::error::Result;
use crate::render::{
    Compositor, FrameStats, MountMode, Point, RebuildOutcome, RenderContext, SectionCache, Surface, Texture,
    TextureFactory, TextureRegistry, TileRenderer, TileSize,
};

/// A sparse tile map rendered through a section cache
pub struct TextureMap {
    grid: TileGrid,
    textures: TextureRegistry,
    renderer: TileRenderer,
    /// Present while sectioning is enabled
    cache: Option<SectionCache>,
    compositor: Compositor,
    mount_mode: MountMode,
    tile: TileSize,
    /// Map position in world space
    translate: Point,
    cache_dirty: bool,
    factory: TextureFactory,
}

impl TextureMap {
    /// Create an empty map with sectioning disabled
    pub fn new(tile_width: u32, tile_height: u32, mount_mode: MountMode) -> Self {
        let tile = TileSize::new(tile_width, tile_height);
        Self {
            grid: TileGrid::new(),
            textures: TextureRegistry::new(),
            renderer: TileRenderer::new(mount_mode.projector(tile), None),
            cache: None,
            compositor: Compositor::default(),
            mount_mode,
            tile,
            translate: Point::ZERO,
            cache_dirty: true,
            factory: TextureFactory::new(),
        }
    }

    pub fn from_config(config: &MapConfig) -> Self {
        let mut map = Self::new(config.tile_width, config.tile_height, config.mount_mode);
        map.set_auto_section(config.auto_section);
        map.set_draw_section_bounds(config.draw_section_bounds);
        map
    }

    /// Enable sectioning with `n` x `n` tiles per section, or disable it
    /// with `None`. Any previous sections are dropped.
    pub fn set_auto_section(&mut self, auto_section: Option<u32>) {
        let auto_section = auto_section.map(|n| n.max(1));
        self.renderer.set_auto_section(auto_section);
        self.cache = auto_section.map(|n| SectionCache::new(n, self.tile));
        self.cache_dirty = true;
    }

    pub fn auto_section(&self) -> Option<u32> {
        self.renderer.auto_section()
    }

    pub fn set_draw_section_bounds(&mut self, draw: bool) {
        self.compositor.draw_section_bounds = draw;
    }

    pub fn draw_section_bounds(&self) -> bool {
        self.compositor.draw_section_bounds
    }

    pub fn set_translate(&mut self, translate: Point) {
        self.translate = translate;
    }

    pub fn translate(&self) -> Point {
        self.translate
    }

    /// Rebuild the section cache on the next tick
    pub fn cache_force_frame(&mut self) {
        self.cache_dirty = true;
    }

    pub fn is_cache_dirty(&self) -> bool {
        self.cache_dirty
    }

    /// Register a texture and return its index
    pub fn add_texture(&mut self, texture: Box<dyn Texture>) -> usize {
        let index = self.textures.add(texture);
        self.cache_dirty = true;
        index
    }

    pub fn all_textures_loaded(&mut self) -> bool {
        self.textures.all_loaded()
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    /// Paint `(x, y)`. `cell` defaults to the first cell.
    pub fn paint_tile(&mut self, x: i32, y: i32, texture_index: usize, cell: Option<u32>) {
        self.grid.set_tile(x, y, TileEntry::new(texture_index, cell.unwrap_or(1)));
        self.cache_dirty = true;
    }

    pub fn clear_tile(&mut self, x: i32, y: i32) -> Option<TileEntry> {
        let removed = self.grid.clear_tile(x, y);
        if removed.is_some() {
            self.cache_dirty = true;
        }
        removed
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<TileEntry> {
        self.grid.tile(x, y)
    }

    pub fn tile_texture_index(&self, x: i32, y: i32) -> Option<usize> {
        self.grid.tile(x, y).map(|entry| entry.texture_index)
    }

    /// Change the texture of a painted tile. Returns false when `(x, y)` is empty.
    pub fn set_tile_texture_index(&mut self, x: i32, y: i32, texture_index: usize) -> bool {
        match self.grid.get_mut(x, y) {
            Some(entry) => {
                entry.texture_index = texture_index;
                self.cache_dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn tile_texture_cell(&self, x: i32, y: i32) -> Option<u32> {
        self.grid.tile(x, y).map(|entry| entry.cell)
    }

    /// Change the cell of a painted tile. Returns false when `(x, y)` is empty.
    pub fn set_tile_texture_cell(&mut self, x: i32, y: i32, cell: u32) -> bool {
        match self.grid.get_mut(x, y) {
            Some(entry) => {
                entry.cell = cell.max(1);
                self.cache_dirty = true;
                true
            }
            None => false,
        }
    }

    /// Clear every tile that is also painted in `other`
    pub fn negate(&mut self, other: &TextureMap) {
        let removed = self.grid.remove_overlap(&other.grid);
        if removed > 0 {
            log::debug!("Negated {} tiles", removed);
            self.cache_dirty = true;
        }
    }

    /// Replace the map with the contents of a saved map JSON string.
    ///
    /// Everything is parsed and every texture created before any state
    /// changes, so a failed load leaves the map as it was. Without a
    /// texture list only the tiles are replaced.
    pub fn load_map(&mut self, json: &str) -> Result<()> {
        let factory = self.factory.clone();
        self.load_map_with(json, &factory)
    }

    /// Load a saved map file, resolving relative sheet paths against the
    /// file's directory
    pub fn load_map_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let factory = match path.parent() {
            Some(dir) => TextureFactory::with_base_dir(dir),
            None => TextureFactory::new(),
        };
        self.load_map_with(&json, &factory)?;
        log::info!("Loaded map from {}", path.display());
        Ok(())
    }

    fn load_map_with(&mut self, json: &str, factory: &TextureFactory) -> Result<()> {
        let file = MapFile::from_json(json)?;
        let grid = file.grid()?;
        let textures = match &file.textures {
            Some(list) => Some(
                list.iter()
                    .map(|text| factory.create_from_str(text))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };

        if let Some(textures) = textures {
            log::info!("Loading {} textures", textures.len());
            self.textures.reset(textures);
        }
        log::info!("Loaded {} tiles", grid.len());
        self.grid = grid;
        self.cache_dirty = true;
        Ok(())
    }

    /// Serialize the textures and tiles to a map JSON string
    pub fn save_map(&self) -> Result<String> {
        let textures = self
            .textures
            .iter()
            .map(|texture| texture.serialize())
            .collect::<Result<Vec<_>>>()?;
        let (data, data_xy) = encode_grid(&self.grid)?;

        MapFile {
            textures: Some(textures),
            data,
            data_xy,
        }
        .to_json()
    }

    /// Write [`save_map`](Self::save_map) output to `path`
    pub fn save_map_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.save_map()?)?;
        log::info!("Saved map to {}", path.display());
        Ok(())
    }

    /// Draw the map onto `frame`, rebuilding the section cache first if
    /// it is stale and every texture has loaded
    pub fn tick(&mut self, frame: &mut Surface, ctx: &RenderContext) -> FrameStats {
        let mut stats = FrameStats::default();

        match self.cache.as_mut() {
            Some(cache) => {
                let outcome = self.compositor.rebuild_if_dirty(
                    &mut self.cache_dirty,
                    cache,
                    &self.grid,
                    &mut self.textures,
                    &self.renderer,
                    ctx,
                );
                if let Some(RebuildOutcome::Rebuilt(rebuild)) = outcome {
                    stats.rebuilt = true;
                    stats.tiles_drawn = rebuild.tiles + rebuild.overlap_draws;
                }

                let (drawn, culled) =
                    self.compositor
                        .draw_sections(frame, cache, self.renderer.projector(), self.translate, ctx);
                stats.sections_drawn = drawn;
                stats.sections_culled = culled;
            }
            None => {
                stats.tiles_drawn = self.compositor.draw_direct(
                    frame,
                    &self.grid,
                    &self.textures,
                    &self.renderer,
                    self.translate,
                    ctx,
                );
                self.cache_dirty = false;
            }
        }

        stats
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn sections(&self) -> Option<&SectionCache> {
        self.cache.as_ref()
    }

    pub fn mount_mode(&self) -> MountMode {
        self.mount_mode
    }

    pub fn tile_size(&self) -> TileSize {
        self.tile
    }
}
