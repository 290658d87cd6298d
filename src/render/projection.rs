//! Tile to screen projection
//!
//! Maps integer tile coordinates to map-local pixel positions for the two
//! mount modes, and buckets tiles into sections. Mount-mode specific
//! behaviour lives behind [`MountProjector`] so the rest of the renderer
//! never branches on the mode itself.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A point in pixel (or fractional tile) space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Size of one grid cell in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileSize {
    pub width: f32,
    pub height: f32,
}

impl TileSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }
}

/// Identifies one section of the section grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionKey {
    pub x: i32,
    pub y: i32,
}

impl SectionKey {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The section `offset` steps away from this one
    pub fn offset(self, offset: NeighborOffset) -> Self {
        Self::new(self.x + offset.dx, self.y + offset.dy)
    }
}

/// Direction from a section to a neighbour a tile spills into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NeighborOffset {
    pub dx: i32,
    pub dy: i32,
}

impl NeighborOffset {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// The dummy entity handed to a texture so it knows where and what to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileEntity {
    /// Sub-region of the texture (1-based)
    pub cell: u32,
    /// Drawn size in pixels
    pub geometry: Point,
    /// Top-left corner relative to the tile's anchor
    pub render_pos: Point,
}

impl TileEntity {
    /// Same geometry, different cell
    pub fn with_cell(self, cell: u32) -> Self {
        Self { cell, ..self }
    }
}

/// Projection scheme used to place tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MountMode {
    #[default]
    Orthogonal,
    Isometric,
}

impl MountMode {
    /// Get a human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            MountMode::Orthogonal => "Orthogonal",
            MountMode::Isometric => "Isometric",
        }
    }

    /// Build the projector for this mode
    pub fn projector(self, tile: TileSize) -> Box<dyn MountProjector> {
        match self {
            MountMode::Orthogonal => Box::new(OrthogonalProjector { tile }),
            MountMode::Isometric => Box::new(IsometricProjector { tile }),
        }
    }
}

/// Mount-mode specific geometry
pub trait MountProjector {
    fn mode(&self) -> MountMode;

    fn tile_size(&self) -> TileSize;

    /// First projection stage: position in tile-sized units
    fn grid_units(&self, x: i32, y: i32) -> Point;

    /// Map-local pixel position of a tile's anchor
    fn project(&self, x: i32, y: i32) -> Point {
        let tile = self.tile_size();
        let grid = self.grid_units(x, y);
        Point::new(grid.x * tile.width, grid.y * tile.height)
    }

    /// Inverse of [`project`](Self::project), in fractional tile coordinates
    fn unproject(&self, point: Point) -> (f32, f32);

    /// How far a tile reaches horizontally past its anchor when testing
    /// section edges
    fn horizontal_adjust(&self) -> f32;

    /// Dummy entity used to draw a tile of the given cell
    fn tile_entity(&self, cell: u32) -> TileEntity;

    /// Origin correction applied when blitting sections onto the frame
    fn composite_correction(&self) -> Point;
}

/// Plain grid: one tile per cell
#[derive(Debug, Clone, Copy)]
pub struct OrthogonalProjector {
    tile: TileSize,
}

impl MountProjector for OrthogonalProjector {
    fn mode(&self) -> MountMode {
        MountMode::Orthogonal
    }

    fn tile_size(&self) -> TileSize {
        self.tile
    }

    fn grid_units(&self, x: i32, y: i32) -> Point {
        Point::new(x as f32, y as f32)
    }

    fn unproject(&self, point: Point) -> (f32, f32) {
        (point.x / self.tile.width, point.y / self.tile.height)
    }

    fn horizontal_adjust(&self) -> f32 {
        0.0
    }

    fn tile_entity(&self, cell: u32) -> TileEntity {
        TileEntity {
            cell,
            geometry: Point::new(self.tile.width, self.tile.height),
            render_pos: Point::new(-self.tile.width / 2.0, -self.tile.height / 2.0),
        }
    }

    fn composite_correction(&self) -> Point {
        Point::ZERO
    }
}

/// Diamond projection: tiles are drawn twice as wide as their cell
#[derive(Debug, Clone, Copy)]
pub struct IsometricProjector {
    tile: TileSize,
}

impl MountProjector for IsometricProjector {
    fn mode(&self) -> MountMode {
        MountMode::Isometric
    }

    fn tile_size(&self) -> TileSize {
        self.tile
    }

    fn grid_units(&self, x: i32, y: i32) -> Point {
        let tx = x as f32 * self.tile.width;
        let ty = y as f32 * self.tile.height;
        Point::new((tx - ty) / self.tile.width, ((tx + ty) * 0.5) / self.tile.height)
    }

    fn unproject(&self, point: Point) -> (f32, f32) {
        // sx = tx - ty, sy = (tx + ty) / 2
        let tx = point.y + point.x / 2.0;
        let ty = point.y - point.x / 2.0;
        (tx / self.tile.width, ty / self.tile.height)
    }

    fn horizontal_adjust(&self) -> f32 {
        self.tile.width / 2.0
    }

    fn tile_entity(&self, cell: u32) -> TileEntity {
        TileEntity {
            cell,
            geometry: Point::new(self.tile.width * 2.0, self.tile.height),
            render_pos: Point::new(-self.tile.width, -self.tile.height / 2.0),
        }
    }

    fn composite_correction(&self) -> Point {
        Point::new(-self.tile.width / 2.0, -self.tile.height / 2.0)
    }
}

/// Section a tile belongs to, from its un-adjusted grid position
pub fn section_of(projector: &dyn MountProjector, x: i32, y: i32, auto_section: u32) -> SectionKey {
    let grid = projector.grid_units(x, y);
    let n = auto_section.max(1) as f32;
    SectionKey::new((grid.x / n).floor() as i32, (grid.y / n).floor() as i32)
}

/// Map-local pixel position of a section's top-left corner
pub fn section_origin(key: SectionKey, auto_section: u32, tile: TileSize) -> Point {
    let n = auto_section as f32;
    Point::new(key.x as f32 * n * tile.width, key.y as f32 * n * tile.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ortho() -> Box<dyn MountProjector> {
        MountMode::Orthogonal.projector(TileSize::new(64, 32))
    }

    fn iso() -> Box<dyn MountProjector> {
        MountMode::Isometric.projector(TileSize::new(64, 32))
    }

    #[test]
    fn test_orthogonal_projection_is_linear() {
        let p = ortho();
        for x in -5..5 {
            for y in -5..5 {
                assert_eq!(p.project(x, y), Point::new(x as f32 * 64.0, y as f32 * 32.0));
            }
        }
    }

    #[test]
    fn test_isometric_projection_two_stage() {
        let p = iso();
        // tx = 128, ty = 32: (128 - 32, (128 + 32) / 2)
        assert_eq!(p.project(2, 1), Point::new(96.0, 80.0));
        assert_eq!(p.grid_units(2, 1), Point::new(1.5, 2.5));
    }

    #[test]
    fn test_isometric_projection_is_injective() {
        let p = iso();
        let mut seen = HashSet::new();
        for x in -20..20 {
            for y in -20..20 {
                let point = p.project(x, y);
                assert!(seen.insert((point.x.to_bits(), point.y.to_bits())), "collision at {},{}", x, y);
            }
        }
    }

    #[test]
    fn test_unproject_inverts_project() {
        for p in [ortho(), iso()] {
            for x in -7..7 {
                for y in -7..7 {
                    let (ux, uy) = p.unproject(p.project(x, y));
                    assert!((ux - x as f32).abs() < 1e-4, "{:?} x {} -> {}", p.mode(), x, ux);
                    assert!((uy - y as f32).abs() < 1e-4, "{:?} y {} -> {}", p.mode(), y, uy);
                }
            }
        }
    }

    #[test]
    fn test_section_bucket_floors_negative() {
        let p = ortho();
        assert_eq!(section_of(p.as_ref(), 0, 0, 10), SectionKey::new(0, 0));
        assert_eq!(section_of(p.as_ref(), 9, 9, 10), SectionKey::new(0, 0));
        assert_eq!(section_of(p.as_ref(), 10, 0, 10), SectionKey::new(1, 0));
        assert_eq!(section_of(p.as_ref(), -1, -10, 10), SectionKey::new(-1, -1));
        assert_eq!(section_of(p.as_ref(), -11, 0, 10), SectionKey::new(-2, 0));
    }

    #[test]
    fn test_local_offset_inside_section() {
        let p = ortho();
        let tile = p.tile_size();
        let key = section_of(p.as_ref(), 13, 4, 10);
        let local = p.project(13, 4) - section_origin(key, 10, tile);
        assert_eq!(key, SectionKey::new(1, 0));
        assert_eq!(local, Point::new(3.0 * 64.0, 4.0 * 32.0));
    }

    #[test]
    fn test_tile_entity_geometry() {
        let o = ortho().tile_entity(3);
        assert_eq!(o.cell, 3);
        assert_eq!(o.geometry, Point::new(64.0, 32.0));
        assert_eq!(o.render_pos, Point::new(-32.0, -16.0));

        let i = iso().tile_entity(1);
        assert_eq!(i.geometry, Point::new(128.0, 32.0));
        assert_eq!(i.render_pos, Point::new(-64.0, -16.0));
    }
}
