//! Texture resources
//!
//! A texture draws one of its cells at the surface's current origin. Textures
//! are described by a [`TextureDescriptor`] so that saved maps can recreate
//! them through [`TextureFactory`] without executing anything.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::projection::TileEntity;
use super::surface::Surface;
use crate::error::Result;

/// A drawable resource referenced by index from the texture map
pub trait Texture {
    /// Whether the texture can be drawn yet. Once true it stays true.
    fn loaded(&self) -> bool;

    /// Draw `entity.cell` at the surface's current origin
    fn render(&self, surface: &mut Surface, entity: &TileEntity, delta: f32);

    /// Typed description that recreates this texture
    fn descriptor(&self) -> TextureDescriptor;

    /// Textual form stored in saved maps
    fn serialize(&self) -> Result<String> {
        self.descriptor().to_ron()
    }
}

/// Shape filled by a solid texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolidShape {
    #[default]
    Rect,
    Diamond,
}

/// Everything needed to recreate a texture, keyed by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextureDescriptor {
    /// Flat colour
    Solid {
        color: (u8, u8, u8, u8),
        #[serde(default)]
        shape: SolidShape,
    },
    /// Grid sheet loaded from disk
    Sheet {
        path: PathBuf,
        cell_width: u32,
        cell_height: u32,
    },
    /// Grid sheet carried inline as base64 PNG
    Embedded {
        png_base64: String,
        cell_width: u32,
        cell_height: u32,
    },
}

impl TextureDescriptor {
    /// Kind identifier used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            TextureDescriptor::Solid { .. } => "solid",
            TextureDescriptor::Sheet { .. } => "sheet",
            TextureDescriptor::Embedded { .. } => "embedded",
        }
    }

    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::to_string(self)?)
    }

    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }
}

/// Builds textures from descriptors
#[derive(Debug, Clone, Default)]
pub struct TextureFactory {
    /// Relative sheet paths are resolved against this directory
    base_dir: Option<PathBuf>,
}

impl TextureFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative sheet paths against `dir`
    pub fn with_base_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            base_dir: Some(dir.as_ref().to_path_buf()),
        }
    }

    /// Parse a serialized descriptor and build the texture
    pub fn create_from_str(&self, text: &str) -> Result<Box<dyn Texture>> {
        let descriptor = TextureDescriptor::from_ron(text)?;
        self.create(&descriptor)
    }

    /// Build the texture described by `descriptor`. Disk sheets start
    /// loading in the background and report `loaded() == false` until done.
    pub fn create(&self, descriptor: &TextureDescriptor) -> Result<Box<dyn Texture>> {
        log::debug!("Creating {} texture", descriptor.kind());

        match descriptor {
            TextureDescriptor::Solid { color, shape } => {
                let (r, g, b, a) = *color;
                Ok(Box::new(SolidTexture::new(Rgba([r, g, b, a]), *shape)))
            }
            TextureDescriptor::Sheet { path, cell_width, cell_height } => {
                let resolved = match (&self.base_dir, path.is_relative()) {
                    (Some(base), true) => base.join(path),
                    _ => path.clone(),
                };
                Ok(Box::new(SheetTexture::load(
                    resolved,
                    path.clone(),
                    *cell_width,
                    *cell_height,
                )))
            }
            TextureDescriptor::Embedded { png_base64, cell_width, cell_height } => {
                let bytes = BASE64.decode(png_base64)?;
                let image = image::load_from_memory(&bytes)?;
                Ok(Box::new(SheetTexture::from_image(image, *cell_width, *cell_height)?))
            }
        }
    }
}

/// Single flat colour filling the tile footprint
#[derive(Debug, Clone, Copy)]
pub struct SolidTexture {
    color: Rgba<u8>,
    shape: SolidShape,
}

impl SolidTexture {
    pub fn new(color: Rgba<u8>, shape: SolidShape) -> Self {
        Self { color, shape }
    }

    pub fn color(&self) -> Rgba<u8> {
        self.color
    }
}

impl Texture for SolidTexture {
    fn loaded(&self) -> bool {
        true
    }

    fn render(&self, surface: &mut Surface, entity: &TileEntity, _delta: f32) {
        let pos = entity.render_pos;
        let size = entity.geometry;
        match self.shape {
            SolidShape::Rect => surface.fill_rect(pos.x, pos.y, size.x, size.y, self.color),
            SolidShape::Diamond => surface.fill_diamond(pos.x, pos.y, size.x, size.y, self.color),
        }
    }

    fn descriptor(&self) -> TextureDescriptor {
        let [r, g, b, a] = self.color.0;
        TextureDescriptor::Solid {
            color: (r, g, b, a),
            shape: self.shape,
        }
    }
}

/// Where a sheet's pixels came from, kept for serialization
#[derive(Debug, Clone)]
enum SheetSource {
    File(PathBuf),
    Embedded(String),
}

/// A sprite sheet split into equally sized cells, numbered from 1
/// left-to-right, top-to-bottom
pub struct SheetTexture {
    source: SheetSource,
    cell_width: u32,
    cell_height: u32,
    cells: Arc<Mutex<Vec<RgbaImage>>>,
    loaded: Arc<AtomicBool>,
}

impl SheetTexture {
    /// Start decoding `path` on a loader thread. `saved_path` is what gets
    /// written back when the texture is serialized.
    pub fn load(path: PathBuf, saved_path: PathBuf, cell_width: u32, cell_height: u32) -> Self {
        let cells = Arc::new(Mutex::new(Vec::new()));
        let loaded = Arc::new(AtomicBool::new(false));

        let thread_cells = Arc::clone(&cells);
        let thread_loaded = Arc::clone(&loaded);
        let (cw, ch) = (cell_width, cell_height);
        let spawned = thread::Builder::new()
            .name("texmap-sheet-loader".to_string())
            .spawn(move || match image::open(&path) {
                Ok(image) => {
                    *thread_cells.lock() = extract_cells(&image, cw, ch);
                    thread_loaded.store(true, Ordering::Release);
                }
                Err(e) => log::error!("Failed to load texture sheet {}: {}", path.display(), e),
            });

        if let Err(e) = spawned {
            log::error!("Failed to spawn texture loader thread: {}", e);
        }

        Self {
            source: SheetSource::File(saved_path),
            cell_width,
            cell_height,
            cells,
            loaded,
        }
    }

    /// Build from an already-decoded image; loaded immediately
    pub fn from_image(image: DynamicImage, cell_width: u32, cell_height: u32) -> Result<Self> {
        let png = encode_png(&image.to_rgba8())?;
        let cells = extract_cells(&image, cell_width, cell_height);

        Ok(Self {
            source: SheetSource::Embedded(BASE64.encode(png)),
            cell_width,
            cell_height,
            cells: Arc::new(Mutex::new(cells)),
            loaded: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Number of cells extracted so far
    pub fn cell_count(&self) -> usize {
        self.cells.lock().len()
    }
}

impl Texture for SheetTexture {
    fn loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    fn render(&self, surface: &mut Surface, entity: &TileEntity, _delta: f32) {
        let cells = self.cells.lock();
        let index = entity.cell.max(1) as usize - 1;
        match cells.get(index) {
            Some(cell) => surface.draw_image(
                cell,
                entity.render_pos.x,
                entity.render_pos.y,
                entity.geometry.x,
                entity.geometry.y,
            ),
            None => log::trace!("Sheet has no cell {}", entity.cell),
        }
    }

    fn descriptor(&self) -> TextureDescriptor {
        match &self.source {
            SheetSource::File(path) => TextureDescriptor::Sheet {
                path: path.clone(),
                cell_width: self.cell_width,
                cell_height: self.cell_height,
            },
            SheetSource::Embedded(png_base64) => TextureDescriptor::Embedded {
                png_base64: png_base64.clone(),
                cell_width: self.cell_width,
                cell_height: self.cell_height,
            },
        }
    }
}

/// Split a sheet into cells, numbered left-to-right, top-to-bottom
fn extract_cells(image: &DynamicImage, cell_width: u32, cell_height: u32) -> Vec<RgbaImage> {
    let (img_width, img_height) = image.dimensions();
    let cell_width = cell_width.max(1);
    let cell_height = cell_height.max(1);
    let cols = img_width / cell_width;
    let rows = img_height / cell_height;

    let mut cells = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let cell = image.crop_imm(col * cell_width, row * cell_height, cell_width, cell_height);
            cells.push(cell.to_rgba8());
        }
    }

    log::info!(
        "Extracted {} cells ({}x{} grid) from texture sheet",
        cells.len(),
        cols,
        rows
    );

    cells
}

/// Encode an RGBA image as PNG bytes
fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}
