//! Texture registry
//!
//! Ordered list of textures referenced by index from tile entries.

use super::texture::Texture;

/// Append-only texture list with cached load readiness
#[derive(Default)]
pub struct TextureRegistry {
    textures: Vec<Box<dyn Texture>>,
    /// Set once every texture has been observed loaded
    all_loaded: bool,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a texture and return its index
    pub fn add(&mut self, texture: Box<dyn Texture>) -> usize {
        self.textures.push(texture);
        self.all_loaded = false;
        self.textures.len() - 1
    }

    /// True when every registered texture is loaded. Load state only ever
    /// goes from false to true, so a positive answer is remembered until
    /// the list changes.
    pub fn all_loaded(&mut self) -> bool {
        if !self.all_loaded {
            if let Some(index) = self.textures.iter().position(|t| !t.loaded()) {
                log::trace!("Texture {} not loaded yet", index);
                return false;
            }
            self.all_loaded = true;
        }
        true
    }

    /// Replace the whole list
    pub fn reset(&mut self, textures: Vec<Box<dyn Texture>>) {
        self.textures = textures;
        self.all_loaded = false;
    }

    pub fn get(&self, index: usize) -> Option<&dyn Texture> {
        self.textures.get(index).map(|t| t.as_ref())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Box<dyn Texture>> {
        self.textures.iter()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
