//! Renderer configuration
//!
//! Loads map settings from a RON file, with fallback to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::render::MountMode;

/// Settings for building a texture map and its viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    pub mount_mode: MountMode,
    /// Tiles per section edge; `None` draws every tile every frame
    pub auto_section: Option<u32>,
    /// Outline cached sections on the frame
    pub draw_section_bounds: bool,
    /// Bilinear filtering when scaling textures
    pub smoothing: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_width: 32,
            tile_height: 32,
            mount_mode: MountMode::Orthogonal,
            auto_section: Some(10),
            draw_section_bounds: false,
            smoothing: false,
            viewport_width: 800,
            viewport_height: 600,
        }
    }
}

impl MapConfig {
    /// Parse a RON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(ron::from_str(&content)?)
    }

    /// Load `path` if it exists, otherwise use defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Per-user config location
    pub fn default_path() -> PathBuf {
        use directories::ProjectDirs;

        if let Some(proj_dirs) = ProjectDirs::from("com", "texmap", "Texmap") {
            proj_dirs.config_dir().join("texmap.ron")
        } else {
            // Fallback to current directory
            PathBuf::from("./texmap.ron")
        }
    }

    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }
}
