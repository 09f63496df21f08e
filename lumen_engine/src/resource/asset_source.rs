//! Asset collaborator: shader bytecode and raw texture pixels by logical name.

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Raw 8-bit-per-channel pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureAsset {
    pub width: u32,
    pub height: u32,
    /// 1, 3 or 4
    pub channels: u32,
    pub pixels: Vec<u8>,
}

impl TextureAsset {
    /// Two-color RGBA checkerboard with `cell`-pixel squares
    pub fn checkerboard(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let color = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
                pixels.extend_from_slice(&color);
            }
        }
        Self {
            width: size,
            height: size,
            channels: 4,
            pixels,
        }
    }
}

/// Supplies shader blobs and texture pixels to the renderer at startup
pub trait AssetSource {
    /// SPIR-V bytecode for a shader asset
    fn shader(&self, name: &str) -> Option<Vec<u8>>;

    /// Pixels for a texture asset
    fn texture(&self, name: &str) -> Option<TextureAsset>;
}

/// Look up a required shader, failing with `AssetMissing`
pub fn require_shader(assets: &dyn AssetSource, name: &str) -> Result<Vec<u8>> {
    assets.shader(name).ok_or_else(|| {
        crate::engine_error!("lumen::Assets", "Required shader '{}' not found", name);
        Error::AssetMissing(name.to_string())
    })
}

/// Look up a required texture, failing with `AssetMissing`
pub fn require_texture(assets: &dyn AssetSource, name: &str) -> Result<TextureAsset> {
    assets.texture(name).ok_or_else(|| {
        crate::engine_error!("lumen::Assets", "Required texture '{}' not found", name);
        Error::AssetMissing(name.to_string())
    })
}

/// Assets held in memory
#[derive(Default)]
pub struct InMemoryAssets {
    shaders: FxHashMap<String, Vec<u8>>,
    textures: FxHashMap<String, TextureAsset>,
}

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_shader(&mut self, name: &str, code: Vec<u8>) {
        self.shaders.insert(name.to_string(), code);
    }

    pub fn insert_texture(&mut self, name: &str, texture: TextureAsset) {
        self.textures.insert(name.to_string(), texture);
    }
}

impl AssetSource for InMemoryAssets {
    fn shader(&self, name: &str) -> Option<Vec<u8>> {
        self.shaders.get(name).cloned()
    }

    fn texture(&self, name: &str) -> Option<TextureAsset> {
        self.textures.get(name).cloned()
    }
}

/// Shader blobs read from a directory, textures from an in-memory fallback
///
/// Image decoding is outside the engine; callers register decoded textures.
pub struct DirectoryAssets {
    root: PathBuf,
    textures: InMemoryAssets,
}

impl DirectoryAssets {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            textures: InMemoryAssets::new(),
        }
    }

    pub fn insert_texture(&mut self, name: &str, texture: TextureAsset) {
        self.textures.insert_texture(name, texture);
    }
}

impl AssetSource for DirectoryAssets {
    fn shader(&self, name: &str) -> Option<Vec<u8>> {
        let path = self.root.join(name);
        match std::fs::read(&path) {
            Ok(code) => Some(code),
            Err(e) => {
                crate::engine_warn!("lumen::Assets", "Cannot read '{}': {}", path.display(), e);
                None
            }
        }
    }

    fn texture(&self, name: &str) -> Option<TextureAsset> {
        self.textures.texture(name)
    }
}

#[cfg(test)]
#[path = "asset_source_tests.rs"]
mod tests;
