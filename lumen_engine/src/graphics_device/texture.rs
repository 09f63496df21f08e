/// Texture trait, texture descriptor, and texture info

use crate::error::{Error, Result};
use std::any::Any;

/// Image formats understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    D32_SFLOAT,
    D32_SFLOAT_S8_UINT,
    D24_UNORM_S8_UINT,
    /// A backend format with no engine-side equivalent
    Unknown,
}

impl TextureFormat {
    /// Whether the format carries a stencil aspect
    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D32_SFLOAT_S8_UINT | TextureFormat::D24_UNORM_S8_UINT)
    }

    /// Whether the format is a depth format
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D32_SFLOAT
                | TextureFormat::D32_SFLOAT_S8_UINT
                | TextureFormat::D24_UNORM_S8_UINT
        )
    }
}

/// Descriptor for uploading a sampled texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Debug name
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Tightly packed RGBA8 pixels, `width * height * 4` bytes
    pub data: Vec<u8>,
}

impl TextureDesc {
    /// Build an RGBA8 sRGB descriptor from a raw 8-bit pixel buffer with
    /// 1, 3 or 4 channels
    pub fn from_pixels(
        name: &str,
        width: u32,
        height: u32,
        channels: u32,
        pixels: &[u8],
    ) -> Result<Self> {
        let data = expand_to_rgba8(width, height, channels, pixels)?;
        Ok(Self {
            name: name.to_string(),
            width,
            height,
            format: TextureFormat::R8G8B8A8_SRGB,
            data,
        })
    }
}

/// Read-only texture properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// GPU texture resource (image + view), released on drop
pub trait Texture: Send + Sync {
    /// Get texture properties
    fn info(&self) -> &TextureInfo;

    /// Downcast hook for the owning backend
    fn as_any(&self) -> &dyn Any;
}

/// Expand a 1, 3 or 4 channel pixel buffer to RGBA8
///
/// Grayscale is replicated into RGB; missing alpha becomes opaque.
pub fn expand_to_rgba8(width: u32, height: u32, channels: u32, pixels: &[u8]) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidResource(format!(
            "Texture has zero extent ({}x{})",
            width, height
        )));
    }
    let pixel_count = width as usize * height as usize;
    let expected = pixel_count * channels as usize;
    if pixels.len() != expected {
        return Err(Error::InvalidResource(format!(
            "Texture pixel buffer is {} bytes, expected {} ({}x{}x{})",
            pixels.len(),
            expected,
            width,
            height,
            channels
        )));
    }

    match channels {
        4 => Ok(pixels.to_vec()),
        3 => Ok(pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], u8::MAX])
            .collect()),
        1 => Ok(pixels.iter().flat_map(|&g| [g, g, g, u8::MAX]).collect()),
        other => Err(Error::InvalidResource(format!(
            "Unsupported texture channel count: {}",
            other
        ))),
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
