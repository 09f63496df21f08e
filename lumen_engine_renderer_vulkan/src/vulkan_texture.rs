/// Texture - Vulkan implementation of the engine Texture trait
///
/// Used for the sampled material texture and for the depth attachment of
/// the swapchain framebuffers.

use lumen_engine::lumen::{
    Error,
    Result,
    render::{Texture as EngineTexture, TextureInfo},
};
use lumen_engine::engine_error;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan texture implementation
pub struct Texture {
    /// Shared GPU context (for cleanup)
    ctx: Arc<GpuContext>,
    /// Vulkan image
    pub(crate) image: vk::Image,
    /// Vulkan image view
    pub(crate) view: vk::ImageView,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Read-only texture properties
    pub(crate) info: TextureInfo,
}

impl Texture {
    pub fn new(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        view: vk::ImageView,
        allocation: Allocation,
        info: TextureInfo,
    ) -> Self {
        Self {
            ctx,
            image,
            view,
            allocation: Some(allocation),
            info,
        }
    }
}

impl EngineTexture for Texture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);

            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_image(self.image, None);
        }
    }
}

/// Downcast an engine texture to the Vulkan implementation
pub(crate) fn as_vulkan_texture(texture: &dyn EngineTexture) -> Result<&Texture> {
    texture.as_any().downcast_ref::<Texture>().ok_or_else(|| {
        engine_error!("lumen::vulkan", "Texture was not created by the Vulkan backend");
        Error::InvalidResource("Texture was not created by the Vulkan backend".to_string())
    })
}
