/*!
# Lumen Engine - Vulkan Backend

Vulkan implementation of the `lumen_engine` [`GraphicsDevice`] trait, built
on ash for the API bindings and gpu-allocator for memory management.

```no_run
use std::sync::Arc;
use lumen_engine::lumen::render::Config;
use lumen_engine_renderer_vulkan::lumen::{VulkanGraphicsDevice, WinitWindowSurface};
# fn run(window: Arc<winit::window::Window>) -> lumen_engine::lumen::Result<()> {
let device = VulkanGraphicsDevice::new(window.as_ref(), &Config::default())?;
let surface = WinitWindowSurface::new(window);
# Ok(())
# }
```

[`GraphicsDevice`]: lumen_engine::lumen::render::GraphicsDevice
*/

mod debug;
mod vulkan;
mod vulkan_buffer;
mod vulkan_command_list;
mod vulkan_context;
mod vulkan_device_selection;
mod vulkan_format;
mod vulkan_frame;
mod vulkan_pipeline;
mod vulkan_render_pass;
mod vulkan_sampler;
mod vulkan_shader;
mod vulkan_swapchain;
mod vulkan_texture;
mod vulkan_upload;
mod window;

pub mod lumen {
    pub use crate::vulkan::VulkanGraphicsDevice;
    pub use crate::vulkan_buffer::Buffer as VulkanBuffer;
    pub use crate::vulkan_command_list::CommandList as VulkanCommandList;
    pub use crate::vulkan_shader::Shader as VulkanShader;
    pub use crate::vulkan_texture::Texture as VulkanTexture;
    pub use crate::window::WinitWindowSurface;

    // Validation message counters
    pub use crate::debug::{get_validation_stats, print_validation_stats_report};
}
