/// Swapchain and everything whose lifetime is tied to it
///
/// A `SwapchainResources` is built in one go and torn down in one go: the
/// engine's swapchain manager never patches parts of it. The surface
/// selection rules are free functions so they can be checked without a GPU.

use lumen_engine::lumen::{
    Error,
    Result,
    render::{Extent2D, SwapchainInfo, TextureFormat},
};
use lumen_engine::{engine_debug, engine_err, engine_error};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::vk_to_texture_format;
use crate::vulkan_pipeline::{create_mesh_pipeline, create_pipeline_layout};
use crate::vulkan_render_pass::create_render_pass;
use crate::vulkan_shader::Shader;
use crate::vulkan_texture::Texture;
use crate::vulkan_upload::{create_depth_attachment, create_image_view};

// ============================================================================
// Surface selection rules
// ============================================================================

/// Prefer B8G8R8A8_SRGB with the sRGB non-linear color space
///
/// A single UNDEFINED entry means the surface has no preference.
pub(crate) fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    let preferred = vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };

    if formats.len() == 1 && formats[0].format == vk::Format::UNDEFINED {
        return Some(preferred);
    }

    formats
        .iter()
        .copied()
        .find(|f| f.format == preferred.format && f.color_space == preferred.color_space)
        .or_else(|| formats.first().copied())
}

/// MAILBOX, then IMMEDIATE, then FIFO (always available)
pub(crate) fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
        .into_iter()
        .find(|mode| modes.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Surface extent, or the window size clamped to the surface limits when
/// the surface leaves it to the application
pub(crate) fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, window: Extent2D) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: window.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: window.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One more than the minimum, capped at the maximum (0 = no maximum)
pub(crate) fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

// ============================================================================
// SwapchainResources
// ============================================================================

/// Device-level handles needed to build the swapchain-dependent state
pub(crate) struct SwapchainBuilder<'a> {
    pub ctx: &'a Arc<GpuContext>,
    pub physical_device: vk::PhysicalDevice,
    pub surface: vk::SurfaceKHR,
    pub surface_loader: &'a ash::khr::surface::Instance,
    pub swapchain_loader: &'a ash::khr::swapchain::Device,
    pub set_layout: vk::DescriptorSetLayout,
    pub depth_format: vk::Format,
}

/// Swapchain, image views, depth attachment, render pass, pipeline and framebuffers
pub(crate) struct SwapchainResources {
    pub swapchain: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
    /// One per swapchain image, signaled by the submission rendering into it
    pub render_finished: Vec<vk::Semaphore>,
    pub depth: Option<Texture>,
    pub render_pass: vk::RenderPass,
    pub pipeline_layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
    pub framebuffers: Vec<vk::Framebuffer>,
    pub extent: vk::Extent2D,
    pub info: SwapchainInfo,
}

impl SwapchainResources {
    fn empty() -> Self {
        Self {
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            render_finished: Vec::new(),
            depth: None,
            render_pass: vk::RenderPass::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            pipeline: vk::Pipeline::null(),
            framebuffers: Vec::new(),
            extent: vk::Extent2D::default(),
            info: SwapchainInfo {
                handle: 0,
                generation: 0,
                image_count: 0,
                format: TextureFormat::Unknown,
                extent: Extent2D::default(),
                depth_format: TextureFormat::Unknown,
            },
        }
    }

    /// Build the full swapchain-dependent state
    ///
    /// On failure everything created so far is released before returning.
    pub(crate) fn create(
        builder: &SwapchainBuilder<'_>,
        requested: Extent2D,
        vertex_shader: &Shader,
        fragment_shader: &Shader,
    ) -> Result<Self> {
        let mut resources = Self::empty();
        match resources.build(builder, requested, vertex_shader, fragment_shader) {
            Ok(()) => Ok(resources),
            Err(e) => {
                resources.destroy(&builder.ctx.device, builder.swapchain_loader);
                Err(e)
            }
        }
    }

    fn build(
        &mut self,
        builder: &SwapchainBuilder<'_>,
        requested: Extent2D,
        vertex_shader: &Shader,
        fragment_shader: &Shader,
    ) -> Result<()> {
        let device = &builder.ctx.device;

        unsafe {
            let capabilities = builder
                .surface_loader
                .get_physical_device_surface_capabilities(builder.physical_device, builder.surface)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to get surface capabilities: {:?}", e))?;
            let formats = builder
                .surface_loader
                .get_physical_device_surface_formats(builder.physical_device, builder.surface)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to query surface formats: {:?}", e))?;
            let present_modes = builder
                .surface_loader
                .get_physical_device_surface_present_modes(builder.physical_device, builder.surface)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to query present modes: {:?}", e))?;

            let surface_format = choose_surface_format(&formats).ok_or_else(|| {
                engine_error!("lumen::vulkan", "Surface reports no formats");
                Error::InitializationFailed("Surface reports no formats".to_string())
            })?;
            let present_mode = choose_present_mode(&present_modes);
            let extent = choose_extent(&capabilities, requested);
            let min_image_count = choose_image_count(&capabilities);

            let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(builder.surface)
                .min_image_count(min_image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .clipped(true);

            self.swapchain = builder
                .swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to create swapchain: {:?}", e))?;
            self.extent = extent;

            self.images = builder
                .swapchain_loader
                .get_swapchain_images(self.swapchain)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to get swapchain images: {:?}", e))?;

            for &image in &self.images {
                self.image_views.push(create_image_view(
                    device,
                    image,
                    surface_format.format,
                    vk::ImageAspectFlags::COLOR,
                )?);
            }

            let semaphore_create_info = vk::SemaphoreCreateInfo::default();
            for _ in 0..self.images.len() {
                self.render_finished.push(
                    device
                        .create_semaphore(&semaphore_create_info, None)
                        .map_err(|e| engine_err!("lumen::vulkan", "Failed to create render-finished semaphore: {:?}", e))?,
                );
            }

            let depth_engine_format = vk_to_texture_format(builder.depth_format);
            let depth = create_depth_attachment(
                builder.ctx,
                extent.width,
                extent.height,
                builder.depth_format,
                depth_engine_format,
            )?;
            let depth_view = depth.view;
            self.depth = Some(depth);

            self.render_pass = create_render_pass(device, surface_format.format, builder.depth_format)?;
            self.pipeline_layout = create_pipeline_layout(device, builder.set_layout, vertex_shader)?;
            self.pipeline = create_mesh_pipeline(
                device,
                self.render_pass,
                self.pipeline_layout,
                extent,
                vertex_shader,
                fragment_shader,
            )?;

            for &view in &self.image_views {
                let attachments = [view, depth_view];
                let framebuffer_info = vk::FramebufferCreateInfo::default()
                    .render_pass(self.render_pass)
                    .attachments(&attachments)
                    .width(extent.width)
                    .height(extent.height)
                    .layers(1);
                self.framebuffers.push(
                    device
                        .create_framebuffer(&framebuffer_info, None)
                        .map_err(|e| engine_err!("lumen::vulkan", "Failed to create framebuffer: {:?}", e))?,
                );
            }

            self.info = SwapchainInfo {
                handle: vk::Handle::as_raw(self.swapchain),
                generation: 0,
                image_count: self.images.len() as u32,
                format: vk_to_texture_format(surface_format.format),
                extent: Extent2D::new(extent.width, extent.height),
                depth_format: depth_engine_format,
            };

            engine_debug!(
                "lumen::vulkan",
                "Swapchain built: {} images, {:?}, {}x{}, {:?}",
                self.images.len(),
                surface_format.format,
                extent.width,
                extent.height,
                present_mode
            );
        }
        Ok(())
    }

    /// Destroy everything in reverse creation order
    ///
    /// The caller guarantees the device is idle. Null handles are skipped so
    /// this also cleans up a partially built state.
    pub(crate) fn destroy(&mut self, device: &ash::Device, swapchain_loader: &ash::khr::swapchain::Device) {
        unsafe {
            for framebuffer in self.framebuffers.drain(..) {
                device.destroy_framebuffer(framebuffer, None);
            }
            if self.pipeline != vk::Pipeline::null() {
                device.destroy_pipeline(self.pipeline, None);
                self.pipeline = vk::Pipeline::null();
            }
            if self.pipeline_layout != vk::PipelineLayout::null() {
                device.destroy_pipeline_layout(self.pipeline_layout, None);
                self.pipeline_layout = vk::PipelineLayout::null();
            }
            if self.render_pass != vk::RenderPass::null() {
                device.destroy_render_pass(self.render_pass, None);
                self.render_pass = vk::RenderPass::null();
            }
            // Texture::drop releases the depth image, view and memory
            self.depth = None;
            for semaphore in self.render_finished.drain(..) {
                device.destroy_semaphore(semaphore, None);
            }
            for view in self.image_views.drain(..) {
                device.destroy_image_view(view, None);
            }
            self.images.clear();
            if self.swapchain != vk::SwapchainKHR::null() {
                swapchain_loader.destroy_swapchain(self.swapchain, None);
                self.swapchain = vk::SwapchainKHR::null();
            }
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
