/// Resource upload path
///
/// Everything that moves bytes between the host and device-local memory:
/// buffer creation, one-shot transfer command buffers, staging uploads,
/// readback and image layout transitions.

use lumen_engine::lumen::{
    Error,
    Result,
    render::{BufferUsage, TextureDesc, TextureFormat, TextureInfo},
};
use lumen_engine::{engine_err, engine_error, engine_trace};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{buffer_usage_to_vk, has_stencil_component, texture_format_to_vk};
use crate::vulkan_texture::Texture;

// ============================================================================
// Memory
// ============================================================================

fn allocate(
    ctx: &GpuContext,
    name: &str,
    requirements: vk::MemoryRequirements,
    location: MemoryLocation,
    linear: bool,
) -> Result<Allocation> {
    let mut allocator = ctx
        .allocator
        .lock()
        .map_err(|_| engine_err!("lumen::vulkan", "GPU allocator lock poisoned"))?;

    allocator
        .allocate(&AllocationCreateDesc {
            name,
            requirements,
            location,
            linear,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })
        .map_err(|e| {
            let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
            engine_error!("lumen::vulkan", "Out of GPU memory for '{}' ({:.2} MB): {:?}", name, size_mb, e);
            Error::OutOfMemory
        })
}

fn free(ctx: &GpuContext, allocation: Allocation) {
    if let Ok(mut allocator) = ctx.allocator.lock() {
        allocator.free(allocation).ok();
    }
}

/// Create a buffer and bind freshly allocated memory to it
pub(crate) fn create_buffer(
    ctx: &Arc<GpuContext>,
    name: &str,
    size: u64,
    vk_usage: vk::BufferUsageFlags,
    usage: BufferUsage,
    location: MemoryLocation,
) -> Result<Buffer> {
    unsafe {
        let buffer_create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(vk_usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = ctx.device.create_buffer(&buffer_create_info, None)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create buffer '{}' of size {} bytes: {:?}", name, size, e))?;

        let requirements = ctx.device.get_buffer_memory_requirements(buffer);
        let allocation = match allocate(ctx, name, requirements, location, true) {
            Ok(allocation) => allocation,
            Err(e) => {
                ctx.device.destroy_buffer(buffer, None);
                return Err(e);
            }
        };

        if let Err(e) = ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
            free(ctx, allocation);
            ctx.device.destroy_buffer(buffer, None);
            return Err(engine_err!("lumen::vulkan", "Failed to bind memory of buffer '{}': {:?}", name, e));
        }

        Ok(Buffer::new(Arc::clone(ctx), buffer, allocation, size, usage))
    }
}

// ============================================================================
// One-shot command buffers
// ============================================================================

/// Record commands into a temporary command buffer, submit it and wait for
/// the graphics queue to go idle
pub(crate) fn submit_one_shot<F>(ctx: &GpuContext, record: F) -> Result<()>
where
    F: FnOnce(vk::CommandBuffer) -> Result<()>,
{
    let pool = ctx
        .upload_command_pool
        .lock()
        .map_err(|_| engine_err!("lumen::vulkan", "Upload command pool lock poisoned"))?;

    unsafe {
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(*pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffer = ctx.device.allocate_command_buffers(&allocate_info)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to allocate upload command buffer: {:?}", e))?[0];

        let result = (|| {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            ctx.device.begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to begin upload command buffer: {:?}", e))?;

            record(command_buffer)?;

            ctx.device.end_command_buffer(command_buffer)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to end upload command buffer: {:?}", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
            ctx.device.queue_submit(ctx.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to submit upload commands: {:?}", e))?;

            ctx.device.queue_wait_idle(ctx.graphics_queue)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to wait for upload completion: {:?}", e))
        })();

        ctx.device.free_command_buffers(*pool, &[command_buffer]);
        result
    }
}

// ============================================================================
// Buffers
// ============================================================================

/// Upload `data` into a new device-local buffer through a staging buffer
///
/// The destination is created with `TRANSFER_DST | usage | TRANSFER_SRC` so
/// it can also be read back.
pub(crate) fn upload_buffer(ctx: &Arc<GpuContext>, name: &str, usage: BufferUsage, data: &[u8]) -> Result<Buffer> {
    if data.is_empty() {
        engine_error!("lumen::vulkan", "Refusing to upload empty buffer '{}'", name);
        return Err(Error::InvalidResource(format!("Buffer '{}' has no data", name)));
    }
    let size = data.len() as u64;

    let staging = create_buffer(
        ctx,
        &format!("{}/staging", name),
        size,
        vk::BufferUsageFlags::TRANSFER_SRC,
        BufferUsage::empty(),
        MemoryLocation::CpuToGpu,
    )?;
    staging.write(0, data)?;

    let buffer = create_buffer(
        ctx,
        name,
        size,
        vk::BufferUsageFlags::TRANSFER_DST | buffer_usage_to_vk(usage) | vk::BufferUsageFlags::TRANSFER_SRC,
        usage,
        MemoryLocation::GpuOnly,
    )?;

    submit_one_shot(ctx, |command_buffer| {
        let region = vk::BufferCopy::default().size(size);
        unsafe {
            ctx.device.cmd_copy_buffer(command_buffer, staging.buffer, buffer.buffer, &[region]);
        }
        Ok(())
    })?;

    engine_trace!("lumen::vulkan", "Uploaded buffer '{}' ({} bytes)", name, size);
    Ok(buffer)
}

/// Copy a device-local buffer into a host-visible readback buffer and return its bytes
pub(crate) fn read_buffer(ctx: &Arc<GpuContext>, source: &Buffer) -> Result<Vec<u8>> {
    let readback = create_buffer(
        ctx,
        "readback",
        source.size,
        vk::BufferUsageFlags::TRANSFER_DST,
        BufferUsage::empty(),
        MemoryLocation::GpuToCpu,
    )?;

    submit_one_shot(ctx, |command_buffer| {
        let region = vk::BufferCopy::default().size(source.size);
        unsafe {
            ctx.device.cmd_copy_buffer(command_buffer, source.buffer, readback.buffer, &[region]);
        }
        Ok(())
    })?;

    readback.read_mapped()
}

// ============================================================================
// Layout transitions
// ============================================================================

/// Access masks and pipeline stages for a supported layout transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TransitionMasks {
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
}

/// Barrier parameters for the transitions the upload path performs
///
/// Any other pair is an error.
pub(crate) fn transition_masks(old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> Result<TransitionMasks> {
    match (old_layout, new_layout) {
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => Ok(TransitionMasks {
            src_access: vk::AccessFlags::empty(),
            dst_access: vk::AccessFlags::TRANSFER_WRITE,
            src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
            dst_stage: vk::PipelineStageFlags::TRANSFER,
        }),
        (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => Ok(TransitionMasks {
            src_access: vk::AccessFlags::TRANSFER_WRITE,
            dst_access: vk::AccessFlags::SHADER_READ,
            src_stage: vk::PipelineStageFlags::TRANSFER,
            dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
        }),
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL) => Ok(TransitionMasks {
            src_access: vk::AccessFlags::empty(),
            dst_access: vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
            dst_stage: vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        }),
        (old, new) => Err(engine_err!(
            "lumen::vulkan",
            "Unsupported layout transition: {:?} -> {:?}",
            old,
            new
        )),
    }
}

/// Record an image memory barrier moving `image` between layouts
pub(crate) fn cmd_transition_image_layout(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    image: vk::Image,
    aspect_mask: vk::ImageAspectFlags,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) -> Result<()> {
    let masks = transition_masks(old_layout, new_layout)?;

    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        })
        .src_access_mask(masks.src_access)
        .dst_access_mask(masks.dst_access);

    unsafe {
        device.cmd_pipeline_barrier(
            command_buffer,
            masks.src_stage,
            masks.dst_stage,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    }
    Ok(())
}

// ============================================================================
// Images
// ============================================================================

/// Create a 2D image with one mip level and bind device-local memory to it
fn create_image(
    ctx: &GpuContext,
    name: &str,
    width: u32,
    height: u32,
    format: vk::Format,
    usage: vk::ImageUsageFlags,
) -> Result<(vk::Image, Allocation)> {
    unsafe {
        let image_create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D { width, height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = ctx.device.create_image(&image_create_info, None)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create image '{}': {:?}", name, e))?;

        let requirements = ctx.device.get_image_memory_requirements(image);
        let allocation = match allocate(ctx, name, requirements, MemoryLocation::GpuOnly, false) {
            Ok(allocation) => allocation,
            Err(e) => {
                ctx.device.destroy_image(image, None);
                return Err(e);
            }
        };

        if let Err(e) = ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
            free(ctx, allocation);
            ctx.device.destroy_image(image, None);
            return Err(engine_err!("lumen::vulkan", "Failed to bind memory of image '{}': {:?}", name, e));
        }

        Ok((image, allocation))
    }
}

/// Create a 2D image view over the first mip level and layer
pub(crate) fn create_image_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
    aspect_mask: vk::ImageAspectFlags,
) -> Result<vk::ImageView> {
    let view_create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe {
        device
            .create_image_view(&view_create_info, None)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create image view: {:?}", e))
    }
}

/// Wrap an image and its allocation into a Texture, creating the view
fn finish_texture(
    ctx: &Arc<GpuContext>,
    image: vk::Image,
    allocation: Allocation,
    format: vk::Format,
    aspect_mask: vk::ImageAspectFlags,
    info: TextureInfo,
) -> Result<Texture> {
    match create_image_view(&ctx.device, image, format, aspect_mask) {
        Ok(view) => Ok(Texture::new(Arc::clone(ctx), image, view, allocation, info)),
        Err(e) => {
            free(ctx, allocation);
            unsafe { ctx.device.destroy_image(image, None) };
            Err(e)
        }
    }
}

/// Upload a sampled texture and leave it in `SHADER_READ_ONLY_OPTIMAL`
pub(crate) fn upload_texture(ctx: &Arc<GpuContext>, desc: &TextureDesc) -> Result<Texture> {
    let expected = desc.width as usize * desc.height as usize * 4;
    if desc.width == 0 || desc.height == 0 || desc.data.len() != expected {
        engine_error!(
            "lumen::vulkan",
            "Texture '{}' data is {} bytes, expected {} ({}x{} RGBA8)",
            desc.name, desc.data.len(), expected, desc.width, desc.height
        );
        return Err(Error::InvalidResource(format!(
            "Texture '{}' data is {} bytes, expected {}",
            desc.name,
            desc.data.len(),
            expected
        )));
    }

    let format = texture_format_to_vk(desc.format);
    let staging = create_buffer(
        ctx,
        &format!("{}/staging", desc.name),
        desc.data.len() as u64,
        vk::BufferUsageFlags::TRANSFER_SRC,
        BufferUsage::empty(),
        MemoryLocation::CpuToGpu,
    )?;
    staging.write(0, &desc.data)?;

    let (image, allocation) = create_image(
        ctx,
        &desc.name,
        desc.width,
        desc.height,
        format,
        vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
    )?;

    let recorded = submit_one_shot(ctx, |command_buffer| {
        cmd_transition_image_layout(
            &ctx.device,
            command_buffer,
            image,
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )?;

        let region = vk::BufferImageCopy::default()
            .buffer_offset(0)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            })
            .image_offset(vk::Offset3D::default())
            .image_extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 });

        unsafe {
            ctx.device.cmd_copy_buffer_to_image(
                command_buffer,
                staging.buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
        }

        cmd_transition_image_layout(
            &ctx.device,
            command_buffer,
            image,
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )
    });
    if let Err(e) = recorded {
        free(ctx, allocation);
        unsafe { ctx.device.destroy_image(image, None) };
        return Err(e);
    }

    finish_texture(
        ctx,
        image,
        allocation,
        format,
        vk::ImageAspectFlags::COLOR,
        TextureInfo { width: desc.width, height: desc.height, format: desc.format },
    )
}

/// Create the depth attachment for a swapchain extent and move it to
/// `DEPTH_STENCIL_ATTACHMENT_OPTIMAL`
pub(crate) fn create_depth_attachment(
    ctx: &Arc<GpuContext>,
    width: u32,
    height: u32,
    format: vk::Format,
    engine_format: TextureFormat,
) -> Result<Texture> {
    let (image, allocation) = create_image(
        ctx,
        "depth_attachment",
        width,
        height,
        format,
        vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
    )?;

    let barrier_aspect = if has_stencil_component(format) {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else {
        vk::ImageAspectFlags::DEPTH
    };

    let recorded = submit_one_shot(ctx, |command_buffer| {
        cmd_transition_image_layout(
            &ctx.device,
            command_buffer,
            image,
            barrier_aspect,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        )
    });
    if let Err(e) = recorded {
        free(ctx, allocation);
        unsafe { ctx.device.destroy_image(image, None) };
        return Err(e);
    }

    finish_texture(
        ctx,
        image,
        allocation,
        format,
        vk::ImageAspectFlags::DEPTH,
        TextureInfo { width, height, format: engine_format },
    )
}

#[cfg(test)]
#[path = "vulkan_upload_tests.rs"]
mod tests;
