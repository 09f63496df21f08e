/// Per-slot frame resources
///
/// Each of the N frame slots owns its synchronization objects, a command
/// pool with one primary command buffer, a host-visible uniform buffer and
/// a descriptor set pointing at that buffer and the material texture.

use lumen_engine::lumen::{
    Result,
    render::{BufferUsage, FrameUniforms},
};
use lumen_engine::engine_err;
use ash::vk;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_upload::create_buffer;

pub(crate) struct FrameSlot {
    /// Signaled by image acquisition, waited on by the submission
    pub image_available: vk::Semaphore,
    /// Signaled when the slot's last submission completes (created signaled)
    pub in_flight: vk::Fence,
    pub command_pool: vk::CommandPool,
    pub command_buffer: vk::CommandBuffer,
    pub uniform_buffer: Option<Buffer>,
    pub descriptor_set: vk::DescriptorSet,
    /// Image the slot is currently recording for
    pub image_index: Option<u32>,
}

impl FrameSlot {
    fn empty() -> Self {
        Self {
            image_available: vk::Semaphore::null(),
            in_flight: vk::Fence::null(),
            command_pool: vk::CommandPool::null(),
            command_buffer: vk::CommandBuffer::null(),
            uniform_buffer: None,
            descriptor_set: vk::DescriptorSet::null(),
            image_index: None,
        }
    }

    /// Create the resources of slot `index`
    pub(crate) fn create(
        ctx: &Arc<GpuContext>,
        descriptor_pool: vk::DescriptorPool,
        set_layout: vk::DescriptorSetLayout,
        index: usize,
    ) -> Result<Self> {
        let mut slot = Self::empty();
        match slot.build(ctx, descriptor_pool, set_layout, index) {
            Ok(()) => Ok(slot),
            Err(e) => {
                slot.destroy(&ctx.device);
                Err(e)
            }
        }
    }

    fn build(
        &mut self,
        ctx: &Arc<GpuContext>,
        descriptor_pool: vk::DescriptorPool,
        set_layout: vk::DescriptorSetLayout,
        index: usize,
    ) -> Result<()> {
        let device = &ctx.device;
        unsafe {
            self.image_available = device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to create image-available semaphore: {:?}", e))?;

            let fence_create_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
            self.in_flight = device
                .create_fence(&fence_create_info, None)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to create in-flight fence: {:?}", e))?;

            let pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT);
            self.command_pool = device
                .create_command_pool(&pool_create_info, None)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to create frame command pool: {:?}", e))?;

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(self.command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            self.command_buffer = device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to allocate frame command buffer: {:?}", e))?[0];

            let uniform_buffer = create_buffer(
                ctx,
                &format!("frame{}/uniforms", index),
                FrameUniforms::SIZE,
                vk::BufferUsageFlags::UNIFORM_BUFFER,
                BufferUsage::UNIFORM,
                MemoryLocation::CpuToGpu,
            )?;

            let set_layouts = [set_layout];
            let set_allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(descriptor_pool)
                .set_layouts(&set_layouts);
            self.descriptor_set = device
                .allocate_descriptor_sets(&set_allocate_info)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to allocate frame descriptor set: {:?}", e))?[0];

            let buffer_info = [vk::DescriptorBufferInfo {
                buffer: uniform_buffer.buffer,
                offset: 0,
                range: FrameUniforms::SIZE,
            }];
            let write = vk::WriteDescriptorSet::default()
                .dst_set(self.descriptor_set)
                .dst_binding(0)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_info);
            device.update_descriptor_sets(&[write], &[]);

            self.uniform_buffer = Some(uniform_buffer);
        }
        Ok(())
    }

    /// Point binding 1 at the material texture
    pub(crate) fn write_material(&self, device: &ash::Device, view: vk::ImageView, sampler: vk::Sampler) {
        let image_info = [vk::DescriptorImageInfo {
            sampler,
            image_view: view,
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(self.descriptor_set)
            .dst_binding(1)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_info);
        unsafe {
            device.update_descriptor_sets(&[write], &[]);
        }
    }

    /// Destroy the slot's objects (descriptor sets go with their pool)
    pub(crate) fn destroy(&mut self, device: &ash::Device) {
        unsafe {
            self.uniform_buffer = None;
            if self.command_pool != vk::CommandPool::null() {
                device.destroy_command_pool(self.command_pool, None);
                self.command_pool = vk::CommandPool::null();
                self.command_buffer = vk::CommandBuffer::null();
            }
            if self.in_flight != vk::Fence::null() {
                device.destroy_fence(self.in_flight, None);
                self.in_flight = vk::Fence::null();
            }
            if self.image_available != vk::Semaphore::null() {
                device.destroy_semaphore(self.image_available, None);
                self.image_available = vk::Semaphore::null();
            }
        }
    }
}
