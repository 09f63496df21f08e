/// Buffer - Vulkan implementation of the engine Buffer trait

use lumen_engine::lumen::{
    Result,
    Error,
    render::{Buffer as EngineBuffer, BufferUsage},
};
use lumen_engine::engine_error;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan buffer implementation
pub struct Buffer {
    /// Shared GPU context (device, allocator, queue, command pool)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Buffer size
    pub(crate) size: u64,
    /// Engine-side usage
    usage: BufferUsage,
}

impl Buffer {
    /// Wrap an already bound Vulkan buffer
    pub fn new(
        ctx: Arc<GpuContext>,
        buffer: vk::Buffer,
        allocation: Allocation,
        size: u64,
        usage: BufferUsage,
    ) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
            usage,
        }
    }

    /// Copy `data` into host-visible memory at `offset`
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            engine_error!("lumen::vulkan", "Buffer write out of range: {} + {} > {}", offset, data.len(), self.size);
            return Err(Error::InvalidResource(format!(
                "Buffer write out of range ({} + {} > {})",
                offset,
                data.len(),
                self.size
            )));
        }

        unsafe {
            let allocation = self.allocation.as_ref().ok_or_else(|| {
                engine_error!("lumen::vulkan", "Buffer write failed: no GPU allocation");
                Error::BackendError("Buffer has no allocation".to_string())
            })?;

            let mapped_ptr = allocation
                .mapped_ptr()
                .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?
                .as_ptr() as *mut u8;

            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
        }
        Ok(())
    }

    /// Read the whole buffer from host-visible memory
    pub fn read_mapped(&self) -> Result<Vec<u8>> {
        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| Error::BackendError("Buffer has no allocation".to_string()))?;
        let slice = allocation
            .mapped_slice()
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?;
        Ok(slice[..self.size as usize].to_vec())
    }
}

impl EngineBuffer for Buffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}

/// Downcast an engine buffer to the Vulkan implementation
pub(crate) fn as_vulkan_buffer(buffer: &dyn EngineBuffer) -> Result<&Buffer> {
    buffer.as_any().downcast_ref::<Buffer>().ok_or_else(|| {
        engine_error!("lumen::vulkan", "Buffer was not created by the Vulkan backend");
        Error::InvalidResource("Buffer was not created by the Vulkan backend".to_string())
    })
}
