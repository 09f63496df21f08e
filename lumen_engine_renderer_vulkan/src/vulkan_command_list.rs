/// CommandList - Vulkan implementation of the engine CommandList trait

use lumen_engine::lumen::{Result, Error};
use lumen_engine::lumen::render::{
    CommandList as EngineCommandList,
    Buffer as EngineBuffer,
    ClearValue, IndexType, PushConstants,
};
use lumen_engine::engine_err;
use ash::vk;

use crate::vulkan_buffer::as_vulkan_buffer;
use crate::vulkan_format::index_type_to_vk;

/// Handles the command list records against for one frame
pub(crate) struct FrameTargets {
    pub command_buffer: vk::CommandBuffer,
    pub render_pass: vk::RenderPass,
    pub framebuffer: vk::Framebuffer,
    pub extent: vk::Extent2D,
    pub pipeline: vk::Pipeline,
    pub pipeline_layout: vk::PipelineLayout,
    pub descriptor_set: vk::DescriptorSet,
}

/// Vulkan command list implementation
///
/// Borrows the device for the duration of one frame's recording. The
/// command buffer is already in the recording state when this is handed out.
pub struct CommandList<'a> {
    device: &'a ash::Device,
    targets: FrameTargets,
    /// Whether the command list is currently recording
    is_recording: bool,
    /// Whether we're inside a render pass
    in_render_pass: bool,
}

impl<'a> CommandList<'a> {
    /// Reset and begin recording `targets.command_buffer`
    pub(crate) fn begin(device: &'a ash::Device, targets: FrameTargets) -> Result<Self> {
        unsafe {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            device
                .begin_command_buffer(targets.command_buffer, &begin_info)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to begin command buffer: {:?}", e))?;
        }

        Ok(Self {
            device,
            targets,
            is_recording: true,
            in_render_pass: false,
        })
    }

    fn ensure_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        Ok(())
    }

    fn ensure_in_render_pass(&self) -> Result<()> {
        self.ensure_recording()?;
        if !self.in_render_pass {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }
        Ok(())
    }
}

impl EngineCommandList for CommandList<'_> {
    fn begin_render_pass(&mut self, clear_values: &[ClearValue]) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }

        let vk_clear_values: Vec<vk::ClearValue> = clear_values
            .iter()
            .map(|cv| match cv {
                ClearValue::Color(color) => vk::ClearValue {
                    color: vk::ClearColorValue { float32: *color },
                },
                ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue {
                        depth: *depth,
                        stencil: *stencil,
                    },
                },
            })
            .collect();

        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.targets.render_pass)
            .framebuffer(self.targets.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.targets.extent,
            })
            .clear_values(&vk_clear_values);

        unsafe {
            self.device.cmd_begin_render_pass(
                self.targets.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.ensure_in_render_pass()?;
        unsafe {
            self.device.cmd_end_render_pass(self.targets.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn bind_pipeline(&mut self) -> Result<()> {
        self.ensure_in_render_pass()?;
        unsafe {
            self.device.cmd_bind_pipeline(
                self.targets.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.targets.pipeline,
            );
        }
        Ok(())
    }

    fn bind_frame_descriptor_set(&mut self) -> Result<()> {
        self.ensure_in_render_pass()?;
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.targets.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.targets.pipeline_layout,
                0, // first_set
                &[self.targets.descriptor_set],
                &[], // dynamic_offsets
            );
        }
        Ok(())
    }

    fn push_constants(&mut self, constants: &PushConstants) -> Result<()> {
        self.ensure_in_render_pass()?;
        unsafe {
            self.device.cmd_push_constants(
                self.targets.command_buffer,
                self.targets.pipeline_layout,
                vk::ShaderStageFlags::VERTEX,
                0,
                constants.as_bytes(),
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn EngineBuffer, offset: u64) -> Result<()> {
        self.ensure_in_render_pass()?;
        let vk_buffer = as_vulkan_buffer(buffer)?;
        unsafe {
            self.device.cmd_bind_vertex_buffers(
                self.targets.command_buffer,
                0,
                &[vk_buffer.buffer],
                &[offset],
            );
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &dyn EngineBuffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.ensure_in_render_pass()?;
        let vk_buffer = as_vulkan_buffer(buffer)?;
        unsafe {
            self.device.cmd_bind_index_buffer(
                self.targets.command_buffer,
                vk_buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.ensure_in_render_pass()?;
        unsafe {
            self.device.cmd_draw_indexed(
                self.targets.command_buffer,
                index_count,
                1,
                first_index,
                vertex_offset,
                0,
            );
        }
        Ok(())
    }

    fn native_handle(&self) -> u64 {
        vk::Handle::as_raw(self.targets.command_buffer)
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::BackendError("Render pass not ended before ending command list".to_string()));
        }

        unsafe {
            self.device
                .end_command_buffer(self.targets.command_buffer)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to end command buffer: {:?}", e))?;
        }
        self.is_recording = false;
        Ok(())
    }
}
