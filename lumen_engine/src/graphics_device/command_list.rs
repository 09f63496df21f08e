/// CommandList trait - records one frame into the current slot's command buffer

use crate::error::Result;
use crate::graphics_device::{Buffer, IndexType, PushConstants};

/// Command list for the frame being recorded
///
/// Obtained from `GraphicsDevice::begin_commands` once per iteration. The
/// backend already knows the slot, the acquired image's framebuffer, the
/// render pass and the single graphics pipeline, so the recorder only
/// expresses *what* to draw.
pub trait CommandList {
    /// Begin the render pass targeting the acquired swapchain image
    ///
    /// # Arguments
    ///
    /// * `clear_values` - Color clear value followed by depth/stencil clear value
    fn begin_render_pass(&mut self, clear_values: &[ClearValue]) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Bind the graphics pipeline
    fn bind_pipeline(&mut self) -> Result<()>;

    /// Bind the current slot's descriptor set (frame uniforms + material texture)
    fn bind_frame_descriptor_set(&mut self) -> Result<()>;

    /// Push per-draw constants to the vertex stage
    fn push_constants(&mut self, constants: &PushConstants) -> Result<()>;

    /// Bind a vertex buffer at binding 0
    fn bind_vertex_buffer(&mut self, buffer: &dyn Buffer, offset: u64) -> Result<()>;

    /// Bind an index buffer
    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType) -> Result<()>;

    /// Draw indexed vertices (one instance)
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `first_index` - Index of first index
    /// * `vertex_offset` - Value added to vertex index before indexing into the vertex buffer
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Raw backend command buffer handle, for overlays that record directly
    fn native_handle(&self) -> u64;

    /// Finish recording
    fn end(&mut self) -> Result<()>;
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}
