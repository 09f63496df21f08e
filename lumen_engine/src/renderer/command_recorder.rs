/// Command recorder - turns the live scene into one frame of draw commands

use glam::Vec3;

use crate::error::Result;
use crate::graphics_device::{ClearValue, CommandList, IndexType, PushConstants};
use crate::renderer::MeshRegistry;
use crate::resource::MeshInstanceId;
use crate::scene::SceneView;
use crate::engine_error;

/// Draw statistics of one recorded frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    pub draw_calls: u32,
    /// Renderables skipped because their mesh did not resolve
    pub skipped_draws: u32,
    pub triangles: u64,
}

/// Appends extra commands (typically a UI) after the scene draws,
/// inside the same render pass
pub trait OverlayRenderer {
    fn record(&mut self, commands: &mut dyn CommandList) -> Result<()>;
}

/// Output of `CommandRecorder::record_frame`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRecord {
    pub stats: RendererStats,
    /// Mesh instances whose buffers the frame reads
    pub referenced: Vec<MeshInstanceId>,
}

pub struct CommandRecorder {
    clear_color: [f32; 4],
    overlay: Option<Box<dyn OverlayRenderer>>,
}

impl CommandRecorder {
    pub fn new(clear_color: [f32; 4]) -> Self {
        Self {
            clear_color,
            overlay: None,
        }
    }

    pub fn set_overlay(&mut self, overlay: Option<Box<dyn OverlayRenderer>>) {
        self.overlay = overlay;
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Record the render pass for the current frame and finish the command list
    ///
    /// Renderables whose mesh instance has no registry entry are skipped
    /// with a logged error; the rest of the frame is still recorded.
    pub fn record_frame(
        &mut self,
        commands: &mut dyn CommandList,
        scene: &dyn SceneView,
        registry: &MeshRegistry,
    ) -> Result<FrameRecord> {
        let mut record = FrameRecord::default();

        commands.begin_render_pass(&[
            ClearValue::Color(self.clear_color),
            ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
        ])?;
        commands.bind_pipeline()?;

        let light_position = scene
            .active_camera()
            .map(|camera| camera.transform.position)
            .unwrap_or(Vec3::ZERO);

        for renderable in scene.renderables() {
            if !renderable.visible {
                continue;
            }
            let Some(entry) = registry.resolve_mesh(renderable.mesh_instance) else {
                engine_error!(
                    "lumen::CommandRecorder",
                    "No GPU mesh for {} ('{}'), skipping draw",
                    renderable.mesh_instance,
                    renderable.name
                );
                record.stats.skipped_draws += 1;
                continue;
            };

            commands.bind_vertex_buffer(entry.vertex_buffer().as_ref(), 0)?;
            commands.bind_index_buffer(entry.index_buffer().as_ref(), 0, IndexType::U32)?;
            commands.bind_frame_descriptor_set()?;
            commands.push_constants(&PushConstants::new(
                renderable.transform.model_matrix(),
                renderable.color,
                light_position,
            ))?;
            commands.draw_indexed(entry.index_count(), 0, 0)?;

            record.stats.draw_calls += 1;
            record.stats.triangles += u64::from(entry.index_count() / 3);
            record.referenced.push(renderable.mesh_instance);
        }

        if let Some(overlay) = self.overlay.as_mut() {
            overlay.record(commands)?;
        }

        commands.end_render_pass()?;
        commands.end()?;
        Ok(record)
    }
}

#[cfg(test)]
#[path = "command_recorder_tests.rs"]
mod tests;
