/// Frame scheduler - drives one render iteration across N frame slots
///
/// Per iteration:
///
/// 1. wait for the current slot's fence
/// 2. drain the mesh registry's pending deletions
/// 3. acquire an image; out-of-date rebuilds the swapchain and skips the frame
/// 4. record the scene into the slot's command buffer
/// 5. write the slot's frame uniforms
/// 6. reset the fence and submit
/// 7. present; suboptimal, out-of-date or a pending resize rebuilds the swapchain
/// 8. advance to the next slot
///
/// Submissions are numbered from 0. Waiting on slot `S % N` after `S`
/// submissions proves every submission below `S - (N - 1)` complete, which
/// is the bound handed to the registry drain.

use glam::{Mat4, Vec3};

use crate::error::{Error, Result};
use crate::graphics_device::{AcquireOutcome, Extent2D, FrameUniforms, GraphicsDevice, PresentOutcome};
use crate::renderer::{CommandRecorder, MeshRegistry, RendererStats, SwapchainManager, SwapchainState, WindowSurface};
use crate::scene::{perspective, SceneView};
use crate::{engine_debug, engine_error, engine_trace};

const SOURCE: &str = "lumen::FrameScheduler";

/// How an iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Frame presented, swapchain still valid
    Presented,
    /// Frame presented, swapchain rebuilt afterwards
    Suboptimal,
    /// Acquire reported out-of-date: swapchain rebuilt, nothing drawn
    Skipped,
}

/// Borrowed renderer state one iteration operates on
pub struct FrameContext<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub window: &'a mut dyn WindowSurface,
    pub swapchain: &'a mut SwapchainManager,
    pub registry: &'a mut MeshRegistry,
    pub recorder: &'a mut CommandRecorder,
}

pub struct FrameScheduler {
    frames_in_flight: usize,
    current_slot: usize,
    submitted: u64,
    framebuffer_resized: bool,
}

impl FrameScheduler {
    pub fn new(frames_in_flight: usize) -> Result<Self> {
        if frames_in_flight == 0 {
            engine_error!(SOURCE, "frames_in_flight must be at least 1");
            return Err(Error::InitializationFailed(
                "frames_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            frames_in_flight,
            current_slot: 0,
            submitted: 0,
            framebuffer_resized: false,
        })
    }

    pub fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    /// Number of command buffers submitted so far
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Submissions known complete once the current slot's fence has signaled
    pub fn completed_after_slot_wait(&self) -> u64 {
        self.submitted.saturating_sub(self.frames_in_flight as u64 - 1)
    }

    /// Flag the swapchain for rebuild after the next present
    pub fn notify_framebuffer_resized(&mut self) {
        self.framebuffer_resized = true;
    }

    pub fn framebuffer_resized(&self) -> bool {
        self.framebuffer_resized
    }

    fn advance(&mut self) {
        self.current_slot = (self.current_slot + 1) % self.frames_in_flight;
    }

    /// Run one iteration of the frame loop
    pub fn render_iteration(
        &mut self,
        ctx: FrameContext<'_>,
        scene: &dyn SceneView,
    ) -> Result<(FrameOutcome, RendererStats)> {
        match ctx.swapchain.state() {
            SwapchainState::Ready => {}
            SwapchainState::Invalidated => {
                if !self.rebuild(ctx.device, ctx.window, ctx.swapchain, ctx.registry)? {
                    return Ok((FrameOutcome::Skipped, RendererStats::default()));
                }
            }
            state => {
                engine_error!(SOURCE, "Cannot render with swapchain in state {:?}", state);
                return Err(Error::InvalidResource(format!(
                    "Cannot render with swapchain in state {:?}",
                    state
                )));
            }
        }

        let slot = self.current_slot;

        // 1-2. Fence wait, then drain
        ctx.device.wait_for_slot(slot)?;
        let report = ctx.registry.drain_pending(self.completed_after_slot_wait());
        if report.dissociated > 0 || report.released > 0 {
            engine_trace!(SOURCE, "Drained pending deletions: {:?}", report);
        }

        // 3. Acquire
        let image_index = match ctx.device.acquire_next_image(slot)? {
            AcquireOutcome::Acquired { image_index, .. } => image_index,
            AcquireOutcome::OutOfDate => {
                engine_debug!(SOURCE, "Acquire reported out-of-date, skipping frame");
                ctx.swapchain.invalidate();
                self.rebuild(ctx.device, ctx.window, ctx.swapchain, ctx.registry)?;
                return Ok((FrameOutcome::Skipped, RendererStats::default()));
            }
        };

        // 4. Record
        let submission = self.submitted;
        let record = {
            let mut commands = ctx.device.begin_commands(slot, image_index)?;
            ctx.recorder
                .record_frame(commands.as_mut(), scene, &*ctx.registry)?
        };
        ctx.registry.mark_referenced(&record.referenced, submission);

        // 5. Uniforms
        let extent = ctx
            .swapchain
            .info()
            .map(|info| info.extent)
            .unwrap_or_default();
        ctx.device
            .write_frame_uniforms(slot, &frame_uniforms(scene, extent))?;

        // 6. Submit
        ctx.device.submit(slot)?;
        self.submitted += 1;

        // 7. Present
        let present = ctx.device.present(slot, image_index)?;
        let needs_rebuild = present != PresentOutcome::Presented || self.framebuffer_resized;

        // 8. Advance
        self.advance();

        if !needs_rebuild {
            return Ok((FrameOutcome::Presented, record.stats));
        }

        engine_debug!(
            SOURCE,
            "Rebuilding swapchain after present ({:?}, resized: {})",
            present,
            self.framebuffer_resized
        );
        self.framebuffer_resized = false;
        ctx.swapchain.invalidate();
        self.rebuild(ctx.device, ctx.window, ctx.swapchain, ctx.registry)?;
        Ok((FrameOutcome::Suboptimal, record.stats))
    }

    fn rebuild(
        &mut self,
        device: &mut dyn GraphicsDevice,
        window: &mut dyn WindowSurface,
        swapchain: &mut SwapchainManager,
        registry: &mut MeshRegistry,
    ) -> Result<bool> {
        if swapchain.rebuild(device, window)?.is_none() {
            return Ok(false);
        }
        // The rebuild waited for device idle: every submission is complete
        registry.collect_retired(self.submitted);
        Ok(true)
    }
}

/// View and projection for the frame, from the active camera or a fixed fallback
pub fn frame_uniforms(scene: &dyn SceneView, extent: Extent2D) -> FrameUniforms {
    let aspect_ratio = extent.aspect_ratio();
    match scene.active_camera() {
        Some(camera) => FrameUniforms {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(aspect_ratio),
        },
        None => FrameUniforms {
            view: Mat4::look_at_rh(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, Vec3::Y),
            projection: perspective(45.0, aspect_ratio, 0.1, 10.0),
        },
    }
}

#[cfg(test)]
#[path = "frame_scheduler_tests.rs"]
mod tests;
