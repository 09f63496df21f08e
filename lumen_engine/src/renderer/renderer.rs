/// Renderer - owns the device, the swapchain lifecycle, the mesh registry and
/// the frame loop
///
/// Construction resolves every startup asset; `activate` builds the first
/// swapchain and attaches the renderer to the frame loop. Collaborators are
/// passed in explicitly: the renderer performs no global lookups.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, Config, DeviceInfo, GraphicsDevice, ShaderDesc, ShaderStage, SwapchainInfo, Texture,
    TextureDesc,
};
use crate::renderer::{
    CommandRecorder, FrameContext, FrameOutcome, FrameScheduler, MeshRegistry, OverlayRenderer,
    RendererStats, SwapchainManager, SwapchainState, WindowSurface,
};
use crate::resource::{require_shader, require_texture, AssetSource, MeshAsset, MeshInstanceId};
use crate::scene::SceneView;
use crate::utils::MeshIdAllocator;
use crate::{engine_error, engine_info};

const SOURCE: &str = "lumen::Renderer";

pub struct Renderer {
    // Field order is drop order: GPU resources go before the device
    registry: MeshRegistry,
    recorder: CommandRecorder,
    swapchain: SwapchainManager,
    material: Arc<dyn Texture>,
    scheduler: FrameScheduler,
    ids: MeshIdAllocator,
    stats: RendererStats,
    config: Config,
    shut_down: bool,
    window: Box<dyn WindowSurface>,
    device: Box<dyn GraphicsDevice>,
}

impl Renderer {
    /// Load startup assets onto `device`
    ///
    /// Fails with `AssetMissing` if a configured shader or texture is not
    /// provided by `assets`.
    pub fn new(
        mut device: Box<dyn GraphicsDevice>,
        window: Box<dyn WindowSurface>,
        assets: &dyn AssetSource,
        config: Config,
    ) -> Result<Self> {
        if config.frames_in_flight != device.frames_in_flight() {
            engine_error!(
                SOURCE,
                "Config requests {} frames in flight, device has {}",
                config.frames_in_flight,
                device.frames_in_flight()
            );
            return Err(Error::InitializationFailed(format!(
                "frames_in_flight mismatch: config {}, device {}",
                config.frames_in_flight,
                device.frames_in_flight()
            )));
        }
        let scheduler = FrameScheduler::new(config.frames_in_flight)?;

        let vertex_shader = device.create_shader(ShaderDesc {
            name: config.vertex_shader.clone(),
            code: require_shader(assets, &config.vertex_shader)?,
            stage: ShaderStage::Vertex,
            entry_point: "main".to_string(),
        })?;
        let fragment_shader = device.create_shader(ShaderDesc {
            name: config.fragment_shader.clone(),
            code: require_shader(assets, &config.fragment_shader)?,
            stage: ShaderStage::Fragment,
            entry_point: "main".to_string(),
        })?;

        let pixels = require_texture(assets, &config.texture)?;
        let material = device.create_texture(TextureDesc::from_pixels(
            &config.texture,
            pixels.width,
            pixels.height,
            pixels.channels,
            &pixels.pixels,
        )?)?;
        device.bind_material_texture(Arc::clone(&material))?;

        engine_info!(
            SOURCE,
            "Renderer ready on '{}' ({} frames in flight)",
            device.device_info().name,
            config.frames_in_flight
        );

        Ok(Self {
            registry: MeshRegistry::new(),
            recorder: CommandRecorder::new(config.clear_color),
            swapchain: SwapchainManager::new(vertex_shader, fragment_shader),
            material,
            scheduler,
            ids: MeshIdAllocator::new(),
            stats: RendererStats::default(),
            config,
            shut_down: false,
            window,
            device,
        })
    }

    /// Build the first swapchain and attach to the frame loop
    pub fn activate(&mut self) -> Result<SwapchainInfo> {
        self.swapchain
            .initialize(self.device.as_mut(), self.window.as_mut())
    }

    /// Run one frame-loop iteration against `scene`
    pub fn render_frame(&mut self, scene: &dyn SceneView) -> Result<FrameOutcome> {
        if self.shut_down {
            return Err(Error::InvalidResource("Renderer has been shut down".to_string()));
        }
        if self.swapchain.state() == SwapchainState::Uninitialized {
            engine_error!(SOURCE, "render_frame called before activate");
            return Err(Error::InvalidResource(
                "render_frame called before activate".to_string(),
            ));
        }

        let ctx = FrameContext {
            device: self.device.as_mut(),
            window: self.window.as_mut(),
            swapchain: &mut self.swapchain,
            registry: &mut self.registry,
            recorder: &mut self.recorder,
        };
        let (outcome, stats) = self.scheduler.render_iteration(ctx, scene)?;
        if outcome != FrameOutcome::Skipped {
            self.stats = stats;
        }
        Ok(outcome)
    }

    /// Allocate a mesh instance ID and register it for `asset`
    pub fn create_mesh_instance(&mut self, asset: &MeshAsset) -> Result<MeshInstanceId> {
        let id = self.ids.allocate()?;
        self.registry
            .register_mesh(self.device.as_mut(), asset, id)?;
        Ok(id)
    }

    /// Release a mesh instance; its GPU buffers go away once no frame can read them
    pub fn destroy_mesh_instance(&mut self, id: MeshInstanceId) {
        self.registry.unregister_mesh(id);
    }

    /// Flag a framebuffer resize (called from the window event handler)
    pub fn notify_framebuffer_resized(&mut self) {
        self.scheduler.notify_framebuffer_resized();
    }

    pub fn set_overlay(&mut self, overlay: Option<Box<dyn OverlayRenderer>>) {
        self.recorder.set_overlay(overlay);
    }

    /// Vertex and index buffers currently backing `id`
    pub fn mesh_buffers(&self, id: MeshInstanceId) -> Option<(Arc<dyn Buffer>, Arc<dyn Buffer>)> {
        self.registry
            .resolve_mesh(id)
            .map(|entry| (Arc::clone(entry.vertex_buffer()), Arc::clone(entry.index_buffer())))
    }

    /// Copy a buffer back to the host
    pub fn read_buffer(&mut self, buffer: &dyn Buffer) -> Result<Vec<u8>> {
        self.device.read_buffer(buffer)
    }

    /// Draw statistics of the last recorded frame (skipped iterations keep the previous value)
    pub fn stats(&self) -> RendererStats {
        self.stats
    }

    pub fn mesh_entry_count(&self) -> usize {
        self.registry.entry_count()
    }

    pub fn swapchain_state(&self) -> SwapchainState {
        self.swapchain.state()
    }

    pub fn swapchain_info(&self) -> Option<&SwapchainInfo> {
        self.swapchain.info()
    }

    pub fn swapchain_rebuild_count(&self) -> u32 {
        self.swapchain.rebuild_count()
    }

    pub fn current_slot(&self) -> usize {
        self.scheduler.current_slot()
    }

    pub fn device_info(&self) -> &DeviceInfo {
        self.device.device_info()
    }

    pub fn material(&self) -> &Arc<dyn Texture> {
        &self.material
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Wait for the GPU, release every mesh buffer and destroy the swapchain
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.device.wait_idle()?;
        self.registry.release_all();
        self.swapchain.destroy(self.device.as_mut())?;
        engine_info!(SOURCE, "Renderer shut down");
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            engine_error!(SOURCE, "Shutdown failed: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
