/// Swapchain lifecycle state machine
///
/// ```text
/// Uninitialized ──initialize──▶ Ready ──invalidate──▶ Invalidated
///                                 ▲                        │
///                                 └────────rebuild─────────┘
///           any ──destroy──▶ Destroyed
/// ```
///
/// A rebuild always destroys every swapchain-dependent object on the device
/// before creating new ones; nothing is reused across builds.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{Extent2D, GraphicsDevice, Shader, SwapchainDesc, SwapchainInfo};
use crate::renderer::WindowSurface;
use crate::{engine_debug, engine_error, engine_info};

const SOURCE: &str = "lumen::SwapchainManager";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainState {
    Uninitialized,
    Ready,
    Invalidated,
    Destroyed,
}

pub struct SwapchainManager {
    state: SwapchainState,
    info: Option<SwapchainInfo>,
    vertex_shader: Arc<dyn Shader>,
    fragment_shader: Arc<dyn Shader>,
    rebuild_count: u32,
}

impl SwapchainManager {
    pub fn new(vertex_shader: Arc<dyn Shader>, fragment_shader: Arc<dyn Shader>) -> Self {
        Self {
            state: SwapchainState::Uninitialized,
            info: None,
            vertex_shader,
            fragment_shader,
            rebuild_count: 0,
        }
    }

    pub fn state(&self) -> SwapchainState {
        self.state
    }

    /// Properties of the current build (None before the first build and after destroy)
    pub fn info(&self) -> Option<&SwapchainInfo> {
        self.info.as_ref()
    }

    /// Number of completed rebuilds
    pub fn rebuild_count(&self) -> u32 {
        self.rebuild_count
    }

    /// First build: `Uninitialized → Ready`
    pub fn initialize(
        &mut self,
        device: &mut dyn GraphicsDevice,
        window: &mut dyn WindowSurface,
    ) -> Result<SwapchainInfo> {
        if self.state != SwapchainState::Uninitialized {
            engine_error!(SOURCE, "initialize called in state {:?}", self.state);
            return Err(Error::InitializationFailed(format!(
                "Swapchain cannot be initialized in state {:?}",
                self.state
            )));
        }
        let Some(extent) = wait_for_drawable_size(window) else {
            engine_error!(SOURCE, "Window has no drawable size");
            return Err(Error::InitializationFailed(
                "Window has no drawable size".to_string(),
            ));
        };
        let info = self.build(device, extent)?;
        engine_info!(
            SOURCE,
            "Swapchain created: {} images, {:?}, {}x{}",
            info.image_count,
            info.format,
            info.extent.width,
            info.extent.height
        );
        Ok(info)
    }

    /// `Ready → Invalidated`; no-op in any other state
    pub fn invalidate(&mut self) {
        if self.state == SwapchainState::Ready {
            engine_debug!(SOURCE, "Swapchain invalidated");
            self.state = SwapchainState::Invalidated;
        }
    }

    /// `Invalidated → Ready`
    ///
    /// Blocks while the window is minimized, waits for the device to go
    /// idle, destroys all swapchain-dependent state and recreates it for the
    /// current window size. Returns the current build unchanged when the
    /// swapchain is already `Ready`, and `None` (still `Invalidated`, nothing
    /// torn down) when the window is minimized and cannot pump events here.
    pub fn rebuild(
        &mut self,
        device: &mut dyn GraphicsDevice,
        window: &mut dyn WindowSurface,
    ) -> Result<Option<SwapchainInfo>> {
        match self.state {
            SwapchainState::Invalidated => {}
            SwapchainState::Ready => {
                if let Some(info) = self.info {
                    return Ok(Some(info));
                }
            }
            state => {
                engine_error!(SOURCE, "rebuild called in state {:?}", state);
                return Err(Error::InvalidResource(format!(
                    "Swapchain cannot be rebuilt in state {:?}",
                    state
                )));
            }
        }

        let Some(extent) = wait_for_drawable_size(window) else {
            engine_debug!(SOURCE, "Window still minimized, rebuild deferred");
            return Ok(None);
        };
        device.wait_idle()?;
        device.destroy_swapchain()?;
        self.info = None;

        let info = self.build(device, extent)?;
        self.rebuild_count += 1;
        engine_debug!(
            SOURCE,
            "Swapchain rebuilt ({}x{}, rebuild #{})",
            extent.width,
            extent.height,
            self.rebuild_count
        );
        Ok(Some(info))
    }

    /// `any → Destroyed`; the caller guarantees the device is idle
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        if self.state == SwapchainState::Destroyed {
            return Ok(());
        }
        if self.state != SwapchainState::Uninitialized {
            device.destroy_swapchain()?;
        }
        self.info = None;
        self.state = SwapchainState::Destroyed;
        engine_debug!(SOURCE, "Swapchain destroyed");
        Ok(())
    }

    fn build(&mut self, device: &mut dyn GraphicsDevice, extent: Extent2D) -> Result<SwapchainInfo> {
        let desc = SwapchainDesc {
            extent,
            vertex_shader: Arc::clone(&self.vertex_shader),
            fragment_shader: Arc::clone(&self.fragment_shader),
        };
        let info = device.create_swapchain(&desc)?;
        self.info = Some(info);
        self.state = SwapchainState::Ready;
        Ok(info)
    }
}

/// Pump window events until the framebuffer has a non-zero size
///
/// `None` when the window cannot pump events and is still minimized.
fn wait_for_drawable_size(window: &mut dyn WindowSurface) -> Option<Extent2D> {
    let mut extent = window.framebuffer_size();
    if extent.is_empty() {
        engine_info!(SOURCE, "Window minimized, waiting for a drawable size");
        while extent.is_empty() {
            if !window.wait_events() {
                return None;
            }
            extent = window.framebuffer_size();
        }
    }
    Some(extent)
}

#[cfg(test)]
#[path = "swapchain_manager_tests.rs"]
mod tests;
