/// winit adapter for the engine's WindowSurface collaborator

use lumen_engine::lumen::render::{Extent2D, WindowSurface};
use std::sync::Arc;
use winit::window::Window;

/// Window surface backed by a shared winit window
///
/// The window must outlive the `VulkanGraphicsDevice` created from it, which
/// holding the same `Arc` guarantees.
#[derive(Clone)]
pub struct WinitWindowSurface {
    window: Arc<Window>,
}

impl WinitWindowSurface {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl WindowSurface for WinitWindowSurface {
    fn framebuffer_size(&self) -> Extent2D {
        let size = self.window.inner_size();
        Extent2D::new(size.width, size.height)
    }

    /// The application's `ApplicationHandler` drives the winit event loop,
    /// so nothing can be pumped from inside a frame. A minimized window hands
    /// control back and the swapchain rebuild is retried on a later frame.
    fn wait_events(&mut self) -> bool {
        false
    }
}
