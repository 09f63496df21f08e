/// Windowing collaborator seen by the swapchain manager

use crate::graphics_device::Extent2D;

/// Window whose surface the swapchain presents to
///
/// Resize notifications are not part of this trait: the platform event
/// pump forwards them to `Renderer::notify_framebuffer_resized`.
pub trait WindowSurface {
    /// Current framebuffer size in pixels (zero while minimized)
    fn framebuffer_size(&self) -> Extent2D;

    /// Block until the platform delivers at least one event
    ///
    /// Returns `false` when events can only be pumped by the application's
    /// own loop; size changes then show up after control returns to it.
    fn wait_events(&mut self) -> bool;
}
