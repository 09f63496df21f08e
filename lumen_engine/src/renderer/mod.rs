/// Renderer module - the frame loop and the GPU state it drives

pub mod command_recorder;
pub mod frame_scheduler;
pub mod mesh_registry;
pub mod renderer;
pub mod swapchain_manager;
pub mod window_surface;

pub use command_recorder::{CommandRecorder, FrameRecord, OverlayRenderer, RendererStats};
pub use frame_scheduler::{frame_uniforms, FrameContext, FrameOutcome, FrameScheduler};
pub use mesh_registry::{DrainReport, GpuMeshEntry, MeshRegistry};
pub use renderer::Renderer;
pub use swapchain_manager::{SwapchainManager, SwapchainState};
pub use window_surface::WindowSurface;
