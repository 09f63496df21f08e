/// GraphicsDevice trait - the capability set a rendering backend provides
///
/// The renderer core (mesh registry, swapchain manager, frame scheduler,
/// command recorder) only talks to this trait. Frame slots are addressed by
/// index in `0..frames_in_flight()`.

use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferUsage, CommandList, DeviceType, FrameUniforms, Shader, ShaderDesc, Texture,
    TextureDesc, TextureFormat,
};

// ============================================================================
// Configuration
// ============================================================================

/// Which validation messages are forwarded to the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    ErrorsOnly,
    ErrorsAndWarnings,
    All,
}

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name reported to the driver
    pub app_name: String,
    /// Enable validation layers and the debug message sink
    pub enable_validation: bool,
    /// Validation message filter
    pub debug_severity: DebugSeverity,
    /// Number of frame slots (N)
    pub frames_in_flight: usize,
    /// Timeout for image acquisition in nanoseconds
    pub acquire_timeout_ns: u64,
    /// Timeout for the per-slot fence wait in nanoseconds
    pub fence_timeout_ns: u64,
    /// Color attachment clear value
    pub clear_color: [f32; 4],
    /// Asset name of the mesh vertex shader
    pub vertex_shader: String,
    /// Asset name of the mesh fragment shader
    pub fragment_shader: String,
    /// Asset name of the material texture
    pub texture: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Lumen Application".to_string(),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            frames_in_flight: 2,
            acquire_timeout_ns: u64::MAX,
            fence_timeout_ns: u64::MAX,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            vertex_shader: "shaders/mesh.vert.spv".to_string(),
            fragment_shader: "shaders/mesh.frag.spv".to_string(),
            texture: "textures/default".to_string(),
        }
    }
}

/// Validation message counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

// ============================================================================
// Device / swapchain descriptions
// ============================================================================

/// Properties of the selected physical device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub name: String,
    pub device_type: DeviceType,
    pub score: u32,
    pub max_sampler_anisotropy: f32,
}

/// 2D extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Either dimension is zero (minimized window)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Everything needed to (re)build the swapchain-dependent state
#[derive(Clone)]
pub struct SwapchainDesc {
    /// Requested extent (the window framebuffer size)
    pub extent: Extent2D,
    pub vertex_shader: Arc<dyn Shader>,
    pub fragment_shader: Arc<dyn Shader>,
}

/// Observable result of a swapchain build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainInfo {
    /// Raw backend handle; drivers may hand a freed value back on rebuild
    pub handle: u64,
    /// Build counter of the owning device, distinct for every swapchain it creates
    pub generation: u64,
    pub image_count: u32,
    pub format: TextureFormat,
    pub extent: Extent2D,
    pub depth_format: TextureFormat,
}

/// Result of acquiring a presentable image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Image acquired; `suboptimal` images are still rendered
    Acquired { image_index: u32, suboptimal: bool },
    /// The swapchain no longer matches the surface
    OutOfDate,
}

/// Result of queueing an image for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    Suboptimal,
    OutOfDate,
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Rendering backend capability set
///
/// One production implementation exists per graphics API; tests substitute
/// a mock. Every fallible call maps backend failures to `Error` with the
/// API result code in the message.
pub trait GraphicsDevice {
    /// Properties of the selected physical device
    fn device_info(&self) -> &DeviceInfo;

    /// Number of frame slots
    fn frames_in_flight(&self) -> usize;

    // ===== RESOURCE UPLOAD PATH =====

    /// Upload `data` into a new device-local buffer through a staging buffer
    fn upload_buffer(&mut self, name: &str, usage: BufferUsage, data: &[u8]) -> Result<Arc<dyn Buffer>>;

    /// Copy a buffer's contents back to the host (test harnesses, debugging)
    fn read_buffer(&mut self, buffer: &dyn Buffer) -> Result<Vec<u8>>;

    /// Upload a sampled texture and transition it for shader reads
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a shader module
    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn Shader>>;

    /// Bind the texture sampled by the mesh pipeline into every slot's descriptor set
    fn bind_material_texture(&mut self, texture: Arc<dyn Texture>) -> Result<()>;

    // ===== SWAPCHAIN =====

    /// Build the swapchain and everything that depends on it
    ///
    /// Fails if swapchain state already exists; callers destroy first.
    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<SwapchainInfo>;

    /// Destroy all swapchain-dependent state (no-op when none exists)
    ///
    /// The caller guarantees the device is idle.
    fn destroy_swapchain(&mut self) -> Result<()>;

    // ===== FRAME SLOTS =====

    /// Block until the slot's in-flight fence is signaled
    fn wait_for_slot(&mut self, slot: usize) -> Result<()>;

    /// Acquire the next presentable image, signaling the slot's image-available semaphore
    fn acquire_next_image(&mut self, slot: usize) -> Result<AcquireOutcome>;

    /// Reset the slot's command pool and begin recording for `image_index`
    fn begin_commands(&mut self, slot: usize, image_index: u32) -> Result<Box<dyn CommandList + '_>>;

    /// Write the slot's uniform buffer
    fn write_frame_uniforms(&mut self, slot: usize, uniforms: &FrameUniforms) -> Result<()>;

    /// Reset the slot's fence and submit its command buffer
    fn submit(&mut self, slot: usize) -> Result<()>;

    /// Present `image_index`, waiting on the semaphore signaled by the slot's submission
    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome>;

    /// Block until the device has finished all submitted work
    fn wait_idle(&mut self) -> Result<()>;
}
