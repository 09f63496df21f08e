/// Mock graphics device for unit tests (no GPU required)
///
/// Every device and command-list call is appended to a shared call log so
/// tests can assert on exact ordering. Acquire and present outcomes are
/// scripted per call; uploaded bytes are kept so buffers can be read back.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{
    AcquireOutcome, Buffer, BufferUsage, ClearValue, CommandList, DeviceInfo, DeviceType,
    Extent2D, FrameUniforms, GraphicsDevice, IndexType, PresentOutcome, PushConstants, Shader,
    ShaderDesc, ShaderStage, SwapchainDesc, SwapchainInfo, Texture, TextureDesc, TextureFormat,
    TextureInfo,
};
use crate::log::{LogEntry, Logger};
use crate::renderer::WindowSurface;

// ============================================================================
// Shared state
// ============================================================================

#[derive(Default)]
pub struct MockState {
    /// Ordered log of every call
    pub calls: Vec<String>,
    /// Outcomes returned by successive acquires (default: acquired, optimal)
    pub acquire_script: VecDeque<AcquireOutcome>,
    /// Outcomes returned by successive presents (default: presented)
    pub present_script: VecDeque<PresentOutcome>,
    /// Current swapchain, if one exists
    pub swapchain: Option<SwapchainInfo>,
    pub next_swapchain_handle: u64,
    pub swapchains_created: u32,
    pub image_count: u32,
    pub next_image: u32,
    pub buffers_created: u32,
    /// Names of buffers whose last reference was dropped
    pub buffers_destroyed: Vec<String>,
    /// Uniforms written, with their slot
    pub uniforms: Vec<(usize, FrameUniforms)>,
    /// Push constants recorded, in draw order
    pub push_constants: Vec<PushConstants>,
    pub material_bound: bool,
    /// Fail the next upload with a backend error
    pub fail_next_upload: bool,
}

impl MockState {
    /// Number of calls whose log line starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

fn lock(state: &Arc<Mutex<MockState>>) -> MutexGuard<'_, MockState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    pub name: String,
    pub usage: BufferUsage,
    pub data: Vec<u8>,
    state: Arc<Mutex<MockState>>,
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.calls.push(format!("destroy_buffer:{}", self.name));
        state.buffers_destroyed.push(self.name.clone());
    }
}

// ============================================================================
// Mock Texture / Shader
// ============================================================================

pub struct MockTexture {
    pub name: String,
    pub info: TextureInfo,
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockShader {
    pub name: String,
    pub stage: ShaderStage,
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn push_constant_size(&self) -> u32 {
        match self.stage {
            ShaderStage::Vertex => PushConstants::SIZE,
            ShaderStage::Fragment => 0,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Command List
// ============================================================================

pub struct MockCommandList {
    slot: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockCommandList {
    fn record(&self, call: String) {
        lock(&self.state).calls.push(call);
    }
}

impl CommandList for MockCommandList {
    fn begin_render_pass(&mut self, clear_values: &[ClearValue]) -> Result<()> {
        self.record(format!("begin_render_pass:{}", clear_values.len()));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.record("end_render_pass".to_string());
        Ok(())
    }

    fn bind_pipeline(&mut self) -> Result<()> {
        self.record("bind_pipeline".to_string());
        Ok(())
    }

    fn bind_frame_descriptor_set(&mut self) -> Result<()> {
        self.record(format!("bind_descriptor_set:{}", self.slot));
        Ok(())
    }

    fn push_constants(&mut self, constants: &PushConstants) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push("push_constants".to_string());
        state.push_constants.push(*constants);
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn Buffer, _offset: u64) -> Result<()> {
        let name = buffer
            .as_any()
            .downcast_ref::<MockBuffer>()
            .map(|b| b.name.clone())
            .unwrap_or_default();
        self.record(format!("bind_vertex_buffer:{}", name));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, _offset: u64, index_type: IndexType) -> Result<()> {
        let name = buffer
            .as_any()
            .downcast_ref::<MockBuffer>()
            .map(|b| b.name.clone())
            .unwrap_or_default();
        self.record(format!("bind_index_buffer:{}:{:?}", name, index_type));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.record(format!("draw_indexed:{}:{}:{}", index_count, first_index, vertex_offset));
        Ok(())
    }

    fn native_handle(&self) -> u64 {
        0xC0FFEE + self.slot as u64
    }

    fn end(&mut self) -> Result<()> {
        self.record("end_commands".to_string());
        Ok(())
    }
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

pub struct MockGraphicsDevice {
    pub state: Arc<Mutex<MockState>>,
    info: DeviceInfo,
    frames_in_flight: usize,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::with_frames_in_flight(2)
    }

    pub fn with_frames_in_flight(frames_in_flight: usize) -> Self {
        let state = MockState {
            image_count: 3,
            next_swapchain_handle: 1,
            ..MockState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            info: DeviceInfo {
                name: "Mock GPU".to_string(),
                device_type: DeviceType::Discrete,
                score: 1000,
                max_sampler_anisotropy: 16.0,
            },
            frames_in_flight,
        }
    }

    /// Shared handle for inspecting the device after moving it into a renderer
    pub fn state_handle(&self) -> Arc<Mutex<MockState>> {
        Arc::clone(&self.state)
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    fn record(&self, call: String) {
        lock(&self.state).calls.push(call);
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn device_info(&self) -> &DeviceInfo {
        &self.info
    }

    fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    fn upload_buffer(&mut self, name: &str, usage: BufferUsage, data: &[u8]) -> Result<Arc<dyn Buffer>> {
        {
            let mut state = lock(&self.state);
            state.calls.push(format!("upload_buffer:{}", name));
            if state.fail_next_upload {
                state.fail_next_upload = false;
                drop(state);
                engine_bail!("lumen::MockGraphicsDevice", "Failed to allocate '{}': ERROR_OUT_OF_DEVICE_MEMORY", name);
            }
            state.buffers_created += 1;
        }
        Ok(Arc::new(MockBuffer {
            name: name.to_string(),
            usage,
            data: data.to_vec(),
            state: Arc::clone(&self.state),
        }))
    }

    fn read_buffer(&mut self, buffer: &dyn Buffer) -> Result<Vec<u8>> {
        match buffer.as_any().downcast_ref::<MockBuffer>() {
            Some(mock) => Ok(mock.data.clone()),
            None => engine_bail!("lumen::MockGraphicsDevice", "Buffer is not a mock buffer"),
        }
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        self.record(format!("create_texture:{}", desc.name));
        Ok(Arc::new(MockTexture {
            name: desc.name,
            info: TextureInfo {
                width: desc.width,
                height: desc.height,
                format: desc.format,
            },
        }))
    }

    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn Shader>> {
        self.record(format!("create_shader:{}", desc.name));
        Ok(Arc::new(MockShader {
            name: desc.name,
            stage: desc.stage,
        }))
    }

    fn bind_material_texture(&mut self, _texture: Arc<dyn Texture>) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push("bind_material_texture".to_string());
        state.material_bound = true;
        Ok(())
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<SwapchainInfo> {
        let mut state = lock(&self.state);
        state.calls.push(format!(
            "create_swapchain:{}x{}",
            desc.extent.width, desc.extent.height
        ));
        if state.swapchain.is_some() {
            drop(state);
            engine_bail!("lumen::MockGraphicsDevice", "Swapchain already exists");
        }
        let info = SwapchainInfo {
            handle: state.next_swapchain_handle,
            generation: u64::from(state.swapchains_created) + 1,
            image_count: state.image_count,
            format: TextureFormat::B8G8R8A8_SRGB,
            extent: desc.extent,
            depth_format: TextureFormat::D32_SFLOAT,
        };
        state.next_swapchain_handle += 1;
        state.swapchains_created += 1;
        state.next_image = 0;
        state.swapchain = Some(info);
        Ok(info)
    }

    fn destroy_swapchain(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push("destroy_swapchain".to_string());
        state.swapchain = None;
        Ok(())
    }

    fn wait_for_slot(&mut self, slot: usize) -> Result<()> {
        self.record(format!("wait_for_slot:{}", slot));
        Ok(())
    }

    fn acquire_next_image(&mut self, slot: usize) -> Result<AcquireOutcome> {
        let mut state = lock(&self.state);
        state.calls.push(format!("acquire:{}", slot));
        if state.swapchain.is_none() {
            drop(state);
            engine_bail!("lumen::MockGraphicsDevice", "Acquire without a swapchain");
        }
        let scripted = state.acquire_script.pop_front();
        let outcome = match scripted {
            Some(outcome) => outcome,
            None => {
                let image_index = state.next_image;
                state.next_image = (state.next_image + 1) % state.image_count.max(1);
                AcquireOutcome::Acquired {
                    image_index,
                    suboptimal: false,
                }
            }
        };
        Ok(outcome)
    }

    fn begin_commands(&mut self, slot: usize, image_index: u32) -> Result<Box<dyn CommandList + '_>> {
        self.record(format!("begin_commands:{}:{}", slot, image_index));
        Ok(Box::new(MockCommandList {
            slot,
            state: Arc::clone(&self.state),
        }))
    }

    fn write_frame_uniforms(&mut self, slot: usize, uniforms: &FrameUniforms) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(format!("write_uniforms:{}", slot));
        state.uniforms.push((slot, *uniforms));
        Ok(())
    }

    fn submit(&mut self, slot: usize) -> Result<()> {
        self.record(format!("submit:{}", slot));
        Ok(())
    }

    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome> {
        let mut state = lock(&self.state);
        state.calls.push(format!("present:{}:{}", slot, image_index));
        Ok(state.present_script.pop_front().unwrap_or(PresentOutcome::Presented))
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.record("wait_idle".to_string());
        Ok(())
    }
}

// ============================================================================
// Mock Window
// ============================================================================

#[derive(Default)]
pub struct MockWindowState {
    pub size: Extent2D,
    /// Sizes adopted one by one on each `wait_events`
    pub pending_sizes: VecDeque<Extent2D>,
    pub waits: u32,
    /// Behave like a window whose events only the application loop can pump
    pub detached: bool,
}

#[derive(Clone)]
pub struct MockWindow {
    pub state: Arc<Mutex<MockWindowState>>,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockWindowState {
                size: Extent2D::new(width, height),
                ..MockWindowState::default()
            })),
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.lock().size = Extent2D::new(width, height);
    }

    pub fn lock(&self) -> MutexGuard<'_, MockWindowState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl WindowSurface for MockWindow {
    fn framebuffer_size(&self) -> Extent2D {
        self.lock().size
    }

    fn wait_events(&mut self) -> bool {
        let mut state = self.lock();
        state.waits += 1;
        if state.detached {
            return false;
        }
        if let Some(size) = state.pending_sizes.pop_front() {
            state.size = size;
        }
        true
    }
}

// ============================================================================
// Capturing Logger
// ============================================================================

/// Logger that stores entries for later inspection
pub struct CapturingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CapturingLogger {
    pub fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                entries: Arc::clone(&entries),
            },
            entries,
        )
    }
}

impl Logger for CapturingLogger {
    fn log(&self, entry: &LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
