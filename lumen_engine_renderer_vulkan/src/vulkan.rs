/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait

use lumen_engine::lumen::{Result, Error};
use lumen_engine::lumen::render::{
    AcquireOutcome, Buffer as EngineBuffer, BufferUsage, CommandList as EngineCommandList, Config,
    DeviceInfo, FrameUniforms, GraphicsDevice, PresentOutcome, Shader as EngineShader, ShaderDesc,
    SwapchainDesc, SwapchainInfo, Texture as EngineTexture, TextureDesc, score_device, select_device,
};
use ash::vk;
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use lumen_engine::{engine_debug, engine_info, engine_warn, engine_error, engine_err};

use crate::vulkan_buffer::as_vulkan_buffer;
use crate::vulkan_command_list::{CommandList, FrameTargets};
use crate::vulkan_context::GpuContext;
use crate::vulkan_device_selection::{describe_physical_device, find_depth_format, REQUIRED_DEVICE_EXTENSIONS};
use crate::vulkan_frame::FrameSlot;
use crate::vulkan_pipeline::create_frame_set_layout;
use crate::vulkan_sampler::create_material_sampler;
use crate::vulkan_shader::{as_vulkan_shader, Shader};
use crate::vulkan_swapchain::{SwapchainBuilder, SwapchainResources};
use crate::vulkan_texture::as_vulkan_texture;
use crate::vulkan_upload;

/// Vulkan graphics device
///
/// Owns the instance, the window surface, the logical device, the per-slot
/// frame resources and, between `create_swapchain` and `destroy_swapchain`,
/// the swapchain-dependent state. The window the device was created from
/// must outlive it.
pub struct VulkanGraphicsDevice {
    /// Vulkan entry (keeps the loader alive)
    _entry: ash::Entry,
    instance: ash::Instance,
    surface_loader: ash::khr::surface::Instance,
    /// Window surface (lives as long as the device)
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
    /// Logical device reference (also stored in GpuContext)
    device: ash::Device,
    /// Present queue (may be same as graphics)
    present_queue: vk::Queue,
    swapchain_loader: ash::khr::swapchain::Device,

    device_info: DeviceInfo,
    depth_format: vk::Format,
    acquire_timeout_ns: u64,
    fence_timeout_ns: u64,
    /// Swapchains built so far
    swapchain_generation: u64,

    /// Layout of the per-slot descriptor set (uniforms + material)
    set_layout: vk::DescriptorSetLayout,
    descriptor_pool: vk::DescriptorPool,
    sampler: vk::Sampler,
    frames: Vec<FrameSlot>,
    /// Texture referenced by every slot's descriptor set
    material: Option<Arc<dyn EngineTexture>>,

    swapchain: Option<SwapchainResources>,

    /// Shared GPU context for all resources (buffers, textures)
    gpu_context: Arc<GpuContext>,
}

impl VulkanGraphicsDevice {
    /// Create the instance, pick a physical device and build the logical device
    ///
    /// # Arguments
    ///
    /// * `window` - Window for surface creation
    /// * `config` - Renderer configuration
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        if config.frames_in_flight == 0 {
            engine_error!("lumen::vulkan", "frames_in_flight must be at least 1");
            return Err(Error::InitializationFailed("frames_in_flight must be at least 1".to_string()));
        }

        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("lumen::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| Error::InitializationFailed(format!("Invalid application name: {}", e)))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Lumen")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle()
                .map_err(|e| {
                    engine_error!("lumen::vulkan", "Failed to get display handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get display handle: {}", e))
                })?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    engine_error!("lumen::vulkan", "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?
                .to_vec();

            if config.enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if config.enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!("lumen::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            // Validation messages go to the engine logger
            let (debug_utils_loader, debug_messenger) = if config.enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);

                crate::debug::init_debug_config(crate::debug::Config {
                    severity: config.debug_severity,
                });

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(crate::debug::severity_flags(config.debug_severity))
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                let messenger = debug_utils
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        engine_error!("lumen::vulkan", "Failed to create debug messenger: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
                    })?;

                (Some(debug_utils), Some(messenger))
            } else {
                (None, None)
            };

            let window_handle = window.window_handle()
                .map_err(|e| {
                    engine_error!("lumen::vulkan", "Failed to get window handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get window handle: {}", e))
                })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!("lumen::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            // Score every physical device and keep the best one
            let physical_devices = instance
                .enumerate_physical_devices()
                .map_err(|e| {
                    engine_error!("lumen::vulkan", "Failed to enumerate physical devices: {:?}", e);
                    Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
                })?;

            let candidates = physical_devices
                .iter()
                .map(|&pd| describe_physical_device(&instance, &surface_loader, surface, pd))
                .collect::<Result<Vec<_>>>()?;
            let selected = select_device(&candidates)?;
            let physical_device = physical_devices[selected];
            let candidate = &candidates[selected];

            let properties = instance.get_physical_device_properties(physical_device);
            let device_info = DeviceInfo {
                name: candidate.name.clone(),
                device_type: candidate.device_type,
                score: score_device(candidate),
                max_sampler_anisotropy: properties.limits.max_sampler_anisotropy,
            };
            engine_info!(
                "lumen::vulkan",
                "Selected GPU '{}' ({:?}, score {})",
                device_info.name,
                device_info.device_type,
                device_info.score
            );

            let families = candidate.queue_families;
            let (graphics_family_index, present_family_index) = match (families.graphics, families.present) {
                (Some(graphics), Some(present)) => (graphics, present),
                _ => {
                    engine_error!("lumen::vulkan", "Selected device lacks graphics or present queue");
                    return Err(Error::NoSuitableDevice("missing graphics or present queue".to_string()));
                }
            };

            let queue_priorities = [1.0];
            let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = families
                .unique_families()
                .into_iter()
                .map(|family| {
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(family)
                        .queue_priorities(&queue_priorities)
                })
                .collect();

            let device_extension_names: Vec<*const std::ffi::c_char> =
                REQUIRED_DEVICE_EXTENSIONS.iter().map(|ext| ext.as_ptr()).collect();

            let device_features = vk::PhysicalDeviceFeatures::default()
                .sampler_anisotropy(true);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!("lumen::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);
            let present_queue = device.get_device_queue(present_family_index, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_error!("lumen::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            // TRANSIENT + RESET for reusable one-shot uploads
            let upload_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let upload_command_pool = device.create_command_pool(&upload_pool_create_info, None)
                .map_err(|e| {
                    engine_error!("lumen::vulkan", "Failed to create upload command pool: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create upload command pool: {:?}", e))
                })?;

            let gpu_context = Arc::new(GpuContext::new(
                device.clone(),
                Arc::new(Mutex::new(allocator)),
                graphics_queue,
                graphics_family_index,
                upload_command_pool,
                debug_utils_loader,
                debug_messenger,
            ));

            let depth_format = find_depth_format(&instance, physical_device)?;
            let set_layout = create_frame_set_layout(&device)?;
            let descriptor_pool = Self::create_descriptor_pool(&device, config.frames_in_flight as u32)?;
            let sampler = create_material_sampler(&device, device_info.max_sampler_anisotropy)?;

            let frames = (0..config.frames_in_flight)
                .map(|index| FrameSlot::create(&gpu_context, descriptor_pool, set_layout, index))
                .collect::<Result<Vec<_>>>()?;

            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);

            engine_debug!(
                "lumen::vulkan",
                "Device ready: {} frame slot(s), depth format {:?}",
                frames.len(),
                depth_format
            );

            Ok(Self {
                _entry: entry,
                instance,
                surface_loader,
                surface,
                physical_device,
                device,
                present_queue,
                swapchain_loader,
                device_info,
                depth_format,
                acquire_timeout_ns: config.acquire_timeout_ns,
                swapchain_generation: 0,
                fence_timeout_ns: config.fence_timeout_ns,
                set_layout,
                descriptor_pool,
                sampler,
                frames,
                material: None,
                swapchain: None,
                gpu_context,
            })
        }
    }

    /// Descriptor pool sized for one frame set per slot
    fn create_descriptor_pool(device: &ash::Device, slots: u32) -> Result<vk::DescriptorPool> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: slots,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: slots,
            },
        ];
        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(slots);

        unsafe {
            device.create_descriptor_pool(&info, None)
                .map_err(|e| {
                    engine_error!("lumen::vulkan", "Failed to create descriptor pool: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create descriptor pool: {:?}", e))
                })
        }
    }

    fn frame(&self, slot: usize) -> Result<&FrameSlot> {
        self.frames.get(slot).ok_or_else(|| {
            engine_error!("lumen::vulkan", "Frame slot {} out of range (N = {})", slot, self.frames.len());
            Error::InvalidResource(format!("Frame slot {} out of range", slot))
        })
    }

    fn swapchain(&self) -> Result<&SwapchainResources> {
        self.swapchain.as_ref().ok_or_else(|| {
            engine_error!("lumen::vulkan", "No swapchain exists");
            Error::BackendError("No swapchain exists".to_string())
        })
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    fn frames_in_flight(&self) -> usize {
        self.frames.len()
    }

    fn upload_buffer(&mut self, name: &str, usage: BufferUsage, data: &[u8]) -> Result<Arc<dyn EngineBuffer>> {
        let buffer = vulkan_upload::upload_buffer(&self.gpu_context, name, usage, data)?;
        Ok(Arc::new(buffer))
    }

    fn read_buffer(&mut self, buffer: &dyn EngineBuffer) -> Result<Vec<u8>> {
        let buffer = as_vulkan_buffer(buffer)?;
        vulkan_upload::read_buffer(&self.gpu_context, buffer)
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn EngineTexture>> {
        let texture = vulkan_upload::upload_texture(&self.gpu_context, &desc)?;
        engine_debug!("lumen::vulkan", "Created texture '{}' ({}x{})", desc.name, desc.width, desc.height);
        Ok(Arc::new(texture))
    }

    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn EngineShader>> {
        let shader = Shader::new(&self.device, &desc.code, desc.stage, &desc.entry_point)
            .inspect_err(|_| engine_error!("lumen::vulkan", "Shader '{}' could not be created", desc.name))?;
        Ok(Arc::new(shader))
    }

    fn bind_material_texture(&mut self, texture: Arc<dyn EngineTexture>) -> Result<()> {
        let view = as_vulkan_texture(texture.as_ref())?.view;

        // Descriptor sets may not be updated while a submission uses them
        self.wait_idle()?;
        for frame in &self.frames {
            frame.write_material(&self.device, view, self.sampler);
        }
        self.material = Some(texture);
        Ok(())
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<SwapchainInfo> {
        if self.swapchain.is_some() {
            engine_error!("lumen::vulkan", "create_swapchain called while a swapchain exists");
            return Err(Error::InvalidResource("Swapchain already exists".to_string()));
        }

        let vertex_shader = as_vulkan_shader(desc.vertex_shader.as_ref())?;
        let fragment_shader = as_vulkan_shader(desc.fragment_shader.as_ref())?;

        let builder = SwapchainBuilder {
            ctx: &self.gpu_context,
            physical_device: self.physical_device,
            surface: self.surface,
            surface_loader: &self.surface_loader,
            swapchain_loader: &self.swapchain_loader,
            set_layout: self.set_layout,
            depth_format: self.depth_format,
        };
        let mut resources = SwapchainResources::create(&builder, desc.extent, vertex_shader, fragment_shader)?;
        self.swapchain_generation += 1;
        resources.info.generation = self.swapchain_generation;
        let info = resources.info;
        self.swapchain = Some(resources);
        Ok(info)
    }

    fn destroy_swapchain(&mut self) -> Result<()> {
        if let Some(mut resources) = self.swapchain.take() {
            resources.destroy(&self.device, &self.swapchain_loader);
        }
        for frame in &mut self.frames {
            frame.image_index = None;
        }
        Ok(())
    }

    fn wait_for_slot(&mut self, slot: usize) -> Result<()> {
        let fence = self.frame(slot)?.in_flight;
        unsafe {
            match self.device.wait_for_fences(&[fence], true, self.fence_timeout_ns) {
                Ok(()) => Ok(()),
                Err(vk::Result::TIMEOUT) => {
                    engine_error!("lumen::vulkan", "Timed out waiting for frame slot {}", slot);
                    Err(Error::DeviceLost(format!("Timed out waiting for frame slot {}", slot)))
                }
                Err(vk::Result::ERROR_DEVICE_LOST) => {
                    engine_error!("lumen::vulkan", "Device lost while waiting for frame slot {}", slot);
                    Err(Error::DeviceLost(format!("{:?}", vk::Result::ERROR_DEVICE_LOST)))
                }
                Err(e) => Err(engine_err!("lumen::vulkan", "Failed to wait for in-flight fence: {:?}", e)),
            }
        }
    }

    fn acquire_next_image(&mut self, slot: usize) -> Result<AcquireOutcome> {
        let semaphore = self.frame(slot)?.image_available;
        let swapchain = self.swapchain()?.swapchain;
        unsafe {
            match self.swapchain_loader.acquire_next_image(
                swapchain,
                self.acquire_timeout_ns,
                semaphore,
                vk::Fence::null(),
            ) {
                Ok((image_index, suboptimal)) => Ok(AcquireOutcome::Acquired { image_index, suboptimal }),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
                Err(e) => Err(engine_err!("lumen::vulkan", "Failed to acquire swapchain image: {:?}", e)),
            }
        }
    }

    fn begin_commands(&mut self, slot: usize, image_index: u32) -> Result<Box<dyn EngineCommandList + '_>> {
        let resources = self.swapchain()?;
        let framebuffer = *resources.framebuffers.get(image_index as usize).ok_or_else(|| {
            engine_error!("lumen::vulkan", "Image index {} out of range", image_index);
            Error::InvalidResource(format!("Image index {} out of range", image_index))
        })?;
        let frame = self.frame(slot)?;

        let targets = FrameTargets {
            command_buffer: frame.command_buffer,
            render_pass: resources.render_pass,
            framebuffer,
            extent: resources.extent,
            pipeline: resources.pipeline,
            pipeline_layout: resources.pipeline_layout,
            descriptor_set: frame.descriptor_set,
        };

        unsafe {
            self.device
                .reset_command_pool(frame.command_pool, vk::CommandPoolResetFlags::empty())
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to reset frame command pool: {:?}", e))?;
        }
        self.frames[slot].image_index = Some(image_index);

        Ok(Box::new(CommandList::begin(&self.device, targets)?))
    }

    fn write_frame_uniforms(&mut self, slot: usize, uniforms: &FrameUniforms) -> Result<()> {
        let buffer = self.frame(slot)?.uniform_buffer.as_ref().ok_or_else(|| {
            Error::BackendError(format!("Frame slot {} has no uniform buffer", slot))
        })?;
        buffer.write(0, bytemuck::bytes_of(uniforms))
    }

    fn submit(&mut self, slot: usize) -> Result<()> {
        let frame = self.frame(slot)?;
        let image_index = frame.image_index.ok_or_else(|| {
            engine_error!("lumen::vulkan", "Frame slot {} submitted without recorded commands", slot);
            Error::BackendError(format!("Frame slot {} has nothing to submit", slot))
        })?;
        let signal_semaphore = *self
            .swapchain()?
            .render_finished
            .get(image_index as usize)
            .ok_or_else(|| Error::InvalidResource(format!("Image index {} out of range", image_index)))?;

        unsafe {
            self.device
                .reset_fences(&[frame.in_flight])
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to reset in-flight fence: {:?}", e))?;

            let wait_semaphores = [frame.image_available];
            let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
            let command_buffers = [frame.command_buffer];
            let signal_semaphores = [signal_semaphore];

            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            self.device
                .queue_submit(self.gpu_context.graphics_queue, &[submit_info], frame.in_flight)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to submit commands to GPU queue: {:?}", e))?;
        }
        Ok(())
    }

    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome> {
        let resources = self.swapchain()?;
        let wait_semaphore = *resources
            .render_finished
            .get(image_index as usize)
            .ok_or_else(|| Error::InvalidResource(format!("Image index {} out of range", image_index)))?;

        let wait_semaphores = [wait_semaphore];
        let swapchains = [resources.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let outcome = unsafe {
            match self.swapchain_loader.queue_present(self.present_queue, &present_info) {
                Ok(false) => PresentOutcome::Presented,
                Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => PresentOutcome::Suboptimal,
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => PresentOutcome::OutOfDate,
                Err(e) => return Err(engine_err!("lumen::vulkan", "Failed to present swapchain image: {:?}", e)),
            }
        };

        if let Some(frame) = self.frames.get_mut(slot) {
            frame.image_index = None;
        }
        Ok(outcome)
    }

    fn wait_idle(&mut self) -> Result<()> {
        unsafe {
            self.device
                .device_wait_idle()
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to wait idle: {:?}", e))
        }
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // 1. Swapchain-dependent state and the material texture
            if let Some(mut resources) = self.swapchain.take() {
                resources.destroy(&self.device, &self.swapchain_loader);
            }
            self.material = None;

            // 2. Frame slots, sampler, descriptor objects
            for frame in &mut self.frames {
                frame.destroy(&self.device);
            }
            self.frames.clear();
            self.device.destroy_sampler(self.sampler, None);
            self.device.destroy_descriptor_pool(self.descriptor_pool, None);
            self.device.destroy_descriptor_set_layout(self.set_layout, None);

            // 3. Upload command pool
            if let Ok(mut pool) = self.gpu_context.upload_command_pool.lock() {
                if *pool != vk::CommandPool::null() {
                    self.device.destroy_command_pool(*pool, None);
                    *pool = vk::CommandPool::null();
                }
            }

            // 4. Allocator: free VkDeviceMemory pages BEFORE destroying device
            match Arc::get_mut(&mut self.gpu_context) {
                Some(ctx) => ManuallyDrop::drop(&mut ctx.allocator),
                None => engine_warn!(
                    "lumen::vulkan",
                    "GPU resources still referenced at device drop, allocator leaked"
                ),
            }

            // 5. Stop routing validation messages
            crate::debug::cleanup_debug_config();

            // 6. Debug messenger BEFORE device and instance
            if let (Some(debug_utils), Some(messenger)) = (
                &self.gpu_context.debug_utils_loader,
                &self.gpu_context.debug_messenger,
            ) {
                debug_utils.destroy_debug_utils_messenger(*messenger, None);
            }

            // 7. Surface, device and instance
            self.surface_loader.destroy_surface(self.surface, None);
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
