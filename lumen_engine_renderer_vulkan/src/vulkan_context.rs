/// GpuContext - device-level state shared by every Vulkan resource
///
/// Buffers and textures hold an `Arc<GpuContext>` so they can release
/// themselves on drop, and the upload path borrows it for one-shot
/// command buffers.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

/// Shared GPU context
///
/// Device and instance destruction is handled by
/// `VulkanGraphicsDevice::drop`, which also drops the allocator before the
/// device goes away.
pub struct GpuContext {
    /// Logical device
    pub device: ash::Device,

    /// Released by hand in `VulkanGraphicsDevice::drop`, ahead of `vkDestroyDevice`
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Queue used for frame submission and uploads
    pub graphics_queue: vk::Queue,

    /// Family `graphics_queue` belongs to
    pub graphics_queue_family: u32,

    /// Transient pool for staging copies, locked per upload
    pub upload_command_pool: Mutex<vk::CommandPool>,

    /// Debug utils loader (validation enabled only)
    pub(crate) debug_utils_loader: Option<ash::ext::debug_utils::Instance>,

    /// Debug messenger handle (validation enabled only)
    pub(crate) debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    /// Bundle the handles created during device bring-up. Takes ownership
    /// of the upload pool; the messenger pair is `None` without validation.
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        upload_command_pool: vk::CommandPool,
        debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
        debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(allocator),
            graphics_queue,
            graphics_queue_family,
            upload_command_pool: Mutex::new(upload_command_pool),
            debug_utils_loader,
            debug_messenger,
        }
    }
}
