/// Physical device queries
///
/// Translates what the driver reports into the engine's `DeviceCandidate`
/// records; the scoring rules themselves live in the engine core.

use lumen_engine::lumen::{
    Error,
    Result,
    render::{find_queue_families, DeviceCandidate, DeviceType, QueueFamilyInfo},
};
use lumen_engine::{engine_err, engine_error};
use ash::vk;
use std::ffi::CStr;

/// Device extensions the renderer cannot run without
pub(crate) const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 1] = [ash::khr::swapchain::NAME];

/// Depth formats in order of preference
pub(crate) const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

pub(crate) fn device_type_from_vk(device_type: vk::PhysicalDeviceType) -> DeviceType {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => DeviceType::Discrete,
        vk::PhysicalDeviceType::INTEGRATED_GPU => DeviceType::Integrated,
        vk::PhysicalDeviceType::VIRTUAL_GPU => DeviceType::Virtual,
        vk::PhysicalDeviceType::CPU => DeviceType::Cpu,
        _ => DeviceType::Other,
    }
}

/// Query everything the scorer needs about one physical device
pub(crate) fn describe_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
) -> Result<DeviceCandidate> {
    unsafe {
        let properties = instance.get_physical_device_properties(physical_device);
        let features = instance.get_physical_device_features(physical_device);
        let name = properties
            .device_name_as_c_str()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "Unknown device".to_string());

        let families: Vec<QueueFamilyInfo> = instance
            .get_physical_device_queue_family_properties(physical_device)
            .iter()
            .enumerate()
            .map(|(i, family)| QueueFamilyInfo {
                graphics: family.queue_flags.contains(vk::QueueFlags::GRAPHICS),
                compute: family.queue_flags.contains(vk::QueueFlags::COMPUTE),
                present: surface_loader
                    .get_physical_device_surface_support(physical_device, i as u32, surface)
                    .unwrap_or(false),
            })
            .collect();

        let available = instance
            .enumerate_device_extension_properties(physical_device)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to enumerate device extensions for '{}': {:?}", name, e))?;
        let missing_extensions = REQUIRED_DEVICE_EXTENSIONS
            .iter()
            .filter(|required| {
                !available
                    .iter()
                    .any(|ext| ext.extension_name_as_c_str().map_or(false, |n| n == **required))
            })
            .map(|required| required.to_string_lossy().into_owned())
            .collect();

        let surface_format_count = surface_loader
            .get_physical_device_surface_formats(physical_device, surface)
            .map(|formats| formats.len())
            .unwrap_or(0);
        let present_mode_count = surface_loader
            .get_physical_device_surface_present_modes(physical_device, surface)
            .map(|modes| modes.len())
            .unwrap_or(0);

        Ok(DeviceCandidate {
            name,
            device_type: device_type_from_vk(properties.device_type),
            queue_families: find_queue_families(&families),
            missing_extensions,
            surface_format_count,
            present_mode_count,
            sampler_anisotropy: features.sampler_anisotropy == vk::TRUE,
        })
    }
}

/// First candidate format whose tiling supports `features`
pub(crate) fn find_supported_format(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
) -> Result<vk::Format> {
    candidates
        .iter()
        .copied()
        .find(|&format| {
            let properties = unsafe { instance.get_physical_device_format_properties(physical_device, format) };
            match tiling {
                vk::ImageTiling::LINEAR => properties.linear_tiling_features.contains(features),
                vk::ImageTiling::OPTIMAL => properties.optimal_tiling_features.contains(features),
                _ => false,
            }
        })
        .ok_or_else(|| {
            engine_error!("lumen::vulkan", "None of {:?} supports {:?} with {:?} tiling", candidates, features, tiling);
            Error::InitializationFailed("Failed to find a supported format".to_string())
        })
}

/// Depth attachment format for the selected device
pub(crate) fn find_depth_format(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Result<vk::Format> {
    find_supported_format(
        instance,
        physical_device,
        &DEPTH_FORMAT_CANDIDATES,
        vk::ImageTiling::OPTIMAL,
        vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
    )
}
