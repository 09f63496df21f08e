/// Material sampler creation

use lumen_engine::lumen::Result;
use lumen_engine::engine_err;
use ash::vk;

/// Create the sampler used by the mesh pipeline's material texture
///
/// Linear min/mag filtering, repeat addressing on all axes and anisotropic
/// filtering at the device maximum.
pub(crate) fn create_material_sampler(device: &ash::Device, max_anisotropy: f32) -> Result<vk::Sampler> {
    let create_info = vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .mip_lod_bias(0.0)
        .anisotropy_enable(true)
        .max_anisotropy(max_anisotropy)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .min_lod(0.0)
        .max_lod(0.0)
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false);

    unsafe {
        device
            .create_sampler(&create_info, None)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create texture sampler: {:?}", e))
    }
}
