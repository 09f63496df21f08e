/// Shader - Vulkan implementation of the engine Shader trait

use lumen_engine::lumen::{
    Error,
    Result,
    render::{Shader as EngineShader, ShaderStage},
};
use lumen_engine::{engine_err, engine_error};
use ash::vk;
use std::any::Any;
use std::ffi::CString;

/// Vulkan shader implementation
pub struct Shader {
    /// Vulkan shader module
    pub(crate) module: vk::ShaderModule,
    /// Engine stage
    stage: ShaderStage,
    /// Entry point name
    pub(crate) entry_point: CString,
    /// Push-constant block size found by reflection
    push_constant_size: u32,
    /// Vulkan device (for cleanup)
    device: ash::Device,
}

impl Shader {
    /// Create a shader module from SPIR-V bytes
    pub(crate) fn new(device: &ash::Device, code: &[u8], stage: ShaderStage, entry_point: &str) -> Result<Self> {
        if code.is_empty() || code.len() % 4 != 0 {
            engine_error!("lumen::vulkan", "Shader code not 4-byte aligned (size: {} bytes)", code.len());
            return Err(Error::InvalidResource(format!(
                "Shader code not 4-byte aligned (size: {} bytes)",
                code.len()
            )));
        }

        // Copy into u32 words so alignment of the source buffer doesn't matter
        let words: Vec<u32> = code
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect();

        let entry_point = CString::new(entry_point).map_err(|e| {
            engine_error!("lumen::vulkan", "Invalid shader entry point name: {}", e);
            Error::InvalidResource(format!("Invalid shader entry point name: {}", e))
        })?;

        let push_constant_size = reflect_push_constant_size(&words)?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&words);
        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to create shader module: {:?}", e))?
        };

        Ok(Self {
            module,
            stage,
            entry_point,
            push_constant_size,
            device: device.clone(),
        })
    }

    pub(crate) fn stage_flags(&self) -> vk::ShaderStageFlags {
        shader_stage_to_vk(self.stage)
    }
}

impl EngineShader for Shader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn push_constant_size(&self) -> u32 {
        self.push_constant_size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

pub(crate) fn shader_stage_to_vk(stage: ShaderStage) -> vk::ShaderStageFlags {
    match stage {
        ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
    }
}

/// Largest push-constant block declared by any entry point (0 if none)
fn reflect_push_constant_size(code: &[u32]) -> Result<u32> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err!("lumen::vulkan", "SPIR-V reflection failed: {:?}", e))?;

    let mut size = 0u32;
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            if let spirq::var::Variable::PushConstant { ty, .. } = var {
                size = size.max(ty.nbyte().unwrap_or(0) as u32);
            }
        }
    }
    Ok(size)
}

/// Downcast an engine shader to the Vulkan implementation
pub(crate) fn as_vulkan_shader(shader: &dyn EngineShader) -> Result<&Shader> {
    shader.as_any().downcast_ref::<Shader>().ok_or_else(|| {
        engine_error!("lumen::vulkan", "Shader was not created by the Vulkan backend");
        Error::InvalidResource("Shader was not created by the Vulkan backend".to_string())
    })
}
