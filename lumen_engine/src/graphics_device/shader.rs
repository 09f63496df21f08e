/// Shader trait and shader descriptor

use std::any::Any;

/// Pipeline stage a shader module runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Descriptor for creating a shader module from SPIR-V bytecode
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    /// Logical asset name (for diagnostics)
    pub name: String,
    /// SPIR-V bytecode, treated as an opaque blob
    pub code: Vec<u8>,
    pub stage: ShaderStage,
    /// Entry point name
    pub entry_point: String,
}

/// Compiled shader module
pub trait Shader: Send + Sync {
    fn stage(&self) -> ShaderStage;

    /// Size in bytes of the push-constant block the module declares (0 if none)
    fn push_constant_size(&self) -> u32;

    /// Downcast hook for the owning backend
    fn as_any(&self) -> &dyn Any;
}
