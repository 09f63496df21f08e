/// Graphics device module - backend capability traits and GPU data layouts

pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod shader;
pub mod command_list;
pub mod device_selection;
pub mod gpu_types;

pub use graphics_device::*;
pub use buffer::*;
pub use texture::*;
pub use shader::*;
pub use command_list::*;
pub use device_selection::*;
pub use gpu_types::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
