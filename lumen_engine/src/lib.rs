/*!
# Lumen Engine

Core of the Lumen real-time renderer: the frame loop, the swapchain
lifecycle and the mesh resource registry, written against a backend-neutral
[`GraphicsDevice`](graphics_device::GraphicsDevice) trait.

The production backend lives in `lumen_engine_renderer_vulkan`; unit tests
drive the same code through a mock device.

## Architecture

- **GraphicsDevice**: capability set a backend provides (uploads, swapchain, frame slots)
- **MeshRegistry**: GPU vertex/index buffers shared by mesh instances, with deferred deletion
- **SwapchainManager**: `Uninitialized → Ready ⇄ Invalidated → Destroyed`
- **FrameScheduler**: fence wait, drain, acquire, record, submit, present, advance
- **CommandRecorder**: scene to draw commands, plus an optional overlay
- **Renderer**: owns all of the above and the collaborators it was built with
*/

// Internal modules
mod error;
pub mod log;
pub mod graphics_device;
pub mod renderer;
pub mod resource;
pub mod scene;
pub mod utils;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // Renderer façade
    pub use crate::renderer::Renderer;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{reset_logger, set_logger, DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Backend-facing types
    pub mod render {
        pub use crate::graphics_device::*;
        pub use crate::renderer::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
