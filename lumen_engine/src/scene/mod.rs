//! Scene module
//!
//! Transforms plus the read-only scene view the renderer queries each frame.

pub mod scene_view;
pub mod transform;

pub use scene_view::{CameraView, Renderable, SceneView, StaticScene};
pub use transform::{perspective, Transform};
