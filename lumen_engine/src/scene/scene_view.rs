/// Scene queries consumed by the command recorder.
///
/// The renderer does not own a scene graph. Each frame it asks a
/// `SceneView` for the renderables and the active camera, in whatever
/// order the scene iterates them.

use glam::{Mat4, Vec3};

use crate::resource::MeshInstanceId;
use crate::scene::{perspective, Transform};

/// A mesh component as seen by the recorder
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    /// Debug name (used in skip diagnostics)
    pub name: String,
    pub mesh_instance: MeshInstanceId,
    /// Absolute (world) transform
    pub transform: Transform,
    pub color: Vec3,
    pub visible: bool,
}

impl Renderable {
    pub fn new(name: &str, mesh_instance: MeshInstanceId, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            mesh_instance,
            transform,
            color: Vec3::ONE,
            visible: true,
        }
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }
}

/// Camera component parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// Absolute (world) transform
    pub transform: Transform,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100_000.0,
        }
    }
}

impl CameraView {
    pub fn view_matrix(&self) -> Mat4 {
        self.transform.view_matrix()
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        perspective(self.fov_degrees, aspect_ratio, self.near, self.far)
    }
}

/// Read access to the live scene
pub trait SceneView {
    /// All mesh components, in scene iteration order
    fn renderables(&self) -> Vec<Renderable>;

    /// The camera currently rendering, if any
    fn active_camera(&self) -> Option<CameraView>;
}

/// Flat list scene for demos and tests
#[derive(Debug, Clone, Default)]
pub struct StaticScene {
    renderables: Vec<Renderable>,
    camera: Option<CameraView>,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, renderable: Renderable) {
        self.renderables.push(renderable);
    }

    /// Remove every renderable bound to `id`; returns how many were removed
    pub fn remove(&mut self, id: MeshInstanceId) -> usize {
        let before = self.renderables.len();
        self.renderables.retain(|r| r.mesh_instance != id);
        before - self.renderables.len()
    }

    pub fn set_camera(&mut self, camera: Option<CameraView>) {
        self.camera = camera;
    }

    pub fn renderables_mut(&mut self) -> &mut [Renderable] {
        &mut self.renderables
    }

    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }
}

impl SceneView for StaticScene {
    fn renderables(&self) -> Vec<Renderable> {
        self.renderables.clone()
    }

    fn active_camera(&self) -> Option<CameraView> {
        self.camera
    }
}

#[cfg(test)]
#[path = "scene_view_tests.rs"]
mod tests;
