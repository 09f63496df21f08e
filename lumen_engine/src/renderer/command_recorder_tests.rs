use super::*;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{GraphicsDevice, ShaderDesc, ShaderStage, SwapchainDesc, Extent2D};
use crate::resource::MeshAsset;
use crate::scene::{CameraView, Renderable, StaticScene, Transform};
use glam::Vec3;
use std::sync::{Arc, Mutex};

fn ready_device() -> MockGraphicsDevice {
    let mut device = MockGraphicsDevice::new();
    let shader = |stage: ShaderStage| ShaderDesc {
        name: format!("{:?}", stage),
        code: vec![0; 4],
        stage,
        entry_point: "main".to_string(),
    };
    let desc = SwapchainDesc {
        extent: Extent2D::new(800, 600),
        vertex_shader: device.create_shader(shader(ShaderStage::Vertex)).unwrap(),
        fragment_shader: device.create_shader(shader(ShaderStage::Fragment)).unwrap(),
    };
    device.create_swapchain(&desc).unwrap();
    device.state().calls.clear();
    device
}

fn record(
    device: &mut MockGraphicsDevice,
    recorder: &mut CommandRecorder,
    scene: &StaticScene,
    registry: &MeshRegistry,
) -> FrameRecord {
    let mut commands = device.begin_commands(0, 0).unwrap();
    recorder.record_frame(commands.as_mut(), scene, registry).unwrap()
}

struct CountingOverlay {
    handles: Arc<Mutex<Vec<u64>>>,
}

impl OverlayRenderer for CountingOverlay {
    fn record(&mut self, commands: &mut dyn CommandList) -> Result<()> {
        self.handles.lock().unwrap().push(commands.native_handle());
        commands.draw_indexed(6, 0, 0)
    }
}

// ============================================================================
// Draw recording
// ============================================================================

#[test]
fn test_records_draw_sequence_per_renderable() {
    let mut device = ready_device();
    let mut registry = MeshRegistry::new();
    registry
        .register_mesh(&mut device, &MeshAsset::cube("cube.obj", [1.0; 3]), MeshInstanceId(0))
        .unwrap();
    let mut scene = StaticScene::new();
    scene.add(Renderable::new("cube", MeshInstanceId(0), Transform::IDENTITY));
    device.state().calls.clear();

    let mut recorder = CommandRecorder::new([0.1, 0.2, 0.3, 1.0]);
    let frame = record(&mut device, &mut recorder, &scene, &registry);

    assert_eq!(
        device.state().calls,
        vec![
            "begin_commands:0:0",
            "begin_render_pass:2",
            "bind_pipeline",
            "bind_vertex_buffer:cube.obj/vertices",
            "bind_index_buffer:cube.obj/indices:U32",
            "bind_descriptor_set:0",
            "push_constants",
            "draw_indexed:36:0:0",
            "end_render_pass",
            "end_commands",
        ]
    );
    assert_eq!(frame.stats, RendererStats { draw_calls: 1, skipped_draws: 0, triangles: 12 });
    assert_eq!(frame.referenced, vec![MeshInstanceId(0)]);
}

#[test]
fn test_push_constants_carry_model_color_and_light() {
    let mut device = ready_device();
    let mut registry = MeshRegistry::new();
    registry
        .register_mesh(&mut device, &MeshAsset::cube("cube.obj", [1.0; 3]), MeshInstanceId(0))
        .unwrap();

    let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
    let mut scene = StaticScene::new();
    scene.add(Renderable::new("cube", MeshInstanceId(0), transform).with_color(Vec3::new(0.5, 0.0, 1.0)));
    scene.set_camera(Some(CameraView {
        transform: Transform::from_position(Vec3::new(0.0, 4.0, -8.0)),
        ..CameraView::default()
    }));

    let mut recorder = CommandRecorder::new([0.0; 4]);
    record(&mut device, &mut recorder, &scene, &registry);

    let pushed = device.state().push_constants.clone();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].model, transform.model_matrix());
    assert_eq!(pushed[0].color, Vec3::new(0.5, 0.0, 1.0));
    assert_eq!(pushed[0].light_position, Vec3::new(0.0, 4.0, -8.0));
}

#[test]
fn test_light_at_origin_without_camera() {
    let mut device = ready_device();
    let mut registry = MeshRegistry::new();
    registry
        .register_mesh(&mut device, &MeshAsset::cube("cube.obj", [1.0; 3]), MeshInstanceId(0))
        .unwrap();
    let mut scene = StaticScene::new();
    scene.add(Renderable::new("cube", MeshInstanceId(0), Transform::IDENTITY));

    let mut recorder = CommandRecorder::new([0.0; 4]);
    record(&mut device, &mut recorder, &scene, &registry);

    assert_eq!(device.state().push_constants[0].light_position, Vec3::ZERO);
}

// ============================================================================
// Skipped draws
// ============================================================================

#[test]
fn test_unresolved_mesh_is_skipped_not_fatal() {
    let mut device = ready_device();
    let mut registry = MeshRegistry::new();
    registry
        .register_mesh(&mut device, &MeshAsset::cube("cube.obj", [1.0; 3]), MeshInstanceId(1))
        .unwrap();
    let mut scene = StaticScene::new();
    scene.add(Renderable::new("ghost", MeshInstanceId(42), Transform::IDENTITY));
    scene.add(Renderable::new("cube", MeshInstanceId(1), Transform::IDENTITY));
    device.state().calls.clear();

    let mut recorder = CommandRecorder::new([0.0; 4]);
    let frame = record(&mut device, &mut recorder, &scene, &registry);

    assert_eq!(frame.stats.draw_calls, 1);
    assert_eq!(frame.stats.skipped_draws, 1);
    assert_eq!(frame.referenced, vec![MeshInstanceId(1)]);
    assert_eq!(device.state().count("draw_indexed"), 1);
    assert_eq!(device.state().count("end_render_pass"), 1);
}

#[test]
fn test_invisible_renderable_is_not_drawn() {
    let mut device = ready_device();
    let mut registry = MeshRegistry::new();
    registry
        .register_mesh(&mut device, &MeshAsset::cube("cube.obj", [1.0; 3]), MeshInstanceId(0))
        .unwrap();
    let mut hidden = Renderable::new("cube", MeshInstanceId(0), Transform::IDENTITY);
    hidden.visible = false;
    let mut scene = StaticScene::new();
    scene.add(hidden);

    let mut recorder = CommandRecorder::new([0.0; 4]);
    let frame = record(&mut device, &mut recorder, &scene, &registry);

    assert_eq!(frame.stats, RendererStats::default());
    assert_eq!(device.state().count("draw_indexed"), 0);
}

// ============================================================================
// Overlay
// ============================================================================

#[test]
fn test_overlay_records_inside_render_pass() {
    let mut device = ready_device();
    let registry = MeshRegistry::new();
    let scene = StaticScene::new();
    let handles = Arc::new(Mutex::new(Vec::new()));

    let mut recorder = CommandRecorder::new([0.0; 4]);
    recorder.set_overlay(Some(Box::new(CountingOverlay { handles: Arc::clone(&handles) })));
    assert!(recorder.has_overlay());
    record(&mut device, &mut recorder, &scene, &registry);

    let calls = device.state().calls.clone();
    let draw = calls.iter().position(|c| c == "draw_indexed:6:0:0").unwrap();
    let end = calls.iter().position(|c| c == "end_render_pass").unwrap();
    assert!(draw < end);
    assert_eq!(handles.lock().unwrap().len(), 1);
}
