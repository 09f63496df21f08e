use super::*;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockState, MockWindow};
use crate::graphics_device::{AcquireOutcome, Extent2D, PresentOutcome};
use crate::renderer::frame_uniforms;
use crate::resource::{InMemoryAssets, TextureAsset};
use crate::scene::{Renderable, StaticScene, Transform};
use std::sync::Mutex;

fn assets() -> InMemoryAssets {
    let mut assets = InMemoryAssets::new();
    assets.insert_shader("shaders/mesh.vert.spv", vec![3, 2, 35, 7]);
    assets.insert_shader("shaders/mesh.frag.spv", vec![3, 2, 35, 7]);
    assets.insert_texture(
        "textures/default",
        TextureAsset::checkerboard(8, 4, [255, 255, 255, 255], [40, 40, 40, 255]),
    );
    assets
}

fn setup() -> (Renderer, Arc<Mutex<MockState>>, MockWindow) {
    let device = MockGraphicsDevice::new();
    let state = device.state_handle();
    let window = MockWindow::new(800, 600);
    let renderer = Renderer::new(
        Box::new(device),
        Box::new(window.clone()),
        &assets(),
        Config::default(),
    )
    .unwrap();
    (renderer, state, window)
}

fn active() -> (Renderer, Arc<Mutex<MockState>>, MockWindow) {
    let (mut renderer, state, window) = setup();
    renderer.activate().unwrap();
    state.lock().unwrap().calls.clear();
    (renderer, state, window)
}

fn count(state: &Arc<Mutex<MockState>>, prefix: &str) -> usize {
    state.lock().unwrap().count(prefix)
}

fn cube_scene(renderer: &mut Renderer, instances: usize) -> (StaticScene, Vec<MeshInstanceId>) {
    let mut scene = StaticScene::new();
    let mut ids = Vec::new();
    for i in 0..instances {
        let id = renderer
            .create_mesh_instance(&MeshAsset::cube("cube.obj", [1.0, 0.0, 0.0]))
            .unwrap();
        scene.add(Renderable::new(&format!("cube{}", i), id, Transform::IDENTITY));
        ids.push(id);
    }
    (scene, ids)
}

// ============================================================================
// Construction and activation
// ============================================================================

#[test]
fn test_new_uploads_and_binds_material() {
    let (renderer, state, _window) = setup();
    let state = state.lock().unwrap();

    assert!(state.material_bound);
    assert_eq!(state.count("create_shader"), 2);
    assert_eq!(state.count("create_texture:textures/default"), 1);
    assert_eq!(renderer.material().info().width, 8);
    assert_eq!(renderer.swapchain_state(), SwapchainState::Uninitialized);
}

#[test]
fn test_missing_shader_is_fatal() {
    let mut assets = assets();
    assets.insert_shader("shaders/other.spv", vec![0]);
    let mut config = Config::default();
    config.fragment_shader = "shaders/missing.frag.spv".to_string();

    let result = Renderer::new(
        Box::new(MockGraphicsDevice::new()),
        Box::new(MockWindow::new(800, 600)),
        &assets,
        config,
    );

    assert_eq!(
        result.err(),
        Some(Error::AssetMissing("shaders/missing.frag.spv".to_string()))
    );
}

#[test]
fn test_missing_texture_is_fatal() {
    let mut config = Config::default();
    config.texture = "textures/none".to_string();

    let result = Renderer::new(
        Box::new(MockGraphicsDevice::new()),
        Box::new(MockWindow::new(800, 600)),
        &assets(),
        config,
    );

    assert!(matches!(result, Err(Error::AssetMissing(name)) if name == "textures/none"));
}

#[test]
fn test_frames_in_flight_must_match_device() {
    let mut config = Config::default();
    config.frames_in_flight = 3;

    let result = Renderer::new(
        Box::new(MockGraphicsDevice::new()),
        Box::new(MockWindow::new(800, 600)),
        &assets(),
        config,
    );

    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_render_before_activate_errors() {
    let (mut renderer, state, _window) = setup();

    assert!(renderer.render_frame(&StaticScene::new()).is_err());
    assert_eq!(count(&state, "wait_for_slot"), 0);
}

#[test]
fn test_activate_builds_first_swapchain() {
    let (mut renderer, _state, _window) = setup();
    let info = renderer.activate().unwrap();

    assert_eq!(renderer.swapchain_state(), SwapchainState::Ready);
    assert_eq!(info.extent, Extent2D::new(800, 600));
    assert_eq!(renderer.swapchain_info(), Some(&info));
}

// ============================================================================
// Frame protocol
// ============================================================================

#[test]
fn test_iteration_order() {
    let (mut renderer, state, _window) = active();
    let (scene, _ids) = cube_scene(&mut renderer, 1);
    state.lock().unwrap().calls.clear();

    assert_eq!(renderer.render_frame(&scene).unwrap(), FrameOutcome::Presented);

    let calls = state.lock().unwrap().calls.clone();
    let position = |name: &str| calls.iter().position(|c| c.starts_with(name)).unwrap();
    assert_eq!(position("wait_for_slot:0"), 0);
    assert!(position("acquire:0") < position("begin_commands:0"));
    assert!(position("draw_indexed") < position("end_commands"));
    assert!(position("end_commands") < position("write_uniforms:0"));
    assert!(position("write_uniforms:0") < position("submit:0"));
    assert!(position("submit:0") < position("present:0"));
    assert_eq!(renderer.stats().draw_calls, 1);
    assert_eq!(renderer.stats().triangles, 12);
}

#[test]
fn test_slots_rotate_modulo_frames_in_flight() {
    let (mut renderer, state, _window) = active();
    let scene = StaticScene::new();

    let mut slots = Vec::new();
    for _ in 0..5 {
        slots.push(renderer.current_slot());
        renderer.render_frame(&scene).unwrap();
    }

    assert_eq!(slots, vec![0, 1, 0, 1, 0]);
    assert_eq!(count(&state, "submit:0"), 3);
    assert_eq!(count(&state, "submit:1"), 2);
}

#[test]
fn test_out_of_date_acquire_rebuilds_and_skips_frame() {
    let (mut renderer, state, _window) = active();
    let (scene, _ids) = cube_scene(&mut renderer, 1);

    for _ in 0..4 {
        assert_eq!(renderer.render_frame(&scene).unwrap(), FrameOutcome::Presented);
    }
    let generation_4 = renderer.swapchain_info().unwrap().generation;
    let (draws, submits, presents) = (
        count(&state, "draw_indexed"),
        count(&state, "submit"),
        count(&state, "present"),
    );

    state.lock().unwrap().acquire_script.push_back(AcquireOutcome::OutOfDate);
    assert_eq!(renderer.render_frame(&scene).unwrap(), FrameOutcome::Skipped);

    assert_eq!(count(&state, "draw_indexed"), draws);
    assert_eq!(count(&state, "submit"), submits);
    assert_eq!(count(&state, "present"), presents);
    assert_eq!(renderer.swapchain_rebuild_count(), 1);
    assert_eq!(renderer.stats().draw_calls, 1);

    assert_eq!(renderer.render_frame(&scene).unwrap(), FrameOutcome::Presented);
    let generation_6 = renderer.swapchain_info().unwrap().generation;
    assert_ne!(generation_4, generation_6);
    assert_eq!(count(&state, "draw_indexed"), draws + 1);
}

#[test]
fn test_suboptimal_present_rebuilds_after_presenting() {
    let (mut renderer, state, _window) = active();
    let generation = renderer.swapchain_info().unwrap().generation;
    state.lock().unwrap().present_script.push_back(PresentOutcome::Suboptimal);

    let outcome = renderer.render_frame(&StaticScene::new()).unwrap();

    assert_eq!(outcome, FrameOutcome::Suboptimal);
    assert_ne!(renderer.swapchain_info().unwrap().generation, generation);
    let calls = state.lock().unwrap().calls.clone();
    let present = calls.iter().position(|c| c.starts_with("present")).unwrap();
    let destroy = calls.iter().position(|c| c == "destroy_swapchain").unwrap();
    assert!(present < destroy);
    // The slot still advanced past the submitted frame
    assert_eq!(renderer.current_slot(), 1);
}

#[test]
fn test_out_of_date_present_rebuilds() {
    let (mut renderer, state, _window) = active();
    state.lock().unwrap().present_script.push_back(PresentOutcome::OutOfDate);

    assert_eq!(renderer.render_frame(&StaticScene::new()).unwrap(), FrameOutcome::Suboptimal);
    assert_eq!(renderer.swapchain_rebuild_count(), 1);
    assert_eq!(renderer.current_slot(), 1);
}

#[test]
fn test_resize_notification_rebuilds_once() {
    let (mut renderer, _state, window) = active();
    let scene = StaticScene::new();

    window.resize(1280, 720);
    renderer.notify_framebuffer_resized();
    assert_eq!(renderer.render_frame(&scene).unwrap(), FrameOutcome::Suboptimal);
    assert_eq!(renderer.swapchain_info().unwrap().extent, Extent2D::new(1280, 720));

    assert_eq!(renderer.render_frame(&scene).unwrap(), FrameOutcome::Presented);
    assert_eq!(renderer.swapchain_rebuild_count(), 1);
}

#[test]
fn test_minimized_window_blocks_rebuild_until_restored() {
    let (mut renderer, _state, window) = active();
    window.resize(0, 0);
    window.lock().pending_sizes.extend([Extent2D::new(0, 0), Extent2D::new(1024, 768)]);

    renderer.notify_framebuffer_resized();
    renderer.render_frame(&StaticScene::new()).unwrap();

    assert_eq!(window.lock().waits, 2);
    assert_eq!(renderer.swapchain_info().unwrap().extent, Extent2D::new(1024, 768));
}

#[test]
fn test_minimized_detached_window_skips_frames_until_restored() {
    let (mut renderer, state, window) = active();
    window.resize(0, 0);
    window.lock().detached = true;

    renderer.notify_framebuffer_resized();
    assert_eq!(renderer.render_frame(&StaticScene::new()).unwrap(), FrameOutcome::Suboptimal);
    assert_eq!(renderer.swapchain_state(), SwapchainState::Invalidated);
    assert_eq!(count(&state, "destroy_swapchain"), 0);

    state.lock().unwrap().calls.clear();
    assert_eq!(renderer.render_frame(&StaticScene::new()).unwrap(), FrameOutcome::Skipped);
    assert_eq!(count(&state, "wait_for_slot"), 0);

    window.resize(1024, 768);
    assert_eq!(renderer.render_frame(&StaticScene::new()).unwrap(), FrameOutcome::Presented);
    assert_eq!(renderer.swapchain_rebuild_count(), 1);
    assert_eq!(renderer.swapchain_info().unwrap().extent, Extent2D::new(1024, 768));
}

#[test]
fn test_fallback_uniforms_without_camera() {
    let (mut renderer, state, _window) = active();
    let scene = StaticScene::new();
    renderer.render_frame(&scene).unwrap();

    let (slot, uniforms) = state.lock().unwrap().uniforms[0];
    assert_eq!(slot, 0);
    assert_eq!(uniforms, frame_uniforms(&scene, Extent2D::new(800, 600)));
}

// ============================================================================
// Mesh lifetime through the frame loop
// ============================================================================

#[test]
fn test_destroyed_instances_are_drained_on_next_frame() {
    let (mut renderer, _state, _window) = active();
    let (_scene, ids) = cube_scene(&mut renderer, 2);
    assert_eq!(renderer.mesh_entry_count(), 1);

    renderer.destroy_mesh_instance(ids[0]);
    renderer.destroy_mesh_instance(ids[1]);
    assert_eq!(renderer.mesh_entry_count(), 1);

    renderer.render_frame(&StaticScene::new()).unwrap();
    assert_eq!(renderer.mesh_entry_count(), 0);
}

#[test]
fn test_buffers_outlive_the_frame_that_drew_them() {
    let (mut renderer, state, _window) = active();
    let (scene, ids) = cube_scene(&mut renderer, 1);

    // Submission 0 on slot 0 draws the cube
    renderer.render_frame(&scene).unwrap();
    renderer.destroy_mesh_instance(ids[0]);

    // Slot 1's fence says nothing about submission 0: entry gone, buffers kept
    renderer.render_frame(&StaticScene::new()).unwrap();
    assert_eq!(renderer.mesh_entry_count(), 0);
    assert!(state.lock().unwrap().buffers_destroyed.is_empty());

    // Slot 0's fence covers submission 0
    renderer.render_frame(&StaticScene::new()).unwrap();
    assert_eq!(state.lock().unwrap().buffers_destroyed.len(), 2);
}

#[test]
fn test_buffers_released_only_after_slot_fence_wait() {
    let (mut renderer, state, _window) = active();
    let (scene, ids) = cube_scene(&mut renderer, 1);
    renderer.render_frame(&scene).unwrap();
    renderer.render_frame(&StaticScene::new()).unwrap();
    renderer.destroy_mesh_instance(ids[0]);
    state.lock().unwrap().calls.clear();

    // Slot 0 again: its fence covers the submission that drew the cube
    renderer.render_frame(&StaticScene::new()).unwrap();

    let calls = state.lock().unwrap().calls.clone();
    let wait = calls.iter().position(|c| c == "wait_for_slot:0").unwrap();
    let first_free = calls
        .iter()
        .position(|c| c.starts_with("destroy_buffer:cube.obj"))
        .unwrap();
    assert!(wait < first_free);
    assert!(first_free < calls.iter().position(|c| c.starts_with("acquire:0")).unwrap());
    assert_eq!(state.lock().unwrap().count("destroy_buffer:cube.obj"), 2);
}

#[test]
fn test_stale_renderable_is_skipped() {
    let (mut renderer, _state, _window) = active();
    let (scene, ids) = cube_scene(&mut renderer, 2);
    renderer.destroy_mesh_instance(ids[0]);
    renderer.destroy_mesh_instance(ids[1]);

    // The scene still lists both renderables for one frame
    assert_eq!(renderer.render_frame(&scene).unwrap(), FrameOutcome::Presented);
    assert_eq!(renderer.stats().draw_calls, 0);
    assert_eq!(renderer.stats().skipped_draws, 2);
}

#[test]
fn test_mesh_buffers_round_trip() {
    let (mut renderer, _state, _window) = active();
    let asset = MeshAsset::cube("cube.obj", [0.0, 1.0, 0.0]);
    let id = renderer.create_mesh_instance(&asset).unwrap();

    let (vertices, indices) = renderer.mesh_buffers(id).unwrap();
    assert_eq!(renderer.read_buffer(vertices.as_ref()).unwrap(), asset.vertex_bytes());
    assert_eq!(renderer.read_buffer(indices.as_ref()).unwrap(), asset.index_bytes());
}

#[test]
fn test_instance_ids_are_never_reused() {
    let (mut renderer, _state, _window) = active();
    let asset = MeshAsset::cube("cube.obj", [1.0; 3]);

    let a = renderer.create_mesh_instance(&asset).unwrap();
    renderer.destroy_mesh_instance(a);
    renderer.render_frame(&StaticScene::new()).unwrap();
    let b = renderer.create_mesh_instance(&asset).unwrap();

    assert_ne!(a, b);
    assert!(b > a);
}

// ============================================================================
// Shutdown
// ============================================================================

#[test]
fn test_shutdown_releases_everything_once() {
    let (mut renderer, state, _window) = active();
    let (scene, _ids) = cube_scene(&mut renderer, 1);
    renderer.render_frame(&scene).unwrap();

    renderer.shutdown().unwrap();

    {
        let state = state.lock().unwrap();
        assert_eq!(state.buffers_destroyed.len(), 2);
        assert!(state.swapchain.is_none());
        let idle = state.calls.iter().rposition(|c| c == "wait_idle").unwrap();
        let destroy = state.calls.iter().rposition(|c| c == "destroy_swapchain").unwrap();
        assert!(idle < destroy);
    }
    assert_eq!(renderer.swapchain_state(), SwapchainState::Destroyed);
    assert!(renderer.render_frame(&scene).is_err());

    drop(renderer);
    assert_eq!(count(&state, "destroy_swapchain"), 1);
}

#[test]
fn test_drop_shuts_down() {
    let (renderer, state, _window) = active();
    drop(renderer);

    assert_eq!(count(&state, "wait_idle"), 1);
    assert_eq!(count(&state, "destroy_swapchain"), 1);
}
