//! Integration tests for the Vulkan backend
//!
//! These tests open a real device on a hidden window. All tests require a
//! GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_graphics_device_tests -- --ignored


use gpu_test_utils::{compiled_demo_assets, shared_test_window, test_config};
use lumen_engine::glam::Vec3;
use lumen_engine::lumen::{Error, Renderer};
use lumen_engine::lumen::render::{
    BufferUsage, Config, GraphicsDevice, ShaderDesc, ShaderStage, SwapchainState, TextureDesc,
    TextureFormat,
};
use lumen_engine::lumen::resource::{MeshAsset, TextureAsset};
use lumen_engine::lumen::scene::{Renderable, StaticScene, Transform};
use lumen_engine_renderer_vulkan::lumen::{get_validation_stats, VulkanGraphicsDevice, WinitWindowSurface};
use serial_test::serial;

fn create_device(config: &Config) -> VulkanGraphicsDevice {
    let window = shared_test_window();
    VulkanGraphicsDevice::new(window.as_ref(), config).unwrap()
}

/// Renderer on the shared window with a checkerboard material, if shaders are built
fn create_renderer() -> Option<Renderer> {
    let config = test_config();
    let mut assets = compiled_demo_assets(&config)?;
    assets.insert_texture(
        &config.texture,
        TextureAsset::checkerboard(64, 8, [255, 255, 255, 255], [40, 40, 40, 255]),
    );

    let window = shared_test_window();
    let device = VulkanGraphicsDevice::new(window.as_ref(), &config).unwrap();
    let surface = WinitWindowSurface::new(window);
    Some(Renderer::new(Box::new(device), Box::new(surface), &assets, config).unwrap())
}

// ============================================================================
// DEVICE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_device_reports_selected_gpu() {
    let device = create_device(&test_config());

    let info = device.device_info();
    assert!(!info.name.is_empty());
    assert!(info.score > 0);
    assert!(info.max_sampler_anisotropy >= 1.0);
    assert_eq!(device.frames_in_flight(), 2);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_device_honors_frames_in_flight() {
    let config = Config {
        frames_in_flight: 3,
        ..test_config()
    };
    let device = create_device(&config);
    assert_eq!(device.frames_in_flight(), 3);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_device_rejects_zero_frames_in_flight() {
    let config = Config {
        frames_in_flight: 0,
        ..test_config()
    };
    let window = shared_test_window();
    let result = VulkanGraphicsDevice::new(window.as_ref(), &config);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

// ============================================================================
// UPLOAD TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_upload_buffer_round_trip() {
    let mut device = create_device(&test_config());

    let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    let buffer = device.upload_buffer("round_trip", BufferUsage::VERTEX, &data).unwrap();

    assert_eq!(buffer.size(), data.len() as u64);
    assert_eq!(buffer.usage(), BufferUsage::VERTEX);
    assert_eq!(device.read_buffer(buffer.as_ref()).unwrap(), data);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_upload_index_buffer_round_trip() {
    let mut device = create_device(&test_config());

    let indices: [u32; 6] = [0, 1, 2, 2, 3, 0];
    let bytes: &[u8] = bytemuck::cast_slice(&indices);
    let buffer = device.upload_buffer("indices", BufferUsage::INDEX, bytes).unwrap();

    assert_eq!(device.read_buffer(buffer.as_ref()).unwrap(), bytes);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_upload_empty_buffer_fails() {
    let mut device = create_device(&test_config());

    let result = device.upload_buffer("empty", BufferUsage::VERTEX, &[]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// TEXTURE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_checkerboard_texture() {
    let mut device = create_device(&test_config());

    let asset = TextureAsset::checkerboard(64, 8, [255, 0, 0, 255], [0, 0, 255, 255]);
    let desc = TextureDesc::from_pixels("checker", asset.width, asset.height, asset.channels, &asset.pixels)
        .unwrap();
    let texture = device.create_texture(desc).unwrap();

    let info = texture.info();
    assert_eq!(info.width, 64);
    assert_eq!(info.height, 64);
    assert_eq!(info.format, TextureFormat::R8G8B8A8_SRGB);

    device.bind_material_texture(texture).unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_texture_from_rgb_pixels() {
    let mut device = create_device(&test_config());

    let pixels = vec![128u8; 16 * 16 * 3];
    let desc = TextureDesc::from_pixels("rgb", 16, 16, 3, &pixels).unwrap();
    assert!(device.create_texture(desc).is_ok());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_texture_rejects_short_pixel_data() {
    let mut device = create_device(&test_config());

    let desc = TextureDesc {
        name: "short".to_string(),
        width: 4,
        height: 4,
        format: TextureFormat::R8G8B8A8_SRGB,
        data: vec![0; 10],
    };
    assert!(matches!(device.create_texture(desc), Err(Error::InvalidResource(_))));
}

// ============================================================================
// SHADER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_shader_rejects_unaligned_code() {
    let mut device = create_device(&test_config());

    let result = device.create_shader(ShaderDesc {
        name: "broken".to_string(),
        code: vec![0x03, 0x02, 0x23],
        stage: ShaderStage::Vertex,
        entry_point: "main".to_string(),
    });
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// RENDERER TESTS (need compiled demo shaders)
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_renderer_activates_swapchain() {
    let Some(mut renderer) = create_renderer() else { return };

    let info = renderer.activate().unwrap();
    assert_eq!(renderer.swapchain_state(), SwapchainState::Ready);
    assert!(info.image_count >= 2);
    assert!(!info.extent.is_empty());
    assert_ne!(info.depth_format, TextureFormat::Unknown);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_renderer_draws_shared_mesh_instances() {
    let Some(mut renderer) = create_renderer() else { return };
    renderer.activate().unwrap();

    let cube = MeshAsset::cube("cube", [1.0, 1.0, 1.0]);
    let a = renderer.create_mesh_instance(&cube).unwrap();
    let b = renderer.create_mesh_instance(&cube).unwrap();
    assert_eq!(renderer.mesh_entry_count(), 1);

    let mut scene = StaticScene::new();
    scene.add(Renderable::new("a", a, Transform::from_position(Vec3::new(-1.5, 0.0, 0.0))));
    scene.add(Renderable::new("b", b, Transform::from_position(Vec3::new(1.5, 0.0, 0.0))));

    for _ in 0..4 {
        renderer.render_frame(&scene).unwrap();
    }
    assert_eq!(renderer.stats().draw_calls, 2);
    assert_eq!(renderer.stats().triangles, 2 * cube.index_count() as u64 / 3);

    // Uploaded vertex data is what the asset holds
    let (vertex_buffer, _) = renderer.mesh_buffers(a).unwrap();
    assert_eq!(renderer.read_buffer(vertex_buffer.as_ref()).unwrap(), cube.vertex_bytes());
    drop(vertex_buffer);

    scene.remove(a);
    scene.remove(b);
    renderer.destroy_mesh_instance(a);
    renderer.destroy_mesh_instance(b);
    for _ in 0..3 {
        renderer.render_frame(&scene).unwrap();
    }
    assert_eq!(renderer.mesh_entry_count(), 0);

    renderer.shutdown().unwrap();
    assert_eq!(renderer.swapchain_state(), SwapchainState::Destroyed);
    assert_eq!(get_validation_stats().errors, 0);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_renderer_rebuilds_after_resize_notification() {
    let Some(mut renderer) = create_renderer() else { return };
    let first = renderer.activate().unwrap();

    let scene = StaticScene::new();
    renderer.render_frame(&scene).unwrap();
    renderer.notify_framebuffer_resized();
    renderer.render_frame(&scene).unwrap();

    assert_eq!(renderer.swapchain_state(), SwapchainState::Ready);
    assert!(renderer.swapchain_rebuild_count() >= 1);
    let rebuilt = renderer.swapchain_info().unwrap();
    assert!(rebuilt.generation > first.generation);
    assert_eq!(rebuilt.image_count, first.image_count);
}
