//! Lumen demo - a row of textured cubes sharing one mesh asset
//!
//! Compile the shaders under `assets/shaders` with `glslc` first.
//!
//! Controls:
//! - Space: add or remove an extra cube instance
//! - Escape: quit

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use lumen_engine::glam::{Quat, Vec3};
use lumen_engine::lumen::render::Config;
use lumen_engine::lumen::resource::{DirectoryAssets, MeshAsset, MeshInstanceId, TextureAsset};
use lumen_engine::lumen::scene::{Renderable, StaticScene, Transform};
use lumen_engine::lumen::{Error, Renderer, Result};
use lumen_engine::{engine_error, engine_info};
use lumen_engine_renderer_vulkan::lumen::{
    get_validation_stats, print_validation_stats_report, VulkanGraphicsDevice, WinitWindowSurface,
};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const SOURCE: &str = "lumen::demo";
const CUBE_COUNT: usize = 5;

/// Everything that exists once the window is up
struct DemoState {
    // Renderer goes first: the device must drop before the window
    renderer: Renderer,
    scene: StaticScene,
    cube: MeshAsset,
    extra: Option<MeshInstanceId>,
    window: Arc<Window>,
}

#[derive(Default)]
struct App {
    state: Option<DemoState>,
    started: Option<Instant>,
    failed: bool,
}

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, context: &str, error: Error) {
        engine_error!(SOURCE, "{}: {}", context, error);
        self.failed = true;
        self.state = None;
        event_loop.exit();
    }

    fn create_state(event_loop: &ActiveEventLoop) -> Result<DemoState> {
        let attributes = Window::default_attributes()
            .with_title("Lumen Demo")
            .with_inner_size(LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(attributes).map_err(|e| {
            Error::InitializationFailed(format!("Failed to create window: {}", e))
        })?);

        let config = Config {
            app_name: "Lumen Demo".to_string(),
            clear_color: [0.05, 0.05, 0.08, 1.0],
            ..Config::default()
        };

        let mut assets = DirectoryAssets::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"));
        assets.insert_texture(
            &config.texture,
            TextureAsset::checkerboard(256, 32, [235, 235, 235, 255], [60, 60, 70, 255]),
        );

        let device = VulkanGraphicsDevice::new(window.as_ref(), &config)?;
        let surface = WinitWindowSurface::new(Arc::clone(&window));
        let mut renderer = Renderer::new(Box::new(device), Box::new(surface), &assets, config)?;
        renderer.activate()?;

        // Every cube shares the same vertex/index buffers
        let cube = MeshAsset::cube("cube", [1.0, 1.0, 1.0]);
        let mut scene = StaticScene::new();
        for i in 0..CUBE_COUNT {
            let id = renderer.create_mesh_instance(&cube)?;
            let x = (i as f32 - (CUBE_COUNT as f32 - 1.0) / 2.0) * 1.6;
            let hue = i as f32 / CUBE_COUNT as f32;
            let transform = Transform::from_position(Vec3::new(x, 0.0, 0.0)).with_scale(Vec3::splat(0.6));
            scene.add(
                Renderable::new(&format!("cube{}", i), id, transform)
                    .with_color(Vec3::new(1.0 - hue, 0.4 + 0.6 * hue, 0.5 + 0.5 * hue)),
            );
        }

        engine_info!(
            SOURCE,
            "Rendering {} cubes on '{}'",
            scene.len(),
            renderer.device_info().name
        );

        Ok(DemoState {
            renderer,
            scene,
            cube,
            extra: None,
            window,
        })
    }

    fn toggle_extra_cube(state: &mut DemoState) -> Result<()> {
        match state.extra.take() {
            Some(id) => {
                state.scene.remove(id);
                state.renderer.destroy_mesh_instance(id);
                engine_info!(SOURCE, "Removed extra cube {}", id);
            }
            None => {
                let id = state.renderer.create_mesh_instance(&state.cube)?;
                let transform = Transform::from_position(Vec3::new(0.0, 1.6, 0.0)).with_scale(Vec3::splat(0.4));
                state.scene.add(
                    Renderable::new("extra", id, transform).with_color(Vec3::new(1.0, 0.85, 0.3)),
                );
                state.extra = Some(id);
                engine_info!(SOURCE, "Added extra cube {}", id);
            }
        }
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let elapsed = self.started.map(|t| t.elapsed().as_secs_f32()).unwrap_or(0.0);
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        // Nothing to present into while minimized
        let size = state.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }

        for (i, renderable) in state.scene.renderables_mut().iter_mut().enumerate() {
            let angle = elapsed * (0.6 + 0.15 * i as f32);
            renderable.transform.rotation = Quat::from_rotation_y(angle) * Quat::from_rotation_x(angle * 0.5);
        }

        state.renderer.render_frame(&state.scene)?;
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match Self::create_state(event_loop) {
            Ok(state) => {
                self.started = Some(Instant::now());
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, "Startup failed", e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(mut state) = self.state.take() {
                    if let Err(e) = state.renderer.shutdown() {
                        self.fail(event_loop, "Shutdown failed", e);
                        return;
                    }
                }
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                if let Some(state) = self.state.as_mut() {
                    state.renderer.notify_framebuffer_resized();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => {
                    let result = self.state.as_mut().map_or(Ok(()), Self::toggle_extra_cube);
                    if let Err(e) = result {
                        self.fail(event_loop, "Mesh upload failed", e);
                    }
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, "Frame failed", e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.as_ref() {
            state.window.request_redraw();
        }
    }
}

fn main() -> ExitCode {
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!(SOURCE, "Failed to create event loop: {}", e);
            return ExitCode::FAILURE;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::default();
    if let Err(e) = event_loop.run_app(&mut app) {
        engine_error!(SOURCE, "Event loop error: {}", e);
        return ExitCode::FAILURE;
    }
    drop(app.state.take());

    if get_validation_stats().total() > 0 {
        print_validation_stats_report();
    }

    if app.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
