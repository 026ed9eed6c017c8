use std::sync::Arc;

use trifield::{Clock, FieldConfig, Renderer, Stage, SystemClock, TriangleField};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

// Renderer setup is async; on the web it finishes after `resumed` returns
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
enum UserEvent {
    RendererReady(Renderer),
}

struct App {
    field: TriangleField,
    stage: Stage,
    clock: SystemClock,
    renderer: Option<Renderer>,
    window: Option<Arc<Window>>,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: EventLoopProxy<UserEvent>,
}

impl App {
    fn new(config: FieldConfig, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            field: TriangleField::from_config(config),
            stage: Stage::new(),
            clock: SystemClock::new(),
            renderer: None,
            window: None,
            proxy,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn create_renderer(&mut self, window: Arc<Window>) {
        match pollster::block_on(Renderer::new(window)) {
            Ok(renderer) => self.mount(renderer),
            Err(e) => log::error!("{}; the triangle field will not render", e),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn create_renderer(&mut self, window: Arc<Window>) {
        let proxy = self.proxy.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match Renderer::new(window).await {
                Ok(renderer) => {
                    if proxy.send_event(UserEvent::RendererReady(renderer)).is_err() {
                        log::warn!("Event loop closed before the renderer was ready");
                    }
                }
                Err(e) => log::error!("{}; the triangle field will not render", e),
            }
        });
    }

    /// Start the field on a ready surface
    fn mount(&mut self, renderer: Renderer) {
        let (width, height) = renderer.logical_size();
        self.field.initialize(width, height);
        renderer.window().request_redraw();
        self.renderer = Some(renderer);
    }

    /// Stop scheduling frames and release the surface before the window
    fn teardown(&mut self, event_loop: &ActiveEventLoop) {
        self.field.teardown();
        self.renderer = None;
        self.window = None;
        event_loop.exit();
    }

    fn redraw(&mut self) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        let now = self.clock.now_ms();
        let keep_running = self.field.advance_frame(now, &mut *renderer);
        let (_, viewport_height) = renderer.logical_size();
        let stage = self.stage.frame(now, viewport_height);

        match renderer.render(&stage) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = renderer.size();
                renderer.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory, stopping the animation");
                self.field.teardown();
                return;
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }

        if keep_running {
            renderer.window().request_redraw();
        }
    }

    fn scroll(&mut self, delta_y: f32) {
        let now = self.clock.now_ms();
        if delta_y < 0.0 {
            self.stage.next_section(now);
        } else if delta_y > 0.0 {
            self.stage.previous_section(now);
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::RendererReady(renderer) => self.mount(renderer),
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Trifield")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        #[cfg(target_arch = "wasm32")]
        let window_attributes = {
            use winit::platform::web::WindowAttributesExtWebSys;
            window_attributes.with_append(true)
        };

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());
        self.create_renderer(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                self.teardown(event_loop);
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match code {
                KeyCode::ArrowDown | KeyCode::PageDown | KeyCode::Space => self.scroll(-1.0),
                KeyCode::ArrowUp | KeyCode::PageUp => self.scroll(1.0),
                _ => {}
            },

            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                self.scroll(delta_y);
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                    let (width, height) = renderer.logical_size();
                    self.field.on_resize(width, height);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    // Load environment variables from .env file before the logger reads RUST_LOG
    dotenv::dotenv().ok();
    env_logger::init();

    let config = FieldConfig::load().unwrap_or_else(|e| {
        log::warn!("{}; using the default field config", e);
        FieldConfig::default()
    });

    let event_loop = match EventLoop::<UserEvent>::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, event_loop.create_proxy());
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
}

// WebAssembly entry point
#[cfg(target_arch = "wasm32")]
fn main() {
    use winit::platform::web::EventLoopExtWebSys;

    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    console_log::init_with_level(log::Level::Warn).ok();

    let event_loop = match EventLoop::<UserEvent>::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let app = App::new(FieldConfig::default(), event_loop.create_proxy());
    event_loop.spawn_app(app);
}
