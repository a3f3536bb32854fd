//! Application event loop.
//!
//! The [`App`] owns the windowed backend, the play session and the keyboard
//! state. Each redraw is one frame:
//! 1. Sample the clock and turn it into a delta
//! 2. Run the session frame (updates, level transitions, camera, draw calls)
//! 3. Replay the queued draw calls in one render pass and present
//! 4. Request the next redraw

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::KeyCode,
    window::Window,
};

use crate::{
    config::GameConfig,
    context::Context,
    error::EngineError,
    game::{Game, HudSink},
    gpu::wgpu_backend::WgpuBackend,
    input::InputState,
    time::{FrameClock, WallClock},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Shows the HUD in the window title.
pub struct WindowTitleHud(pub Arc<Window>);

impl HudSink for WindowTitleHud {
    fn show(&mut self, text: &str) {
        log::info!("{}", text);
        self.0.set_title(&format!("Cube Maze | {}", text));
    }
}

pub(crate) struct AppState {
    backend: WgpuBackend,
    game: Game<WindowTitleHud>,
    input: InputState,
    clock: FrameClock,
    time: WallClock,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: GameConfig) -> Result<Self, EngineError> {
        let size = window.inner_size();
        let ctx = Context::new(window.clone(), config.clear_color).await?;
        let mut backend = WgpuBackend::new(ctx);
        let clock = FrameClock::new(config.delta_divisor_ms);
        let mut game = Game::with_default_levels(
            config,
            WindowTitleHud(window),
            size.width.max(1),
            size.height.max(1),
        )?;
        game.load_level(&mut backend)?;
        Ok(Self {
            backend,
            game,
            input: InputState::new(),
            clock,
            time: WallClock::new(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.backend.ctx.resize(width, height) {
            self.is_surface_configured = true;
            self.game.resize(width, height);
        }
    }

    fn redraw(&mut self) {
        let dt = self.clock.tick(&self.time);
        if let Err(e) = self
            .game
            .frame(&mut self.backend, dt, self.clock.elapsed(), &self.input)
        {
            log::error!("frame failed: {}", e);
        }
        self.input.end_frame();
        if !self.is_surface_configured {
            return;
        }
        match self.backend.render() {
            Ok(()) => (),
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.backend.ctx.window.inner_size();
                self.resize(size.width, size.height);
            }
            Err(e) => log::error!("Unable to render {}", e),
        }
    }
}

pub(crate) enum AppEvent {
    #[allow(dead_code)]
    Initialized(Result<AppState, EngineError>),
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<AppEvent>,
    config: GameConfig,
    state: Option<AppState>,
}

impl App {
    fn new(event_loop: &EventLoop<AppEvent>, config: GameConfig) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            config,
            state: None,
        })
    }

    fn install(&mut self, event_loop: &ActiveEventLoop, state: Result<AppState, EngineError>) {
        match state {
            Ok(mut state) => {
                let size = state.backend.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.backend.ctx.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                log::error!("App initialization failed: {}", e);
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Cube Maze");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let init_future = AppState::new(window, self.config.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let state = self.async_runtime.block_on(init_future);
            self.install(event_loop, state);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = init_future.await;
                if proxy.send_event(AppEvent::Initialized(state)).is_err() {
                    log::error!("Event loop closed before initialization finished");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            AppEvent::Initialized(state) => self.install(event_loop, state),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        if state.input.handle_window_event(&event) && state.input.is_held(KeyCode::Escape) {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                state.redraw();
                state.backend.ctx.window.request_redraw();
            }
            _ => {}
        }
    }
}

/// Opens the window and plays the built-in levels until the window closes.
pub fn run() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let config = GameConfig::from_env();
    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    run().map_err(|e| wasm_bindgen::JsValue::from_str(&e.to_string()))
}
