//! # Application State Management
//!
//! The winit application around the renderer:
//! - Window and graphics initialization
//! - Keyboard input
//! - Application lifecycle events

pub mod graphics_resources_builder;
pub mod input_manager;
pub mod input_state;

use std::sync::Arc;

use graphics_resources_builder::{Graphics, GraphicsBuilder, GraphicsEvent, MaybeGraphics};
use input_manager::InputManager;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::engine_state::{config::RendererConfig, error::InitializationError, EngineState};

/// The application's lifecycle state.
pub struct ApplicationState {
    /// Graphics initialization progress
    graphics: MaybeGraphics,
    /// The running renderer, once graphics are ready
    state: Option<InitializedApplicationState>,
    config: RendererConfig,
    /// First initialization failure; ends the event loop
    error: Option<InitializationError>,
}

/// The fully initialized and running application.
pub struct InitializedApplicationState {
    pub engine_state: EngineState,
    pub window: Arc<Window>,
    pub input_manager: InputManager,
}

impl ApplicationState {
    pub fn new(event_loop_proxy: EventLoopProxy<GraphicsEvent>, config: RendererConfig) -> Self {
        Self {
            graphics: MaybeGraphics::Builder(GraphicsBuilder::new(
                event_loop_proxy,
                &config.window_title,
            )),
            state: None,
            config,
            error: None,
        }
    }

    /// The initialization failure that stopped the application, if any.
    pub fn take_error(&mut self) -> Option<InitializationError> {
        self.error.take()
    }

    fn initialize_application_state(&mut self, graphics: Graphics) -> Result<(), InitializationError> {
        let Graphics {
            window,
            surface,
            surface_config,
            device,
            queue,
        } = graphics;

        let engine_state = EngineState::new(surface, surface_config, device, queue, &self.config)?;
        log::info!("Renderer initialized");

        self.state = Some(InitializedApplicationState {
            engine_state,
            window,
            input_manager: InputManager::new(),
        });
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: InitializationError) {
        log::error!("Initialization failed: {}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

fn is_exit_request(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event: KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    ..
                },
                ..
            }
    )
}

impl ApplicationHandler<GraphicsEvent> for ApplicationState {
    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if is_exit_request(&event) {
            event_loop.exit();
            return;
        }

        let Some(state) = &mut self.state else {
            return;
        };

        state.input_manager.intake_input(&event);

        match event {
            WindowEvent::Resized(size) => {
                state.engine_state.resize_surface(size);
            }
            WindowEvent::Focused(false) => {
                state.input_manager.release_all();
            }
            WindowEvent::RedrawRequested => {
                state.engine_state.render();
            }
            _ => (),
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let MaybeGraphics::Builder(builder) = &mut self.graphics {
            builder.build_and_send(event_loop);
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, graphics: GraphicsEvent) {
        self.graphics = MaybeGraphics::Moved;

        let initialized = graphics.and_then(|graphics| self.initialize_application_state(graphics));
        if let Err(error) = initialized {
            self.fail(event_loop, error);
        }
    }

    /// Applies the input sampled since the last turn and requests the next frame.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            let processed_input = state.input_manager.get_and_reset_processed_input();
            state.engine_state.set_input_commands(processed_input);
            state.engine_state.process_input();

            state.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.take() {
            state.engine_state.shutdown();
        }
    }
}
