use crate::config::{Config, ConfigError};
use crate::scene::Scene;
use backend::glutils::log_opengl_info;
use backend::system::{GraphicsContext, Window};
use backend::BackendError;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> App {
        App { config }
    }

    /// Opens the window and runs the frame loop until the window is asked to close.
    ///
    /// All fallible setup happens before the loop starts.
    pub fn run(&self, shaders_dir: &Path) -> Result<(), AppError> {
        let window_config = &self.config.window;

        let context = GraphicsContext::init()?;
        let mut window = Window::make(
            &context,
            window_config.width,
            window_config.height,
            &window_config.title,
        )?;
        window.make_context_current()?;
        window.set_frame_limit(window_config.frame_limit);
        log_opengl_info();

        // declared after the window, so GPU resources are released while its context is alive
        let scene = Scene::build(shaders_dir, &self.config, window.framebuffer_size())?;
        for callback in scene.callbacks(&self.config.bindings) {
            window.add_callback(callback);
        }
        window.set_on_frame_buffer_resize_handler(scene.resize_handler());

        while !window.should_close() {
            window.poll_events();
            window.handle_input();
            scene.draw();
            window.swap_buffers();
        }
        window.remove_frame_buffer_resize_handler();

        let state = scene.state();
        log::info!(
            "closing at offset ({}, {}), zoom {}",
            state.offset_x,
            state.offset_y,
            state.zoom
        );
        Ok(())
    }
}
