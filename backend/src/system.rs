use super::error::BackendError;
use super::input::{Callback, InputDispatcher, Key, Surface};
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Scancode;
use sdl2::video::GLProfile;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Process-wide windowing and GL setup. Dropping it tears the subsystem down, so it has to
/// outlive every [`Window`] (enforced by the borrow each window holds).
pub struct GraphicsContext {
    sdl_context: sdl2::Sdl,
    video_subsystem: sdl2::VideoSubsystem,
}

impl GraphicsContext {
    /// Initializes the subsystem and requests an OpenGL 3.3 core profile.
    ///
    /// Panics if called more than once per process.
    pub fn init() -> Result<GraphicsContext, BackendError> {
        let first = !INITIALIZED.swap(true, Ordering::SeqCst);
        assert!(first, "GraphicsContext::init can be called just once");

        let sdl_context = sdl2::init().map_err(BackendError::Init)?;
        let video_subsystem = sdl_context.video().map_err(BackendError::Init)?;

        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(GLProfile::Core);
        gl_attr.set_context_version(3, 3);

        debug_assert_eq!(gl_attr.context_profile(), GLProfile::Core);
        debug_assert_eq!(gl_attr.context_version(), (3, 3));

        log::debug!("graphics subsystem initialized");
        Ok(GraphicsContext {
            sdl_context,
            video_subsystem,
        })
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        log::debug!("graphics subsystem shutting down");
    }
}

/// Called with the new drawable size in pixels whenever the framebuffer is resized.
pub type ResizeHandler = Box<dyn FnMut(u32, u32)>;

/// Holds at most one resize handler. Installing a handler drops the previous one.
#[derive(Default)]
pub struct ResizeHook {
    handler: Option<ResizeHandler>,
}

impl ResizeHook {
    pub fn set<F>(&mut self, handler: F)
    where
        F: FnMut(u32, u32) + 'static,
    {
        self.handler = Some(Box::new(handler));
    }

    pub fn clear(&mut self) {
        self.handler = None;
    }

    pub fn is_set(&self) -> bool {
        self.handler.is_some()
    }

    /// Forwards the new size to the handler, returning whether one was installed.
    pub fn notify(&mut self, w: u32, h: u32) -> bool {
        match self.handler.as_mut() {
            Some(handler) => {
                handler(w, h);
                true
            }
            None => false,
        }
    }
}

/// A resizable window with its own OpenGL context.
pub struct Window<'ctx> {
    // Fields drop in declaration order: the resize handler may own GPU resources, so it goes
    // before the GL context.
    on_resize: ResizeHook,
    callbacks: InputDispatcher,
    gl_ctx: sdl2::video::GLContext,
    event_pump: sdl2::EventPump,
    window: sdl2::video::Window,
    context: &'ctx GraphicsContext,
    should_close: bool,
    frame_budget: Option<Duration>,
    last_frame: Instant,
}

impl<'ctx> Window<'ctx> {
    pub fn make(
        context: &'ctx GraphicsContext,
        w: u32,
        h: u32,
        title: &str,
    ) -> Result<Window<'ctx>, BackendError> {
        let window = context
            .video_subsystem
            .window(title, w, h)
            .opengl()
            .resizable()
            .build()
            .map_err(|e| BackendError::WindowCreation(e.to_string()))?;

        let gl_ctx = window
            .gl_create_context()
            .map_err(BackendError::ContextCreation)?;
        let event_pump = context
            .sdl_context
            .event_pump()
            .map_err(BackendError::EventPump)?;

        log::info!("window '{}' created ({}x{})", title, w, h);
        Ok(Window {
            on_resize: ResizeHook::default(),
            callbacks: InputDispatcher::new(),
            gl_ctx,
            event_pump,
            window,
            context,
            should_close: false,
            frame_budget: None,
            last_frame: Instant::now(),
        })
    }

    /// Binds the GL context to this thread and loads the GL function pointers. Must precede any
    /// GPU resource creation.
    pub fn make_context_current(&self) -> Result<(), BackendError> {
        self.window
            .gl_make_current(&self.gl_ctx)
            .map_err(BackendError::ContextCreation)?;

        let video_subsystem = &self.context.video_subsystem;
        gl::load_with(|name| video_subsystem.gl_get_proc_address(name) as *const _);
        if !gl::Viewport::is_loaded() || !gl::CreateProgram::is_loaded() {
            return Err(BackendError::Loader);
        }
        Ok(())
    }

    /// Drawable size in pixels, which may differ from the window size on high-DPI displays.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        self.window.drawable_size()
    }

    /// Caps presentation at `fps` frames per second, `None` presents as fast as possible.
    pub fn set_frame_limit(&mut self, fps: Option<u32>) {
        self.frame_budget = fps
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::new(0, 1_000_000_000u32 / fps));
    }

    pub fn should_close(&self) -> bool {
        self.should_close
    }

    pub fn set_should_close(&mut self) {
        self.should_close = true;
    }

    pub fn get_key(&self, key: Key) -> bool {
        self.event_pump
            .keyboard_state()
            .is_scancode_pressed(scancode(key))
    }

    pub fn add_callback(&mut self, callback: Callback) {
        self.callbacks.add_boxed(callback);
    }

    /// Runs every registered callback once, in registration order.
    pub fn handle_input(&mut self) {
        let mut callbacks = std::mem::take(&mut self.callbacks);
        callbacks.dispatch(self);
        self.callbacks = callbacks;
    }

    /// Installs the resize handler, dropping the previous one.
    pub fn set_on_frame_buffer_resize_handler<F>(&mut self, handler: F)
    where
        F: FnMut(u32, u32) + 'static,
    {
        self.on_resize.set(handler);
    }

    pub fn remove_frame_buffer_resize_handler(&mut self) {
        self.on_resize.clear();
    }

    /// Drains pending native events. Quit requests set the close flag and framebuffer size
    /// changes are forwarded to the resize handler.
    pub fn poll_events(&mut self) {
        let mut resized = false;
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => self.should_close = true,
                Event::Window {
                    win_event: WindowEvent::SizeChanged(..),
                    ..
                } => resized = true,
                _ => {}
            }
        }

        if resized {
            let (w, h) = self.window.drawable_size();
            log::debug!("framebuffer resized to {}x{}", w, h);
            self.on_resize.notify(w, h);
        }
    }

    pub fn swap_buffers(&mut self) {
        self.window.gl_swap_window();
        if let Some(budget) = self.frame_budget {
            let elapsed = self.last_frame.elapsed();
            if elapsed < budget {
                std::thread::sleep(budget - elapsed);
            }
        }
        self.last_frame = Instant::now();
    }
}

impl Surface for Window<'_> {
    fn is_key_pressed(&self, key: Key) -> bool {
        self.get_key(key)
    }

    fn should_close(&self) -> bool {
        self.should_close
    }

    fn set_should_close(&mut self) {
        self.should_close = true;
    }
}

fn scancode(key: Key) -> Scancode {
    match key {
        Key::A => Scancode::A,
        Key::B => Scancode::B,
        Key::C => Scancode::C,
        Key::D => Scancode::D,
        Key::E => Scancode::E,
        Key::F => Scancode::F,
        Key::G => Scancode::G,
        Key::H => Scancode::H,
        Key::I => Scancode::I,
        Key::J => Scancode::J,
        Key::K => Scancode::K,
        Key::L => Scancode::L,
        Key::M => Scancode::M,
        Key::N => Scancode::N,
        Key::O => Scancode::O,
        Key::P => Scancode::P,
        Key::Q => Scancode::Q,
        Key::R => Scancode::R,
        Key::S => Scancode::S,
        Key::T => Scancode::T,
        Key::U => Scancode::U,
        Key::V => Scancode::V,
        Key::W => Scancode::W,
        Key::X => Scancode::X,
        Key::Y => Scancode::Y,
        Key::Z => Scancode::Z,
        Key::Up => Scancode::Up,
        Key::Down => Scancode::Down,
        Key::Left => Scancode::Left,
        Key::Right => Scancode::Right,
        Key::Space => Scancode::Space,
        Key::Escape => Scancode::Escape,
        Key::Equals => Scancode::Equals,
        Key::Minus => Scancode::Minus,
    }
}
