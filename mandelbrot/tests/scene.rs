use approx::assert_relative_eq;
use backend::headless::{self, UniformValue};
use backend::input::{InputDispatcher, Key, Surface};
use backend::BackendError;
use mandelbrot::config::Config;
use mandelbrot::scene::Scene;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Default)]
struct Keyboard {
    pressed: HashSet<Key>,
    close: bool,
}

impl Keyboard {
    fn press(&mut self, key: Key) {
        self.pressed.insert(key);
    }

    fn release_all(&mut self) {
        self.pressed.clear();
    }
}

impl Surface for Keyboard {
    fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    fn should_close(&self) -> bool {
        self.close
    }

    fn set_should_close(&mut self) {
        self.close = true;
    }
}

fn shaders_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders")
}

struct Harness {
    scene: Scene,
    dispatcher: InputDispatcher,
    keyboard: Keyboard,
    config: Config,
}

impl Harness {
    fn new() -> Harness {
        headless::init();
        let config = Config::default();
        let size = (config.window.width, config.window.height);
        let scene = Scene::build(&shaders_dir(), &config, size).unwrap();
        let mut dispatcher = InputDispatcher::new();
        for callback in scene.callbacks(&config.bindings) {
            dispatcher.add_boxed(callback);
        }
        Harness {
            scene,
            dispatcher,
            keyboard: Keyboard::default(),
            config,
        }
    }

    /// One iteration of the frame loop with `keys` held.
    fn frame(&mut self, keys: &[Key]) -> usize {
        self.keyboard.release_all();
        for key in keys {
            self.keyboard.press(*key);
        }
        let handled = self.dispatcher.dispatch(&mut self.keyboard);
        self.scene.draw();
        handled
    }

    fn uniform(&self, name: &str) -> Option<UniformValue> {
        headless::uniform(self.scene.program().id(), name)
    }
}

#[test]
fn scene_starts_at_window_size_with_default_view() {
    let harness = Harness::new();

    assert_eq!(headless::viewport(), [0, 0, 800, 600]);
    assert_eq!(
        harness.uniform("view_port"),
        Some(UniformValue::Vec2(800.0, 600.0))
    );
    assert_eq!(harness.uniform("x_offset"), Some(UniformValue::Float(0.0)));
    assert_eq!(harness.uniform("y_offset"), Some(UniformValue::Float(0.0)));
    assert_eq!(harness.uniform("zoom"), Some(UniformValue::Float(1.0)));
    assert_eq!(headless::current_program(), harness.scene.program().id());
    assert!(!harness.scene.has_color_map());
    assert_eq!(harness.uniform("use_color_map"), None);
    assert_eq!(harness.dispatcher.len(), 8);
}

#[test]
fn zoom_in_ten_times_then_reset() {
    let mut harness = Harness::new();
    let factor = harness.config.navigation.zoom_factor;

    for _ in 0..10 {
        assert_eq!(harness.frame(&[Key::N]), 1);
    }
    let zoom = harness.scene.state().zoom;
    assert_relative_eq!(zoom, factor.powi(10), max_relative = 1e-5);
    assert_eq!(harness.uniform("zoom"), Some(UniformValue::Float(zoom)));

    harness.frame(&[Key::C]);
    assert_eq!(harness.scene.state().zoom, 1.0);
    assert_eq!(harness.uniform("zoom"), Some(UniformValue::Float(1.0)));
}

#[test]
fn held_pan_keys_move_by_scaled_step_per_frame() {
    let mut harness = Harness::new();
    let step = harness.config.navigation.pan_step;

    harness.frame(&[Key::L, Key::K]);
    harness.frame(&[Key::L, Key::K]);
    let state = harness.scene.state();
    assert_relative_eq!(state.offset_x, 2.0 * step, epsilon = 1e-6);
    assert_relative_eq!(state.offset_y, 2.0 * step, epsilon = 1e-6);

    harness.frame(&[Key::N]);
    let zoom = harness.scene.state().zoom;
    harness.frame(&[Key::H, Key::J]);
    let state = harness.scene.state();
    assert_relative_eq!(state.offset_x, 2.0 * step - step * zoom, epsilon = 1e-6);
    assert_relative_eq!(state.offset_y, 2.0 * step - step * zoom, epsilon = 1e-6);
    assert_eq!(
        harness.uniform("x_offset"),
        Some(UniformValue::Float(state.offset_x))
    );
    assert_eq!(
        harness.uniform("y_offset"),
        Some(UniformValue::Float(state.offset_y))
    );
}

#[test]
fn opposite_keys_in_one_frame_cancel_out() {
    let mut harness = Harness::new();
    assert_eq!(harness.frame(&[Key::N, Key::M]), 2);
    assert_relative_eq!(harness.scene.state().zoom, 1.0, epsilon = 1e-6);
}

#[test]
fn escape_requests_close() {
    let mut harness = Harness::new();
    assert_eq!(harness.frame(&[]), 0);
    assert!(!harness.keyboard.should_close());

    harness.frame(&[Key::Escape]);
    assert!(harness.keyboard.should_close());
}

#[test]
fn every_frame_draws_the_quad() {
    let mut harness = Harness::new();
    harness.frame(&[]);
    harness.frame(&[Key::N]);

    let draws = headless::draw_calls();
    assert_eq!(draws.len(), 2);
    assert!(draws.iter().all(|d| d.count == 6));
    assert!(draws
        .iter()
        .all(|d| d.program == harness.scene.program().id()));
}

#[test]
fn resize_updates_viewport_and_uniform() {
    let harness = Harness::new();
    let mut on_resize = harness.scene.resize_handler();

    on_resize(1280, 720);
    assert_eq!(headless::viewport(), [0, 0, 1280, 720]);
    assert_eq!(
        harness.uniform("view_port"),
        Some(UniformValue::Vec2(1280.0, 720.0))
    );

    on_resize(333, 777);
    assert_eq!(headless::viewport(), [0, 0, 333, 777]);
    assert_eq!(
        harness.uniform("view_port"),
        Some(UniformValue::Vec2(333.0, 777.0))
    );
}

#[test]
fn dropping_the_scene_releases_everything() {
    let harness = Harness::new();
    let live = headless::live_handles();
    assert_eq!((live.buffers, live.vertex_arrays, live.programs), (2, 1, 1));

    drop(harness);
    assert_eq!(headless::live_handles(), Default::default());
    assert_eq!(headless::double_deletes(), 0);
}

#[test]
fn missing_shader_directory_leaves_nothing_behind() {
    headless::init();
    let config = Config::default();
    let result = Scene::build(Path::new("/nonexistent/shaders"), &config, (800, 600));
    assert!(matches!(result, Err(BackendError::ShaderRead { .. })));

    let live = headless::live_handles();
    assert_eq!((live.shaders, live.programs), (0, 0));
}

#[test]
fn missing_color_map_fails_the_build() {
    headless::init();
    let mut config = Config::default();
    config.color_map = Some(PathBuf::from("/nonexistent/palette.png"));
    let result = Scene::build(&shaders_dir(), &config, (800, 600));
    assert!(matches!(result, Err(BackendError::ImageLoad { .. })));
    assert_eq!(headless::live_handles(), Default::default());
}
