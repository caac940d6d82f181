use crate::config::{Bindings, Config};
use crate::viewer::{Action, InteractionState, Viewer};
use backend::buffer::BufferKind;
use backend::glutils::{clear_screen, draw_indexed_triangles, set_viewport};
use backend::input::{Callback, Surface};
use backend::shaders::ShaderProgram;
use backend::texture::Texture;
use backend::vao::VertexArray;
use backend::BackendError;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

#[rustfmt::skip]
const QUAD_VERTICES: [f32; 12] = [
     1.0,  1.0, 0.0, // top right
     1.0, -1.0, 0.0, // bottom right
    -1.0, -1.0, 0.0, // bottom left
    -1.0,  1.0, 0.0, // top left
];

#[rustfmt::skip]
const QUAD_INDICES: [u32; 6] = [
    0, 1, 3, // first triangle
    1, 2, 3, // second triangle
];

const COLOR_MAP_UNIT: u32 = 0;

/// GPU side of the viewer: the full-screen quad, the Mandelbrot program and the view state
/// feeding its uniforms.
pub struct Scene {
    // reverse creation order, so resources are released last-created first
    viewer: Rc<RefCell<Viewer>>,
    color_map: Option<Texture>,
    program: Rc<ShaderProgram>,
    quad: VertexArray,
}

impl Scene {
    /// Builds every GPU resource and pushes the initial uniforms. The GL context must be current.
    pub fn build(
        shaders_dir: &Path,
        config: &Config,
        framebuffer: (u32, u32),
    ) -> Result<Scene, BackendError> {
        let quad = fullscreen_quad();

        let program = Rc::new(ShaderProgram::create_and_link(&[
            shaders_dir.join(&config.shaders.vertex),
            shaders_dir.join(&config.shaders.fragment),
        ])?);
        program.use_program();

        let color_map = match &config.color_map {
            Some(path) => {
                let texture = Texture::load(path)?;
                let (w, h) = texture.size();
                log::info!("colour map {}x{} from {}", w, h, path.display());
                texture.bind(COLOR_MAP_UNIT);
                program.set_uniform("color_map", COLOR_MAP_UNIT as i32);
                program.set_uniform("use_color_map", 1);
                Some(texture)
            }
            None => None,
        };

        let viewer = Rc::new(RefCell::new(Viewer::new(
            program.clone(),
            config.navigation.clone(),
        )));
        viewer.borrow().push_all();

        let (w, h) = framebuffer;
        on_frame_buffer_resize(&program, w, h);

        log::info!("scene ready, shaders from {}", shaders_dir.display());
        Ok(Scene {
            viewer,
            color_map,
            program,
            quad,
        })
    }

    pub fn state(&self) -> InteractionState {
        self.viewer.borrow().state()
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn has_color_map(&self) -> bool {
        self.color_map.is_some()
    }

    /// One callback per binding, each reacting while its key is held.
    pub fn callbacks(&self, bindings: &Bindings) -> Vec<Callback> {
        bindings
            .actions()
            .into_iter()
            .map(|(action, key)| {
                let viewer = self.viewer.clone();
                Box::new(move |surface: &mut dyn Surface| {
                    if !surface.is_key_pressed(key) {
                        return false;
                    }
                    match action {
                        Action::Quit => surface.set_should_close(),
                        _ => viewer.borrow_mut().apply(action),
                    }
                    true
                }) as Callback
            })
            .collect()
    }

    /// Keeps the viewport and the `view_port` uniform in sync with the framebuffer.
    pub fn resize_handler(&self) -> impl FnMut(u32, u32) + 'static {
        let program = self.program.clone();
        move |w, h| on_frame_buffer_resize(&program, w, h)
    }

    pub fn draw(&self) {
        clear_screen(0.0, 0.0, 0.0);
        self.quad.bind();
        draw_indexed_triangles(QUAD_INDICES.len());
    }
}

fn fullscreen_quad() -> VertexArray {
    let mut vao = VertexArray::new();
    vao.add_buffer(BufferKind::Vertex, &QUAD_VERTICES);
    vao.add_buffer(BufferKind::Index, &QUAD_INDICES);
    vao.vertex_attrib_ptr(0, 3, gl::FLOAT, false, 3 * std::mem::size_of::<f32>(), 0);
    vao.enable(0);
    vao
}

fn on_frame_buffer_resize(program: &ShaderProgram, w: u32, h: u32) {
    set_viewport(w, h);
    program.set_uniform("view_port", (w as f32, h as f32));
}
