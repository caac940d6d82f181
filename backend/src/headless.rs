//! Headless GL for tests.
//!
//! [`init`] routes the `gl` crate's function pointers to the fakes below and resets the calling
//! thread's bookkeeping. Each test thread sees its own GL state, so tests stay independent while
//! still exercising the real wrapper code.
//!
//! The fakes follow GL closely enough for the wrappers: shaders "compile" when the source has a
//! `void main` and no `#error`, programs link when they have at least one vertex and one fragment
//! stage, and uniform locations are assigned from `uniform` declarations in the attached sources.

use gl::types::*;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ffi::{c_void, CStr};
use std::sync::Once;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiveHandles {
    pub buffers: usize,
    pub vertex_arrays: usize,
    pub shaders: usize,
    pub programs: usize,
    pub textures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferUpload {
    pub target: GLenum,
    pub size: usize,
    pub usage: GLenum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub vertex_array: u32,
    pub program: u32,
    pub count: i32,
}

struct FakeShader {
    kind: GLenum,
    source: String,
    compiled: bool,
}

#[derive(Default)]
struct FakeProgram {
    attached: Vec<u32>,
    linked: bool,
    info_log: String,
    uniforms: Vec<String>,
    values: HashMap<i32, UniformValue>,
}

#[derive(Default)]
struct FakeVertexArray {
    element_buffer: Option<u32>,
    attribs: HashMap<u32, bool>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    error: GLenum,
    double_deletes: usize,
    buffers: HashMap<u32, Option<BufferUpload>>,
    bound_buffers: HashMap<GLenum, u32>,
    vertex_arrays: HashMap<u32, FakeVertexArray>,
    bound_vertex_array: u32,
    shaders: HashMap<u32, FakeShader>,
    programs: HashMap<u32, FakeProgram>,
    current_program: u32,
    textures: HashSet<u32>,
    viewport: [i32; 4],
    draws: Vec<DrawCall>,
}

impl State {
    fn gen(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn raise(&mut self, error: GLenum) {
        if self.error == gl::NO_ERROR {
            self.error = error;
        }
    }
}

thread_local! {
    static STATE: RefCell<State> = RefCell::new(State::default());
}

fn with<R>(f: impl FnOnce(&mut State) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

static LOAD: Once = Once::new();

/// Loads the fake entry points (once per process) and resets this thread's GL state.
pub fn init() {
    LOAD.call_once(|| gl::load_with(resolve));
    with(|state| *state = State::default());
}

/// Handles allocated and not yet deleted on this thread.
pub fn live_handles() -> LiveHandles {
    with(|s| LiveHandles {
        buffers: s.buffers.len(),
        vertex_arrays: s.vertex_arrays.len(),
        shaders: s.shaders.len(),
        programs: s.programs.len(),
        textures: s.textures.len(),
    })
}

/// Deletions of handles that were not live.
pub fn double_deletes() -> usize {
    with(|s| s.double_deletes)
}

pub fn viewport() -> [i32; 4] {
    with(|s| s.viewport)
}

pub fn current_program() -> u32 {
    with(|s| s.current_program)
}

pub fn bound_vertex_array() -> u32 {
    with(|s| s.bound_vertex_array)
}

pub fn buffer_upload(buffer: u32) -> Option<BufferUpload> {
    with(|s| s.buffers.get(&buffer).copied().flatten())
}

pub fn element_buffer_of(vertex_array: u32) -> Option<u32> {
    with(|s| {
        s.vertex_arrays
            .get(&vertex_array)
            .and_then(|v| v.element_buffer)
    })
}

pub fn attrib_enabled(vertex_array: u32, index: u32) -> Option<bool> {
    with(|s| {
        s.vertex_arrays
            .get(&vertex_array)
            .and_then(|v| v.attribs.get(&index).copied())
    })
}

/// Last value assigned to uniform `name` of `program`.
pub fn uniform(program: u32, name: &str) -> Option<UniformValue> {
    with(|s| {
        let program = s.programs.get(&program)?;
        let location = program.uniforms.iter().position(|u| u == name)? as i32;
        program.values.get(&location).copied()
    })
}

pub fn draw_calls() -> Vec<DrawCall> {
    with(|s| s.draws.clone())
}

fn resolve(name: &'static str) -> *const c_void {
    match name {
        "glGetError" => get_error as *const c_void,
        "glGetString" => get_string as *const c_void,
        "glGetIntegerv" => get_integerv as *const c_void,
        "glViewport" => viewport_fn as *const c_void,
        "glClearColor" => clear_color as *const c_void,
        "glClear" => clear as *const c_void,
        "glDrawElements" => draw_elements as *const c_void,
        "glGenBuffers" => gen_buffers as *const c_void,
        "glBindBuffer" => bind_buffer as *const c_void,
        "glBufferData" => buffer_data as *const c_void,
        "glDeleteBuffers" => delete_buffers as *const c_void,
        "glGenVertexArrays" => gen_vertex_arrays as *const c_void,
        "glBindVertexArray" => bind_vertex_array as *const c_void,
        "glDeleteVertexArrays" => delete_vertex_arrays as *const c_void,
        "glVertexAttribPointer" => vertex_attrib_pointer as *const c_void,
        "glEnableVertexAttribArray" => enable_vertex_attrib_array as *const c_void,
        "glDisableVertexAttribArray" => disable_vertex_attrib_array as *const c_void,
        "glCreateShader" => create_shader as *const c_void,
        "glShaderSource" => shader_source as *const c_void,
        "glCompileShader" => compile_shader as *const c_void,
        "glGetShaderiv" => get_shaderiv as *const c_void,
        "glGetShaderInfoLog" => get_shader_info_log as *const c_void,
        "glDeleteShader" => delete_shader as *const c_void,
        "glCreateProgram" => create_program as *const c_void,
        "glAttachShader" => attach_shader as *const c_void,
        "glLinkProgram" => link_program as *const c_void,
        "glGetProgramiv" => get_programiv as *const c_void,
        "glGetProgramInfoLog" => get_program_info_log as *const c_void,
        "glDeleteProgram" => delete_program as *const c_void,
        "glUseProgram" => use_program as *const c_void,
        "glGetUniformLocation" => get_uniform_location as *const c_void,
        "glUniform1f" => uniform1f as *const c_void,
        "glUniform1i" => uniform1i as *const c_void,
        "glUniform2f" => uniform2f as *const c_void,
        "glGenTextures" => gen_textures as *const c_void,
        "glBindTexture" => bind_texture as *const c_void,
        "glTexParameteri" => tex_parameteri as *const c_void,
        "glTexImage2D" => tex_image_2d as *const c_void,
        "glGenerateMipmap" => generate_mipmap as *const c_void,
        "glActiveTexture" => active_texture as *const c_void,
        "glDeleteTextures" => delete_textures as *const c_void,
        _ => std::ptr::null(),
    }
}

// --- state queries -------------------------------------------------------------------------

extern "system" fn get_error() -> GLenum {
    with(|s| std::mem::replace(&mut s.error, gl::NO_ERROR))
}

extern "system" fn get_string(name: GLenum) -> *const GLubyte {
    let text: &'static [u8] = match name {
        gl::VERSION => b"3.3 (headless)\0",
        gl::RENDERER => b"headless\0",
        _ => b"\0",
    };
    text.as_ptr()
}

extern "system" fn get_integerv(_pname: GLenum, data: *mut GLint) {
    if !data.is_null() {
        unsafe { *data = 16 };
    }
}

extern "system" fn viewport_fn(x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
    with(|s| {
        if width < 0 || height < 0 {
            s.raise(gl::INVALID_VALUE);
            return;
        }
        s.viewport = [x, y, width, height];
    })
}

extern "system" fn clear_color(_r: GLfloat, _g: GLfloat, _b: GLfloat, _a: GLfloat) {}

extern "system" fn clear(_mask: GLbitfield) {}

extern "system" fn draw_elements(
    _mode: GLenum,
    count: GLsizei,
    _kind: GLenum,
    _indices: *const c_void,
) {
    with(|s| {
        let vao = s.bound_vertex_array;
        let has_indices = s
            .vertex_arrays
            .get(&vao)
            .map_or(false, |v| v.element_buffer.is_some());
        if s.current_program == 0 || !has_indices {
            s.raise(gl::INVALID_OPERATION);
            return;
        }
        s.draws.push(DrawCall {
            vertex_array: vao,
            program: s.current_program,
            count,
        });
    })
}

// --- buffers and vertex arrays -------------------------------------------------------------

extern "system" fn gen_buffers(n: GLsizei, buffers: *mut GLuint) {
    with(|s| {
        for i in 0..n.max(0) as usize {
            let id = s.gen();
            s.buffers.insert(id, None);
            unsafe { *buffers.add(i) = id };
        }
    })
}

extern "system" fn bind_buffer(target: GLenum, buffer: GLuint) {
    with(|s| {
        s.bound_buffers.insert(target, buffer);
        if target == gl::ELEMENT_ARRAY_BUFFER && s.bound_vertex_array != 0 {
            let vao = s.bound_vertex_array;
            if let Some(v) = s.vertex_arrays.get_mut(&vao) {
                v.element_buffer = (buffer != 0).then_some(buffer);
            }
        }
    })
}

extern "system" fn buffer_data(
    target: GLenum,
    size: GLsizeiptr,
    _data: *const c_void,
    usage: GLenum,
) {
    with(|s| {
        let bound = s.bound_buffers.get(&target).copied().unwrap_or(0);
        match s.buffers.get_mut(&bound) {
            Some(slot) => {
                *slot = Some(BufferUpload {
                    target,
                    size: size as usize,
                    usage,
                })
            }
            None => s.raise(gl::INVALID_OPERATION),
        }
    })
}

extern "system" fn delete_buffers(n: GLsizei, buffers: *const GLuint) {
    with(|s| {
        for i in 0..n.max(0) as usize {
            let id = unsafe { *buffers.add(i) };
            if s.buffers.remove(&id).is_none() {
                s.double_deletes += 1;
            }
        }
    })
}

extern "system" fn gen_vertex_arrays(n: GLsizei, arrays: *mut GLuint) {
    with(|s| {
        for i in 0..n.max(0) as usize {
            let id = s.gen();
            s.vertex_arrays.insert(id, FakeVertexArray::default());
            unsafe { *arrays.add(i) = id };
        }
    })
}

extern "system" fn bind_vertex_array(array: GLuint) {
    with(|s| {
        if array != 0 && !s.vertex_arrays.contains_key(&array) {
            s.raise(gl::INVALID_OPERATION);
            return;
        }
        s.bound_vertex_array = array;
    })
}

extern "system" fn delete_vertex_arrays(n: GLsizei, arrays: *const GLuint) {
    with(|s| {
        for i in 0..n.max(0) as usize {
            let id = unsafe { *arrays.add(i) };
            if s.vertex_arrays.remove(&id).is_none() {
                s.double_deletes += 1;
            }
            if s.bound_vertex_array == id {
                s.bound_vertex_array = 0;
            }
        }
    })
}

extern "system" fn vertex_attrib_pointer(
    index: GLuint,
    _size: GLint,
    _kind: GLenum,
    _normalized: GLboolean,
    _stride: GLsizei,
    _pointer: *const c_void,
) {
    with(|s| {
        let vao = s.bound_vertex_array;
        match s.vertex_arrays.get_mut(&vao) {
            Some(v) => {
                v.attribs.entry(index).or_insert(false);
            }
            None => s.raise(gl::INVALID_OPERATION),
        }
    })
}

fn toggle_attrib(index: GLuint, enabled: bool) {
    with(|s| {
        let vao = s.bound_vertex_array;
        match s.vertex_arrays.get_mut(&vao) {
            Some(v) => {
                v.attribs.insert(index, enabled);
            }
            None => s.raise(gl::INVALID_OPERATION),
        }
    })
}

extern "system" fn enable_vertex_attrib_array(index: GLuint) {
    toggle_attrib(index, true);
}

extern "system" fn disable_vertex_attrib_array(index: GLuint) {
    toggle_attrib(index, false);
}

// --- shaders and programs ------------------------------------------------------------------

extern "system" fn create_shader(kind: GLenum) -> GLuint {
    with(|s| {
        if kind != gl::VERTEX_SHADER && kind != gl::FRAGMENT_SHADER {
            s.raise(gl::INVALID_ENUM);
            return 0;
        }
        let id = s.gen();
        s.shaders.insert(
            id,
            FakeShader {
                kind,
                source: String::new(),
                compiled: false,
            },
        );
        id
    })
}

extern "system" fn shader_source(
    shader: GLuint,
    count: GLsizei,
    string: *const *const GLchar,
    length: *const GLint,
) {
    let mut source = String::new();
    for i in 0..count.max(0) as usize {
        let ptr = unsafe { *string.add(i) };
        let bytes = if length.is_null() || unsafe { *length.add(i) } < 0 {
            unsafe { CStr::from_ptr(ptr) }.to_bytes()
        } else {
            let len = unsafe { *length.add(i) } as usize;
            unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len) }
        };
        source.push_str(&String::from_utf8_lossy(bytes));
    }
    with(|s| match s.shaders.get_mut(&shader) {
        Some(sh) => sh.source = source,
        None => s.raise(gl::INVALID_VALUE),
    })
}

extern "system" fn compile_shader(shader: GLuint) {
    with(|s| match s.shaders.get_mut(&shader) {
        Some(sh) => sh.compiled = sh.source.contains("void main") && !sh.source.contains("#error"),
        None => s.raise(gl::INVALID_VALUE),
    })
}

extern "system" fn get_shaderiv(shader: GLuint, pname: GLenum, params: *mut GLint) {
    with(|s| {
        let Some(sh) = s.shaders.get(&shader) else {
            s.raise(gl::INVALID_VALUE);
            return;
        };
        let value = match pname {
            gl::COMPILE_STATUS => sh.compiled as GLint,
            gl::SHADER_TYPE => sh.kind as GLint,
            _ => 0,
        };
        unsafe { *params = value };
    })
}

fn write_log(text: &str, buf_size: GLsizei, length: *mut GLsizei, info_log: *mut GLchar) {
    let n = text.len().min((buf_size.max(1) - 1) as usize);
    unsafe {
        std::ptr::copy_nonoverlapping(text.as_ptr(), info_log.cast::<u8>(), n);
        *info_log.add(n) = 0;
        if !length.is_null() {
            *length = n as GLsizei;
        }
    }
}

extern "system" fn get_shader_info_log(
    shader: GLuint,
    buf_size: GLsizei,
    length: *mut GLsizei,
    info_log: *mut GLchar,
) {
    let text = with(|s| {
        s.shaders.get(&shader).map(|sh| {
            if sh.compiled {
                String::new()
            } else {
                "0:1(1): error: syntax error, missing entry point or explicit #error".to_string()
            }
        })
    });
    match text {
        Some(text) => write_log(&text, buf_size, length, info_log),
        None => with(|s| s.raise(gl::INVALID_VALUE)),
    }
}

extern "system" fn delete_shader(shader: GLuint) {
    with(|s| {
        if s.shaders.remove(&shader).is_none() {
            s.double_deletes += 1;
        }
    })
}

extern "system" fn create_program() -> GLuint {
    with(|s| {
        let id = s.gen();
        s.programs.insert(id, FakeProgram::default());
        id
    })
}

extern "system" fn attach_shader(program: GLuint, shader: GLuint) {
    with(|s| {
        if !s.shaders.contains_key(&shader) {
            s.raise(gl::INVALID_VALUE);
            return;
        }
        match s.programs.get_mut(&program) {
            Some(p) => p.attached.push(shader),
            None => s.raise(gl::INVALID_VALUE),
        }
    })
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source.lines().filter_map(|line| {
        let mut words = line.split_whitespace();
        if words.next()? != "uniform" {
            return None;
        }
        let _kind = words.next()?;
        let name = words.next()?.trim_end_matches(';');
        let name = name.split('[').next()?;
        Some(name.to_string())
    })
}

extern "system" fn link_program(program: GLuint) {
    with(|s| {
        let Some(p) = s.programs.get(&program) else {
            s.raise(gl::INVALID_VALUE);
            return;
        };
        let stages: Vec<&FakeShader> = p
            .attached
            .iter()
            .filter_map(|id| s.shaders.get(id))
            .collect();

        let has = |kind| stages.iter().any(|sh| sh.kind == kind && sh.compiled);
        let (linked, info_log) = if !has(gl::VERTEX_SHADER) {
            (false, "error: no vertex shader attached".to_string())
        } else if !has(gl::FRAGMENT_SHADER) {
            (false, "error: no fragment shader attached".to_string())
        } else {
            (true, String::new())
        };

        let mut uniforms: Vec<String> = Vec::new();
        for sh in &stages {
            for name in declared_uniforms(&sh.source) {
                if !uniforms.contains(&name) {
                    uniforms.push(name);
                }
            }
        }

        if let Some(p) = s.programs.get_mut(&program) {
            p.linked = linked;
            p.info_log = info_log;
            p.uniforms = if linked { uniforms } else { Vec::new() };
            p.values.clear();
        }
    })
}

extern "system" fn get_programiv(program: GLuint, pname: GLenum, params: *mut GLint) {
    with(|s| {
        let Some(p) = s.programs.get(&program) else {
            s.raise(gl::INVALID_VALUE);
            return;
        };
        let value = match pname {
            gl::LINK_STATUS => p.linked as GLint,
            gl::ATTACHED_SHADERS => p.attached.len() as GLint,
            _ => 0,
        };
        unsafe { *params = value };
    })
}

extern "system" fn get_program_info_log(
    program: GLuint,
    buf_size: GLsizei,
    length: *mut GLsizei,
    info_log: *mut GLchar,
) {
    let text = with(|s| s.programs.get(&program).map(|p| p.info_log.clone()));
    match text {
        Some(text) => write_log(&text, buf_size, length, info_log),
        None => with(|s| s.raise(gl::INVALID_VALUE)),
    }
}

extern "system" fn delete_program(program: GLuint) {
    with(|s| {
        if s.programs.remove(&program).is_none() {
            s.double_deletes += 1;
        }
        if s.current_program == program {
            s.current_program = 0;
        }
    })
}

extern "system" fn use_program(program: GLuint) {
    with(|s| {
        if program != 0 && !s.programs.get(&program).map_or(false, |p| p.linked) {
            s.raise(gl::INVALID_OPERATION);
            return;
        }
        s.current_program = program;
    })
}

extern "system" fn get_uniform_location(program: GLuint, name: *const GLchar) -> GLint {
    let name = unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned();
    with(|s| match s.programs.get(&program) {
        Some(p) => p
            .uniforms
            .iter()
            .position(|u| *u == name)
            .map_or(-1, |i| i as GLint),
        None => {
            s.raise(gl::INVALID_VALUE);
            -1
        }
    })
}

fn set_uniform(location: GLint, value: UniformValue) {
    with(|s| {
        let current = s.current_program;
        let Some(p) = s.programs.get_mut(&current) else {
            s.raise(gl::INVALID_OPERATION);
            return;
        };
        if location == -1 {
            return;
        }
        if location < 0 || location as usize >= p.uniforms.len() {
            s.raise(gl::INVALID_OPERATION);
            return;
        }
        p.values.insert(location, value);
    })
}

extern "system" fn uniform1f(location: GLint, v0: GLfloat) {
    set_uniform(location, UniformValue::Float(v0));
}

extern "system" fn uniform1i(location: GLint, v0: GLint) {
    set_uniform(location, UniformValue::Int(v0));
}

extern "system" fn uniform2f(location: GLint, v0: GLfloat, v1: GLfloat) {
    set_uniform(location, UniformValue::Vec2(v0, v1));
}

// --- textures ------------------------------------------------------------------------------

extern "system" fn gen_textures(n: GLsizei, textures: *mut GLuint) {
    with(|s| {
        for i in 0..n.max(0) as usize {
            let id = s.gen();
            s.textures.insert(id);
            unsafe { *textures.add(i) = id };
        }
    })
}

extern "system" fn bind_texture(_target: GLenum, _texture: GLuint) {}

extern "system" fn tex_parameteri(_target: GLenum, _pname: GLenum, _param: GLint) {}

#[allow(clippy::too_many_arguments)]
extern "system" fn tex_image_2d(
    _target: GLenum,
    _level: GLint,
    _internal_format: GLint,
    _width: GLsizei,
    _height: GLsizei,
    _border: GLint,
    _format: GLenum,
    _kind: GLenum,
    _pixels: *const c_void,
) {
}

extern "system" fn generate_mipmap(_target: GLenum) {}

extern "system" fn active_texture(_texture: GLenum) {}

extern "system" fn delete_textures(n: GLsizei, textures: *const GLuint) {
    with(|s| {
        for i in 0..n.max(0) as usize {
            let id = unsafe { *textures.add(i) };
            if !s.textures.remove(&id) {
                s.double_deletes += 1;
            }
        }
    })
}
