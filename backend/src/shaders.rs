use super::error::BackendError;
use super::glutils::*;
use gl::{types::*, *};
use std::ffi::{CStr, CString};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Infers the stage from the file suffix: `.vert` or `.frag`.
    pub fn from_path(path: &Path) -> Result<ShaderStage, BackendError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("vert") => Ok(ShaderStage::Vertex),
            Some("frag") => Ok(ShaderStage::Fragment),
            _ => Err(BackendError::UnsupportedShaderType(path.to_path_buf())),
        }
    }

    fn gl_kind(self) -> GLenum {
        match self {
            ShaderStage::Vertex => VERTEX_SHADER,
            ShaderStage::Fragment => FRAGMENT_SHADER,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

/// A compiled shader object, deleted when it goes out of scope.
struct Shader {
    id: u32,
}

impl Shader {
    /// Compiles `shader_code`; on failure returns the GL info log.
    fn compile(stage: ShaderStage, shader_code: &str) -> Result<Shader, String> {
        let id = unsafe { gl::CreateShader(stage.gl_kind()) };
        if id == 0 {
            return Err(format!("gl::CreateShader({}) failed", stage.name()));
        }
        let shader = Shader { id };

        unsafe {
            gl::ShaderSource(
                shader.id,
                1,
                &(shader_code.as_bytes().as_ptr().cast()),
                &(shader_code.len() as GLint),
            );
        }

        unsafe { gl::CompileShader(shader.id) };

        // check if there are compilation errors
        let mut success = 0;
        unsafe {
            gl::GetShaderiv(shader.id, COMPILE_STATUS, &mut success);
        }

        if success == 0 {
            let log = info_log(|capacity, len, buf| unsafe {
                gl::GetShaderInfoLog(shader.id, capacity, len, buf)
            });
            // `shader` is dropped here, releasing the object
            return Err(log);
        }
        Ok(shader)
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe { gl::DeleteShader(self.id) };
    }
}

const INFO_LOG_CAPACITY: usize = 1024;

fn info_log(fetch: impl FnOnce(GLsizei, *mut GLsizei, *mut GLchar)) -> String {
    let mut v: Vec<u8> = Vec::with_capacity(INFO_LOG_CAPACITY);
    let mut log_len = 0_i32;
    fetch(INFO_LOG_CAPACITY as GLsizei, &mut log_len, v.as_mut_ptr().cast());
    let len = (log_len.max(0) as usize).min(INFO_LOG_CAPACITY);
    unsafe { v.set_len(len) };
    String::from_utf8_lossy(&v).trim_end().to_string()
}

/// Values that can be assigned to a uniform. The implementing type picks the `glUniform*` call.
pub trait Uniform {
    fn apply(&self, location: GLint);
}

impl Uniform for f32 {
    fn apply(&self, location: GLint) {
        unsafe { gl::Uniform1f(location, *self) };
    }
}

impl Uniform for i32 {
    fn apply(&self, location: GLint) {
        unsafe { gl::Uniform1i(location, *self) };
    }
}

impl Uniform for (f32, f32) {
    fn apply(&self, location: GLint) {
        unsafe { gl::Uniform2f(location, self.0, self.1) };
    }
}

/// A linked GPU program. Move-only; the program object is deleted on drop.
#[derive(Debug)]
pub struct ShaderProgram {
    program_id: u32,
}

impl ShaderProgram {
    /// Builds a program from shader source files, one stage per file.
    ///
    /// Either every stage compiles and the program links, or an error is returned and every
    /// shader and program object created along the way has already been released.
    pub fn create_and_link<P: AsRef<Path>>(paths: &[P]) -> Result<ShaderProgram, BackendError> {
        let program_id = unsafe { gl::CreateProgram() };
        if program_id == 0 {
            return Err(BackendError::ProgramCreation);
        }
        let program = ShaderProgram { program_id };

        let mut shaders = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let stage = ShaderStage::from_path(path)?;
            let code = fs::read_to_string(path).map_err(|source| BackendError::ShaderRead {
                path: path.to_path_buf(),
                source,
            })?;

            let shader = Shader::compile(stage, &code).map_err(|log| {
                log::error!("{} shader error in {}: {}", stage.name(), path.display(), log);
                BackendError::ShaderCompile {
                    stage: stage.name(),
                    path: path.to_path_buf(),
                    log,
                }
            })?;
            unsafe { gl::AttachShader(program.program_id, shader.id) };
            shaders.push(shader);
        }

        unsafe { gl::LinkProgram(program.program_id) };

        let mut success = 0;
        unsafe {
            gl::GetProgramiv(program.program_id, LINK_STATUS, &mut success);
        }
        if success == 0 {
            let log = info_log(|capacity, len, buf| unsafe {
                gl::GetProgramInfoLog(program.program_id, capacity, len, buf)
            });
            log::error!("program link error: {}", log);
            return Err(BackendError::ProgramLink(log));
        }

        log::debug!(
            "program({}): linked from {} shader(s)",
            program.program_id,
            shaders.len()
        );
        // shader objects are not needed once the program is linked
        drop(shaders);
        Ok(program)
    }

    pub fn id(&self) -> u32 {
        self.program_id
    }

    fn get_uniform_location(&self, name: &str) -> i32 {
        let c_name = CString::new(name).unwrap_or_else(|_| {
            panic!("get_uniform_location: CString::new failed for '{}'", name);
        });

        self.get_uniform_location_cstr(&c_name)
    }

    fn get_uniform_location_cstr(&self, c_name: &CStr) -> i32 {
        let location = unsafe { gl::GetUniformLocation(self.program_id, c_name.as_ptr().cast()) };
        check_gl_err();
        if location == -1 {
            let name = c_name.to_str().unwrap_or("<cstring decoding error>");
            panic!(
                "program({}): location '{}' does not correspond to an active uniform variable in program",
                self.program_id,
                name
            );
        }
        location
    }

    pub fn use_program(&self) {
        unsafe { gl::UseProgram(self.program_id) };
        check_gl_err();
    }

    /// Assigns `value` to the uniform `name` of this program, which must be the active one.
    ///
    /// Panics if `name` is not an active uniform of the program.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) {
        let location = self.get_uniform_location(name);
        value.apply(location);
        check_gl_err();
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe { gl::DeleteProgram(self.program_id) };
    }
}
