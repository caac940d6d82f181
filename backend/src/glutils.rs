use gl::{types::*, *};
use std::ffi::CStr;

pub fn check_gl_err() {
    let err = unsafe { gl::GetError() };
    if err == gl::NO_ERROR {
        return;
    }
    panic!("error: {:?}", err);
}

fn gl_string(name: GLenum) -> String {
    let ptr = unsafe { gl::GetString(name) };
    if ptr.is_null() {
        return "<unknown>".to_string();
    }
    unsafe { CStr::from_ptr(ptr.cast()) }
        .to_string_lossy()
        .into_owned()
}

pub fn log_opengl_info() {
    log::info!("OpenGL version: {}", gl_string(VERSION));
    log::info!("OpenGL renderer: {}", gl_string(RENDERER));

    let mut mtu: i32 = 0;
    unsafe { gl::GetIntegerv(MAX_TEXTURE_IMAGE_UNITS, &mut mtu) };
    log::debug!("MAX_TEXTURE_IMAGE_UNITS = {}", mtu);
}

/// Uploads `buffer` into whatever is bound to `target`, as upload-once, draw-many content.
pub fn gl_buffer_data_stat<T: Sized>(target: GLenum, buffer: &[T]) {
    unsafe {
        gl::BufferData(
            target,
            std::mem::size_of_val(buffer) as isize,
            buffer.as_ptr().cast(),
            STATIC_DRAW,
        )
    };
}

pub fn set_viewport(w: u32, h: u32) {
    unsafe { gl::Viewport(0, 0, w as i32, h as i32) };
}

pub fn clear_screen(r: f32, g: f32, b: f32) {
    unsafe {
        gl::ClearColor(r, g, b, 1.0);
        gl::Clear(gl::COLOR_BUFFER_BIT);
    }
}

/// Draws `count` indices of `u32` from the element buffer of the bound vertex array.
pub fn draw_indexed_triangles(count: usize) {
    unsafe { gl::DrawElements(TRIANGLES, count as i32, UNSIGNED_INT, std::ptr::null()) };
}
