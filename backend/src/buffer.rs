use super::glutils::*;
use gl::{types::*, *};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Per-vertex attribute data (`GL_ARRAY_BUFFER`).
    Vertex,
    /// Indices into the vertex data (`GL_ELEMENT_ARRAY_BUFFER`).
    Index,
}

impl BufferKind {
    pub fn target(self) -> GLenum {
        match self {
            BufferKind::Vertex => ARRAY_BUFFER,
            BufferKind::Index => ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// A GPU buffer with static contents. Move-only; the handle is released on drop.
#[derive(Debug)]
pub struct GpuBuffer {
    id: u32,
    kind: BufferKind,
}

impl GpuBuffer {
    /// Allocates a buffer, binds it and uploads `data` once.
    pub fn make<T: Copy>(kind: BufferKind, data: &[T]) -> GpuBuffer {
        let mut id = 0;
        unsafe { gl::GenBuffers(1, &mut id) };
        let buffer = GpuBuffer { id, kind };
        buffer.bind();
        gl_buffer_data_stat(kind.target(), data);
        log::debug!(
            "buffer({}): uploaded {} bytes of {:?} data",
            id,
            std::mem::size_of_val(data),
            kind
        );
        buffer
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn bind(&self) {
        unsafe { gl::BindBuffer(self.kind.target(), self.id) };
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        unsafe { gl::DeleteBuffers(1, &self.id) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless;

    #[test]
    fn make_uploads_static_data() {
        headless::init();
        let data = [1.0f32, 2.0, 3.0];
        let buffer = GpuBuffer::make(BufferKind::Vertex, &data);

        assert_eq!(buffer.kind(), BufferKind::Vertex);
        let upload = headless::buffer_upload(buffer.id()).unwrap();
        assert_eq!(upload.target, ARRAY_BUFFER);
        assert_eq!(upload.size, 12);
        assert_eq!(upload.usage, STATIC_DRAW);
        assert_eq!(headless::live_handles().buffers, 1);
    }

    #[test]
    fn moved_buffer_is_released_once() {
        headless::init();
        let buffer = GpuBuffer::make(BufferKind::Index, &[0u32, 1, 2]);
        let moved = vec![buffer];
        assert_eq!(headless::live_handles().buffers, 1);
        drop(moved);
        assert_eq!(headless::live_handles().buffers, 0);
        assert_eq!(headless::double_deletes(), 0);
    }
}
