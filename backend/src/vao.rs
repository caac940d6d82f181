use super::buffer::*;
use gl::{types::*, *};

/// Layout of one vertex attribute slot, as last configured through [`VertexArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribLayout {
    pub index: u32,
    pub size: i32,
    pub kind: GLenum,
    pub normalized: bool,
    /// Bytes between consecutive vertices.
    pub stride: usize,
    /// Byte offset of the first component.
    pub offset: usize,
    pub enabled: bool,
}

/// A vertex array object owning the buffers attached to it.
///
/// Each configuration call is wrapped in its own bind/unbind pair. Binding before a draw call is
/// left to the caller.
#[derive(Debug)]
pub struct VertexArray {
    id: u32,
    buffers: Vec<GpuBuffer>,
    attribs: Vec<AttribLayout>,
}

impl VertexArray {
    pub fn new() -> VertexArray {
        let mut id = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        VertexArray {
            id,
            buffers: Vec::new(),
            attribs: Vec::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn bind(&self) {
        unsafe { gl::BindVertexArray(self.id) };
    }

    pub fn unbind() {
        unsafe { gl::BindVertexArray(0) };
    }

    pub fn add_buffer<T: Copy>(&mut self, kind: BufferKind, data: &[T]) -> u32 {
        self.bind();
        let buffer = GpuBuffer::make(kind, data);
        let id = buffer.id();
        self.buffers.push(buffer);
        Self::unbind();
        id
    }

    pub fn vertex_attrib_ptr(
        &mut self,
        index: u32,
        size: i32,
        kind: GLenum,
        normalized: bool,
        stride: usize,
        offset: usize,
    ) {
        self.bind();
        unsafe {
            gl::VertexAttribPointer(
                index,
                size,
                kind,
                if normalized { TRUE } else { FALSE },
                stride as i32,
                offset as *const _,
            )
        };
        Self::unbind();

        let enabled = self.attrib(index).map_or(false, |a| a.enabled);
        let layout = AttribLayout {
            index,
            size,
            kind,
            normalized,
            stride,
            offset,
            enabled,
        };
        match self.attribs.iter_mut().find(|a| a.index == index) {
            Some(slot) => *slot = layout,
            None => self.attribs.push(layout),
        }
    }

    pub fn enable(&mut self, index: u32) {
        self.bind();
        unsafe { gl::EnableVertexAttribArray(index) };
        Self::unbind();
        self.set_enabled(index, true);
    }

    pub fn disable(&mut self, index: u32) {
        self.bind();
        unsafe { gl::DisableVertexAttribArray(index) };
        Self::unbind();
        self.set_enabled(index, false);
    }

    pub fn attrib(&self, index: u32) -> Option<&AttribLayout> {
        self.attribs.iter().find(|a| a.index == index)
    }

    pub fn buffers(&self) -> &[GpuBuffer] {
        &self.buffers
    }

    fn set_enabled(&mut self, index: u32, enabled: bool) {
        if let Some(slot) = self.attribs.iter_mut().find(|a| a.index == index) {
            slot.enabled = enabled;
        } else {
            log::warn!(
                "vao({}): toggling attribute {} before its pointer was configured",
                self.id,
                index
            );
        }
    }
}

impl Default for VertexArray {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        // buffers go first, the array object references them
        self.buffers.clear();
        unsafe { gl::DeleteVertexArrays(1, &self.id) };
    }
}
