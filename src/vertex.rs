//! Vertex arrays.

use std::rc::Rc;

use crate::backend::ObjectKind;
use crate::buffer::Buffer;
use crate::gpu::Gpu;
use crate::handle::Handle;

/// Vertex array, mapping attribute indices to vertex buffers.
///
/// Buffers are referenced, not owned.
#[derive(Debug)]
pub struct VertexArray {
  handle: Handle,
}

impl VertexArray {
  pub fn new(gpu: &Rc<Gpu>) -> Self {
    VertexArray {
      handle: Handle::create(gpu, ObjectKind::VertexArray),
    }
  }

  pub fn id(&self) -> u32 {
    self.handle.id()
  }

  /// Source the float attribute `index` from `buffer`, `components` floats per vertex, vertices
  /// `stride` bytes apart.
  pub fn attribute(&self, index: u32, buffer: &Buffer, components: u32, stride: u32) {
    if !self.handle.is_valid() || !buffer.is_valid() {
      return;
    }

    self.handle.gpu().backend().vertex_array_attrib(self.handle.id(), index, buffer.id(), components, stride);
  }

  pub fn bind(&self) {
    if !self.handle.is_valid() {
      return;
    }

    self.handle.gpu().backend().bind_vertex_array(self.handle.id());
  }

  pub fn destroy(&mut self) {
    self.handle.destroy();
  }
}
