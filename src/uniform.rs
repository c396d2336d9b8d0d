//! Uniform blocks.
//!
//! A `UniformBlock<T>` keeps a CPU-side copy of a `T` blob and a uniform buffer of exactly
//! `size_of::<T>()` bytes bound to a fixed binding index. Shaders reference the block through
//! that index (`layout (std140, binding = N) uniform ...`).
//!
//! Fields changing at different rates can be pushed separately with
//! [`set_field`](UniformBlock::set_field) or [`update_range`](UniformBlock::update_range)
//! instead of retransmitting the whole blob.

use bytemuck::Pod;
use std::mem;
use std::rc::Rc;

use crate::backend::{BufferKind, BufferUsage};
use crate::buffer::{Buffer, BufferError};
use crate::gpu::Gpu;

#[derive(Debug)]
pub struct UniformBlock<T> {
  binding: u32,
  data: T,
  buffer: Buffer,
}

impl<T> UniformBlock<T> where T: Pod {
  /// Allocate the block, bind it to `binding` and upload `data`.
  pub fn new(gpu: &Rc<Gpu>, binding: u32, data: T) -> Result<Self, BufferError> {
    let mut buffer = Buffer::new(gpu, BufferKind::Uniform);
    buffer.allocate(mem::size_of::<T>(), BufferUsage::DynamicDraw)?;
    buffer.bind_base(binding);

    let block = UniformBlock { binding, data, buffer };
    block.update()?;

    Ok(block)
  }

  pub fn binding(&self) -> u32 {
    self.binding
  }

  /// Size of the blob, which is also the size of the GPU allocation.
  pub fn size(&self) -> usize {
    mem::size_of::<T>()
  }

  pub fn buffer(&self) -> &Buffer {
    &self.buffer
  }

  pub fn data(&self) -> &T {
    &self.data
  }

  /// Mutable access to the CPU-side blob. Changes are not visible to the GPU until pushed.
  pub fn data_mut(&mut self) -> &mut T {
    &mut self.data
  }

  /// Push the whole blob.
  pub fn update(&self) -> Result<(), BufferError> {
    self.buffer.update(0, bytemuck::bytes_of(&self.data))
  }

  /// Push `[offset, offset + len)` of the blob.
  pub fn update_range(&self, offset: usize, len: usize) -> Result<(), BufferError> {
    let bytes = bytemuck::bytes_of(&self.data);
    let size = bytes.len();
    let end = offset.checked_add(len).filter(|&end| end <= size)
      .ok_or(BufferError::OutOfRange { offset, len, size })?;

    self.buffer.update(offset, &bytes[offset..end])
  }

  /// Overwrite the field located at byte `offset` with `value` and push only that field.
  ///
  /// Offsets are typically obtained with `std::mem::offset_of!`.
  pub fn set_field<F>(&mut self, offset: usize, value: &F) -> Result<(), BufferError> where F: Pod {
    let field = bytemuck::bytes_of(value);
    let len = field.len();
    let size = self.size();
    let end = offset.checked_add(len).filter(|&end| end <= size)
      .ok_or(BufferError::OutOfRange { offset, len, size })?;

    bytemuck::bytes_of_mut(&mut self.data)[offset..end].copy_from_slice(field);
    self.buffer.update(offset, field)
  }

  /// Release the GPU allocation. Idempotent.
  pub fn destroy(&mut self) {
    self.buffer.destroy();
  }
}
