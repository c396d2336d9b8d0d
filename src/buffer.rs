//! GPU buffers.
//!
//! A `Buffer` is allocated once with a fixed byte size; after that, only sub-range writes within
//! that size are allowed.

use std::error::Error;
use std::fmt;
use std::rc::Rc;

use crate::backend::{BufferKind, BufferUsage, ObjectKind};
use crate::gpu::Gpu;
use crate::handle::Handle;

/// Error that might occur while allocating or updating a buffer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BufferError {
  /// The buffer has no storage yet.
  NotAllocated,
  /// The buffer storage was already allocated with the given size.
  AlreadyAllocated(usize),
  /// The write `[offset, offset + len)` does not fit in `size` bytes.
  OutOfRange { offset: usize, len: usize, size: usize },
  /// The buffer handle was destroyed or never created.
  Destroyed,
}

impl fmt::Display for BufferError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      BufferError::NotAllocated => f.write_str("buffer not allocated"),
      BufferError::AlreadyAllocated(size) => write!(f, "buffer already allocated ({} bytes)", size),
      BufferError::OutOfRange { offset, len, size } =>
        write!(f, "write of {} bytes at offset {} out of range ({} bytes)", len, offset, size),
      BufferError::Destroyed => f.write_str("buffer destroyed"),
    }
  }
}

impl Error for BufferError {}

/// Buffer of a given kind.
#[derive(Debug)]
pub struct Buffer {
  handle: Handle,
  kind: BufferKind,
  size: Option<usize>,
}

impl Buffer {
  /// Create a buffer without storage.
  pub fn new(gpu: &Rc<Gpu>, kind: BufferKind) -> Self {
    Buffer {
      handle: Handle::create(gpu, ObjectKind::Buffer),
      kind,
      size: None,
    }
  }

  /// Create a buffer, allocate it to the size of `bytes` and fill it.
  pub fn from_bytes(gpu: &Rc<Gpu>, kind: BufferKind, bytes: &[u8], usage: BufferUsage) -> Result<Self, BufferError> {
    let mut buffer = Buffer::new(gpu, kind);
    buffer.allocate(bytes.len(), usage)?;
    buffer.update(0, bytes)?;
    Ok(buffer)
  }

  pub fn kind(&self) -> BufferKind {
    self.kind
  }

  pub fn id(&self) -> u32 {
    self.handle.id()
  }

  /// Allocated size in bytes, if allocated.
  pub fn size(&self) -> Option<usize> {
    self.size
  }

  pub fn is_valid(&self) -> bool {
    self.handle.is_valid()
  }

  /// Allocate the storage. A buffer is never resized, so this can only happen once.
  pub fn allocate(&mut self, size: usize, usage: BufferUsage) -> Result<(), BufferError> {
    if !self.handle.is_valid() {
      return Err(BufferError::Destroyed);
    }

    if let Some(size) = self.size {
      return Err(BufferError::AlreadyAllocated(size));
    }

    self.handle.gpu().backend().buffer_storage(self.handle.id(), size, usage);
    self.size = Some(size);

    Ok(())
  }

  /// Write `data` into `[offset, offset + data.len())`.
  pub fn update(&self, offset: usize, data: &[u8]) -> Result<(), BufferError> {
    if !self.handle.is_valid() {
      return Err(BufferError::Destroyed);
    }

    let size = self.size.ok_or(BufferError::NotAllocated)?;
    let in_range = offset.checked_add(data.len()).map_or(false, |end| end <= size);

    if !in_range {
      return Err(BufferError::OutOfRange { offset, len: data.len(), size });
    }

    self.handle.gpu().backend().buffer_sub_data(self.handle.id(), offset, data);
    Ok(())
  }

  /// Bind the buffer to the indexed binding point `index` of its kind.
  pub fn bind_base(&self, index: u32) {
    if !self.handle.is_valid() {
      return;
    }

    self.handle.gpu().backend().bind_buffer_base(self.kind, index, self.handle.id());
  }

  /// Release the buffer. Idempotent.
  pub fn destroy(&mut self) {
    self.handle.destroy();
    self.size = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::{Call, RecordingBackend};

  fn gpu() -> (RecordingBackend, Rc<Gpu>) {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    (backend, gpu)
  }

  #[test]
  fn allocate_once() {
    let (_, gpu) = gpu();
    let mut buffer = Buffer::new(&gpu, BufferKind::Array);

    assert_eq!(buffer.allocate(16, BufferUsage::StaticDraw), Ok(()));
    assert_eq!(buffer.allocate(32, BufferUsage::StaticDraw), Err(BufferError::AlreadyAllocated(16)));
    assert_eq!(buffer.size(), Some(16));
  }

  #[test]
  fn update_before_allocation() {
    let (_, gpu) = gpu();
    let buffer = Buffer::new(&gpu, BufferKind::Uniform);

    assert_eq!(buffer.update(0, &[1, 2, 3]), Err(BufferError::NotAllocated));
  }

  #[test]
  fn update_out_of_range() {
    let (backend, gpu) = gpu();
    let mut buffer = Buffer::new(&gpu, BufferKind::Uniform);
    buffer.allocate(8, BufferUsage::DynamicDraw).unwrap();

    assert_eq!(buffer.update(4, &[0; 5]), Err(BufferError::OutOfRange { offset: 4, len: 5, size: 8 }));
    assert_eq!(buffer.update(usize::max_value(), &[0; 2]),
               Err(BufferError::OutOfRange { offset: usize::max_value(), len: 2, size: 8 }));
    assert_eq!(backend.count(|call| match *call { Call::BufferSubData { .. } => true, _ => false }), 0);
  }

  #[test]
  fn update_writes_exact_range() {
    let (backend, gpu) = gpu();
    let buffer = Buffer::from_bytes(&gpu, BufferKind::Array, &[0; 8], BufferUsage::StaticDraw).unwrap();

    buffer.update(2, &[7, 7, 7]).unwrap();

    assert_eq!(backend.buffer_contents(buffer.id()).unwrap(), vec![0, 0, 7, 7, 7, 0, 0, 0]);
  }

  #[test]
  fn destroyed_buffer_refuses_updates() {
    let (backend, gpu) = gpu();
    let mut buffer = Buffer::from_bytes(&gpu, BufferKind::Array, &[1; 4], BufferUsage::StaticDraw).unwrap();
    let id = buffer.id();

    buffer.destroy();
    buffer.destroy();

    assert_eq!(buffer.update(0, &[0]), Err(BufferError::Destroyed));
    assert!(!backend.is_live(id));
    assert_eq!(backend.invalid_deletions(), 0);
  }
}
