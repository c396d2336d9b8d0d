//! Owned GPU object identifiers.

use log::error;
use std::fmt;
use std::rc::Rc;

use crate::backend::ObjectKind;
use crate::gpu::Gpu;

/// Scoped owner of a single GPU object.
///
/// A handle holds either `0` or an identifier created for its category. Destroying releases the
/// object exactly once and resets the identifier to `0`; destroying again is a no-op. Dropping a
/// handle destroys it.
pub struct Handle {
  gpu: Rc<Gpu>,
  kind: ObjectKind,
  id: u32,
}

impl Handle {
  /// Create a new object of the given category.
  ///
  /// A creation failure is logged and leaves the handle invalid.
  pub fn create(gpu: &Rc<Gpu>, kind: ObjectKind) -> Self {
    let id = gpu.backend().create_object(kind);

    if id == 0 {
      error!("cannot create {}", kind);
    }

    Handle { gpu: gpu.clone(), kind, id }
  }

  /// Take ownership of an identifier returned by a category-specific creation call.
  pub fn adopt(gpu: &Rc<Gpu>, kind: ObjectKind, id: u32) -> Self {
    Handle { gpu: gpu.clone(), kind, id }
  }

  pub fn id(&self) -> u32 {
    self.id
  }

  pub fn kind(&self) -> ObjectKind {
    self.kind
  }

  pub fn is_valid(&self) -> bool {
    self.id != 0
  }

  pub fn gpu(&self) -> &Rc<Gpu> {
    &self.gpu
  }

  /// Release the object. Idempotent.
  pub fn destroy(&mut self) {
    if self.id != 0 {
      self.gpu.backend().delete_object(self.kind, self.id);
      self.id = 0;
    }
  }
}

impl Drop for Handle {
  fn drop(&mut self) {
    self.destroy();
  }
}

impl fmt::Debug for Handle {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    write!(f, "Handle {{ kind: {:?}, id: {} }}", self.kind, self.id)
  }
}
