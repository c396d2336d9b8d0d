//! Shared GPU context.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::backend::{Backend, TextureTarget};

/// Context shared by every GPU object.
///
/// It owns the backend and the per-target texture binding cache. The cache only remembers
/// identifiers; it never keeps a texture alive. Objects hold an `Rc<Gpu>` so that they can release
/// their handle when dropped.
pub struct Gpu {
  backend: Box<dyn Backend>,
  bound_textures: RefCell<HashMap<TextureTarget, u32>>,
}

impl Gpu {
  pub fn new<B>(backend: B) -> Rc<Self> where B: 'static + Backend {
    Rc::new(Gpu {
      backend: Box::new(backend),
      bound_textures: RefCell::new(HashMap::new()),
    })
  }

  pub fn backend(&self) -> &dyn Backend {
    &*self.backend
  }

  /// Texture currently cached as bound to `target`.
  pub fn bound_texture(&self, target: TextureTarget) -> Option<u32> {
    self.bound_textures.borrow().get(&target).cloned()
  }

  /// Bind `texture` to `target` unless it is already the cached one.
  ///
  /// Returns whether the driver was called.
  pub(crate) fn bind_texture(&self, target: TextureTarget, texture: u32) -> bool {
    let mut bound = self.bound_textures.borrow_mut();

    if bound.get(&target) == Some(&texture) {
      return false;
    }

    bound.insert(target, texture);
    self.backend.bind_texture(target, texture);
    true
  }

  /// Unbind `target` if `texture` is the cached one.
  ///
  /// Returns whether the driver was called.
  pub(crate) fn unbind_texture(&self, target: TextureTarget, texture: u32) -> bool {
    let mut bound = self.bound_textures.borrow_mut();

    if bound.get(&target) != Some(&texture) {
      return false;
    }

    bound.remove(&target);
    self.backend.bind_texture(target, 0);
    true
  }

  /// Drop `texture` from the cache without calling the driver.
  ///
  /// Used when the texture is about to be deleted: the driver reverts the binding itself.
  pub(crate) fn forget_texture(&self, target: TextureTarget, texture: u32) {
    let mut bound = self.bound_textures.borrow_mut();

    if bound.get(&target) == Some(&texture) {
      bound.remove(&target);
    }
  }
}

impl fmt::Debug for Gpu {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.debug_struct("Gpu")
      .field("bound_textures", &*self.bound_textures.borrow())
      .finish()
  }
}
