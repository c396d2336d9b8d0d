//! Off-screen render targets.
//!
//! Attachments are non-owning: a framebuffer only remembers which texture or renderbuffer was
//! attached to which point, it never extends their lifetime. Completeness must be checked with
//! [`Framebuffer::check_complete`] after attaching and before rendering; an incomplete framebuffer
//! is still usable, it just yields undefined results.

use log::warn;
use std::rc::Rc;

pub use crate::backend::{Attachment, FramebufferStatus, FramebufferTarget};
use crate::backend::{ObjectKind, PixelFormat};
use crate::gpu::Gpu;
use crate::handle::Handle;
use crate::texture::Texture;

/// Renderbuffer, an image storage that can only be rendered into.
#[derive(Debug)]
pub struct Renderbuffer {
  handle: Handle,
  storage: Option<(PixelFormat, u32, u32)>,
}

impl Renderbuffer {
  pub fn new(gpu: &Rc<Gpu>) -> Self {
    Renderbuffer {
      handle: Handle::create(gpu, ObjectKind::Renderbuffer),
      storage: None,
    }
  }

  pub fn id(&self) -> u32 {
    self.handle.id()
  }

  /// Format, width and height of the storage, if allocated.
  pub fn storage_info(&self) -> Option<(PixelFormat, u32, u32)> {
    self.storage
  }

  /// Allocate (or reallocate) the storage.
  pub fn storage(&mut self, format: PixelFormat, width: u32, height: u32) {
    if !self.handle.is_valid() {
      return;
    }

    self.handle.gpu().backend().renderbuffer_storage(self.handle.id(), format, width, height);
    self.storage = Some((format, width, height));
  }

  pub fn destroy(&mut self) {
    self.handle.destroy();
    self.storage = None;
  }
}

/// Object attached to a framebuffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Attached {
  Texture { id: u32, level: u32 },
  Renderbuffer { id: u32 },
}

#[derive(Debug)]
pub struct Framebuffer {
  handle: Handle,
  attachments: Vec<(Attachment, Attached)>,
}

impl Framebuffer {
  pub fn new(gpu: &Rc<Gpu>) -> Self {
    Framebuffer {
      handle: Handle::create(gpu, ObjectKind::Framebuffer),
      attachments: Vec::new(),
    }
  }

  pub fn id(&self) -> u32 {
    self.handle.id()
  }

  /// Current attachments, one per attachment point.
  pub fn attachments(&self) -> &[(Attachment, Attached)] {
    &self.attachments
  }

  fn remember(&mut self, point: Attachment, attached: Attached) {
    self.attachments.retain(|&(p, _)| p != point);
    self.attachments.push((point, attached));
  }

  /// Attach a mipmap level of a texture. Replaces whatever was attached to `point`.
  ///
  /// Does nothing if either object was destroyed.
  pub fn attach_texture(&mut self, texture: &Texture, point: Attachment, level: u32) {
    if !self.handle.is_valid() || !texture.is_valid() {
      return;
    }

    self.handle.gpu().backend().framebuffer_texture(self.handle.id(), point, texture.id(), level);
    self.remember(point, Attached::Texture { id: texture.id(), level });
  }

  /// Attach a renderbuffer. Replaces whatever was attached to `point`.
  pub fn attach_renderbuffer(&mut self, renderbuffer: &Renderbuffer, point: Attachment) {
    if !self.handle.is_valid() || renderbuffer.id() == 0 {
      return;
    }

    self.handle.gpu().backend().framebuffer_renderbuffer(self.handle.id(), point, renderbuffer.id());
    self.remember(point, Attached::Renderbuffer { id: renderbuffer.id() });
  }

  /// Query the completeness status. Incompleteness is logged, not treated as an error.
  ///
  /// A destroyed framebuffer is [`FramebufferStatus::Undefined`].
  pub fn check_complete(&self) -> FramebufferStatus {
    if !self.handle.is_valid() {
      warn!("completeness of a destroyed framebuffer");
      return FramebufferStatus::Undefined;
    }

    let status = self.handle.gpu().backend().framebuffer_status(self.handle.id());

    if !status.is_complete() {
      warn!("framebuffer {} is incomplete: {}", self.handle.id(), status);
    }

    status
  }

  /// Bind for rendering. A destroyed framebuffer is never bound: that would bind the window one.
  pub fn bind(&self, target: FramebufferTarget) {
    if !self.handle.is_valid() {
      return;
    }

    self.handle.gpu().backend().bind_framebuffer(target, self.handle.id());
  }

  /// Bind the window framebuffer back.
  pub fn bind_default(gpu: &Gpu, target: FramebufferTarget) {
    gpu.backend().bind_framebuffer(target, 0);
  }

  pub fn destroy(&mut self) {
    self.handle.destroy();
    self.attachments.clear();
  }
}
