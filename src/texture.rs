//! Textures.
//!
//! A single `Texture` type covers every dimensionality; the [`TextureTarget`] is carried as a
//! runtime tag. Binding goes through the per-target cache of the [`Gpu`] so that re-binding the
//! texture already bound to a target doesn’t reach the driver. Targets have independent caches:
//! binding a 2D texture leaves the 1D cache alone.

use log::debug;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

pub use crate::backend::{Filter, ImageDesc, PixelFormat, TextureTarget};
use crate::backend::ObjectKind;
use crate::gpu::Gpu;
use crate::handle::Handle;

/// Error that might occur while uploading a texture image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TextureError {
  /// The image shape doesn’t fit the texture target.
  ImageMismatch(TextureTarget, ImageDesc),
  /// The pixel slice doesn’t have the expected length in bytes.
  PixelSizeMismatch { expected: usize, got: usize },
  /// The image byte size doesn’t fit in memory.
  TooLarge(ImageDesc),
  /// The texture handle was destroyed or never created.
  Destroyed,
}

impl fmt::Display for TextureError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      TextureError::ImageMismatch(target, ref desc) =>
        write!(f, "image {:?} doesn’t fit a {:?} texture", desc, target),
      TextureError::PixelSizeMismatch { expected, got } =>
        write!(f, "expected {} bytes of pixels, got {}", expected, got),
      TextureError::TooLarge(ref desc) => write!(f, "image {:?} is too large", desc),
      TextureError::Destroyed => f.write_str("texture destroyed"),
    }
  }
}

impl Error for TextureError {}

#[derive(Debug)]
pub struct Texture {
  handle: Handle,
  target: TextureTarget,
}

impl Texture {
  /// Create a texture, bind it and set up linear filtering.
  ///
  /// Multisampled targets have no sampler state, so filtering is skipped for them.
  pub fn new(gpu: &Rc<Gpu>, target: TextureTarget) -> Self {
    let texture = Texture {
      handle: Handle::create(gpu, ObjectKind::Texture(target)),
      target,
    };

    if texture.handle.is_valid() {
      texture.bind();

      if !target.is_multisampled() {
        gpu.backend().texture_filter(texture.handle.id(), Filter::Linear, Filter::Linear);
      }
    }

    texture
  }

  pub fn target(&self) -> TextureTarget {
    self.target
  }

  pub fn id(&self) -> u32 {
    self.handle.id()
  }

  pub fn is_valid(&self) -> bool {
    self.handle.is_valid()
  }

  /// Is this texture the one cached as bound to its target?
  pub fn is_bound(&self) -> bool {
    self.handle.is_valid() && self.handle.gpu().bound_texture(self.target) == Some(self.handle.id())
  }

  /// Bind the texture to its target, unless it already is.
  ///
  /// Returns whether the driver was called.
  pub fn bind(&self) -> bool {
    if !self.handle.is_valid() {
      return false;
    }

    self.handle.gpu().bind_texture(self.target, self.handle.id())
  }

  /// Unbind the target, only if this texture is the bound one.
  ///
  /// Returns whether the driver was called.
  pub fn unbind(&self) -> bool {
    if !self.handle.is_valid() {
      return false;
    }

    self.handle.gpu().unbind_texture(self.target, self.handle.id())
  }

  /// Upload an image at a mipmap level.
  ///
  /// When `pixels` is given, its length must be exactly `width × height × depth` pixels of
  /// `format`. Multisampled images never take pixels.
  pub fn set_image(
    &self,
    level: u32,
    format: PixelFormat,
    desc: ImageDesc,
    pixels: Option<&[u8]>
  ) -> Result<(), TextureError> {
    if !self.handle.is_valid() {
      return Err(TextureError::Destroyed);
    }

    if !desc.fits(self.target) {
      return Err(TextureError::ImageMismatch(self.target, desc));
    }

    let pixels = if desc.is_multisampled() { None } else { pixels };

    if let Some(pixels) = pixels {
      let [w, h, d] = desc.size();
      let expected = (w as usize).checked_mul(h as usize)
        .and_then(|n| n.checked_mul(d as usize))
        .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
        .ok_or(TextureError::TooLarge(desc))?;

      if pixels.len() != expected {
        return Err(TextureError::PixelSizeMismatch { expected, got: pixels.len() });
      }
    }

    self.bind();
    self.handle.gpu().backend().texture_image(self.target, level, format, &desc, pixels);

    Ok(())
  }

  /// Release the texture. Idempotent.
  ///
  /// If the texture is cached as bound, the cache entry for its target is cleared.
  pub fn destroy(&mut self) {
    if self.handle.is_valid() {
      if self.is_bound() {
        debug!("destroying texture {} while bound to {:?}", self.handle.id(), self.target);
      }

      self.handle.gpu().forget_texture(self.target, self.handle.id());
    }

    self.handle.destroy();
  }
}

impl Drop for Texture {
  fn drop(&mut self) {
    self.destroy();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::{Call, RecordingBackend};

  fn bind_calls(backend: &RecordingBackend) -> usize {
    backend.count(|call| match *call { Call::BindTexture { .. } => true, _ => false })
  }

  #[test]
  fn creation_binds_and_filters() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let tex = Texture::new(&gpu, TextureTarget::D2);

    assert!(tex.is_bound());
    assert_eq!(backend.calls()[1..], [
      Call::BindTexture { target: TextureTarget::D2, texture: tex.id() },
      Call::TextureFilter { texture: tex.id(), min: Filter::Linear, mag: Filter::Linear },
    ]);
  }

  #[test]
  fn multisampled_textures_skip_filtering() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let _tex = Texture::new(&gpu, TextureTarget::D2Multisample);

    assert_eq!(backend.count(|call| match *call { Call::TextureFilter { .. } => true, _ => false }), 0);
  }

  #[test]
  fn redundant_binds_are_elided() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let a = Texture::new(&gpu, TextureTarget::D2);
    let b = Texture::new(&gpu, TextureTarget::D2);
    backend.take_calls();

    assert!(!b.bind());
    assert!(a.bind());
    assert!(!a.bind());
    assert_eq!(bind_calls(&backend), 1);
    assert!(a.is_bound());
    assert!(!b.is_bound());
  }

  #[test]
  fn unbind_only_when_bound() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let a = Texture::new(&gpu, TextureTarget::D2);
    let b = Texture::new(&gpu, TextureTarget::D2);
    backend.take_calls();

    assert!(!a.unbind());
    assert!(b.unbind());
    assert_eq!(gpu.bound_texture(TextureTarget::D2), None);
    assert_eq!(backend.calls(), vec![Call::BindTexture { target: TextureTarget::D2, texture: 0 }]);
  }

  #[test]
  fn targets_have_independent_caches() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let one = Texture::new(&gpu, TextureTarget::D1);
    let two = Texture::new(&gpu, TextureTarget::D2);

    assert!(one.is_bound());
    assert!(two.is_bound());
    assert_eq!(gpu.bound_texture(TextureTarget::D1), Some(one.id()));
    assert_eq!(gpu.bound_texture(TextureTarget::D2), Some(two.id()));
  }

  #[test]
  fn destroying_the_bound_texture_invalidates_the_cache() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let mut a = Texture::new(&gpu, TextureTarget::D2);

    a.destroy();
    assert_eq!(gpu.bound_texture(TextureTarget::D2), None);

    a.destroy();
    assert_eq!(backend.invalid_deletions(), 0);

    // a fresh texture must be bound for real
    let b = Texture::new(&gpu, TextureTarget::D2);
    assert!(b.is_bound());
    assert_eq!(backend.bound_texture(TextureTarget::D2), Some(b.id()));
  }

  #[test]
  fn image_shape_is_checked() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let tex = Texture::new(&gpu, TextureTarget::D1);
    let desc = ImageDesc::D2 { width: 2, height: 2 };

    assert_eq!(tex.set_image(0, PixelFormat::RGBA8, desc, None),
               Err(TextureError::ImageMismatch(TextureTarget::D1, desc)));
  }

  #[test]
  fn pixel_length_is_checked() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let tex = Texture::new(&gpu, TextureTarget::D2);
    let desc = ImageDesc::D2 { width: 2, height: 2 };

    assert_eq!(tex.set_image(0, PixelFormat::RGB8, desc, Some(&[0; 11])),
               Err(TextureError::PixelSizeMismatch { expected: 12, got: 11 }));
    assert_eq!(tex.set_image(0, PixelFormat::RGB8, desc, Some(&[0; 12])), Ok(()));
  }

  #[test]
  fn oversized_image_is_rejected() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let tex = Texture::new(&gpu, TextureTarget::D3);
    let desc = ImageDesc::D3 { width: u32::MAX, height: u32::MAX, depth: u32::MAX };
    backend.take_calls();

    assert_eq!(tex.set_image(0, PixelFormat::RGBA32F, desc, Some(&[0; 4])), Err(TextureError::TooLarge(desc)));
    assert!(backend.calls().is_empty());
  }

  #[test]
  fn multisample_array_storage() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let tex = Texture::new(&gpu, TextureTarget::D2MultisampleArray);
    let desc = ImageDesc::MultisampleArray { samples: 4, width: 8, height: 8, layers: 3, fixed_sample_locations: true };

    assert_eq!(tex.set_image(0, PixelFormat::RGBA8, desc, Some(&[0; 16])), Ok(()));
    assert_eq!(backend.calls().last(), Some(&Call::TextureImage {
      target: TextureTarget::D2MultisampleArray,
      level: 0,
      format: PixelFormat::RGBA8,
      desc,
      with_pixels: false,
    }));
  }

  #[test]
  fn set_image_binds_first() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let a = Texture::new(&gpu, TextureTarget::D2);
    let _b = Texture::new(&gpu, TextureTarget::D2);
    backend.take_calls();

    a.set_image(1, PixelFormat::R8, ImageDesc::D2 { width: 4, height: 4 }, None).unwrap();

    assert_eq!(backend.calls(), vec![
      Call::BindTexture { target: TextureTarget::D2, texture: a.id() },
      Call::TextureImage {
        target: TextureTarget::D2,
        level: 1,
        format: PixelFormat::R8,
        desc: ImageDesc::D2 { width: 4, height: 4 },
        with_pixels: false
      },
    ]);
  }
}
