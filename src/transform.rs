//! Transform matrices shared with shaders.

use bytemuck::{Pod, Zeroable};
use nalgebra::{Matrix4, Rotation3, Vector3};
use std::mem;

/// Column-major 4×4 matrix, as laid out in a std140 uniform block.
pub type Mat44 = [[f32; 4]; 4];

/// Projection, view and model matrices, laid out as the `Transforms` std140 uniform block.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transforms {
  pub projection: Mat44,
  pub view: Mat44,
  pub model: Mat44,
}

impl Transforms {
  pub const PROJECTION_OFFSET: usize = mem::offset_of!(Transforms, projection);
  pub const VIEW_OFFSET: usize = mem::offset_of!(Transforms, view);
  pub const MODEL_OFFSET: usize = mem::offset_of!(Transforms, model);

  pub fn identity() -> Self {
    let id = Matrix4::<f32>::identity().into();

    Transforms {
      projection: id,
      view: id,
      model: id,
    }
  }
}

impl Default for Transforms {
  fn default() -> Self {
    Transforms::identity()
  }
}

/// Orthographic projection mapping the unit square to the viewport without stretching it.
pub fn aspect_projection(width: u32, height: u32) -> Mat44 {
  let w = width.max(1) as f32;
  let h = height.max(1) as f32;
  let (x, y) = if w >= h { (w / h, 1.) } else { (1., h / w) };

  Matrix4::new_orthographic(-x, x, -y, y, -1., 1.).into()
}

/// Rotation of `angle` radians around the Z axis.
pub fn rotation_z(angle: f32) -> Mat44 {
  Rotation3::from_axis_angle(&Vector3::z_axis(), angle).to_homogeneous().into()
}
