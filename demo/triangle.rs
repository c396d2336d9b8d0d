//! The triangle scene.

use log::{debug, error};
use std::path::Path;
use std::rc::Rc;

use prism::backend::{BufferKind, BufferUsage, Primitive};
use prism::transform::{self, Transforms};
use prism::{Buffer, BufferError, Gpu, Pipeline, ShaderProgram, Stage, UniformBlock, VertexArray};

/// Binding index of the `Transforms` uniform block in the shaders.
const TRANSFORMS_BINDING: u32 = 0;

// 2D positions
const VERTICES: [[f32; 2]; 3] = [[-0.5, -0.5], [0.5, -0.5], [0., 0.5]];

/// Radians per second.
const SPIN: f32 = 0.8;

pub struct Triangle {
  gpu: Rc<Gpu>,
  vertices: Buffer,
  vao: VertexArray,
  transforms: UniformBlock<Transforms>,
  vs: ShaderProgram,
  fs: ShaderProgram,
  pipeline: Pipeline,
  angle: f32,
}

impl Triangle {
  pub fn new<P>(gpu: &Rc<Gpu>, shaders: P, size: (u32, u32)) -> Result<Self, BufferError> where P: AsRef<Path> {
    let shaders = shaders.as_ref();

    let vertices = Buffer::from_bytes(
      gpu,
      BufferKind::Array,
      bytemuck::cast_slice(&VERTICES),
      BufferUsage::StaticDraw,
    )?;

    let vao = VertexArray::new(gpu);
    vao.attribute(0, &vertices, 2, 8);

    let mut data = Transforms::identity();
    data.projection = transform::aspect_projection(size.0, size.1);
    let transforms = UniformBlock::new(gpu, TRANSFORMS_BINDING, data)?;

    let vs = ShaderProgram::from_path(gpu, Stage::Vertex, shaders.join("default.vsh"));
    let fs = ShaderProgram::from_path(gpu, Stage::Fragment, shaders.join("default.fsh"));
    let pipeline = Pipeline::with_programs(gpu, &[&vs, &fs]);

    if !vs.is_valid() || !fs.is_valid() {
      error!("the triangle will not render correctly");
    }

    Ok(Triangle {
      gpu: gpu.clone(),
      vertices,
      vao,
      transforms,
      vs,
      fs,
      pipeline,
      angle: 0.,
    })
  }

  pub fn resize(&mut self, width: u32, height: u32) {
    debug!("resizing to {}x{}", width, height);

    let projection = transform::aspect_projection(width, height);

    if let Err(e) = self.transforms.set_field(Transforms::PROJECTION_OFFSET, &projection) {
      error!("cannot update projection: {}", e);
    }
  }

  /// Advance the rotation by `dt` seconds and draw.
  pub fn render(&mut self, dt: f64, (width, height): (u32, u32)) {
    self.angle = (self.angle + SPIN * dt as f32) % std::f32::consts::TAU;

    let model = transform::rotation_z(self.angle);

    if let Err(e) = self.transforms.set_field(Transforms::MODEL_OFFSET, &model) {
      error!("cannot update model: {}", e);
    }

    let backend = self.gpu.backend();
    backend.viewport(0, 0, width, height);
    backend.clear_color([0.1, 0.1, 0.12, 1.]);
    backend.clear();

    self.pipeline.bind();
    self.vao.bind();
    backend.draw_arrays(Primitive::Triangles, 0, 3);
  }

  /// Release everything, dependents first.
  pub fn destroy(&mut self) {
    self.pipeline.destroy();
    self.fs.destroy();
    self.vs.destroy();
    self.transforms.destroy();
    self.vao.destroy();
    self.vertices.destroy();
  }
}
