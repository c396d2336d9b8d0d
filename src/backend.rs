//! GPU driver seam.
//!
//! Every GPU object of this crate talks to the driver through a `Backend`. Two backends are
//! provided:
//!
//!   - [`GlBackend`], issuing OpenGL 4.5 direct-state-access calls through the `gl` crate. It
//!     requires a current context with loaded function pointers.
//!   - [`RecordingBackend`], which runs without any context: it allocates identifiers, records
//!     every call and emulates the few driver answers the objects rely on (link status,
//!     completeness, buffer contents).

pub mod opengl;
pub mod recording;

use std::fmt;

pub use self::opengl::GlBackend;
pub use self::recording::{Call, RecordingBackend};

/// Category of a GPU object.
///
/// The category selects the creation and deletion entry points of the driver.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ObjectKind {
  Buffer,
  Texture(TextureTarget),
  Framebuffer,
  Renderbuffer,
  Program,
  Pipeline,
  VertexArray,
}

impl fmt::Display for ObjectKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ObjectKind::Buffer => f.write_str("buffer"),
      ObjectKind::Texture(target) => write!(f, "texture ({:?})", target),
      ObjectKind::Framebuffer => f.write_str("framebuffer"),
      ObjectKind::Renderbuffer => f.write_str("renderbuffer"),
      ObjectKind::Program => f.write_str("program"),
      ObjectKind::Pipeline => f.write_str("program pipeline"),
      ObjectKind::VertexArray => f.write_str("vertex array"),
    }
  }
}

/// Kind of buffer, i.e. the binding target it is meant for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferKind {
  Array,
  ElementArray,
  Uniform,
  ShaderStorage,
  CopyRead,
  CopyWrite,
}

/// Usage hint given at allocation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferUsage {
  StaticDraw,
  DynamicDraw,
  StreamDraw,
}

/// Dimensionality of a texture.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TextureTarget {
  D1,
  D1Array,
  D2,
  D2Array,
  D3,
  CubeMap,
  CubeMapArray,
  Rectangle,
  D2Multisample,
  D2MultisampleArray,
}

impl TextureTarget {
  pub fn is_array(self) -> bool {
    match self {
      TextureTarget::D1Array
      | TextureTarget::D2Array
      | TextureTarget::CubeMapArray
      | TextureTarget::D2MultisampleArray => true,
      _ => false,
    }
  }

  pub fn is_multisampled(self) -> bool {
    match self {
      TextureTarget::D2Multisample | TextureTarget::D2MultisampleArray => true,
      _ => false,
    }
  }
}

/// Minification / magnification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Filter {
  Nearest,
  Linear,
}

/// Pixel formats understood by textures and renderbuffers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PixelFormat {
  R8,
  RG8,
  RGB8,
  RGBA8,
  R32F,
  RGBA32F,
  Depth32F,
  Depth24Stencil8,
}

impl PixelFormat {
  /// Size in bytes of a single pixel, as uploaded from the client side.
  pub fn bytes_per_pixel(self) -> usize {
    match self {
      PixelFormat::R8 => 1,
      PixelFormat::RG8 => 2,
      PixelFormat::RGB8 => 3,
      PixelFormat::RGBA8 => 4,
      PixelFormat::R32F => 4,
      PixelFormat::RGBA32F => 16,
      PixelFormat::Depth32F => 4,
      PixelFormat::Depth24Stencil8 => 4,
    }
  }
}

/// Shape of a texture image upload.
///
/// Which shapes a texture accepts depends on its [`TextureTarget`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageDesc {
  D1 { width: u32 },
  D2 { width: u32, height: u32 },
  D3 { width: u32, height: u32, depth: u32 },
  Multisample { samples: u32, width: u32, height: u32, fixed_sample_locations: bool },
  MultisampleArray { samples: u32, width: u32, height: u32, layers: u32, fixed_sample_locations: bool },
}

impl ImageDesc {
  pub fn size(&self) -> [u32; 3] {
    match *self {
      ImageDesc::D1 { width } => [width, 1, 1],
      ImageDesc::D2 { width, height } => [width, height, 1],
      ImageDesc::D3 { width, height, depth } => [width, height, depth],
      ImageDesc::Multisample { width, height, .. } => [width, height, 1],
      ImageDesc::MultisampleArray { width, height, layers, .. } => [width, height, layers],
    }
  }

  /// Multisampled shapes carry no client pixels.
  pub fn is_multisampled(&self) -> bool {
    match *self {
      ImageDesc::Multisample { .. } | ImageDesc::MultisampleArray { .. } => true,
      _ => false,
    }
  }

  /// Does this shape fit the given target?
  pub fn fits(&self, target: TextureTarget) -> bool {
    match (*self, target) {
      (ImageDesc::D1 { .. }, TextureTarget::D1) => true,
      (ImageDesc::D2 { .. }, TextureTarget::D2)
      | (ImageDesc::D2 { .. }, TextureTarget::D1Array)
      | (ImageDesc::D2 { .. }, TextureTarget::Rectangle) => true,
      (ImageDesc::D3 { .. }, TextureTarget::D3)
      | (ImageDesc::D3 { .. }, TextureTarget::D2Array)
      | (ImageDesc::D3 { .. }, TextureTarget::CubeMapArray) => true,
      (ImageDesc::Multisample { .. }, TextureTarget::D2Multisample) => true,
      (ImageDesc::MultisampleArray { .. }, TextureTarget::D2MultisampleArray) => true,
      _ => false,
    }
  }
}

/// Framebuffer attachment point.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Attachment {
  Color(u32),
  Depth,
  Stencil,
  DepthStencil,
}

/// Framebuffer binding target.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FramebufferTarget {
  Read,
  Draw,
  ReadDraw,
}

/// Completeness status of a framebuffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FramebufferStatus {
  Complete,
  Undefined,
  IncompleteAttachment,
  MissingAttachment,
  IncompleteDimensions,
  IncompleteDrawBuffer,
  IncompleteReadBuffer,
  IncompleteMultisample,
  IncompleteLayerTargets,
  Unsupported,
  Unknown(u32),
}

impl FramebufferStatus {
  pub fn is_complete(self) -> bool {
    self == FramebufferStatus::Complete
  }
}

impl fmt::Display for FramebufferStatus {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      FramebufferStatus::Complete => f.write_str("complete"),
      FramebufferStatus::Undefined => f.write_str("undefined"),
      FramebufferStatus::IncompleteAttachment => f.write_str("incomplete attachment"),
      FramebufferStatus::MissingAttachment => f.write_str("missing attachment"),
      FramebufferStatus::IncompleteDimensions => f.write_str("incomplete dimensions"),
      FramebufferStatus::IncompleteDrawBuffer => f.write_str("incomplete draw buffer"),
      FramebufferStatus::IncompleteReadBuffer => f.write_str("incomplete read buffer"),
      FramebufferStatus::IncompleteMultisample => f.write_str("incomplete multisample"),
      FramebufferStatus::IncompleteLayerTargets => f.write_str("incomplete layer targets"),
      FramebufferStatus::Unsupported => f.write_str("unsupported"),
      FramebufferStatus::Unknown(code) => write!(f, "unknown status 0x{:x}", code),
    }
  }
}

/// Shader stage.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Stage {
  Vertex,
  TessControl,
  TessEvaluation,
  Geometry,
  Fragment,
  Compute,
}

impl Stage {
  /// Slot of this stage in a graphics pipeline, if it has one.
  pub fn pipeline_slot(self) -> Option<usize> {
    match self {
      Stage::Vertex => Some(0),
      Stage::TessControl => Some(1),
      Stage::TessEvaluation => Some(2),
      Stage::Geometry => Some(3),
      Stage::Fragment => Some(4),
      Stage::Compute => None,
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      Stage::Vertex => f.write_str("vertex"),
      Stage::TessControl => f.write_str("tessellation control"),
      Stage::TessEvaluation => f.write_str("tessellation evaluation"),
      Stage::Geometry => f.write_str("geometry"),
      Stage::Fragment => f.write_str("fragment"),
      Stage::Compute => f.write_str("compute"),
    }
  }
}

/// Primitive assembled by a draw call.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Primitive {
  Points,
  Lines,
  LineStrip,
  Triangles,
  TriangleStrip,
  TriangleFan,
}

/// The GPU driver API.
///
/// Identifiers are opaque; `0` is never a live object. Implementors are used from the thread
/// owning the context only.
pub trait Backend {
  /// Create one object of the given category. Returns `0` on failure.
  fn create_object(&self, kind: ObjectKind) -> u32;
  /// Release an object previously returned by `create_object` or `create_shader_program`.
  fn delete_object(&self, kind: ObjectKind, id: u32);

  /// Allocate `size` bytes of uninitialized storage for a buffer.
  fn buffer_storage(&self, buffer: u32, size: usize, usage: BufferUsage);
  /// Write `data` into the buffer starting at byte `offset`.
  fn buffer_sub_data(&self, buffer: u32, offset: usize, data: &[u8]);
  /// Bind a buffer to an indexed binding point (uniform blocks, storage blocks).
  fn bind_buffer_base(&self, kind: BufferKind, index: u32, buffer: u32);

  fn bind_texture(&self, target: TextureTarget, texture: u32);
  fn texture_filter(&self, texture: u32, min: Filter, mag: Filter);
  /// Upload an image to the texture currently bound to `target`.
  fn texture_image(
    &self,
    target: TextureTarget,
    level: u32,
    format: PixelFormat,
    desc: &ImageDesc,
    pixels: Option<&[u8]>
  );

  fn renderbuffer_storage(&self, renderbuffer: u32, format: PixelFormat, width: u32, height: u32);
  fn framebuffer_texture(&self, framebuffer: u32, attachment: Attachment, texture: u32, level: u32);
  fn framebuffer_renderbuffer(&self, framebuffer: u32, attachment: Attachment, renderbuffer: u32);
  fn framebuffer_status(&self, framebuffer: u32) -> FramebufferStatus;
  fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: u32);

  /// Compile and link a single-stage separable program from source text. Returns `0` when the
  /// driver could not even create the program object.
  fn create_shader_program(&self, stage: Stage, source: &str) -> u32;
  fn program_link_status(&self, program: u32) -> bool;
  /// Validate the program against the current state and return the validation status.
  fn validate_program(&self, program: u32) -> bool;
  fn program_info_log(&self, program: u32) -> String;
  fn active_uniform_blocks(&self, program: u32) -> Vec<String>;
  fn active_uniforms(&self, program: u32) -> Vec<String>;
  fn use_program(&self, program: u32);

  fn use_program_stages(&self, pipeline: u32, stage: Stage, program: u32);
  fn bind_pipeline(&self, pipeline: u32);

  /// Source the float attribute `index` of a vertex array from `buffer`.
  fn vertex_array_attrib(&self, vertex_array: u32, index: u32, buffer: u32, components: u32, stride: u32);
  fn bind_vertex_array(&self, vertex_array: u32);

  fn viewport(&self, x: i32, y: i32, width: u32, height: u32);
  fn clear_color(&self, color: [f32; 4]);
  fn clear(&self);
  fn draw_arrays(&self, primitive: Primitive, first: u32, count: u32);
}
