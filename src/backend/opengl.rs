//! OpenGL 4.5 backend.

use gl::types::{GLboolean, GLchar, GLenum, GLint, GLsizei, GLuint};
use log::error;
use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;

use crate::backend::{
  Attachment, Backend, BufferKind, BufferUsage, Filter, FramebufferStatus, FramebufferTarget,
  ImageDesc, ObjectKind, PixelFormat, Primitive, Stage, TextureTarget
};

// Not part of the core profile headers.
const FRAMEBUFFER_INCOMPLETE_DIMENSIONS: GLenum = 0x8CD9;

/// Backend issuing direct-state-access OpenGL calls.
///
/// Function pointers must have been loaded (`gl::load_with`) and a 4.5 context must be current on
/// the calling thread before any method is invoked.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlBackend;

impl GlBackend {
  pub fn new() -> Self {
    GlBackend
  }
}

fn texture_target(target: TextureTarget) -> GLenum {
  match target {
    TextureTarget::D1 => gl::TEXTURE_1D,
    TextureTarget::D1Array => gl::TEXTURE_1D_ARRAY,
    TextureTarget::D2 => gl::TEXTURE_2D,
    TextureTarget::D2Array => gl::TEXTURE_2D_ARRAY,
    TextureTarget::D3 => gl::TEXTURE_3D,
    TextureTarget::CubeMap => gl::TEXTURE_CUBE_MAP,
    TextureTarget::CubeMapArray => gl::TEXTURE_CUBE_MAP_ARRAY,
    TextureTarget::Rectangle => gl::TEXTURE_RECTANGLE,
    TextureTarget::D2Multisample => gl::TEXTURE_2D_MULTISAMPLE,
    TextureTarget::D2MultisampleArray => gl::TEXTURE_2D_MULTISAMPLE_ARRAY,
  }
}

fn buffer_target(kind: BufferKind) -> GLenum {
  match kind {
    BufferKind::Array => gl::ARRAY_BUFFER,
    BufferKind::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
    BufferKind::Uniform => gl::UNIFORM_BUFFER,
    BufferKind::ShaderStorage => gl::SHADER_STORAGE_BUFFER,
    BufferKind::CopyRead => gl::COPY_READ_BUFFER,
    BufferKind::CopyWrite => gl::COPY_WRITE_BUFFER,
  }
}

fn buffer_usage(usage: BufferUsage) -> GLenum {
  match usage {
    BufferUsage::StaticDraw => gl::STATIC_DRAW,
    BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
    BufferUsage::StreamDraw => gl::STREAM_DRAW,
  }
}

fn filter(filter: Filter) -> GLint {
  match filter {
    Filter::Nearest => gl::NEAREST as GLint,
    Filter::Linear => gl::LINEAR as GLint,
  }
}

/// Internal format, client format and client type of a pixel format.
fn pixel_format(format: PixelFormat) -> (GLenum, GLenum, GLenum) {
  match format {
    PixelFormat::R8 => (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
    PixelFormat::RG8 => (gl::RG8, gl::RG, gl::UNSIGNED_BYTE),
    PixelFormat::RGB8 => (gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE),
    PixelFormat::RGBA8 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
    PixelFormat::R32F => (gl::R32F, gl::RED, gl::FLOAT),
    PixelFormat::RGBA32F => (gl::RGBA32F, gl::RGBA, gl::FLOAT),
    PixelFormat::Depth32F => (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT),
    PixelFormat::Depth24Stencil8 => (gl::DEPTH24_STENCIL8, gl::DEPTH_STENCIL, gl::UNSIGNED_INT_24_8),
  }
}

fn attachment(attachment: Attachment) -> GLenum {
  match attachment {
    Attachment::Color(i) => gl::COLOR_ATTACHMENT0 + i,
    Attachment::Depth => gl::DEPTH_ATTACHMENT,
    Attachment::Stencil => gl::STENCIL_ATTACHMENT,
    Attachment::DepthStencil => gl::DEPTH_STENCIL_ATTACHMENT,
  }
}

fn framebuffer_target(target: FramebufferTarget) -> GLenum {
  match target {
    FramebufferTarget::Read => gl::READ_FRAMEBUFFER,
    FramebufferTarget::Draw => gl::DRAW_FRAMEBUFFER,
    FramebufferTarget::ReadDraw => gl::FRAMEBUFFER,
  }
}

fn framebuffer_status(status: GLenum) -> FramebufferStatus {
  match status {
    gl::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
    gl::FRAMEBUFFER_UNDEFINED => FramebufferStatus::Undefined,
    gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
    gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::MissingAttachment,
    FRAMEBUFFER_INCOMPLETE_DIMENSIONS => FramebufferStatus::IncompleteDimensions,
    gl::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => FramebufferStatus::IncompleteDrawBuffer,
    gl::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => FramebufferStatus::IncompleteReadBuffer,
    gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
    gl::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => FramebufferStatus::IncompleteLayerTargets,
    gl::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
    code => FramebufferStatus::Unknown(code),
  }
}

fn shader_type(stage: Stage) -> GLenum {
  match stage {
    Stage::Vertex => gl::VERTEX_SHADER,
    Stage::TessControl => gl::TESS_CONTROL_SHADER,
    Stage::TessEvaluation => gl::TESS_EVALUATION_SHADER,
    Stage::Geometry => gl::GEOMETRY_SHADER,
    Stage::Fragment => gl::FRAGMENT_SHADER,
    Stage::Compute => gl::COMPUTE_SHADER,
  }
}

fn stage_bit(stage: Stage) -> GLenum {
  match stage {
    Stage::Vertex => gl::VERTEX_SHADER_BIT,
    Stage::TessControl => gl::TESS_CONTROL_SHADER_BIT,
    Stage::TessEvaluation => gl::TESS_EVALUATION_SHADER_BIT,
    Stage::Geometry => gl::GEOMETRY_SHADER_BIT,
    Stage::Fragment => gl::FRAGMENT_SHADER_BIT,
    Stage::Compute => gl::COMPUTE_SHADER_BIT,
  }
}

fn primitive(primitive: Primitive) -> GLenum {
  match primitive {
    Primitive::Points => gl::POINTS,
    Primitive::Lines => gl::LINES,
    Primitive::LineStrip => gl::LINE_STRIP,
    Primitive::Triangles => gl::TRIANGLES,
    Primitive::TriangleStrip => gl::TRIANGLE_STRIP,
    Primitive::TriangleFan => gl::TRIANGLE_FAN,
  }
}

fn gl_bool(b: bool) -> GLboolean {
  if b { gl::TRUE } else { gl::FALSE }
}

fn program_iv(program: u32, pname: GLenum) -> GLint {
  let mut value = 0;
  unsafe { gl::GetProgramiv(program, pname, &mut value) };
  value
}

/// Read a driver string through a name-query entry point.
fn read_name<F>(max_len: GLint, query: F) -> String where F: FnOnce(GLsizei, *mut GLsizei, *mut GLchar) {
  if max_len <= 0 {
    return String::new();
  }

  let mut buf = vec![0u8; max_len as usize];
  let mut len: GLsizei = 0;
  query(max_len, &mut len, buf.as_mut_ptr() as *mut GLchar);
  buf.truncate(len.max(0) as usize);

  String::from_utf8_lossy(&buf).into_owned()
}

impl Backend for GlBackend {
  fn create_object(&self, kind: ObjectKind) -> u32 {
    let mut id: GLuint = 0;

    unsafe {
      match kind {
        ObjectKind::Buffer => gl::CreateBuffers(1, &mut id),
        ObjectKind::Texture(target) => gl::CreateTextures(texture_target(target), 1, &mut id),
        ObjectKind::Framebuffer => gl::CreateFramebuffers(1, &mut id),
        ObjectKind::Renderbuffer => gl::CreateRenderbuffers(1, &mut id),
        ObjectKind::Program => id = gl::CreateProgram(),
        ObjectKind::Pipeline => gl::CreateProgramPipelines(1, &mut id),
        ObjectKind::VertexArray => gl::CreateVertexArrays(1, &mut id),
      }
    }

    id
  }

  fn delete_object(&self, kind: ObjectKind, id: u32) {
    unsafe {
      match kind {
        ObjectKind::Buffer => gl::DeleteBuffers(1, &id),
        ObjectKind::Texture(_) => gl::DeleteTextures(1, &id),
        ObjectKind::Framebuffer => gl::DeleteFramebuffers(1, &id),
        ObjectKind::Renderbuffer => gl::DeleteRenderbuffers(1, &id),
        ObjectKind::Program => gl::DeleteProgram(id),
        ObjectKind::Pipeline => gl::DeleteProgramPipelines(1, &id),
        ObjectKind::VertexArray => gl::DeleteVertexArrays(1, &id),
      }
    }
  }

  fn buffer_storage(&self, buffer: u32, size: usize, usage: BufferUsage) {
    unsafe { gl::NamedBufferData(buffer, size as isize, ptr::null(), buffer_usage(usage)) };
  }

  fn buffer_sub_data(&self, buffer: u32, offset: usize, data: &[u8]) {
    unsafe {
      gl::NamedBufferSubData(buffer, offset as isize, data.len() as isize, data.as_ptr() as *const c_void)
    };
  }

  fn bind_buffer_base(&self, kind: BufferKind, index: u32, buffer: u32) {
    unsafe { gl::BindBufferBase(buffer_target(kind), index, buffer) };
  }

  fn bind_texture(&self, target: TextureTarget, texture: u32) {
    unsafe { gl::BindTexture(texture_target(target), texture) };
  }

  fn texture_filter(&self, texture: u32, min: Filter, mag: Filter) {
    unsafe {
      gl::TextureParameteri(texture, gl::TEXTURE_MIN_FILTER, filter(min));
      gl::TextureParameteri(texture, gl::TEXTURE_MAG_FILTER, filter(mag));
    }
  }

  fn texture_image(
    &self,
    target: TextureTarget,
    level: u32,
    format: PixelFormat,
    desc: &ImageDesc,
    pixels: Option<&[u8]>
  ) {
    let target = texture_target(target);
    let (internal, client_format, client_type) = pixel_format(format);
    let pixels = pixels.map_or(ptr::null(), |p| p.as_ptr() as *const c_void);

    unsafe {
      // rows are tightly packed on the client side
      gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);

      match *desc {
        ImageDesc::D1 { width } => {
          gl::TexImage1D(target, level as GLint, internal as GLint, width as GLsizei, 0, client_format,
                         client_type, pixels)
        }

        ImageDesc::D2 { width, height } => {
          gl::TexImage2D(target, level as GLint, internal as GLint, width as GLsizei, height as GLsizei, 0,
                         client_format, client_type, pixels)
        }

        ImageDesc::D3 { width, height, depth } => {
          gl::TexImage3D(target, level as GLint, internal as GLint, width as GLsizei, height as GLsizei,
                         depth as GLsizei, 0, client_format, client_type, pixels)
        }

        ImageDesc::Multisample { samples, width, height, fixed_sample_locations } => {
          gl::TexImage2DMultisample(target, samples as GLsizei, internal, width as GLsizei, height as GLsizei,
                                    gl_bool(fixed_sample_locations))
        }

        ImageDesc::MultisampleArray { samples, width, height, layers, fixed_sample_locations } => {
          gl::TexImage3DMultisample(target, samples as GLsizei, internal, width as GLsizei, height as GLsizei,
                                    layers as GLsizei, gl_bool(fixed_sample_locations))
        }
      }
    }
  }

  fn renderbuffer_storage(&self, renderbuffer: u32, format: PixelFormat, width: u32, height: u32) {
    let (internal, _, _) = pixel_format(format);
    unsafe { gl::NamedRenderbufferStorage(renderbuffer, internal, width as GLsizei, height as GLsizei) };
  }

  fn framebuffer_texture(&self, framebuffer: u32, point: Attachment, texture: u32, level: u32) {
    unsafe { gl::NamedFramebufferTexture(framebuffer, attachment(point), texture, level as GLint) };
  }

  fn framebuffer_renderbuffer(&self, framebuffer: u32, point: Attachment, renderbuffer: u32) {
    unsafe {
      gl::NamedFramebufferRenderbuffer(framebuffer, attachment(point), gl::RENDERBUFFER, renderbuffer)
    };
  }

  fn framebuffer_status(&self, framebuffer: u32) -> FramebufferStatus {
    framebuffer_status(unsafe { gl::CheckNamedFramebufferStatus(framebuffer, gl::FRAMEBUFFER) })
  }

  fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: u32) {
    unsafe { gl::BindFramebuffer(framebuffer_target(target), framebuffer) };
  }

  fn create_shader_program(&self, stage: Stage, source: &str) -> u32 {
    let source = match CString::new(source) {
      Ok(source) => source,
      Err(e) => {
        error!("{} shader source contains a nul byte at {}", stage, e.nul_position());
        return 0;
      }
    };

    let src_ptr = source.as_ptr();
    unsafe { gl::CreateShaderProgramv(shader_type(stage), 1, &src_ptr) }
  }

  fn program_link_status(&self, program: u32) -> bool {
    program_iv(program, gl::LINK_STATUS) != 0
  }

  fn validate_program(&self, program: u32) -> bool {
    unsafe { gl::ValidateProgram(program) };
    program_iv(program, gl::VALIDATE_STATUS) != 0
  }

  fn program_info_log(&self, program: u32) -> String {
    let len = program_iv(program, gl::INFO_LOG_LENGTH);
    read_name(len, |max, len, buf| unsafe { gl::GetProgramInfoLog(program, max, len, buf) })
  }

  fn active_uniform_blocks(&self, program: u32) -> Vec<String> {
    let count = program_iv(program, gl::ACTIVE_UNIFORM_BLOCKS);
    let max_len = program_iv(program, gl::ACTIVE_UNIFORM_BLOCK_MAX_NAME_LENGTH);

    (0..count.max(0) as GLuint).map(|i| {
      read_name(max_len, |max, len, buf| unsafe { gl::GetActiveUniformBlockName(program, i, max, len, buf) })
    }).collect()
  }

  fn active_uniforms(&self, program: u32) -> Vec<String> {
    let count = program_iv(program, gl::ACTIVE_UNIFORMS);
    let max_len = program_iv(program, gl::ACTIVE_UNIFORM_MAX_LENGTH);

    (0..count.max(0) as GLuint).map(|i| {
      read_name(max_len, |max, len, buf| unsafe { gl::GetActiveUniformName(program, i, max, len, buf) })
    }).collect()
  }

  fn use_program(&self, program: u32) {
    unsafe { gl::UseProgram(program) };
  }

  fn use_program_stages(&self, pipeline: u32, stage: Stage, program: u32) {
    unsafe { gl::UseProgramStages(pipeline, stage_bit(stage), program) };
  }

  fn bind_pipeline(&self, pipeline: u32) {
    unsafe { gl::BindProgramPipeline(pipeline) };
  }

  fn vertex_array_attrib(&self, vertex_array: u32, index: u32, buffer: u32, components: u32, stride: u32) {
    unsafe {
      gl::VertexArrayVertexBuffer(vertex_array, index, buffer, 0, stride as GLsizei);
      gl::EnableVertexArrayAttrib(vertex_array, index);
      gl::VertexArrayAttribFormat(vertex_array, index, components as GLint, gl::FLOAT, gl::FALSE, 0);
      gl::VertexArrayAttribBinding(vertex_array, index, index);
    }
  }

  fn bind_vertex_array(&self, vertex_array: u32) {
    unsafe { gl::BindVertexArray(vertex_array) };
  }

  fn viewport(&self, x: i32, y: i32, width: u32, height: u32) {
    unsafe { gl::Viewport(x, y, width as GLsizei, height as GLsizei) };
  }

  fn clear_color(&self, color: [f32; 4]) {
    unsafe { gl::ClearColor(color[0], color[1], color[2], color[3]) };
  }

  fn clear(&self) {
    unsafe { gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT) };
  }

  fn draw_arrays(&self, prim: Primitive, first: u32, count: u32) {
    unsafe { gl::DrawArrays(primitive(prim), first as GLint, count as GLsizei) };
  }
}
