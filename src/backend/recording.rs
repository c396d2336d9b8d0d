//! Headless backend.
//!
//! `RecordingBackend` answers the driver queries the GPU objects depend on without any context.
//! It is cheap to clone: clones share the same recording, so a test can keep one copy while the
//! [`Gpu`](crate::gpu::Gpu) owns the other.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::backend::{
  Attachment, Backend, BufferKind, BufferUsage, Filter, FramebufferStatus, FramebufferTarget,
  ImageDesc, ObjectKind, PixelFormat, Primitive, Stage, TextureTarget
};

/// A recorded driver call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
  CreateObject(ObjectKind, u32),
  DeleteObject(ObjectKind, u32),
  BufferStorage { buffer: u32, size: usize, usage: BufferUsage },
  BufferSubData { buffer: u32, offset: usize, len: usize },
  BindBufferBase { kind: BufferKind, index: u32, buffer: u32 },
  BindTexture { target: TextureTarget, texture: u32 },
  TextureFilter { texture: u32, min: Filter, mag: Filter },
  TextureImage { target: TextureTarget, level: u32, format: PixelFormat, desc: ImageDesc, with_pixels: bool },
  RenderbufferStorage { renderbuffer: u32, format: PixelFormat, width: u32, height: u32 },
  FramebufferTexture { framebuffer: u32, attachment: Attachment, texture: u32, level: u32 },
  FramebufferRenderbuffer { framebuffer: u32, attachment: Attachment, renderbuffer: u32 },
  FramebufferStatus(u32),
  BindFramebuffer { target: FramebufferTarget, framebuffer: u32 },
  CreateShaderProgram { stage: Stage, program: u32 },
  ValidateProgram(u32),
  UseProgram(u32),
  UseProgramStages { pipeline: u32, stage: Stage, program: u32 },
  BindPipeline(u32),
  VertexArrayAttrib { vertex_array: u32, index: u32, buffer: u32, components: u32, stride: u32 },
  BindVertexArray(u32),
  Viewport { x: i32, y: i32, width: u32, height: u32 },
  ClearColor([f32; 4]),
  Clear,
  DrawArrays { primitive: Primitive, first: u32, count: u32 },
}

#[derive(Clone, Copy, Debug)]
enum Attached {
  Texture(u32),
  Renderbuffer(u32),
}

#[derive(Debug)]
struct ProgramInfo {
  linked: bool,
  log: String,
  uniform_blocks: Vec<String>,
  uniforms: Vec<String>,
}

#[derive(Debug, Default)]
struct Recording {
  next_id: u32,
  calls: Vec<Call>,
  live: HashMap<u32, ObjectKind>,
  invalid_deletions: usize,
  buffers: HashMap<u32, Vec<u8>>,
  bound_textures: HashMap<TextureTarget, u32>,
  texture_sizes: HashMap<u32, [u32; 3]>,
  renderbuffer_sizes: HashMap<u32, [u32; 3]>,
  framebuffers: HashMap<u32, Vec<(Attachment, Attached)>>,
  programs: HashMap<u32, ProgramInfo>,
  fail_creation: bool,
  fail_validation: bool,
}

impl Recording {
  fn allocate(&mut self, kind: ObjectKind) -> u32 {
    if self.fail_creation {
      return 0;
    }

    self.next_id += 1;
    let id = self.next_id;
    self.live.insert(id, kind);

    if kind == ObjectKind::Buffer {
      self.buffers.insert(id, Vec::new());
    }

    id
  }

  fn attached_size(&self, attached: Attached) -> Option<[u32; 3]> {
    match attached {
      Attached::Texture(id) => self.texture_sizes.get(&id).cloned(),
      Attached::Renderbuffer(id) => self.renderbuffer_sizes.get(&id).cloned(),
    }
  }

  fn completeness(&self, framebuffer: u32) -> FramebufferStatus {
    let attachments = match self.framebuffers.get(&framebuffer) {
      Some(attachments) if !attachments.is_empty() => attachments,
      _ => return FramebufferStatus::MissingAttachment,
    };

    let mut size = None;

    for &(_, attached) in attachments {
      match self.attached_size(attached) {
        None => return FramebufferStatus::IncompleteAttachment,
        Some(s) => {
          let [w, h, _] = s;

          match size {
            None => size = Some([w, h]),
            Some(expected) if expected != [w, h] => return FramebufferStatus::IncompleteDimensions,
            _ => ()
          }
        }
      }
    }

    FramebufferStatus::Complete
  }
}

/// Backend recording every call, for headless runs and tests.
///
/// Emulated driver answers:
///
///   - Identifiers are allocated from a single counter starting at `1`.
///   - A shader source containing an `#error` directive fails to link; the info log is the
///     directive line. Validation fails for every program while
///     [`set_validation_failure`](RecordingBackend::set_validation_failure) is on.
///   - `uniform Name {` lines are reported as active uniform blocks and `uniform type name;` lines
///     as active uniforms.
///   - A framebuffer is complete when it has at least one attachment, every attachment has
///     storage and all attachments share the same width and height.
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
  state: Rc<RefCell<Recording>>,
}

impl RecordingBackend {
  pub fn new() -> Self {
    RecordingBackend::default()
  }

  /// All calls recorded so far.
  pub fn calls(&self) -> Vec<Call> {
    self.state.borrow().calls.clone()
  }

  /// Drain the recorded calls.
  pub fn take_calls(&self) -> Vec<Call> {
    let mut state = self.state.borrow_mut();
    state.calls.drain(..).collect()
  }

  /// Number of recorded calls satisfying a predicate.
  pub fn count<F>(&self, f: F) -> usize where F: Fn(&Call) -> bool {
    self.state.borrow().calls.iter().filter(|call| f(call)).count()
  }

  /// Is `id` a live object?
  pub fn is_live(&self, id: u32) -> bool {
    self.state.borrow().live.contains_key(&id)
  }

  /// Number of objects created and not deleted yet.
  pub fn live_objects(&self) -> usize {
    self.state.borrow().live.len()
  }

  /// Number of deletions of identifiers that were not live (`0` excluded).
  pub fn invalid_deletions(&self) -> usize {
    self.state.borrow().invalid_deletions
  }

  /// Current content of a buffer.
  pub fn buffer_contents(&self, buffer: u32) -> Option<Vec<u8>> {
    self.state.borrow().buffers.get(&buffer).cloned()
  }

  /// Texture bound driver-side to `target`, if any.
  pub fn bound_texture(&self, target: TextureTarget) -> Option<u32> {
    self.state.borrow().bound_textures.get(&target).cloned().filter(|&id| id != 0)
  }

  /// Make every object creation fail (return `0`).
  pub fn set_creation_failure(&self, fail: bool) {
    self.state.borrow_mut().fail_creation = fail;
  }

  /// Make every program validation fail.
  pub fn set_validation_failure(&self, fail: bool) {
    self.state.borrow_mut().fail_validation = fail;
  }

  fn record(&self, call: Call) {
    self.state.borrow_mut().calls.push(call);
  }
}

/// Collect uniform block and uniform names out of GLSL source.
fn scan_uniforms(source: &str) -> (Vec<String>, Vec<String>) {
  let mut blocks = Vec::new();
  let mut uniforms = Vec::new();

  for line in source.lines() {
    let mut line = line.trim();

    // strip a leading layout qualifier
    if line.starts_with("layout") {
      line = match line.find(')') {
        Some(i) => line[i + 1..].trim_start(),
        None => continue,
      };
    }

    if !line.starts_with("uniform ") {
      continue;
    }

    let decl = line["uniform ".len()..].trim();

    if decl.contains('{') || !decl.contains(';') {
      if let Some(name) = decl.split(|c: char| c.is_whitespace() || c == '{').next() {
        if !name.is_empty() {
          blocks.push(name.to_owned());
        }
      }
    } else if let Some(name) = decl.trim_end_matches(';').split_whitespace().last() {
      uniforms.push(name.trim_end_matches(';').to_owned());
    }
  }

  (blocks, uniforms)
}

impl Backend for RecordingBackend {
  fn create_object(&self, kind: ObjectKind) -> u32 {
    let mut state = self.state.borrow_mut();
    let id = state.allocate(kind);
    state.calls.push(Call::CreateObject(kind, id));
    id
  }

  fn delete_object(&self, kind: ObjectKind, id: u32) {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::DeleteObject(kind, id));

    if id == 0 {
      return;
    }

    if state.live.remove(&id).is_none() {
      state.invalid_deletions += 1;
      return;
    }

    state.buffers.remove(&id);
    state.texture_sizes.remove(&id);
    state.renderbuffer_sizes.remove(&id);
    state.framebuffers.remove(&id);
    state.programs.remove(&id);

    // deleting a bound texture reverts its target to zero
    for bound in state.bound_textures.values_mut() {
      if *bound == id {
        *bound = 0;
      }
    }
  }

  fn buffer_storage(&self, buffer: u32, size: usize, usage: BufferUsage) {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::BufferStorage { buffer, size, usage });

    if let Some(content) = state.buffers.get_mut(&buffer) {
      *content = vec![0; size];
    }
  }

  fn buffer_sub_data(&self, buffer: u32, offset: usize, data: &[u8]) {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::BufferSubData { buffer, offset, len: data.len() });

    if let Some(content) = state.buffers.get_mut(&buffer) {
      let end = offset.saturating_add(data.len()).min(content.len());

      if offset < end {
        content[offset..end].copy_from_slice(&data[..end - offset]);
      }
    }
  }

  fn bind_buffer_base(&self, kind: BufferKind, index: u32, buffer: u32) {
    self.record(Call::BindBufferBase { kind, index, buffer });
  }

  fn bind_texture(&self, target: TextureTarget, texture: u32) {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::BindTexture { target, texture });
    state.bound_textures.insert(target, texture);
  }

  fn texture_filter(&self, texture: u32, min: Filter, mag: Filter) {
    self.record(Call::TextureFilter { texture, min, mag });
  }

  fn texture_image(
    &self,
    target: TextureTarget,
    level: u32,
    format: PixelFormat,
    desc: &ImageDesc,
    pixels: Option<&[u8]>
  ) {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::TextureImage { target, level, format, desc: *desc, with_pixels: pixels.is_some() });

    if level == 0 {
      if let Some(&texture) = state.bound_textures.get(&target) {
        if texture != 0 {
          state.texture_sizes.insert(texture, desc.size());
        }
      }
    }
  }

  fn renderbuffer_storage(&self, renderbuffer: u32, format: PixelFormat, width: u32, height: u32) {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::RenderbufferStorage { renderbuffer, format, width, height });
    state.renderbuffer_sizes.insert(renderbuffer, [width, height, 1]);
  }

  fn framebuffer_texture(&self, framebuffer: u32, attachment: Attachment, texture: u32, level: u32) {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::FramebufferTexture { framebuffer, attachment, texture, level });

    let attachments = state.framebuffers.entry(framebuffer).or_insert_with(Vec::new);
    attachments.retain(|&(point, _)| point != attachment);
    attachments.push((attachment, Attached::Texture(texture)));
  }

  fn framebuffer_renderbuffer(&self, framebuffer: u32, attachment: Attachment, renderbuffer: u32) {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::FramebufferRenderbuffer { framebuffer, attachment, renderbuffer });

    let attachments = state.framebuffers.entry(framebuffer).or_insert_with(Vec::new);
    attachments.retain(|&(point, _)| point != attachment);
    attachments.push((attachment, Attached::Renderbuffer(renderbuffer)));
  }

  fn framebuffer_status(&self, framebuffer: u32) -> FramebufferStatus {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::FramebufferStatus(framebuffer));
    state.completeness(framebuffer)
  }

  fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: u32) {
    self.record(Call::BindFramebuffer { target, framebuffer });
  }

  fn create_shader_program(&self, stage: Stage, source: &str) -> u32 {
    let mut state = self.state.borrow_mut();
    let program = state.allocate(ObjectKind::Program);
    state.calls.push(Call::CreateShaderProgram { stage, program });

    if program != 0 {
      let error_line = source.lines().find(|line| line.trim_start().starts_with("#error"));
      let (uniform_blocks, uniforms) = scan_uniforms(source);

      let info = ProgramInfo {
        linked: error_line.is_none(),
        log: error_line.map(|line| line.trim().to_owned()).unwrap_or_default(),
        uniform_blocks,
        uniforms,
      };

      state.programs.insert(program, info);
    }

    program
  }

  fn program_link_status(&self, program: u32) -> bool {
    self.state.borrow().programs.get(&program).map_or(false, |info| info.linked)
  }

  fn validate_program(&self, program: u32) -> bool {
    let mut state = self.state.borrow_mut();
    state.calls.push(Call::ValidateProgram(program));

    let fail_validation = state.fail_validation;

    match state.programs.get_mut(&program) {
      Some(info) if info.linked && !fail_validation => true,
      Some(info) => {
        if info.log.is_empty() {
          info.log = "validation failed".to_owned();
        }

        false
      }
      None => false,
    }
  }

  fn program_info_log(&self, program: u32) -> String {
    self.state.borrow().programs.get(&program).map(|info| info.log.clone()).unwrap_or_default()
  }

  fn active_uniform_blocks(&self, program: u32) -> Vec<String> {
    self.state.borrow().programs.get(&program).map(|info| info.uniform_blocks.clone()).unwrap_or_default()
  }

  fn active_uniforms(&self, program: u32) -> Vec<String> {
    self.state.borrow().programs.get(&program).map(|info| info.uniforms.clone()).unwrap_or_default()
  }

  fn use_program(&self, program: u32) {
    self.record(Call::UseProgram(program));
  }

  fn use_program_stages(&self, pipeline: u32, stage: Stage, program: u32) {
    self.record(Call::UseProgramStages { pipeline, stage, program });
  }

  fn bind_pipeline(&self, pipeline: u32) {
    self.record(Call::BindPipeline(pipeline));
  }

  fn vertex_array_attrib(&self, vertex_array: u32, index: u32, buffer: u32, components: u32, stride: u32) {
    self.record(Call::VertexArrayAttrib { vertex_array, index, buffer, components, stride });
  }

  fn bind_vertex_array(&self, vertex_array: u32) {
    self.record(Call::BindVertexArray(vertex_array));
  }

  fn viewport(&self, x: i32, y: i32, width: u32, height: u32) {
    self.record(Call::Viewport { x, y, width, height });
  }

  fn clear_color(&self, color: [f32; 4]) {
    self.record(Call::ClearColor(color));
  }

  fn clear(&self) {
    self.record(Call::Clear);
  }

  fn draw_arrays(&self, primitive: Primitive, first: u32, count: u32) {
    self.record(Call::DrawArrays { primitive, first, count });
  }
}
