//! Single-stage shader programs.
//!
//! A `ShaderProgram` is compiled, linked and validated at construction out of source text. Any
//! failure is logged with the driver’s diagnostic and leaves the program in a terminal invalid
//! state: its handle is released (id `0`), it stays safely destructible and pipelines skip it.
//! There is no retry; build a new program out of corrected source instead.

use log::{debug, error};
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

pub use crate::backend::Stage;
use crate::backend::ObjectKind;
use crate::gpu::Gpu;
use crate::handle::Handle;

/// Reason a shader program is invalid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ShaderError {
  /// The source couldn’t be read.
  Read(String),
  /// Compilation or link failed; holds the driver log.
  Link(String),
  /// Validation failed; holds the driver log.
  Validation(String),
}

impl fmt::Display for ShaderError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ShaderError::Read(ref reason) => write!(f, "cannot read shader source: {}", reason),
      ShaderError::Link(ref log) => write!(f, "program link error: {}", log),
      ShaderError::Validation(ref log) => write!(f, "program validation error: {}", log),
    }
  }
}

impl Error for ShaderError {}

/// Outcome of the construction of a program.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProgramStatus {
  Linked,
  Invalid(ShaderError),
}

#[derive(Debug)]
pub struct ShaderProgram {
  stage: Stage,
  handle: Handle,
  status: ProgramStatus,
  uniform_blocks: Vec<String>,
  uniforms: Vec<String>,
}

impl ShaderProgram {
  /// Build a program out of source text.
  pub fn new(gpu: &Rc<Gpu>, stage: Stage, source: &str) -> Self {
    let id = gpu.backend().create_shader_program(stage, source);
    let mut program = ShaderProgram {
      stage,
      handle: Handle::adopt(gpu, ObjectKind::Program, id),
      status: ProgramStatus::Linked,
      uniform_blocks: Vec::new(),
      uniforms: Vec::new(),
    };

    if let Err(e) = program.link_and_validate() {
      error!("{} program: {}", stage, e);
      program.handle.destroy();
      program.status = ProgramStatus::Invalid(e);
    }

    program
  }

  /// Build a program out of everything `reader` yields.
  pub fn from_reader<R>(gpu: &Rc<Gpu>, stage: Stage, mut reader: R) -> Self where R: Read {
    let mut source = String::new();

    match reader.read_to_string(&mut source) {
      Ok(_) => ShaderProgram::new(gpu, stage, &source),
      Err(e) => ShaderProgram::invalid(gpu, stage, ShaderError::Read(e.to_string())),
    }
  }

  /// Build a program out of a source file.
  pub fn from_path<P>(gpu: &Rc<Gpu>, stage: Stage, path: P) -> Self where P: AsRef<Path> {
    let path = path.as_ref();

    debug!("loading {} stage: {}", stage, path.display());

    match File::open(path) {
      Ok(file) => ShaderProgram::from_reader(gpu, stage, file),
      Err(e) => ShaderProgram::invalid(gpu, stage, ShaderError::Read(format!("{}: {}", path.display(), e))),
    }
  }

  fn invalid(gpu: &Rc<Gpu>, stage: Stage, e: ShaderError) -> Self {
    error!("{} program: {}", stage, e);

    ShaderProgram {
      stage,
      handle: Handle::adopt(gpu, ObjectKind::Program, 0),
      status: ProgramStatus::Invalid(e),
      uniform_blocks: Vec::new(),
      uniforms: Vec::new(),
    }
  }

  fn link_and_validate(&mut self) -> Result<(), ShaderError> {
    let id = self.handle.id();
    let backend = self.handle.gpu().backend();

    if id == 0 {
      return Err(ShaderError::Link("cannot create program object".to_owned()));
    }

    if !backend.program_link_status(id) {
      return Err(ShaderError::Link(backend.program_info_log(id)));
    }

    if !backend.validate_program(id) {
      return Err(ShaderError::Validation(backend.program_info_log(id)));
    }

    self.uniform_blocks = backend.active_uniform_blocks(id);
    self.uniforms = backend.active_uniforms(id);

    for name in &self.uniform_blocks {
      debug!("{} program {}: active uniform block {}", self.stage, id, name);
    }

    for name in &self.uniforms {
      debug!("{} program {}: active uniform {}", self.stage, id, name);
    }

    Ok(())
  }

  pub fn stage(&self) -> Stage {
    self.stage
  }

  pub fn id(&self) -> u32 {
    self.handle.id()
  }

  pub fn status(&self) -> &ProgramStatus {
    &self.status
  }

  pub fn is_valid(&self) -> bool {
    self.status == ProgramStatus::Linked && self.handle.is_valid()
  }

  pub fn error(&self) -> Option<&ShaderError> {
    match self.status {
      ProgramStatus::Linked => None,
      ProgramStatus::Invalid(ref e) => Some(e),
    }
  }

  /// Names of the active uniform blocks.
  pub fn uniform_blocks(&self) -> &[String] {
    &self.uniform_blocks
  }

  /// Names of the active uniforms.
  pub fn uniforms(&self) -> &[String] {
    &self.uniforms
  }

  /// Release the program. Idempotent.
  pub fn destroy(&mut self) {
    self.handle.destroy();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::{Call, RecordingBackend};
  use std::io;

  const VS: &str = "
    #version 450 core
    layout (std140, binding = 0) uniform Transforms {
      mat4 projection;
    };
    uniform float time;
    void main() {}
  ";

  struct FailingReader;

  impl Read for FailingReader {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
      Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
    }
  }

  #[test]
  fn linked_program() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let program = ShaderProgram::new(&gpu, Stage::Vertex, VS);

    assert!(program.is_valid());
    assert_eq!(program.status(), &ProgramStatus::Linked);
    assert_eq!(program.uniform_blocks(), &["Transforms".to_owned()]);
    assert_eq!(program.uniforms(), &["time".to_owned()]);
    assert_eq!(backend.count(|call| *call == Call::ValidateProgram(program.id())), 1);
  }

  #[test]
  fn link_failure_degrades() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let mut program = ShaderProgram::new(&gpu, Stage::Fragment, "#error nope\n");

    assert!(!program.is_valid());
    assert_eq!(program.id(), 0);
    assert_eq!(program.error(), Some(&ShaderError::Link("#error nope".to_owned())));
    assert_eq!(backend.live_objects(), 0);

    // no validation attempted after a link failure
    assert_eq!(backend.count(|call| match *call { Call::ValidateProgram(_) => true, _ => false }), 0);

    program.destroy();
    drop(program);
    assert_eq!(backend.invalid_deletions(), 0);
  }

  #[test]
  fn validation_failure_degrades() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    backend.set_validation_failure(true);

    let program = ShaderProgram::new(&gpu, Stage::Vertex, VS);

    assert!(!program.is_valid());
    match program.error() {
      Some(&ShaderError::Validation(_)) => (),
      e => panic!("unexpected error: {:?}", e),
    }
    assert_eq!(backend.live_objects(), 0);
  }

  #[test]
  fn read_failure_degrades() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let program = ShaderProgram::from_reader(&gpu, Stage::Vertex, FailingReader);

    assert!(!program.is_valid());
    assert_eq!(program.error(), Some(&ShaderError::Read("disk on fire".to_owned())));
    assert!(backend.calls().is_empty());
  }

  #[test]
  fn missing_file_degrades() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let program = ShaderProgram::from_path(&gpu, Stage::Fragment, "this/does/not/exist.fsh");

    assert!(!program.is_valid());
    assert_eq!(program.stage(), Stage::Fragment);
  }

  #[test]
  fn reader_source_is_compiled() {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let program = ShaderProgram::from_reader(&gpu, Stage::Vertex, VS.as_bytes());

    assert!(program.is_valid());
  }
}
