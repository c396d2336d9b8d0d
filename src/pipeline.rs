//! Program pipelines.
//!
//! A pipeline combines single-stage programs, one per stage slot. The stage tag of a program
//! selects its slot. Invalid programs and stages without a graphics slot are skipped; attaching a
//! second program for a slot already filled replaces the previous one (last one wins).

use log::debug;
use std::rc::Rc;

use crate::backend::{ObjectKind, Stage};
use crate::gpu::Gpu;
use crate::handle::Handle;
use crate::shader::ShaderProgram;

const SLOTS: usize = 5;

#[derive(Debug)]
pub struct Pipeline {
  handle: Handle,
  // program id per graphics stage slot
  stages: [Option<u32>; SLOTS],
}

impl Pipeline {
  pub fn new(gpu: &Rc<Gpu>) -> Self {
    Pipeline {
      handle: Handle::create(gpu, ObjectKind::Pipeline),
      stages: [None; SLOTS],
    }
  }

  /// Create a pipeline and attach `programs` to it.
  pub fn with_programs(gpu: &Rc<Gpu>, programs: &[&ShaderProgram]) -> Self {
    let mut pipeline = Pipeline::new(gpu);
    pipeline.attach(programs);
    pipeline
  }

  pub fn id(&self) -> u32 {
    self.handle.id()
  }

  /// Attach programs to the slots of their stages.
  ///
  /// Returns the number of programs actually attached; none if the pipeline was destroyed.
  pub fn attach(&mut self, programs: &[&ShaderProgram]) -> usize {
    if !self.handle.is_valid() {
      return 0;
    }

    let backend = self.handle.gpu().backend();
    let mut attached = 0;

    for program in programs {
      let stage = program.stage();

      if !program.is_valid() {
        debug!("pipeline {}: skipping invalid {} program", self.handle.id(), stage);
        continue;
      }

      let slot = match stage.pipeline_slot() {
        Some(slot) => slot,
        None => {
          debug!("pipeline {}: no slot for {} stage", self.handle.id(), stage);
          continue;
        }
      };

      backend.use_program_stages(self.handle.id(), stage, program.id());
      self.stages[slot] = Some(program.id());
      attached += 1;
    }

    // the pipeline is only used if no program is current
    backend.use_program(0);

    attached
  }

  /// Program attached to the slot of `stage`, if any.
  pub fn stage_program(&self, stage: Stage) -> Option<u32> {
    stage.pipeline_slot().and_then(|slot| self.stages[slot])
  }

  /// Make this pipeline the active one for subsequent draws.
  pub fn bind(&self) {
    if !self.handle.is_valid() {
      return;
    }

    self.handle.gpu().backend().bind_pipeline(self.handle.id());
  }

  pub fn destroy(&mut self) {
    self.handle.destroy();
    self.stages = [None; SLOTS];
  }
}
