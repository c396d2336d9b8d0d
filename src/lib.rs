//! Resource lifecycle and event dispatch core of a small real-time OpenGL demo.
//!
//! GPU objects ([`Buffer`], [`Texture`], [`Framebuffer`], [`Renderbuffer`], [`ShaderProgram`],
//! [`Pipeline`], [`VertexArray`]) own their driver handle and release it exactly once. They all
//! share a [`Gpu`] context, which wraps a [`Backend`](backend::Backend): the OpenGL one for real
//! rendering, the recording one for headless use.
//!
//! On the input side, an [`EventTable`] routes events to handlers and [`KeyCombos`] maps exact
//! sets of held keys to actions. [`App`] ties them to a [`Platform`](platform::Platform).

pub mod app;
pub mod backend;
pub mod buffer;
pub mod event;
pub mod framebuffer;
pub mod gpu;
pub mod handle;
pub mod key;
pub mod logger;
pub mod pipeline;
pub mod platform;
pub mod settings;
pub mod shader;
pub mod texture;
pub mod time;
pub mod transform;
pub mod uniform;
pub mod vertex;

pub use crate::app::App;
pub use crate::buffer::{Buffer, BufferError};
pub use crate::event::{Event, EventKind, EventTable, KeyEvent, Payload};
pub use crate::framebuffer::{Framebuffer, Renderbuffer};
pub use crate::gpu::Gpu;
pub use crate::handle::Handle;
pub use crate::key::{KeyCode, KeyCombos, KeyNames};
pub use crate::pipeline::Pipeline;
pub use crate::settings::{Settings, SettingsError};
pub use crate::shader::{ProgramStatus, ShaderError, ShaderProgram, Stage};
pub use crate::texture::{Texture, TextureError};
pub use crate::time::{FrameTimer, Monotonic, Time};
pub use crate::transform::Transforms;
pub use crate::uniform::UniformBlock;
pub use crate::vertex::VertexArray;
