//! Windowing and context layer.
//!
//! [`Platform`] is everything the application needs from the window system: a source of events,
//! a way to present frames and a few window controls. [`GlfwPlatform`] is the real thing; tests
//! provide scripted implementations.

use std::error::Error;
use std::fmt;

use crate::event::Event;

#[cfg(feature = "window")]
pub mod window;

#[cfg(feature = "window")]
pub use self::window::GlfwPlatform;

pub trait Platform {
  /// Gather pending window-system events. Called once per frame, before draining them with
  /// [`Platform::poll_event`].
  fn pump_events(&mut self) {}

  /// Next pending event, if any. Never blocks.
  fn poll_event(&mut self) -> Option<Event>;

  /// Present the back buffer.
  fn swap_buffers(&mut self);

  fn set_title(&mut self, title: &str);

  /// Ask the user to pick one of `buttons`. Returns the index of the picked button, or `None` if
  /// the prompt was dismissed.
  fn confirm(&mut self, title: &str, message: &str, buttons: &[&str]) -> Option<usize>;

  /// Switch between fullscreen and a window of `windowed_size`.
  fn set_fullscreen(&mut self, fullscreen: bool, windowed_size: (u32, u32));

  /// Size of the drawable area, in pixels.
  fn framebuffer_size(&self) -> (u32, u32);
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PlatformError {
  /// The window system couldn’t be initialized.
  Init(String),
  /// The window (or its GL context) couldn’t be created.
  WindowCreation(String),
}

impl fmt::Display for PlatformError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      PlatformError::Init(ref e) => write!(f, "cannot initialize the window system: {}", e),
      PlatformError::WindowCreation(ref e) => write!(f, "cannot create window: {}", e),
    }
  }
}

impl Error for PlatformError {}
