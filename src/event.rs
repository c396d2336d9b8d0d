//! Events and their dispatch.
//!
//! Platform events are converted into [`Event`]s and routed through an [`EventTable`], a static
//! map from [`EventKind`] to handler built once at startup. Event kinds without a handler are
//! ignored: most of them are intentionally left unhandled.

use log::debug;
use std::collections::HashMap;
use std::fmt;

use crate::key::KeyCode;

/// Discrete event type tag.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum EventKind {
  Quit,
  KeyDown,
  KeyUp,
  MouseButtonDown,
  MouseButtonUp,
  CursorMove,
  Scroll,
  Resize,
  Focus,
}

impl EventKind {
  pub fn name(self) -> &'static str {
    match self {
      EventKind::Quit => "QUIT",
      EventKind::KeyDown => "KEY_DOWN",
      EventKind::KeyUp => "KEY_UP",
      EventKind::MouseButtonDown => "MOUSE_BUTTON_DOWN",
      EventKind::MouseButtonUp => "MOUSE_BUTTON_UP",
      EventKind::CursorMove => "CURSOR_MOVE",
      EventKind::Scroll => "SCROLL",
      EventKind::Resize => "RESIZE",
      EventKind::Focus => "FOCUS",
    }
  }
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.write_str(self.name())
  }
}

/// Keyboard payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyEvent {
  pub key: KeyCode,
  /// Platform-specific scancode.
  pub scancode: i32,
  pub pressed: bool,
  /// Auto-repeat signal of a held key.
  pub repeat: bool,
}

/// Type-specific part of an event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Payload {
  Quit,
  Key(KeyEvent),
  MouseButton { button: u8, pressed: bool },
  CursorMove { x: f64, y: f64 },
  Scroll { x: f64, y: f64 },
  Resize { width: u32, height: u32 },
  Focus(bool),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event {
  /// Seconds since the platform started.
  pub timestamp: f64,
  pub payload: Payload,
}

impl Event {
  pub fn new(timestamp: f64, payload: Payload) -> Self {
    Event { timestamp, payload }
  }

  pub fn quit(timestamp: f64) -> Self {
    Event::new(timestamp, Payload::Quit)
  }

  pub fn key(timestamp: f64, key: KeyCode, pressed: bool, repeat: bool) -> Self {
    Event::new(timestamp, Payload::Key(KeyEvent { key, scancode: 0, pressed, repeat }))
  }

  pub fn kind(&self) -> EventKind {
    match self.payload {
      Payload::Quit => EventKind::Quit,
      Payload::Key(KeyEvent { pressed: true, .. }) => EventKind::KeyDown,
      Payload::Key(KeyEvent { pressed: false, .. }) => EventKind::KeyUp,
      Payload::MouseButton { pressed: true, .. } => EventKind::MouseButtonDown,
      Payload::MouseButton { pressed: false, .. } => EventKind::MouseButtonUp,
      Payload::CursorMove { .. } => EventKind::CursorMove,
      Payload::Scroll { .. } => EventKind::Scroll,
      Payload::Resize { .. } => EventKind::Resize,
      Payload::Focus(_) => EventKind::Focus,
    }
  }
}

/// Event handler over a context `C`.
pub type Handler<C> = fn(&mut C, &Event);

/// Immutable map from event kind to handler.
pub struct EventTable<C> {
  handlers: HashMap<EventKind, Handler<C>>,
}

impl<C> EventTable<C> {
  /// Build the table. A kind appearing twice keeps its last handler.
  pub fn new<I>(entries: I) -> Self where I: IntoIterator<Item = (EventKind, Handler<C>)> {
    EventTable {
      handlers: entries.into_iter().collect(),
    }
  }

  pub fn handles(&self, kind: EventKind) -> bool {
    self.handlers.contains_key(&kind)
  }

  /// Route `event` to its handler.
  ///
  /// Returns whether a handler was found.
  pub fn dispatch(&self, ctx: &mut C, event: &Event) -> bool {
    let kind = event.kind();

    match self.handlers.get(&kind) {
      Some(handler) => {
        handler(ctx, event);
        debug!("{}: handled {}", event.timestamp, kind);
        true
      }

      None => false,
    }
  }
}

impl<C> fmt::Debug for EventTable<C> {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    let mut kinds: Vec<_> = self.handlers.keys().collect();
    kinds.sort();
    f.debug_struct("EventTable").field("kinds", &kinds).finish()
  }
}
