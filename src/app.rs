//! Application context and main loop.
//!
//! [`App`] owns the platform and the state handlers act upon. Events are routed through an
//! [`EventTable`] kept outside of the application so that handlers can borrow it mutably.
//! Keyboard events feed the key-combo recognizer, whose actions may push further events (the
//! Escape combo pushes a quit request) that get processed before platform events.

use log::{debug, error, info};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::event::{Event, EventKind, EventTable, Handler, Payload};
use crate::key::{KeyCode, KeyCombos, KeyNames};
use crate::platform::Platform;
use crate::settings::Settings;

pub struct App {
  platform: Box<dyn Platform>,
  running: bool,
  settings: Settings,
  settings_path: Option<PathBuf>,
  combos: KeyCombos<App>,
  names: KeyNames,
  pending: VecDeque<Event>,
  // timestamp of the event being processed
  now: f64,
  title: String,
  fullscreen: bool,
  framebuffer_size: (u32, u32),
  resized: bool,
}

impl App {
  pub fn new(platform: Box<dyn Platform>, settings: Settings) -> Self {
    let framebuffer_size = platform.framebuffer_size();

    App {
      platform,
      running: true,
      fullscreen: settings.window.fullscreen,
      settings,
      settings_path: None,
      combos: default_combos(),
      names: default_key_names(),
      pending: VecDeque::new(),
      now: 0.,
      title: String::new(),
      framebuffer_size,
      resized: false,
    }
  }

  /// Where the save-settings combo writes to.
  pub fn with_settings_path<P>(mut self, path: P) -> Self where P: AsRef<Path> {
    self.settings_path = Some(path.as_ref().to_owned());
    self
  }

  /// Replace the key-combo bindings.
  pub fn with_combos(mut self, combos: KeyCombos<App>) -> Self {
    self.combos = combos;
    self
  }

  pub fn is_running(&self) -> bool {
    self.running
  }

  /// Leave the main loop at the end of the current iteration.
  pub fn stop(&mut self) {
    self.running = false;
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  pub fn is_fullscreen(&self) -> bool {
    self.fullscreen
  }

  pub fn framebuffer_size(&self) -> (u32, u32) {
    self.framebuffer_size
  }

  /// Last title set on the window.
  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn held_keys(&self) -> Vec<KeyCode> {
    self.combos.held().iter().cloned().collect()
  }

  /// New framebuffer size if it changed since the last call.
  pub fn take_resized(&mut self) -> Option<(u32, u32)> {
    if self.resized {
      self.resized = false;
      Some(self.framebuffer_size)
    } else {
      None
    }
  }

  pub fn platform_mut(&mut self) -> &mut dyn Platform {
    &mut *self.platform
  }

  /// Queue an event, processed before any pending platform event.
  pub fn push_event(&mut self, event: Event) {
    self.pending.push_back(event);
  }

  fn next_event(&mut self) -> Option<Event> {
    self.pending.pop_front().or_else(|| self.platform.poll_event())
  }

  /// Dispatch every pending event. Stops early if a handler stops the application.
  ///
  /// Returns the number of events pulled.
  pub fn process_events(&mut self, events: &EventTable<App>) -> usize {
    let mut count = 0;

    self.platform.pump_events();

    while self.running {
      let event = match self.next_event() {
        Some(event) => event,
        None => break,
      };

      self.now = event.timestamp;
      events.dispatch(self, &event);
      count += 1;
    }

    count
  }

  /// Run the main loop: process events, render a frame with `frame`, present it; until stopped.
  pub fn run<F>(&mut self, events: &EventTable<App>, mut frame: F) where F: FnMut(&mut App) {
    info!("entering main loop");

    while self.running {
      self.process_events(events);
      frame(self);
      self.platform.swap_buffers();
    }

    info!("leaving main loop");
  }

  fn set_title(&mut self, title: String) {
    self.platform.set_title(&title);
    self.title = title;
  }
}

/// Event handlers of the application.
pub fn default_events() -> EventTable<App> {
  EventTable::new(vec![
    (EventKind::Quit, on_quit as Handler<App>),
    (EventKind::KeyDown, on_key),
    (EventKind::KeyUp, on_key),
    (EventKind::Resize, on_resize),
  ])
}

fn on_quit(app: &mut App, _: &Event) {
  match app.platform.confirm("QUIT", "Really quit?", &["Quit", "Cancel"]) {
    Some(0) => {
      info!("quitting");
      app.running = false;
    }

    _ => debug!("quit cancelled"),
  }
}

fn on_key(app: &mut App, event: &Event) {
  let key = match event.payload {
    Payload::Key(ref key) => key,
    _ => return,
  };

  if let Some(action) = app.combos.feed(key) {
    action(app);
  }

  let title = app.names.render(app.combos.held());
  app.set_title(title);
}

fn on_resize(app: &mut App, event: &Event) {
  if let Payload::Resize { width, height } = event.payload {
    app.framebuffer_size = (width, height);
    app.resized = true;
  }
}

/// Key combos of the application.
pub fn default_combos() -> KeyCombos<App> {
  KeyCombos::new()
    .with_combo(&[KeyCode::ESCAPE], request_quit)
    .with_combo(&[KeyCode::LEFT_ALT, KeyCode::ENTER], toggle_fullscreen)
    .with_combo(&[KeyCode::LEFT_CONTROL, KeyCode::S], save_settings)
}

pub fn default_key_names() -> KeyNames {
  KeyNames::from(&[
    (KeyCode::ESCAPE, "ESC"),
    (KeyCode::LEFT_ALT, "L_ALT"),
    (KeyCode::LEFT_CONTROL, "L_CTRL"),
    (KeyCode::ENTER, "RETURN"),
    (KeyCode::SPACE, "SPACE"),
    (KeyCode::A, "A"),
    (KeyCode::B, "B"),
    (KeyCode::S, "S"),
  ][..])
}

fn request_quit(app: &mut App) {
  let now = app.now;
  app.push_event(Event::quit(now));
}

fn toggle_fullscreen(app: &mut App) {
  let windowed = (app.settings.window.width, app.settings.window.height);

  app.fullscreen = !app.fullscreen;
  app.platform.set_fullscreen(app.fullscreen, windowed);
  app.framebuffer_size = app.platform.framebuffer_size();
  app.resized = true;
}

fn save_settings(app: &mut App) {
  let path = match app.settings_path {
    Some(ref path) => path.clone(),
    None => {
      debug!("no settings path; not saving");
      return;
    }
  };

  if !app.fullscreen {
    app.settings.window.width = app.framebuffer_size.0;
    app.settings.window.height = app.framebuffer_size.1;
  }

  app.settings.window.fullscreen = app.fullscreen;

  if let Err(e) = app.settings.save(&path) {
    error!("{}", e);
  }
}
