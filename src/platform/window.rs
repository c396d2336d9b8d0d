//! glfw windows with an OpenGL 4.5 core context.

use glfw::{Action, Context, Glfw, GlfwReceiver, PWindow, WindowEvent, WindowHint, WindowMode};
use log::{info, warn};
use std::collections::VecDeque;
use std::os::raw::c_void;

use crate::event::{Event, KeyEvent, Payload};
use crate::key::KeyCode;
use crate::platform::{Platform, PlatformError};

pub struct GlfwPlatform {
  glfw: Glfw,
  window: PWindow,
  events: GlfwReceiver<(f64, WindowEvent)>,
  pending: VecDeque<Event>,
}

impl GlfwPlatform {
  /// Open a window and make its GL context current, loading the GL entry points.
  ///
  /// In fullscreen mode the window covers the primary monitor at its current video mode.
  pub fn new(title: &str, width: u32, height: u32, fullscreen: bool) -> Result<Self, PlatformError> {
    let mut glfw = glfw::init(glfw::log_errors).map_err(|e| PlatformError::Init(format!("{:?}", e)))?;

    glfw.window_hint(WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
    glfw.window_hint(WindowHint::OpenGlForwardCompat(true));
    glfw.window_hint(WindowHint::ContextVersionMajor(4));
    glfw.window_hint(WindowHint::ContextVersionMinor(5));

    let created = if fullscreen {
      glfw.with_primary_monitor(|glfw, monitor| {
        let monitor = monitor?;
        let vmode = monitor.get_video_mode()?;
        glfw.create_window(vmode.width, vmode.height, title, WindowMode::FullScreen(monitor))
      })
    } else {
      glfw.create_window(width, height, title, WindowMode::Windowed)
    };

    let (mut window, events) = created.ok_or_else(|| {
      PlatformError::WindowCreation(format!("{}x{} (fullscreen: {})", width, height, fullscreen))
    })?;

    window.make_current();
    window.set_key_polling(true);
    window.set_mouse_button_polling(true);
    window.set_cursor_pos_polling(true);
    window.set_scroll_polling(true);
    window.set_framebuffer_size_polling(true);
    window.set_focus_polling(true);
    window.set_close_polling(true);

    gl::load_with(|s| window.get_proc_address(s) as *const c_void);

    let (w, h) = window.get_framebuffer_size();
    info!("using resolution {}x{}", w, h);

    Ok(GlfwPlatform {
      glfw,
      window,
      events,
      pending: VecDeque::new(),
    })
  }

  fn convert(time: f64, event: WindowEvent) -> Option<Event> {
    let payload = match event {
      WindowEvent::Close => Payload::Quit,

      WindowEvent::Key(key, scancode, action, _) => Payload::Key(KeyEvent {
        key: KeyCode(key as i32),
        scancode,
        pressed: action != Action::Release,
        repeat: action == Action::Repeat,
      }),

      WindowEvent::MouseButton(button, action, _) => Payload::MouseButton {
        button: button as u8,
        pressed: action != Action::Release,
      },

      WindowEvent::CursorPos(x, y) => Payload::CursorMove { x, y },
      WindowEvent::Scroll(x, y) => Payload::Scroll { x, y },

      WindowEvent::FramebufferSize(w, h) => Payload::Resize {
        width: w.max(0) as u32,
        height: h.max(0) as u32,
      },

      WindowEvent::Focus(focused) => Payload::Focus(focused),

      _ => return None,
    };

    Some(Event::new(time, payload))
  }
}

impl Platform for GlfwPlatform {
  fn pump_events(&mut self) {
    self.glfw.poll_events();

    for (time, event) in glfw::flush_messages(&self.events) {
      if let WindowEvent::Close = event {
        // closing is up to the application
        self.window.set_should_close(false);
      }

      if let Some(event) = Self::convert(time, event) {
        self.pending.push_back(event);
      }
    }
  }

  fn poll_event(&mut self) -> Option<Event> {
    self.pending.pop_front()
  }

  fn swap_buffers(&mut self) {
    self.window.swap_buffers();
  }

  fn set_title(&mut self, title: &str) {
    self.window.set_title(title);
  }

  fn confirm(&mut self, title: &str, message: &str, buttons: &[&str]) -> Option<usize> {
    // no message box in glfw; pick the default (return key) button
    warn!("{}: {} [{}] -> {}", title, message, buttons.join("/"), buttons.first().unwrap_or(&"<none>"));

    if buttons.is_empty() {
      None
    } else {
      Some(0)
    }
  }

  fn set_fullscreen(&mut self, fullscreen: bool, windowed_size: (u32, u32)) {
    let window = &mut self.window;

    if fullscreen {
      self.glfw.with_primary_monitor(|_, monitor| {
        match monitor.and_then(|m| m.get_video_mode().map(|vmode| (m, vmode))) {
          Some((monitor, vmode)) => {
            window.set_monitor(WindowMode::FullScreen(monitor), 0, 0, vmode.width, vmode.height, Some(vmode.refresh_rate));
            info!("switched to fullscreen {}x{}", vmode.width, vmode.height);
          }

          None => warn!("no primary monitor; staying windowed"),
        }
      });
    } else {
      let (w, h) = windowed_size;
      window.set_monitor(WindowMode::Windowed, 0, 0, w, h, None);
      info!("switched to windowed {}x{}", w, h);
    }
  }

  fn framebuffer_size(&self) -> (u32, u32) {
    let (w, h) = self.window.get_framebuffer_size();
    (w.max(0) as u32, h.max(0) as u32)
  }
}
