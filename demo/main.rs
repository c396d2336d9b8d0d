//! Opens a window and spins a triangle.
//!
//! Escape asks to quit, left Alt + Enter toggles fullscreen and left Control + S saves the
//! settings.

mod triangle;

use clap::Parser;
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::process::exit;

use prism::app::{default_events, App};
use prism::backend::GlBackend;
use prism::platform::{GlfwPlatform, Platform};
use prism::{logger, FrameTimer, Gpu, Settings};

use crate::triangle::Triangle;

const TITLE: &str = "prism";

#[derive(Debug, Parser)]
#[command(name = "prism", version, about = "Spinning triangle demo")]
struct Opt {
  /// Settings file.
  #[arg(long, default_value = "settings.json")]
  settings: PathBuf,

  /// Directory holding default.vsh and default.fsh.
  #[arg(long, default_value = "shaders")]
  shaders: PathBuf,

  /// Start in fullscreen mode.
  #[arg(short, long)]
  fullscreen: bool,

  /// Windowed width.
  #[arg(long)]
  width: Option<u32>,

  /// Windowed height.
  #[arg(long)]
  height: Option<u32>,

  /// Show debug messages.
  #[arg(short, long)]
  verbose: bool,
}

fn main() {
  let opt = Opt::parse();

  let level = if opt.verbose { LevelFilter::Debug } else { LevelFilter::Info };
  if let Err(e) = logger::init(level) {
    eprintln!("cannot install logger: {}", e);
  }

  let mut settings = match Settings::load(&opt.settings) {
    Ok(settings) => settings,
    Err(e) => {
      error!("{}; using defaults", e);
      Settings::default()
    }
  };

  if let Some(width) = opt.width {
    settings.window.width = width;
  }

  if let Some(height) = opt.height {
    settings.window.height = height;
  }

  settings.window.fullscreen |= opt.fullscreen;

  let window = settings.window;
  let platform = match GlfwPlatform::new(TITLE, window.width, window.height, window.fullscreen) {
    Ok(platform) => platform,
    Err(e) => {
      error!("{}", e);
      exit(1);
    }
  };

  let size = platform.framebuffer_size();
  let gpu = Gpu::new(GlBackend::new());

  let mut triangle = match Triangle::new(&gpu, &opt.shaders, size) {
    Ok(triangle) => triangle,
    Err(e) => {
      error!("cannot build the scene: {}", e);
      exit(1);
    }
  };

  let mut app = App::new(Box::new(platform), settings).with_settings_path(&opt.settings);
  let events = default_events();
  let mut timer = FrameTimer::new();

  app.run(&events, |app| {
    if let Some((w, h)) = app.take_resized() {
      triangle.resize(w, h);
    }

    let dt = timer.tick();
    triangle.render(dt.as_secs(), app.framebuffer_size());
  });

  info!("bye after {}s", timer.elapsed());

  // GL objects go before the context
  triangle.destroy();
  drop(triangle);
  drop(gpu);
  drop(app);
}
