//! Persistent settings.
//!
//! Settings are stored as JSON. Every key is optional and falls back to its default; a missing
//! file yields the default settings.

use log::info;
use serde_derive::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::Path;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Settings {
  pub window: WindowSettings,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct WindowSettings {
  /// Windowed width.
  pub width: u32,
  /// Windowed height.
  pub height: u32,
  pub fullscreen: bool,
}

impl Default for WindowSettings {
  fn default() -> Self {
    WindowSettings {
      width: 1280,
      height: 1024,
      fullscreen: false,
    }
  }
}

impl Settings {
  /// Load settings from a JSON file.
  pub fn load<P>(path: P) -> Result<Self, SettingsError> where P: AsRef<Path> {
    let path = path.as_ref();

    let file = match File::open(path) {
      Ok(file) => file,
      Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
        info!("no settings at {}, using defaults", path.display());
        return Ok(Settings::default());
      }
      Err(e) => return Err(SettingsError::Read(format!("{}: {}", path.display(), e))),
    };

    let settings = serde_json::from_reader(io::BufReader::new(file))
      .map_err(|e| SettingsError::Parse(format!("{}: {}", path.display(), e)))?;

    info!("loaded settings from {}", path.display());

    Ok(settings)
  }

  /// Save settings to a JSON file, creating parent directories if needed.
  pub fn save<P>(&self, path: P) -> Result<(), SettingsError> where P: AsRef<Path> {
    let path = path.as_ref();
    let write_err = |e: &dyn fmt::Display| SettingsError::Write(format!("{}: {}", path.display(), e));

    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent).map_err(|e| write_err(&e))?;
      }
    }

    let json = serde_json::to_string_pretty(self).map_err(|e| write_err(&e))?;
    fs::write(path, json).map_err(|e| write_err(&e))?;

    info!("saved settings to {}", path.display());

    Ok(())
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SettingsError {
  Read(String),
  Parse(String),
  Write(String),
}

impl fmt::Display for SettingsError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      SettingsError::Read(ref e) => write!(f, "cannot read settings: {}", e),
      SettingsError::Parse(ref e) => write!(f, "cannot parse settings: {}", e),
      SettingsError::Write(ref e) => write!(f, "cannot write settings: {}", e),
    }
  }
}

impl Error for SettingsError {}

#[cfg(test)]
mod tests {
  use super::*;
  use std::env;
  use std::path::PathBuf;
  use std::process;

  fn scratch(name: &str) -> PathBuf {
    env::temp_dir().join(format!("prism-settings-{}-{}", process::id(), name))
  }

  #[test]
  fn defaults() {
    let settings = Settings::default();

    assert_eq!(settings.window.width, 1280);
    assert_eq!(settings.window.height, 1024);
    assert!(!settings.window.fullscreen);
  }

  #[test]
  fn missing_keys_fall_back() {
    let settings: Settings = serde_json::from_str(r#"{ "window": { "fullscreen": true } }"#).unwrap();

    assert_eq!(settings.window, WindowSettings { width: 1280, height: 1024, fullscreen: true });
    assert_eq!(serde_json::from_str::<Settings>("{}").unwrap(), Settings::default());
  }

  #[test]
  fn missing_file_yields_defaults() {
    assert_eq!(Settings::load(scratch("missing.json")).unwrap(), Settings::default());
  }

  #[test]
  fn malformed_file() {
    let path = scratch("malformed.json");
    fs::write(&path, "{ window: ").unwrap();

    match Settings::load(&path) {
      Err(SettingsError::Parse(_)) => (),
      r => panic!("unexpected result: {:?}", r),
    }

    let _ = fs::remove_file(&path);
  }

  #[test]
  fn save_then_load() {
    let dir = scratch("nested");
    let path = dir.join("deeper").join("settings.json");
    let mut settings = Settings::default();
    settings.window.width = 800;
    settings.window.fullscreen = true;

    settings.save(&path).unwrap();

    assert_eq!(Settings::load(&path).unwrap(), settings);

    let _ = fs::remove_dir_all(&dir);
  }
}
