//! Keys, key names and key combos.
//!
//! [`KeyCombos`] tracks the set of currently held keys and maps exact sets of keys to actions.
//! There is no prefix matching: an action fires when the held set becomes exactly equal to the
//! combo it is bound to.

use log::debug;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::event::KeyEvent;

/// Platform key code.
///
/// Values follow the glfw key tokens (printable keys are their ASCII upper-case code).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KeyCode(pub i32);

impl KeyCode {
  pub const SPACE: KeyCode = KeyCode(32);
  pub const A: KeyCode = KeyCode(65);
  pub const B: KeyCode = KeyCode(66);
  pub const S: KeyCode = KeyCode(83);
  pub const ESCAPE: KeyCode = KeyCode(256);
  pub const ENTER: KeyCode = KeyCode(257);
  pub const LEFT_CONTROL: KeyCode = KeyCode(341);
  pub const LEFT_ALT: KeyCode = KeyCode(342);
}

impl fmt::Display for KeyCode {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    self.0.fmt(f)
  }
}

/// Human-readable names for keys.
#[derive(Clone, Debug, Default)]
pub struct KeyNames {
  names: HashMap<KeyCode, String>,
}

impl KeyNames {
  pub fn new() -> Self {
    KeyNames::default()
  }

  pub fn with_name<N>(mut self, key: KeyCode, name: N) -> Self where N: Into<String> {
    self.names.insert(key, name.into());
    self
  }

  /// Name of a key, falling back to its numeric code.
  pub fn name(&self, key: KeyCode) -> String {
    self.names.get(&key).cloned().unwrap_or_else(|| key.to_string())
  }

  /// Render a set of keys, joined by `:`.
  pub fn render<'a, I>(&self, keys: I) -> String where I: IntoIterator<Item = &'a KeyCode> {
    keys.into_iter().map(|key| self.name(*key)).collect::<Vec<_>>().join(":")
  }
}

impl<'a> From<&'a [(KeyCode, &'a str)]> for KeyNames {
  fn from(pairs: &'a [(KeyCode, &'a str)]) -> Self {
    pairs.iter().fold(KeyNames::new(), |names, &(key, name)| names.with_name(key, name))
  }
}

/// Action bound to a combo.
pub type Action<C> = fn(&mut C);

/// Key-combo recognizer.
pub struct KeyCombos<C> {
  held: BTreeSet<KeyCode>,
  combos: HashMap<BTreeSet<KeyCode>, Action<C>>,
}

impl<C> KeyCombos<C> {
  /// Maximum number of keys held at once.
  pub const MAX_COMBO_SIZE: usize = 4;

  pub fn new() -> Self {
    KeyCombos {
      held: BTreeSet::new(),
      combos: HashMap::new(),
    }
  }

  /// Bind `action` to the exact set `keys`. Binding the same set twice replaces the action.
  pub fn with_combo(mut self, keys: &[KeyCode], action: Action<C>) -> Self {
    self.combos.insert(keys.iter().cloned().collect(), action);
    self
  }

  /// Currently held keys, sorted by code.
  pub fn held(&self) -> &BTreeSet<KeyCode> {
    &self.held
  }

  /// Update the held set with a key event.
  ///
  /// If the held set changed and is now exactly a bound combo, its action is returned; the caller
  /// is expected to invoke it exactly once.
  pub fn feed(&mut self, key: &KeyEvent) -> Option<Action<C>> {
    let changed = if key.pressed {
      !key.repeat && self.held.len() < Self::MAX_COMBO_SIZE && self.held.insert(key.key)
    } else {
      self.held.remove(&key.key)
    };

    if !changed {
      return None;
    }

    let action = self.combos.get(&self.held).cloned();

    if action.is_some() {
      debug!("combo {:?} activated", self.held);
    }

    action
  }
}

impl<C> Default for KeyCombos<C> {
  fn default() -> Self {
    KeyCombos::new()
  }
}

impl<C> fmt::Debug for KeyCombos<C> {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.debug_struct("KeyCombos")
      .field("held", &self.held)
      .field("combos", &self.combos.keys().collect::<Vec<_>>())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Default)]
  struct Ctx {
    quits: u32,
    toggles: u32,
  }

  fn quit(ctx: &mut Ctx) {
    ctx.quits += 1;
  }

  fn toggle(ctx: &mut Ctx) {
    ctx.toggles += 1;
  }

  fn down(key: KeyCode) -> KeyEvent {
    KeyEvent { key, scancode: 0, pressed: true, repeat: false }
  }

  fn repeat(key: KeyCode) -> KeyEvent {
    KeyEvent { key, scancode: 0, pressed: true, repeat: true }
  }

  fn up(key: KeyCode) -> KeyEvent {
    KeyEvent { key, scancode: 0, pressed: false, repeat: false }
  }

  fn combos() -> KeyCombos<Ctx> {
    KeyCombos::new()
      .with_combo(&[KeyCode::ESCAPE], quit)
      .with_combo(&[KeyCode::LEFT_ALT, KeyCode::ENTER], toggle)
  }

  fn feed(combos: &mut KeyCombos<Ctx>, ctx: &mut Ctx, key: KeyEvent) {
    if let Some(action) = combos.feed(&key) {
      action(ctx);
    }
  }

  #[test]
  fn order_independent_match() {
    let mut combos = combos();
    let mut ctx = Ctx::default();

    feed(&mut combos, &mut ctx, down(KeyCode::ENTER));
    feed(&mut combos, &mut ctx, down(KeyCode::LEFT_ALT));

    assert_eq!(ctx.toggles, 1);
  }

  #[test]
  fn no_prefix_match() {
    let mut combos = combos();
    let mut ctx = Ctx::default();

    feed(&mut combos, &mut ctx, down(KeyCode::A));
    feed(&mut combos, &mut ctx, down(KeyCode::ESCAPE));

    assert_eq!(ctx.quits, 0);

    // releasing A leaves exactly {ESCAPE}
    feed(&mut combos, &mut ctx, up(KeyCode::A));

    assert_eq!(ctx.quits, 1);
  }

  #[test]
  fn repeat_does_not_refire() {
    let mut combos = combos();
    let mut ctx = Ctx::default();

    feed(&mut combos, &mut ctx, down(KeyCode::ESCAPE));
    feed(&mut combos, &mut ctx, repeat(KeyCode::ESCAPE));
    feed(&mut combos, &mut ctx, repeat(KeyCode::ESCAPE));

    assert_eq!(ctx.quits, 1);
  }

  #[test]
  fn cap_drops_excess_keys() {
    let mut combos = combos();
    let mut ctx = Ctx::default();

    for code in 65..75 {
      feed(&mut combos, &mut ctx, down(KeyCode(code)));
    }

    assert_eq!(combos.held().len(), KeyCombos::<Ctx>::MAX_COMBO_SIZE);
    assert!(combos.held().contains(&KeyCode(65)));
    assert!(!combos.held().contains(&KeyCode(70)));

    // releasing a dropped key is a no-op
    feed(&mut combos, &mut ctx, up(KeyCode(70)));
    assert_eq!(combos.held().len(), KeyCombos::<Ctx>::MAX_COMBO_SIZE);
  }

  #[test]
  fn release_unknown_key() {
    let mut combos = combos();

    assert!(combos.feed(&up(KeyCode::ESCAPE)).is_none());
    assert!(combos.held().is_empty());
  }

  #[test]
  fn names() {
    let names = KeyNames::from(&[(KeyCode::ESCAPE, "ESC"), (KeyCode::LEFT_ALT, "L_ALT")][..]);
    let keys: BTreeSet<_> = vec![KeyCode::LEFT_ALT, KeyCode::A, KeyCode::ESCAPE].into_iter().collect();

    assert_eq!(names.render(&keys), "65:ESC:L_ALT");
    assert_eq!(names.render(&BTreeSet::new()), "");
  }
}
