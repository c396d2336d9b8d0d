use prism::app::{default_events, App};
use prism::backend::{
  BufferKind, BufferUsage, Call, ObjectKind, Primitive, RecordingBackend, TextureTarget
};
use prism::event::Payload;
use prism::key::Action;
use prism::platform::Platform;
use prism::transform::{self, Transforms};
use prism::{
  Buffer, Event, Framebuffer, Gpu, KeyCode, KeyCombos, KeyEvent, Pipeline, Renderbuffer, Settings,
  ShaderProgram, Stage, Texture, UniformBlock, VertexArray
};
use rand::{thread_rng, Rng};
use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

const VS: &str = "#version 450 core\nvoid main() {}\n";

#[test]
fn destroy_twice_never_double_frees() {
  let backend = RecordingBackend::new();
  let gpu = Gpu::new(backend.clone());

  let mut buffer = Buffer::new(&gpu, BufferKind::Array);
  let mut texture = Texture::new(&gpu, TextureTarget::D2);
  let mut framebuffer = Framebuffer::new(&gpu);
  let mut renderbuffer = Renderbuffer::new(&gpu);
  let mut program = ShaderProgram::new(&gpu, Stage::Vertex, VS);
  let mut pipeline = Pipeline::new(&gpu);
  let mut vao = VertexArray::new(&gpu);

  assert_eq!(backend.live_objects(), 7);

  for _ in 0..2 {
    buffer.destroy();
    texture.destroy();
    framebuffer.destroy();
    renderbuffer.destroy();
    program.destroy();
    pipeline.destroy();
    vao.destroy();
  }

  drop((buffer, texture, framebuffer, renderbuffer, program, pipeline, vao));

  assert_eq!(backend.live_objects(), 0);
  assert_eq!(backend.invalid_deletions(), 0);
  assert_eq!(backend.count(|call| match *call { Call::DeleteObject(..) => true, _ => false }), 7);
}

#[test]
fn failed_creation_is_never_deleted() {
  let backend = RecordingBackend::new();
  let gpu = Gpu::new(backend.clone());
  backend.set_creation_failure(true);

  let mut buffer = Buffer::new(&gpu, BufferKind::Uniform);

  assert!(!buffer.is_valid());
  buffer.destroy();
  drop(buffer);

  assert_eq!(backend.count(|call| match *call { Call::DeleteObject(..) => true, _ => false }), 0);
}

#[test]
fn binding_cache_follows_random_binds() {
  let mut rng = thread_rng();

  for _ in 0..50 {
    let backend = RecordingBackend::new();
    let gpu = Gpu::new(backend.clone());
    let textures: Vec<_> = (0..4).map(|_| Texture::new(&gpu, TextureTarget::D2)).collect();
    let mut expected: Option<u32> = textures.last().map(Texture::id);

    for _ in 0..200 {
      let texture = &textures[rng.gen_range(0..textures.len())];
      let before = backend.count(|call| match *call { Call::BindTexture { .. } => true, _ => false });

      if rng.gen_bool(0.7) {
        let was_bound = expected == Some(texture.id());
        let called = texture.bind();

        assert_eq!(called, !was_bound);
        expected = Some(texture.id());
      } else {
        let was_bound = expected == Some(texture.id());
        let called = texture.unbind();

        assert_eq!(called, was_bound);

        if was_bound {
          expected = None;
        }
      }

      let after = backend.count(|call| match *call { Call::BindTexture { .. } => true, _ => false });

      assert!(after - before <= 1);
      assert_eq!(gpu.bound_texture(TextureTarget::D2), expected);
      assert_eq!(backend.bound_texture(TextureTarget::D2), expected);

      for t in &textures {
        assert_eq!(t.is_bound(), Some(t.id()) == expected);
      }
    }
  }
}

#[test]
fn binding_cache_is_per_target() {
  let backend = RecordingBackend::new();
  let gpu = Gpu::new(backend.clone());
  let flat = Texture::new(&gpu, TextureTarget::D2);
  let cube = Texture::new(&gpu, TextureTarget::CubeMap);

  assert!(flat.is_bound());
  assert!(cube.is_bound());
  assert!(!flat.bind());
  assert!(!cube.bind());
}

#[derive(Debug, Default)]
struct Fired {
  quit: u32,
  toggle: u32,
  save: u32,
}

fn fire_quit(f: &mut Fired) {
  f.quit += 1;
}

fn fire_toggle(f: &mut Fired) {
  f.toggle += 1;
}

fn fire_save(f: &mut Fired) {
  f.save += 1;
}

#[test]
fn combos_fire_on_exact_set_entry() {
  let pool = [KeyCode::ESCAPE, KeyCode::LEFT_ALT, KeyCode::ENTER, KeyCode::LEFT_CONTROL, KeyCode::S, KeyCode::A];
  let bound: Vec<(BTreeSet<KeyCode>, Action<Fired>)> = vec![
    (vec![KeyCode::ESCAPE].into_iter().collect(), fire_quit),
    (vec![KeyCode::LEFT_ALT, KeyCode::ENTER].into_iter().collect(), fire_toggle),
    (vec![KeyCode::LEFT_CONTROL, KeyCode::S, KeyCode::A].into_iter().collect(), fire_save),
  ];
  let mut rng = thread_rng();

  for _ in 0..100 {
    let mut combos = bound.iter().fold(KeyCombos::new(), |combos, (keys, action)| {
      combos.with_combo(&keys.iter().cloned().collect::<Vec<_>>(), *action)
    });
    let mut fired = Fired::default();
    let mut expected = Fired::default();
    let mut held = BTreeSet::new();

    for _ in 0..300 {
      let key = pool[rng.gen_range(0..pool.len())];
      let pressed = rng.gen_bool(0.6);
      let repeat = pressed && held.contains(&key) && rng.gen_bool(0.5);
      let event = KeyEvent { key, scancode: 0, pressed, repeat };

      let changed = if pressed {
        !repeat && held.len() < KeyCombos::<Fired>::MAX_COMBO_SIZE && held.insert(key)
      } else {
        held.remove(&key)
      };

      if changed {
        if let Some(&(_, action)) = bound.iter().find(|(keys, _)| *keys == held) {
          action(&mut expected);
        }
      }

      if let Some(action) = combos.feed(&event) {
        action(&mut fired);
      }

      assert_eq!(combos.held(), &held);
      assert!(combos.held().len() <= KeyCombos::<Fired>::MAX_COMBO_SIZE);
      assert_eq!((fired.quit, fired.toggle, fired.save), (expected.quit, expected.toggle, expected.save));
    }
  }
}

#[test]
fn combo_cap_drops_excess() {
  let mut combos: KeyCombos<Fired> = KeyCombos::new()
    .with_combo(&[KeyCode(1), KeyCode(2), KeyCode(3), KeyCode(4), KeyCode(5)], fire_quit);

  for code in 1..=5 {
    let action = combos.feed(&KeyEvent { key: KeyCode(code), scancode: 0, pressed: true, repeat: false });
    assert!(action.is_none());
  }

  assert_eq!(combos.held().len(), 4);
  assert!(!combos.held().contains(&KeyCode(5)));
}

#[test]
fn uniform_field_update_touches_only_its_range() {
  let backend = RecordingBackend::new();
  let gpu = Gpu::new(backend.clone());
  let mut block = UniformBlock::new(&gpu, 0, Transforms::identity()).unwrap();
  let before = backend.buffer_contents(block.buffer().id()).unwrap();
  backend.take_calls();

  let view = transform::rotation_z(1.);
  block.set_field(Transforms::VIEW_OFFSET, &view).unwrap();

  assert_eq!(backend.calls(), vec![Call::BufferSubData { buffer: block.buffer().id(), offset: 64, len: 64 }]);

  let after = backend.buffer_contents(block.buffer().id()).unwrap();

  assert_eq!(after.len(), 192);
  assert_eq!(&after[..64], &before[..64]);
  assert_eq!(&after[64..128], bytemuck::bytes_of(&view));
  assert_eq!(&after[128..], &before[128..]);
  assert_eq!(block.data().view, view);
}

#[test]
fn pipeline_skips_failed_fragment_stage() {
  let backend = RecordingBackend::new();
  let gpu = Gpu::new(backend.clone());
  let vs = ShaderProgram::new(&gpu, Stage::Vertex, VS);
  let fs = ShaderProgram::new(&gpu, Stage::Fragment, "#version 450 core\n#error unfinished\n");

  let mut pipeline = Pipeline::new(&gpu);

  assert_eq!(pipeline.attach(&[&vs, &fs]), 1);
  assert_eq!(pipeline.stage_program(Stage::Vertex), Some(vs.id()));
  assert_eq!(pipeline.stage_program(Stage::Fragment), None);

  let vbo = Buffer::from_bytes(&gpu, BufferKind::Array, &[0; 24], BufferUsage::StaticDraw).unwrap();
  let vao = VertexArray::new(&gpu);
  vao.attribute(0, &vbo, 2, 8);

  pipeline.bind();
  vao.bind();
  gpu.backend().draw_arrays(Primitive::Triangles, 0, 3);

  assert_eq!(backend.calls().last(), Some(&Call::DrawArrays { primitive: Primitive::Triangles, first: 0, count: 3 }));
}

#[test]
fn framebuffer_with_texture_and_depth() {
  let backend = RecordingBackend::new();
  let gpu = Gpu::new(backend.clone());
  let color = Texture::new(&gpu, TextureTarget::D2);
  color.set_image(0, prism::texture::PixelFormat::RGBA8, prism::texture::ImageDesc::D2 { width: 32, height: 32 }, None).unwrap();
  let mut depth = Renderbuffer::new(&gpu);
  depth.storage(prism::texture::PixelFormat::Depth32F, 32, 32);

  let mut fb = Framebuffer::new(&gpu);
  fb.attach_texture(&color, prism::framebuffer::Attachment::Color(0), 0);
  fb.attach_renderbuffer(&depth, prism::framebuffer::Attachment::Depth);

  assert!(fb.check_complete().is_complete());
  assert_eq!(backend.count(|call| *call == Call::CreateObject(ObjectKind::Framebuffer, fb.id())), 1);
}

#[derive(Debug, Default)]
struct Screen {
  titles: Vec<String>,
  prompts: u32,
}

struct Scripted {
  events: VecDeque<Event>,
  screen: Rc<RefCell<Screen>>,
}

impl Platform for Scripted {
  fn poll_event(&mut self) -> Option<Event> {
    self.events.pop_front()
  }

  fn swap_buffers(&mut self) {}

  fn set_title(&mut self, title: &str) {
    self.screen.borrow_mut().titles.push(title.to_owned());
  }

  fn confirm(&mut self, _: &str, _: &str, _: &[&str]) -> Option<usize> {
    self.screen.borrow_mut().prompts += 1;
    Some(0)
  }

  fn set_fullscreen(&mut self, _: bool, _: (u32, u32)) {}

  fn framebuffer_size(&self) -> (u32, u32) {
    (320, 200)
  }
}

#[test]
fn unhandled_event_is_a_no_op() {
  let backend = RecordingBackend::new();
  let gpu = Gpu::new(backend.clone());
  let _texture = Texture::new(&gpu, TextureTarget::D2);
  let calls = backend.calls();

  let screen = Rc::new(RefCell::new(Screen::default()));
  let events = vec![
    Event::new(1., Payload::Scroll { x: 0., y: -1. }),
    Event::new(2., Payload::CursorMove { x: 10., y: 20. }),
    Event::new(3., Payload::Focus(false)),
  ];
  let platform = Scripted { events: events.into(), screen: screen.clone() };
  let mut app = App::new(Box::new(platform), Settings::default());

  assert_eq!(app.process_events(&default_events()), 3);

  assert!(app.is_running());
  assert_eq!(app.title(), "");
  assert!(screen.borrow().titles.is_empty());
  assert_eq!(screen.borrow().prompts, 0);
  assert_eq!(app.framebuffer_size(), (320, 200));
  assert_eq!(backend.calls(), calls);
}

#[test]
fn escape_then_confirm_ends_the_loop() {
  let screen = Rc::new(RefCell::new(Screen::default()));
  let events = vec![
    Event::key(0.1, KeyCode::A, true, false),
    Event::key(0.2, KeyCode::A, false, false),
    Event::key(0.3, KeyCode::ESCAPE, true, false),
    // never reached
    Event::key(0.4, KeyCode::B, true, false),
  ];
  let platform = Scripted { events: events.into(), screen: screen.clone() };
  let mut app = App::new(Box::new(platform), Settings::default());
  let mut frames = 0;

  app.run(&default_events(), |_| frames += 1);

  assert_eq!(frames, 1);
  assert_eq!(screen.borrow().prompts, 1);
  assert_eq!(screen.borrow().titles, vec!["A", "", "ESC"]);
  assert_eq!(app.held_keys(), vec![KeyCode::ESCAPE]);
}

#[test]
fn destroyed_objects_never_reach_the_driver() {
  let backend = RecordingBackend::new();
  let gpu = Gpu::new(backend.clone());
  let vs = ShaderProgram::new(&gpu, Stage::Vertex, VS);
  let texture = Texture::new(&gpu, TextureTarget::D2);
  let mut depth = Renderbuffer::new(&gpu);
  depth.storage(prism::texture::PixelFormat::Depth32F, 8, 8);
  let vbo = Buffer::from_bytes(&gpu, BufferKind::Array, &[0; 24], BufferUsage::StaticDraw).unwrap();

  let mut framebuffer = Framebuffer::new(&gpu);
  let mut pipeline = Pipeline::new(&gpu);
  let mut vao = VertexArray::new(&gpu);
  framebuffer.destroy();
  pipeline.destroy();
  vao.destroy();
  backend.take_calls();

  framebuffer.attach_texture(&texture, prism::framebuffer::Attachment::Color(0), 0);
  framebuffer.attach_renderbuffer(&depth, prism::framebuffer::Attachment::Depth);
  framebuffer.bind(prism::framebuffer::FramebufferTarget::Draw);

  assert_eq!(framebuffer.check_complete(), prism::framebuffer::FramebufferStatus::Undefined);
  assert!(framebuffer.attachments().is_empty());
  assert_eq!(pipeline.attach(&[&vs]), 0);
  assert_eq!(pipeline.stage_program(Stage::Vertex), None);

  pipeline.bind();
  vao.attribute(0, &vbo, 2, 8);
  vao.bind();

  assert!(backend.calls().is_empty(), "unexpected calls: {:?}", backend.calls());
}

#[test]
fn combo_fires_once_per_entry() {
  let mut combos: KeyCombos<Fired> = KeyCombos::new()
    .with_combo(&[KeyCode::LEFT_ALT, KeyCode::ENTER], fire_toggle);
  let mut fired = Fired::default();
  let script = [
    (KeyCode::LEFT_ALT, true, false, 0),
    (KeyCode::ENTER, true, false, 1),
    (KeyCode::ENTER, true, true, 1),
    (KeyCode::ENTER, false, false, 1),
    (KeyCode::ENTER, true, false, 2),
    (KeyCode::ENTER, true, true, 2),
    (KeyCode::LEFT_ALT, true, true, 2),
    (KeyCode::A, false, false, 2),
    (KeyCode::A, true, false, 2),
    (KeyCode::A, false, false, 3),
  ];

  for &(key, pressed, repeat, toggles) in script.iter() {
    if let Some(action) = combos.feed(&KeyEvent { key, scancode: 0, pressed, repeat }) {
      action(&mut fired);
    }

    assert_eq!(fired.toggle, toggles, "after {:?} pressed={} repeat={}", key, pressed, repeat);
  }
}
