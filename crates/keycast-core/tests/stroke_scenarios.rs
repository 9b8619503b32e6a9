use keycast_core::engine::{Engine, TileCompositor};
use keycast_core::events::{event_channel, KeyEvent};
use keycast_core::settings::Settings;
use keycast_core::stroke_renderer::{FrameSurface, Tile};
use keycast_core::types::{NamedKey, RawKey};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Cap(String);

impl Tile for Cap {
    fn width(&self) -> u32 {
        40
    }
    fn height(&self) -> u32 {
        40
    }
}

struct Caps;

impl TileCompositor for Caps {
    type Tile = Cap;

    fn compose(&mut self, label: &str) -> Cap {
        Cap(label.to_string())
    }
}

/// Rows of labels as drawn, newest first, with their opacity.
#[derive(Default)]
struct Screen {
    rows: Vec<(i32, Vec<String>, f32)>,
}

impl FrameSurface for Screen {
    type Tile = Cap;

    fn begin_frame(&mut self) {
        self.rows.clear();
    }

    fn draw_tile(&mut self, tile: &Cap, _x: i32, y: i32, opacity: f32) {
        match self.rows.last_mut() {
            Some((row_y, labels, _)) if *row_y == y => labels.push(tile.0.clone()),
            _ => self.rows.push((y, vec![tile.0.clone()], opacity)),
        }
    }

    fn present_frame(&mut self) {}
}

impl Screen {
    fn labels(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|(_, l, _)| l.clone()).collect()
    }
}

const CTRL: RawKey = RawKey::Named(NamedKey::ControlLeft);
const SHIFT: RawKey = RawKey::Named(NamedKey::ShiftLeft);

fn ch(c: char) -> RawKey {
    RawKey::from_char(c)
}

#[test]
fn copy_then_paste_without_modifier() {
    let t0 = Instant::now();
    let (sink, rx) = event_channel(32);
    let mut engine = Engine::new(&Settings::default(), Caps);

    // CTRL down, C down, C up, CTRL up, V down.
    sink.send(KeyEvent::down(CTRL, t0));
    sink.send(KeyEvent::down(ch('c'), t0 + Duration::from_millis(20)));
    sink.send(KeyEvent::up(ch('c'), t0 + Duration::from_millis(60)));
    sink.send(KeyEvent::up(CTRL, t0 + Duration::from_millis(80)));
    sink.send(KeyEvent::down(ch('v'), t0 + Duration::from_millis(120)));

    let mut screen = Screen::default();
    engine.frame(&rx, t0 + Duration::from_millis(130), &mut screen);

    let created: Vec<Vec<String>> = engine
        .strokes()
        .iter()
        .map(|s| s.tiles().iter().map(|t| t.0.clone()).collect())
        .collect();
    assert_eq!(created, vec![vec!["CTRL", "C"], vec!["V"]]);
    assert_eq!(screen.labels(), vec![vec!["V"], vec!["CTRL", "C"]]);
}

#[test]
fn held_key_auto_repeat_shows_once() {
    let t0 = Instant::now();
    let (sink, rx) = event_channel(64);
    let mut engine = Engine::new(&Settings::default(), Caps);

    for i in 0..20 {
        sink.send(KeyEvent::down(ch('j'), t0 + Duration::from_millis(30 * i)));
    }
    sink.send(KeyEvent::up(ch('j'), t0 + Duration::from_millis(700)));

    let mut screen = Screen::default();
    engine.frame(&rx, t0 + Duration::from_millis(710), &mut screen);
    assert_eq!(engine.strokes().len(), 1);
    assert_eq!(screen.labels(), vec![vec!["J"]]);
}

#[test]
fn burst_beyond_capacity_keeps_newest() {
    let t0 = Instant::now();
    let settings = Settings::default();
    let (sink, rx) = event_channel(64);
    let mut engine = Engine::new(&settings, Caps);

    for c in ['a', 'b', 'c', 'd'] {
        sink.send(KeyEvent::down(ch(c), t0));
        sink.send(KeyEvent::up(ch(c), t0));
    }

    let mut screen = Screen::default();
    engine.frame(&rx, t0, &mut screen);
    assert_eq!(engine.strokes().len(), settings.max_strokes);
    assert_eq!(screen.labels(), vec![vec!["D"], vec!["C"], vec!["B"]]);
}

#[test]
fn stroke_fades_then_disappears() {
    let t0 = Instant::now();
    let settings = Settings::default();
    let (_sink, rx) = event_channel(4);
    let mut engine = Engine::new(&settings, Caps);
    engine.on_press(SHIFT, t0);
    engine.on_press(ch('1'), t0);

    let mut screen = Screen::default();
    let mut previous = f32::MAX;
    for ms in (0..1500).step_by(25) {
        engine.frame(&rx, t0 + Duration::from_millis(ms), &mut screen);
        assert_eq!(screen.labels(), vec![vec!["SHIFT", "1"]], "at {ms}ms");
        let opacity = screen.rows[0].2;
        if ms < 1000 {
            assert_eq!(opacity, 1.0);
        }
        assert!(opacity <= previous);
        previous = opacity;
    }

    engine.frame(&rx, t0 + settings.visible_time(), &mut screen);
    assert!(screen.rows.is_empty());
    assert!(engine.strokes().is_empty());
}

#[test]
fn modifier_held_across_keys_fires_once() {
    let t0 = Instant::now();
    let mut engine = Engine::new(&Settings::default(), Caps);
    engine.on_press(CTRL, t0);
    let first = engine.on_press(ch('a'), t0).map(|c| c.to_string());
    engine.on_release(ch('a'));
    let second = engine.on_press(ch('b'), t0).map(|c| c.to_string());

    assert_eq!(first.as_deref(), Some("CTRL+A"));
    assert_eq!(second.as_deref(), Some("B"));
}

#[test]
fn draining_every_wakeup_keeps_releases_in_a_small_queue() {
    let t0 = Instant::now();
    let (sink, rx) = event_channel(1);
    let settings = Settings {
        max_strokes: 8,
        ..Settings::default()
    };
    let mut engine = Engine::new(&settings, Caps);
    let a = ch('a');

    // Each edge is applied before the next arrives, as the event loop does
    // between redraws.
    let mut shown = 0;
    for i in 0..4u64 {
        let t = t0 + Duration::from_millis(i * 50);
        assert!(sink.send(KeyEvent::down(a, t)));
        engine.drain_events(&rx);
        assert!(sink.send(KeyEvent::up(a, t + Duration::from_millis(10))));
        engine.drain_events(&rx);
        shown = engine.strokes().len();
    }
    assert_eq!(shown, 4);
    assert!(!engine.assembler().is_held(a));
}

#[test]
fn lost_release_swallows_the_next_press() {
    let t0 = Instant::now();
    let (sink, rx) = event_channel(1);
    let mut engine = Engine::new(&Settings::default(), Caps);
    let a = ch('a');

    assert!(sink.send(KeyEvent::down(a, t0)));
    assert!(!sink.send(KeyEvent::up(a, t0)));
    engine.drain_events(&rx);

    assert!(engine.assembler().is_held(a));
    assert!(engine.on_press(a, t0 + Duration::from_millis(100)).is_none());
}
