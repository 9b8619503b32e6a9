use crate::chord_assembler::ChordAssembler;
use crate::events::{KeyEdge, KeyEvent};
use crate::settings::Settings;
use crate::stroke_queue::StrokeQueue;
use crate::stroke_renderer::{FrameSurface, StrokeRenderer, Tile};
use crate::types::{Chord, RawKey};
use crossbeam_channel::Receiver;
use std::time::Instant;
use tracing::debug;

/// Produces the tile for one label. Must not fail once constructed: a label it
/// cannot draw still gets a placeholder tile.
pub trait TileCompositor {
    type Tile: Tile;

    fn compose(&mut self, label: &str) -> Self::Tile;
}

/// Keystroke pipeline state owned by the render loop.
pub struct Engine<C: TileCompositor> {
    assembler: ChordAssembler,
    queue: StrokeQueue<C::Tile>,
    renderer: StrokeRenderer,
    compositor: C,
}

impl<C: TileCompositor> Engine<C> {
    pub fn new(settings: &Settings, compositor: C) -> Self {
        Self {
            assembler: ChordAssembler::new(),
            queue: StrokeQueue::new(settings.max_strokes, settings.visible_time()),
            renderer: settings.renderer(),
            compositor,
        }
    }

    /// Feeds a press. When it completes a chord, the chord becomes a stroke
    /// created at `t` and is returned.
    pub fn on_press(&mut self, key: RawKey, t: Instant) -> Option<Chord> {
        let chord = self.assembler.on_press(key)?;
        debug!("Chord: {}", chord);

        let tiles = chord
            .labels()
            .iter()
            .map(|label| self.compositor.compose(label))
            .collect();
        self.queue.prune(t);
        self.queue.insert(tiles, t);
        Some(chord)
    }

    pub fn on_release(&mut self, key: RawKey) {
        self.assembler.on_release(key);
    }

    pub fn handle_event(&mut self, event: KeyEvent) -> Option<Chord> {
        match event.edge {
            KeyEdge::Down => self.on_press(event.key, event.t),
            KeyEdge::Up => {
                self.on_release(event.key);
                None
            }
        }
    }

    /// Applies every queued event. Returns how many were handled.
    pub fn drain_events(&mut self, rx: &Receiver<KeyEvent>) -> usize {
        let mut handled = 0;
        for event in rx.try_iter() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn prune(&mut self, now: Instant) -> usize {
        self.queue.prune(now)
    }

    pub fn render<S>(&mut self, now: Instant, surface: &mut S)
    where
        S: FrameSurface<Tile = C::Tile>,
    {
        self.renderer.render(&mut self.queue, now, surface);
    }

    /// One frame: expire old strokes, apply pending input, draw.
    pub fn frame<S>(&mut self, rx: &Receiver<KeyEvent>, now: Instant, surface: &mut S)
    where
        S: FrameSurface<Tile = C::Tile>,
    {
        self.prune(now);
        self.drain_events(rx);
        self.render(now, surface);
    }

    /// Strokes stay anchored to the bottom edge after the window resizes.
    pub fn set_surface_height(&mut self, height: i32) {
        self.renderer.surface_height = height;
    }

    pub fn strokes(&self) -> &StrokeQueue<C::Tile> {
        &self.queue
    }

    pub fn assembler(&self) -> &ChordAssembler {
        &self.assembler
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }
}
