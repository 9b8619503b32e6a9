use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

/// One displayed chord: a tile per label plus the moment it was formed.
#[derive(Debug, Clone)]
pub struct Stroke<T> {
    tiles: Vec<T>,
    created_at: Instant,
}

impl<T> Stroke<T> {
    pub fn new(tiles: Vec<T>, created_at: Instant) -> Self {
        Self { tiles, created_at }
    }

    pub fn tiles(&self) -> &[T] {
        &self.tiles
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time since creation, zero if `now` is earlier.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }
}

/// Bounded, creation-ordered stroke list (oldest at the front).
#[derive(Debug)]
pub struct StrokeQueue<T> {
    strokes: VecDeque<Stroke<T>>,
    max_strokes: usize,
    visible_time: Duration,
}

impl<T> StrokeQueue<T> {
    pub fn new(max_strokes: usize, visible_time: Duration) -> Self {
        Self {
            strokes: VecDeque::with_capacity(max_strokes + 1),
            max_strokes,
            visible_time,
        }
    }

    /// Appends a stroke, evicting the oldest one when over capacity.
    pub fn insert(&mut self, tiles: Vec<T>, now: Instant) {
        self.strokes.push_back(Stroke::new(tiles, now));
        while self.strokes.len() > self.max_strokes {
            if self.strokes.pop_front().is_some() {
                debug!("Stroke evicted (capacity {})", self.max_strokes);
            }
        }
    }

    /// Drops every stroke whose age reached the visible time. Returns how many
    /// were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.strokes.len();
        let visible_time = self.visible_time;
        self.strokes.retain(|s| s.age(now) < visible_time);
        before - self.strokes.len()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Stroke<T>> + '_ {
        self.strokes.iter()
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &Stroke<T>> + '_ {
        self.strokes.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn visible_time(&self) -> Duration {
        self.visible_time
    }
}
