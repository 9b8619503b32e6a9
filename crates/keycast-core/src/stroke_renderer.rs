use crate::stroke_queue::StrokeQueue;
use std::time::{Duration, Instant};

/// Anything with a pixel size that the renderer can stack.
pub trait Tile {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// Drawing target for one frame.
pub trait FrameSurface {
    type Tile: Tile;

    /// Clears the frame to the background.
    fn begin_frame(&mut self);
    /// Draws `tile` with its top-left corner at `(x, y)`.
    fn draw_tile(&mut self, tile: &Self::Tile, x: i32, y: i32, opacity: f32);
    fn present_frame(&mut self);
}

/// Opacity for a stroke of the given age.
///
/// Fully opaque until `visible - fade`, then a linear ramp to zero at
/// `visible`. Anything at or past `visible` is 0.
pub fn opacity(elapsed: Duration, visible: Duration, fade: Duration) -> f32 {
    if elapsed >= visible {
        return 0.0;
    }
    let fade_start = visible.saturating_sub(fade);
    if elapsed < fade_start {
        return 1.0;
    }
    let progress = (elapsed - fade_start).as_secs_f32() / fade.as_secs_f32();
    (1.0 - progress).clamp(0.0, 1.0)
}

/// Screen placement of one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement<'a, T> {
    pub tile: &'a T,
    pub x: i32,
    pub y: i32,
    pub opacity: f32,
}

/// Bottom-up stacking layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeRenderer {
    pub surface_height: i32,
    pub margin: i32,
    pub horizontal_spacing: i32,
    pub vertical_spacing: i32,
    pub fade_time: Duration,
}

impl StrokeRenderer {
    /// Positions and opacities for every visible tile, newest stroke at the
    /// bottom. Does not touch the queue.
    pub fn plan<'a, T: Tile>(&self, queue: &'a StrokeQueue<T>, now: Instant) -> Vec<Placement<'a, T>> {
        let visible = queue.visible_time();
        let mut placements = Vec::new();
        let mut cursor = self.surface_height - self.margin;

        for stroke in queue.newest_first() {
            let elapsed = stroke.age(now);
            if elapsed >= visible {
                continue;
            }
            let alpha = opacity(elapsed, visible, self.fade_time);

            let mut x = self.margin;
            let mut row_height = 0u32;
            for tile in stroke.tiles() {
                placements.push(Placement {
                    tile,
                    x,
                    y: cursor - tile.height() as i32,
                    opacity: alpha,
                });
                x += tile.width() as i32 + self.horizontal_spacing;
                row_height = row_height.max(tile.height());
            }

            cursor -= row_height as i32 + self.vertical_spacing;
        }

        placements
    }

    /// Prunes expired strokes, then draws and presents one frame.
    pub fn render<S: FrameSurface>(
        &self,
        queue: &mut StrokeQueue<S::Tile>,
        now: Instant,
        surface: &mut S,
    ) {
        queue.prune(now);

        surface.begin_frame();
        for p in self.plan(queue, now) {
            surface.draw_tile(p.tile, p.x, p.y, p.opacity);
        }
        surface.present_frame();
    }
}
