use crate::keycap::KeycapTile;
use image::RgbaImage;
use keycast_core::FrameSurface;
use softbuffer::{Context, Surface};
use std::num::NonZeroU32;
use std::rc::Rc;
use tracing::warn;
use winit::window::Window;

/// CPU framebuffer in softbuffer's `0x00RRGGBB` layout.
pub struct Canvas {
    width: u32,
    height: u32,
    background: u32,
    pixels: Vec<u32>,
}

pub fn pack_rgb(rgb: [u8; 3]) -> u32 {
    (u32::from(rgb[0]) << 16) | (u32::from(rgb[1]) << 8) | u32::from(rgb[2])
}

fn unpack_rgb(px: u32) -> [u8; 3] {
    [(px >> 16) as u8, (px >> 8) as u8, px as u8]
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: [u8; 3]) -> Self {
        let background = pack_rgb(background);
        Self {
            width,
            height,
            background,
            pixels: vec![background; (width * height) as usize],
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![self.background; (width * height) as usize];
    }

    pub fn clear(&mut self) {
        self.pixels.fill(self.background);
    }

    /// Blends `img` with its top-left at (x, y), every pixel's alpha scaled
    /// by `opacity`. Parts outside the canvas are clipped.
    pub fn draw_rgba(&mut self, img: &RgbaImage, x: i32, y: i32, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + img.width() as i32).min(self.width as i32);
        let y1 = (y + img.height() as i32).min(self.height as i32);

        for dy in y0..y1 {
            for dx in x0..x1 {
                let src = img.get_pixel((dx - x) as u32, (dy - y) as u32);
                let alpha = f32::from(src[3]) / 255.0 * opacity;
                if alpha <= 0.0 {
                    continue;
                }
                let idx = (dy as u32 * self.width + dx as u32) as usize;
                let dst = unpack_rgb(self.pixels[idx]);
                let mut out = [0u8; 3];
                for i in 0..3 {
                    let mixed = f32::from(src[i]) * alpha + f32::from(dst[i]) * (1.0 - alpha);
                    out[i] = mixed.round() as u8;
                }
                self.pixels[idx] = pack_rgb(out);
            }
        }
    }
}

/// Draws frames into a [`Canvas`] and pushes them to the window.
pub struct Presenter {
    canvas: Canvas,
    surface: Surface<Rc<Window>, Rc<Window>>,
}

impl Presenter {
    pub fn new(window: Rc<Window>, background: [u8; 3]) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let context = Context::new(window.clone())
            .map_err(|e| anyhow::anyhow!("failed to create drawing context: {e}"))?;
        let surface = Surface::new(&context, window)
            .map_err(|e| anyhow::anyhow!("failed to create drawing surface: {e}"))?;

        let mut presenter = Self {
            canvas: Canvas::new(size.width, size.height, background),
            surface,
        };
        presenter.resize(size.width, size.height);
        Ok(presenter)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            return;
        };
        if let Err(e) = self.surface.resize(w, h) {
            warn!("Failed to resize surface: {}", e);
            return;
        }
        self.canvas.resize(width, height);
    }
}

impl FrameSurface for Presenter {
    type Tile = KeycapTile;

    fn begin_frame(&mut self) {
        self.canvas.clear();
    }

    fn draw_tile(&mut self, tile: &KeycapTile, x: i32, y: i32, opacity: f32) {
        self.canvas.draw_rgba(tile.image(), x, y, opacity);
    }

    fn present_frame(&mut self) {
        let mut buffer = match self.surface.buffer_mut() {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("Failed to acquire frame buffer: {}", e);
                return;
            }
        };
        let n = buffer.len().min(self.canvas.pixels().len());
        buffer[..n].copy_from_slice(&self.canvas.pixels()[..n]);
        if let Err(e) = buffer.present() {
            warn!("Failed to present frame: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    impl Canvas {
        fn pixel(&self, x: u32, y: u32) -> u32 {
            self.pixels[(y * self.width + x) as usize]
        }
    }

    #[test]
    fn clear_restores_background() {
        let mut canvas = Canvas::new(4, 4, [0, 255, 0]);
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        canvas.draw_rgba(&img, 0, 0, 1.0);
        assert_eq!(canvas.pixel(1, 1), 0xFF0000);
        canvas.clear();
        assert!(canvas.pixels().iter().all(|&p| p == 0x00FF00));
    }

    #[test]
    fn opacity_scales_blend() {
        let mut canvas = Canvas::new(2, 1, [0, 0, 0]);
        let img = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 255]));
        canvas.draw_rgba(&img, 0, 0, 0.5);
        assert_eq!(canvas.pixel(0, 0), pack_rgb([100, 50, 25]));
        assert_eq!(canvas.pixel(1, 0), 0);
    }

    #[test]
    fn transparent_pixels_leave_background() {
        let mut canvas = Canvas::new(2, 2, [10, 20, 30]);
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 0]));
        canvas.draw_rgba(&img, 0, 0, 1.0);
        assert!(canvas.pixels().iter().all(|&p| p == pack_rgb([10, 20, 30])));
    }

    #[test]
    fn tiles_are_clipped_at_edges() {
        let mut canvas = Canvas::new(4, 4, [0, 0, 0]);
        let img = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));
        canvas.draw_rgba(&img, -2, 3, 1.0);
        assert_eq!(canvas.pixel(0, 3), 0xFFFFFF);
        assert_eq!(canvas.pixel(1, 3), 0);
        assert_eq!(canvas.pixel(0, 2), 0);
    }

    #[test]
    fn zero_opacity_draws_nothing() {
        let mut canvas = Canvas::new(1, 1, [1, 2, 3]);
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        canvas.draw_rgba(&img, 0, 0, 0.0);
        assert_eq!(canvas.pixel(0, 0), pack_rgb([1, 2, 3]));
    }
}
