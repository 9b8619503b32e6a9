use anyhow::{anyhow, Context, Result};
use font_kit::family_name::FamilyName;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use keycast_core::{Settings, Tile, TileCompositor};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Rendered keycap with its label. Cheap to clone.
#[derive(Debug, Clone)]
pub struct KeycapTile(Arc<RgbaImage>);

impl KeycapTile {
    pub fn image(&self) -> &RgbaImage {
        &self.0
    }
}

impl Tile for KeycapTile {
    fn width(&self) -> u32 {
        self.0.width()
    }

    fn height(&self) -> u32 {
        self.0.height()
    }
}

/// 8-bit alpha mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Coverage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    fn get(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.data[y as usize * self.width + x as usize] as f32 / 255.0
    }

    /// Bilinear sample at a fractional position.
    fn sample(&self, x: f32, y: f32) -> f32 {
        let x = x - 0.5;
        let y = y - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);
        let top = self.get(x0, y0) * (1.0 - fx) + self.get(x0 + 1, y0) * fx;
        let bottom = self.get(x0, y0 + 1) * (1.0 - fx) + self.get(x0 + 1, y0 + 1) * fx;
        top * (1.0 - fy) + bottom * fy
    }

    fn max_into(&mut self, x: i64, y: i64, value: u8) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        self.data[idx] = self.data[idx].max(value);
    }
}

pub struct KeycapCompositor {
    base: RgbaImage,
    font: fontdue::Font,
    font_size: f32,
    text_color: [u8; 3],
    angle_deg: f32,
    offset_y: i32,
    cache: HashMap<String, KeycapTile>,
}

impl KeycapCompositor {
    /// Loads the keycap image and font. Any failure here is fatal for startup.
    pub fn new(settings: &Settings) -> Result<Self> {
        let (box_w, box_h) = settings.tile_box();
        let base = match &settings.keycap_image {
            Some(path) => load_keycap(path, box_w, box_h)?,
            None => draw_keycap(box_w, (box_h as f32 * 0.6).round().max(1.0) as u32),
        };
        let font = load_font(settings.font_path.as_deref())?;
        info!("Keycap tiles are {}x{}", base.width(), base.height());

        Ok(Self {
            base,
            font,
            font_size: settings.font_size,
            text_color: settings.text_color,
            angle_deg: settings.label_angle_deg,
            offset_y: settings.label_offset_y,
            cache: HashMap::new(),
        })
    }

    fn render_label(&self, label: &str) -> RgbaImage {
        let mut tile = self.base.clone();
        let max_width = tile.width() as f32 * 0.8;
        let max_height = tile.height() as f32 * 0.6;

        let natural = self.text_width(label, self.font_size);
        let size = fit_font_size(self.font_size, natural, max_width).min(max_height);
        let text = self.rasterize(label, size);

        let center = (
            tile.width() as f32 / 2.0,
            tile.height() as f32 / 2.0 + self.offset_y as f32,
        );
        stamp(&mut tile, &text, self.text_color, center, self.angle_deg);
        tile
    }

    fn has_glyph(&self, c: char) -> bool {
        self.font.lookup_glyph_index(c) != 0
    }

    /// Pen advance for `c`; a missing glyph takes the placeholder's width.
    fn advance(&self, c: char, size: f32) -> f32 {
        let advance = self.font.metrics(c, size).advance_width;
        if self.has_glyph(c) {
            advance
        } else {
            advance.max(size * 0.5).round()
        }
    }

    fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.advance(c, size)).sum()
    }

    fn rasterize(&self, text: &str, size: f32) -> Coverage {
        let (ascent, descent) = match self.font.horizontal_line_metrics(size) {
            Some(m) => (m.ascent, m.descent),
            None => (size * 0.8, -size * 0.2),
        };
        let width = self.text_width(text, size).ceil().max(1.0) as usize + 2;
        let height = (ascent - descent).ceil().max(1.0) as usize;
        let baseline = ascent.round() as i64;
        let mut cov = Coverage::new(width, height);

        let mut pen = 1.0f32;
        for c in text.chars() {
            if !self.has_glyph(c) {
                // Missing glyph: hollow box instead of nothing.
                let w = self.advance(c, size);
                draw_placeholder(&mut cov, pen.round() as i64, baseline, w as i64, (size * 0.7) as i64);
                pen += w;
                continue;
            }
            let (metrics, bitmap) = self.font.rasterize(c, size);
            let gx = pen.round() as i64 + metrics.xmin as i64;
            let gy = baseline - metrics.height as i64 - metrics.ymin as i64;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let v = bitmap[row * metrics.width + col];
                    cov.max_into(gx + col as i64, gy + row as i64, v);
                }
            }
            pen += metrics.advance_width;
        }
        cov
    }
}

impl TileCompositor for KeycapCompositor {
    type Tile = KeycapTile;

    fn compose(&mut self, label: &str) -> KeycapTile {
        if let Some(tile) = self.cache.get(label) {
            return tile.clone();
        }
        debug!("Rendering keycap for {}", label);
        let tile = KeycapTile(Arc::new(self.render_label(label)));
        self.cache.insert(label.to_string(), tile.clone());
        tile
    }
}

fn load_keycap(path: &Path, box_w: u32, box_h: u32) -> Result<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to load keycap image {}", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(anyhow!("keycap image {} is empty", path.display()));
    }
    let scale = (box_w as f32 / w as f32).min(box_h as f32 / h as f32);
    let new_w = ((w as f32 * scale) as u32).max(1);
    let new_h = ((h as f32 * scale) as u32).max(1);
    Ok(image::imageops::resize(&img, new_w, new_h, FilterType::Triangle))
}

fn load_font(path: Option<&Path>) -> Result<fontdue::Font> {
    let bytes = match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read font {}", path.display()))?,
        None => {
            let handle = SystemSource::new()
                .select_best_match(&[FamilyName::SansSerif], &Properties::new())
                .context("no sans-serif system font found, set `font_path`")?;
            let font = handle.load().context("failed to load system font")?;
            info!("Using system font {}", font.full_name());
            font.copy_font_data()
                .ok_or_else(|| anyhow!("system font data is not accessible, set `font_path`"))?
                .to_vec()
        }
    };
    fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
        .map_err(|e| anyhow!("failed to parse font: {e}"))
}

/// Shrinks `size` so text of `natural_width` (measured at `size`) fits
/// `max_width`.
pub fn fit_font_size(size: f32, natural_width: f32, max_width: f32) -> f32 {
    if natural_width <= max_width || natural_width <= 0.0 {
        size
    } else {
        size * max_width / natural_width
    }
}

fn draw_placeholder(cov: &mut Coverage, x: i64, baseline: i64, w: i64, h: i64) {
    let (x0, x1) = (x + 1, x + w - 2);
    let (y0, y1) = (baseline - h, baseline - 1);
    for px in x0..=x1 {
        cov.max_into(px, y0, 255);
        cov.max_into(px, y1, 255);
    }
    for py in y0..=y1 {
        cov.max_into(x0, py, 255);
        cov.max_into(x1, py, 255);
    }
}

/// Blends `text` in `color` onto `dst`, centered on `center` and rotated
/// counter-clockwise by `angle_deg`.
pub fn stamp(dst: &mut RgbaImage, text: &Coverage, color: [u8; 3], center: (f32, f32), angle_deg: f32) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let half_w = text.width as f32 / 2.0;
    let half_h = text.height as f32 / 2.0;

    for (x, y, px) in dst.enumerate_pixels_mut() {
        let rx = x as f32 + 0.5 - center.0;
        let ry = y as f32 + 0.5 - center.1;
        // Screen y points down, so counter-clockwise uses the mirrored sign.
        let sx = rx * cos - ry * sin + half_w;
        let sy = rx * sin + ry * cos + half_h;
        if sx < -1.0 || sy < -1.0 || sx > text.width as f32 + 1.0 || sy > text.height as f32 + 1.0 {
            continue;
        }
        let alpha = text.sample(sx, sy);
        if alpha > 0.0 {
            blend(px, color, alpha);
        }
    }
}

/// Straight-alpha "over".
fn blend(px: &mut Rgba<u8>, color: [u8; 3], alpha: f32) {
    let dst_a = px[3] as f32 / 255.0;
    let out_a = alpha + dst_a * (1.0 - alpha);
    if out_a <= 0.0 {
        return;
    }
    for i in 0..3 {
        let src = color[i] as f32;
        let dst = px[i] as f32;
        px[i] = ((src * alpha + dst * dst_a * (1.0 - alpha)) / out_a).round() as u8;
    }
    px[3] = (out_a * 255.0).round() as u8;
}

/// Signed distance from `(x, y)` to a rounded rectangle, negative inside.
fn rounded_rect_distance(x: f32, y: f32, rect: (f32, f32, f32, f32), radius: f32) -> f32 {
    let (x0, y0, x1, y1) = rect;
    let cx = (x0 + x1) / 2.0;
    let cy = (y0 + y1) / 2.0;
    let hx = (x1 - x0) / 2.0 - radius;
    let hy = (y1 - y0) / 2.0 - radius;
    let qx = (x - cx).abs() - hx;
    let qy = (y - cy).abs() - hy;
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    outside + qx.max(qy).min(0.0) - radius
}

fn fill_rounded_rect(img: &mut RgbaImage, rect: (f32, f32, f32, f32), radius: f32, color: [u8; 3]) {
    for (x, y, px) in img.enumerate_pixels_mut() {
        let d = rounded_rect_distance(x as f32 + 0.5, y as f32 + 0.5, rect, radius);
        let coverage = (0.5 - d).clamp(0.0, 1.0);
        if coverage > 0.0 {
            blend(px, color, coverage);
        }
    }
}

/// Plain keycap: dark rim, lighter top face offset upwards.
pub fn draw_keycap(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    let (w, h) = (width as f32, height as f32);
    let radius = (w.min(h) / 6.0).max(1.0);

    fill_rounded_rect(&mut img, (0.0, 0.0, w, h), radius, [60, 60, 60]);
    fill_rounded_rect(&mut img, (2.0, 2.0, w - 2.0, h - 2.0), radius - 1.0, [205, 205, 205]);
    let face = (w * 0.08, h * 0.06, w * 0.92, h * 0.82);
    fill_rounded_rect(&mut img, face, (radius * 0.8).max(1.0), [245, 245, 245]);
    img
}
