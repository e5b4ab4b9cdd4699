use anyhow::{Context, Result};

/// Minimal 2D drawing surface, in the shape of a browser canvas context.
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn clear(&mut self);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 4]);
    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: [u8; 4]);
}

/// HSL color with hue in degrees and saturation/lightness in 0..=1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    pub fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        let h = self.hue.rem_euclid(360.0) / 60.0;
        let c = (1.0 - (2.0 * self.lightness - 1.0).abs()) * self.saturation;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = self.lightness - c / 2.0;

        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let to_byte = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        [to_byte(r), to_byte(g), to_byte(b), 255]
    }
}

/// Opaque RGBA pixel buffer, row-major, 4 bytes per pixel.
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// Largest accepted side length, in pixels.
pub const MAX_DIMENSION: u32 = 16384;

/// Bytes in one RGBA frame, or `None` when the size is empty or too large.
pub fn frame_len(width: u32, height: u32) -> Option<usize> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return None;
    }
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(4)
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut canvas = Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        };
        canvas.resize(width, height)?;
        Ok(canvas)
    }

    /// Change the surface size. Previous contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let len = frame_len(width, height).with_context(|| {
            format!(
                "Canvas size {}x{} must be between 1x1 and {}x{}",
                width, height, MAX_DIMENSION, MAX_DIMENSION
            )
        })?;
        self.width = width;
        self.height = height;
        self.pixels = vec![0; len];
        self.clear();
        Ok(())
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[allow(dead_code)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.offset(x, y);
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(out)
    }

    fn put(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = self.offset(x as u32, y as u32);
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }
}

impl Canvas for PixelCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&BACKGROUND);
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 4]) {
        // Edges snap to the nearest pixel boundary so neighbouring rects tile.
        let x0 = x.round().max(0.0) as u32;
        let y0 = y.round().max(0.0) as u32;
        let x1 = ((x + width).round().max(0.0) as u32).min(self.width);
        let y1 = ((y + height).round().max(0.0) as u32).min(self.height);

        for py in y0..y1 {
            for px in x0..x1 {
                let idx = self.offset(px, py);
                self.pixels[idx..idx + 4].copy_from_slice(&color);
            }
        }
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: [u8; 4]) {
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i64;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (from.0 + dx * t).floor() as i64;
            let y = (from.1 + dy * t).floor() as i64;
            self.put(x, y, color);
        }
    }
}
