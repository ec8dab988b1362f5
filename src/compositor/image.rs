//! CPU fallback: float RGBA images and a full-frame evaluation loop

use glam::{Vec2, Vec4};

use super::{Compositor, FrameContext, PackedRipples, SourceImage};

/// Row-major RGBA image with components in 0..1
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl RgbaImage {
    /// Image filled with a single color
    pub fn new(width: u32, height: u32, fill: [f32; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; (width as usize) * (height as usize)],
        }
    }

    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> [f32; 4],
    {
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    /// Two-tone checkerboard with square cells of `cell` pixels
    pub fn checkerboard(width: u32, height: u32, cell: u32, a: [f32; 4], b: [f32; 4]) -> Self {
        let cell = cell.max(1);
        Self::from_fn(width, height, |x, y| if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size as a float vector, for [`FrameContext`]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Vec4> {
        if x < self.width && y < self.height {
            Some(Vec4::from_array(self.pixels[self.index(x, y)]))
        } else {
            None
        }
    }

    pub fn set(&mut self, x: u32, y: u32, color: Vec4) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.pixels[i] = color.to_array();
        }
    }

    /// Mean absolute per-channel difference, or `None` if sizes differ
    pub fn mean_abs_difference(&self, other: &RgbaImage) -> Option<f32> {
        if self.width != other.width || self.height != other.height {
            return None;
        }
        if self.pixels.is_empty() {
            return Some(0.0);
        }
        let total: f32 = self
            .pixels
            .iter()
            .zip(&other.pixels)
            .map(|(a, b)| (Vec4::from_array(*a) - Vec4::from_array(*b)).abs().element_sum())
            .sum();
        Some(total / (self.pixels.len() as f32 * 4.0))
    }

    /// Quantize to 8-bit RGBA
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }

    #[inline]
    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        Vec4::from_array(self.pixels[self.index(x, y)])
    }
}

impl SourceImage for RgbaImage {
    /// Bilinear, clamp-to-edge
    fn sample(&self, pos: Vec2) -> Vec4 {
        if self.pixels.is_empty() || !pos.is_finite() {
            return Vec4::ZERO;
        }
        // Anything past the border resolves to the edge texel anyway
        let p = (pos - Vec2::splat(0.5)).clamp(Vec2::splat(-1.0), self.size());
        let base = p.floor();
        let t = p - base;
        let (x0, y0) = (base.x as i64, base.y as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), t.x);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), t.x);
        top.lerp(bottom, t.y)
    }
}

/// Evaluate `compositor` for every pixel of `source`
///
/// With nothing to composite the source is returned unchanged and no
/// per-pixel work is done.
pub fn render_cpu(
    compositor: &Compositor,
    ctx: &FrameContext,
    source: &RgbaImage,
    packed: &PackedRipples,
) -> RgbaImage {
    if !ctx.is_active(packed) {
        return source.clone();
    }
    let mut out = RgbaImage::new(source.width, source.height, [0.0; 4]);
    for y in 0..source.height {
        for x in 0..source.width {
            let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let color = compositor.shade(pixel, source, ctx, packed);
            out.set(x, y, color);
        }
    }
    out
}
