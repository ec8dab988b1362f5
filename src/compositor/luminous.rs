//! Additive glow along moving crests

use glam::{Vec2, Vec3, Vec4};

use super::{FrameContext, PackedRipples, SourceImage};
use crate::config::LuminousStyle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Luminous {
    style: LuminousStyle,
}

impl Default for Luminous {
    fn default() -> Self {
        Self::new(LuminousStyle::default())
    }
}

impl Luminous {
    pub fn new(style: LuminousStyle) -> Self {
        Self {
            style: style.sanitized(),
        }
    }

    pub fn style(&self) -> &LuminousStyle {
        &self.style
    }

    /// Glow + halo gain at `pixel` (0 when nothing is animating)
    pub fn intensity(&self, pixel: Vec2, ctx: &FrameContext, packed: &PackedRipples) -> f32 {
        if !ctx.is_active(packed) || !pixel.is_finite() {
            return 0.0;
        }
        let field = ctx.field_at(pixel, packed);
        if field.count == 0 {
            return 0.0;
        }
        let energy = field.energy / (ctx.wave.wavelength * field.count as f32);
        let glow = self.style.glow_strength * energy;
        let halo = field.peak_envelope.powf(self.style.highlight_power) * self.style.highlight_boost;
        let gain = glow + halo;
        if gain.is_finite() { gain.max(0.0) } else { 0.0 }
    }

    pub fn shade<S: SourceImage + ?Sized>(
        &self,
        pixel: Vec2,
        source: &S,
        ctx: &FrameContext,
        packed: &PackedRipples,
    ) -> Vec4 {
        let base = source.sample(pixel);
        let gain = self.intensity(pixel, ctx, packed);
        if gain == 0.0 {
            return base;
        }
        let [r, g, b, a] = self.style.glow_color;
        let glow = Vec3::new(r, g, b) * a * gain;
        (base.truncate() + glow).clamp(Vec3::ZERO, Vec3::ONE).extend(base.w)
    }
}
