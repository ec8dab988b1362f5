//! Chromatic refraction with a crest tint
//!
//! Red, green and blue are fetched at slightly different multiples of the
//! displacement, the crest is pulled toward a tint color, and the result is
//! mixed back over the undistorted sample by an intensity derived from the
//! crest weight and the average displacement.

use glam::{Vec2, Vec4};

use super::{FrameContext, PackedRipples, SourceImage};
use crate::config::PrismaticStyle;

/// Weight of the crest envelope in the final mix
pub(crate) const CREST_MIX: f32 = 0.65;
/// Weight of the normalized average displacement in the final mix
pub(crate) const MOTION_MIX: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prismatic {
    style: PrismaticStyle,
}

impl Default for Prismatic {
    fn default() -> Self {
        Self::new(PrismaticStyle::default())
    }
}

impl Prismatic {
    pub fn new(style: PrismaticStyle) -> Self {
        Self {
            style: style.sanitized(),
        }
    }

    pub fn style(&self) -> &PrismaticStyle {
        &self.style
    }

    pub fn shade<S: SourceImage + ?Sized>(
        &self,
        pixel: Vec2,
        source: &S,
        ctx: &FrameContext,
        packed: &PackedRipples,
    ) -> Vec4 {
        let original = source.sample(pixel);
        if !ctx.is_active(packed) || !pixel.is_finite() {
            return original;
        }
        let field = ctx.field_at(pixel, packed);
        if field.count == 0 {
            return original;
        }

        let s = &self.style;
        // Every channel stays within the frame's sampling radius
        let limit = packed.max_sample_offset.max(0.0);
        let d = field.offset * s.refraction_strength;
        let red = source.sample(pixel + (d * (1.0 + s.dispersion)).clamp_length_max(limit));
        let green = source.sample(pixel + d.clamp_length_max(limit));
        let blue = source.sample(pixel + (d * (1.0 - s.dispersion)).clamp_length_max(limit));
        let refracted = Vec4::new(red.x, green.y, blue.z, green.w);

        let crest = field.peak_envelope;
        let tint = Vec4::new(s.tint[0], s.tint[1], s.tint[2], refracted.w);
        let tinted = refracted.lerp(tint, (crest * s.tint_strength * s.tint[3]).clamp(0.0, 1.0));

        let motion = field.average_magnitude() / ctx.wave.source_clamp();
        let intensity = (CREST_MIX * crest + MOTION_MIX * motion).clamp(0.0, 1.0);

        let out = original.lerp(tinted, intensity);
        if out.is_finite() { out } else { original }
    }
}
