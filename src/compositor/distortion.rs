//! Plain displacement: move the sample point, leave colors alone

use glam::{Vec2, Vec4};

use super::{FrameContext, PackedRipples, SourceImage};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Distortion;

impl Distortion {
    /// Where `pixel` should sample the source from
    pub fn sample_position(&self, pixel: Vec2, ctx: &FrameContext, packed: &PackedRipples) -> Vec2 {
        if !ctx.is_active(packed) || !pixel.is_finite() {
            return pixel;
        }
        let offset = ctx
            .field_at(pixel, packed)
            .offset
            .clamp_length_max(packed.max_sample_offset.max(0.0));
        pixel + offset
    }

    pub fn shade<S: SourceImage + ?Sized>(
        &self,
        pixel: Vec2,
        source: &S,
        ctx: &FrameContext,
        packed: &PackedRipples,
    ) -> Vec4 {
        source.sample(self.sample_position(pixel, ctx, packed))
    }
}
