//! Snapshot packing shared by every compositor
//!
//! Ripple states become a flat array of 16-byte records that the CPU
//! compositors iterate and the GPU kernel reads as `vec4<f32>`.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::config::RippleParameters;
use crate::consts::*;
use crate::sim::RippleState;

/// One packed ripple (must match the shader's `vec4<f32>` layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RippleData {
    pub center: [f32; 2],
    pub age: f32,
    pub amplitude: f32,
}

impl RippleData {
    pub fn from_state(state: &RippleState) -> Self {
        Self {
            center: [state.center.x, state.center.y],
            age: state.age,
            amplitude: state.amplitude,
        }
    }

    /// `(center, age, amplitude)` as consumed by [`crate::sim::WaveField::sample_field`]
    #[inline]
    pub fn unpack(&self) -> (Vec2, f32, f32) {
        (Vec2::from_array(self.center), self.age, self.amplitude)
    }

    #[inline]
    fn is_finite(&self) -> bool {
        self.center[0].is_finite() && self.center[1].is_finite() && self.age.is_finite() && self.amplitude.is_finite()
    }
}

/// Per-frame ripple buffer plus the sampling radius derived from it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackedRipples {
    pub ripples: Vec<RippleData>,
    /// How far any compositor may move a sample this frame
    pub max_sample_offset: f32,
}

impl PackedRipples {
    pub fn len(&self) -> usize {
        self.ripples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ripples.is_empty()
    }

    /// Raw bytes of the live entries
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.ripples)
    }

    /// Fixed-size copy for uniform upload; unused slots are zeroed
    pub fn padded(&self) -> [RippleData; MAX_PACKED_RIPPLES] {
        let mut out = [RippleData::zeroed(); MAX_PACKED_RIPPLES];
        for (slot, ripple) in out.iter_mut().zip(&self.ripples) {
            *slot = *ripple;
        }
        out
    }

    /// Largest amplitude in the buffer
    pub fn max_amplitude(&self) -> f32 {
        self.ripples.iter().map(|r| r.amplitude.abs()).fold(0.0, f32::max)
    }
}

/// Sampling radius for a frame: grows with the strongest ripple and the ring
/// width, and only logarithmically with the number of ripples
pub fn max_sample_offset(max_amplitude: f32, ring_width: f32, count: usize, limit: f32) -> f32 {
    if count == 0 {
        return 0.0;
    }
    let spread = max_amplitude * (1.0 + (count as f32).ln_1p()) + ring_width * 0.25;
    let limit = if limit.is_finite() { limit.max(0.0) } else { 0.0 };
    if spread.is_finite() { spread.clamp(0.0, limit) } else { limit }
}

/// Pack snapshot states for the compositors
pub fn pack(states: &[RippleState], params: &RippleParameters) -> PackedRipples {
    let params = params.sanitized();
    let ripples: Vec<RippleData> = states
        .iter()
        .take(MAX_PACKED_RIPPLES)
        .map(RippleData::from_state)
        .filter(|r| r.is_finite() && r.amplitude.abs() >= NEGLIGIBLE_AMPLITUDE)
        .collect();

    let mut packed = PackedRipples {
        ripples,
        max_sample_offset: 0.0,
    };
    packed.max_sample_offset = max_sample_offset(
        packed.max_amplitude(),
        params.ring_width,
        packed.len(),
        params.maximum_sample_offset,
    );
    packed
}
