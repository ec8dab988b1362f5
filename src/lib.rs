//! Ripple Field - decaying radial wave distortions over arbitrary content
//!
//! Core modules:
//! - `sim`: Ripple events, decay/eviction policy and the closed-form wave math
//! - `compositor`: Per-pixel distortion, prismatic and luminous compositors (CPU)
//! - `field`: Frame-driven orchestration (Idle/Animating, coordinate translation)
//! - `renderer`: WebGPU kernel resolution and fullscreen ripple pipeline
//! - `config`: Tunable parameters, presets and JSON persistence

pub mod compositor;
pub mod config;
pub mod error;
pub mod field;
pub mod renderer;
pub mod sim;

pub use compositor::{Compositor, CompositorKind, FrameContext, PackedRipples, RgbaImage, RippleData};
pub use config::{EmitPolicy, LuminousStyle, PrismaticStyle, RippleConfig, RippleParameters, RipplePreset};
pub use error::{Result, RippleError};
pub use field::{FieldPhase, FrameUpdate, RippleField};
pub use sim::{EmitOutcome, RippleEvent, RippleId, RippleState, RippleStore, WaveField};

use glam::Vec2;

/// Ripple configuration constants
pub mod consts {
    /// Default peak initial displacement (pixels)
    pub const DEFAULT_AMPLITUDE: f32 = 12.0;
    /// Default distance between crests (pixels)
    pub const DEFAULT_WAVELENGTH: f32 = 140.0;
    /// Default phase velocity multiplier (wavelengths per second)
    pub const DEFAULT_SPEED: f32 = 2.2;
    /// Default exponential decay rate (1/s)
    pub const DEFAULT_DECAY: f32 = 1.6;
    /// Default crest envelope thickness (pixels)
    pub const DEFAULT_RING_WIDTH: f32 = 36.0;
    /// Default cull threshold for decayed amplitude
    pub const DEFAULT_MINIMUM_AMPLITUDE: f32 = 0.15;
    /// Default upper bound on how far a compositor may sample (pixels)
    pub const DEFAULT_MAXIMUM_SAMPLE_OFFSET: f32 = 64.0;

    /// Default number of simultaneously live ripples
    pub const DEFAULT_MAX_SIMULTANEOUS: usize = 12;
    /// Emits closer than this to the previous accepted emit may be coalesced (pixels)
    pub const DEFAULT_MIN_EMIT_DISTANCE: f32 = 12.0;
    /// Emits sooner than this after the previous accepted emit may be coalesced (seconds)
    pub const DEFAULT_MIN_EMIT_INTERVAL: f64 = 0.05;

    /// Hard cap on ripples handed to a kernel (must match the shader array)
    pub const MAX_PACKED_RIPPLES: usize = 64;
    /// Ripples weaker than this are left out of the packed buffer
    pub const NEGLIGIBLE_AMPLITUDE: f32 = 0.0001;

    /// Per-source displacement clamp, as a fraction of the wavelength
    pub const SOURCE_CLAMP_FRACTION: f32 = 0.6;
    /// Aggregate displacement clamp, as a fraction of the wavelength
    pub const TOTAL_CLAMP_FRACTION: f32 = 0.8;
    /// Global falloff radius used when the render size is unknown (pixels)
    pub const FALLBACK_FALLOFF_RADIUS: f32 = 600.0;
    /// Below this distance from a ripple center the displacement direction is zero
    pub const CENTER_EPSILON: f32 = 1.0e-4;
    /// Smallest usable wavelength / ring width (pixels)
    pub const MIN_LENGTH_SCALE: f32 = 1.0;

    /// Largest refraction multiplier a prismatic style may use (either sign)
    pub const MAX_REFRACTION_STRENGTH: f32 = 4.0;
    /// Smallest crest highlight exponent; at 0 the halo would cover the whole frame
    pub const MIN_HIGHLIGHT_POWER: f32 = 0.5;
}

/// Half of the render-target diagonal, or `None` when the size is unusable
#[inline]
pub fn half_diagonal(size: Vec2) -> Option<f32> {
    if size.is_finite() && size.x > 0.0 && size.y > 0.0 {
        Some(size.length() * 0.5)
    } else {
        None
    }
}

/// Clamp a length scale (wavelength, ring width) to something safe to divide by
#[inline]
pub fn sanitize_length(value: f32) -> f32 {
    if value.is_finite() {
        value.max(consts::MIN_LENGTH_SCALE)
    } else {
        consts::MIN_LENGTH_SCALE
    }
}

/// Replace a non-finite scalar with `fallback`
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_diagonal() {
        let d = half_diagonal(Vec2::new(300.0, 400.0)).unwrap();
        assert!((d - 250.0).abs() < 0.001);
        assert!(half_diagonal(Vec2::new(0.0, 400.0)).is_none());
        assert!(half_diagonal(Vec2::new(f32::NAN, 400.0)).is_none());
    }

    #[test]
    fn test_sanitize_length() {
        assert_eq!(sanitize_length(0.0), 1.0);
        assert_eq!(sanitize_length(-20.0), 1.0);
        assert_eq!(sanitize_length(f32::INFINITY), 1.0);
        assert_eq!(sanitize_length(140.0), 140.0);
    }
}
