//! Closed-form ripple wave math
//!
//! A ripple is a damped radial sinusoid confined to a moving Gaussian ring.
//! Everything here is pure: no state, no allocation, and no NaN/Inf ever
//! escapes. A non-finite input is a zero contribution.

use glam::Vec2;
use std::f32::consts::TAU;

use crate::config::RippleParameters;
use crate::consts::*;
use crate::{finite_or, half_diagonal, sanitize_length};

/// Per-ripple wave terms at a single query distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveSample {
    /// Traveling sinusoid, -1..1
    pub wave: f32,
    /// Ring envelope, 1 at the crest
    pub envelope: f32,
    /// Global distance falloff
    pub falloff: f32,
    /// Signed radial displacement (already clamped)
    pub displacement: f32,
}

impl WaveSample {
    pub const ZERO: Self = Self {
        wave: 0.0,
        envelope: 0.0,
        falloff: 0.0,
        displacement: 0.0,
    };
}

/// Aggregate of every ripple at one query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    /// Vector sum of displacements, clamped to `0.8 * wavelength`
    pub offset: Vec2,
    /// Sum of unsigned displacements
    pub energy: f32,
    /// Strongest crest weight across ripples, 0..1
    pub peak_envelope: f32,
    /// Ripples that contributed (finite inputs only)
    pub count: usize,
}

impl FieldSample {
    pub const EMPTY: Self = Self {
        offset: Vec2::ZERO,
        energy: 0.0,
        peak_envelope: 0.0,
        count: 0,
    };

    /// Mean unsigned displacement per contributing ripple
    #[inline]
    pub fn average_magnitude(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.energy / self.count as f32
        }
    }
}

/// Traveling radial sinusoid: `sin(2π (distance/wavelength - age*speed))`
#[inline]
pub fn radial_wave(distance: f32, age: f32, wavelength: f32, speed: f32) -> f32 {
    let phase = distance / sanitize_length(wavelength) - age * speed;
    let wave = (TAU * phase).sin();
    finite_or(wave, 0.0)
}

/// Gaussian ring envelope for a signed distance from the crest
#[inline]
pub fn ring_envelope(offset_from_front: f32, ring_width: f32) -> f32 {
    let k = offset_from_front / sanitize_length(ring_width);
    finite_or((-k * k).exp(), 0.0)
}

/// Wave math for one field, with scalars resolved once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveField {
    pub wavelength: f32,
    pub speed: f32,
    pub ring_width: f32,
    /// Amplitude at age 0, used to normalize crest weights
    pub reference_amplitude: f32,
    /// Distance over which the global falloff drops by 1/e
    pub falloff_radius: f32,
}

impl WaveField {
    /// Build from parameters and the render-target size
    pub fn new(params: &RippleParameters, size: Vec2) -> Self {
        let p = params.sanitized();
        let falloff_radius = half_diagonal(size).unwrap_or(FALLBACK_FALLOFF_RADIUS);
        Self {
            wavelength: p.wavelength,
            speed: p.speed,
            ring_width: p.ring_width,
            reference_amplitude: p.amplitude.abs(),
            falloff_radius: sanitize_length(falloff_radius),
        }
    }

    /// Radius the crest has travelled to after `age` seconds
    #[inline]
    pub fn front_distance(&self, age: f32) -> f32 {
        (age * finite_or(self.speed, 0.0) * sanitize_length(self.wavelength)).max(0.0)
    }

    /// Largest displacement a single ripple may contribute
    #[inline]
    pub fn source_clamp(&self) -> f32 {
        sanitize_length(self.wavelength) * SOURCE_CLAMP_FRACTION
    }

    /// Largest aggregate displacement across all ripples
    #[inline]
    pub fn total_clamp(&self) -> f32 {
        sanitize_length(self.wavelength) * TOTAL_CLAMP_FRACTION
    }

    /// Wave terms for one ripple at `distance` from its center
    pub fn sample(&self, distance: f32, age: f32, amplitude: f32) -> WaveSample {
        if !(distance.is_finite() && age.is_finite() && amplitude.is_finite()) {
            return WaveSample::ZERO;
        }
        let distance = distance.max(0.0);
        let wavelength = sanitize_length(self.wavelength);
        let speed = finite_or(self.speed, 0.0);

        let wave = radial_wave(distance, age, wavelength, speed);
        let envelope = ring_envelope(distance - self.front_distance(age), self.ring_width);
        let falloff = finite_or((-distance / sanitize_length(self.falloff_radius)).exp(), 0.0);

        let limit = self.source_clamp();
        let displacement = (wave * amplitude * envelope * falloff).clamp(-limit, limit);
        if !displacement.is_finite() {
            return WaveSample::ZERO;
        }

        WaveSample {
            wave,
            envelope,
            falloff,
            displacement,
        }
    }

    /// Displacement vector of one ripple at `point`, or `None` for bad input
    pub fn contribution(&self, point: Vec2, center: Vec2, age: f32, amplitude: f32) -> Option<(Vec2, WaveSample)> {
        if !(point.is_finite() && center.is_finite() && age.is_finite() && amplitude.is_finite()) {
            return None;
        }
        let delta = point - center;
        let distance = delta.length();
        let sample = self.sample(distance, age, amplitude);
        let dir = if distance > CENTER_EPSILON {
            delta / distance
        } else {
            Vec2::ZERO
        };
        Some((dir * sample.displacement, sample))
    }

    /// Crest weight for the highlight terms: envelope scaled by how much of
    /// the ripple's initial amplitude remains
    #[inline]
    fn crest_weight(&self, sample: &WaveSample, amplitude: f32) -> f32 {
        let strength = if self.reference_amplitude > 0.0 {
            (amplitude.abs() / self.reference_amplitude).min(1.0)
        } else {
            1.0
        };
        (sample.envelope * sample.falloff * strength).clamp(0.0, 1.0)
    }

    /// Sum every ripple `(center, age, amplitude)` at `point`
    pub fn sample_field<I>(&self, point: Vec2, ripples: I) -> FieldSample
    where
        I: IntoIterator<Item = (Vec2, f32, f32)>,
    {
        let mut out = FieldSample::EMPTY;
        for (center, age, amplitude) in ripples {
            let Some((vector, sample)) = self.contribution(point, center, age, amplitude) else {
                continue;
            };
            out.offset += vector;
            out.energy += sample.displacement.abs();
            out.peak_envelope = out.peak_envelope.max(self.crest_weight(&sample, amplitude));
            out.count += 1;
        }
        out.offset = out.offset.clamp_length_max(self.total_clamp());
        if !out.offset.is_finite() {
            out.offset = Vec2::ZERO;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field() -> WaveField {
        WaveField::new(&RippleParameters::default(), Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_zero_displacement_at_birth_and_center() {
        let s = field().sample(0.0, 0.0, 12.0);
        assert_eq!(s.wave, 0.0);
        assert!(s.displacement.abs() < 1e-6);
        // Crest sits on the center at age 0
        assert!((s.envelope - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_envelope_peaks_at_front() {
        let f = field();
        let age = 0.5;
        let front = f.front_distance(age);
        assert!((front - 0.5 * 2.2 * 140.0).abs() < 0.01);
        let at_crest = f.sample(front, age, 12.0).envelope;
        let off_crest = f.sample(front + 80.0, age, 12.0).envelope;
        assert!((at_crest - 1.0).abs() < 1e-5);
        assert!(off_crest < 0.05);
    }

    #[test]
    fn test_envelope_symmetric() {
        for k in [0.0, 5.0, 18.0, 36.0, 90.0] {
            assert_eq!(ring_envelope(k, 36.0), ring_envelope(-k, 36.0));
        }
    }

    #[test]
    fn test_wave_odd_about_crest() {
        let f = WaveField {
            falloff_radius: 1.0e9,
            ..field()
        };
        let age = 2.0 / f.speed; // front at exactly two wavelengths
        let front = f.front_distance(age);
        for delta in [3.0, 10.0, 25.0] {
            let ahead = f.sample(front + delta, age, 12.0);
            let behind = f.sample(front - delta, age, 12.0);
            let a = ahead.wave * ahead.envelope;
            let b = behind.wave * behind.envelope;
            assert!((a + b).abs() < 1e-3, "delta {}: {} vs {}", delta, a, b);
        }
    }

    #[test]
    fn test_nan_amplitude_is_zero() {
        let s = field().sample(50.0, 0.3, f32::NAN);
        assert_eq!(s, WaveSample::ZERO);
        let sum = field().sample_field(Vec2::new(10.0, 10.0), [(Vec2::ZERO, 0.3, f32::NAN)]);
        assert_eq!(sum.offset, Vec2::ZERO);
        assert_eq!(sum.count, 0);
    }

    #[test]
    fn test_zero_ring_width_is_finite() {
        let f = WaveField {
            ring_width: 0.0,
            ..field()
        };
        for d in [0.0, 0.5, 1.0, 20.0, 300.0] {
            let s = f.sample(d, 0.2, 12.0);
            assert!(s.displacement.is_finite());
        }
    }

    #[test]
    fn test_source_clamp() {
        let f = field();
        let age = 0.1;
        let front = f.front_distance(age);
        let s = f.sample(front + 35.0, age, 1.0e6);
        assert!(s.displacement.abs() <= f.source_clamp() + 1e-3);
    }

    #[test]
    fn test_total_clamp() {
        let f = field();
        let age = 0.1;
        let point = Vec2::new(f.front_distance(age) + 35.0, 0.0);
        let ripples = vec![(Vec2::ZERO, age, 1.0e6); 20];
        let sum = f.sample_field(point, ripples);
        assert!(sum.offset.length() <= f.total_clamp() + 1e-3);
        assert_eq!(sum.count, 20);
    }

    #[test]
    fn test_direction_zero_at_center() {
        let (vector, _) = field().contribution(Vec2::ZERO, Vec2::ZERO, 0.4, 12.0).unwrap();
        assert_eq!(vector, Vec2::ZERO);
    }

    #[test]
    fn test_direction_radial() {
        let f = field();
        let age = 0.3;
        // Quarter wavelength ahead of the crest keeps sin() away from zero
        let d = f.front_distance(age) + 35.0;
        let (vector, sample) = f.contribution(Vec2::new(0.0, d), Vec2::ZERO, age, 12.0).unwrap();
        assert!(vector.x.abs() < 1e-5);
        assert!((vector.y - sample.displacement).abs() < 1e-5);
    }

    #[test]
    fn test_falloff_uses_render_size() {
        let small = WaveField::new(&RippleParameters::default(), Vec2::new(100.0, 100.0));
        let large = WaveField::new(&RippleParameters::default(), Vec2::new(4000.0, 4000.0));
        assert!(small.falloff_radius < large.falloff_radius);
        let unknown = WaveField::new(&RippleParameters::default(), Vec2::new(f32::NAN, 10.0));
        assert_eq!(unknown.falloff_radius, FALLBACK_FALLOFF_RADIUS);
    }

    proptest! {
        #[test]
        fn prop_sample_always_finite(
            distance in prop::num::f32::ANY,
            age in prop::num::f32::ANY,
            amplitude in prop::num::f32::ANY,
            ring_width in prop::num::f32::ANY,
        ) {
            let f = WaveField { ring_width, ..field() };
            let s = f.sample(distance, age, amplitude);
            prop_assert!(s.displacement.is_finite());
            prop_assert!(s.envelope.is_finite());
        }

        #[test]
        fn prop_field_offset_finite_and_bounded(
            px in -2000.0f32..2000.0,
            py in -2000.0f32..2000.0,
            ages in prop::collection::vec(prop::num::f32::ANY, 0..16),
        ) {
            let f = field();
            let ripples = ages.iter().enumerate().map(|(i, &age)| {
                (Vec2::new(i as f32 * 40.0, 0.0), age, 12.0)
            });
            let sum = f.sample_field(Vec2::new(px, py), ripples);
            prop_assert!(sum.offset.is_finite());
            prop_assert!(sum.offset.length() <= f.total_clamp() + 1e-3);
            prop_assert!(sum.energy.is_finite());
        }
    }
}
