//! Ripple tuning and preferences
//!
//! Persisted as JSON. Every scalar is independently tunable; out-of-range
//! values are clamped rather than rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compositor::CompositorKind;
use crate::consts::*;
use crate::error::{Result, RippleError};
use crate::{finite_or, sanitize_length};

/// Parameter preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RipplePreset {
    Subtle,
    #[default]
    Standard,
    Dramatic,
}

impl RipplePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            RipplePreset::Subtle => "Subtle",
            RipplePreset::Standard => "Standard",
            RipplePreset::Dramatic => "Dramatic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "subtle" | "low" => Some(RipplePreset::Subtle),
            "standard" | "default" => Some(RipplePreset::Standard),
            "dramatic" | "high" => Some(RipplePreset::Dramatic),
            _ => None,
        }
    }

    /// Wave parameters for this preset
    pub fn parameters(&self) -> RippleParameters {
        match self {
            RipplePreset::Subtle => RippleParameters {
                amplitude: 6.0,
                wavelength: 120.0,
                speed: 2.0,
                decay: 2.2,
                ring_width: 28.0,
                minimum_amplitude: 0.1,
                maximum_sample_offset: 32.0,
            },
            RipplePreset::Standard => RippleParameters::default(),
            RipplePreset::Dramatic => RippleParameters {
                amplitude: 20.0,
                wavelength: 180.0,
                speed: 2.6,
                decay: 1.1,
                ring_width: 48.0,
                minimum_amplitude: 0.2,
                maximum_sample_offset: 96.0,
            },
        }
    }
}

/// Wave tuning shared by every ripple in a field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleParameters {
    /// Peak initial displacement (amplitude at age 0)
    pub amplitude: f32,
    /// Distance between crests
    pub wavelength: f32,
    /// Phase velocity multiplier
    pub speed: f32,
    /// Exponential decay rate; <= 0 disables decay
    pub decay: f32,
    /// Crest envelope thickness
    pub ring_width: f32,
    /// Ripples at or below this amplitude are culled
    pub minimum_amplitude: f32,
    /// Upper bound on the compositor sampling radius
    pub maximum_sample_offset: f32,
}

impl Default for RippleParameters {
    fn default() -> Self {
        Self {
            amplitude: DEFAULT_AMPLITUDE,
            wavelength: DEFAULT_WAVELENGTH,
            speed: DEFAULT_SPEED,
            decay: DEFAULT_DECAY,
            ring_width: DEFAULT_RING_WIDTH,
            minimum_amplitude: DEFAULT_MINIMUM_AMPLITUDE,
            maximum_sample_offset: DEFAULT_MAXIMUM_SAMPLE_OFFSET,
        }
    }
}

impl RippleParameters {
    /// Copy with every field clamped into its usable range
    pub fn sanitized(&self) -> Self {
        Self {
            amplitude: finite_or(self.amplitude, 0.0),
            wavelength: sanitize_length(self.wavelength),
            speed: finite_or(self.speed, 0.0),
            decay: finite_or(self.decay, 0.0),
            ring_width: sanitize_length(self.ring_width),
            minimum_amplitude: finite_or(self.minimum_amplitude, 0.0).max(0.0),
            maximum_sample_offset: finite_or(self.maximum_sample_offset, 0.0).max(0.0),
        }
    }

    /// Decayed amplitude after `age` seconds
    #[inline]
    pub fn amplitude_at(&self, age: f32) -> f32 {
        if self.decay > 0.0 {
            self.amplitude * (-self.decay * age).exp()
        } else {
            self.amplitude
        }
    }

    /// Seconds until the amplitude falls to `minimum_amplitude` (None if it never does)
    pub fn lifetime(&self) -> Option<f32> {
        let p = self.sanitized();
        if p.amplitude <= p.minimum_amplitude {
            return Some(0.0);
        }
        if p.decay <= 0.0 || p.minimum_amplitude <= 0.0 {
            return None;
        }
        Some((p.amplitude / p.minimum_amplitude).ln() / p.decay)
    }
}

/// Emission coalescing and capacity policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitPolicy {
    /// Maximum live ripples; oldest are dropped beyond this
    pub max_simultaneous: usize,
    /// Debounce radius around the previous accepted emit
    pub min_emit_distance: f32,
    /// Debounce window after the previous accepted emit (seconds)
    pub min_emit_interval: f64,
}

impl Default for EmitPolicy {
    fn default() -> Self {
        Self {
            max_simultaneous: DEFAULT_MAX_SIMULTANEOUS,
            min_emit_distance: DEFAULT_MIN_EMIT_DISTANCE,
            min_emit_interval: DEFAULT_MIN_EMIT_INTERVAL,
        }
    }
}

impl EmitPolicy {
    /// Policy that never coalesces emits
    pub fn without_debounce(max_simultaneous: usize) -> Self {
        Self {
            max_simultaneous,
            min_emit_distance: 0.0,
            min_emit_interval: 0.0,
        }
    }

    pub fn sanitized(&self) -> Self {
        let interval = if self.min_emit_interval.is_finite() {
            self.min_emit_interval.max(0.0)
        } else {
            0.0
        };
        Self {
            max_simultaneous: self.max_simultaneous,
            min_emit_distance: finite_or(self.min_emit_distance, 0.0).max(0.0),
            min_emit_interval: interval,
        }
    }
}

/// Chromatic refraction + tint settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismaticStyle {
    /// Multiplier on the aggregate displacement before sampling
    pub refraction_strength: f32,
    /// Per-channel spread: red samples at (1+d), blue at (1-d)
    pub dispersion: f32,
    /// Tint color (RGBA, 0-1)
    pub tint: [f32; 4],
    /// How strongly crests pull toward the tint
    pub tint_strength: f32,
}

impl Default for PrismaticStyle {
    fn default() -> Self {
        Self {
            refraction_strength: 1.0,
            dispersion: 0.35,
            tint: [0.55, 0.8, 1.0, 1.0],
            tint_strength: 0.35,
        }
    }
}

impl PrismaticStyle {
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            refraction_strength: finite_or(self.refraction_strength, d.refraction_strength)
                .clamp(-MAX_REFRACTION_STRENGTH, MAX_REFRACTION_STRENGTH),
            dispersion: finite_or(self.dispersion, d.dispersion).clamp(0.0, 1.0),
            tint: sanitize_color(self.tint, d.tint),
            tint_strength: finite_or(self.tint_strength, d.tint_strength).clamp(0.0, 1.0),
        }
    }
}

/// Additive glow + crest highlight settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LuminousStyle {
    /// Glow gain applied to normalized wave energy
    pub glow_strength: f32,
    /// Exponent sharpening the crest highlight
    pub highlight_power: f32,
    /// Gain on the crest highlight
    pub highlight_boost: f32,
    /// Glow color (RGBA, 0-1)
    pub glow_color: [f32; 4],
}

impl Default for LuminousStyle {
    fn default() -> Self {
        Self {
            glow_strength: 0.8,
            highlight_power: 3.0,
            highlight_boost: 0.45,
            glow_color: [0.7, 0.9, 1.0, 1.0],
        }
    }
}

impl LuminousStyle {
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            glow_strength: finite_or(self.glow_strength, d.glow_strength).max(0.0),
            highlight_power: finite_or(self.highlight_power, d.highlight_power).max(MIN_HIGHLIGHT_POWER),
            highlight_boost: finite_or(self.highlight_boost, d.highlight_boost).max(0.0),
            glow_color: sanitize_color(self.glow_color, d.glow_color),
        }
    }
}

fn sanitize_color(color: [f32; 4], fallback: [f32; 4]) -> [f32; 4] {
    std::array::from_fn(|i| finite_or(color[i], fallback[i]).clamp(0.0, 1.0))
}

/// Complete ripple configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RippleConfig {
    /// Preset the parameters were seeded from
    pub preset: RipplePreset,
    pub parameters: RippleParameters,
    pub emit: EmitPolicy,
    /// Compositor used by hosts that render a single variant
    pub compositor: CompositorKind,
    pub prismatic: PrismaticStyle,
    pub luminous: LuminousStyle,
}

impl RippleConfig {
    /// Create a config from a preset (applies preset parameters)
    pub fn from_preset(preset: RipplePreset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    /// Apply a preset (replaces wave parameters, keeps styles and policy)
    pub fn apply_preset(&mut self, preset: RipplePreset) {
        self.preset = preset;
        self.parameters = preset.parameters();
    }

    /// Clamp every section, logging when something had to change
    pub fn sanitize(&mut self) {
        let parameters = self.parameters.sanitized();
        if parameters != self.parameters {
            log::warn!("Ripple parameters clamped: {:?} -> {:?}", self.parameters, parameters);
            self.parameters = parameters;
        }
        let emit = self.emit.sanitized();
        if emit != self.emit {
            log::warn!("Emit policy clamped: {:?} -> {:?}", self.emit, emit);
            self.emit = emit;
        }
        let prismatic = self.prismatic.sanitized();
        if prismatic != self.prismatic {
            log::warn!("Prismatic style clamped");
            self.prismatic = prismatic;
        }
        let luminous = self.luminous.sanitized();
        if luminous != self.luminous {
            log::warn!("Luminous style clamped");
            self.luminous = luminous;
        }
    }

    /// Parse from JSON (missing fields take defaults) and sanitize
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.sanitize();
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RippleError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded ripple config from {}", path.display());
        Ok(config)
    }

    /// Load from a JSON file, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::info!("Using default ripple config ({})", e);
                Self::default()
            }
        }
    }

    /// Save to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| RippleError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Ripple config saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let p = RippleParameters::default();
        assert_eq!(p.amplitude, 12.0);
        assert_eq!(p.wavelength, 140.0);
        assert_eq!(p.speed, 2.2);
        assert_eq!(p.decay, 1.6);
        assert_eq!(p.ring_width, 36.0);
        assert_eq!(p.minimum_amplitude, 0.15);
    }

    #[test]
    fn test_sanitize_clamps_length_scales() {
        let p = RippleParameters {
            wavelength: 0.0,
            ring_width: -5.0,
            amplitude: f32::NAN,
            decay: f32::INFINITY,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(p.wavelength, 1.0);
        assert_eq!(p.ring_width, 1.0);
        assert_eq!(p.amplitude, 0.0);
        assert_eq!(p.decay, 0.0);
    }

    #[test]
    fn test_amplitude_at_without_decay() {
        let p = RippleParameters {
            decay: 0.0,
            ..Default::default()
        };
        assert_eq!(p.amplitude_at(100.0), 12.0);
    }

    #[test]
    fn test_lifetime_default() {
        // ln(12 / 0.15) / 1.6 ~= 2.739 s
        let life = RippleParameters::default().lifetime().unwrap();
        assert!((life - 2.7388).abs() < 0.01);
        let forever = RippleParameters {
            decay: 0.0,
            ..Default::default()
        };
        assert!(forever.lifetime().is_none());
    }

    #[test]
    fn test_preset_round_trip_names() {
        for preset in [RipplePreset::Subtle, RipplePreset::Standard, RipplePreset::Dramatic] {
            assert_eq!(RipplePreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(RipplePreset::from_str("nope"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RippleConfig::from_json(r#"{ "parameters": { "amplitude": 20.0 } }"#).unwrap();
        assert_eq!(config.parameters.amplitude, 20.0);
        assert_eq!(config.parameters.wavelength, DEFAULT_WAVELENGTH);
        assert_eq!(config.emit, EmitPolicy::default());
    }

    #[test]
    fn test_json_sanitizes_bad_values() {
        let config =
            RippleConfig::from_json(r#"{ "parameters": { "ring_width": 0.0 }, "prismatic": { "dispersion": 4.0 } }"#)
                .unwrap();
        assert_eq!(config.parameters.ring_width, 1.0);
        assert_eq!(config.prismatic.dispersion, 1.0);
    }

    #[test]
    fn test_style_bounds() {
        let prismatic = PrismaticStyle {
            refraction_strength: 1.0e30,
            ..PrismaticStyle::default()
        }
        .sanitized();
        assert_eq!(prismatic.refraction_strength, MAX_REFRACTION_STRENGTH);

        let luminous = LuminousStyle {
            highlight_power: 0.0,
            ..LuminousStyle::default()
        }
        .sanitized();
        assert_eq!(luminous.highlight_power, MIN_HIGHLIGHT_POWER);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(
            RippleConfig::from_json("{ not json"),
            Err(RippleError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("ripple_config_{}.json", std::process::id()));
        let config = RippleConfig::from_preset(RipplePreset::Dramatic);
        config.save(&path).unwrap();
        let loaded = RippleConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = RippleConfig::load_or_default("/definitely/not/here.json");
        assert_eq!(config, RippleConfig::default());
    }
}
