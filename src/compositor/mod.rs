//! Per-pixel ripple compositors
//!
//! Each compositor is a pure function of `(pixel, packed ripples, frame
//! scalars)`. The CPU versions here are the reference; the WGSL kernel in
//! `renderer` mirrors them.

pub mod distortion;
pub mod image;
pub mod luminous;
pub mod pack;
pub mod prismatic;

pub use distortion::Distortion;
pub use image::{RgbaImage, render_cpu};
pub use luminous::Luminous;
pub use pack::{PackedRipples, RippleData, max_sample_offset, pack};
pub use prismatic::Prismatic;

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::config::{RippleConfig, RippleParameters};
use crate::sim::{FieldSample, WaveField};

/// Anything a compositor can read colors from
pub trait SourceImage {
    /// Color at a position in pixel space (pixel centers at `x + 0.5`)
    fn sample(&self, pos: Vec2) -> Vec4;
}

/// Scalars shared by every pixel of a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Render-target size in pixels
    pub size: Vec2,
    pub wave: WaveField,
}

impl FrameContext {
    pub fn new(params: &RippleParameters, size: Vec2) -> Self {
        Self {
            size,
            wave: WaveField::new(params, size),
        }
    }

    /// False for non-finite or non-positive sizes
    pub fn is_renderable(&self) -> bool {
        self.size.is_finite() && self.size.x > 0.0 && self.size.y > 0.0
    }

    /// Whether compositing should run at all for this buffer
    #[inline]
    pub fn is_active(&self, packed: &PackedRipples) -> bool {
        self.is_renderable() && !packed.is_empty()
    }

    /// Aggregate wave terms at `pixel`
    #[inline]
    pub fn field_at(&self, pixel: Vec2, packed: &PackedRipples) -> FieldSample {
        self.wave.sample_field(pixel, packed.ripples.iter().map(RippleData::unpack))
    }
}

/// Compositor selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CompositorKind {
    #[default]
    Distortion,
    Prismatic,
    Luminous,
}

impl CompositorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositorKind::Distortion => "Distortion",
            CompositorKind::Prismatic => "Prismatic",
            CompositorKind::Luminous => "Luminous",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "distortion" | "plain" => Some(CompositorKind::Distortion),
            "prismatic" | "prism" => Some(CompositorKind::Prismatic),
            "luminous" | "glow" => Some(CompositorKind::Luminous),
            _ => None,
        }
    }

    /// Fragment entry point implementing this compositor in the GPU kernel
    pub fn entry_point(&self) -> &'static str {
        match self {
            CompositorKind::Distortion => "fs_distortion",
            CompositorKind::Prismatic => "fs_prismatic",
            CompositorKind::Luminous => "fs_luminous",
        }
    }
}

/// A configured compositor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Compositor {
    Distortion(Distortion),
    Prismatic(Prismatic),
    Luminous(Luminous),
}

impl Compositor {
    /// Build the variant selected by the config, with its style
    pub fn from_config(config: &RippleConfig) -> Self {
        Self::of_kind(config.compositor, config)
    }

    /// Build a specific variant using the config's styles
    pub fn of_kind(kind: CompositorKind, config: &RippleConfig) -> Self {
        match kind {
            CompositorKind::Distortion => Compositor::Distortion(Distortion),
            CompositorKind::Prismatic => Compositor::Prismatic(Prismatic::new(config.prismatic)),
            CompositorKind::Luminous => Compositor::Luminous(Luminous::new(config.luminous)),
        }
    }

    pub fn kind(&self) -> CompositorKind {
        match self {
            Compositor::Distortion(_) => CompositorKind::Distortion,
            Compositor::Prismatic(_) => CompositorKind::Prismatic,
            Compositor::Luminous(_) => CompositorKind::Luminous,
        }
    }

    /// Output color for one pixel
    pub fn shade<S: SourceImage + ?Sized>(
        &self,
        pixel: Vec2,
        source: &S,
        ctx: &FrameContext,
        packed: &PackedRipples,
    ) -> Vec4 {
        match self {
            Compositor::Distortion(c) => c.shade(pixel, source, ctx, packed),
            Compositor::Prismatic(c) => c.shade(pixel, source, ctx, packed),
            Compositor::Luminous(c) => c.shade(pixel, source, ctx, packed),
        }
    }
}
