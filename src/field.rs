//! Frame-driven orchestration
//!
//! `RippleField` ties the event store to the compositors: the host forwards
//! input through [`RippleField::emit`] and calls [`RippleField::tick`] once per
//! displayed frame. While idle, `tick` returns `None` and no per-frame work
//! happens. Phase changes are reported explicitly in [`FrameUpdate::transition`].

use glam::Vec2;

use crate::compositor::{FrameContext, PackedRipples, pack};
use crate::config::{EmitPolicy, RippleConfig, RippleParameters};
use crate::sim::{EmitOutcome, RippleState, RippleStore};

/// Animation state of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPhase {
    /// No live ripples; compositors are bypassed entirely
    #[default]
    Idle,
    /// At least one live ripple; snapshot + composite every frame
    Animating,
}

/// Everything a host needs to composite one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    /// Ripples in render-local coordinates
    pub packed: PackedRipples,
    pub context: FrameContext,
    pub phase: FieldPhase,
    /// Set on the first frame after the phase changed
    pub transition: Option<FieldPhase>,
}

impl FrameUpdate {
    /// True on the final frame before the field goes idle
    pub fn went_idle(&self) -> bool {
        self.transition == Some(FieldPhase::Idle)
    }
}

/// A ripple field bound to one render target
#[derive(Debug, Clone)]
pub struct RippleField {
    store: RippleStore,
    params: RippleParameters,
    /// Render-target size in pixels
    size: Vec2,
    /// Added to event centers to get render-local coordinates
    origin_offset: Vec2,
    phase: FieldPhase,
    /// Phase last reported through `tick`
    reported: FieldPhase,
}

impl RippleField {
    pub fn new(config: &RippleConfig, size: Vec2) -> Self {
        Self::with_parameters(config.parameters, config.emit, size)
    }

    pub fn with_parameters(params: RippleParameters, policy: EmitPolicy, size: Vec2) -> Self {
        Self {
            store: RippleStore::new(policy),
            params: params.sanitized(),
            size,
            origin_offset: Vec2::ZERO,
            phase: FieldPhase::Idle,
            reported: FieldPhase::Idle,
        }
    }

    pub fn phase(&self) -> FieldPhase {
        self.phase
    }

    /// True when the host can skip the frame entirely
    pub fn is_idle(&self) -> bool {
        self.store.is_idle() && self.reported == FieldPhase::Idle
    }

    pub fn store(&self) -> &RippleStore {
        &self.store
    }

    pub fn parameters(&self) -> &RippleParameters {
        &self.params
    }

    pub fn set_parameters(&mut self, params: RippleParameters) {
        self.params = params.sanitized();
    }

    pub fn set_policy(&mut self, policy: EmitPolicy) {
        self.store.set_policy(policy);
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn resize(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn origin_offset(&self) -> Vec2 {
        self.origin_offset
    }

    /// Offset from event space to render-local space (e.g. the view's origin
    /// within the window, negated)
    pub fn set_origin_offset(&mut self, offset: Vec2) {
        if offset.is_finite() {
            self.origin_offset = offset;
        } else {
            log::warn!("Ignoring non-finite origin offset {:?}", offset);
        }
    }

    /// Per-frame scalars for the current size and parameters
    pub fn context(&self) -> FrameContext {
        FrameContext::new(&self.params, self.size)
    }

    /// Spawn a ripple at `point` (event space)
    pub fn emit(&mut self, point: Vec2, now: f64) -> EmitOutcome {
        let outcome = self.store.emit(point, now);
        if outcome.is_accepted() && self.phase == FieldPhase::Idle {
            log::debug!("Ripple field animating");
            self.phase = FieldPhase::Animating;
        }
        outcome
    }

    pub fn emit_batch(&mut self, points: &[Vec2], now: f64) -> Vec<EmitOutcome> {
        points.iter().map(|&p| self.emit(p, now)).collect()
    }

    /// Drop every ripple; the next `tick` reports the transition to idle
    pub fn reset(&mut self) {
        self.store.reset();
        self.phase = FieldPhase::Idle;
    }

    /// Advance to `now` and produce the frame's ripple buffer
    ///
    /// Returns `None` while idle. The frame on which the last ripple decays is
    /// still returned (with an empty buffer) so the host can draw one clean frame.
    pub fn tick(&mut self, now: f64) -> Option<FrameUpdate> {
        if self.is_idle() {
            self.phase = FieldPhase::Idle;
            return None;
        }

        let offset = self.origin_offset;
        let states: Vec<RippleState> = self
            .store
            .snapshot(now, &self.params)
            .into_iter()
            .map(|mut s| {
                s.center += offset;
                s
            })
            .collect();

        self.phase = if states.is_empty() {
            FieldPhase::Idle
        } else {
            FieldPhase::Animating
        };
        let transition = (self.phase != self.reported).then_some(self.phase);
        self.reported = self.phase;
        if let Some(phase) = transition {
            log::debug!("Ripple field -> {:?} at t={:.3}", phase, now);
        }

        Some(FrameUpdate {
            packed: pack(&states, &self.params),
            context: self.context(),
            phase: self.phase,
            transition,
        })
    }
}
