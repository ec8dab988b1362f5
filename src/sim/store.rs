//! Ripple event store
//!
//! Owns the bounded, birth-ordered list of live ripples. Emission is
//! debounced against the previous accepted emit, overflow drops the oldest
//! events, and decayed events are evicted lazily whenever a snapshot is taken.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{EmitPolicy, RippleParameters};

/// Opaque, monotonically allocated ripple identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RippleId(pub u64);

impl fmt::Display for RippleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ripple#{}", self.0)
    }
}

/// A single wave source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RippleEvent {
    pub id: RippleId,
    /// Emission time (seconds, host clock)
    pub birth: f64,
    /// Origin point; the only field that may change after emission
    pub center: Vec2,
}

/// Decayed, point-in-time view of a ripple handed to compositors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleState {
    pub center: Vec2,
    /// Seconds since birth, never negative
    pub age: f32,
    /// Current peak displacement
    pub amplitude: f32,
}

/// Result of an emit request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// Stored under the given id
    Accepted(RippleId),
    /// Too close in space and time to the previous accepted emit
    Debounced,
    /// Non-finite input or a zero-capacity policy
    Rejected,
}

impl EmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, EmitOutcome::Accepted(_))
    }

    pub fn id(&self) -> Option<RippleId> {
        match self {
            EmitOutcome::Accepted(id) => Some(*id),
            _ => None,
        }
    }
}

/// Bounded, insertion-ordered collection of live ripple events
#[derive(Debug, Clone)]
pub struct RippleStore {
    /// Live events (birth order)
    events: Vec<RippleEvent>,
    policy: EmitPolicy,
    /// Point and time of the most recent accepted emit (debounce memory)
    last_emit: Option<(Vec2, f64)>,
    /// Next ripple ID
    next_id: u64,
}

impl Default for RippleStore {
    fn default() -> Self {
        Self::new(EmitPolicy::default())
    }
}

impl RippleStore {
    pub fn new(policy: EmitPolicy) -> Self {
        let policy = policy.sanitized();
        Self {
            events: Vec::with_capacity(policy.max_simultaneous.min(crate::consts::MAX_PACKED_RIPPLES)),
            policy,
            last_emit: None,
            next_id: 1,
        }
    }

    pub fn policy(&self) -> &EmitPolicy {
        &self.policy
    }

    /// Replace the policy; a smaller capacity drops the oldest events immediately
    pub fn set_policy(&mut self, policy: EmitPolicy) {
        self.policy = policy.sanitized();
        self.enforce_capacity();
    }

    /// Live events in birth order
    pub fn events(&self) -> &[RippleEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing is animating
    pub fn is_idle(&self) -> bool {
        self.events.is_empty()
    }

    /// Allocate a new ripple ID
    fn next_ripple_id(&mut self) -> RippleId {
        let id = RippleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn a ripple at `point`
    pub fn emit(&mut self, point: Vec2, timestamp: f64) -> EmitOutcome {
        if !point.is_finite() || !timestamp.is_finite() {
            log::debug!("Rejected non-finite emit at {:?} t={}", point, timestamp);
            return EmitOutcome::Rejected;
        }
        if self.policy.max_simultaneous == 0 {
            return EmitOutcome::Rejected;
        }

        if let Some((last_point, last_time)) = self.last_emit {
            let near = last_point.distance(point) < self.policy.min_emit_distance;
            let recent = (timestamp - last_time).abs() < self.policy.min_emit_interval;
            if near && recent {
                return EmitOutcome::Debounced;
            }
        }

        let id = self.next_ripple_id();
        self.events.push(RippleEvent {
            id,
            birth: timestamp,
            center: point,
        });
        self.last_emit = Some((point, timestamp));
        self.enforce_capacity();

        log::debug!("Emitted {} at ({:.1}, {:.1}), {} live", id, point.x, point.y, self.events.len());
        EmitOutcome::Accepted(id)
    }

    /// Emit each point in order with the same timestamp
    pub fn emit_batch(&mut self, points: &[Vec2], timestamp: f64) -> Vec<EmitOutcome> {
        points.iter().map(|&p| self.emit(p, timestamp)).collect()
    }

    /// Drop every event and forget the debounce history
    pub fn reset(&mut self) {
        self.events.clear();
        self.last_emit = None;
    }

    /// Shift every ripple center (and the debounce anchor) by `offset`
    pub fn translate_all(&mut self, offset: Vec2) {
        if !offset.is_finite() {
            return;
        }
        for event in &mut self.events {
            event.center += offset;
        }
        if let Some((point, _)) = self.last_emit.as_mut() {
            *point += offset;
        }
    }

    /// Decayed states at `now`; events at or below the cull threshold are
    /// removed from the store as a side effect
    pub fn snapshot(&mut self, now: f64, params: &RippleParameters) -> Vec<RippleState> {
        if !now.is_finite() {
            log::warn!("Ignoring snapshot with non-finite clock {}", now);
            return Vec::new();
        }
        let params = params.sanitized();
        let mut states = Vec::with_capacity(self.events.len());

        let before = self.events.len();
        self.events.retain(|event| {
            let age = (now - event.birth).max(0.0) as f32;
            let amplitude = params.amplitude_at(age);
            if amplitude.is_finite() && amplitude > params.minimum_amplitude {
                states.push(RippleState {
                    center: event.center,
                    age,
                    amplitude,
                });
                true
            } else {
                false
            }
        });

        let evicted = before - self.events.len();
        if evicted > 0 {
            log::debug!("Evicted {} decayed ripples, {} live", evicted, self.events.len());
        }
        states
    }

    /// Drop oldest events until the capacity bound holds
    fn enforce_capacity(&mut self) {
        let max = self.policy.max_simultaneous;
        if self.events.len() > max {
            let excess = self.events.len() - max;
            self.events.drain(..excess);
            log::debug!("Dropped {} oldest ripples over capacity {}", excess, max);
        }
    }
}
