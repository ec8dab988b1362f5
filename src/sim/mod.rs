//! Ripple simulation module
//!
//! Event bookkeeping and wave math. This module must stay pure:
//! - Time is supplied by the caller, never read from a clock
//! - Stable iteration order (birth order)
//! - No rendering or platform dependencies

pub mod store;
pub mod wave;

pub use store::{EmitOutcome, RippleEvent, RippleId, RippleState, RippleStore};
pub use wave::{FieldSample, WaveField, WaveSample, radial_wave, ring_envelope};
