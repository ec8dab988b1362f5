//! WebGPU rendering module
//!
//! The per-pixel compositors run in a fullscreen fragment pass. The kernel is
//! resolved once through [`KernelResolver`] and shared by every pipeline.

pub mod kernel;
pub mod ripple_pipeline;

pub use kernel::{KernelResolver, KernelSource, RippleKernel};
pub use ripple_pipeline::RipplePipeline;
