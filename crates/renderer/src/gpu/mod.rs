//! GPU plumbing behind the filter pipeline.
//!
//! - `context` acquires the wgpu instance/adapter/device, either headless or
//!   for a window.
//! - `layouts` holds the bind group layouts and sampler every filter program
//!   is linked against.
//! - `quad` owns the full-screen triangle strip all passes draw.
//! - `pool` lazily allocates the two ping-pong render targets and drops them
//!   when the output size changes.
//! - `surface` defines the visible output of a run: an offscreen texture with
//!   readback, or a presentable window surface.

pub(crate) mod context;
pub(crate) mod layouts;
pub(crate) mod pool;
pub(crate) mod quad;
pub(crate) mod surface;

pub use context::{AdapterProfile, GpuContext};
pub use surface::{OffscreenSurface, RenderSurface, SurfaceFrame, WindowSurface};
