//! GPU image filter chains for swiftfx.
//!
//! A [`FilterPipeline`] holds an ordered list of filters and applies them to
//! an image in a single command submission:
//!
//! ```text
//!   RgbaImage ──upload──▶ source texture
//!                              │ pass 0
//!                              ▼
//!                  slot 0 ◀──▶ slot 1      (ping-pong, pass i writes slot i % 2)
//!                              │ last pass
//!                              ▼
//!                  RenderSurface (OffscreenSurface | WindowSurface)
//! ```
//!
//! Filters are built from GLSL: the passthrough shader is static and the
//! Gaussian blur shader is generated per radius with its kernel weights baked
//! in. Every source is validated with naga before `wgpu` sees it.

mod compile;
mod error;
mod filter;
mod gpu;
mod kernel;
mod pipeline;
mod preview;
mod schedule;
mod shaders;
mod types;

pub use compile::{validate_glsl, ShaderStage};
pub use error::PipelineError;
pub use filter::{Filter, GaussianBlurFilter, PassthroughFilter};
pub use gpu::{AdapterProfile, GpuContext, OffscreenSurface, RenderSurface, SurfaceFrame, WindowSurface};
pub use kernel::{gaussian, GaussianKernel};
pub use pipeline::{FilterPipeline, PoolStats};
pub use preview::{run_preview, PreviewConfig};
pub use schedule::{plan_chain, PassInput, PassOutput, PassRoute, PassSchedule, PlannedPass};
pub use types::{FilterSpec, GpuPowerPreference, KernelNormalization, OutputSize, MAX_BLUR_RADIUS};
