use std::fmt;

use crate::error::PipelineError;

/// Largest blur radius accepted by [`crate::GaussianBlurFilter`].
///
/// The blur shader is fully unrolled, so the radius bounds the number of
/// texture taps per pass (`2 * radius + 1`).
pub const MAX_BLUR_RADIUS: u32 = 64;

/// Output dimensions of a pipeline run, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    /// Validates that both dimensions are non-zero.
    pub fn new(width: u32, height: u32) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidImage { width, height });
        }
        Ok(Self { width, height })
    }

    pub(crate) fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How the one-sided Gaussian weights are scaled before baking them into
/// the blur shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelNormalization {
    /// Divide by `w(0) + 2 * sum(w(1..=radius))`; the two-sided kernel sums to 1.
    #[default]
    Exact,
    /// Divide by `2 * sum(w(0..=radius))`, counting the centre tap twice.
    ///
    /// Matches the historical output, which loses a little energy per pass.
    Legacy,
}

impl fmt::Display for KernelNormalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelNormalization::Exact => f.write_str("exact"),
            KernelNormalization::Legacy => f.write_str("legacy"),
        }
    }
}

/// Adapter selection hint forwarded to `wgpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

impl GpuPowerPreference {
    pub(crate) fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Declarative description of one filter stage.
///
/// Hosts build chains from these (CLI flags, config files) and hand them to
/// [`crate::FilterPipeline::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSpec {
    Passthrough,
    GaussianBlur {
        radius: u32,
        normalization: KernelNormalization,
    },
}

impl FilterSpec {
    /// Number of render passes the stage contributes to the chain.
    pub fn pass_count(&self) -> usize {
        match self {
            FilterSpec::Passthrough => crate::filter::PASSTHROUGH_PASSES,
            FilterSpec::GaussianBlur { .. } => crate::filter::GAUSSIAN_BLUR_PASSES,
        }
    }

    /// Short human-readable name used in logs and plans.
    pub fn name(&self) -> &'static str {
        match self {
            FilterSpec::Passthrough => "passthrough",
            FilterSpec::GaussianBlur { .. } => "gaussian-blur",
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Passthrough => f.write_str("passthrough"),
            FilterSpec::GaussianBlur {
                radius,
                normalization,
            } => write!(f, "gaussian-blur(radius={radius}, normalization={normalization})"),
        }
    }
}
