use bytemuck::{Pod, Zeroable};

use crate::compile::ShaderProgramBuilder;
use crate::error::PipelineError;
use crate::kernel::GaussianKernel;
use crate::pipeline::PassDispatcher;
use crate::shaders::blur_fragment_source;
use crate::types::{KernelNormalization, OutputSize, MAX_BLUR_RADIUS};

/// Uniform block read by the blur shader. Mirrors `BlurParams` in the GLSL
/// (std140, 16 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct BlurParams {
    pub pixel_delta: [f32; 2],
    pub _padding: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlurAxis {
    Vertical,
    Horizontal,
}

impl BlurParams {
    fn along(axis: BlurAxis, size: OutputSize) -> Self {
        let pixel_delta = match axis {
            BlurAxis::Vertical => [0.0, 1.0 / size.height as f32],
            BlurAxis::Horizontal => [1.0 / size.width as f32, 0.0],
        };
        Self {
            pixel_delta,
            _padding: [0.0; 2],
        }
    }
}

/// Separable Gaussian blur: a vertical pass followed by a horizontal pass,
/// both running the same generated convolution shader.
pub struct GaussianBlurFilter {
    kernel: GaussianKernel,
    program: super::FilterProgram,
}

impl GaussianBlurFilter {
    pub(crate) fn new(
        builder: &ShaderProgramBuilder<'_>,
        vertex: &wgpu::ShaderModule,
        output_format: wgpu::TextureFormat,
        radius: u32,
        normalization: KernelNormalization,
    ) -> Result<Self, PipelineError> {
        if radius > MAX_BLUR_RADIUS {
            return Err(PipelineError::InvalidRadius {
                radius,
                max: MAX_BLUR_RADIUS,
            });
        }

        let kernel = GaussianKernel::new(radius, normalization);
        let source = blur_fragment_source(&kernel);
        tracing::debug!(
            radius,
            sigma = kernel.sigma(),
            %normalization,
            taps = 2 * radius + 1,
            "generated blur shader"
        );

        let program = super::FilterProgram::build(
            builder,
            vertex,
            &format!("gaussian blur r{radius}"),
            &source,
            output_format,
            Some(std::mem::size_of::<BlurParams>() as u64),
        )?;
        Ok(Self { kernel, program })
    }

    pub fn radius(&self) -> u32 {
        self.kernel.radius()
    }

    pub fn kernel(&self) -> &GaussianKernel {
        &self.kernel
    }

    /// Pass 0 blurs vertically, pass 1 horizontally.
    pub(crate) fn draw_pass(
        &self,
        pass: usize,
        dispatcher: &mut PassDispatcher<'_>,
    ) -> Result<(), PipelineError> {
        let axis = if pass == 0 {
            BlurAxis::Vertical
        } else {
            BlurAxis::Horizontal
        };
        let params = BlurParams::along(axis, dispatcher.size());
        dispatcher.dispatch(&self.program, Some(bytemuck::bytes_of(&params)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_match_the_std140_block() {
        assert_eq!(std::mem::size_of::<BlurParams>(), 16);
    }

    #[test]
    fn each_axis_steps_one_texel() {
        let size = OutputSize::new(200, 50).unwrap();
        assert_eq!(
            BlurParams::along(BlurAxis::Vertical, size).pixel_delta,
            [0.0, 0.02]
        );
        assert_eq!(
            BlurParams::along(BlurAxis::Horizontal, size).pixel_delta,
            [0.005, 0.0]
        );
    }
}
