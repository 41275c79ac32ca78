//! Filters that can be chained in a [`crate::FilterPipeline`].
//!
//! Each filter owns its compiled programs and knows how many passes it
//! contributes. Filters never pick their own render targets: they hand each
//! pass to a [`PassDispatcher`], which routes it through the ping-pong
//! schedule shared by the whole chain.

mod blur;
mod passthrough;

pub use blur::GaussianBlurFilter;
pub use passthrough::PassthroughFilter;

use crate::compile::{ShaderProgramBuilder, ShaderStage};
use crate::error::PipelineError;
use crate::gpu::pool::INTERMEDIATE_FORMAT;
use crate::pipeline::PassDispatcher;
use crate::schedule::PassOutput;
use crate::types::FilterSpec;

/// Passes contributed by [`PassthroughFilter`].
pub(crate) const PASSTHROUGH_PASSES: usize = 1;

/// Passes contributed by [`GaussianBlurFilter`]: one vertical, one horizontal.
pub(crate) const GAUSSIAN_BLUR_PASSES: usize = 2;

/// A linked fragment program plus the uniform block it reads per pass.
///
/// Intermediate passes render into the ping-pong format while the final pass
/// renders into the surface format; when the two differ a second pipeline is
/// linked for the surface.
pub(crate) struct FilterProgram {
    label: String,
    intermediate: wgpu::RenderPipeline,
    surface: Option<wgpu::RenderPipeline>,
    params: Option<ParamsBinding>,
}

pub(crate) struct ParamsBinding {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl FilterProgram {
    /// Compiles `fragment_source` against the shared vertex module and links
    /// it for both output formats. `params_size` allocates a uniform buffer
    /// bound at `set = 1`.
    pub fn build(
        builder: &ShaderProgramBuilder<'_>,
        vertex: &wgpu::ShaderModule,
        label: &str,
        fragment_source: &str,
        output_format: wgpu::TextureFormat,
        params_size: Option<u64>,
    ) -> Result<Self, PipelineError> {
        let fragment = builder.compile(
            ShaderStage::Fragment,
            &format!("{label} fragment"),
            fragment_source,
        )?;
        let with_params = params_size.is_some();
        let intermediate = builder.link(
            &format!("{label} (intermediate)"),
            vertex,
            &fragment,
            INTERMEDIATE_FORMAT,
            with_params,
        )?;
        let surface = if output_format == INTERMEDIATE_FORMAT {
            None
        } else {
            Some(builder.link(
                &format!("{label} (surface)"),
                vertex,
                &fragment,
                output_format,
                with_params,
            )?)
        };

        let params = params_size.map(|size| {
            let buffer = builder.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{label} params")),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = builder.layouts().params_bind_group(
                builder.device(),
                &buffer,
                &format!("{label} params"),
            );
            ParamsBinding { buffer, bind_group }
        });

        Ok(Self {
            label: label.to_string(),
            intermediate,
            surface,
            params,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Pipeline matching the format of `output`.
    pub fn pipeline_for(&self, output: PassOutput) -> &wgpu::RenderPipeline {
        match output {
            PassOutput::Slot(_) => &self.intermediate,
            PassOutput::Surface => self.surface.as_ref().unwrap_or(&self.intermediate),
        }
    }

    pub fn params(&self) -> Option<&ParamsBinding> {
        self.params.as_ref()
    }
}

/// One stage of a filter chain.
pub enum Filter {
    Passthrough(PassthroughFilter),
    GaussianBlur(GaussianBlurFilter),
}

impl Filter {
    /// Declarative description the filter was built from.
    pub fn spec(&self) -> FilterSpec {
        match self {
            Filter::Passthrough(_) => FilterSpec::Passthrough,
            Filter::GaussianBlur(blur) => FilterSpec::GaussianBlur {
                radius: blur.radius(),
                normalization: blur.kernel().normalization(),
            },
        }
    }

    pub fn pass_count(&self) -> usize {
        match self {
            Filter::Passthrough(_) => PASSTHROUGH_PASSES,
            Filter::GaussianBlur(_) => GAUSSIAN_BLUR_PASSES,
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec().name()
    }

    /// Encodes pass `pass` (`0..pass_count()`) of this filter. The pipeline
    /// calls this once per pass, in increasing order.
    pub(crate) fn draw_pass(
        &self,
        pass: usize,
        dispatcher: &mut PassDispatcher<'_>,
    ) -> Result<(), PipelineError> {
        match self {
            Filter::Passthrough(filter) => filter.draw_pass(dispatcher),
            Filter::GaussianBlur(filter) => filter.draw_pass(pass, dispatcher),
        }
    }
}

impl From<PassthroughFilter> for Filter {
    fn from(filter: PassthroughFilter) -> Self {
        Filter::Passthrough(filter)
    }
}

impl From<GaussianBlurFilter> for Filter {
    fn from(filter: GaussianBlurFilter) -> Self {
        Filter::GaussianBlur(filter)
    }
}
