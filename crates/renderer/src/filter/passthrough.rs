use crate::compile::ShaderProgramBuilder;
use crate::error::PipelineError;
use crate::pipeline::PassDispatcher;
use crate::shaders::PASSTHROUGH_FRAGMENT_GLSL;

use super::FilterProgram;

/// Copies its input to its output unchanged in a single pass.
pub struct PassthroughFilter {
    program: FilterProgram,
}

impl PassthroughFilter {
    pub(crate) fn new(
        builder: &ShaderProgramBuilder<'_>,
        vertex: &wgpu::ShaderModule,
        output_format: wgpu::TextureFormat,
    ) -> Result<Self, PipelineError> {
        let program = FilterProgram::build(
            builder,
            vertex,
            "passthrough",
            PASSTHROUGH_FRAGMENT_GLSL,
            output_format,
            None,
        )?;
        Ok(Self { program })
    }

    pub(crate) fn draw_pass(&self, dispatcher: &mut PassDispatcher<'_>) -> Result<(), PipelineError> {
        dispatcher.dispatch(&self.program, None)?;
        Ok(())
    }
}
