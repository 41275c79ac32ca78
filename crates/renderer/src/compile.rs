use std::borrow::Cow;

use wgpu::naga;

use crate::error::PipelineError;
use crate::gpu::layouts::PassLayouts;
use crate::gpu::quad::QuadVertex;

/// Pipeline stage a GLSL source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

/// Parses and validates GLSL with naga without touching the GPU.
///
/// Generated blur sources go through here before `wgpu` sees them, so a
/// degenerate kernel surfaces as a descriptive error instead of a program
/// that silently renders nothing.
pub fn validate_glsl(stage: ShaderStage, label: &str, source: &str) -> Result<(), PipelineError> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options {
        stage: stage.to_naga(),
        defines: Default::default(),
    };
    let module = frontend
        .parse(&options, source)
        .map_err(|err| PipelineError::ShaderCompile {
            label: label.to_string(),
            message: format!("{err}"),
        })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|err| PipelineError::ShaderCompile {
        label: label.to_string(),
        message: err.as_inner().to_string(),
    })?;

    Ok(())
}

/// Compiles GLSL stages and links them into render pipelines that share the
/// quad vertex layout and the pass bind group layouts.
pub(crate) struct ShaderProgramBuilder<'a> {
    device: &'a wgpu::Device,
    layouts: &'a PassLayouts,
}

impl<'a> ShaderProgramBuilder<'a> {
    pub fn new(device: &'a wgpu::Device, layouts: &'a PassLayouts) -> Self {
        Self { device, layouts }
    }

    pub fn device(&self) -> &'a wgpu::Device {
        self.device
    }

    pub fn layouts(&self) -> &'a PassLayouts {
        self.layouts
    }

    /// Validates `source` and creates a shader module from it.
    pub fn compile(
        &self,
        stage: ShaderStage,
        label: &str,
        source: &str,
    ) -> Result<wgpu::ShaderModule, PipelineError> {
        validate_glsl(stage, label, source)?;

        let (module, error) = with_validation_scope(self.device, || {
            self.device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(label),
                    source: wgpu::ShaderSource::Glsl {
                        shader: Cow::Owned(source.to_string()),
                        stage: stage.to_naga(),
                        defines: &[],
                    },
                })
        });
        if let Some(error) = error {
            return Err(PipelineError::ShaderCompile {
                label: label.to_string(),
                message: error.to_string(),
            });
        }

        tracing::trace!(label, ?stage, bytes = source.len(), "compiled shader module");
        Ok(module)
    }

    /// Links a vertex/fragment pair into a pipeline writing `target_format`.
    ///
    /// `with_params` adds the per-pass uniform block at `set = 1`.
    pub fn link(
        &self,
        label: &str,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        target_format: wgpu::TextureFormat,
        with_params: bool,
    ) -> Result<wgpu::RenderPipeline, PipelineError> {
        let (pipeline, error) = with_validation_scope(self.device, || {
            let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = if with_params {
                vec![&self.layouts.input_layout, &self.layouts.params_layout]
            } else {
                vec![&self.layouts.input_layout]
            };
            let layout = self
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(label),
                    bind_group_layouts: &bind_group_layouts,
                    push_constant_ranges: &[],
                });

            self.device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(label),
                    layout: Some(&layout),
                    vertex: wgpu::VertexState {
                        module: vertex,
                        entry_point: Some("main"),
                        buffers: &[QuadVertex::layout()],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    },
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleStrip,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: Some(wgpu::Face::Back),
                        polygon_mode: wgpu::PolygonMode::Fill,
                        unclipped_depth: false,
                        conservative: false,
                    },
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    fragment: Some(wgpu::FragmentState {
                        module: fragment,
                        entry_point: Some("main"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: target_format,
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    }),
                    multiview: None,
                    cache: None,
                })
        });
        if let Some(error) = error {
            return Err(PipelineError::ShaderLink {
                label: label.to_string(),
                message: error.to_string(),
            });
        }

        tracing::trace!(label, ?target_format, with_params, "linked render pipeline");
        Ok(pipeline)
    }
}

/// Runs `f` inside a validation error scope and returns whatever the device
/// reported for it.
pub(crate) fn with_validation_scope<T>(
    device: &wgpu::Device,
    f: impl FnOnce() -> T,
) -> (T, Option<wgpu::Error>) {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    let error = pollster::block_on(device.pop_error_scope());
    (value, error)
}
