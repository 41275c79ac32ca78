//! The filter chain and the per-run pass dispatch.

use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::compile::{with_validation_scope, ShaderProgramBuilder, ShaderStage};
use crate::error::PipelineError;
use crate::filter::{Filter, FilterProgram, GaussianBlurFilter, PassthroughFilter};
use crate::gpu::layouts::PassLayouts;
use crate::gpu::pool::{ResourcePool, INTERMEDIATE_FORMAT};
use crate::gpu::quad::QuadGeometry;
use crate::gpu::{GpuContext, RenderSurface};
use crate::schedule::{plan_chain, PassInput, PassOutput, PassRoute, PassSchedule, PlannedPass};
use crate::shaders::VERTEX_SHADER_GLSL;
use crate::types::{FilterSpec, KernelNormalization, OutputSize};

/// Snapshot of the ping-pong pool, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Size the slots were last prepared for.
    pub size: Option<OutputSize>,
    /// Slots currently holding GPU textures.
    pub live_slots: usize,
    /// Slot allocations since the pipeline was created.
    pub allocations: usize,
}

/// An ordered chain of filters applied to an image in one submission.
///
/// Filters run in insertion order. Every pass but the last renders into one
/// of two shared off-screen slots; the last renders into the caller's
/// surface.
///
/// ```no_run
/// # use renderer::{FilterPipeline, GpuContext, GpuPowerPreference, OffscreenSurface};
/// # fn demo(image: &image::RgbaImage) -> Result<(), renderer::PipelineError> {
/// let context = GpuContext::headless(GpuPowerPreference::default())?;
/// let mut pipeline = FilterPipeline::new(&context, OffscreenSurface::FORMAT)?
///     .add_gaussian_blur(6)?
///     .add_passthrough()?;
/// let mut surface = OffscreenSurface::new();
/// pipeline.apply_to(image, &mut surface)?;
/// let blurred = surface.read_pixels(&context)?;
/// # let _ = blurred;
/// # Ok(())
/// # }
/// ```
pub struct FilterPipeline<'ctx> {
    context: &'ctx GpuContext,
    output_format: wgpu::TextureFormat,
    layouts: PassLayouts,
    quad: QuadGeometry,
    vertex: wgpu::ShaderModule,
    filters: Vec<Filter>,
    pool: ResourcePool,
}

impl<'ctx> FilterPipeline<'ctx> {
    /// Creates an empty chain whose final pass writes `output_format`.
    pub fn new(
        context: &'ctx GpuContext,
        output_format: wgpu::TextureFormat,
    ) -> Result<Self, PipelineError> {
        let device = context.device();
        let layouts = PassLayouts::new(device);
        let quad = QuadGeometry::new(device);
        let vertex = ShaderProgramBuilder::new(device, &layouts).compile(
            ShaderStage::Vertex,
            "quad vertex",
            VERTEX_SHADER_GLSL,
        )?;

        tracing::debug!(?output_format, "created filter pipeline");
        Ok(Self {
            context,
            output_format,
            layouts,
            quad,
            vertex,
            filters: Vec::new(),
            pool: ResourcePool::new(),
        })
    }

    /// Appends a Gaussian blur with the default kernel normalization.
    pub fn add_gaussian_blur(self, radius: u32) -> Result<Self, PipelineError> {
        self.add_gaussian_blur_with(radius, KernelNormalization::default())
    }

    pub fn add_gaussian_blur_with(
        mut self,
        radius: u32,
        normalization: KernelNormalization,
    ) -> Result<Self, PipelineError> {
        let filter = GaussianBlurFilter::new(
            &self.program_builder(),
            &self.vertex,
            self.output_format,
            radius,
            normalization,
        )?;
        self.push(filter.into());
        Ok(self)
    }

    pub fn add_passthrough(mut self) -> Result<Self, PipelineError> {
        let filter =
            PassthroughFilter::new(&self.program_builder(), &self.vertex, self.output_format)?;
        self.push(filter.into());
        Ok(self)
    }

    /// Appends the filter described by `spec`.
    pub fn add(self, spec: FilterSpec) -> Result<Self, PipelineError> {
        match spec {
            FilterSpec::Passthrough => self.add_passthrough(),
            FilterSpec::GaussianBlur {
                radius,
                normalization,
            } => self.add_gaussian_blur_with(radius, normalization),
        }
    }

    fn program_builder(&self) -> ShaderProgramBuilder<'_> {
        ShaderProgramBuilder::new(self.context.device(), &self.layouts)
    }

    fn push(&mut self, filter: Filter) {
        tracing::debug!(
            filter = %filter.spec(),
            position = self.filters.len(),
            passes = filter.pass_count(),
            "added filter"
        );
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn specs(&self) -> Vec<FilterSpec> {
        self.filters.iter().map(Filter::spec).collect()
    }

    /// Sum of the pass counts of every filter in the chain.
    pub fn total_passes(&self) -> usize {
        self.filters.iter().map(Filter::pass_count).sum()
    }

    /// Routes of every pass the next run will encode.
    pub fn plan(&self) -> Vec<PlannedPass> {
        plan_chain(&self.specs())
    }

    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            live_slots: self.pool.live_slots(),
            allocations: self.pool.allocations(),
        }
    }

    /// Runs the whole chain over `image` and presents the result on `surface`.
    ///
    /// The surface is sized to the image. Every pass is encoded into one
    /// command buffer; if any pass fails nothing is submitted and nothing is
    /// presented.
    pub fn apply_to<S>(&mut self, image: &RgbaImage, surface: &mut S) -> Result<(), PipelineError>
    where
        S: RenderSurface + ?Sized,
    {
        if self.filters.is_empty() {
            return Err(PipelineError::EmptyChain);
        }
        let size = OutputSize::new(image.width(), image.height())?;
        let max = self.context.max_texture_dimension();
        if size.width > max || size.height > max {
            return Err(PipelineError::ImageTooLarge {
                width: size.width,
                height: size.height,
                max,
            });
        }
        if surface.format() != self.output_format {
            return Err(PipelineError::FormatMismatch {
                expected: self.output_format,
                actual: surface.format(),
            });
        }

        let context = self.context;
        let device = context.device();
        let queue = context.queue();
        let total = self.total_passes();
        tracing::debug!(%size, filters = self.filters.len(), passes = total, "applying filter chain");

        surface.resize(device, size);
        self.pool.prepare(size);
        let source = SourceTexture::upload(device, queue, &self.layouts, image, size);
        let frame = surface.acquire()?;

        let filters = &self.filters;
        let pool = &mut self.pool;
        let layouts = &self.layouts;
        let quad = &self.quad;
        let (result, error) = with_validation_scope(device, || -> Result<(), PipelineError> {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("filter chain encoder"),
            });
            let mut dispatcher = PassDispatcher {
                device,
                layouts,
                quad,
                pool,
                source: &source.bind_group,
                target: &frame.view,
                size,
                schedule: PassSchedule::new(total),
                encoder: &mut encoder,
            };
            for filter in filters {
                for pass in 0..filter.pass_count() {
                    filter.draw_pass(pass, &mut dispatcher)?;
                }
            }
            dispatcher.finish()?;
            queue.submit(std::iter::once(encoder.finish()));
            Ok(())
        });
        result?;
        if let Some(error) = error {
            return Err(PipelineError::Render(error.to_string()));
        }

        surface.present(frame);
        Ok(())
    }
}

/// Source image uploaded for one run.
struct SourceTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl SourceTexture {
    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &PassLayouts,
        image: &RgbaImage,
        size: OutputSize,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("source image"),
                size: size.extent(),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: INTERMEDIATE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            image.as_raw(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = layouts.input_bind_group(device, &view, "source image input");
        Self {
            _texture: texture,
            bind_group,
        }
    }
}

/// Encodes passes for one run, choosing input and output of each pass from
/// the chain-wide schedule.
pub(crate) struct PassDispatcher<'a> {
    device: &'a wgpu::Device,
    layouts: &'a PassLayouts,
    quad: &'a QuadGeometry,
    pool: &'a mut ResourcePool,
    source: &'a wgpu::BindGroup,
    target: &'a wgpu::TextureView,
    size: OutputSize,
    schedule: PassSchedule,
    encoder: &'a mut wgpu::CommandEncoder,
}

impl PassDispatcher<'_> {
    /// Output size of the run being encoded.
    pub fn size(&self) -> OutputSize {
        self.size
    }

    /// Encodes the next pass of the chain with `program`.
    ///
    /// `params` is copied into the program's uniform buffer on the encoder,
    /// so passes sharing a program each see their own values.
    pub fn dispatch(
        &mut self,
        program: &FilterProgram,
        params: Option<&[u8]>,
    ) -> Result<PassRoute, PipelineError> {
        let route = self.schedule.advance()?;
        if let PassOutput::Slot(index) = route.output {
            self.pool.ensure(self.device, self.layouts, index)?;
        }

        if let (Some(bytes), Some(binding)) = (params, program.params()) {
            let staging = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("pass params staging"),
                    contents: bytes,
                    usage: wgpu::BufferUsages::COPY_SRC,
                });
            self.encoder.copy_buffer_to_buffer(
                &staging,
                0,
                &binding.buffer,
                0,
                bytes.len() as wgpu::BufferAddress,
            );
        }

        let input = match route.input {
            PassInput::Source => self.source,
            PassInput::Slot(index) => &self.pool.slot(index)?.bind_group,
        };
        let output = match route.output {
            PassOutput::Surface => self.target,
            PassOutput::Slot(index) => &self.pool.slot(index)?.view,
        };
        tracing::trace!(program = program.label(), %route, "encoding pass");

        let mut render_pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(program.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(program.pipeline_for(route.output));
        render_pass.set_vertex_buffer(0, self.quad.buffer.slice(..));
        render_pass.set_bind_group(0, input, &[]);
        if let Some(binding) = program.params() {
            render_pass.set_bind_group(1, &binding.bind_group, &[]);
        }
        render_pass.set_viewport(
            0.0,
            0.0,
            self.size.width as f32,
            self.size.height as f32,
            0.0,
            1.0,
        );
        render_pass.draw(0..self.quad.vertex_count(), 0..1);

        Ok(route)
    }

    /// Fails unless every scheduled pass was encoded.
    pub fn finish(&self) -> Result<(), PipelineError> {
        self.schedule.finish()
    }
}
