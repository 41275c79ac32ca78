//! Visible outputs the final pass of a chain renders into.

use image::RgbaImage;

use crate::error::PipelineError;
use crate::types::OutputSize;

use super::context::GpuContext;

/// A frame acquired from a [`RenderSurface`] for one pipeline run.
pub struct SurfaceFrame {
    pub(crate) view: wgpu::TextureView,
    presentable: Option<wgpu::SurfaceTexture>,
}

/// Destination of the last pass of a pipeline run.
pub trait RenderSurface {
    /// Texture format of the frames this surface hands out.
    fn format(&self) -> wgpu::TextureFormat;

    /// Current size, once the surface has been sized.
    fn size(&self) -> Option<OutputSize>;

    /// Matches the surface to the dimensions of the image being filtered.
    fn resize(&mut self, device: &wgpu::Device, size: OutputSize);

    /// Acquires the frame the final pass writes to.
    fn acquire(&mut self) -> Result<SurfaceFrame, PipelineError>;

    /// Called once the passes writing `frame` have been submitted.
    fn present(&mut self, frame: SurfaceFrame);
}

/// Renders into an owned texture whose pixels can be read back.
pub struct OffscreenSurface {
    texture: Option<wgpu::Texture>,
    size: Option<OutputSize>,
}

impl OffscreenSurface {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new() -> Self {
        Self {
            texture: None,
            size: None,
        }
    }

    /// Copies the last rendered frame back to the CPU.
    ///
    /// Blocks until the GPU has finished the copy.
    pub fn read_pixels(&self, context: &GpuContext) -> Result<RgbaImage, PipelineError> {
        let (Some(texture), Some(size)) = (self.texture.as_ref(), self.size) else {
            return Err(PipelineError::Readback(
                "offscreen surface has not been rendered to".to_string(),
            ));
        };

        let device = context.device();
        let unpadded_bytes_per_row = size.width * 4;
        let padded_bytes_per_row = unpadded_bytes_per_row
            .div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("offscreen readback"),
            size: u64::from(padded_bytes_per_row) * u64::from(size.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("offscreen readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(size.height),
                },
            },
            size.extent(),
        );
        context.queue().submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait)
            .map_err(|err| PipelineError::Readback(err.to_string()))?;
        rx.recv()
            .map_err(|err| PipelineError::Readback(err.to_string()))?
            .map_err(|err| PipelineError::Readback(err.to_string()))?;

        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * size.height) as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks(padded_bytes_per_row as usize) {
                pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
            }
        }
        buffer.unmap();

        RgbaImage::from_raw(size.width, size.height, pixels).ok_or_else(|| {
            PipelineError::Readback(format!("pixel buffer does not match {size}"))
        })
    }
}

impl Default for OffscreenSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for OffscreenSurface {
    fn format(&self) -> wgpu::TextureFormat {
        Self::FORMAT
    }

    fn size(&self) -> Option<OutputSize> {
        self.size
    }

    fn resize(&mut self, device: &wgpu::Device, size: OutputSize) {
        if self.size == Some(size) && self.texture.is_some() {
            return;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen surface"),
            size: size.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        self.texture = Some(texture);
        self.size = Some(size);
    }

    fn acquire(&mut self) -> Result<SurfaceFrame, PipelineError> {
        let texture = self.texture.as_ref().ok_or_else(|| {
            PipelineError::Render("offscreen surface acquired before being sized".to_string())
        })?;
        Ok(SurfaceFrame {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            presentable: None,
        })
    }

    fn present(&mut self, _frame: SurfaceFrame) {}
}

/// Presents into a window through a configured `wgpu::Surface`.
pub struct WindowSurface {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl WindowSurface {
    pub(crate) fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        size: OutputSize,
    ) -> Result<Self, PipelineError> {
        let caps = surface.get_capabilities(adapter);
        // Filter output is written as-is; prefer a non-sRGB swapchain so the
        // bytes are not re-encoded on the way out.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| {
                PipelineError::SurfaceUnavailable("surface reports no supported formats".into())
            })?;
        if format.is_srgb() {
            tracing::warn!(?format, "no non-sRGB surface format available; output will be re-encoded");
        }
        let present_mode = caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Fifo)
            .unwrap_or(wgpu::PresentMode::AutoVsync);
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(device, &config);
        tracing::debug!(?format, ?present_mode, %size, "configured window surface");

        Ok(Self { surface, config })
    }

    /// Re-applies the current configuration after the surface was lost.
    pub fn reconfigure(&mut self, device: &wgpu::Device) {
        self.surface.configure(device, &self.config);
    }
}

impl RenderSurface for WindowSurface {
    fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn size(&self) -> Option<OutputSize> {
        OutputSize::new(self.config.width, self.config.height).ok()
    }

    fn resize(&mut self, device: &wgpu::Device, size: OutputSize) {
        if self.config.width == size.width && self.config.height == size.height {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(device, &self.config);
    }

    fn acquire(&mut self) -> Result<SurfaceFrame, PipelineError> {
        let texture = self.surface.get_current_texture()?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok(SurfaceFrame {
            view,
            presentable: Some(texture),
        })
    }

    fn present(&mut self, frame: SurfaceFrame) {
        if let Some(texture) = frame.presentable {
            texture.present();
        }
    }
}
