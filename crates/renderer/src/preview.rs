//! Interactive window that shows a filtered image until it is closed.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use crate::gpu::{GpuContext, RenderSurface};
use crate::pipeline::FilterPipeline;
use crate::types::{FilterSpec, GpuPowerPreference, OutputSize};

/// Settings for [`run_preview`].
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub title: String,
    pub power: GpuPowerPreference,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            title: "swiftfx preview".to_string(),
            power: GpuPowerPreference::default(),
        }
    }
}

/// Opens a window sized to `image`, renders the filter chain into it on
/// every redraw, and blocks until the window is closed or Escape is pressed.
pub fn run_preview(image: RgbaImage, specs: &[FilterSpec], config: &PreviewConfig) -> Result<()> {
    let size = OutputSize::new(image.width(), image.height())?;
    let event_loop = EventLoopBuilder::new()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title(&config.title)
        .with_inner_size(PhysicalSize::new(size.width, size.height))
        .with_resizable(false)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let (context, mut surface) = GpuContext::for_window(window.clone(), size, config.power)
        .context("failed to initialise window renderer")?;
    let profile = context.adapter_profile();
    tracing::info!(adapter = %profile.name, backend = ?profile.backend, %size, "opened preview window");

    let mut pipeline = FilterPipeline::new(&context, surface.format())?;
    for spec in specs {
        pipeline = pipeline.add(*spec)?;
    }

    let mut result = Ok(());
    let run_result = event_loop.run(|event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);
        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed
                        && matches!(event.logical_key, Key::Named(NamedKey::Escape))
                    {
                        elwt.exit();
                    }
                }
                WindowEvent::Resized(_) => window.request_redraw(),
                WindowEvent::RedrawRequested => {
                    let Err(err) = pipeline.apply_to(&image, &mut surface) else {
                        return;
                    };
                    match err.as_surface_error() {
                        Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            tracing::debug!("surface lost; reconfiguring");
                            surface.reconfigure(context.device());
                            window.request_redraw();
                        }
                        Some(wgpu::SurfaceError::Timeout) => {
                            tracing::warn!("surface timeout; retrying next frame");
                            window.request_redraw();
                        }
                        _ => {
                            tracing::error!(error = %err, "failed to render preview");
                            result = Err(anyhow::Error::new(err));
                            elwt.exit();
                        }
                    }
                }
                _ => {}
            },
            _ => {}
        }
    });

    if let Err(err) = run_result {
        return Err(anyhow!("window event loop error: {err}"));
    }
    result
}
