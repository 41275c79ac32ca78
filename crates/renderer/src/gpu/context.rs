use std::sync::Arc;

use winit::window::Window;

use crate::error::PipelineError;
use crate::types::{GpuPowerPreference, OutputSize};

use super::surface::WindowSurface;

/// Summary of the adapter a context was created on.
#[derive(Debug, Clone)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    fn from_wgpu(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
    }
}

/// Device and queue every pipeline object is created from.
///
/// A context is either headless (offscreen rendering, tests) or tied to a
/// window surface it was created for.
pub struct GpuContext {
    _instance: wgpu::Instance,
    device: wgpu::Device,
    queue: wgpu::Queue,
    limits: wgpu::Limits,
    profile: AdapterProfile,
}

impl GpuContext {
    /// Creates a context with no presentation surface.
    ///
    /// Falls back to a software adapter when no hardware adapter is present.
    pub fn headless(power: GpuPowerPreference) -> Result<Self, PipelineError> {
        let instance = create_instance();
        let adapter = match request_adapter(&instance, power, None, false) {
            Ok(adapter) => adapter,
            Err(err) => {
                tracing::warn!(error = %err, "no hardware adapter available; trying fallback adapter");
                request_adapter(&instance, power, None, true)?
            }
        };
        Self::from_adapter(instance, &adapter)
    }

    /// Creates a context able to present into `window`, along with the
    /// window's surface sized to `initial_size`.
    pub fn for_window(
        window: Arc<Window>,
        initial_size: OutputSize,
        power: GpuPowerPreference,
    ) -> Result<(Self, WindowSurface), PipelineError> {
        let instance = create_instance();
        let surface = instance
            .create_surface(window)
            .map_err(|err| PipelineError::SurfaceUnavailable(err.to_string()))?;
        let adapter = request_adapter(&instance, power, Some(&surface), false)?;
        let context = Self::from_adapter(instance, &adapter)?;
        let surface = WindowSurface::new(surface, &adapter, &context.device, initial_size)?;
        Ok((context, surface))
    }

    fn from_adapter(instance: wgpu::Instance, adapter: &wgpu::Adapter) -> Result<Self, PipelineError> {
        let profile = AdapterProfile::from_wgpu(&adapter.get_info());
        tracing::debug!(
            name = %profile.name,
            backend = ?profile.backend,
            device_type = ?profile.device_type,
            is_software = profile.is_software(),
            "selected GPU adapter"
        );

        let limits = adapter.limits();
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("swiftfx device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .map_err(|err| PipelineError::DeviceUnavailable(err.to_string()))?;

        Ok(Self {
            _instance: instance,
            device,
            queue,
            limits,
            profile,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter_profile(&self) -> &AdapterProfile {
        &self.profile
    }

    /// Largest width or height a source image may have on this device.
    pub fn max_texture_dimension(&self) -> u32 {
        self.limits.max_texture_dimension_2d
    }
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        flags: wgpu::InstanceFlags::default(),
        memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        backend_options: wgpu::BackendOptions::default(),
    })
}

fn request_adapter(
    instance: &wgpu::Instance,
    power: GpuPowerPreference,
    compatible_surface: Option<&wgpu::Surface<'_>>,
    force_fallback_adapter: bool,
) -> Result<wgpu::Adapter, PipelineError> {
    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: power.to_wgpu(),
        compatible_surface,
        force_fallback_adapter,
    }))
    .map_err(|err| PipelineError::AdapterUnavailable(err.to_string()))
}
