use crate::error::PipelineError;
use crate::types::OutputSize;

use super::layouts::PassLayouts;

/// Storage format of the ping-pong textures.
pub(crate) const INTERMEDIATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Number of ping-pong slots.
pub(crate) const SLOT_COUNT: usize = 2;

/// One off-screen render target: the texture, the view passes render into,
/// and the bind group later passes sample it through.
pub(crate) struct PoolSlot {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
}

impl PoolSlot {
    fn new(
        device: &wgpu::Device,
        layouts: &PassLayouts,
        index: usize,
        size: OutputSize,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("ping-pong texture #{index}")),
            size: size.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: INTERMEDIATE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group =
            layouts.input_bind_group(device, &view, &format!("ping-pong input #{index}"));
        Self {
            _texture: texture,
            view,
            bind_group,
        }
    }
}

/// Lazily allocated ping-pong render targets.
///
/// Slots are sized for the output of the run that first needed them. A run
/// with different dimensions drops both slots so they are rebuilt at the new
/// size instead of being sampled with stale extents.
pub(crate) struct ResourcePool {
    size: Option<OutputSize>,
    slots: [Option<PoolSlot>; SLOT_COUNT],
    allocations: usize,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self {
            size: None,
            slots: std::array::from_fn(|_| None),
            allocations: 0,
        }
    }

    /// Binds the pool to `size`. Returns `true` when existing slots were
    /// invalidated because the size changed.
    pub fn prepare(&mut self, size: OutputSize) -> bool {
        if self.size == Some(size) {
            return false;
        }

        let invalidated = self.slots.iter().any(Option::is_some);
        if invalidated {
            tracing::debug!(
                previous = ?self.size,
                next = %size,
                "output size changed; dropping ping-pong slots"
            );
        }
        self.slots = std::array::from_fn(|_| None);
        self.size = Some(size);
        invalidated
    }

    /// Allocates slot `index` if it does not exist yet.
    pub fn ensure(
        &mut self,
        device: &wgpu::Device,
        layouts: &PassLayouts,
        index: usize,
    ) -> Result<(), PipelineError> {
        let size = self.size.ok_or_else(|| {
            PipelineError::Render("resource pool used before an output size was set".to_string())
        })?;
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(PipelineError::InvalidSlot(index))?;
        if slot.is_none() {
            tracing::debug!(slot = index, %size, "allocating ping-pong slot");
            *slot = Some(PoolSlot::new(device, layouts, index, size));
            self.allocations += 1;
        }
        Ok(())
    }

    /// Returns an allocated slot. Call [`ResourcePool::ensure`] first.
    pub fn slot(&self, index: usize) -> Result<&PoolSlot, PipelineError> {
        self.slots
            .get(index)
            .ok_or(PipelineError::InvalidSlot(index))?
            .as_ref()
            .ok_or(PipelineError::InvalidSlot(index))
    }

    pub fn size(&self) -> Option<OutputSize> {
        self.size
    }

    /// Number of slots currently holding GPU resources.
    pub fn live_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Total slot allocations over the pool's lifetime.
    pub fn allocations(&self) -> usize {
        self.allocations
    }
}
