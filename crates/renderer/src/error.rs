/// Failures surfaced by the filter pipeline.
///
/// Construction-time variants (adapter, shader, radius) abort pipeline
/// construction; run-time variants abort the remaining passes of an
/// `apply_to` call without presenting a partial result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to find a suitable GPU adapter: {0}")]
    AdapterUnavailable(String),
    #[error("failed to create GPU device: {0}")]
    DeviceUnavailable(String),
    #[error("failed to create rendering surface: {0}")]
    SurfaceUnavailable(String),
    #[error("shader '{label}' failed to compile:\n{message}")]
    ShaderCompile { label: String, message: String },
    #[error("program '{label}' failed to link: {message}")]
    ShaderLink { label: String, message: String },
    #[error("blur radius {radius} is out of range (0..={max})")]
    InvalidRadius { radius: u32, max: u32 },
    #[error("filter chain is empty; add at least one filter before applying it")]
    EmptyChain,
    #[error("source image has invalid dimensions {width}x{height}")]
    InvalidImage { width: u32, height: u32 },
    #[error("source image {width}x{height} exceeds the GPU max texture dimension {max}")]
    ImageTooLarge { width: u32, height: u32, max: u32 },
    #[error("resource pool slot {0} does not exist (expected 0 or 1)")]
    InvalidSlot(usize),
    #[error("pass schedule exhausted after {total} passes")]
    ScheduleExhausted { total: usize },
    #[error("pass schedule incomplete: issued {issued} of {total} passes")]
    IncompleteSchedule { issued: usize, total: usize },
    #[error("surface format {actual:?} does not match the pipeline output format {expected:?}")]
    FormatMismatch {
        expected: wgpu::TextureFormat,
        actual: wgpu::TextureFormat,
    },
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("GPU rejected the filter passes: {0}")]
    Render(String),
    #[error("failed to read back rendered pixels: {0}")]
    Readback(String),
}

impl PipelineError {
    /// Returns the underlying surface error when frame acquisition failed.
    pub fn as_surface_error(&self) -> Option<&wgpu::SurfaceError> {
        match self {
            PipelineError::Surface(err) => Some(err),
            _ => None,
        }
    }
}
