//! Runs filter chains on a real adapter and reads the pixels back.
//!
//! Every test skips (with a note on stderr) when no adapter, hardware or
//! software, can be created.

use image::{Rgba, RgbaImage};
use renderer::{
    FilterPipeline, FilterSpec, GpuContext, GpuPowerPreference, KernelNormalization,
    OffscreenSurface, PipelineError, MAX_BLUR_RADIUS,
};

fn context() -> Option<GpuContext> {
    match GpuContext::headless(GpuPowerPreference::Low) {
        Ok(context) => Some(context),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}

fn solid(width: u32, height: u32, colour: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(colour))
}

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
            255,
        ])
    })
}

fn max_channel_delta(a: &RgbaImage, b: &RgbaImage) -> u8 {
    a.as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| x.abs_diff(*y))
        .max()
        .unwrap_or(0)
}

fn run(context: &GpuContext, specs: &[FilterSpec], image: &RgbaImage) -> RgbaImage {
    let mut pipeline = FilterPipeline::new(context, OffscreenSurface::FORMAT).unwrap();
    for spec in specs {
        pipeline = pipeline.add(*spec).unwrap();
    }
    let mut surface = OffscreenSurface::new();
    pipeline.apply_to(image, &mut surface).unwrap();
    surface.read_pixels(context).unwrap()
}

#[test]
fn passthrough_reproduces_the_source() {
    let Some(context) = context() else { return };
    let image = gradient(37, 21);
    let output = run(&context, &[FilterSpec::Passthrough], &image);
    assert_eq!(output.dimensions(), image.dimensions());
    assert!(max_channel_delta(&output, &image) <= 1);
}

#[test]
fn passthrough_chain_keeps_orientation() {
    let Some(context) = context() else { return };
    let mut image = solid(16, 16, [0, 0, 0, 255]);
    image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    image.put_pixel(15, 15, Rgba([0, 0, 255, 255]));
    let output = run(&context, &[FilterSpec::Passthrough; 3], &image);
    assert_eq!(output.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    assert_eq!(output.get_pixel(15, 15), &Rgba([0, 0, 255, 255]));
}

#[test]
fn zero_radius_blur_is_identity() {
    let Some(context) = context() else { return };
    let image = gradient(24, 24);
    let blur = FilterSpec::GaussianBlur {
        radius: 0,
        normalization: KernelNormalization::Exact,
    };
    let output = run(&context, &[blur], &image);
    assert!(max_channel_delta(&output, &image) <= 1);
}

#[test]
fn exact_blur_leaves_solid_colour_unchanged() {
    let Some(context) = context() else { return };
    let image = solid(32, 32, [200, 40, 90, 255]);
    let blur = FilterSpec::GaussianBlur {
        radius: 5,
        normalization: KernelNormalization::Exact,
    };
    let output = run(&context, &[blur, FilterSpec::Passthrough], &image);
    assert!(max_channel_delta(&output, &image) <= 2);
}

#[test]
fn legacy_blur_darkens_solid_colour() {
    let Some(context) = context() else { return };
    let image = solid(32, 32, [200, 200, 200, 255]);
    let blur = FilterSpec::GaussianBlur {
        radius: 4,
        normalization: KernelNormalization::Legacy,
    };
    let output = run(&context, &[blur], &image);
    let centre = output.get_pixel(16, 16);
    assert!(centre[0] < 200, "legacy kernel should lose energy, got {centre:?}");
}

#[test]
fn blur_spreads_a_single_bright_pixel() {
    let Some(context) = context() else { return };
    let mut image = solid(21, 21, [0, 0, 0, 255]);
    image.put_pixel(10, 10, Rgba([255, 255, 255, 255]));
    let output = run(&context, &[FilterSpec::GaussianBlur {
        radius: 3,
        normalization: KernelNormalization::Exact,
    }], &image);
    let centre = output.get_pixel(10, 10)[0];
    let neighbour = output.get_pixel(11, 10)[0];
    let far = output.get_pixel(18, 10)[0];
    assert!(centre < 255);
    assert!(neighbour > 0);
    assert!(neighbour <= centre);
    assert_eq!(far, 0);
}

#[test]
fn pool_is_rebuilt_when_output_size_changes() {
    let Some(context) = context() else { return };
    let mut pipeline = FilterPipeline::new(&context, OffscreenSurface::FORMAT)
        .unwrap()
        .add_gaussian_blur(2)
        .unwrap()
        .add_passthrough()
        .unwrap();
    let mut surface = OffscreenSurface::new();

    pipeline.apply_to(&gradient(20, 10), &mut surface).unwrap();
    let first = pipeline.pool_stats();
    assert_eq!(first.live_slots, 2);
    assert_eq!(first.allocations, 2);

    pipeline.apply_to(&gradient(20, 10), &mut surface).unwrap();
    assert_eq!(pipeline.pool_stats().allocations, 2);

    let larger = solid(40, 30, [10, 20, 30, 255]);
    pipeline.apply_to(&larger, &mut surface).unwrap();
    let stats = pipeline.pool_stats();
    assert_eq!(stats.allocations, 4);
    assert_eq!(stats.size.map(|size| (size.width, size.height)), Some((40, 30)));

    let output = surface.read_pixels(&context).unwrap();
    assert_eq!(output.dimensions(), (40, 30));
    assert!(max_channel_delta(&output, &larger) <= 2);
}

#[test]
fn empty_chain_is_rejected() {
    let Some(context) = context() else { return };
    let mut pipeline = FilterPipeline::new(&context, OffscreenSurface::FORMAT).unwrap();
    let mut surface = OffscreenSurface::new();
    let err = pipeline
        .apply_to(&gradient(4, 4), &mut surface)
        .unwrap_err();
    assert!(matches!(err, PipelineError::EmptyChain));
}

#[test]
fn oversized_radius_is_rejected() {
    let Some(context) = context() else { return };
    let err = FilterPipeline::new(&context, OffscreenSurface::FORMAT)
        .unwrap()
        .add_gaussian_blur(MAX_BLUR_RADIUS + 1)
        .err()
        .expect("radius above the maximum must fail");
    assert!(matches!(err, PipelineError::InvalidRadius { .. }));
}

#[test]
fn empty_image_is_rejected() {
    let Some(context) = context() else { return };
    let mut pipeline = FilterPipeline::new(&context, OffscreenSurface::FORMAT)
        .unwrap()
        .add_passthrough()
        .unwrap();
    let mut surface = OffscreenSurface::new();
    let err = pipeline
        .apply_to(&RgbaImage::new(0, 8), &mut surface)
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidImage { width: 0, height: 8 }));
}

#[test]
fn surface_format_must_match_the_pipeline() {
    let Some(context) = context() else { return };
    let mut pipeline = FilterPipeline::new(&context, wgpu_bgra())
        .unwrap()
        .add_passthrough()
        .unwrap();
    let mut surface = OffscreenSurface::new();
    let err = pipeline
        .apply_to(&gradient(4, 4), &mut surface)
        .unwrap_err();
    assert!(matches!(err, PipelineError::FormatMismatch { .. }));
}

fn wgpu_bgra() -> wgpu::TextureFormat {
    wgpu::TextureFormat::Bgra8Unorm
}
