use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use image::RgbaImage;
use renderer::{
    plan_chain, FilterPipeline, FilterSpec, GpuContext, GpuPowerPreference, OffscreenSurface,
    PreviewConfig,
};
use tracing_subscriber::EnvFilter;

use crate::chain::resolve_chain;
use crate::cli::{PlanArgs, RunArgs};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let input = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("missing INPUT image; run `swiftfx --help` for usage"))?;
    if args.output.is_none() && !args.window {
        bail!("nothing to do: pass --output PATH.png and/or --window");
    }

    let specs = resolve_chain(&args.chain)?;
    let image = load_image(input)?;
    tracing::info!(
        input = %input.display(),
        width = image.width(),
        height = image.height(),
        filters = specs.len(),
        "loaded source image"
    );

    if let Some(output) = args.output.as_deref() {
        render_to_file(&image, &specs, output, args.power)?;
    }

    if args.window {
        let config = PreviewConfig {
            title: format!("swiftfx: {}", input.display()),
            power: args.power,
        };
        renderer::run_preview(image, &specs, &config)?;
    }

    Ok(())
}

pub fn plan(args: PlanArgs) -> Result<()> {
    let specs = resolve_chain(&args.chain)?;
    let planned = plan_chain(&specs);
    println!("{} filters, {} passes", specs.len(), planned.len());
    for pass in planned {
        println!(
            "  {:<32} {} (#{} pass {}/{})",
            pass.route.to_string(),
            pass.filter.name(),
            pass.filter_index + 1,
            pass.local_pass + 1,
            pass.filter.pass_count()
        );
    }
    Ok(())
}

fn load_image(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?;
    Ok(image.to_rgba8())
}

fn render_to_file(
    image: &RgbaImage,
    specs: &[FilterSpec],
    output: &Path,
    power: GpuPowerPreference,
) -> Result<()> {
    let started = Instant::now();
    let context = GpuContext::headless(power).context("failed to initialise GPU")?;
    let profile = context.adapter_profile();
    if profile.is_software() {
        tracing::warn!(adapter = %profile.name, "rendering on a software adapter; expect slow output");
    }

    let mut pipeline = FilterPipeline::new(&context, OffscreenSurface::FORMAT)?;
    for spec in specs {
        pipeline = pipeline
            .add(*spec)
            .with_context(|| format!("failed to build filter {spec}"))?;
    }

    let mut surface = OffscreenSurface::new();
    pipeline
        .apply_to(image, &mut surface)
        .context("failed to apply filter chain")?;
    let filtered = surface.read_pixels(&context)?;
    filtered
        .save_with_format(output, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(
        output = %output.display(),
        passes = pipeline.total_passes(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "wrote filtered image"
    );
    Ok(())
}
