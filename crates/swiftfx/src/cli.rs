use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use renderer::{GpuPowerPreference, KernelNormalization, MAX_BLUR_RADIUS};

#[derive(Parser, Debug)]
#[command(
    name = "swiftfx",
    author,
    version,
    about = "Run still images through GPU filter chains",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image to filter (PNG, JPEG, BMP or GIF).
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub chain: ChainArgs,

    /// Render offscreen and write the result to this PNG path.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Show the filtered image in a preview window.
    #[arg(long)]
    pub window: bool,

    /// GPU adapter preference: `low` (integrated) or `high` (discrete).
    #[arg(
        long,
        value_name = "low|high",
        env = "SWIFTFX_GPU_POWER",
        value_parser = parse_power,
        default_value = "high"
    )]
    pub power: GpuPowerPreference,
}

/// Filter chain selection shared by rendering and `plan`.
#[derive(Args, Debug, Default)]
pub struct ChainArgs {
    /// Append a filter stage: `blur:RADIUS[:exact|legacy]` or `passthrough`. Repeatable.
    #[arg(long = "filter", value_name = "FILTER", value_parser = parse_filter)]
    pub filters: Vec<FilterArg>,

    /// Load the filter chain from a TOML file instead of `--filter` flags.
    #[arg(long, value_name = "FILE", conflicts_with = "filters")]
    pub chain: Option<PathBuf>,

    /// Kernel normalization for blur stages that do not name one.
    #[arg(
        long,
        value_name = "exact|legacy",
        value_parser = parse_normalization,
        default_value = "exact"
    )]
    pub normalization: KernelNormalization,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the pass routing of a filter chain without touching the GPU.
    Plan(PlanArgs),
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub chain: ChainArgs,
}

/// A filter stage as written on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterArg {
    Blur {
        radius: u32,
        normalization: Option<KernelNormalization>,
    },
    Passthrough,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_filter(value: &str) -> Result<FilterArg, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("filter must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    let mut parts = normalized.split(':');
    let kind = parts.next().unwrap_or_default();
    match kind {
        "passthrough" | "copy" => {
            if parts.next().is_some() {
                return Err("passthrough takes no parameters".to_string());
            }
            Ok(FilterArg::Passthrough)
        }
        "blur" | "gaussian-blur" => {
            let radius = parts
                .next()
                .ok_or_else(|| "blur requires a radius (e.g. blur:6)".to_string())?;
            let radius: u32 = radius
                .parse()
                .map_err(|_| format!("invalid blur radius '{radius}'"))?;
            if radius > MAX_BLUR_RADIUS {
                return Err(format!(
                    "blur radius {radius} exceeds the maximum of {MAX_BLUR_RADIUS}"
                ));
            }
            let normalization = parts.next().map(parse_normalization).transpose()?;
            if parts.next().is_some() {
                return Err(format!("unexpected trailing parameters in '{trimmed}'"));
            }
            Ok(FilterArg::Blur {
                radius,
                normalization,
            })
        }
        other => Err(format!(
            "unknown filter '{other}'; expected blur:RADIUS[:exact|legacy] or passthrough"
        )),
    }
}

pub fn parse_normalization(value: &str) -> Result<KernelNormalization, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "exact" => Ok(KernelNormalization::Exact),
        "legacy" => Ok(KernelNormalization::Legacy),
        other => Err(format!(
            "unknown kernel normalization '{other}' (expected exact or legacy)"
        )),
    }
}

pub fn parse_power(value: &str) -> Result<GpuPowerPreference, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" | "integrated" => Ok(GpuPowerPreference::Low),
        "high" | "high-performance" | "discrete" => Ok(GpuPowerPreference::High),
        other => Err(format!("unknown GPU power preference '{other}' (expected low or high)")),
    }
}
