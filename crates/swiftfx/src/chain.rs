use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chainconfig::{ChainConfig, FilterStage, Normalization};
use renderer::{FilterSpec, KernelNormalization, MAX_BLUR_RADIUS};

use crate::cli::{ChainArgs, FilterArg};

/// Builds the filter chain from either `--chain` or the `--filter` flags.
pub fn resolve_chain(args: &ChainArgs) -> Result<Vec<FilterSpec>> {
    let specs = match &args.chain {
        Some(path) => {
            let config = load_chain_file(path)?;
            config
                .filters
                .iter()
                .map(|stage| spec_from_stage(stage, args.normalization))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("invalid filter chain in {}", path.display()))?
        }
        None => args
            .filters
            .iter()
            .map(|filter| spec_from_arg(*filter, args.normalization))
            .collect(),
    };

    if specs.is_empty() {
        bail!("no filters given; pass --filter (e.g. --filter blur:6) or --chain FILE");
    }
    Ok(specs)
}

fn load_chain_file(path: &Path) -> Result<ChainConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read filter chain {}", path.display()))?;
    let config = ChainConfig::from_toml_str(&text)
        .with_context(|| format!("failed to load filter chain {}", path.display()))?;
    tracing::debug!(path = %path.display(), stages = config.filters.len(), "loaded filter chain");
    Ok(config)
}

pub fn spec_from_arg(filter: FilterArg, default: KernelNormalization) -> FilterSpec {
    match filter {
        FilterArg::Passthrough => FilterSpec::Passthrough,
        FilterArg::Blur {
            radius,
            normalization,
        } => FilterSpec::GaussianBlur {
            radius,
            normalization: normalization.unwrap_or(default),
        },
    }
}

pub fn spec_from_stage(stage: &FilterStage, default: KernelNormalization) -> Result<FilterSpec> {
    match stage {
        FilterStage::Passthrough => Ok(FilterSpec::Passthrough),
        FilterStage::GaussianBlur {
            radius,
            normalization,
        } => {
            if *radius > MAX_BLUR_RADIUS {
                bail!("blur radius {radius} exceeds the maximum of {MAX_BLUR_RADIUS}");
            }
            Ok(FilterSpec::GaussianBlur {
                radius: *radius,
                normalization: normalization.map(map_normalization).unwrap_or(default),
            })
        }
    }
}

fn map_normalization(normalization: Normalization) -> KernelNormalization {
    match normalization {
        Normalization::Exact => KernelNormalization::Exact,
        Normalization::Legacy => KernelNormalization::Legacy,
    }
}
