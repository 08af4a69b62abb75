use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use data_contracts::Split;
use tryon_dataset::{AlignmentPolicy, DatasetConfig};

/// Dataset selection shared by every tool. Flags override the config file.
#[derive(Debug, Clone, Args)]
pub struct DatasetArgs {
    /// Config file (defaults to $TRYON_DATASET_CONFIG, then ./tryon-dataset.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Dataset root directory.
    #[arg(long)]
    pub root: Option<PathBuf>,
    /// Split to read: train or test.
    #[arg(long)]
    pub split: Option<Split>,
    /// Require per-frame file numbers to agree, not only counts.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
    /// Image size WxH for loaded image modalities (e.g., 192x256).
    #[arg(long, value_parser = parse_fine_size)]
    pub fine_size: Option<(u32, u32)>,
}

impl DatasetArgs {
    pub fn load_config(&self) -> Result<DatasetConfig> {
        let mut cfg = match &self.config {
            Some(path) => DatasetConfig::from_path(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => DatasetConfig::load().context("loading dataset config")?,
        };
        if let Some(root) = &self.root {
            cfg.root = root.clone();
        }
        if let Some(split) = self.split {
            cfg.split = split;
        }
        if self.strict {
            cfg.policy = AlignmentPolicy::StrictFrameNumbers;
        }
        if let Some(size) = self.fine_size {
            cfg.fine_size = size;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

pub fn parse_fine_size(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<_> = s.split('x').collect();
    if parts.len() != 2 {
        return Err("expected WxH".into());
    }
    let w = parts[0]
        .parse::<u32>()
        .map_err(|_| "width must be u32".to_string())?;
    let h = parts[1]
        .parse::<u32>()
        .map_err(|_| "height must be u32".to_string())?;
    if w == 0 || h == 0 {
        return Err("width and height must be non-zero".into());
    }
    Ok((w, h))
}

/// Log to stderr; `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
