use anyhow::{Context, Result};
use clap::Args;
use rust_decimal::Decimal;
use std::path::Path;
use trailstop_indicators::{AmwTrendConfig, FilterKind};

/// Per-field overrides applied on top of the config file.
#[derive(Debug, Default, Args)]
pub struct ConfigOverrides {
    /// Smoothing period for the long-side true range filter
    #[arg(long)]
    pub period_long: Option<usize>,

    /// Multiplier on the long-side smoothed true range
    #[arg(long)]
    pub multiple_long: Option<Decimal>,

    /// Smoothing filter for the long side (wilder, ema, sma)
    #[arg(long)]
    pub filter_long: Option<FilterKind>,

    /// Smoothing period for the short-side true range filter
    #[arg(long)]
    pub period_short: Option<usize>,

    /// Multiplier on the short-side smoothed true range
    #[arg(long)]
    pub multiple_short: Option<Decimal>,

    /// Smoothing filter for the short side (wilder, ema, sma)
    #[arg(long)]
    pub filter_short: Option<FilterKind>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut AmwTrendConfig) {
        if let Some(p) = self.period_long {
            config.period_long = p;
        }
        if let Some(m) = self.multiple_long {
            config.multiple_long = m;
        }
        if let Some(k) = self.filter_long {
            config.filter_long = k;
        }
        if let Some(p) = self.period_short {
            config.period_short = p;
        }
        if let Some(m) = self.multiple_short {
            config.multiple_short = m;
        }
        if let Some(k) = self.filter_short {
            config.filter_short = k;
        }
    }
}

/// Read the indicator config from a TOML file, or fall back to defaults.
/// Missing keys take their default values.
pub fn load_config(path: Option<&Path>) -> Result<AmwTrendConfig> {
    let Some(path) = path else {
        return Ok(AmwTrendConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: AmwTrendConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    tracing::debug!(config = ?config, "Loaded indicator config");
    Ok(config)
}

pub fn default_config_toml() -> Result<String> {
    Ok(toml::to_string_pretty(&AmwTrendConfig::default())?)
}
