//! Effective run settings: layered config, then `HV_*` env, then CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use hv_api::Timeouts;
use hv_config::{load_layered_yaml, load_layered_yaml_from_strings, HvConfig};
use hv_match::Tolerance;

/// Flags that override config values when given.
#[derive(Debug, Clone, Default)]
pub struct FlagOverrides {
    pub out: Option<PathBuf>,
    pub no_header_txt: bool,
    pub max_delta_seconds: Option<f64>,
    pub failed_log: Option<PathBuf>,
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub base_url: String,
    pub timeouts: Timeouts,
    pub tolerance: Option<Tolerance>,
    pub out_root: PathBuf,
    pub save_header_txt: bool,
    pub failed_log: Option<PathBuf>,
    pub max_concurrency: usize,
    pub config_hash: String,
}

impl RunSettings {
    pub fn from_config(
        config: &HvConfig,
        config_hash: String,
        flags: &FlagOverrides,
    ) -> Result<Self> {
        let delta = flags
            .max_delta_seconds
            .or(config.matching.max_time_delta_seconds);
        let tolerance = delta
            .map(Tolerance::from_secs)
            .transpose()
            .context("invalid --max-delta-seconds")?;

        let max_concurrency = flags
            .max_concurrency
            .unwrap_or(config.fetch.max_concurrency);
        if max_concurrency == 0 {
            anyhow::bail!("max concurrency must be >= 1");
        }

        Ok(Self {
            base_url: config.api.base_url.clone(),
            timeouts: Timeouts {
                lookup: Duration::from_secs(config.api.lookup_timeout_secs),
                download: Duration::from_secs(config.api.download_timeout_secs),
            },
            tolerance,
            out_root: flags
                .out
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.output.root)),
            save_header_txt: config.output.save_header_txt && !flags.no_header_txt,
            failed_log: flags
                .failed_log
                .clone()
                .or_else(|| config.output.failed_log.as_ref().map(PathBuf::from)),
            max_concurrency,
            config_hash,
        })
    }
}

/// Load config layers (defaults when none), apply env overrides, then flags.
pub fn load(config_paths: &[String], flags: &FlagOverrides) -> Result<RunSettings> {
    let loaded = if config_paths.is_empty() {
        load_layered_yaml_from_strings(&[])?
    } else {
        let refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
        load_layered_yaml(&refs)?
    };

    let mut config = loaded.config;
    config.apply_env_overrides()?;
    RunSettings::from_config(&config, loaded.config_hash, flags)
}
