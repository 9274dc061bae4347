//! hv-config
//!
//! Layered YAML configuration for the heliofits tools.
//!
//! Layers are merged in order (later documents override earlier ones, objects
//! merge key by key), hashed over their canonical JSON form, then decoded into
//! a typed [`HvConfig`]. Unknown keys are rejected so a typo in a layer never
//! silently falls back to a default.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;

pub const ENV_BASE_URL: &str = "HV_BASE_URL";
pub const ENV_MAX_CONCURRENCY: &str = "HV_MAX_CONCURRENCY";
pub const ENV_MAX_TIME_DELTA: &str = "HV_MAX_TIME_DELTA_SECONDS";

// ---------------------------------------------------------------------------
// Typed config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HvConfig {
    pub api: ApiConfig,
    pub matching: MatchingConfig,
    pub output: OutputConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    pub lookup_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.helioviewer.org/v2/".to_string(),
            lookup_timeout_secs: 60,
            download_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchingConfig {
    /// `None` accepts a closest image at any distance.
    pub max_time_delta_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub root: String,
    pub save_header_txt: bool,
    /// Append skipped/failed dates here when set.
    pub failed_log: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            save_header_txt: true,
            failed_log: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Upper bound on dates processed at once.
    pub max_concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { max_concurrency: 4 }
    }
}

impl HvConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            bail!("CONFIG_INVALID api.base_url must not be empty");
        }
        if self.api.lookup_timeout_secs == 0 || self.api.download_timeout_secs == 0 {
            bail!("CONFIG_INVALID api timeouts must be > 0");
        }
        if let Some(d) = self.matching.max_time_delta_seconds {
            if !d.is_finite() || d < 0.0 {
                bail!(
                    "CONFIG_INVALID matching.max_time_delta_seconds must be >= 0, got {}",
                    d
                );
            }
        }
        if self.fetch.max_concurrency == 0 {
            bail!("CONFIG_INVALID fetch.max_concurrency must be >= 1");
        }
        Ok(())
    }

    /// Apply `HV_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_from(|k| std::env::var(k).ok())
    }

    pub fn apply_env_overrides_from<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = v.trim().to_string();
        }
        if let Some(v) = get(ENV_MAX_CONCURRENCY) {
            self.fetch.max_concurrency = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MAX_CONCURRENCY} must be an integer, got '{v}'"))?;
        }
        if let Some(v) = get(ENV_MAX_TIME_DELTA) {
            let secs: f64 = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MAX_TIME_DELTA} must be a number, got '{v}'"))?;
            self.matching.max_time_delta_seconds = Some(secs);
        }
        self.validate()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config: HvConfig,
}

/// Read each file, then merge as [`load_layered_yaml_from_strings`] does.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<String>>>()?;
    load_layered_yaml_from_strings(&docs.iter().map(String::as_str).collect::<Vec<_>>())
}

/// Later layers override earlier ones key by key. No layers yields the defaults.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Map::new());
    for (i, raw) in yaml_docs.iter().enumerate() {
        let layer: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {i}"))?;
        // an empty document parses as null; treat it as an empty layer
        if layer.is_null() {
            continue;
        }
        merge_layer(
            &mut merged,
            serde_json::to_value(layer).context("yaml->json conversion failed")?,
        );
    }

    let config: HvConfig =
        serde_json::from_value(merged.clone()).context("CONFIG_INVALID layered config")?;
    config.validate()?;

    let canonical_json = serde_json::to_string(&sorted_keys(&merged))
        .context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config,
    })
}

/// Objects merge recursively; any other layer value replaces what was there.
fn merge_layer(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (k, v) in layer_map {
                merge_layer(base_map.entry(k).or_insert(Value::Null), v);
            }
        }
        (slot, v) => *slot = v,
    }
}

/// Sorted-key copy, so key order within a layer never changes the hash.
fn sorted_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sorted_keys(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sorted_keys).collect()),
        other => other.clone(),
    }
}
