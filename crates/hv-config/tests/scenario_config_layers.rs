//! Layered config files on disk.
//!
//! GREEN when:
//! - files merge in the order given
//! - reordering keys inside a layer leaves the hash unchanged
//! - a different effective value changes the hash
//! - a missing file is reported with its path

use std::fs;

use hv_config::{load_layered_yaml, load_layered_yaml_from_strings};

const BASE_YAML: &str = r#"
api:
  base_url: "https://api.helioviewer.org/v2/"
  lookup_timeout_secs: 60
output:
  root: "./fits_data"
  save_header_txt: true
fetch:
  max_concurrency: 2
"#;

const BASE_YAML_REORDERED: &str = r#"
fetch:
  max_concurrency: 2
output:
  save_header_txt: true
  root: "./fits_data"
api:
  lookup_timeout_secs: 60
  base_url: "https://api.helioviewer.org/v2/"
"#;

const STRICT_YAML: &str = r#"
matching:
  max_time_delta_seconds: 300
output:
  failed_log: "./failed.tsv"
"#;

#[test]
fn files_merge_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let strict = dir.path().join("strict.yaml");
    fs::write(&base, BASE_YAML).unwrap();
    fs::write(&strict, STRICT_YAML).unwrap();

    let loaded = load_layered_yaml(&[base.to_str().unwrap(), strict.to_str().unwrap()]).unwrap();
    let c = &loaded.config;
    assert_eq!(c.output.root, "./fits_data");
    assert_eq!(c.output.failed_log.as_deref(), Some("./failed.tsv"));
    assert_eq!(c.matching.max_time_delta_seconds, Some(300.0));
    assert_eq!(c.fetch.max_concurrency, 2);
    assert_eq!(loaded.config_hash.len(), 64);
}

#[test]
fn key_order_does_not_change_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn different_values_change_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, STRICT_YAML]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn missing_file_names_the_path() {
    let err = load_layered_yaml(&["/definitely/not/here.yaml"]).unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.yaml"));
}
