//! `heliofits sources`: the local source catalog as JSON.

use hv_api::SOURCES;
use serde_json::{json, Value};

pub fn catalog() -> Value {
    Value::Array(
        SOURCES
            .iter()
            .map(|s| {
                json!({
                    "key": s.key,
                    "source_id": s.source_id,
                    "nickname": s.nickname,
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_source() {
        let v = catalog();
        let arr = v.as_array().unwrap();
        assert_eq!(arr.len(), SOURCES.len());
        assert!(arr
            .iter()
            .any(|e| e["key"] == "SDO_HMI_continuum" && e["source_id"] == 18));
    }
}
