//! Config hash stability.
//!
//! GREEN when:
//! - same input => same hash and canonical JSON
//! - key order in YAML does not change the hash
//! - different values => different hash
//! - later layers override earlier ones

use npsync_config::{load_layered_yaml_from_strings, DEFAULT_CONFIG_YAML};

const BASE_YAML: &str = r#"
rewards:
  premium_token_amount: 1
  soft_currency_amount: 20000
  comment: "Side story completion reward"
run:
  progress_every: 100
"#;

const BASE_YAML_REORDERED: &str = r#"
run:
  progress_every: 100
rewards:
  comment: "Side story completion reward"
  soft_currency_amount: 20000
  premium_token_amount: 1
"#;

const OVERLAY_YAML: &str = r#"
rewards:
  soft_currency_amount: 50000
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();

    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();

    assert_eq!(
        original.config_hash, reordered.config_hash,
        "reordering keys in YAML must not change the hash"
    );
}

#[test]
fn different_values_produce_different_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();

    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn overlay_overrides_only_named_leaf() {
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();

    let coins = merged
        .config_json
        .pointer("/rewards/soft_currency_amount")
        .and_then(|v| v.as_i64())
        .unwrap();
    assert_eq!(coins, 50_000);

    let loveca = merged
        .config_json
        .pointer("/rewards/premium_token_amount")
        .and_then(|v| v.as_i64())
        .unwrap();
    assert_eq!(loveca, 1, "untouched sibling must survive the merge");
}

#[test]
fn defaults_load_and_hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[DEFAULT_CONFIG_YAML]).unwrap();

    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn empty_overlay_changes_nothing() {
    let a = load_layered_yaml_from_strings(&[DEFAULT_CONFIG_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[DEFAULT_CONFIG_YAML, ""]).unwrap();

    assert_eq!(a.config_hash, b.config_hash);
}
