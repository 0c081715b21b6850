// crates/nexus-router-core/tests/hashing.rs
// ============================================================================
// Module: Canonical Hashing Tests
// Description: Verifies canonical JSON rendering and SHA-256 digests.
// ============================================================================
//! ## Overview
//! Canonical JSON must be order-independent and byte-stable, and digests
//! must match pinned vectors so adapter identifiers never drift across
//! platforms or releases.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use nexus_router_core::hashing::DEFAULT_HASH_ALGORITHM;
use nexus_router_core::hashing::HashAlgorithm;
use nexus_router_core::hashing::canonical_json_bytes;
use nexus_router_core::hashing::hash_bytes;
use nexus_router_core::hashing::hash_canonical_json;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

#[test]
fn canonical_json_sorts_keys_and_minimizes_separators() {
    let mut map = Map::new();
    map.insert("b".to_string(), json!(2));
    map.insert("a".to_string(), json!(1));

    let bytes = canonical_json_bytes(&Value::Object(map)).expect("canonical bytes");
    assert_eq!(bytes, br#"{"a":1,"b":2}"#);
}

#[test]
fn canonical_hash_is_order_independent_for_maps() {
    let mut map_a = Map::new();
    map_a.insert("b".to_string(), json!(2));
    map_a.insert("a".to_string(), json!(1));

    let mut map_b = Map::new();
    map_b.insert("a".to_string(), json!(1));
    map_b.insert("b".to_string(), json!(2));

    let hash_a =
        hash_canonical_json(HashAlgorithm::Sha256, &Value::Object(map_a)).expect("hash a");
    let hash_b =
        hash_canonical_json(HashAlgorithm::Sha256, &Value::Object(map_b)).expect("hash b");

    assert_eq!(hash_a, hash_b);
}

#[test]
fn sha256_digest_matches_pinned_vector() {
    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, b"hello");
    assert_eq!(
        digest.value,
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert_eq!(digest.algorithm.as_str(), "sha256");
}

#[test]
fn nested_payload_hash_is_stable() {
    let payload = json!({
        "tool": "file-system",
        "method": "read_file",
        "args": {"path": "/tmp/x", "limit": 10},
    });
    let first = hash_canonical_json(HashAlgorithm::Sha256, &payload).expect("first hash");
    let second = hash_canonical_json(HashAlgorithm::Sha256, &payload).expect("second hash");
    assert_eq!(first, second);
}
